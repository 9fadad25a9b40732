//! `envlaunch envs`: list environments under the installation root.

use std::path::PathBuf;

use anyhow::{Context, Result};
use envlaunch_core::config::{default_root, PartialConfig};
use envlaunch_core::LaunchError;
use envlaunch_runtime::env::{
    envs_search_path, list_environments, resolve_prefix, EnvBlock, EnvironmentPrefix, EnvironmentRoot,
};
use serde::Serialize;

use super::{merge_layers, Invocation};
use crate::cli::SourceArgs;

#[derive(Debug, Serialize)]
pub struct EnvListing {
    pub root: PathBuf,
    pub environments: Vec<EnvEntry>,
}

#[derive(Debug, Serialize)]
pub struct EnvEntry {
    #[serde(flatten)]
    pub prefix: EnvironmentPrefix,
    /// The environment `run` would activate
    pub selected: bool,
}

pub fn cmd_envs(source: &SourceArgs, json: bool) -> Result<i32> {
    let listing = match Invocation::current().and_then(|inv| collect(source, &inv)) {
        Ok(listing) => listing,
        Err(e) => {
            eprintln!("envlaunch: {}", e);
            return Ok(e.exit_code());
        }
    };

    if json {
        let text = serde_json::to_string_pretty(&listing).context("Failed to serialize environment list")?;
        println!("{}", text);
    } else {
        print!("{}", render_text(&listing));
    }
    Ok(0)
}

fn collect(source: &SourceArgs, inv: &Invocation) -> Result<EnvListing, LaunchError> {
    let env = PartialConfig::from_env()?;
    let merged = merge_layers(source.to_partial(), env, source.config.as_deref(), inv)?;
    let root_path = match merged.root.clone() {
        Some(root) => root,
        None => default_root(inv.home.as_deref()).ok_or_else(|| {
            LaunchError::Config("cannot determine the home directory; set --root".to_string())
        })?,
    };
    let root = EnvironmentRoot::open(&root_path)?;
    let search = envs_search_path(&merged.envs_dirs, &EnvBlock::from_process());
    Ok(listing(&root, merged.env.as_deref(), &search))
}

/// List `root`'s environments, marking the one `selected_name` resolves to.
pub fn listing(root: &EnvironmentRoot, selected_name: Option<&str>, envs_dirs: &[PathBuf]) -> EnvListing {
    let selected: Option<PathBuf> = selected_name
        .and_then(|name| resolve_prefix(root, name, envs_dirs).ok())
        .map(|p| p.path);
    let environments = list_environments(root, envs_dirs)
        .into_iter()
        .map(|prefix| EnvEntry {
            selected: selected.as_deref() == Some(prefix.path.as_path()),
            prefix,
        })
        .collect();
    EnvListing {
        root: root.path.clone(),
        environments,
    }
}

pub fn render_text(listing: &EnvListing) -> String {
    let width = listing
        .environments
        .iter()
        .map(|e| e.prefix.name.len())
        .max()
        .unwrap_or(0);
    let mut out = format!("# environments under {}\n", listing.root.display());
    if listing.environments.is_empty() {
        out.push_str("(none)\n");
    }
    for entry in &listing.environments {
        let mark = if entry.selected { '*' } else { ' ' };
        out.push_str(&format!(
            "{:<width$} {} {}\n",
            entry.prefix.name,
            mark,
            entry.prefix.path.display(),
            width = width
        ));
    }
    out
}
