//! `envlaunch check`: everything `run` does short of spawning the child.

use std::path::PathBuf;

use anyhow::{Context, Result};
use envlaunch_core::config::{LauncherConfig, PartialConfig};
use envlaunch_core::LaunchError;
use envlaunch_runtime::env::EnvBlock;
use envlaunch_runtime::runner::{self, LaunchSession, PreparedLaunch};
use serde::Serialize;

use super::{resolve_config, Invocation};
use crate::cli::LaunchArgs;

/// Report printed by `check`.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub environment: String,
    pub root: PathBuf,
    pub routine: PathBuf,
    pub prefix: PathBuf,
    pub backend: &'static str,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Variables activation sets or changes; `null` means removed
    pub changes: Vec<(String, Option<String>)>,
}

impl CheckReport {
    pub fn new(prepared: &PreparedLaunch, base: &EnvBlock) -> Self {
        Self {
            environment: prepared.activated.prefix.name.clone(),
            root: prepared.root.path.clone(),
            routine: prepared.root.routine.path().to_path_buf(),
            prefix: prepared.activated.prefix.path.clone(),
            backend: prepared.activated.backend,
            program: prepared.command.program.clone(),
            args: prepared
                .command
                .args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
            working_dir: prepared.working_dir.clone(),
            changes: prepared.activated.changes(base),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("environment : {}\n", self.environment));
        out.push_str(&format!("root        : {}\n", self.root.display()));
        out.push_str(&format!("routine     : {}\n", self.routine.display()));
        out.push_str(&format!("prefix      : {}\n", self.prefix.display()));
        out.push_str(&format!("activation  : {}\n", self.backend));
        out.push_str(&format!("program     : {}\n", self.program.display()));
        out.push_str(&format!("args        : {}\n", self.args.join(" ")));
        out.push_str(&format!("working dir : {}\n", self.working_dir.display()));
        if !self.changes.is_empty() {
            out.push_str("changes     :\n");
            for (key, value) in &self.changes {
                match value {
                    Some(v) => out.push_str(&format!("  {}={}\n", key, v)),
                    None => out.push_str(&format!("  -{}\n", key)),
                }
            }
        }
        out
    }
}

/// Exit code 0 when the launch would proceed, else the error's code.
pub fn cmd_check(args: &LaunchArgs, json: bool) -> Result<i32> {
    let layers = Invocation::current().and_then(|inv| Ok((inv, PartialConfig::from_env()?)));
    let (inv, env) = match layers {
        Ok(layers) => layers,
        Err(e) => return Ok(report(&e)),
    };
    let config = match resolve_config(args.to_partial(), env, args.source.config.as_deref(), &inv) {
        Ok(config) => config,
        Err((e, _)) => return Ok(report(&e)),
    };
    let base = EnvBlock::from_process();
    check(&config, &base, &inv, json)
}

fn check(config: &LauncherConfig, base: &EnvBlock, inv: &Invocation, json: bool) -> Result<i32> {
    let mut session = LaunchSession::new();
    let prepared = match runner::prepare(config, base, &inv.cwd, &mut session) {
        Ok(p) => p,
        Err(e) => return Ok(report(&e)),
    };

    let report = CheckReport::new(&prepared, base);
    if json {
        let text = serde_json::to_string_pretty(&report).context("Failed to serialize check report")?;
        println!("{}", text);
    } else {
        print!("{}", report.render_text());
    }
    Ok(0)
}

fn report(err: &LaunchError) -> i32 {
    eprintln!("envlaunch: {}", err);
    err.exit_code()
}
