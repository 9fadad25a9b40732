//! Optional YAML config file.
//!
//! ```yaml
//! env: neuro
//! root: ~/anaconda3
//! script: C:/tools/ncs2mat/run_gui.py
//! pause: on-error
//! ```

use std::path::{Path, PathBuf};

use super::env_keys::DEFAULT_CONFIG_FILE;
use super::schema::PartialConfig;
use crate::error::LaunchError;

/// Read a config file. Relative paths inside it are resolved against the
/// file's directory; a leading `~` expands to `home`.
pub fn load_config_file(path: &Path, home: Option<&Path>) -> Result<PartialConfig, LaunchError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        LaunchError::Config(format!("cannot read config file {}: {}", path.display(), e))
    })?;
    let mut partial = parse_config(&content)
        .map_err(|e| LaunchError::Config(format!("invalid config file {}: {}", path.display(), e)))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let fix = |p: PathBuf| anchor_path(p, base, home);
    partial.root = partial.root.map(fix);
    partial.script = partial.script.map(fix);
    partial.working_dir = partial.working_dir.map(fix);
    partial.envs_dirs = partial.envs_dirs.into_iter().map(fix).collect();
    tracing::debug!(path = %path.display(), "Config file loaded");
    Ok(partial)
}

/// Parse YAML text into a config layer. An empty document is an empty layer.
pub fn parse_config(content: &str) -> Result<PartialConfig, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(PartialConfig::default());
    }
    serde_yaml::from_str(content)
}

/// Locate the config file: explicit path if given, else `./envlaunch.yaml`
/// when present.
pub fn find_config_file(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    let candidate = cwd.join(DEFAULT_CONFIG_FILE);
    candidate.is_file().then_some(candidate)
}

/// Expand `~` and anchor relative paths at `base`.
pub fn anchor_path(path: PathBuf, base: &Path, home: Option<&Path>) -> PathBuf {
    let path = expand_home(path, home);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Expand a leading `~` component.
pub fn expand_home(path: PathBuf, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return path;
    };
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path,
    }
}
