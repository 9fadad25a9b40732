//! Named environment lookup.

use std::path::{Path, PathBuf};

use envlaunch_core::config::env_keys::conda;
use envlaunch_core::path_validation::{looks_like_path, validate_env_name};
use envlaunch_core::LaunchError;
use serde::Serialize;

use super::block::EnvBlock;
use super::root::EnvironmentRoot;

/// Marker directory every environment prefix contains.
pub const CONDA_META: &str = "conda-meta";

/// A resolved environment: its display name and prefix directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentPrefix {
    pub name: String,
    pub path: PathBuf,
    pub is_base: bool,
}

impl EnvironmentPrefix {
    /// Directories activation puts at the front of PATH, highest priority first.
    pub fn bin_dirs(&self) -> Vec<PathBuf> {
        prefix_bin_dirs(&self.path)
    }
}

/// PATH entries contributed by `prefix`.
pub fn prefix_bin_dirs(prefix: &Path) -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![
            prefix.to_path_buf(),
            prefix.join("Library").join("mingw-w64").join("bin"),
            prefix.join("Library").join("usr").join("bin"),
            prefix.join("Library").join("bin"),
            prefix.join("Scripts"),
            prefix.join("bin"),
        ]
    } else {
        vec![prefix.join("bin")]
    }
}

/// Whether `dir` is an environment prefix.
pub fn is_prefix(dir: &Path) -> bool {
    dir.join(CONDA_META).is_dir()
}

/// Directories searched for named environments, in order.
pub fn search_dirs(root: &EnvironmentRoot, extra: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs = vec![root.envs_dir()];
    for d in extra {
        if !dirs.contains(d) {
            dirs.push(d.clone());
        }
    }
    dirs
}

/// Extra directories to search after `<root>/envs`: the configured ones,
/// then the ones conda itself consults (`CONDA_ENVS_DIRS`,
/// `CONDA_ENVS_PATH`, `~/.conda/envs`), read from `base`.
pub fn envs_search_path(configured: &[PathBuf], base: &EnvBlock) -> Vec<PathBuf> {
    let mut dirs = configured.to_vec();
    for key in [conda::CONDA_ENVS_DIRS, conda::CONDA_ENVS_PATH] {
        if let Some(value) = base.get(key) {
            dirs.extend(std::env::split_paths(value).filter(|p| !p.as_os_str().is_empty()));
        }
    }
    let home = ["HOME", "USERPROFILE"]
        .iter()
        .find_map(|key| base.get(key).filter(|v| !v.is_empty()));
    if let Some(home) = home {
        dirs.push(Path::new(home).join(".conda").join("envs"));
    }
    dirs
}

/// Resolve `name` against `root`.
///
/// - `base` (or the root's directory name) selects the root itself
/// - a name that looks like a path is taken as a prefix directory
/// - anything else is looked up in `<root>/envs`, then `extra_dirs`
///   (see [`envs_search_path`])
pub fn resolve_prefix(
    root: &EnvironmentRoot,
    name: &str,
    extra_dirs: &[PathBuf],
) -> Result<EnvironmentPrefix, LaunchError> {
    if looks_like_path(name) {
        let path = PathBuf::from(name);
        if is_prefix(&path) {
            let is_base = same_dir(&path, &root.path);
            return Ok(EnvironmentPrefix {
                name: name.to_string(),
                path,
                is_base,
            });
        }
        return Err(LaunchError::EnvironmentNotFound {
            name: name.to_string(),
            searched: path.display().to_string(),
        });
    }

    validate_env_name(name).map_err(LaunchError::Config)?;

    let root_dir_name = root
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());
    if name == root.base_name() || root_dir_name.as_deref() == Some(name) {
        if is_prefix(&root.path) {
            return Ok(EnvironmentPrefix {
                name: root.base_name().to_string(),
                path: root.path.clone(),
                is_base: true,
            });
        }
        return Err(LaunchError::EnvironmentNotFound {
            name: name.to_string(),
            searched: root.path.display().to_string(),
        });
    }

    let dirs = search_dirs(root, extra_dirs);
    for dir in &dirs {
        let candidate = dir.join(name);
        if is_prefix(&candidate) {
            tracing::debug!(env = %name, prefix = %candidate.display(), "Environment resolved");
            return Ok(EnvironmentPrefix {
                name: name.to_string(),
                path: candidate,
                is_base: false,
            });
        }
    }

    Err(LaunchError::EnvironmentNotFound {
        name: name.to_string(),
        searched: dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// All environments under `root`: base first, then named ones sorted.
/// A name found in several search dirs is listed once (first wins).
pub fn list_environments(root: &EnvironmentRoot, extra_dirs: &[PathBuf]) -> Vec<EnvironmentPrefix> {
    let mut out = Vec::new();
    if is_prefix(&root.path) {
        out.push(EnvironmentPrefix {
            name: root.base_name().to_string(),
            path: root.path.clone(),
            is_base: true,
        });
    }
    let mut named: Vec<EnvironmentPrefix> = Vec::new();
    for dir in search_dirs(root, extra_dirs) {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !is_prefix(&path) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if named.iter().any(|e| e.name == name) {
                continue;
            }
            named.push(EnvironmentPrefix {
                name,
                path,
                is_base: false,
            });
        }
    }
    named.sort_by(|a, b| a.name.cmp(&b.name));
    out.extend(named);
    out
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
