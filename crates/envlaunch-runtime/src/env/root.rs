//! Installation root and its activation routine.

use std::path::{Path, PathBuf};

use envlaunch_core::LaunchError;
use serde::Serialize;

/// How a root can be activated, in order of preference per platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum ActivationRoutine {
    /// `etc/profile.d/conda.sh`: defines the `conda` shell function
    CondaSh(PathBuf),
    /// `bin/activate`: legacy activate script taking the env as argument
    ActivateScript(PathBuf),
    /// `condabin/conda.bat`
    CondaBat(PathBuf),
    /// `Scripts/activate.bat`
    ActivateBat(PathBuf),
}

impl ActivationRoutine {
    pub fn path(&self) -> &Path {
        match self {
            Self::CondaSh(p) | Self::ActivateScript(p) | Self::CondaBat(p) | Self::ActivateBat(p) => p,
        }
    }

    /// Whether this routine is run by a POSIX shell (vs `cmd.exe`).
    pub fn is_posix(&self) -> bool {
        matches!(self, Self::CondaSh(_) | Self::ActivateScript(_))
    }
}

/// Routines that can exist under a root, relative paths.
fn candidate_routines(root: &Path) -> Vec<ActivationRoutine> {
    let posix = vec![
        ActivationRoutine::CondaSh(root.join("etc").join("profile.d").join("conda.sh")),
        ActivationRoutine::ActivateScript(root.join("bin").join("activate")),
    ];
    let windows = vec![
        ActivationRoutine::CondaBat(root.join("condabin").join("conda.bat")),
        ActivationRoutine::ActivateBat(root.join("Scripts").join("activate.bat")),
    ];
    if cfg!(windows) {
        windows.into_iter().chain(posix).collect()
    } else {
        posix.into_iter().chain(windows).collect()
    }
}

/// A validated installation root (e.g. `~/anaconda3`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentRoot {
    pub path: PathBuf,
    pub routine: ActivationRoutine,
}

impl EnvironmentRoot {
    /// Validate `path` as an installation root.
    ///
    /// Fails with `ActivationFailure` when the directory is missing or has
    /// no activation routine.
    pub fn open(path: &Path) -> Result<Self, LaunchError> {
        if !path.exists() {
            return Err(LaunchError::activation(
                path,
                "installation root does not exist",
            ));
        }
        if !path.is_dir() {
            return Err(LaunchError::activation(
                path,
                "installation root is not a directory",
            ));
        }
        let candidates = candidate_routines(path);
        let routine = candidates
            .iter()
            .find(|r| r.path().is_file())
            .cloned()
            .ok_or_else(|| {
                let looked: Vec<String> = candidates
                    .iter()
                    .map(|r| r.path().display().to_string())
                    .collect();
                LaunchError::activation(
                    path,
                    format!("no activation routine found (looked for {})", looked.join(", ")),
                )
            })?;
        tracing::debug!(root = %path.display(), routine = %routine.path().display(), "Installation root opened");
        Ok(Self {
            path: path.to_path_buf(),
            routine,
        })
    }

    /// Directory holding named environments.
    pub fn envs_dir(&self) -> PathBuf {
        self.path.join("envs")
    }

    /// `condabin`, which activation keeps on PATH.
    pub fn condabin(&self) -> PathBuf {
        self.path.join("condabin")
    }

    /// The `conda` executable inside the root.
    pub fn conda_exe(&self) -> PathBuf {
        if cfg!(windows) {
            self.path.join("Scripts").join("conda.exe")
        } else {
            self.path.join("bin").join("conda")
        }
    }

    /// The root's own Python.
    pub fn python_exe(&self) -> PathBuf {
        if cfg!(windows) {
            self.path.join("python.exe")
        } else {
            self.path.join("bin").join("python")
        }
    }

    /// Name the root's own environment answers to (`base`).
    pub fn base_name(&self) -> &'static str {
        "base"
    }
}
