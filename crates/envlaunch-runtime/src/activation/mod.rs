//! ActivationBackend trait: how an installation root's activation is applied.
//!
//! Two backends:
//! - [`script::ScriptActivation`] runs the root's activation routine in a
//!   subshell and captures the environment it leaves behind.
//! - [`static_env::StaticActivation`] derives the same variables from the
//!   prefix layout without running anything.
//!
//! Either way the result is an [`ActivatedEnvironment`]: a complete,
//! read-only environment block for the child.

pub mod script;
pub mod static_env;

use envlaunch_core::config::ActivationMode;
use envlaunch_core::LaunchError;

use crate::env::{EnvBlock, EnvironmentPrefix, EnvironmentRoot};

pub use script::ScriptActivation;
pub use static_env::StaticActivation;

/// Environment produced by activation.
#[derive(Debug, Clone)]
pub struct ActivatedEnvironment {
    pub prefix: EnvironmentPrefix,
    /// Backend that produced it
    pub backend: &'static str,
    pub block: EnvBlock,
}

impl ActivatedEnvironment {
    /// Variables that activation added, changed or removed relative to `base`.
    pub fn changes(&self, base: &EnvBlock) -> Vec<(String, Option<String>)> {
        self.block.diff(base)
    }
}

/// Extension point for activation strategies.
pub trait ActivationBackend {
    /// Backend name for logging and diagnostics.
    fn name(&self) -> &'static str;

    /// Activate `prefix` of `root`, starting from `base`.
    fn activate(
        &self,
        root: &EnvironmentRoot,
        prefix: &EnvironmentPrefix,
        base: &EnvBlock,
    ) -> Result<ActivatedEnvironment, LaunchError>;
}

/// Pick the backend for `mode`.
///
/// `Auto` runs the routine when the shell it needs is on the base PATH,
/// otherwise falls back to static activation.
pub fn select_backend(
    mode: ActivationMode,
    root: &EnvironmentRoot,
    base: &EnvBlock,
) -> Box<dyn ActivationBackend> {
    match mode {
        ActivationMode::Script => Box::new(ScriptActivation),
        ActivationMode::Static => Box::new(StaticActivation),
        ActivationMode::Auto => {
            if script::shell_available(&root.routine, base) {
                Box::new(ScriptActivation)
            } else {
                tracing::debug!(
                    routine = %root.routine.path().display(),
                    "No shell for activation routine, using static activation"
                );
                Box::new(StaticActivation)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_select_backend_explicit_modes() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("etc/profile.d")).unwrap();
        fs::write(tmp.path().join("etc/profile.d/conda.sh"), "").unwrap();
        fs::create_dir_all(tmp.path().join("Scripts")).unwrap();
        fs::write(tmp.path().join("Scripts/activate.bat"), "").unwrap();
        let root = EnvironmentRoot::open(tmp.path()).unwrap();
        let base = EnvBlock::default();

        assert_eq!(select_backend(ActivationMode::Static, &root, &base).name(), "static");
        assert_eq!(select_backend(ActivationMode::Script, &root, &base).name(), "script");
        // no PATH at all: no shell can be found
        assert_eq!(select_backend(ActivationMode::Auto, &root, &base).name(), "static");
    }
}
