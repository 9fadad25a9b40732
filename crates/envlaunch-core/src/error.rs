//! Launcher error taxonomy.

use std::path::PathBuf;

use thiserror::Error;

use crate::exit_codes;

/// Everything that can stop a launch. None of these are retried.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Root path invalid, activation routine missing, or the routine failed
    #[error("Activation failed for {}: {reason}", .root.display())]
    ActivationFailure { root: PathBuf, reason: String },

    #[error("Environment '{name}' not found (searched: {searched})")]
    EnvironmentNotFound { name: String, searched: String },

    /// Target script missing, interpreter missing, or spawn failed
    #[error("Cannot launch {}: {reason}", .target.display())]
    LaunchFailure { target: PathBuf, reason: String },

    #[error("{} exited with status {code}", .target.display())]
    ChildNonZeroExit { target: PathBuf, code: i32 },
}

impl LaunchError {
    /// Exit code the launcher reports for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => exit_codes::CONFIG_ERROR,
            Self::ActivationFailure { .. } => exit_codes::ACTIVATION_FAILURE,
            Self::EnvironmentNotFound { .. } => exit_codes::ENVIRONMENT_NOT_FOUND,
            Self::LaunchFailure { .. } => exit_codes::LAUNCH_FAILURE,
            Self::ChildNonZeroExit { code, .. } => *code,
        }
    }

    /// Stable identifier for logs and the audit trail.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::ActivationFailure { .. } => "activation_failure",
            Self::EnvironmentNotFound { .. } => "environment_not_found",
            Self::LaunchFailure { .. } => "launch_failure",
            Self::ChildNonZeroExit { .. } => "child_nonzero_exit",
        }
    }

    pub fn activation(root: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ActivationFailure {
            root: root.into(),
            reason: reason.into(),
        }
    }

    pub fn launch(target: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::LaunchFailure {
            target: target.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            LaunchError::Config("x".into()),
            LaunchError::activation("/nope", "missing"),
            LaunchError::EnvironmentNotFound {
                name: "gui".into(),
                searched: "/opt/conda/envs".into(),
            },
            LaunchError::launch("run_gui.py", "not found"),
        ];
        let mut codes: Vec<i32> = errors.iter().map(LaunchError::exit_code).collect();
        assert!(codes.iter().all(|c| *c != 0));
        codes.dedup();
        assert_eq!(codes.len(), 4);
    }

    #[test]
    fn test_child_exit_code_propagates() {
        let err = LaunchError::ChildNonZeroExit {
            target: "run_gui.py".into(),
            code: 42,
        };
        assert_eq!(err.exit_code(), 42);
        assert_eq!(err.kind(), "child_nonzero_exit");
    }

    #[test]
    fn test_launch_failure_names_path() {
        let err = LaunchError::launch("/srv/app/run_gui.py", "target script not found");
        assert!(err.to_string().contains("/srv/app/run_gui.py"));
    }
}
