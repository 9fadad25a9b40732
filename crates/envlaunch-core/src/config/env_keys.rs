//! Environment variable keys and their aliases.
//!
//! Primary keys use the `ENVLAUNCH_*` prefix. Aliases cover the names conda
//! users already export in their shells.

/// Launcher inputs
pub mod launcher {
    pub const ENVLAUNCH_ENV: &str = "ENVLAUNCH_ENV";
    pub const ENV_ALIASES: &[&str] = &["CONDA_ENV_NAME"];

    pub const ENVLAUNCH_ROOT: &str = "ENVLAUNCH_ROOT";
    pub const ROOT_ALIASES: &[&str] = &["CONDA_ROOT"];

    pub const ENVLAUNCH_SCRIPT: &str = "ENVLAUNCH_SCRIPT";

    /// Interpreter name or path; `none` runs the target directly.
    pub const ENVLAUNCH_INTERPRETER: &str = "ENVLAUNCH_INTERPRETER";

    /// `auto`, `script` or `static`.
    pub const ENVLAUNCH_ACTIVATION: &str = "ENVLAUNCH_ACTIVATION";

    /// `always`, `on-error` or `never`.
    pub const ENVLAUNCH_PAUSE: &str = "ENVLAUNCH_PAUSE";

    pub const ENVLAUNCH_CWD: &str = "ENVLAUNCH_CWD";

    /// Extra environment directories, separated like PATH.
    pub const ENVLAUNCH_ENVS_DIRS: &str = "ENVLAUNCH_ENVS_DIRS";

    pub const ENVLAUNCH_CONFIG: &str = "ENVLAUNCH_CONFIG";
}

/// Observability and logging
pub mod observability {
    pub const ENVLAUNCH_QUIET: &str = "ENVLAUNCH_QUIET";
    pub const ENVLAUNCH_LOG_LEVEL: &str = "ENVLAUNCH_LOG_LEVEL";
    pub const ENVLAUNCH_LOG_JSON: &str = "ENVLAUNCH_LOG_JSON";
    pub const ENVLAUNCH_AUDIT_LOG: &str = "ENVLAUNCH_AUDIT_LOG";
}

/// Variables written by conda activation
pub mod conda {
    pub const CONDA_PREFIX: &str = "CONDA_PREFIX";
    pub const CONDA_DEFAULT_ENV: &str = "CONDA_DEFAULT_ENV";
    pub const CONDA_SHLVL: &str = "CONDA_SHLVL";
    pub const CONDA_PROMPT_MODIFIER: &str = "CONDA_PROMPT_MODIFIER";
    pub const CONDA_EXE: &str = "CONDA_EXE";
    pub const CONDA_PYTHON_EXE: &str = "CONDA_PYTHON_EXE";

    /// Extra environment directories conda searches, separated like PATH.
    pub const CONDA_ENVS_DIRS: &str = "CONDA_ENVS_DIRS";
    pub const CONDA_ENVS_PATH: &str = "CONDA_ENVS_PATH";
}

/// Default config file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "envlaunch.yaml";
