//! Structured configuration.
//!
//! Every source (CLI, environment, config file) produces a [`PartialConfig`];
//! layers are merged highest-precedence first and then resolved into a
//! [`LauncherConfig`] with defaults applied and required values checked.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::env_keys::{launcher as keys, observability as obv_keys};
use super::loader::{lookup_bool, lookup_optional, lookup_or, process_lookup, Lookup};
use crate::error::LaunchError;

/// Interpreter used when nothing is configured.
pub const DEFAULT_INTERPRETER: &str = "python";

/// Interpreter value meaning "execute the target directly".
pub const NO_INTERPRETER: &str = "none";

/// Installation directory names tried under the home directory, in order.
pub const DEFAULT_ROOT_CANDIDATES: &[&str] = &["anaconda3", "miniconda3", "miniforge3"];

/// How the activation routine is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationMode {
    /// Run the routine when a shell is available, otherwise compute statically
    #[default]
    Auto,
    /// Source the routine in a subshell and capture the resulting environment
    Script,
    /// Derive the environment from the prefix layout without running anything
    Static,
}

impl FromStr for ActivationMode {
    type Err = LaunchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "script" => Ok(Self::Script),
            "static" => Ok(Self::Static),
            other => Err(LaunchError::Config(format!(
                "invalid activation mode '{}' (expected auto, script or static)",
                other
            ))),
        }
    }
}

impl fmt::Display for ActivationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Script => "script",
            Self::Static => "static",
        })
    }
}

/// When to keep the console open after the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PausePolicy {
    #[default]
    Always,
    OnError,
    Never,
}

impl PausePolicy {
    /// Whether a run ending with `exit_code` should pause.
    pub fn applies_to(&self, exit_code: i32) -> bool {
        match self {
            Self::Always => true,
            Self::OnError => exit_code != 0,
            Self::Never => false,
        }
    }
}

impl FromStr for PausePolicy {
    type Err = LaunchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "always" | "1" | "true" | "yes" => Ok(Self::Always),
            "on-error" => Ok(Self::OnError),
            "never" | "0" | "false" | "no" => Ok(Self::Never),
            other => Err(LaunchError::Config(format!(
                "invalid pause policy '{}' (expected always, on-error or never)",
                other
            ))),
        }
    }
}

impl fmt::Display for PausePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Always => "always",
            Self::OnError => "on-error",
            Self::Never => "never",
        })
    }
}

/// One configuration layer. `None` / empty means "not set by this layer".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialConfig {
    #[serde(alias = "environment_name")]
    pub env: Option<String>,
    #[serde(alias = "environment_root_path")]
    pub root: Option<PathBuf>,
    #[serde(alias = "target_script_path")]
    pub script: Option<PathBuf>,
    pub interpreter: Option<String>,
    pub activation: Option<ActivationMode>,
    pub pause: Option<PausePolicy>,
    pub working_dir: Option<PathBuf>,
    pub args: Vec<String>,
    pub envs_dirs: Vec<PathBuf>,
}

impl PartialConfig {
    /// Layer read from the process environment.
    pub fn from_env() -> Result<Self, LaunchError> {
        Self::from_lookup(&process_lookup)
    }

    /// Layer read through `lookup`.
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, LaunchError> {
        let activation = lookup_optional(lookup, keys::ENVLAUNCH_ACTIVATION, &[])
            .map(|s| s.parse::<ActivationMode>())
            .transpose()?;
        let pause = lookup_optional(lookup, keys::ENVLAUNCH_PAUSE, &[])
            .map(|s| s.parse::<PausePolicy>())
            .transpose()?;
        let envs_dirs = lookup_optional(lookup, keys::ENVLAUNCH_ENVS_DIRS, &[])
            .map(|s| std::env::split_paths(&s).collect())
            .unwrap_or_default();

        Ok(Self {
            env: lookup_optional(lookup, keys::ENVLAUNCH_ENV, keys::ENV_ALIASES),
            root: lookup_optional(lookup, keys::ENVLAUNCH_ROOT, keys::ROOT_ALIASES)
                .map(PathBuf::from),
            script: lookup_optional(lookup, keys::ENVLAUNCH_SCRIPT, &[]).map(PathBuf::from),
            interpreter: lookup_optional(lookup, keys::ENVLAUNCH_INTERPRETER, &[]),
            activation,
            pause,
            working_dir: lookup_optional(lookup, keys::ENVLAUNCH_CWD, &[]).map(PathBuf::from),
            args: Vec::new(),
            envs_dirs,
        })
    }

    /// Fill everything `self` leaves unset from `lower`.
    pub fn or(self, lower: PartialConfig) -> PartialConfig {
        PartialConfig {
            env: self.env.or(lower.env),
            root: self.root.or(lower.root),
            script: self.script.or(lower.script),
            interpreter: self.interpreter.or(lower.interpreter),
            activation: self.activation.or(lower.activation),
            pause: self.pause.or(lower.pause),
            working_dir: self.working_dir.or(lower.working_dir),
            args: if self.args.is_empty() { lower.args } else { self.args },
            envs_dirs: if self.envs_dirs.is_empty() {
                lower.envs_dirs
            } else {
                self.envs_dirs
            },
        }
    }
}

/// Fully resolved launcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LauncherConfig {
    pub environment_name: String,
    pub environment_root: PathBuf,
    pub target_script: PathBuf,
    /// `None` executes the target directly
    pub interpreter: Option<String>,
    pub activation_mode: ActivationMode,
    pub pause: PausePolicy,
    pub working_dir: Option<PathBuf>,
    pub script_args: Vec<String>,
    pub envs_dirs: Vec<PathBuf>,
}

impl LauncherConfig {
    /// Apply defaults and check that the required values are present.
    ///
    /// `home` seeds the default installation root when none is configured.
    pub fn resolve(partial: PartialConfig, home: Option<&Path>) -> Result<Self, LaunchError> {
        let environment_name = partial
            .env
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                LaunchError::Config(format!(
                    "environment name is required (--env or {})",
                    keys::ENVLAUNCH_ENV
                ))
            })?;

        let target_script = partial
            .script
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| {
                LaunchError::Config(format!(
                    "target script is required (SCRIPT argument or {})",
                    keys::ENVLAUNCH_SCRIPT
                ))
            })?;

        let environment_root = match partial.root.filter(|p| !p.as_os_str().is_empty()) {
            Some(root) => root,
            None => default_root(home).ok_or_else(|| {
                LaunchError::Config(format!(
                    "cannot determine the home directory; set --root or {}",
                    keys::ENVLAUNCH_ROOT
                ))
            })?,
        };

        let interpreter = match partial.interpreter.as_deref().map(str::trim) {
            None | Some("") => Some(DEFAULT_INTERPRETER.to_string()),
            Some(s) if s.eq_ignore_ascii_case(NO_INTERPRETER) => None,
            Some(s) => Some(s.to_string()),
        };

        Ok(Self {
            environment_name: environment_name.trim().to_string(),
            environment_root,
            target_script,
            interpreter,
            activation_mode: partial.activation.unwrap_or_default(),
            pause: partial.pause.unwrap_or_default(),
            working_dir: partial.working_dir,
            script_args: partial.args,
            envs_dirs: partial.envs_dirs,
        })
    }
}

/// Default installation root under `home`: the first candidate that exists,
/// else `~/anaconda3`.
pub fn default_root(home: Option<&Path>) -> Option<PathBuf> {
    let home = home?;
    let found = DEFAULT_ROOT_CANDIDATES
        .iter()
        .map(|name| home.join(name))
        .find(|p| p.is_dir());
    Some(found.unwrap_or_else(|| home.join(DEFAULT_ROOT_CANDIDATES[0])))
}

/// Observability settings: quiet, log level, JSON logs, audit log path.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
    pub audit_log: Option<String>,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            super::loader::load_dotenv();
            Self::from_lookup(&process_lookup)
        })
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        Self {
            quiet: lookup_bool(lookup, obv_keys::ENVLAUNCH_QUIET, &[], false),
            log_level: lookup_or(lookup, obv_keys::ENVLAUNCH_LOG_LEVEL, &[], || {
                "envlaunch=info".to_string()
            }),
            log_json: lookup_bool(lookup, obv_keys::ENVLAUNCH_LOG_JSON, &[], false),
            audit_log: lookup_optional(lookup, obv_keys::ENVLAUNCH_AUDIT_LOG, &[]),
        }
    }
}
