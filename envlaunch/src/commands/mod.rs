//! CLI commands.
//!
//!   run    activate and launch, then pause
//!   check  activate and resolve only, report what `run` would do
//!   envs   list environments under the installation root
//!
//! All three share config assembly: CLI > environment > config file > defaults.

pub mod check;
pub mod envs;
pub mod run;

use std::path::{Path, PathBuf};

use envlaunch_core::config::{find_config_file, load_config_file, LauncherConfig, PartialConfig};
use envlaunch_core::path_validation::absolutize;
use envlaunch_core::LaunchError;

/// Process facts the commands resolve paths against.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub cwd: PathBuf,
    pub home: Option<PathBuf>,
}

impl Invocation {
    pub fn current() -> Result<Self, LaunchError> {
        let cwd = std::env::current_dir().map_err(|e| {
            LaunchError::Config(format!("cannot determine the current directory: {}", e))
        })?;
        Ok(Self {
            cwd,
            home: dirs::home_dir(),
        })
    }
}

/// Stack the layers. `config_flag` names an explicit config file, which must
/// exist; without it `./envlaunch.yaml` is used when present.
pub fn merge_layers(
    cli: PartialConfig,
    env: PartialConfig,
    config_flag: Option<&Path>,
    inv: &Invocation,
) -> Result<PartialConfig, LaunchError> {
    let explicit = config_flag.map(|p| absolutize(p, &inv.cwd));
    let file = match find_config_file(explicit.as_deref(), &inv.cwd) {
        Some(path) => load_config_file(&path, inv.home.as_deref())?,
        None => PartialConfig::default(),
    };
    Ok(cli.or(env).or(file))
}

/// Merge the layers and resolve them into a full launcher config.
///
/// On failure the merged layer (when there is one) is handed back so the
/// caller can still honor a configured pause policy.
pub fn resolve_config(
    cli: PartialConfig,
    env: PartialConfig,
    config_flag: Option<&Path>,
    inv: &Invocation,
) -> Result<LauncherConfig, (LaunchError, Option<PartialConfig>)> {
    let merged = merge_layers(cli, env, config_flag, inv).map_err(|e| (e, None))?;
    LauncherConfig::resolve(merged.clone(), inv.home.as_deref()).map_err(|e| (e, Some(merged)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use envlaunch_core::config::PausePolicy;
    use std::fs;

    fn invocation(dir: &Path) -> Invocation {
        Invocation {
            cwd: dir.to_path_buf(),
            home: Some(dir.join("home")),
        }
    }

    #[test]
    fn test_precedence_cli_env_file() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("envlaunch.yaml"),
            "env: from-file\nscript: run_gui.py\npause: never\ninterpreter: python3\n",
        )
        .unwrap();
        let cli = PartialConfig {
            env: Some("from-cli".into()),
            ..Default::default()
        };
        let env = PartialConfig {
            env: Some("from-env".into()),
            pause: Some(PausePolicy::OnError),
            ..Default::default()
        };

        let merged = merge_layers(cli, env, None, &invocation(tmp.path())).unwrap();
        assert_eq!(merged.env.as_deref(), Some("from-cli"));
        assert_eq!(merged.pause, Some(PausePolicy::OnError));
        assert_eq!(merged.interpreter.as_deref(), Some("python3"));
        // file paths are anchored at the file's directory
        assert_eq!(merged.script, Some(tmp.path().join("run_gui.py")));
    }

    #[test]
    fn test_no_config_file_is_fine() {
        let tmp = tempfile::tempdir().unwrap();
        let merged = merge_layers(
            PartialConfig::default(),
            PartialConfig::default(),
            None,
            &invocation(tmp.path()),
        )
        .unwrap();
        assert_eq!(merged, PartialConfig::default());
    }

    #[test]
    fn test_explicit_missing_config_file_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = merge_layers(
            PartialConfig::default(),
            PartialConfig::default(),
            Some(Path::new("missing.yaml")),
            &invocation(tmp.path()),
        )
        .unwrap_err();
        assert!(matches!(err, LaunchError::Config(_)));
        assert!(err.to_string().contains("missing.yaml"));
    }

    #[test]
    fn test_explicit_config_relative_to_cwd() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("conf")).unwrap();
        fs::write(tmp.path().join("conf/gui.yaml"), "env: neuro\n").unwrap();
        let merged = merge_layers(
            PartialConfig::default(),
            PartialConfig::default(),
            Some(Path::new("conf/gui.yaml")),
            &invocation(tmp.path()),
        )
        .unwrap();
        assert_eq!(merged.env.as_deref(), Some("neuro"));
    }
}
