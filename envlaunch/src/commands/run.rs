//! `envlaunch run`: activate, launch, report, pause.

use envlaunch_core::config::{PartialConfig, PausePolicy};
use envlaunch_core::LaunchError;
use envlaunch_runtime::env::EnvBlock;
use envlaunch_runtime::runner;

use super::{resolve_config, Invocation};
use crate::cli::LaunchArgs;
use crate::console;

/// Returns the exit code: the child's own, or the error's sentinel.
pub fn cmd_run(args: &LaunchArgs) -> i32 {
    let (code, pause) = execute(args);
    console::pause_if_needed(pause, code);
    code
}

fn execute(args: &LaunchArgs) -> (i32, PausePolicy) {
    let fallback_pause = args.pause_override().unwrap_or_default();
    let layers = Invocation::current().and_then(|inv| Ok((inv, PartialConfig::from_env()?)));
    match layers {
        Ok((inv, env)) => execute_with(args, env, &inv, &EnvBlock::from_process()),
        Err(e) => {
            report(&e);
            (e.exit_code(), fallback_pause)
        }
    }
}

/// Resolve, launch and pick the pause policy for the outcome.
///
/// A config error still honors a `pause` set by any readable layer, so the
/// diagnostic stays on screen.
pub fn execute_with(
    args: &LaunchArgs,
    env: PartialConfig,
    inv: &Invocation,
    base: &EnvBlock,
) -> (i32, PausePolicy) {
    let fallback_pause = args.pause_override().unwrap_or_default();
    let config = match resolve_config(args.to_partial(), env, args.source.config.as_deref(), inv) {
        Ok(config) => config,
        Err((e, merged)) => {
            report(&e);
            let pause = merged.and_then(|m| m.pause).unwrap_or(fallback_pause);
            return (e.exit_code(), pause);
        }
    };

    let outcome = runner::launch(&config, base, &inv.cwd);
    tracing::debug!(state = ?outcome.state, "Launch finished");
    if let Err(e) = &outcome.result {
        report(e);
    }
    (outcome.exit_code(), config.pause)
}

fn report(err: &LaunchError) {
    eprintln!("envlaunch: {}", err);
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::cli::SourceArgs;
    use envlaunch_core::config::ActivationMode;
    use envlaunch_core::exit_codes;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn invocation(dir: &Path) -> Invocation {
        Invocation {
            cwd: dir.to_path_buf(),
            home: None,
        }
    }

    /// Fake root with env `neuro` and an `app.sh` run by `sh` exiting with `code`.
    fn launch_args(dir: &Path, code: i32) -> LaunchArgs {
        let root = dir.join("anaconda3");
        fs::create_dir_all(root.join("conda-meta")).unwrap();
        fs::create_dir_all(root.join("etc/profile.d")).unwrap();
        fs::write(root.join("etc/profile.d/conda.sh"), "").unwrap();
        fs::create_dir_all(root.join("envs/neuro/conda-meta")).unwrap();
        fs::create_dir_all(root.join("envs/neuro/bin")).unwrap();
        fs::write(dir.join("app.sh"), format!("exit {}\n", code)).unwrap();
        LaunchArgs {
            source: SourceArgs {
                env: Some("neuro".into()),
                root: Some(root),
                ..Default::default()
            },
            script: Some(PathBuf::from("app.sh")),
            interpreter: Some("sh".into()),
            activation: Some(ActivationMode::Static),
            pause: Some(PausePolicy::OnError),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_error_uses_configured_pause() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("envlaunch.yaml"), "env: neuro\npause: never\n").unwrap();
        let (code, pause) = execute_with(
            &LaunchArgs::default(),
            PartialConfig::default(),
            &invocation(tmp.path()),
            &EnvBlock::from_process(),
        );
        assert_eq!(code, exit_codes::CONFIG_ERROR);
        assert_eq!(pause, PausePolicy::Never);
    }

    #[test]
    fn test_child_exit_code_and_pause_policy() {
        let tmp = tempfile::tempdir().unwrap();
        let args = launch_args(tmp.path(), 7);
        let (code, pause) = execute_with(
            &args,
            PartialConfig::default(),
            &invocation(tmp.path()),
            &EnvBlock::from_process(),
        );
        assert_eq!(code, 7);
        assert_eq!(pause, PausePolicy::OnError);
    }

    #[test]
    fn test_missing_root_is_activation_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let mut args = launch_args(tmp.path(), 0);
        args.source.root = Some(tmp.path().join("missing-root"));
        args.pause = None;
        let (code, pause) = execute_with(
            &args,
            PartialConfig::default(),
            &invocation(tmp.path()),
            &EnvBlock::from_process(),
        );
        assert_eq!(code, exit_codes::ACTIVATION_FAILURE);
        assert_eq!(pause, PausePolicy::Always);
    }
}
