//! Launch orchestration: activate, resolve, spawn, wait.
//!
//! A run walks `NotStarted → Activating → Launching → Completed(code)`.
//! [`prepare`] covers everything up to (not including) the spawn, so the
//! `check` command and a real launch share one code path.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use envlaunch_core::config::LauncherConfig;
use envlaunch_core::{observability, LaunchError};

use crate::activation::{select_backend, ActivatedEnvironment};
use crate::common::{describe_status, exit_code_from_status};
use crate::env::{envs_search_path, resolve_prefix, EnvBlock, EnvironmentRoot};
use crate::info_log;
use crate::runtime_resolver::{resolve_command, ResolvedCommand};

/// Where a launch is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    NotStarted,
    Activating,
    Launching,
    /// Final exit code (child's code or a launcher sentinel)
    Completed(i32),
}

impl LaunchState {
    /// Whether `next` may follow `self`. Any non-final state may complete.
    pub fn can_advance_to(&self, next: LaunchState) -> bool {
        matches!(
            (self, next),
            (LaunchState::NotStarted, LaunchState::Activating)
                | (LaunchState::Activating, LaunchState::Launching)
                | (LaunchState::NotStarted, LaunchState::Completed(_))
                | (LaunchState::Activating, LaunchState::Completed(_))
                | (LaunchState::Launching, LaunchState::Completed(_))
        )
    }
}

/// Tracks one run's state. Illegal transitions are refused and logged.
#[derive(Debug)]
pub struct LaunchSession {
    state: LaunchState,
}

impl Default for LaunchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LaunchSession {
    pub fn new() -> Self {
        Self {
            state: LaunchState::NotStarted,
        }
    }

    pub fn state(&self) -> LaunchState {
        self.state
    }

    /// Move to `next`. Returns false (state unchanged) when not allowed.
    pub fn advance(&mut self, next: LaunchState) -> bool {
        if !self.state.can_advance_to(next) {
            tracing::warn!(from = ?self.state, to = ?next, "Refused launch state transition");
            return false;
        }
        tracing::debug!(from = ?self.state, to = ?next, "Launch state");
        self.state = next;
        true
    }
}

/// Everything needed to spawn the child.
#[derive(Debug, Clone)]
pub struct PreparedLaunch {
    pub root: EnvironmentRoot,
    pub activated: ActivatedEnvironment,
    pub command: ResolvedCommand,
    pub working_dir: PathBuf,
}

/// Result of [`launch`].
#[derive(Debug)]
pub struct LaunchOutcome {
    pub state: LaunchState,
    /// `Ok(0)` on success; the error otherwise, including a child that exited nonzero
    pub result: Result<i32, LaunchError>,
}

impl LaunchOutcome {
    /// Exit code the launcher should report.
    pub fn exit_code(&self) -> i32 {
        match &self.result {
            Ok(code) => *code,
            Err(e) => e.exit_code(),
        }
    }
}

/// Working directory for the child: configured dir (anchored at `cwd`) or `cwd`.
pub fn working_dir(config: &LauncherConfig, cwd: &Path) -> PathBuf {
    match &config.working_dir {
        Some(dir) => envlaunch_core::path_validation::absolutize(dir, cwd),
        None => cwd.to_path_buf(),
    }
}

/// Activate the environment and resolve the command without spawning.
///
/// Moves `session` to `Activating`; the caller decides what comes next.
pub fn prepare(
    config: &LauncherConfig,
    base: &EnvBlock,
    cwd: &Path,
    session: &mut LaunchSession,
) -> Result<PreparedLaunch, LaunchError> {
    session.advance(LaunchState::Activating);

    let root = EnvironmentRoot::open(&config.environment_root)?;
    let search = envs_search_path(&config.envs_dirs, base);
    let prefix = resolve_prefix(&root, &config.environment_name, &search)?;
    let backend = select_backend(config.activation_mode, &root, base);
    info_log!(
        env = %prefix.name,
        prefix = %prefix.path.display(),
        backend = backend.name(),
        "Activating environment"
    );
    let activated = backend.activate(&root, &prefix, base)?;
    observability::audit_activation_completed(&prefix.name, &prefix.path, activated.backend);

    let working_dir = working_dir(config, cwd);
    if !working_dir.is_dir() {
        return Err(LaunchError::launch(
            &config.target_script,
            format!("working directory not found: {}", working_dir.display()),
        ));
    }
    let command = resolve_command(
        config.interpreter.as_deref(),
        &config.target_script,
        &config.script_args,
        &activated.block,
        cwd,
    )?;

    Ok(PreparedLaunch {
        root,
        activated,
        command,
        working_dir,
    })
}

/// Spawn the prepared command with inherited stdio and wait for it.
///
/// Returns the child's exit code; a spawn error is a `LaunchFailure`.
pub fn spawn_and_wait(prepared: &PreparedLaunch) -> Result<i32, LaunchError> {
    let cmd_target = &prepared.command.target;
    let mut cmd = Command::new(&prepared.command.program);
    cmd.args(&prepared.command.args)
        .env_clear()
        .envs(prepared.activated.block.iter())
        .current_dir(&prepared.working_dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let mut child = cmd.spawn().map_err(|e| {
        LaunchError::launch(
            cmd_target,
            format!("failed to start {}: {}", prepared.command.program.display(), e),
        )
    })?;
    tracing::debug!(pid = child.id(), "Child started");

    let status = child.wait().map_err(|e| {
        LaunchError::launch(cmd_target, format!("failed to wait for child: {}", e))
    })?;
    let code = exit_code_from_status(&status);
    if code == 0 {
        info_log!(status = %describe_status(&status), "Application exited");
    } else {
        tracing::warn!(status = %describe_status(&status), "Application exited with failure");
    }
    Ok(code)
}

/// Run the whole launch. Never panics on failure; the outcome carries the
/// error and the final state.
pub fn launch(config: &LauncherConfig, base: &EnvBlock, cwd: &Path) -> LaunchOutcome {
    let mut session = LaunchSession::new();

    let prepared = match prepare(config, base, cwd, &mut session) {
        Ok(p) => p,
        Err(e) => return fail_before_spawn(config, session, e),
    };

    session.advance(LaunchState::Launching);
    info_log!(
        program = %prepared.command.program.display(),
        target = %prepared.command.target.display(),
        "Launching application"
    );
    observability::audit_launch_started(
        &config.environment_name,
        &prepared.command.program,
        &prepared.command.target,
    );

    let start = Instant::now();
    let code = match spawn_and_wait(&prepared) {
        Ok(code) => code,
        Err(e) => return fail_before_spawn(config, session, e),
    };
    observability::audit_launch_completed(
        &config.environment_name,
        &prepared.command.target,
        code,
        start.elapsed().as_millis() as u64,
    );

    session.advance(LaunchState::Completed(code));
    let result = if code == 0 {
        Ok(0)
    } else {
        Err(LaunchError::ChildNonZeroExit {
            target: prepared.command.target.clone(),
            code,
        })
    };
    LaunchOutcome {
        state: session.state(),
        result,
    }
}

fn fail_before_spawn(
    config: &LauncherConfig,
    mut session: LaunchSession,
    err: LaunchError,
) -> LaunchOutcome {
    let code = err.exit_code();
    tracing::debug!(kind = err.kind(), code, "{}", err);
    observability::audit_launch_failed(&config.environment_name, err.kind(), &err.to_string(), code);
    session.advance(LaunchState::Completed(code));
    LaunchOutcome {
        state: session.state(),
        result: Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_happy_path() {
        let mut s = LaunchSession::new();
        assert_eq!(s.state(), LaunchState::NotStarted);
        assert!(s.advance(LaunchState::Activating));
        assert!(s.advance(LaunchState::Launching));
        assert!(s.advance(LaunchState::Completed(0)));
        assert_eq!(s.state(), LaunchState::Completed(0));
    }

    #[test]
    fn test_state_machine_rejects_illegal_transitions() {
        let mut s = LaunchSession::new();
        assert!(!s.advance(LaunchState::Launching));
        assert_eq!(s.state(), LaunchState::NotStarted);
        assert!(s.advance(LaunchState::Completed(3)));
        assert!(!s.advance(LaunchState::Activating));
        assert!(!s.advance(LaunchState::Completed(0)));
        assert_eq!(s.state(), LaunchState::Completed(3));
    }

    #[test]
    fn test_working_dir_anchoring() {
        let mut cfg = LauncherConfig {
            environment_name: "gui".into(),
            environment_root: PathBuf::from("/opt/conda"),
            target_script: PathBuf::from("run_gui.py"),
            interpreter: None,
            activation_mode: Default::default(),
            pause: Default::default(),
            working_dir: None,
            script_args: vec![],
            envs_dirs: vec![],
        };
        assert_eq!(working_dir(&cfg, Path::new("/w")), PathBuf::from("/w"));
        cfg.working_dir = Some(PathBuf::from("sub"));
        assert_eq!(working_dir(&cfg, Path::new("/w")), PathBuf::from("/w/sub"));
    }

    #[cfg(unix)]
    mod unix {
        use super::super::*;
        use envlaunch_core::config::ActivationMode;
        use envlaunch_core::exit_codes;
        use std::fs;

        struct Fixture {
            tmp: tempfile::TempDir,
            config: LauncherConfig,
        }

        impl Fixture {
            /// Fake installation with env `neuro`; the target is a shell
            /// script run by `sh` that touches a marker and exits with `code`.
            fn new(code: i32) -> Self {
                let tmp = tempfile::tempdir().unwrap();
                let root = tmp.path().join("anaconda3");
                fs::create_dir_all(root.join("conda-meta")).unwrap();
                fs::create_dir_all(root.join("etc/profile.d")).unwrap();
                fs::write(root.join("etc/profile.d/conda.sh"), "").unwrap();
                fs::create_dir_all(root.join("envs/neuro/conda-meta")).unwrap();
                fs::create_dir_all(root.join("envs/neuro/bin")).unwrap();
                let script = tmp.path().join("app.sh");
                fs::write(
                    &script,
                    format!(
                        "touch \"{}\"\n[ \"$CONDA_DEFAULT_ENV\" = neuro ] || exit 99\nexit {}\n",
                        tmp.path().join("ran").display(),
                        code
                    ),
                )
                .unwrap();
                let config = LauncherConfig {
                    environment_name: "neuro".into(),
                    environment_root: root,
                    target_script: script,
                    interpreter: Some("sh".into()),
                    activation_mode: ActivationMode::Static,
                    pause: Default::default(),
                    working_dir: None,
                    script_args: vec![],
                    envs_dirs: vec![],
                };
                Self { tmp, config }
            }

            fn ran(&self) -> bool {
                self.tmp.path().join("ran").exists()
            }

            fn launch(&self) -> LaunchOutcome {
                launch(&self.config, &EnvBlock::from_process(), self.tmp.path())
            }
        }

        #[test]
        fn test_launch_success() {
            let f = Fixture::new(0);
            let outcome = f.launch();
            assert_eq!(outcome.exit_code(), 0);
            assert_eq!(outcome.state, LaunchState::Completed(0));
            assert!(f.ran());
        }

        #[test]
        fn test_launch_propagates_child_exit_code() {
            let f = Fixture::new(7);
            let outcome = f.launch();
            assert_eq!(outcome.exit_code(), 7);
            assert!(matches!(
                outcome.result,
                Err(LaunchError::ChildNonZeroExit { code: 7, .. })
            ));
        }

        #[test]
        fn test_invalid_root_never_spawns() {
            let mut f = Fixture::new(0);
            f.config.environment_root = f.tmp.path().join("missing-root");
            let outcome = f.launch();
            assert_eq!(outcome.exit_code(), exit_codes::ACTIVATION_FAILURE);
            assert_eq!(
                outcome.state,
                LaunchState::Completed(exit_codes::ACTIVATION_FAILURE)
            );
            assert!(!f.ran());
        }

        #[test]
        fn test_missing_env_never_spawns() {
            let mut f = Fixture::new(0);
            f.config.environment_name = "ghost".into();
            let outcome = f.launch();
            assert_eq!(outcome.exit_code(), exit_codes::ENVIRONMENT_NOT_FOUND);
            assert!(!f.ran());
        }

        #[test]
        fn test_missing_script_names_path() {
            let mut f = Fixture::new(0);
            let missing = f.tmp.path().join("nope/run_gui.py");
            f.config.target_script = missing.clone();
            let outcome = f.launch();
            assert_eq!(outcome.exit_code(), exit_codes::LAUNCH_FAILURE);
            let message = outcome.result.unwrap_err().to_string();
            assert!(message.contains(&missing.display().to_string()), "{message}");
        }

        #[test]
        fn test_launch_is_repeatable() {
            let f = Fixture::new(5);
            let first = f.launch().exit_code();
            let second = f.launch().exit_code();
            assert_eq!(first, 5);
            assert_eq!(first, second);
        }

        #[test]
        fn test_prepare_does_not_spawn() {
            let f = Fixture::new(0);
            let mut session = LaunchSession::new();
            let prepared = prepare(
                &f.config,
                &EnvBlock::from_process(),
                f.tmp.path(),
                &mut session,
            )
            .unwrap();
            assert_eq!(session.state(), LaunchState::Activating);
            assert_eq!(prepared.activated.backend, "static");
            assert_eq!(
                prepared.command.args[0].as_os_str(),
                f.config.target_script.as_os_str()
            );
            assert!(!f.ran());
        }
    }
}
