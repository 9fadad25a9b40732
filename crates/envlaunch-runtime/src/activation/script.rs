//! Script activation: source the root's activation routine in a subshell,
//! select the environment, and capture the environment it leaves behind.
//!
//! The routine's own output goes to stderr and is relayed verbatim, so
//! conda's diagnostics reach the console unchanged. Stdout carries only the
//! final environment dump.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use envlaunch_core::LaunchError;

use super::{ActivatedEnvironment, ActivationBackend};
use crate::common::PATH_VAR;
use crate::env::{ActivationRoutine, EnvBlock, EnvironmentPrefix, EnvironmentRoot};

/// argv[0] of the activation subshell, shows up in `ps` and shell errors.
const SUBSHELL_NAME: &str = "envlaunch-activate";

/// Shell-managed variables restored from the base block after capture.
const SHELL_INTERNAL_VARS: &[&str] = &["_", "SHLVL", "PWD", "OLDPWD"];

/// Markers conda prints when the requested environment does not exist.
const NOT_FOUND_MARKERS: &[&str] = &[
    "EnvironmentNameNotFound",
    "EnvironmentLocationNotFound",
    "Could not find conda environment",
    "Not a conda environment",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptActivation;

impl ActivationBackend for ScriptActivation {
    fn name(&self) -> &'static str {
        "script"
    }

    fn activate(
        &self,
        root: &EnvironmentRoot,
        prefix: &EnvironmentPrefix,
        base: &EnvBlock,
    ) -> Result<ActivatedEnvironment, LaunchError> {
        let routine = &root.routine;
        let shell = find_shell(routine, base).ok_or_else(|| {
            LaunchError::activation(
                &root.path,
                format!(
                    "cannot run {}: '{}' not found on PATH",
                    routine.path().display(),
                    shell_name(routine)
                ),
            )
        })?;

        let mut cmd = build_command(&shell, routine, &prefix.path);
        cmd.env_clear()
            .envs(base.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(
            shell = %shell.display(),
            routine = %routine.path().display(),
            prefix = %prefix.path.display(),
            "Running activation routine"
        );
        let output = cmd.output().map_err(|e| {
            LaunchError::activation(
                &root.path,
                format!("failed to run {}: {}", shell.display(), e),
            )
        })?;

        if !output.stderr.is_empty() {
            let mut err = std::io::stderr();
            let _ = err.write_all(&output.stderr);
            let _ = err.flush();
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(root, prefix, &stderr, &output.status));
        }

        let mut block = parse_env_dump(&output.stdout);
        if block.is_empty() || !block.contains(PATH_VAR) {
            return Err(LaunchError::activation(
                &root.path,
                "activation routine produced no environment",
            ));
        }
        restore_shell_internals(&mut block, base);

        Ok(ActivatedEnvironment {
            prefix: prefix.clone(),
            backend: self.name(),
            block,
        })
    }
}

fn shell_name(routine: &ActivationRoutine) -> &'static str {
    if routine.is_posix() {
        "sh"
    } else {
        "cmd"
    }
}

fn find_shell(routine: &ActivationRoutine, base: &EnvBlock) -> Option<PathBuf> {
    let path = base.get(PATH_VAR)?;
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    which::which_in(shell_name(routine), Some(path), cwd).ok()
}

/// Whether the shell `routine` needs can be found on the base PATH.
pub fn shell_available(routine: &ActivationRoutine, base: &EnvBlock) -> bool {
    find_shell(routine, base).is_some()
}

/// POSIX script run as `sh -c SCRIPT envlaunch-activate ROUTINE PREFIX`.
fn posix_script(routine: &ActivationRoutine) -> &'static str {
    match routine {
        ActivationRoutine::CondaSh(_) => {
            r#". "$1" >&2 && conda activate "$2" >&2 && exec env -0"#
        }
        _ => r#"routine="$1"; target="$2"; set -- "$target"; . "$routine" >&2 && exec env -0"#,
    }
}

fn build_command(shell: &Path, routine: &ActivationRoutine, prefix: &Path) -> Command {
    let mut cmd = Command::new(shell);
    if routine.is_posix() {
        cmd.arg("-c")
            .arg(posix_script(routine))
            .arg(SUBSHELL_NAME)
            .arg(routine.path())
            .arg(prefix);
    } else {
        let line = match routine {
            ActivationRoutine::CondaBat(p) => format!(
                "call \"{}\" activate \"{}\" 1>&2 && set",
                p.display(),
                prefix.display()
            ),
            _ => format!(
                "call \"{}\" \"{}\" 1>&2 && set",
                routine.path().display(),
                prefix.display()
            ),
        };
        cmd.args(["/d", "/s", "/c"]);
        push_cmd_line(&mut cmd, &line);
    }
    cmd
}

#[cfg(windows)]
fn push_cmd_line(cmd: &mut Command, line: &str) {
    use std::os::windows::process::CommandExt;
    // cmd /s strips the outer quotes and runs the rest verbatim
    cmd.raw_arg(format!("\"{}\"", line));
}

#[cfg(not(windows))]
fn push_cmd_line(cmd: &mut Command, line: &str) {
    cmd.arg(line);
}

fn classify_failure(
    root: &EnvironmentRoot,
    prefix: &EnvironmentPrefix,
    stderr: &str,
    status: &std::process::ExitStatus,
) -> LaunchError {
    if NOT_FOUND_MARKERS.iter().any(|m| stderr.contains(m)) {
        return LaunchError::EnvironmentNotFound {
            name: prefix.name.clone(),
            searched: prefix.path.display().to_string(),
        };
    }
    let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty());
    let reason = match last_line {
        Some(line) => format!(
            "activation routine failed ({}): {}",
            crate::common::describe_status(status),
            line.trim()
        ),
        None => format!(
            "activation routine failed ({})",
            crate::common::describe_status(status)
        ),
    };
    LaunchError::activation(&root.path, reason)
}

/// Parse the dump: NUL-separated `KEY=VALUE` on Unix (`env -0`), lines on
/// Windows (`set`). Entries without a key are skipped.
pub fn parse_env_dump(raw: &[u8]) -> EnvBlock {
    let mut block = EnvBlock::default();
    let separator = if cfg!(windows) { b'\n' } else { b'\0' };
    for entry in raw.split(|b| *b == separator) {
        let entry = entry.strip_suffix(b"\r").unwrap_or(entry);
        let Some(eq) = entry.iter().position(|b| *b == b'=') else {
            continue;
        };
        if eq == 0 {
            continue;
        }
        block.set(bytes_to_os(&entry[..eq]), bytes_to_os(&entry[eq + 1..]));
    }
    block
}

#[cfg(unix)]
fn bytes_to_os(bytes: &[u8]) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(bytes.to_vec())
}

#[cfg(not(unix))]
fn bytes_to_os(bytes: &[u8]) -> OsString {
    OsString::from(String::from_utf8_lossy(bytes).into_owned())
}

fn restore_shell_internals(block: &mut EnvBlock, base: &EnvBlock) {
    for key in SHELL_INTERNAL_VARS {
        match base.get(key) {
            Some(v) => block.set(*key, v),
            None => {
                block.remove(key);
            }
        }
    }
}
