//! Resolve what to execute: the interpreter on the activated PATH plus the
//! target script, or the target itself when no interpreter is configured.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use envlaunch_core::path_validation::absolutize;
use envlaunch_core::LaunchError;

use crate::common::PATH_VAR;
use crate::env::EnvBlock;

/// Program and arguments for the child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Absolute target script path
    pub target: PathBuf,
}

/// Resolve the child command.
///
/// `target` is anchored at `cwd` when relative. Fails with `LaunchFailure`
/// naming the missing path when the target or interpreter cannot be found.
pub fn resolve_command(
    interpreter: Option<&str>,
    target: &Path,
    script_args: &[String],
    block: &EnvBlock,
    cwd: &Path,
) -> Result<ResolvedCommand, LaunchError> {
    let target = absolutize(target, cwd);
    if !target.exists() {
        return Err(LaunchError::launch(
            &target,
            format!("target script not found: {}", target.display()),
        ));
    }
    if !target.is_file() {
        return Err(LaunchError::launch(
            &target,
            format!("target script is not a file: {}", target.display()),
        ));
    }

    let extra: Vec<OsString> = script_args.iter().map(OsString::from).collect();

    let Some(interpreter) = interpreter else {
        return Ok(ResolvedCommand {
            program: target.clone(),
            args: extra,
            target,
        });
    };

    let program = find_interpreter(interpreter, block, cwd).ok_or_else(|| {
        LaunchError::launch(
            &target,
            format!("interpreter '{}' not found on the activated PATH", interpreter),
        )
    })?;

    let mut args = vec![target.clone().into_os_string()];
    args.extend(extra);
    Ok(ResolvedCommand {
        program,
        args,
        target,
    })
}

/// Look `name` up on the block's PATH. A name with a directory component is
/// taken as a path.
pub fn find_interpreter(name: &str, block: &EnvBlock, cwd: &Path) -> Option<PathBuf> {
    let as_path = Path::new(name);
    if as_path.components().count() > 1 {
        let full = absolutize(as_path, cwd);
        return full.is_file().then_some(full);
    }
    let path = block.get(PATH_VAR)?;
    which::which_in(name, Some(path), cwd).ok()
}
