//! Shared helpers: exit status mapping and platform constants.

use std::process::ExitStatus;

use envlaunch_core::exit_codes;

/// Name of the search path variable.
pub const PATH_VAR: &str = "PATH";

/// Map a child's exit status to the launcher's exit code.
///
/// A normal exit keeps its code. On Unix a signal-terminated child maps to
/// `128 + signal`, as shells report it.
pub fn exit_code_from_status(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return exit_codes::SIGNAL_BASE + sig;
        }
    }
    exit_codes::LAUNCH_FAILURE
}

/// Human-readable description of an exit status.
pub fn describe_status(status: &ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exit code {}", code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return match nix::sys::signal::Signal::try_from(sig) {
                Ok(signal) => format!("terminated by {}", signal.as_str()),
                Err(_) => format!("terminated by signal {}", sig),
            };
        }
    }
    "terminated abnormally".to_string()
}
