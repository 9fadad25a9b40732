//! Console pause: keep the window open until the user acknowledges.

use std::io::{self, BufRead, IsTerminal, Write};

use envlaunch_core::config::PausePolicy;

const PROMPT: &str = "Press Enter to close this window...";

/// Whether to wait for the user. Never when stdin is not a terminal, so
/// scripted runs and CI do not hang.
pub fn should_pause(policy: PausePolicy, exit_code: i32, interactive: bool) -> bool {
    interactive && policy.applies_to(exit_code)
}

/// Prompt on stderr and block until a line (or EOF) arrives on stdin.
pub fn pause_if_needed(policy: PausePolicy, exit_code: i32) {
    let stdin = io::stdin();
    if !should_pause(policy, exit_code, stdin.is_terminal()) {
        return;
    }
    let mut err = io::stderr();
    let _ = writeln!(err);
    let _ = write!(err, "{}", PROMPT);
    let _ = err.flush();
    let mut line = String::new();
    let _ = stdin.lock().read_line(&mut line);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_pauses_without_terminal() {
        assert!(!should_pause(PausePolicy::Always, 0, false));
        assert!(!should_pause(PausePolicy::OnError, 3, false));
    }

    #[test]
    fn test_policy_applies_on_terminal() {
        assert!(should_pause(PausePolicy::Always, 0, true));
        assert!(should_pause(PausePolicy::OnError, 127, true));
        assert!(!should_pause(PausePolicy::OnError, 0, true));
        assert!(!should_pause(PausePolicy::Never, 1, true));
    }
}
