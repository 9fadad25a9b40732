//! Process exit codes used when the launcher itself fails.
//!
//! A child that ran always determines the exit code on its own; these only
//! apply before the child exists.

/// Missing or invalid configuration
pub const CONFIG_ERROR: i32 = 2;

/// Installation root or activation routine unusable
pub const ACTIVATION_FAILURE: i32 = 3;

/// Named environment does not exist
pub const ENVIRONMENT_NOT_FOUND: i32 = 4;

/// Target or interpreter could not be started
pub const LAUNCH_FAILURE: i32 = 127;

/// Offset added to a terminating signal number (shell convention)
pub const SIGNAL_BASE: i32 = 128;
