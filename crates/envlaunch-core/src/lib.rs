pub mod config;
pub mod error;
pub mod exit_codes;
pub mod observability;
pub mod path_validation;

pub use error::LaunchError;
