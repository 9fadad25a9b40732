//! Installation root, named environment lookup, and environment blocks.
//!
//! Callers open an [`root::EnvironmentRoot`], resolve an
//! [`prefix::EnvironmentPrefix`] inside it, and hand both to an activation
//! backend, which returns the [`block::EnvBlock`] the child runs with.

pub mod block;
pub mod prefix;
pub mod root;

pub use block::EnvBlock;
pub use prefix::{envs_search_path, list_environments, resolve_prefix, EnvironmentPrefix};
pub use root::{ActivationRoutine, EnvironmentRoot};
