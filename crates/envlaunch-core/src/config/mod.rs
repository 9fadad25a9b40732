//! envlaunch configuration layer
//!
//! All environment variable reads go through this module; the rest of the
//! workspace receives a structured [`LauncherConfig`].
//!
//! - `loader`: lookup helpers with alias chains, `.env` loading
//! - `file`: optional YAML config file
//! - `schema`: `PartialConfig` layers, `LauncherConfig`, `ObservabilityConfig`
//! - `env_keys`: key constants

pub mod env_keys;
pub mod file;
pub mod loader;
pub mod schema;

pub use file::{find_config_file, load_config_file};
pub use loader::load_dotenv;
pub use schema::{
    default_root, ActivationMode, LauncherConfig, ObservabilityConfig, PartialConfig,
    PausePolicy,
};
