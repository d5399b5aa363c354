//! Configuration for satchel.
//!
//! Provides TOML-based configuration with:
//! - `[session]` defaults for the namespaced store (unscoped namespace, start policy)
//! - `[token]` defaults for the token manager (reserved namespace, lifetime, entropy)
//! - Config file layering (XDG user config + project-local overrides)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
