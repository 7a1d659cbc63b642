//! Loading of the process-wide `dfcache.toml` configuration.
//!
//! The configuration supplies the default cache directory and the default
//! values of the per-wrapper options. It is read once and handed to wrappers
//! explicitly; nothing in the workspace reads it behind the caller's back.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, load_config_or_default, CONFIG_FILE};
pub use types::*;
