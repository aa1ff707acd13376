//! Configuration model for plock.
//!
//! This module defines the Config struct read from `/etc/plock/config.yaml`
//! (or the path given by `--config`). It supports forward-compatible YAML
//! parsing (unknown fields are ignored), sensible defaults for optional
//! fields, and validation of config values.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use operations::DEFAULT_CONFIG_PATH;
pub use types::LogLevel;
