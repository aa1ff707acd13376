//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for plock.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Directory holding every lock artifact. Must exist with owner rwx.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Milliseconds between attempts while waiting for a busy lock.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Wait this long for `run` when `--timeout` is not given (none: fail fast).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_timeout_secs: Option<u64>,

    /// Cap on canonical files examined by `list` and `stale`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discover_max: Option<usize>,

    // =========================================================================
    // Reset settings
    // =========================================================================
    /// Executable names `reset` may send SIGTERM to when they hold a lock.
    #[serde(default)]
    pub killable_executables: Vec<String>,

    // =========================================================================
    // Logging settings
    // =========================================================================
    /// Base log level; `-v` raises it and `PLOCK_LOG` overrides it.
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            retry_interval_ms: default_retry_interval_ms(),
            default_timeout_secs: None,
            discover_max: None,
            killable_executables: Vec::new(),
            log_level: LogLevel::default(),
        }
    }
}
