//! Configuration types and defaults for plock.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Raise the level by `steps` (each `-v` on the command line).
    pub fn raised(self, steps: u8) -> Self {
        let order = [
            Self::Error,
            Self::Warn,
            Self::Info,
            Self::Debug,
            Self::Trace,
        ];
        let current = order.iter().position(|l| *l == self).unwrap_or(1);
        order[(current + steps as usize).min(order.len() - 1)]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =========================================================================
// Default value functions
// =========================================================================

pub(crate) fn default_work_dir() -> PathBuf {
    PathBuf::from("/var/run/plock")
}
pub(crate) fn default_retry_interval_ms() -> u64 {
    500
}
