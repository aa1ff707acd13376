//! Lock descriptor snapshots.

use super::naming::{lock_file_name, pid_file_name};
use crate::error::{PlockError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identity and state of one lock, as seen at the moment it was produced.
///
/// An `Info` is always an independent copy; it never tracks later changes to
/// the [`super::Lock`] or the directory it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    /// Backend identifier of the store holding the artifacts (e.g. `local`).
    pub provider: String,

    /// Sanitized lock name.
    pub name: String,

    /// Process id bound to the lock.
    pub pid: i32,

    /// Directory holding the artifacts.
    pub work_dir: PathBuf,

    /// Canonical lock file name (`{name}.lock`).
    pub lock_file_name: String,

    pub lock_file_path: PathBuf,

    /// Pid-marker file name (`{name}.{pid}.lock`).
    pub pid_file_name: String,

    pub pid_file_path: PathBuf,

    /// When the lock was acquired; `None` while not held.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
}

impl Info {
    /// Describe lock `name` for `pid` inside `work_dir`, not yet activated.
    pub fn new(provider: &str, work_dir: &Path, name: &str, pid: i32) -> Self {
        let lock_file_name = lock_file_name(name);
        let pid_file_name = pid_file_name(name, pid);
        Self {
            provider: provider.to_string(),
            name: name.to_string(),
            pid,
            work_dir: work_dir.to_path_buf(),
            lock_file_path: work_dir.join(&lock_file_name),
            lock_file_name,
            pid_file_path: work_dir.join(&pid_file_name),
            pid_file_name,
            activated_at: None,
        }
    }

    pub fn with_activated_at(mut self, activated_at: Option<DateTime<Utc>>) -> Self {
        self.activated_at = activated_at;
        self
    }

    /// Serialize to a pretty JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PlockError::Config(format!("failed to serialize lock info: {}", e)))
    }

    /// RFC3339 activation time, or `"never"`.
    pub fn activated_at_string(&self) -> String {
        self.activated_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string())
    }

    /// Format the time since activation as a human-readable string.
    pub fn age_string(&self) -> String {
        let Some(activated_at) = self.activated_at else {
            return "-".to_string();
        };
        let age = Utc::now().signed_duration_since(activated_at);
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes)
        }
    }
}

impl std::fmt::Display for Info {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (pid: {}, age: {}, file: {})",
            self.name,
            self.pid,
            self.age_string(),
            self.lock_file_path.display()
        )
    }
}
