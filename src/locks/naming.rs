//! Lock-name sanitization and on-disk artifact naming.
//!
//! Artifact names are part of the interoperability contract between tool
//! versions and must not change:
//! - canonical lock file: `{name}.lock`
//! - pid-marker file: `{name}.{pid}.lock`

use crate::error::{PlockError, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Suffix shared by every lock artifact.
pub const LOCK_SUFFIX: &str = ".lock";

/// Pid reported for a canonical file that no pid-marker is linked to.
pub const UNKNOWN_PID: i32 = 0;

static UNSAFE_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]").expect("Invalid lock name regex"));

/// Reduce `name` to a safe identifier by dropping every character outside
/// `[A-Za-z0-9_-]`.
///
/// Fails if nothing is left.
pub fn sanitize_lock_name(name: &str) -> Result<String> {
    let sanitized = UNSAFE_NAME_CHARS.replace_all(name, "").into_owned();
    if sanitized.is_empty() {
        return Err(PlockError::Config(format!(
            "invalid lock name '{}': no safe characters remain after sanitization",
            name
        )));
    }
    Ok(sanitized)
}

pub fn lock_file_name(name: &str) -> String {
    format!("{}{}", name, LOCK_SUFFIX)
}

pub fn pid_file_name(name: &str, pid: i32) -> String {
    format!("{}.{}{}", name, pid, LOCK_SUFFIX)
}

/// Temporary name an artifact is moved to while a reset decides its fate.
///
/// Never ends in the lock suffix, so discovery does not see it.
pub fn reset_file_name(name: &str, pid: i32, seq: u64) -> String {
    format!("{}.reset.{}.{}", name, pid, seq)
}

/// A parsed artifact file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// `{name}.lock`
    Canonical { name: String },
    /// `{name}.{pid}.lock`
    PidMarker { name: String, pid: i32 },
}

/// Parse an artifact file name. Returns `None` for anything that is not a
/// well-formed canonical or pid-marker name.
pub fn parse_artifact(file_name: &str) -> Option<Artifact> {
    let stem = file_name.strip_suffix(LOCK_SUFFIX)?;
    let mut parts = stem.split('.');
    let name = parts.next()?;
    let pid = parts.next();
    if parts.next().is_some() || !is_safe_name(name) {
        return None;
    }

    match pid {
        None => Some(Artifact::Canonical {
            name: name.to_string(),
        }),
        Some(pid) => {
            if !pid.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let pid: i32 = pid.parse().ok()?;
            if pid <= 0 {
                return None;
            }
            Some(Artifact::PidMarker {
                name: name.to_string(),
                pid,
            })
        }
    }
}

fn is_safe_name(name: &str) -> bool {
    !name.is_empty() && !UNSAFE_NAME_CHARS.is_match(name)
}
