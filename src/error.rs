//! Error types for plock.
//!
//! Uses thiserror for derive macros. Every variant maps to a CLI exit code so
//! callers can tell contention apart from configuration and I/O failures.

use crate::exit_codes;
use crate::locks::Info;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for plock operations.
#[derive(Error, Debug)]
pub enum PlockError {
    /// Invalid lock name, missing store/manager, bad work directory or config file.
    #[error("{0}")]
    Config(String),

    /// An OS-level filesystem failure, annotated with the operation and path.
    #[error("failed to {op} '{}': {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Another process holds the canonical lock file.
    #[error("lock '{}' is already held by pid {} (since {})", .holder.name, .holder.pid, .holder.activated_at_string())]
    AlreadyLocked { holder: Box<Info> },

    /// This instance already believes it holds the lock.
    #[error("lock '{0}' is already acquired by this instance")]
    AlreadyHeld(String),

    /// Release was called on an instance that does not hold the lock.
    #[error("lock '{0}' is not acquired")]
    NotHeld(String),

    /// The link was reported created but does not point at our pid-marker.
    #[error("lock '{}' verification failed: '{}' is not linked to '{}'", .name, .lock_file.display(), .pid_file.display())]
    VerifyFailed {
        name: String,
        lock_file: PathBuf,
        pid_file: PathBuf,
    },

    /// `try_acquire` ran out of time.
    #[error("timed out after {waited:?} acquiring lock '{name}': {last}")]
    Timeout {
        name: String,
        waited: Duration,
        last: String,
    },

    /// A stale reset was requested for a process that is still running.
    #[error("process {0} is still alive; refusing to reset its locks")]
    StillAlive(i32),

    /// A live lock owner whose executable is not on the allow-list.
    #[error("process {pid} ({executable}) is alive and not in the killable list")]
    NotKillable { pid: i32, executable: String },

    /// Probing, signalling or spawning a process failed.
    #[error("{0}")]
    Process(String),
}

impl PlockError {
    /// Build an [`PlockError::Io`] for `op` on `path`.
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        PlockError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            PlockError::Config(_) => exit_codes::USER_ERROR,
            PlockError::Io { .. } => exit_codes::IO_FAILURE,
            PlockError::StillAlive(_)
            | PlockError::NotKillable { .. }
            | PlockError::Process(_) => exit_codes::PROCESS_FAILURE,
            PlockError::AlreadyLocked { .. }
            | PlockError::AlreadyHeld(_)
            | PlockError::NotHeld(_)
            | PlockError::VerifyFailed { .. }
            | PlockError::Timeout { .. } => exit_codes::LOCK_FAILURE,
        }
    }

    /// True for failures `try_acquire` may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PlockError::AlreadyLocked { .. } | PlockError::Io { .. } | PlockError::VerifyFailed { .. }
        )
    }

    /// The underlying I/O error kind, if this is an I/O failure.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            PlockError::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

/// Result type alias for plock operations.
pub type Result<T> = std::result::Result<T, PlockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_has_correct_exit_code() {
        let err = PlockError::Config("bad lock name".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
        assert!(!err.is_retryable());
    }

    #[test]
    fn io_error_is_annotated_with_op_and_path() {
        let err = PlockError::io(
            "link",
            "/tmp/x/install.lock",
            io::Error::new(io::ErrorKind::AlreadyExists, "File exists"),
        );
        assert_eq!(err.exit_code(), exit_codes::IO_FAILURE);
        assert_eq!(err.io_kind(), Some(io::ErrorKind::AlreadyExists));
        assert!(err.is_retryable());
        let msg = err.to_string();
        assert!(msg.contains("link"));
        assert!(msg.contains("/tmp/x/install.lock"));
    }

    #[test]
    fn process_errors_have_correct_exit_code() {
        assert_eq!(
            PlockError::StillAlive(42).exit_code(),
            exit_codes::PROCESS_FAILURE
        );
        let err = PlockError::NotKillable {
            pid: 42,
            executable: "bash".to_string(),
        };
        assert_eq!(err.exit_code(), exit_codes::PROCESS_FAILURE);
        assert!(err.to_string().contains("bash"));
    }

    #[test]
    fn lock_errors_have_correct_exit_code() {
        assert_eq!(
            PlockError::NotHeld("install".to_string()).exit_code(),
            exit_codes::LOCK_FAILURE
        );
        let err = PlockError::Timeout {
            name: "install".to_string(),
            waited: Duration::from_secs(2),
            last: "busy".to_string(),
        };
        assert_eq!(err.exit_code(), exit_codes::LOCK_FAILURE);
        assert!(!PlockError::AlreadyHeld("install".to_string()).is_retryable());
    }
}
