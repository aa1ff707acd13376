//! Process lock subsystem.
//!
//! Lets independent OS processes take turns on a shared resource (e.g. "one
//! install/upgrade workflow per node") using only atomic filesystem
//! operations; no lock server is involved.
//!
//! # Lock Files
//!
//! Each lock name owns up to two kinds of artifact in the flat work directory:
//! - `{name}.{pid}.lock`: pid-marker, unique to one process's attempt
//! - `{name}.lock`: canonical file, hard-linked to the holder's pid-marker
//!
//! The canonical file can only be created by `link(2)`, which fails if the
//! name already exists. That single atomic step is what makes the lock
//! exclusive, across processes and across hosts sharing the mount.
//!
//! # Staleness
//!
//! A process that dies without releasing leaves its pair behind. The
//! [`LockManager`] finds such pairs by probing the embedded pid and removes
//! them on request; a [`Lock`] never clears a stale lock on its own.
//!
//! # RAII Guards
//!
//! [`Lock::lock`] and [`Lock::try_lock`] return a [`LockGuard`] that releases
//! the lock when dropped.

mod guard;
mod info;
mod lock;
mod manager;
pub mod naming;

#[cfg(test)]
mod tests;

// Re-export public API
pub use guard::LockGuard;
pub use info::Info;
pub use lock::{DEFAULT_RETRY_INTERVAL, Lock, LockBuilder};
pub use manager::{LockManager, ResetOutcome};
pub use naming::UNKNOWN_PID;
