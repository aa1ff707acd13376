//! plock: filesystem-based process locks for node agent workflows.
//!
//! Independent processes on one host (or one shared POSIX mount) use a
//! [`locks::Lock`] to take turns on a named resource, e.g. "only one
//! install/upgrade workflow on this node at a time". Exclusion rests on the
//! atomicity of hard-link creation; no daemon or lock server is involved.
//!
//! ```no_run
//! use plock::fs::{FileStore, LocalFileStore};
//! use plock::locks::{Lock, LockManager};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new("/var/run/plock")?);
//! let manager = Arc::new(LockManager::new(store)?);
//! let mut lock = Lock::new("install", 0, manager)?;
//!
//! let _guard = lock.try_lock(Duration::from_secs(30))?;
//! // ... run the install workflow ...
//! # Ok::<(), plock::error::PlockError>(())
//! ```

#[cfg(not(unix))]
compile_error!("plock requires a POSIX filesystem with hard-link semantics");

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod locks;
pub mod logging;
pub mod process;
