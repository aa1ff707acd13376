//! The lock handle and its acquire/release protocol.
//!
//! # Acquisition
//!
//! 1. **Guard**: refuse if this instance already holds the lock.
//! 2. **Check**: ask the manager whether `{name}.lock` is already held.
//! 3. **Prep**: create the pid-marker `{name}.{pid}.lock`. No other process
//!    uses this name, so the create does not race.
//! 4. **Commit**: hard-link `{name}.lock` to the pid-marker. Only one
//!    concurrent link to a given name can succeed; the rest see `EEXIST`.
//! 5. **Verify**: confirm `{name}.lock` and the pid-marker are the same file.
//!
//! A failure in steps 3-5 removes the pid-marker and never the canonical
//! file, which may belong to whoever won the race.

use super::guard::LockGuard;
use super::info::Info;
use super::manager::LockManager;
use super::naming::sanitize_lock_name;
use crate::error::{PlockError, Result};
use crate::fs::FileStore;
use chrono::{DateTime, Utc};
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Interval between attempts in [`Lock::try_acquire`].
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// A named mutual-exclusion handle bound to one process id.
#[derive(Debug)]
pub struct Lock {
    info: Info,
    store: Arc<dyn FileStore>,
    manager: Arc<LockManager>,
    retry_interval: Duration,
}

/// Builder for [`Lock`].
#[derive(Debug)]
pub struct LockBuilder {
    name: String,
    pid: Option<i32>,
    store: Option<Arc<dyn FileStore>>,
    manager: Option<Arc<LockManager>>,
    retry_interval: Duration,
}

impl LockBuilder {
    /// Process id to bind. Non-positive values mean the current process.
    pub fn pid(mut self, pid: i32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn store(mut self, store: Arc<dyn FileStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn manager(mut self, manager: Arc<LockManager>) -> Self {
        self.manager = Some(manager);
        self
    }

    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn build(self) -> Result<Lock> {
        let name = sanitize_lock_name(&self.name)?;

        let store = self.store.ok_or_else(|| {
            PlockError::Config(format!("lock '{}' requires a file store", name))
        })?;
        let manager = self.manager.ok_or_else(|| {
            PlockError::Config(format!("lock '{}' requires a lock manager", name))
        })?;

        let work_dir = store.work_dir().ok_or_else(|| {
            PlockError::Config(format!(
                "lock '{}' requires a store with a work directory",
                name
            ))
        })?;
        if work_dir != manager.work_dir() {
            return Err(PlockError::Config(format!(
                "lock '{}': store work directory '{}' differs from manager work directory '{}'",
                name,
                work_dir.display(),
                manager.work_dir().display()
            )));
        }

        if self.retry_interval.is_zero() {
            return Err(PlockError::Config(format!(
                "lock '{}': retry interval must be greater than zero",
                name
            )));
        }

        let pid = match self.pid {
            Some(pid) if pid > 0 => pid,
            _ => current_pid(),
        };

        let info = Info::new(store.provider(), work_dir, &name, pid);
        Ok(Lock {
            info,
            store,
            manager,
            retry_interval: self.retry_interval,
        })
    }
}

impl Lock {
    /// Start building a lock named `name`.
    pub fn builder(name: &str) -> LockBuilder {
        LockBuilder {
            name: name.to_string(),
            pid: None,
            store: None,
            manager: None,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    /// Create a lock named `name` for `pid` using `manager`'s store.
    pub fn new(name: &str, pid: i32, manager: Arc<LockManager>) -> Result<Self> {
        Self::builder(name)
            .pid(pid)
            .store(Arc::clone(manager.store()))
            .manager(manager)
            .build()
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn pid(&self) -> i32 {
        self.info.pid
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// A snapshot of this lock's descriptor.
    pub fn info(&self) -> Info {
        self.info.clone()
    }

    /// True while this instance believes it holds the lock.
    pub fn is_acquired(&self) -> bool {
        self.info.activated_at.is_some()
    }

    /// Try once to take the lock.
    ///
    /// Fails with [`PlockError::AlreadyLocked`] when another holder owns it.
    pub fn acquire(&mut self) -> Result<()> {
        if self.is_acquired() {
            return Err(PlockError::AlreadyHeld(self.info.name.clone()));
        }

        if let Some(holder) = self.manager.discover_by_lock_name(&self.info.name)? {
            return Err(PlockError::AlreadyLocked {
                holder: Box::new(holder),
            });
        }

        if let Err(e) = self.store.create(&self.info.pid_file_path) {
            if e.io_kind() == Some(io::ErrorKind::AlreadyExists) {
                self.discard_leftover_marker();
            }
            return Err(e);
        }

        match self.commit() {
            Ok(activated_at) => {
                self.info.activated_at = Some(activated_at);
                debug!(lock = %self.info.name, pid = self.info.pid, "acquired lock");
                Ok(())
            }
            Err(e) => {
                if let Err(cleanup) = self.store.delete(&self.info.pid_file_path) {
                    warn!(
                        lock = %self.info.name,
                        error = %cleanup,
                        "failed to remove pid-marker after unsuccessful acquire"
                    );
                }
                Err(e)
            }
        }
    }

    /// Retry [`Lock::acquire`] every retry interval until it succeeds or
    /// `timeout` elapses.
    ///
    /// `timeout` must exceed the retry interval. Contention and I/O failures
    /// are retried; any other failure is returned immediately.
    pub fn try_acquire(&mut self, timeout: Duration) -> Result<()> {
        if timeout <= self.retry_interval {
            return Err(PlockError::Config(format!(
                "timeout {:?} for lock '{}' must be greater than the retry interval {:?}",
                timeout, self.info.name, self.retry_interval
            )));
        }

        let start = Instant::now();
        let deadline = start + timeout;
        loop {
            let err = match self.acquire() {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() => e,
                Err(e) => return Err(e),
            };

            let now = Instant::now();
            if now >= deadline {
                return Err(PlockError::Timeout {
                    name: self.info.name.clone(),
                    waited: now - start,
                    last: err.to_string(),
                });
            }

            debug!(lock = %self.info.name, error = %err, "lock busy, retrying");
            thread::sleep(self.retry_interval.min(deadline - now));
        }
    }

    /// Give the lock up, removing the pid-marker and then the canonical file.
    ///
    /// The marker goes first: if only the canonical file survives a crash,
    /// it is reported without a live owner and can be reset. The canonical
    /// file is only deleted while it is still our marker's file; one that was
    /// reset and re-taken by another holder is left alone.
    pub fn release(&mut self) -> Result<()> {
        if !self.is_acquired() {
            return Err(PlockError::NotHeld(self.info.name.clone()));
        }

        let marker = self.store.stat(&self.info.pid_file_path)?;
        self.store.delete(&self.info.pid_file_path)?;

        match self.store.stat(&self.info.lock_file_path) {
            Ok(canonical) if canonical.same_file(&marker) => {
                self.store.delete(&self.info.lock_file_path)?;
            }
            Ok(_) => warn!(
                lock = %self.info.name,
                pid = self.info.pid,
                "canonical lock file belongs to another holder; leaving it in place"
            ),
            Err(e) if e.io_kind() == Some(io::ErrorKind::NotFound) => warn!(
                lock = %self.info.name,
                pid = self.info.pid,
                "canonical lock file was already removed"
            ),
            Err(e) => return Err(e),
        }

        self.info.activated_at = None;
        debug!(lock = %self.info.name, pid = self.info.pid, "released lock");
        Ok(())
    }

    /// Acquire and return a guard that releases on drop.
    pub fn lock(&mut self) -> Result<LockGuard<'_>> {
        self.acquire()?;
        Ok(LockGuard::new(self))
    }

    /// [`Lock::try_acquire`] and return a guard that releases on drop.
    pub fn try_lock(&mut self, timeout: Duration) -> Result<LockGuard<'_>> {
        self.try_acquire(timeout)?;
        Ok(LockGuard::new(self))
    }

    /// Link the canonical file to our marker and confirm the link.
    fn commit(&self) -> Result<DateTime<Utc>> {
        if let Err(e) = self
            .store
            .link(&self.info.pid_file_path, &self.info.lock_file_path)
        {
            if e.io_kind() == Some(io::ErrorKind::AlreadyExists)
                && let Ok(Some(holder)) = self.manager.discover_by_lock_name(&self.info.name)
            {
                return Err(PlockError::AlreadyLocked {
                    holder: Box::new(holder),
                });
            }
            return Err(e);
        }

        let canonical = self.store.stat(&self.info.lock_file_path)?;
        let marker = self.store.stat(&self.info.pid_file_path)?;
        if !canonical.same_file(&marker) {
            return Err(PlockError::VerifyFailed {
                name: self.info.name.clone(),
                lock_file: self.info.lock_file_path.clone(),
                pid_file: self.info.pid_file_path.clone(),
            });
        }

        Ok(canonical.modified)
    }

    /// Remove a pid-marker left by an earlier aborted attempt with this pid.
    ///
    /// A marker still linked to the canonical file is in use and kept.
    fn discard_leftover_marker(&self) {
        let linked = match self.store.stat(&self.info.pid_file_path) {
            Ok(stat) => stat.nlink > 1,
            Err(_) => return,
        };
        if linked {
            return;
        }

        match self.store.delete(&self.info.pid_file_path) {
            Ok(()) => debug!(lock = %self.info.name, "removed leftover pid-marker"),
            Err(e) => warn!(lock = %self.info.name, error = %e, "failed to remove leftover pid-marker"),
        }
    }
}

pub(crate) fn current_pid() -> i32 {
    i32::try_from(std::process::id()).unwrap_or(i32::MAX)
}
