//! RAII guard implementation.

use super::info::Info;
use super::lock::Lock;
use crate::error::Result;
use tracing::warn;

/// RAII guard for an acquired [`Lock`].
///
/// When dropped, the lock is released. If releasing fails, a warning is
/// logged but no panic occurs; the leftover artifacts show up as a stale lock
/// once this process exits.
#[derive(Debug)]
pub struct LockGuard<'a> {
    lock: &'a mut Lock,

    /// Whether the lock has been released manually.
    released: bool,
}

impl<'a> LockGuard<'a> {
    pub(super) fn new(lock: &'a mut Lock) -> Self {
        Self {
            lock,
            released: false,
        }
    }

    /// Snapshot of the held lock.
    pub fn info(&self) -> Info {
        self.lock.info()
    }

    /// Manually release the lock.
    ///
    /// Useful when the caller wants to handle release errors explicitly.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.lock.release()
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if !self.released
            && self.lock.is_acquired()
            && let Err(e) = self.lock.release()
        {
            warn!(lock = %self.lock.name(), error = %e, "failed to release lock");
        }
    }
}
