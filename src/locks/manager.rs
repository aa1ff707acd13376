//! Directory-wide lock discovery and stale-lock maintenance.
//!
//! The manager is a scanner, not an index: every query re-reads the work
//! directory, so its answers are only as fresh as the call that produced them.

use super::info::Info;
use super::lock::current_pid;
use super::naming::{
    Artifact, LOCK_SUFFIX, UNKNOWN_PID, lock_file_name, parse_artifact, reset_file_name,
    sanitize_lock_name,
};
use crate::error::{PlockError, Result};
use crate::fs::{FileStat, FileStore};
use crate::process::{ProcessProbe, SystemProbe};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Distinguishes concurrent resets within one process.
static RESET_SEQ: AtomicU64 = AtomicU64::new(0);

/// Result of [`LockManager::reset_lock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The pid was not running; these locks were removed.
    Cleared(Vec<Info>),
    /// The pid was running an allow-listed executable and was sent SIGTERM.
    /// Its lock files are left for the process itself or a later stale sweep.
    Signalled { pid: i32, executable: String },
}

/// Registry view over every lock artifact in one work directory.
#[derive(Debug, Clone)]
pub struct LockManager {
    store: Arc<dyn FileStore>,
    probe: Arc<dyn ProcessProbe>,
    work_dir: PathBuf,
}

impl LockManager {
    /// Create a manager over `store`, probing liveness with [`SystemProbe`].
    pub fn new(store: Arc<dyn FileStore>) -> Result<Self> {
        Self::with_probe(store, Arc::new(SystemProbe))
    }

    /// Create a manager with a custom liveness probe.
    pub fn with_probe(store: Arc<dyn FileStore>, probe: Arc<dyn ProcessProbe>) -> Result<Self> {
        let work_dir = store
            .work_dir()
            .ok_or_else(|| {
                PlockError::Config("lock manager requires a store with a work directory".to_string())
            })?
            .to_path_buf();

        Ok(Self {
            store,
            probe,
            work_dir,
        })
    }

    pub fn store(&self) -> &Arc<dyn FileStore> {
        &self.store
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Whether `pid` passes the liveness probe.
    pub fn is_alive(&self, pid: i32) -> bool {
        self.probe.is_alive(pid)
    }

    /// Describe lock `name` held by `pid` in this manager's directory.
    pub(crate) fn info_for(&self, name: &str, pid: i32) -> Info {
        Info::new(self.store.provider(), &self.work_dir, name, pid)
    }

    /// All active locks, keyed by holder pid.
    ///
    /// At most `max_count` canonical files are considered. Orphaned canonical
    /// files (no linked pid-marker) are reported under [`UNKNOWN_PID`].
    /// Unrecognized file names are skipped.
    pub fn discover(&self, max_count: Option<usize>) -> Result<BTreeMap<i32, Vec<Info>>> {
        let files = self.store.list(&self.work_dir, LOCK_SUFFIX, None)?;

        let mut found: BTreeMap<i32, Vec<Info>> = BTreeMap::new();
        let mut count = 0;
        for file in files {
            if max_count.is_some_and(|max| count >= max) {
                break;
            }

            match parse_artifact(&file) {
                Some(Artifact::Canonical { name }) => {
                    if let Some(info) = self.resolve_holder(&name)? {
                        count += 1;
                        found.entry(info.pid).or_default().push(info);
                    }
                }
                Some(Artifact::PidMarker { .. }) => {}
                None => warn!(file = %file, "skipping unrecognized lock artifact"),
            }
        }

        Ok(found)
    }

    /// Every pid-marker owned by `pid`, across lock names.
    ///
    /// `activated_at` is set on markers currently linked to their canonical file.
    pub fn discover_by_pid(&self, pid: i32) -> Result<Vec<Info>> {
        let filter = format!(".{}{}", pid, LOCK_SUFFIX);
        let files = self.store.list(&self.work_dir, &filter, None)?;

        let mut infos = Vec::new();
        for file in files {
            let name = match parse_artifact(&file) {
                Some(Artifact::PidMarker { name, pid: owner }) if owner == pid => name,
                Some(_) => continue,
                None => {
                    warn!(file = %file, "skipping unrecognized lock artifact");
                    continue;
                }
            };

            let info = self.info_for(&name, pid);
            let Some(marker) = self.stat_if_exists(&info.pid_file_path)? else {
                continue;
            };
            let activated_at = self
                .stat_if_exists(&info.lock_file_path)?
                .filter(|canonical| canonical.same_file(&marker))
                .map(|canonical| canonical.modified);

            infos.push(info.with_activated_at(activated_at));
        }

        Ok(infos)
    }

    /// The current holder of lock `name`, if its canonical file exists.
    pub fn discover_by_lock_name(&self, name: &str) -> Result<Option<Info>> {
        let name = sanitize_lock_name(name)?;
        self.resolve_holder(&name)
    }

    /// Active locks whose holder pid fails the liveness probe.
    pub fn discover_stale_locks(
        &self,
        max_count: Option<usize>,
    ) -> Result<BTreeMap<i32, Vec<Info>>> {
        let mut found = self.discover(max_count)?;
        found.retain(|pid, _| !self.probe.is_alive(*pid));
        Ok(found)
    }

    /// Remove both artifacts of a stale lock.
    ///
    /// Refuses, deleting nothing, while `info.pid` is alive.
    ///
    /// Both files are renamed to private names before anything is judged, so
    /// the file compared is the file deleted and the marker's inode cannot be
    /// reused meanwhile. The canonical file is removed if it is the stale
    /// marker's file (or, with no marker left, if nothing else links to it).
    /// Anything else belongs to a holder that took the lock since discovery
    /// and is linked back in place.
    pub fn reset_stale_lock(&self, info: &Info) -> Result<()> {
        if self.probe.is_alive(info.pid) {
            return Err(PlockError::StillAlive(info.pid));
        }

        let name = sanitize_lock_name(&info.name)?;
        let target = self.info_for(&name, info.pid);

        let parked_marker = self.park(&name, &target.pid_file_path)?;
        let result = self.reset_canonical(&target, parked_marker.as_deref());
        if let Some(parked_marker) = parked_marker {
            self.delete_if_exists(&parked_marker)?;
        }
        result?;

        info!(lock = %target.name, pid = target.pid, "reset stale lock");
        Ok(())
    }

    /// Reset every stale lock in the directory, returning what was removed.
    pub fn reset_stale_locks(&self) -> Result<Vec<Info>> {
        let stale = self.discover_stale_locks(None)?;

        let mut reset = Vec::new();
        for info in stale.into_values().flatten() {
            self.reset_stale_lock(&info)?;
            reset.push(info);
        }
        Ok(reset)
    }

    /// Clear the locks held by `pid`.
    ///
    /// A dead pid has its locks reset. A live pid is sent SIGTERM if its
    /// executable name appears in `killable`; its lock files are left in
    /// place. Any other live pid is an error.
    pub fn reset_lock<S: AsRef<str>>(&self, pid: i32, killable: &[S]) -> Result<ResetOutcome> {
        if !self.probe.is_alive(pid) {
            let held = self.locks_held_by(pid)?;
            for info in &held {
                self.reset_stale_lock(info)?;
            }
            return Ok(ResetOutcome::Cleared(held));
        }

        let executable = self.probe.executable_name(pid)?;
        if !killable.iter().any(|k| k.as_ref() == executable) {
            return Err(PlockError::NotKillable { pid, executable });
        }

        self.probe.terminate(pid)?;
        info!(pid, executable = %executable, "sent termination signal to lock holder");
        Ok(ResetOutcome::Signalled { pid, executable })
    }

    fn locks_held_by(&self, pid: i32) -> Result<Vec<Info>> {
        if pid == UNKNOWN_PID {
            return Ok(self.discover(None)?.remove(&UNKNOWN_PID).unwrap_or_default());
        }
        self.discover_by_pid(pid)
    }

    /// Pair canonical file `{name}.lock` with the pid-marker linked to it.
    fn resolve_holder(&self, name: &str) -> Result<Option<Info>> {
        let lock_path = self.work_dir.join(lock_file_name(name));
        let Some(canonical) = self.stat_if_exists(&lock_path)? else {
            return Ok(None);
        };

        let pid = match self.linked_marker_pid(name, &canonical)? {
            Some(pid) => pid,
            None => {
                debug!(lock = %name, "canonical lock file has no linked pid-marker");
                UNKNOWN_PID
            }
        };

        Ok(Some(
            self.info_for(name, pid)
                .with_activated_at(Some(canonical.modified)),
        ))
    }

    fn linked_marker_pid(&self, name: &str, canonical: &FileStat) -> Result<Option<i32>> {
        if canonical.nlink <= 1 {
            return Ok(None);
        }

        let prefix = format!("{}.", name);
        for file in self.store.list(&self.work_dir, &prefix, None)? {
            let pid = match parse_artifact(&file) {
                Some(Artifact::PidMarker { name: owner, pid }) if owner == name => pid,
                _ => continue,
            };

            if let Some(marker) = self.stat_if_exists(&self.work_dir.join(&file))?
                && marker.same_file(canonical)
            {
                return Ok(Some(pid));
            }
        }

        Ok(None)
    }

    /// Rename `path` to a fresh reset name, or `None` if it does not exist.
    fn park(&self, name: &str, path: &Path) -> Result<Option<PathBuf>> {
        let parked = self.work_dir.join(reset_file_name(
            name,
            current_pid(),
            RESET_SEQ.fetch_add(1, Ordering::Relaxed),
        ));
        match self.store.rename(path, &parked) {
            Ok(()) => Ok(Some(parked)),
            Err(e) if e.io_kind() == Some(io::ErrorKind::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn reset_canonical(&self, target: &Info, parked_marker: Option<&Path>) -> Result<()> {
        let Some(parked) = self.park(&target.name, &target.lock_file_path)? else {
            return Ok(());
        };

        let is_stale = self.store.stat(&parked).and_then(|canonical| match parked_marker {
            Some(marker) => Ok(self.store.stat(marker)?.same_file(&canonical)),
            None => Ok(canonical.nlink <= 1),
        });
        if let Ok(true) = is_stale {
            return self.store.delete(&parked);
        }

        warn!(
            lock = %target.name,
            pid = target.pid,
            "canonical lock file belongs to another holder; restoring it"
        );
        let restored = self.store.link(&parked, &target.lock_file_path);
        self.delete_if_exists(&parked)?;
        if let Err(e) = restored {
            warn!(lock = %target.name, error = %e, "failed to restore canonical lock file");
            return Err(e);
        }
        is_stale.map(|_| ())
    }

    fn stat_if_exists(&self, path: &Path) -> Result<Option<FileStat>> {
        match self.store.stat(path) {
            Ok(stat) => Ok(Some(stat)),
            Err(e) if e.io_kind() == Some(io::ErrorKind::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn delete_if_exists(&self, path: &Path) -> Result<()> {
        match self.store.delete(path) {
            Ok(()) => Ok(()),
            Err(e) if e.io_kind() == Some(io::ErrorKind::NotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
