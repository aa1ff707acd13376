//! Tests for the locks subsystem.

use super::*;
use crate::error::PlockError;
use crate::fs::{FileStore, LocalFileStore};
use crate::process::ProcessProbe;
use std::collections::{HashMap, HashSet};
use std::os::unix::fs::MetadataExt;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

/// Above the kernel's maximum pid, so never alive.
const DEAD_PID: i32 = 999_999_999;

/// Liveness probe with a scripted set of running processes.
#[derive(Debug, Default)]
struct FakeProbe {
    alive: HashSet<i32>,
    executables: HashMap<i32, String>,
    terminated: Mutex<Vec<i32>>,
}

impl FakeProbe {
    fn running(pid: i32, executable: &str) -> Self {
        Self {
            alive: HashSet::from([pid]),
            executables: HashMap::from([(pid, executable.to_string())]),
            terminated: Mutex::new(Vec::new()),
        }
    }
}

impl ProcessProbe for FakeProbe {
    fn is_alive(&self, pid: i32) -> bool {
        self.alive.contains(&pid)
    }

    fn executable_name(&self, pid: i32) -> crate::error::Result<String> {
        self.executables
            .get(&pid)
            .cloned()
            .ok_or_else(|| PlockError::Process(format!("no executable for {}", pid)))
    }

    fn terminate(&self, pid: i32) -> crate::error::Result<()> {
        self.terminated.lock().unwrap().push(pid);
        Ok(())
    }
}

type Hook = Box<dyn FnOnce() + Send>;

/// Local store that runs a callback once, just before the first rename away
/// from `trigger`.
struct HookStore {
    inner: LocalFileStore,
    trigger: PathBuf,
    hook: Mutex<Option<Hook>>,
}

impl HookStore {
    fn new(dir: &Path, trigger: PathBuf) -> Self {
        Self {
            inner: LocalFileStore::new(dir).unwrap(),
            trigger,
            hook: Mutex::new(None),
        }
    }

    fn set_hook(&self, hook: impl FnOnce() + Send + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }
}

impl fmt::Debug for HookStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookStore")
            .field("inner", &self.inner)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

impl FileStore for HookStore {
    fn provider(&self) -> &'static str {
        self.inner.provider()
    }

    fn set_work_dir(&mut self, dir: &Path) -> crate::error::Result<()> {
        self.inner.set_work_dir(dir)
    }

    fn work_dir(&self) -> Option<&Path> {
        self.inner.work_dir()
    }

    fn stat(&self, path: &Path) -> crate::error::Result<crate::fs::FileStat> {
        self.inner.stat(path)
    }

    fn exists(&self, path: &Path) -> crate::error::Result<bool> {
        self.inner.exists(path)
    }

    fn create(&self, path: &Path) -> crate::error::Result<std::fs::File> {
        self.inner.create(path)
    }

    fn delete(&self, path: &Path) -> crate::error::Result<()> {
        self.inner.delete(path)
    }

    fn link(&self, original: &Path, link: &Path) -> crate::error::Result<()> {
        self.inner.link(original, link)
    }

    fn rename(&self, from: &Path, to: &Path) -> crate::error::Result<()> {
        if from == self.trigger {
            let hook = self.hook.lock().unwrap().take();
            if let Some(hook) = hook {
                hook();
            }
        }
        self.inner.rename(from, to)
    }

    fn list(
        &self,
        dir: &Path,
        filter: &str,
        max_count: Option<usize>,
    ) -> crate::error::Result<Vec<String>> {
        self.inner.list(dir, filter, max_count)
    }
}

fn create_test_manager() -> (TempDir, Arc<LockManager>) {
    let temp_dir = TempDir::new().unwrap();
    let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(temp_dir.path()).unwrap());
    let manager = Arc::new(LockManager::new(store).unwrap());
    (temp_dir, manager)
}

fn create_test_manager_with_probe(probe: Arc<FakeProbe>) -> (TempDir, Arc<LockManager>) {
    let temp_dir = TempDir::new().unwrap();
    let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(temp_dir.path()).unwrap());
    let manager = Arc::new(LockManager::with_probe(store, probe).unwrap());
    (temp_dir, manager)
}

fn new_lock(manager: &Arc<LockManager>, name: &str, pid: i32) -> Lock {
    Lock::new(name, pid, Arc::clone(manager)).unwrap()
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_builder_rejects_empty_sanitized_name() {
    let (_temp_dir, manager) = create_test_manager();
    let err = Lock::new("../..", 1, manager).unwrap_err();
    assert!(matches!(err, PlockError::Config(_)));
}

#[test]
fn test_builder_requires_store_and_manager() {
    let (temp_dir, manager) = create_test_manager();

    let err = Lock::builder("install")
        .manager(Arc::clone(&manager))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("file store"));

    let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(temp_dir.path()).unwrap());
    let err = Lock::builder("install").store(store).build().unwrap_err();
    assert!(err.to_string().contains("lock manager"));
}

#[test]
fn test_builder_rejects_store_outside_manager_directory() {
    let (_temp_dir, manager) = create_test_manager();
    let other_dir = TempDir::new().unwrap();
    let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(other_dir.path()).unwrap());

    let result = Lock::builder("install").store(store).manager(manager).build();
    assert!(matches!(result, Err(PlockError::Config(_))));
}

#[test]
fn test_manager_requires_work_dir() {
    let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::default());
    assert!(matches!(
        LockManager::new(store),
        Err(PlockError::Config(_))
    ));
}

#[test]
fn test_non_positive_pid_defaults_to_current_process() {
    let (_temp_dir, manager) = create_test_manager();
    let current = std::process::id() as i32;

    assert_eq!(new_lock(&manager, "install", 0).pid(), current);
    assert_eq!(new_lock(&manager, "install", -7).pid(), current);
    assert_eq!(new_lock(&manager, "install", 4321).pid(), 4321);
}

#[test]
fn test_lock_name_is_sanitized() {
    let (temp_dir, manager) = create_test_manager();
    let lock = new_lock(&manager, "helm/install", 4321);

    let info = lock.info();
    assert_eq!(info.name, "helminstall");
    assert_eq!(info.lock_file_path, temp_dir.path().join("helminstall.lock"));
    assert_eq!(info.provider, "local");
    assert!(!lock.is_acquired());
}

// ============================================================================
// Acquire / release
// ============================================================================

#[test]
fn test_scenario_acquire_release_reacquire_same_pid() {
    let (temp_dir, manager) = create_test_manager();
    let mut lock = new_lock(&manager, "install", 4321);

    lock.acquire().unwrap();
    assert!(lock.is_acquired());

    let canonical = temp_dir.path().join("install.lock");
    let marker = temp_dir.path().join("install.4321.lock");
    let canonical_meta = std::fs::metadata(&canonical).unwrap();
    let marker_meta = std::fs::metadata(&marker).unwrap();
    assert_eq!(canonical_meta.ino(), marker_meta.ino());
    assert_eq!(canonical_meta.dev(), marker_meta.dev());
    assert!(lock.info().activated_at.is_some());

    lock.release().unwrap();
    assert!(!lock.is_acquired());
    assert!(!canonical.exists());
    assert!(!marker.exists());
    assert!(lock.info().activated_at.is_none());

    lock.acquire().unwrap();
    assert!(canonical.exists());
    lock.release().unwrap();
}

#[test]
fn test_scenario_competing_pid_is_rejected() {
    let (_temp_dir, manager) = create_test_manager();
    let mut holder = new_lock(&manager, "install", 4321);
    let mut contender = new_lock(&manager, "install", 4322);

    holder.acquire().unwrap();

    let err = contender.acquire().unwrap_err();
    match &err {
        PlockError::AlreadyLocked { holder } => {
            assert_eq!(holder.pid, 4321);
            assert_eq!(holder.name, "install");
        }
        other => panic!("expected AlreadyLocked, got {:?}", other),
    }
    assert!(err.to_string().contains("already held by pid 4321"));
    assert!(!contender.is_acquired());

    let current = manager.discover_by_lock_name("install").unwrap().unwrap();
    assert_eq!(current.pid, 4321);
}

#[test]
fn test_release_then_other_pid_acquires() {
    let (temp_dir, manager) = create_test_manager();
    let mut first = new_lock(&manager, "install", 100);
    let mut second = new_lock(&manager, "install", 200);

    first.acquire().unwrap();
    first.release().unwrap();
    assert!(dir_entries(temp_dir.path()).is_empty());

    second.acquire().unwrap();
    assert_eq!(
        dir_entries(temp_dir.path()),
        vec!["install.200.lock", "install.lock"]
    );
}

#[test]
fn test_second_acquire_on_held_instance_changes_nothing() {
    let (temp_dir, manager) = create_test_manager();
    let mut lock = new_lock(&manager, "install", 4321);

    lock.acquire().unwrap();
    let before = dir_entries(temp_dir.path());
    let activated_at = lock.info().activated_at;

    let err = lock.acquire().unwrap_err();
    assert!(matches!(err, PlockError::AlreadyHeld(_)));
    assert_eq!(dir_entries(temp_dir.path()), before);
    assert_eq!(lock.info().activated_at, activated_at);
    assert!(lock.is_acquired());
}

#[test]
fn test_release_without_acquire_fails() {
    let (_temp_dir, manager) = create_test_manager();
    let mut lock = new_lock(&manager, "install", 4321);

    let err = lock.release().unwrap_err();
    assert!(matches!(err, PlockError::NotHeld(_)));
}

#[test]
fn test_info_is_an_independent_snapshot() {
    let (_temp_dir, manager) = create_test_manager();
    let mut lock = new_lock(&manager, "install", 4321);

    let before = lock.info();
    lock.acquire().unwrap();

    assert!(before.activated_at.is_none());
    assert!(lock.info().activated_at.is_some());
}

#[test]
fn test_acquire_removes_leftover_marker_from_aborted_attempt() {
    let (temp_dir, manager) = create_test_manager();
    std::fs::write(temp_dir.path().join("install.4321.lock"), "").unwrap();
    let mut lock = new_lock(&manager, "install", 4321);

    let err = lock.acquire().unwrap_err();
    assert_eq!(err.io_kind(), Some(std::io::ErrorKind::AlreadyExists));
    assert!(dir_entries(temp_dir.path()).is_empty());

    lock.acquire().unwrap();
    assert!(lock.is_acquired());
}

#[test]
fn test_concurrent_acquires_yield_exactly_one_winner() {
    const CONTENDERS: i32 = 1000;
    let (temp_dir, manager) = create_test_manager();
    let barrier = Arc::new(Barrier::new(CONTENDERS as usize));

    let winners: Vec<i32> = thread::scope(|scope| {
        let handles: Vec<_> = (0..CONTENDERS)
            .map(|i| {
                let manager = Arc::clone(&manager);
                let barrier = Arc::clone(&barrier);
                scope.spawn(move || {
                    let mut lock = new_lock(&manager, "install", 10_000 + i);
                    barrier.wait();
                    lock.acquire().ok().map(|()| lock.pid())
                })
            })
            .collect();

        handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .collect()
    });

    assert_eq!(winners.len(), 1, "winners: {:?}", winners);

    // Losers clean up their markers; only the winner's pair remains.
    let winner = winners[0];
    assert_eq!(
        dir_entries(temp_dir.path()),
        vec![format!("install.{}.lock", winner), "install.lock".to_string()]
    );
    assert_eq!(
        manager.discover_by_lock_name("install").unwrap().unwrap().pid,
        winner
    );
}

// ============================================================================
// try_acquire
// ============================================================================

#[test]
fn test_try_acquire_rejects_timeout_not_above_retry_interval() {
    let (temp_dir, manager) = create_test_manager();
    let mut lock = new_lock(&manager, "install", 4321);

    let err = lock.try_acquire(DEFAULT_RETRY_INTERVAL).unwrap_err();
    assert!(matches!(err, PlockError::Config(_)));

    let err = lock.try_acquire(Duration::from_millis(1)).unwrap_err();
    assert!(matches!(err, PlockError::Config(_)));

    assert!(!lock.is_acquired());
    assert!(dir_entries(temp_dir.path()).is_empty());
}

#[test]
fn test_try_acquire_times_out_while_held() {
    let (_temp_dir, manager) = create_test_manager();
    let mut holder = new_lock(&manager, "install", 1);
    holder.acquire().unwrap();

    let mut waiter = Lock::builder("install")
        .pid(2)
        .store(Arc::clone(manager.store()))
        .manager(Arc::clone(&manager))
        .retry_interval(Duration::from_millis(10))
        .build()
        .unwrap();

    let err = waiter.try_acquire(Duration::from_millis(80)).unwrap_err();
    match err {
        PlockError::Timeout { name, waited, last } => {
            assert_eq!(name, "install");
            assert!(waited >= Duration::from_millis(80));
            assert!(last.contains("already held"));
        }
        other => panic!("expected Timeout, got {:?}", other),
    }
    assert!(!waiter.is_acquired());
}

#[test]
fn test_try_acquire_succeeds_once_holder_releases() {
    let (_temp_dir, manager) = create_test_manager();
    let mut holder = new_lock(&manager, "install", 1);
    holder.acquire().unwrap();

    let mut waiter = Lock::builder("install")
        .pid(2)
        .store(Arc::clone(manager.store()))
        .manager(Arc::clone(&manager))
        .retry_interval(Duration::from_millis(10))
        .build()
        .unwrap();

    thread::scope(|scope| {
        scope.spawn(|| {
            thread::sleep(Duration::from_millis(50));
            holder.release().unwrap();
        });

        waiter.try_acquire(Duration::from_secs(5)).unwrap();
    });

    assert!(waiter.is_acquired());
    assert_eq!(
        manager.discover_by_lock_name("install").unwrap().unwrap().pid,
        2
    );
}

#[test]
fn test_try_acquire_does_not_retry_reentrant_acquire() {
    let (_temp_dir, manager) = create_test_manager();
    let mut lock = new_lock(&manager, "install", 1);
    lock.acquire().unwrap();

    let err = lock.try_acquire(Duration::from_secs(30)).unwrap_err();
    assert!(matches!(err, PlockError::AlreadyHeld(_)));
}

// ============================================================================
// Guards
// ============================================================================

#[test]
fn test_guard_releases_on_drop() {
    let (temp_dir, manager) = create_test_manager();
    let mut lock = new_lock(&manager, "install", 4321);

    {
        let guard = lock.lock().unwrap();
        assert_eq!(guard.info().pid, 4321);
        assert!(temp_dir.path().join("install.lock").exists());
    }

    assert!(!lock.is_acquired());
    assert!(dir_entries(temp_dir.path()).is_empty());
}

#[test]
fn test_guard_manual_release() {
    let (temp_dir, manager) = create_test_manager();
    let mut lock = new_lock(&manager, "install", 4321);

    let guard = lock.try_lock(Duration::from_secs(2)).unwrap();
    guard.release().unwrap();

    assert!(dir_entries(temp_dir.path()).is_empty());
    assert!(!lock.is_acquired());
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_discover_maps_holders_by_pid() {
    let (_temp_dir, manager) = create_test_manager();
    let mut a = new_lock(&manager, "install", 10);
    let mut b = new_lock(&manager, "upgrade", 10);
    let mut c = new_lock(&manager, "uninstall", 20);
    a.acquire().unwrap();
    b.acquire().unwrap();
    c.acquire().unwrap();

    let found = manager.discover(None).unwrap();
    assert_eq!(found.len(), 2);
    let names: Vec<&str> = found[&10].iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["install", "upgrade"]);
    assert_eq!(found[&20][0].name, "uninstall");
    assert!(found[&20][0].activated_at.is_some());

    let capped = manager.discover(Some(1)).unwrap();
    assert_eq!(capped.values().map(Vec::len).sum::<usize>(), 1);
}

#[test]
fn test_discover_skips_unrecognized_entries() {
    let (temp_dir, manager) = create_test_manager();
    for junk in ["a.b.c.lock", "install.abc.lock", "bad name.lock", "notes.txt"] {
        std::fs::write(temp_dir.path().join(junk), "").unwrap();
    }
    let mut lock = new_lock(&manager, "install", 10);
    lock.acquire().unwrap();

    let found = manager.discover(None).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[&10][0].name, "install");
}

#[test]
fn test_discover_by_pid_spans_lock_names() {
    let (temp_dir, manager) = create_test_manager();
    let mut a = new_lock(&manager, "install", 777);
    let mut b = new_lock(&manager, "upgrade", 777);
    let mut other = new_lock(&manager, "probe", 7770);
    a.acquire().unwrap();
    b.acquire().unwrap();
    other.acquire().unwrap();
    // An unlinked marker for the same pid is reported without activation.
    std::fs::write(temp_dir.path().join("backup.777.lock"), "").unwrap();

    let infos = manager.discover_by_pid(777).unwrap();
    let summary: Vec<(&str, bool)> = infos
        .iter()
        .map(|i| (i.name.as_str(), i.activated_at.is_some()))
        .collect();
    assert_eq!(
        summary,
        vec![("backup", false), ("install", true), ("upgrade", true)]
    );
}

#[test]
fn test_discover_by_lock_name_ignores_similar_names() {
    let (_temp_dir, manager) = create_test_manager();
    let mut pre = new_lock(&manager, "preinstall", 5);
    pre.acquire().unwrap();

    assert!(manager.discover_by_lock_name("install").unwrap().is_none());
    let found = manager.discover_by_lock_name("pre/install").unwrap().unwrap();
    assert_eq!(found.pid, 5);
}

// ============================================================================
// Stale locks
// ============================================================================

#[test]
fn test_stale_lock_detected_and_reset() {
    let (temp_dir, manager) = create_test_manager();
    let mut dead = new_lock(&manager, "install", DEAD_PID);
    dead.acquire().unwrap();
    let mut live = new_lock(&manager, "upgrade", 0);
    live.acquire().unwrap();

    let stale = manager.discover_stale_locks(None).unwrap();
    assert_eq!(stale.len(), 1);
    let info = &stale[&DEAD_PID][0];
    assert_eq!(info.name, "install");

    manager.reset_stale_lock(info).unwrap();

    let found = manager.discover(None).unwrap();
    assert!(!found.contains_key(&DEAD_PID));
    assert!(!temp_dir.path().join("install.lock").exists());
    assert!(!temp_dir.path().join(format!("install.{}.lock", DEAD_PID)).exists());
    assert!(temp_dir.path().join("upgrade.lock").exists());
}

#[test]
fn test_reset_stale_lock_refuses_live_pid() {
    let (temp_dir, manager) = create_test_manager();
    let mut lock = new_lock(&manager, "install", 0);
    lock.acquire().unwrap();
    let before = dir_entries(temp_dir.path());

    let err = manager.reset_stale_lock(&lock.info()).unwrap_err();
    assert!(matches!(err, PlockError::StillAlive(pid) if pid == lock.pid()));
    assert_eq!(dir_entries(temp_dir.path()), before);
}

#[test]
fn test_reset_stale_lock_keeps_canonical_taken_over_by_new_holder() {
    let (_temp_dir, manager) = create_test_manager();
    let mut dead = new_lock(&manager, "install", DEAD_PID);
    dead.acquire().unwrap();
    let stale_info = dead.info();

    dead.release().unwrap();
    let mut successor = new_lock(&manager, "install", 0);
    successor.acquire().unwrap();

    manager.reset_stale_lock(&stale_info).unwrap();

    let holder = manager.discover_by_lock_name("install").unwrap().unwrap();
    assert_eq!(holder.pid, successor.pid());
    successor.release().unwrap();
}

#[test]
fn test_overlapping_resets_keep_lock_taken_in_between() {
    let temp_dir = TempDir::new().unwrap();
    let stale_marker = temp_dir.path().join(format!("install.{}.lock", DEAD_PID));
    let store = Arc::new(HookStore::new(temp_dir.path(), stale_marker));
    let shared: Arc<dyn FileStore> = store.clone();
    let manager = Arc::new(LockManager::new(shared).unwrap());

    let mut dead = new_lock(&manager, "install", DEAD_PID);
    dead.acquire().unwrap();
    let stale_info = dead.info();

    // A second resetter finishes and a new holder takes the lock while the
    // first resetter is still between its discovery and its cleanup.
    let successor = Arc::new(Mutex::new(None));
    {
        let manager = Arc::clone(&manager);
        let stale_info = stale_info.clone();
        let successor = Arc::clone(&successor);
        store.set_hook(move || {
            manager.reset_stale_lock(&stale_info).unwrap();
            let mut lock = new_lock(&manager, "install", 0);
            lock.acquire().unwrap();
            *successor.lock().unwrap() = Some(lock);
        });
    }

    manager.reset_stale_lock(&stale_info).unwrap();

    let mut successor = successor.lock().unwrap().take().unwrap();
    assert_eq!(
        dir_entries(temp_dir.path()),
        vec![
            format!("install.{}.lock", successor.pid()),
            "install.lock".to_string()
        ]
    );
    let holder = manager.discover_by_lock_name("install").unwrap().unwrap();
    assert_eq!(holder.pid, successor.pid());

    // With the canonical file intact, contenders are still turned away.
    let mut contender = new_lock(&manager, "install", 4242);
    assert!(matches!(
        contender.acquire(),
        Err(PlockError::AlreadyLocked { .. })
    ));

    successor.release().unwrap();
    assert!(dir_entries(temp_dir.path()).is_empty());
}

#[test]
fn test_release_leaves_canonical_of_new_holder() {
    let (temp_dir, manager) = create_test_manager();
    let mut first = new_lock(&manager, "install", 4321);
    first.acquire().unwrap();

    // The canonical file is removed by hand and the lock re-taken while the
    // first holder still believes it holds it.
    std::fs::remove_file(temp_dir.path().join("install.lock")).unwrap();
    let mut successor = new_lock(&manager, "install", 0);
    successor.acquire().unwrap();

    first.release().unwrap();

    assert!(!first.is_acquired());
    assert!(!temp_dir.path().join("install.4321.lock").exists());
    let holder = manager.discover_by_lock_name("install").unwrap().unwrap();
    assert_eq!(holder.pid, successor.pid());
    successor.release().unwrap();
}

#[test]
fn test_orphaned_canonical_file_is_stale_and_resettable() {
    let (temp_dir, manager) = create_test_manager();
    let mut crashed = new_lock(&manager, "install", 4321);
    crashed.acquire().unwrap();
    // Crash between the two deletes of release.
    std::fs::remove_file(temp_dir.path().join("install.4321.lock")).unwrap();

    let mut next = new_lock(&manager, "install", 4322);
    let err = next.acquire().unwrap_err();
    assert!(matches!(err, PlockError::AlreadyLocked { ref holder } if holder.pid == UNKNOWN_PID));

    let stale = manager.discover_stale_locks(None).unwrap();
    assert_eq!(stale[&UNKNOWN_PID][0].name, "install");

    let reset = manager.reset_stale_locks().unwrap();
    assert_eq!(reset.len(), 1);
    assert!(dir_entries(temp_dir.path()).is_empty());

    next.acquire().unwrap();
}

#[test]
fn test_reset_stale_locks_only_touches_dead_holders() {
    let probe = Arc::new(FakeProbe::running(1, "agentctl"));
    let (temp_dir, manager) = create_test_manager_with_probe(probe);
    let mut live = new_lock(&manager, "install", 1);
    let mut dead = new_lock(&manager, "upgrade", 2);
    live.acquire().unwrap();
    dead.acquire().unwrap();

    let reset = manager.reset_stale_locks().unwrap();
    assert_eq!(reset.len(), 1);
    assert_eq!(reset[0].pid, 2);
    assert_eq!(
        dir_entries(temp_dir.path()),
        vec!["install.1.lock", "install.lock"]
    );
}

// ============================================================================
// reset_lock
// ============================================================================

#[test]
fn test_reset_lock_clears_dead_pid() {
    let probe = Arc::new(FakeProbe::default());
    let (temp_dir, manager) = create_test_manager_with_probe(Arc::clone(&probe));
    let mut a = new_lock(&manager, "install", 55);
    let mut b = new_lock(&manager, "upgrade", 55);
    a.acquire().unwrap();
    b.acquire().unwrap();

    match manager.reset_lock::<&str>(55, &[]).unwrap() {
        ResetOutcome::Cleared(infos) => assert_eq!(infos.len(), 2),
        other => panic!("expected Cleared, got {:?}", other),
    }
    assert!(dir_entries(temp_dir.path()).is_empty());
    assert!(probe.terminated.lock().unwrap().is_empty());
}

#[test]
fn test_reset_lock_signals_allow_listed_live_pid_without_deleting() {
    let probe = Arc::new(FakeProbe::running(55, "agentctl"));
    let (temp_dir, manager) = create_test_manager_with_probe(Arc::clone(&probe));
    let mut lock = new_lock(&manager, "install", 55);
    lock.acquire().unwrap();

    let outcome = manager.reset_lock(55, &["helm", "agentctl"]).unwrap();
    assert_eq!(
        outcome,
        ResetOutcome::Signalled {
            pid: 55,
            executable: "agentctl".to_string()
        }
    );
    assert_eq!(*probe.terminated.lock().unwrap(), vec![55]);
    assert_eq!(
        dir_entries(temp_dir.path()),
        vec!["install.55.lock", "install.lock"]
    );
}

#[test]
fn test_reset_lock_rejects_live_pid_not_allow_listed() {
    let probe = Arc::new(FakeProbe::running(55, "bash"));
    let (temp_dir, manager) = create_test_manager_with_probe(Arc::clone(&probe));
    let mut lock = new_lock(&manager, "install", 55);
    lock.acquire().unwrap();

    let err = manager.reset_lock(55, &["agentctl"]).unwrap_err();
    assert!(matches!(
        err,
        PlockError::NotKillable { pid: 55, ref executable } if executable == "bash"
    ));
    assert!(probe.terminated.lock().unwrap().is_empty());
    assert_eq!(dir_entries(temp_dir.path()).len(), 2);
}
