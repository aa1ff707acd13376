//! Filesystem primitives for plock.
//!
//! Lock artifacts are manipulated exclusively through the [`FileStore`] trait so
//! the acquire/release protocol never depends on a particular backend. The
//! one primitive every backend must get right is [`FileStore::link`]: when
//! several callers link the same new name at once, at most one may succeed and
//! the rest must fail with [`std::io::ErrorKind::AlreadyExists`].
//!
//! # Work Directory
//!
//! A store is pinned to a single flat work directory via
//! [`FileStore::set_work_dir`]. Validation happens once, at that point, and is
//! not repeated per operation.

mod local;


pub use local::{LocalFileStore, PROVIDER_LOCAL};

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::path::Path;

/// Metadata of a single artifact, reduced to what the lock protocol needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Last modification time.
    pub modified: DateTime<Utc>,

    /// Number of hard links pointing at the underlying file.
    pub nlink: u64,

    /// Device the file lives on.
    pub dev: u64,

    /// Inode number on that device.
    pub ino: u64,
}

impl FileStat {
    /// True when both stats describe the same underlying file.
    pub fn same_file(&self, other: &FileStat) -> bool {
        self.dev == other.dev && self.ino == other.ino
    }
}

/// Provider-agnostic contract for the atomic operations plock relies on.
///
/// All paths are absolute. Errors carry the operation and path that failed.
pub trait FileStore: Send + Sync + std::fmt::Debug {
    /// Backend identifier recorded in every [`crate::locks::Info`].
    fn provider(&self) -> &'static str;

    /// Validate and pin the work directory.
    ///
    /// The directory must exist, be a directory, and carry owner read, write
    /// and execute permission. On failure the previous work directory stays.
    fn set_work_dir(&mut self, dir: &Path) -> Result<()>;

    /// The pinned work directory, if one has been set.
    fn work_dir(&self) -> Option<&Path>;

    fn stat(&self, path: &Path) -> Result<FileStat>;

    /// Whether `path` exists. Failures other than "not found" propagate.
    fn exists(&self, path: &Path) -> Result<bool>;

    /// Create an empty file. Fails if it already exists.
    fn create(&self, path: &Path) -> Result<File>;

    fn delete(&self, path: &Path) -> Result<()>;

    /// Create `link` as a hard link to `original`.
    fn link(&self, original: &Path, link: &Path) -> Result<()>;

    /// Atomically move `from` to `to`, replacing `to` if it exists.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// File names in `dir` containing `filter`, sorted, capped at `max_count`.
    fn list(&self, dir: &Path, filter: &str, max_count: Option<usize>) -> Result<Vec<String>>;
}
