//! Local filesystem implementation of [`FileStore`].
//!
//! Relies on POSIX `link(2)` semantics: creating a hard link whose target name
//! already exists fails with `EEXIST`, atomically, across processes.

use super::{FileStat, FileStore};
use crate::error::{PlockError, Result};
use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

/// Provider identifier for the local filesystem.
pub const PROVIDER_LOCAL: &str = "local";

const OWNER_RWX: u32 = 0o700;

/// File store backed by a directory on a local (or POSIX-compliant shared) mount.
#[derive(Debug, Default)]
pub struct LocalFileStore {
    work_dir: Option<PathBuf>,
}

impl LocalFileStore {
    /// Create a store pinned to `work_dir`.
    pub fn new<P: AsRef<Path>>(work_dir: P) -> Result<Self> {
        let mut store = Self::default();
        store.set_work_dir(work_dir.as_ref())?;
        Ok(store)
    }
}

impl FileStore for LocalFileStore {
    fn provider(&self) -> &'static str {
        PROVIDER_LOCAL
    }

    fn set_work_dir(&mut self, dir: &Path) -> Result<()> {
        let meta = fs::metadata(dir).map_err(|e| {
            PlockError::Config(format!(
                "invalid work directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        if !meta.is_dir() {
            return Err(PlockError::Config(format!(
                "invalid work directory '{}': not a directory",
                dir.display()
            )));
        }

        let mode = meta.permissions().mode();
        if mode & OWNER_RWX != OWNER_RWX {
            return Err(PlockError::Config(format!(
                "invalid work directory '{}': owner needs rwx permission (mode {:o})",
                dir.display(),
                mode & 0o777
            )));
        }

        self.work_dir = Some(dir.to_path_buf());
        Ok(())
    }

    fn work_dir(&self) -> Option<&Path> {
        self.work_dir.as_deref()
    }

    fn stat(&self, path: &Path) -> Result<FileStat> {
        let meta = fs::metadata(path).map_err(|e| PlockError::io("stat", path, e))?;
        let modified = meta
            .modified()
            .map_err(|e| PlockError::io("stat", path, e))?;

        Ok(FileStat {
            modified: DateTime::<Utc>::from(modified),
            nlink: meta.nlink(),
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        match fs::symlink_metadata(path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PlockError::io("stat", path, e)),
        }
    }

    fn create(&self, path: &Path) -> Result<File> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| PlockError::io("create", path, e))
    }

    fn delete(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| PlockError::io("delete", path, e))
    }

    fn link(&self, original: &Path, link: &Path) -> Result<()> {
        fs::hard_link(original, link).map_err(|e| PlockError::io("link", link, e))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).map_err(|e| PlockError::io("rename", from, e))
    }

    fn list(&self, dir: &Path, filter: &str, max_count: Option<usize>) -> Result<Vec<String>> {
        let entries = fs::read_dir(dir).map_err(|e| PlockError::io("list", dir, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PlockError::io("list", dir, e))?;

            // Entries may vanish between readdir and stat while other processes release.
            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(PlockError::io("list", entry.path(), e)),
            };
            if !file_type.is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.contains(filter) {
                names.push(name);
            }
        }

        names.sort();
        if let Some(max) = max_count {
            names.truncate(max);
        }
        Ok(names)
    }
}
