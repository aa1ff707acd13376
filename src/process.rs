//! Process liveness probing and signalling.
//!
//! Stale-lock detection needs to know whether the pid embedded in a lock
//! artifact still names a running process. That question is answered behind
//! the [`ProcessProbe`] trait so discovery does not depend on how it is asked.

use crate::error::{PlockError, Result};
use std::io;
use std::path::Path;
use std::process::Command;

/// Capability to inspect and terminate processes by pid.
pub trait ProcessProbe: Send + Sync + std::fmt::Debug {
    /// True if `pid` names a running process. Non-positive pids are never alive.
    fn is_alive(&self, pid: i32) -> bool;

    /// The executable name (no directory) of a running process.
    fn executable_name(&self, pid: i32) -> Result<String>;

    /// Ask the process to terminate (SIGTERM).
    fn terminate(&self, pid: i32) -> Result<()>;
}

/// Probe backed by `kill(2)` and `/proc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl ProcessProbe for SystemProbe {
    fn is_alive(&self, pid: i32) -> bool {
        if pid <= 0 {
            return false;
        }
        // Signal 0 performs the permission and existence checks only.
        let result = unsafe { libc::kill(pid, 0) };
        if result == 0 {
            return true;
        }
        // EPERM means the process exists but belongs to someone else
        io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }

    fn executable_name(&self, pid: i32) -> Result<String> {
        if let Some(name) = proc_executable_name(pid) {
            return Ok(name);
        }

        let output = Command::new("ps")
            .args(["-o", "comm=", "-p", &pid.to_string()])
            .output()
            .map_err(|e| PlockError::Process(format!("failed to run ps for pid {}: {}", pid, e)))?;

        let comm = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() || comm.is_empty() {
            return Err(PlockError::Process(format!(
                "cannot determine executable for pid {}",
                pid
            )));
        }

        Ok(base_name(&comm))
    }

    fn terminate(&self, pid: i32) -> Result<()> {
        if pid <= 0 {
            return Err(PlockError::Process(format!("refusing to signal pid {}", pid)));
        }
        let result = unsafe { libc::kill(pid, libc::SIGTERM) };
        if result == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ESRCH) => Err(PlockError::Process(format!("process {} not found", pid))),
            Some(libc::EPERM) => Err(PlockError::Process(format!(
                "permission denied signalling process {}",
                pid
            ))),
            _ => Err(PlockError::Process(format!(
                "failed to signal process {}: {}",
                pid, err
            ))),
        }
    }
}

/// Read the executable name from `/proc`, preferring the `exe` link over `comm`.
fn proc_executable_name(pid: i32) -> Option<String> {
    let proc_dir = Path::new("/proc").join(pid.to_string());

    if let Ok(target) = std::fs::read_link(proc_dir.join("exe")) {
        let name = target.to_string_lossy();
        // Linux appends " (deleted)" when the binary was replaced on disk.
        let name = name.trim_end_matches(" (deleted)");
        return Some(base_name(name));
    }

    std::fs::read_to_string(proc_dir.join("comm"))
        .ok()
        .map(|comm| comm.trim().to_string())
        .filter(|comm| !comm.is_empty())
}

fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}
