//! Display and formatting utilities for command output.

use plock::error::{PlockError, Result};
use plock::locks::{Info, UNKNOWN_PID};
use serde::Serialize;
use std::collections::BTreeMap;

/// Flatten a pid-keyed discovery result into name order.
pub fn flatten(found: BTreeMap<i32, Vec<Info>>) -> Vec<Info> {
    let mut infos: Vec<Info> = found.into_values().flatten().collect();
    infos.sort_by(|a, b| a.name.cmp(&b.name));
    infos
}

/// Print any serializable value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| PlockError::Config(format!("failed to serialize output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Holder pid as shown to humans.
pub fn pid_label(pid: i32) -> String {
    if pid == UNKNOWN_PID {
        "unknown (no pid-marker)".to_string()
    } else {
        pid.to_string()
    }
}

/// Print one lock in the detailed block format.
pub fn print_info(info: &Info, stale: bool) {
    println!("  {}:", info.name);
    println!("    PID:        {}", pid_label(info.pid));
    if let Some(activated_at) = info.activated_at {
        println!("    Acquired:   {}", activated_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("    Age:        {}", info.age_string());
    }
    if stale {
        println!("    Status:     STALE (holder process not running)");
    }
    println!("    Lock file:  {}", info.lock_file_path.display());
    println!("    PID file:   {}", info.pid_file_path.display());
    println!();
}
