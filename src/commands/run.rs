//! `run`: hold a lock for the lifetime of a child command.

use super::LockEnv;
use crate::cli::RunArgs;
use plock::error::{PlockError, Result};
use plock::locks::Lock;
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub fn cmd_run(env: &LockEnv, args: RunArgs) -> Result<i32> {
    let (program, program_args) = args
        .command
        .split_first()
        .ok_or_else(|| PlockError::Config("run requires a command after `--`".to_string()))?;

    let mut lock = Lock::builder(&args.name)
        .store(Arc::clone(env.manager.store()))
        .manager(Arc::clone(&env.manager))
        .retry_interval(env.config.retry_interval())
        .build()?;

    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .or_else(|| env.config.default_timeout());

    // The guard releases on every exit path, including a failed spawn.
    let guard = match timeout {
        Some(timeout) => lock.try_lock(timeout)?,
        None => lock.lock()?,
    };
    info!(lock = %guard.info().name, command = %program, "running command under lock");

    let status = Command::new(program)
        .args(program_args)
        .status()
        .map_err(|e| PlockError::Process(format!("failed to run '{}': {}", program, e)))?;

    guard.release()?;
    Ok(exit_code_of(status))
}

/// Child exit code, or `128 + signal` when it was killed by a signal.
fn exit_code_of(status: ExitStatus) -> i32 {
    status
        .code()
        .unwrap_or_else(|| 128 + status.signal().unwrap_or(0))
}
