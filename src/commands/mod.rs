//! Command implementations for plock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every command works against a [`LockEnv`] resolved from
//! the config file and global flags.

mod display;
mod query;
mod reset;
mod run;


use crate::cli::{Cli, Command};
use plock::config::Config;
use plock::error::Result;
use plock::exit_codes;
use plock::fs::{FileStore, LocalFileStore};
use plock::locks::LockManager;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a command needs: configuration, output mode and a manager
/// over the validated work directory.
#[derive(Debug)]
pub struct LockEnv {
    pub config: Config,
    pub manager: Arc<LockManager>,
    pub json: bool,
}

impl LockEnv {
    /// Open the work directory (`work_dir` override, else the config's).
    pub fn open(config: Config, work_dir: Option<PathBuf>, json: bool) -> Result<Self> {
        let work_dir = work_dir.unwrap_or_else(|| config.work_dir.clone());
        let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(&work_dir)?);
        let manager = Arc::new(LockManager::new(store)?);
        Ok(Self {
            config,
            manager,
            json,
        })
    }
}

/// Dispatch a command to its implementation.
///
/// Returns the process exit code on success; `run` forwards its child's code.
pub fn dispatch(cli: Cli, config: Config) -> Result<i32> {
    let env = LockEnv::open(config, cli.work_dir, cli.json)?;

    match cli.command {
        Command::List(args) => query::cmd_list(&env, args).map(|()| exit_codes::SUCCESS),
        Command::Stale(args) => query::cmd_stale(&env, args).map(|()| exit_codes::SUCCESS),
        Command::Show(args) => query::cmd_show(&env, args).map(|()| exit_codes::SUCCESS),
        Command::Pid(args) => query::cmd_pid(&env, args).map(|()| exit_codes::SUCCESS),
        Command::ResetStale(args) => {
            reset::cmd_reset_stale(&env, args).map(|()| exit_codes::SUCCESS)
        }
        Command::Reset(args) => reset::cmd_reset(&env, args).map(|()| exit_codes::SUCCESS),
        Command::Run(args) => run::cmd_run(&env, args),
    }
}
