//! CLI argument parsing for plock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// plock: filesystem-based process locks for node agent workflows.
///
/// Locks live as files in a single work directory:
/// - `{name}.lock` marks the lock as taken
/// - `{name}.{pid}.lock` identifies the process holding it
#[derive(Parser, Debug)]
#[command(name = "plock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: /etc/plock/config.yaml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Lock directory, overriding the config file.
    #[arg(long, global = true)]
    pub work_dir: Option<PathBuf>,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for plock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all active locks.
    ///
    /// Shows every canonical lock file with its holder pid and age.
    List(DiscoverArgs),

    /// List locks whose holder process is gone.
    Stale(DiscoverArgs),

    /// Show the current holder of a lock.
    Show(ShowArgs),

    /// Show every lock artifact belonging to a process.
    Pid(PidArgs),

    /// Remove all stale locks.
    ///
    /// Requires --force; otherwise only prints what would be removed.
    ResetStale(ResetStaleArgs),

    /// Clear the locks held by a process.
    ///
    /// A dead process has its locks removed. A live process is sent SIGTERM
    /// only if its executable is allow-listed.
    Reset(ResetArgs),

    /// Run a command while holding a lock.
    ///
    /// The lock is released when the command exits, whatever its status.
    Run(RunArgs),
}

/// Arguments for the `list` and `stale` commands.
#[derive(Parser, Debug)]
pub struct DiscoverArgs {
    /// Examine at most this many lock files.
    #[arg(long)]
    pub max: Option<usize>,
}

/// Arguments for the `show` command.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Lock name (e.g., install).
    pub name: String,
}

/// Arguments for the `pid` command.
#[derive(Parser, Debug)]
pub struct PidArgs {
    /// Process id.
    pub pid: i32,
}

/// Arguments for the `reset-stale` command.
#[derive(Parser, Debug)]
pub struct ResetStaleArgs {
    /// Actually remove the stale locks.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `reset` command.
#[derive(Parser, Debug)]
pub struct ResetArgs {
    /// Process id whose locks should be cleared.
    pub pid: i32,

    /// Executable names that may be sent SIGTERM (added to the config list).
    #[arg(long, value_delimiter = ',')]
    pub kill: Vec<String>,
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Lock name to hold while the command runs.
    pub name: String,

    /// Seconds to wait for a busy lock (default: fail immediately).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Command and arguments, after `--`.
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
