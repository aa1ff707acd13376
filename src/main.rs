//! plock: filesystem-based process locks for node agent workflows.
//!
//! This is the main entry point for the `plock` CLI. It parses arguments,
//! loads configuration, sets up logging, dispatches to the appropriate
//! command handler, and maps errors to exit codes.

mod cli;
mod commands;

use cli::Cli;
use plock::config::Config;
use plock::logging::init_logging;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let result = Config::resolve(cli.config.as_deref()).and_then(|config| {
        init_logging(config.log_level.raised(cli.verbose));
        commands::dispatch(cli, config)
    });

    match result {
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            ExitCode::from(err.exit_code() as u8)
        }
    }
}
