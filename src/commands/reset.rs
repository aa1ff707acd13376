//! Lock maintenance: `reset-stale` and `reset`.

use super::LockEnv;
use super::display::{flatten, pid_label, print_info, print_json};
use crate::cli::{ResetArgs, ResetStaleArgs};
use plock::error::{PlockError, Result};
use plock::locks::ResetOutcome;
use serde_json::json;

pub fn cmd_reset_stale(env: &LockEnv, args: ResetStaleArgs) -> Result<()> {
    if !args.force {
        let stale = flatten(env.manager.discover_stale_locks(None)?);
        if stale.is_empty() {
            println!("No stale locks.");
            return Ok(());
        }

        println!("Stale locks ({}):", stale.len());
        println!();
        for info in &stale {
            print_info(info, true);
        }
        return Err(PlockError::Config(
            "refusing to reset stale locks without --force flag.\n\n\
             Only reset locks if you are certain their holders have exited.\n\n\
             To reset them, run:\n  plock reset-stale --force"
                .to_string(),
        ));
    }

    let reset = env.manager.reset_stale_locks()?;

    if env.json {
        return print_json(&reset);
    }

    if reset.is_empty() {
        println!("No stale locks.");
        return Ok(());
    }

    println!("Reset {} stale lock(s):", reset.len());
    for info in &reset {
        println!("  - {} (pid {})", info.name, pid_label(info.pid));
    }

    Ok(())
}

pub fn cmd_reset(env: &LockEnv, args: ResetArgs) -> Result<()> {
    let mut killable = env.config.killable_executables.clone();
    for exe in args.kill {
        if !killable.contains(&exe) {
            killable.push(exe);
        }
    }

    let outcome = env.manager.reset_lock(args.pid, killable.as_slice())?;

    match outcome {
        ResetOutcome::Cleared(infos) => {
            if env.json {
                return print_json(&json!({
                    "pid": args.pid,
                    "action": "cleared",
                    "locks": infos,
                }));
            }
            if infos.is_empty() {
                println!("Process {} is not running and holds no locks.", args.pid);
            } else {
                println!("Cleared {} lock(s) of pid {}:", infos.len(), args.pid);
                for info in &infos {
                    println!("  - {}", info.name);
                }
            }
        }
        ResetOutcome::Signalled { pid, executable } => {
            if env.json {
                return print_json(&json!({
                    "pid": pid,
                    "action": "signalled",
                    "executable": executable,
                }));
            }
            println!("Sent SIGTERM to pid {} ({}).", pid, executable);
            println!(
                "Its lock files remain until it exits; run `plock reset-stale --force` afterwards."
            );
        }
    }

    Ok(())
}
