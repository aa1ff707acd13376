//! Read-only lock queries: `list`, `stale`, `show`, `pid`.

use super::LockEnv;
use super::display::{flatten, pid_label, print_info, print_json};
use crate::cli::{DiscoverArgs, PidArgs, ShowArgs};
use plock::error::Result;

pub fn cmd_list(env: &LockEnv, args: DiscoverArgs) -> Result<()> {
    let max = args.max.or(env.config.discover_max);
    let locks = flatten(env.manager.discover(max)?);

    if env.json {
        return print_json(&locks);
    }

    if locks.is_empty() {
        println!("No active locks.");
        return Ok(());
    }

    println!("Active locks ({}):", locks.len());
    println!();

    let mut stale_count = 0;
    for lock in &locks {
        let stale = !env.manager.is_alive(lock.pid);
        if stale {
            stale_count += 1;
        }
        print_info(lock, stale);
    }

    if stale_count > 0 {
        println!(
            "Note: {} lock(s) are stale. Use `plock reset-stale --force` to clear.",
            stale_count
        );
    }

    Ok(())
}

pub fn cmd_stale(env: &LockEnv, args: DiscoverArgs) -> Result<()> {
    let max = args.max.or(env.config.discover_max);
    let locks = flatten(env.manager.discover_stale_locks(max)?);

    if env.json {
        return print_json(&locks);
    }

    if locks.is_empty() {
        println!("No stale locks.");
        return Ok(());
    }

    println!("Stale locks ({}):", locks.len());
    println!();
    for lock in &locks {
        print_info(lock, true);
    }

    Ok(())
}

pub fn cmd_show(env: &LockEnv, args: ShowArgs) -> Result<()> {
    let holder = env.manager.discover_by_lock_name(&args.name)?;

    if env.json {
        return print_json(&holder);
    }

    match holder {
        Some(info) => {
            let stale = !env.manager.is_alive(info.pid);
            println!("Lock held by pid {}:", pid_label(info.pid));
            println!();
            print_info(&info, stale);
        }
        None => println!("Lock '{}' is not held.", args.name),
    }

    Ok(())
}

pub fn cmd_pid(env: &LockEnv, args: PidArgs) -> Result<()> {
    let infos = env.manager.discover_by_pid(args.pid)?;

    if env.json {
        return print_json(&infos);
    }

    if infos.is_empty() {
        println!("No lock artifacts for pid {}.", args.pid);
        return Ok(());
    }

    let alive = env.manager.is_alive(args.pid);
    println!(
        "Lock artifacts for pid {} ({}):",
        args.pid,
        if alive { "running" } else { "not running" }
    );
    println!();
    for info in &infos {
        if info.activated_at.is_none() {
            println!("  {} (marker only, not holding the lock)", info.name);
            println!("    PID file:   {}", info.pid_file_path.display());
            println!();
        } else {
            print_info(info, !alive);
        }
    }

    Ok(())
}
