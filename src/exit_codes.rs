//! Exit code constants for the plock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid lock name, bad work directory)
//! - 2: I/O failure (stat/create/delete/link/list)
//! - 3: Process failure (live owner, not killable, child spawn)
//! - 4: Lock failure (already locked, timeout, not held)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, or invalid state.
pub const USER_ERROR: i32 = 1;

/// I/O failure while touching lock artifacts.
pub const IO_FAILURE: i32 = 2;

/// Process failure: the lock owner is alive, may not be signalled, or a child failed to start.
pub const PROCESS_FAILURE: i32 = 3;

/// Lock failure: the lock is held elsewhere, could not be acquired in time, or is not held.
pub const LOCK_FAILURE: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [SUCCESS, USER_ERROR, IO_FAILURE, PROCESS_FAILURE, LOCK_FAILURE];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn lock_failure_is_four() {
        assert_eq!(SUCCESS, 0);
        assert_eq!(LOCK_FAILURE, 4);
    }
}
