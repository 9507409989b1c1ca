/*
 * Kernel Error Types
 *
 * Out-of-range operands (a bad semaphore index, a PID past the table,
 * an unrecognized trap code) are caller mistakes, not kernel corruption,
 * so they come back as `Result<_, KernelError>` instead of a panic.
 * Corrupted kernel invariants (two processes RUNNING at once, a ready
 * queue referencing a freed PID slot) are not recoverable and still
 * panic, matching the simulation-fatal category.
 */

use thiserror::Error;

use crate::sched::Pid;

/// Everything that can go wrong at a trap/interrupt entry point due to
/// a caller-supplied operand being out of range. Matches the operand
/// taxonomy exactly: bad PID, bad semaphore index, unrecognized trap
/// code.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KernelError {
    #[error("pid {0} is out of range")]
    InvalidPid(Pid),

    #[error("semaphore index {0} is out of range")]
    InvalidSemaphore(u32),

    #[error("unrecognized trap code {0}")]
    UnknownTrap(u32),
}
