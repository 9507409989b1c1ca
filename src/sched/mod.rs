/*
 * Process Scheduler & Synchronization Core
 *
 * Multi-level feedback queue scheduling over a fixed-size process table,
 * driven by the trap and interrupt handlers a simulated CPU invokes
 * synchronously. See `scheduler::Scheduler` for the handler entry points.
 */

mod process;
mod queue;
mod semaphore;
mod scheduler;

pub use process::{ProcessState, ProcessTableEntry};
pub use queue::PidQueue;
pub use scheduler::{InterruptKind, ScheduleOutcome, Scheduler, TrapKind};
pub use semaphore::Semaphore;

use core::fmt;

/// Process identifier. Bounded by `KernelConfig::max_processes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Pid {
    fn from(value: u32) -> Self {
        Pid(value)
    }
}
