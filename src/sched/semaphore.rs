/*
 * Semaphore
 *
 * A counting semaphore with a FIFO wait queue. `down` never blocks the
 * caller directly on an object it owns — it hands back whether the
 * caller proceeded or was blocked, and the scheduler does the state
 * transition, since only the scheduler knows the current clock/quantum
 * bookkeeping needed to credit (or not) the early-block priority bump.
 */

use super::{Pid, PidQueue};

/// Outcome of a `down` operation, reported back to the caller so it can
/// decide whether to reschedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownOutcome {
    /// The semaphore had capacity; the caller keeps running.
    Proceeded,
    /// The semaphore was exhausted; the caller was enqueued as a waiter
    /// and must not run again until a matching `up` releases it.
    Blocked,
}

/// Outcome of an `up` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpOutcome {
    /// No one was waiting; the semaphore's value was incremented.
    Incremented,
    /// A waiter was released. The scheduler must mark it `Ready` and
    /// enqueue it at its *current* priority — it is not directly
    /// dispatched and receives no CPU credit for having waited.
    Released(Pid),
}

#[derive(Debug, Clone)]
pub struct Semaphore {
    value: i32,
    waiters: PidQueue,
}

impl Semaphore {
    pub fn new(initial_value: i32) -> Self {
        Self { value: initial_value, waiters: PidQueue::new() }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn waiters_is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    pub fn down(&mut self, pid: Pid) -> DownOutcome {
        if self.value > 0 {
            self.value -= 1;
            DownOutcome::Proceeded
        } else {
            self.waiters.enqueue(pid);
            DownOutcome::Blocked
        }
    }

    pub fn up(&mut self) -> UpOutcome {
        if self.value == 0 {
            if let Some(waiter) = self.waiters.dequeue() {
                return UpOutcome::Released(waiter);
            }
        }
        self.value += 1;
        UpOutcome::Incremented
    }
}
