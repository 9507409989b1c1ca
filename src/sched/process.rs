/*
 * Process Table
 *
 * Per-PID state, priority, and cumulative CPU time. `total_cpu_time` is
 * incremented only at transitions out of `Running`, not on every clock
 * tick regardless of quantum state.
 */

/// Lifecycle state of a process table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Ready,
    Blocked,
    Uninitialized,
}

/// One slot in the fixed-size process table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessTableEntry {
    pub state: ProcessState,
    pub priority: u8,
    pub total_cpu_time: u32,
}

impl ProcessTableEntry {
    pub const fn uninitialized() -> Self {
        Self { state: ProcessState::Uninitialized, priority: 0, total_cpu_time: 0 }
    }

    /// Raise priority by one level, capped at `max_priority`.
    pub fn bump_priority(&mut self, max_priority: u8) {
        self.priority = (self.priority + 1).min(max_priority);
    }

    /// Lower priority by one level, floored at zero.
    pub fn drop_priority(&mut self) {
        self.priority = self.priority.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_priority_saturates_at_max() {
        let mut entry = ProcessTableEntry::uninitialized();
        entry.priority = 4;
        entry.bump_priority(4);
        assert_eq!(entry.priority, 4);
    }

    #[test]
    fn drop_priority_saturates_at_zero() {
        let mut entry = ProcessTableEntry::uninitialized();
        entry.priority = 0;
        entry.drop_priority();
        assert_eq!(entry.priority, 0);
    }
}
