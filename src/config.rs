/*
 * Kernel Configuration
 *
 * Groups the constants that size the scheduler and MMU cores. The
 * original CS202 coursework kernel baked these in as C preprocessor
 * defines; here they are runtime values so tests can build small kernels
 * (four processes, four TLB entries) without touching module-level
 * constants.
 */

/// Sizing and policy constants for the scheduler/synchronization core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Highest PID the process table can hold (process table is
    /// `0..max_processes`).
    pub max_processes: usize,
    /// Ticks a process may hold the CPU before the clock interrupt drops
    /// its priority.
    pub quantum: u32,
    /// Number of semaphores in the fixed-size semaphore array.
    pub num_semaphores: usize,
    /// Initial value every semaphore is created with.
    pub initial_semaphore_value: i32,
    /// Number of MLFQ priority levels (0 = lowest, `num_priorities - 1` =
    /// highest).
    pub num_priorities: u8,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_processes: 256,
            quantum: 40,
            num_semaphores: 16,
            initial_semaphore_value: 1,
            num_priorities: 5,
        }
    }
}

/// Sizing constants for the virtual-memory translation core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmuConfig {
    /// Number of physical page frames backing the simulated machine.
    pub num_page_frames: usize,
    /// Number of entries in the software TLB.
    pub num_tlb_entries: usize,
}

impl Default for MmuConfig {
    fn default() -> Self {
        Self {
            num_page_frames: 1024,
            num_tlb_entries: 8,
        }
    }
}

impl MmuConfig {
    /// Number of 32-bit words needed to hold one bit per frame.
    pub fn bitmap_words(&self) -> usize {
        self.num_page_frames.div_ceil(32)
    }
}
