/*
 * Kernel Object
 *
 * Owns the scheduler/synchronization core and the MMU core as a single
 * object constructed once at boot, the way the hardware façade expects:
 * it has no context pointer of its own, so whatever handles its traps
 * and interrupts must already be holding the state those handlers
 * touch. Every method here takes `&mut self` plus the façade (`Cpu`)
 * and the event sink it should write to.
 */

use crate::config::{KernelConfig, MmuConfig};
use crate::cpu::{Cpu, MemOp};
use crate::error::KernelError;
use crate::event::EventSink;
use crate::mmu::{Mmu, TranslateOutcome};
use crate::sched::{InterruptKind, Pid, ScheduleOutcome, Scheduler, TrapKind};

/// The two cores, bundled behind one object.
pub struct Kernel {
    pub sched: Scheduler,
    pub mmu: Mmu,
}

impl Kernel {
    pub fn new(sched_config: KernelConfig, mmu_config: MmuConfig) -> Self {
        Self { sched: Scheduler::new(sched_config), mmu: Mmu::new(mmu_config) }
    }

    /// `initialize_kernel()`: install PID 0 running before the façade
    /// delivers its first trap or interrupt.
    pub fn boot(&mut self, boot_pid: Pid, cpu: &mut dyn Cpu) {
        self.sched.boot(boot_pid, cpu);
    }

    pub fn handle_trap(
        &mut self,
        trap: TrapKind,
        cpu: &mut dyn Cpu,
        sink: &mut dyn EventSink,
    ) -> Result<Option<ScheduleOutcome>, KernelError> {
        self.sched.handle_trap(trap, cpu, sink)
    }

    pub fn handle_interrupt(
        &mut self,
        interrupt: InterruptKind,
        cpu: &mut dyn Cpu,
        sink: &mut dyn EventSink,
    ) -> Result<Option<ScheduleOutcome>, KernelError> {
        match interrupt {
            InterruptKind::Clock => Ok(self.sched.handle_clock_interrupt(cpu, sink)),
            InterruptKind::Disk { pid } => self.sched.handle_disk_interrupt(pid, cpu, sink),
            InterruptKind::Keyboard { pid } => self.sched.handle_keyboard_interrupt(pid, cpu, sink),
        }
    }

    pub fn translate(&mut self, vaddr: u32, op: MemOp, cpu: &mut dyn Cpu) -> TranslateOutcome {
        self.mmu.translate(vaddr, op, cpu)
    }
}
