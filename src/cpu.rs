/*
 * CPU Façade
 *
 * The real hardware simulator this kernel core normally runs under is out
 * of scope: it owns the register file, the clock, and the interrupt
 * vector table, and calls into the kernel's trap/interrupt handlers
 * synchronously. `Cpu` captures only the primitives the kernel core needs
 * from that façade so the scheduler and MMU can be driven and tested
 * without it.
 */

use crate::sched::Pid;

/// Direction of a memory access, needed to decide whether a TLB hit
/// should set the modified bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemOp {
    Load,
    Store,
}

/// The subset of the simulated machine the kernel core touches.
pub trait Cpu {
    /// Current simulator clock, in ticks.
    fn clock(&self) -> u64;

    /// The PID the CPU is currently executing, or `None` while idle.
    fn current_pid(&self) -> Option<Pid>;

    /// Install the PID the CPU should execute next (`None` for idle).
    fn set_current_pid(&mut self, pid: Option<Pid>);

    /// Fire-and-forget disk read request; completion arrives later as a
    /// disk interrupt.
    fn disk_read_req(&mut self, pid: Pid, block: u32);

    /// Fire-and-forget disk write request; the caller is never blocked
    /// on this one.
    fn disk_write_req(&mut self, pid: Pid);

    /// Fire-and-forget keyboard read request; completion arrives later
    /// as a keyboard interrupt.
    fn keyboard_read_req(&mut self, pid: Pid);

    /// Ask the façade to deliver a page-fault trap for `vpage`. Does not
    /// return an address; the faulted instruction is expected to be
    /// re-executed once the fault handler resolves the mapping.
    fn issue_page_fault_trap(&mut self, vpage: u32);
}
