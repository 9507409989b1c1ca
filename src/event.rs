/*
 * Event Log
 *
 * The six end-to-end scenarios and the external event log contract both
 * depend on these lines being reproduced exactly. Kept separate from the
 * `log` crate calls sprinkled through sched/mmu: those are ambient
 * diagnostics for a human watching stderr, these are the line-oriented
 * output a test harness or driver asserts against.
 */

use core::fmt;

use crate::sched::Pid;

/// One line of the simulator's external event log.
///
/// `Display` produces the exact templates a caller (test, demo binary)
/// should print or assert against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ProcessRuns { time: u64, pid: Pid },
    ProcessorIdle { time: u64 },
    ProcessCreated { time: u64, pid: Pid },
    ProcessExited { time: u64, pid: Pid, total_cpu_time: u32 },
    DiskReadRequest { time: u64, pid: Pid },
    DiskWriteRequest { time: u64, pid: Pid },
    KeyboardReadRequest { time: u64, pid: Pid },
    SemaphoreUp { time: u64, pid: Pid, sem: u32 },
    SemaphoreDown { time: u64, pid: Pid, sem: u32 },
    DiskInterruptHandled { time: u64, pid: Pid },
    KeyboardInterruptHandled { time: u64, pid: Pid },
    NoMoreProcesses,
    Deadlocked,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ProcessRuns { time, pid } => write!(f, "Time {time}: Process {pid} runs"),
            Event::ProcessorIdle { time } => write!(f, "Time {time}: Processor is idle"),
            Event::ProcessCreated { time, pid } => {
                write!(f, "Time {time}: Creating process entry for pid {pid}")
            }
            Event::ProcessExited { time, pid, total_cpu_time } => write!(
                f,
                "Time {time}: Process {pid} exits. Total CPU time = {total_cpu_time}"
            ),
            Event::DiskReadRequest { time, pid } => {
                write!(f, "Time {time}: Process {pid} issues disk read request")
            }
            Event::DiskWriteRequest { time, pid } => {
                write!(f, "Time {time}: Process {pid} issues disk write request")
            }
            Event::KeyboardReadRequest { time, pid } => {
                write!(f, "Time {time}: Process {pid} issues keyboard read request")
            }
            Event::SemaphoreUp { time, pid, sem } => write!(
                f,
                "Time {time}: Process {pid} issues UP operation on semaphore {sem}"
            ),
            Event::SemaphoreDown { time, pid, sem } => write!(
                f,
                "Time {time}: Process {pid} issues DOWN operation on semaphore {sem}"
            ),
            Event::DiskInterruptHandled { time, pid } => {
                write!(f, "Time {time}: Handled DISK_INTERRUPT for pid {pid}")
            }
            Event::KeyboardInterruptHandled { time, pid } => {
                write!(f, "Time {time}: Handled KEYBOARD_INTERRUPT for pid {pid}")
            }
            Event::NoMoreProcesses => write!(f, "-- No more processes to execute --"),
            Event::Deadlocked => write!(f, "DEADLOCKED SYSTEM"),
        }
    }
}

/// Destination for the event log.
///
/// The demo binary implements this by printing to stdout; tests implement
/// it by pushing onto a `Vec<Event>` so the exact sequence can be
/// asserted against.
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}
