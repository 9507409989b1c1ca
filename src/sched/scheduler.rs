/*
 * Scheduler & Trap Dispatcher
 *
 * Chooses `current_pid` after any event that may have changed
 * runnability, and demultiplexes the six trap kinds and three interrupt
 * kinds a simulated CPU delivers synchronously. Strict five-level
 * priority scan, high to low; priority rises on an early voluntary
 * block and falls on quantum expiry (the honors policy — see
 * `DESIGN.md` for why the single-level variant found in some coursework
 * drafts was not the one implemented here).
 */

use log::{debug, warn};

use crate::config::KernelConfig;
use crate::cpu::Cpu;
use crate::error::KernelError;
use crate::event::{Event, EventSink};

use super::process::{ProcessState, ProcessTableEntry};
use super::queue::PidQueue;
use super::semaphore::{DownOutcome, Semaphore, UpOutcome};
use super::Pid;

/// Trap kinds the CPU façade delivers via `R1`, already decoded from
/// registers into a tagged variant instead of dispatched by raw
/// integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapKind {
    DiskRead { block: u32 },
    DiskWrite,
    KeyboardRead,
    ForkProgram { new_pid: Pid },
    EndProgram,
    SemaphoreOp { sem: u32, up: bool },
}

impl TrapKind {
    /// Decode `R1..R3` the way the trap dispatcher's lookup table would.
    pub fn from_registers(r1: u32, r2: u32, r3: u32) -> Result<Self, KernelError> {
        match r1 {
            0 => Ok(TrapKind::DiskRead { block: r2 }),
            1 => Ok(TrapKind::DiskWrite),
            2 => Ok(TrapKind::KeyboardRead),
            3 => Ok(TrapKind::ForkProgram { new_pid: Pid(r2) }),
            4 => Ok(TrapKind::EndProgram),
            5 => Ok(TrapKind::SemaphoreOp { sem: r2, up: r3 != 0 }),
            other => Err(KernelError::UnknownTrap(other)),
        }
    }
}

/// Interrupt kinds the CPU façade delivers, the two I/O completion
/// kinds carrying the PID the façade woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptKind {
    Clock,
    Disk { pid: Pid },
    Keyboard { pid: Pid },
}

/// Result of a scheduling decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Running(Pid),
    Idle,
    Deadlocked,
    NoMoreProcesses,
}

/// The multi-level feedback queue scheduler, process table, and
/// semaphore array, plus the counters treated as kernel-wide scalars.
pub struct Scheduler {
    config: KernelConfig,
    process_table: Vec<ProcessTableEntry>,
    ready_queues: Vec<PidQueue>,
    semaphores: Vec<Semaphore>,
    quantum_start: u64,
    active_processes: i64,
    io_processes: i64,
}

impl Scheduler {
    pub fn new(config: KernelConfig) -> Self {
        let process_table = vec![ProcessTableEntry::uninitialized(); config.max_processes];
        let ready_queues = (0..config.num_priorities).map(|_| PidQueue::new()).collect();
        let semaphores = (0..config.num_semaphores)
            .map(|_| Semaphore::new(config.initial_semaphore_value))
            .collect();
        Self {
            config,
            process_table,
            ready_queues,
            semaphores,
            quantum_start: 0,
            active_processes: 0,
            io_processes: 0,
        }
    }

    /// Put `pid` straight into `Running` at priority 0 and account for
    /// it, the way `initialize_kernel` seeds PID 0 before the first
    /// trap or interrupt ever arrives.
    pub fn boot(&mut self, pid: Pid, cpu: &mut dyn Cpu) {
        let entry = &mut self.process_table[pid.0 as usize];
        entry.state = ProcessState::Running;
        entry.priority = 0;
        self.active_processes += 1;
        cpu.set_current_pid(Some(pid));
        self.quantum_start = cpu.clock();
    }

    pub fn process_state(&self, pid: Pid) -> ProcessState {
        self.process_table[pid.0 as usize].state
    }

    pub fn priority(&self, pid: Pid) -> u8 {
        self.process_table[pid.0 as usize].priority
    }

    pub fn total_cpu_time(&self, pid: Pid) -> u32 {
        self.process_table[pid.0 as usize].total_cpu_time
    }

    pub fn active_processes(&self) -> i64 {
        self.active_processes
    }

    pub fn io_processes(&self) -> i64 {
        self.io_processes
    }

    pub fn semaphore_value(&self, sem: usize) -> i32 {
        self.semaphores[sem].value()
    }

    fn validate_pid(&self, pid: Pid) -> Result<(), KernelError> {
        if (pid.0 as usize) < self.config.max_processes {
            Ok(())
        } else {
            Err(KernelError::InvalidPid(pid))
        }
    }

    fn validate_semaphore(&self, sem: u32) -> Result<(), KernelError> {
        if (sem as usize) < self.semaphores.len() {
            Ok(())
        } else {
            Err(KernelError::InvalidSemaphore(sem))
        }
    }

    /// `add_cpu(pid, clock - quantum_start); quantum_start = clock`.
    fn charge_cpu(&mut self, pid: Pid, cpu: &dyn Cpu) {
        let now = cpu.clock();
        self.process_table[pid.0 as usize].total_cpu_time += (now - self.quantum_start) as u32;
        self.quantum_start = now;
    }

    fn enqueue_at_current_priority(&mut self, pid: Pid) {
        let level = self.process_table[pid.0 as usize].priority;
        self.ready_queues[level as usize].enqueue(pid);
    }

    /// `schedule(from_level = top)`: strict high-to-low priority scan,
    /// with lazy tombstone cleanup of queue heads that blocked while
    /// still queued.
    fn schedule(&mut self, cpu: &mut dyn Cpu, sink: &mut dyn EventSink) -> ScheduleOutcome {
        if self.active_processes == 0 {
            sink.emit(Event::NoMoreProcesses);
            debug!("{}", Event::NoMoreProcesses);
            return ScheduleOutcome::NoMoreProcesses;
        }

        let top = self.config.num_priorities - 1;
        for level in (0..=top).rev() {
            let queue = &mut self.ready_queues[level as usize];
            while let Some(head) = queue.head() {
                if self.process_table[head.0 as usize].state == ProcessState::Blocked {
                    queue.dequeue();
                } else {
                    break;
                }
            }
            if let Some(pid) = self.ready_queues[level as usize].dequeue() {
                self.process_table[pid.0 as usize].state = ProcessState::Running;
                cpu.set_current_pid(Some(pid));
                let event = Event::ProcessRuns { time: cpu.clock(), pid };
                debug!("{event}");
                sink.emit(event);
                return ScheduleOutcome::Running(pid);
            }
        }

        if self.io_processes == 0 {
            sink.emit(Event::Deadlocked);
            warn!("{}", Event::Deadlocked);
            ScheduleOutcome::Deadlocked
        } else {
            cpu.set_current_pid(None);
            let event = Event::ProcessorIdle { time: cpu.clock() };
            debug!("{event}");
            sink.emit(event);
            ScheduleOutcome::Idle
        }
    }

    /// Demultiplex a trap into its handler. Returns `Ok(None)` for the
    /// two fire-and-forget/non-blocking traps (`DiskWrite`,
    /// `ForkProgram`) that never reach `schedule`.
    pub fn handle_trap(
        &mut self,
        trap: TrapKind,
        cpu: &mut dyn Cpu,
        sink: &mut dyn EventSink,
    ) -> Result<Option<ScheduleOutcome>, KernelError> {
        let pid = cpu
            .current_pid()
            .expect("trap delivered while no process is running");
        self.validate_pid(pid)?;

        match trap {
            TrapKind::DiskRead { block } => {
                let early = cpu.clock() - self.quantum_start < self.config.quantum as u64;
                let event = Event::DiskReadRequest { time: cpu.clock(), pid };
                sink.emit(event.clone());
                debug!("{event}");
                self.charge_cpu(pid, cpu);
                self.process_table[pid.0 as usize].state = ProcessState::Blocked;
                if early {
                    self.process_table[pid.0 as usize].bump_priority(self.config.num_priorities - 1);
                }
                cpu.disk_read_req(pid, block);
                self.io_processes += 1;
                Ok(Some(self.schedule(cpu, sink)))
            }

            TrapKind::KeyboardRead => {
                let early = cpu.clock() - self.quantum_start < self.config.quantum as u64;
                let event = Event::KeyboardReadRequest { time: cpu.clock(), pid };
                sink.emit(event.clone());
                debug!("{event}");
                self.charge_cpu(pid, cpu);
                self.process_table[pid.0 as usize].state = ProcessState::Blocked;
                if early {
                    self.process_table[pid.0 as usize].bump_priority(self.config.num_priorities - 1);
                }
                cpu.keyboard_read_req(pid);
                self.io_processes += 1;
                Ok(Some(self.schedule(cpu, sink)))
            }

            TrapKind::DiskWrite => {
                cpu.disk_write_req(pid);
                let event = Event::DiskWriteRequest { time: cpu.clock(), pid };
                sink.emit(event.clone());
                debug!("{event}");
                Ok(None)
            }

            TrapKind::ForkProgram { new_pid } => {
                self.validate_pid(new_pid)?;
                self.process_table[new_pid.0 as usize] = ProcessTableEntry {
                    state: ProcessState::Ready,
                    priority: 0,
                    total_cpu_time: 0,
                };
                self.active_processes += 1;
                self.ready_queues[0].enqueue(new_pid);
                let event = Event::ProcessCreated { time: cpu.clock(), pid: new_pid };
                sink.emit(event.clone());
                debug!("{event}");
                Ok(None)
            }

            TrapKind::EndProgram => {
                self.charge_cpu(pid, cpu);
                let total_cpu_time = self.process_table[pid.0 as usize].total_cpu_time;
                self.process_table[pid.0 as usize] = ProcessTableEntry::uninitialized();
                self.active_processes -= 1;
                let event = Event::ProcessExited { time: cpu.clock(), pid, total_cpu_time };
                sink.emit(event.clone());
                debug!("{event}");
                Ok(Some(self.schedule(cpu, sink)))
            }

            TrapKind::SemaphoreOp { sem, up } => {
                self.validate_semaphore(sem)?;
                if up {
                    let event = Event::SemaphoreUp { time: cpu.clock(), pid, sem };
                    sink.emit(event.clone());
                    debug!("{event}");
                    if let UpOutcome::Released(waiter) = self.semaphores[sem as usize].up() {
                        self.process_table[waiter.0 as usize].state = ProcessState::Ready;
                        self.enqueue_at_current_priority(waiter);
                    }
                    Ok(None)
                } else {
                    let early = cpu.clock() - self.quantum_start < self.config.quantum as u64;
                    let event = Event::SemaphoreDown { time: cpu.clock(), pid, sem };
                    sink.emit(event.clone());
                    debug!("{event}");
                    match self.semaphores[sem as usize].down(pid) {
                        DownOutcome::Proceeded => Ok(None),
                        DownOutcome::Blocked => {
                            self.charge_cpu(pid, cpu);
                            self.process_table[pid.0 as usize].state = ProcessState::Blocked;
                            if early {
                                self.process_table[pid.0 as usize]
                                    .bump_priority(self.config.num_priorities - 1);
                            }
                            Ok(Some(self.schedule(cpu, sink)))
                        }
                    }
                }
            }
        }
    }

    /// Quantum expiry check. A no-op while the CPU is idle or the
    /// running process still has time left.
    pub fn handle_clock_interrupt(
        &mut self,
        cpu: &mut dyn Cpu,
        sink: &mut dyn EventSink,
    ) -> Option<ScheduleOutcome> {
        let pid = cpu.current_pid()?;
        if cpu.clock() - self.quantum_start < self.config.quantum as u64 {
            return None;
        }
        self.process_table[pid.0 as usize].state = ProcessState::Ready;
        self.charge_cpu(pid, cpu);
        self.process_table[pid.0 as usize].drop_priority();
        self.enqueue_at_current_priority(pid);
        Some(self.schedule(cpu, sink))
    }

    pub fn handle_disk_interrupt(
        &mut self,
        pid: Pid,
        cpu: &mut dyn Cpu,
        sink: &mut dyn EventSink,
    ) -> Result<Option<ScheduleOutcome>, KernelError> {
        self.validate_pid(pid)?;
        self.process_table[pid.0 as usize].state = ProcessState::Ready;
        self.io_processes -= 1;
        self.enqueue_at_current_priority(pid);
        let event = Event::DiskInterruptHandled { time: cpu.clock(), pid };
        sink.emit(event.clone());
        debug!("{event}");
        if cpu.current_pid().is_none() {
            self.quantum_start = cpu.clock();
            Ok(Some(self.schedule(cpu, sink)))
        } else {
            Ok(None)
        }
    }

    pub fn handle_keyboard_interrupt(
        &mut self,
        pid: Pid,
        cpu: &mut dyn Cpu,
        sink: &mut dyn EventSink,
    ) -> Result<Option<ScheduleOutcome>, KernelError> {
        self.validate_pid(pid)?;
        self.process_table[pid.0 as usize].state = ProcessState::Ready;
        self.io_processes -= 1;
        self.enqueue_at_current_priority(pid);
        let event = Event::KeyboardInterruptHandled { time: cpu.clock(), pid };
        sink.emit(event.clone());
        debug!("{event}");
        if cpu.current_pid().is_none() {
            self.quantum_start = cpu.clock();
            Ok(Some(self.schedule(cpu, sink)))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeCpu {
        clock: u64,
        current_pid: Option<Pid>,
        disk_reads: Vec<(Pid, u32)>,
        disk_writes: Vec<Pid>,
        keyboard_reads: Vec<Pid>,
        page_faults: Vec<u32>,
    }

    impl FakeCpu {
        fn new() -> Self {
            Self {
                clock: 0,
                current_pid: None,
                disk_reads: Vec::new(),
                disk_writes: Vec::new(),
                keyboard_reads: Vec::new(),
                page_faults: Vec::new(),
            }
        }
    }

    impl Cpu for FakeCpu {
        fn clock(&self) -> u64 {
            self.clock
        }
        fn current_pid(&self) -> Option<Pid> {
            self.current_pid
        }
        fn set_current_pid(&mut self, pid: Option<Pid>) {
            self.current_pid = pid;
        }
        fn disk_read_req(&mut self, pid: Pid, block: u32) {
            self.disk_reads.push((pid, block));
        }
        fn disk_write_req(&mut self, pid: Pid) {
            self.disk_writes.push(pid);
        }
        fn keyboard_read_req(&mut self, pid: Pid) {
            self.keyboard_reads.push(pid);
        }
        fn issue_page_fault_trap(&mut self, vpage: u32) {
            self.page_faults.push(vpage);
        }
    }

    fn booted(config: KernelConfig) -> (Scheduler, FakeCpu) {
        let mut sched = Scheduler::new(config);
        let mut cpu = FakeCpu::new();
        sched.boot(Pid(0), &mut cpu);
        (sched, cpu)
    }

    #[test]
    fn single_process_exit_terminates_with_no_more_processes() {
        let (mut sched, mut cpu) = booted(KernelConfig::default());
        cpu.clock = 100;
        let mut log = Vec::new();
        let outcome = sched
            .handle_trap(TrapKind::EndProgram, &mut cpu, &mut log)
            .unwrap();
        assert_eq!(outcome, Some(ScheduleOutcome::NoMoreProcesses));
        assert_eq!(
            log,
            vec![
                Event::ProcessExited { time: 100, pid: Pid(0), total_cpu_time: 100 },
                Event::NoMoreProcesses,
            ]
        );
    }

    #[test]
    fn fork_then_quantum_expiry_switches_to_child() {
        let (mut sched, mut cpu) = booted(KernelConfig::default());
        let mut log = Vec::new();

        cpu.clock = 10;
        sched
            .handle_trap(TrapKind::ForkProgram { new_pid: Pid(1) }, &mut cpu, &mut log)
            .unwrap();
        assert_eq!(sched.process_state(Pid(1)), ProcessState::Ready);
        assert_eq!(sched.active_processes(), 2);

        cpu.clock = 40;
        let outcome = sched.handle_clock_interrupt(&mut cpu, &mut log).unwrap();
        assert_eq!(outcome, ScheduleOutcome::Running(Pid(1)));
        assert_eq!(sched.priority(Pid(0)), 0);
        assert_eq!(
            log,
            vec![
                Event::ProcessCreated { time: 10, pid: Pid(1) },
                Event::ProcessRuns { time: 40, pid: Pid(1) },
            ]
        );
    }

    #[test]
    fn disk_read_before_quantum_expiry_bumps_priority_and_goes_idle() {
        let (mut sched, mut cpu) = booted(KernelConfig::default());
        let mut log = Vec::new();
        cpu.clock = 5;

        let outcome = sched
            .handle_trap(TrapKind::DiskRead { block: 3 }, &mut cpu, &mut log)
            .unwrap();
        assert_eq!(outcome, Some(ScheduleOutcome::Idle));
        assert_eq!(sched.priority(Pid(0)), 1);
        assert_eq!(sched.io_processes(), 1);
        assert_eq!(cpu.disk_reads, vec![(Pid(0), 3)]);
        assert_eq!(
            log,
            vec![
                Event::DiskReadRequest { time: 5, pid: Pid(0) },
                Event::ProcessorIdle { time: 5 },
            ]
        );
    }

    #[test]
    fn disk_completion_wakes_idle_cpu_immediately() {
        let (mut sched, mut cpu) = booted(KernelConfig::default());
        let mut log = Vec::new();
        cpu.clock = 5;
        sched
            .handle_trap(TrapKind::DiskRead { block: 3 }, &mut cpu, &mut log)
            .unwrap();
        log.clear();

        cpu.clock = 200;
        let outcome = sched
            .handle_disk_interrupt(Pid(0), &mut cpu, &mut log)
            .unwrap();
        assert_eq!(outcome, Some(ScheduleOutcome::Running(Pid(0))));
        assert_eq!(sched.io_processes(), 0);
        assert_eq!(
            log,
            vec![
                Event::DiskInterruptHandled { time: 200, pid: Pid(0) },
                Event::ProcessRuns { time: 200, pid: Pid(0) },
            ]
        );
    }

    #[test]
    fn semaphore_cycle_deadlocks_when_ready_queues_and_io_are_empty() {
        let (mut sched, mut cpu) = booted(KernelConfig::default());
        let mut log = Vec::new();

        sched
            .handle_trap(TrapKind::ForkProgram { new_pid: Pid(1) }, &mut cpu, &mut log)
            .unwrap();

        // PID 0 takes semaphore 0, then loses the CPU to quantum expiry
        // (not a block) so PID 1 gets a turn.
        sched
            .handle_trap(TrapKind::SemaphoreOp { sem: 0, up: false }, &mut cpu, &mut log)
            .unwrap();
        assert_eq!(sched.semaphore_value(0), 0);

        cpu.clock = 40;
        let outcome = sched.handle_clock_interrupt(&mut cpu, &mut log).unwrap();
        assert_eq!(outcome, ScheduleOutcome::Running(Pid(1)));

        // PID 1 takes semaphore 1, then blocks trying to take semaphore
        // 0 (held by PID 0). PID 0 is still ready, so it runs again.
        sched
            .handle_trap(TrapKind::SemaphoreOp { sem: 1, up: false }, &mut cpu, &mut log)
            .unwrap();
        assert_eq!(sched.semaphore_value(1), 0);

        let outcome = sched
            .handle_trap(TrapKind::SemaphoreOp { sem: 0, up: false }, &mut cpu, &mut log)
            .unwrap();
        assert_eq!(outcome, Some(ScheduleOutcome::Running(Pid(0))));
        assert_eq!(sched.process_state(Pid(1)), ProcessState::Blocked);

        // PID 0 now blocks trying to take semaphore 1 (held by PID 1):
        // classic circular wait with no I/O outstanding anywhere.
        let outcome = sched
            .handle_trap(TrapKind::SemaphoreOp { sem: 1, up: false }, &mut cpu, &mut log)
            .unwrap();
        assert_eq!(outcome, Some(ScheduleOutcome::Deadlocked));
        assert_eq!(sched.io_processes(), 0);
    }

    #[test]
    fn unknown_trap_code_is_rejected() {
        assert_eq!(
            TrapKind::from_registers(99, 0, 0),
            Err(KernelError::UnknownTrap(99))
        );
    }

    #[test]
    fn out_of_range_pid_is_rejected() {
        let (mut sched, mut cpu) = booted(KernelConfig { max_processes: 2, ..Default::default() });
        let mut log = Vec::new();
        let result = sched.handle_disk_interrupt(Pid(5), &mut cpu, &mut log);
        assert_eq!(result, Err(KernelError::InvalidPid(Pid(5))));
    }
}
