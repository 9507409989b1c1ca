/*
 * Kernel Core Demo Driver
 *
 * A tiny stand-in for the hardware-simulator façade this kernel core
 * normally runs under, wired up to drive one of the canned end-to-end
 * scenarios and print its event log to stdout. Not the simulator
 * driver itself — that remains out of scope — just enough to exercise
 * the two cores from the command line.
 */

use clap::{Parser, ValueEnum};
use kernelsim::cpu::Cpu;
use kernelsim::event::{Event, EventSink};
use kernelsim::sched::{InterruptKind, Pid, TrapKind};
use kernelsim::{Kernel, KernelConfig, MmuConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    /// A single process issues END_PROGRAM and the simulator halts.
    SingleExit,
    /// A fork followed by a quantum-expiry preemption to the child.
    ForkPreempt,
    /// A disk read request that promotes the caller's priority.
    DiskRead,
    /// Two processes circularly waiting on each other's semaphore.
    Deadlock,
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_possible_value().unwrap().get_name().fmt(f)
    }
}

#[derive(Parser)]
#[command(about = "Drive one of the kernel core's canned scenarios and print its event log")]
struct Args {
    #[arg(value_enum, default_value_t = Scenario::SingleExit)]
    scenario: Scenario,
}

struct StdoutSink;

impl EventSink for StdoutSink {
    fn emit(&mut self, event: Event) {
        println!("{event}");
    }
}

struct DemoCpu {
    clock: u64,
    current_pid: Option<Pid>,
}

impl DemoCpu {
    fn new() -> Self {
        Self { clock: 0, current_pid: None }
    }

    fn advance_to(&mut self, time: u64) {
        self.clock = time;
    }
}

impl Cpu for DemoCpu {
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
        log::info!("façade: disk_read_req(pid={pid}, block={block})");
    }
    fn disk_write_req(&mut self, pid: Pid) {
        log::info!("façade: disk_write_req(pid={pid})");
    }
    fn keyboard_read_req(&mut self, pid: Pid) {
        log::info!("façade: keyboard_read_req(pid={pid})");
    }
    fn issue_page_fault_trap(&mut self, vpage: u32) {
        log::info!("façade: issue_page_fault_trap(vpage={vpage})");
    }
}

fn run_single_exit(kernel: &mut Kernel, cpu: &mut DemoCpu, sink: &mut dyn EventSink) {
    cpu.advance_to(100);
    kernel.handle_trap(TrapKind::EndProgram, cpu, sink).unwrap();
}

fn run_fork_preempt(kernel: &mut Kernel, cpu: &mut DemoCpu, sink: &mut dyn EventSink) {
    cpu.advance_to(10);
    kernel
        .handle_trap(TrapKind::ForkProgram { new_pid: Pid(1) }, cpu, sink)
        .unwrap();
    cpu.advance_to(40);
    kernel.handle_interrupt(InterruptKind::Clock, cpu, sink).unwrap();
}

fn run_disk_read(kernel: &mut Kernel, cpu: &mut DemoCpu, sink: &mut dyn EventSink) {
    cpu.advance_to(5);
    kernel
        .handle_trap(TrapKind::DiskRead { block: 3 }, cpu, sink)
        .unwrap();
    cpu.advance_to(200);
    kernel
        .handle_interrupt(InterruptKind::Disk { pid: Pid(0) }, cpu, sink)
        .unwrap();
}

fn run_deadlock(kernel: &mut Kernel, cpu: &mut DemoCpu, sink: &mut dyn EventSink) {
    kernel
        .handle_trap(TrapKind::ForkProgram { new_pid: Pid(1) }, cpu, sink)
        .unwrap();
    kernel
        .handle_trap(TrapKind::SemaphoreOp { sem: 0, up: false }, cpu, sink)
        .unwrap();
    cpu.advance_to(40);
    kernel.handle_interrupt(InterruptKind::Clock, cpu, sink).unwrap();
    kernel
        .handle_trap(TrapKind::SemaphoreOp { sem: 1, up: false }, cpu, sink)
        .unwrap();
    kernel
        .handle_trap(TrapKind::SemaphoreOp { sem: 0, up: false }, cpu, sink)
        .unwrap();
    kernel
        .handle_trap(TrapKind::SemaphoreOp { sem: 1, up: false }, cpu, sink)
        .unwrap();
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut kernel = Kernel::new(KernelConfig::default(), MmuConfig::default());
    let mut cpu = DemoCpu::new();
    let mut sink = StdoutSink;
    kernel.boot(Pid(0), &mut cpu);

    match args.scenario {
        Scenario::SingleExit => run_single_exit(&mut kernel, &mut cpu, &mut sink),
        Scenario::ForkPreempt => run_fork_preempt(&mut kernel, &mut cpu, &mut sink),
        Scenario::DiskRead => run_disk_read(&mut kernel, &mut cpu, &mut sink),
        Scenario::Deadlock => run_deadlock(&mut kernel, &mut cpu, &mut sink),
    }

    Ok(())
}
