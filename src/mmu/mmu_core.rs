/*
 * MMU Translator
 *
 * Orchestrates the TLB -> page table -> page-fault path and assembles
 * physical addresses. The only free-frame source: a bump-free scan over
 * the frame-allocation bitmap: choosing a victim via R/M bits when none
 * are free is the OS's job, outside this core.
 */

use log::{debug, trace};

use crate::config::MmuConfig;
use crate::cpu::{Cpu, MemOp};

use super::bitmap::Bitmap;
use super::page_table::PageTable;
use super::tlb::{Tlb, TlbLookup};
use super::{split_vaddr, PAGE_OFFSET_BITS};

/// Sentinel documenting the original source's "no free page frame"
/// return value; `get_free_page_frame` itself returns `Option<u32>`.
pub const NO_FREE_PAGEFRAME: u32 = u32::MAX;

/// Result of `Mmu::translate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslateOutcome {
    /// No fault; the assembled physical address.
    Translated(u32),
    /// A page fault was delivered via `Cpu::issue_page_fault_trap`. The
    /// caller gets no address back — the faulting instruction is
    /// expected to be re-executed once the fault handler resolves the
    /// mapping.
    Faulted,
}

pub struct Mmu {
    present: Bitmap,
    rbit: Bitmap,
    mbit: Bitmap,
    page_table: PageTable,
    tlb: Tlb,
    tlb_miss_count: u64,
}

impl Mmu {
    pub fn new(config: MmuConfig) -> Self {
        Self {
            present: Bitmap::new(config.num_page_frames),
            rbit: Bitmap::new(config.num_page_frames),
            mbit: Bitmap::new(config.num_page_frames),
            page_table: PageTable::new(),
            tlb: Tlb::new(config.num_tlb_entries),
            tlb_miss_count: 0,
        }
    }

    pub fn tlb_miss_count(&self) -> u64 {
        self.tlb_miss_count
    }

    pub fn frame_present(&self, frame: u32) -> bool {
        self.present.get(frame as usize)
    }

    pub fn frame_r(&self, frame: u32) -> bool {
        self.rbit.get(frame as usize)
    }

    pub fn frame_m(&self, frame: u32) -> bool {
        self.mbit.get(frame as usize)
    }

    /// Record that `vpage` now maps to `frame`, for the fault handler
    /// (outside this core) to call once it has chosen a frame.
    pub fn map_page(&mut self, vpage: u32, frame: u32) {
        self.page_table.update(vpage, frame);
    }

    pub fn unmap_page(&mut self, vpage: u32) {
        self.page_table.clear_entry(vpage);
        self.tlb.clear_entry(vpage);
    }

    /// Scan the frame-allocation bitmap for the first free frame, mark
    /// it used, and return it. `None` means the bitmap is exhausted;
    /// the caller must pick a victim via R/M bits itself.
    pub fn get_free_page_frame(&mut self) -> Option<u32> {
        self.present.find_and_set_first_clear().map(|f| f as u32)
    }

    pub fn translate(&mut self, vaddr: u32, op: MemOp, cpu: &mut dyn Cpu) -> TranslateOutcome {
        let (vpage, offset) = split_vaddr(vaddr);

        if let TlbLookup::Hit(frame) = self.tlb.lookup(vpage, op) {
            return TranslateOutcome::Translated((frame << PAGE_OFFSET_BITS) | offset);
        }

        self.tlb_miss_count += 1;
        trace!("tlb miss for vpage {vpage} (total {})", self.tlb_miss_count);

        match self.page_table.get_frame(vpage) {
            Some(frame) => {
                let r = self.rbit.get(frame as usize);
                let m = self.mbit.get(frame as usize);
                if let Some(evicted) = self.tlb.insert(vpage, frame, r, m) {
                    self.rbit.set(evicted.frame as usize, evicted.r);
                    self.mbit.set(evicted.frame as usize, evicted.m);
                }
                TranslateOutcome::Translated((frame << PAGE_OFFSET_BITS) | offset)
            }
            None => {
                // Write back every valid TLB entry's R/M bits before
                // handing off, so the fault handler sees accurate
                // bitmaps when it picks a victim frame.
                for evicted in self.tlb.write_back_r_m() {
                    self.rbit.set(evicted.frame as usize, evicted.r);
                    self.mbit.set(evicted.frame as usize, evicted.m);
                }
                debug!("page fault on vpage {vpage}");
                cpu.issue_page_fault_trap(vpage);
                TranslateOutcome::Faulted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::Pid;

    struct FakeCpu {
        clock: u64,
        current_pid: Option<Pid>,
        page_faults: Vec<u32>,
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
        fn disk_read_req(&mut self, _pid: Pid, _block: u32) {}
        fn disk_write_req(&mut self, _pid: Pid) {}
        fn keyboard_read_req(&mut self, _pid: Pid) {}
        fn issue_page_fault_trap(&mut self, vpage: u32) {
            self.page_faults.push(vpage);
        }
    }

    fn fake_cpu() -> FakeCpu {
        FakeCpu { clock: 0, current_pid: Some(Pid(0)), page_faults: Vec::new() }
    }

    #[test]
    fn translate_hit_twice_counts_exactly_one_miss() {
        let mut mmu = Mmu::new(MmuConfig::default());
        let mut cpu = fake_cpu();
        let frame = mmu.get_free_page_frame().unwrap();
        mmu.map_page(0x0040_0004 >> 11, frame);

        let first = mmu.translate(0x0040_0004, MemOp::Load, &mut cpu);
        let second = mmu.translate(0x0040_0004, MemOp::Load, &mut cpu);

        assert_eq!(first, second);
        assert!(matches!(first, TranslateOutcome::Translated(_)));
        assert_eq!(mmu.tlb_miss_count(), 1);
        assert!(cpu.page_faults.is_empty());
    }

    #[test]
    fn translate_unmapped_page_faults_and_writes_back_tlb() {
        let mut mmu = Mmu::new(MmuConfig::default());
        let mut cpu = fake_cpu();

        let frame = mmu.get_free_page_frame().unwrap();
        mmu.map_page(1, frame);
        mmu.translate(1 << 11, MemOp::Store, &mut cpu);
        assert!(mmu.frame_m(frame));

        let outcome = mmu.translate(2 << 11, MemOp::Load, &mut cpu);
        assert_eq!(outcome, TranslateOutcome::Faulted);
        assert_eq!(cpu.page_faults, vec![2]);
        // The write-back ran before the fault was delivered.
        assert!(mmu.frame_m(frame));
    }

    #[test]
    fn free_frame_allocation_is_exhausted_eventually() {
        let config = MmuConfig { num_page_frames: 4, num_tlb_entries: 2 };
        let mut mmu = Mmu::new(config);
        for _ in 0..4 {
            assert!(mmu.get_free_page_frame().is_some());
        }
        assert_eq!(mmu.get_free_page_frame(), None);
    }
}
