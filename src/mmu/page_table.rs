/*
 * Two-Level Page Table
 *
 * First level is a fixed array of 2048 possibly-absent pointers to
 * second-level tables of 1024 entries each; absent means the entire
 * 2^21-byte region is unmapped. Replaces the original's raw pointers
 * with `Option<Box<[...]>>` — same lazy-allocation behavior, no
 * dangling references possible.
 */

use super::{split_vpage, PAGES_PER_LEVEL1, PAGES_PER_LEVEL2};

/// A single level-2 entry: present bit plus frame number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct PageTableEntry {
    present: bool,
    frame: u32,
}

type Level2Table = Box<[PageTableEntry; PAGES_PER_LEVEL2]>;

pub struct PageTable {
    levels1: Vec<Option<Level2Table>>,
}

impl PageTable {
    pub fn new() -> Self {
        let mut levels1 = Vec::with_capacity(PAGES_PER_LEVEL1);
        levels1.resize_with(PAGES_PER_LEVEL1, || None);
        Self { levels1 }
    }

    /// Look up the frame mapped for `vpage`. Returns `None` on a page
    /// fault (absent level-1 slot or present bit clear).
    pub fn get_frame(&self, vpage: u32) -> Option<u32> {
        let (idx1, idx2) = split_vpage(vpage);
        let level2 = self.levels1[idx1].as_ref()?;
        let entry = level2[idx2];
        entry.present.then_some(entry.frame)
    }

    /// Map `vpage` to `frame`, lazily allocating the level-2 table if
    /// this is the first mapping in its 2^21-byte region. Allocation is
    /// permanent for the life of the simulation.
    pub fn update(&mut self, vpage: u32, frame: u32) {
        let (idx1, idx2) = split_vpage(vpage);
        let level2 = self.levels1[idx1]
            .get_or_insert_with(|| Box::new([PageTableEntry::default(); PAGES_PER_LEVEL2]));
        level2[idx2] = PageTableEntry { present: true, frame };
    }

    /// Clear the present bit. The frame number is left untouched — it
    /// is irrelevant while the entry is absent.
    pub fn clear_entry(&mut self, vpage: u32) {
        let (idx1, idx2) = split_vpage(vpage);
        if let Some(level2) = self.levels1[idx1].as_mut() {
            level2[idx2].present = false;
        }
    }
}

impl Default for PageTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_level1_slot_is_a_fault() {
        let pt = PageTable::new();
        assert_eq!(pt.get_frame(0), None);
    }

    #[test]
    fn update_then_get_frame_round_trips() {
        let mut pt = PageTable::new();
        pt.update(5, 77);
        assert_eq!(pt.get_frame(5), Some(77));
    }

    #[test]
    fn clear_entry_retains_frame_number_but_faults() {
        let mut pt = PageTable::new();
        pt.update(5, 77);
        pt.clear_entry(5);
        assert_eq!(pt.get_frame(5), None);
        pt.update(5, 77);
        assert_eq!(pt.get_frame(5), Some(77));
    }

    #[test]
    fn distinct_vpages_in_same_level1_region_are_independent() {
        let mut pt = PageTable::new();
        pt.update(0, 1);
        pt.update(1, 2);
        assert_eq!(pt.get_frame(0), Some(1));
        assert_eq!(pt.get_frame(1), Some(2));
    }
}
