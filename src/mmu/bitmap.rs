/*
 * Frame Bitmap
 *
 * A densely packed, word-addressable bit vector over page frames. Used
 * for the present/R/M bookkeeping the TLB writes back to on eviction,
 * and for the free-frame scan.
 */

/// Bit-addressable vector over page frames, one bit per frame, packed
/// 32 to a word. `num_frames` need not be a multiple of 32; the last
/// word's padding bits are never scanned or reported as free.
#[derive(Debug, Clone)]
pub struct Bitmap {
    words: Vec<u32>,
    num_frames: usize,
}

impl Bitmap {
    pub fn new(num_frames: usize) -> Self {
        Self { words: vec![0; num_frames.div_ceil(32)], num_frames }
    }

    pub fn get(&self, frame: usize) -> bool {
        let (word, bit) = (frame / 32, frame % 32);
        (self.words[word] >> bit) & 1 != 0
    }

    pub fn set(&mut self, frame: usize, value: bool) {
        let (word, bit) = (frame / 32, frame % 32);
        if value {
            self.words[word] |= 1 << bit;
        } else {
            self.words[word] &= !(1 << bit);
        }
    }

    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// Scan word-wise for the first clear bit, set it, and return its
    /// frame number. Mirrors the original allocator's word-skip then
    /// high-to-low bit scan exactly, since nothing in the externally
    /// observable behavior depends on scan direction except which frame
    /// number is returned when more than one is free. Padding bits past
    /// `num_frames` in the last word are never considered, so a
    /// `num_frames` that isn't a multiple of 32 can't hand out
    /// out-of-range frame numbers or mask real exhaustion.
    pub fn find_and_set_first_clear(&mut self) -> Option<usize> {
        for (word_idx, word) in self.words.iter_mut().enumerate() {
            if *word == u32::MAX {
                continue;
            }
            for bit in (0..32).rev() {
                let frame = word_idx * 32 + bit;
                if frame >= self.num_frames {
                    continue;
                }
                if (*word >> bit) & 1 == 0 {
                    *word |= 1 << bit;
                    return Some(frame);
                }
            }
        }
        None
    }
}
