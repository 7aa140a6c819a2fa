//! The meta segment: one-past-the-end markers.
//!
//! A pointer equal to `base + size` of an object would collide with the
//! next object's base address, so forming one instead yields a synthetic
//! address in the meta segment that remembers the real end address.
//! Comparisons and pointer differences decode it; dereferencing it is an
//! error.

use rustc_hash::FxHashMap;

use crate::segments::Ptr;

#[derive(Debug)]
pub struct MetaMemory {
    segment_begin: u64,
    /// Meta offset -> real one-past-the-end address.
    entries: Vec<u64>,
    dedup: FxHashMap<u64, Ptr>,
}

impl MetaMemory {
    pub fn new(segment_begin: u64) -> Self {
        MetaMemory {
            segment_begin,
            entries: Vec::new(),
            dedup: FxHashMap::default(),
        }
    }

    /// The marker for the real one-past-the-end address `real`, allocating
    /// it on first use so that equal end addresses compare equal.
    pub fn make_one_past_end(&mut self, real: u64) -> Ptr {
        if let Some(&ptr) = self.dedup.get(&real) {
            return ptr;
        }
        let ptr = Ptr(self.segment_begin + self.entries.len() as u64);
        self.entries.push(real);
        self.dedup.insert(real, ptr);
        ptr
    }

    /// The real address behind a meta pointer.
    pub fn real_address(&self, ptr: Ptr) -> Option<u64> {
        let offset = ptr.0.checked_sub(self.segment_begin)?;
        self.entries.get(offset as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_are_deduplicated() {
        let mut meta = MetaMemory::new(0xff00_0000);
        let a = meta.make_one_past_end(0x4000_0010);
        let b = meta.make_one_past_end(0x4000_0010);
        let c = meta.make_one_past_end(0x4000_0020);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(meta.real_address(a), Some(0x4000_0010));
        assert_eq!(meta.real_address(c), Some(0x4000_0020));
    }
}
