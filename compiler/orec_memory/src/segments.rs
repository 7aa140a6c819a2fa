//! The segmented address space of the abstract machine.
//!
//! Addresses are plain integers; the top bits select the segment. The split
//! is fixed per invocation and differs only between the 32-bit and 64-bit
//! machine models. Pointers are opaque to evaluated programs: there are no
//! integer-to-pointer casts, so every pointer value in circulation was
//! produced by an allocation, a gep, or serialized global data.

use orec_abi::target::TargetLayout;

/// An abstract machine address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ptr(pub u64);

impl Ptr {
    pub const NULL: Ptr = Ptr(0);

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn addr(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemorySegment {
    /// String literals and consteval objects; write-once during codegen.
    Global,
    /// Allocas and call frames.
    Stack,
    /// `malloc`-issued objects.
    Heap,
    /// One-past-the-end markers; synthetic, never dereferenced.
    Meta,
}

/// The segment base addresses for one machine model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentInfo {
    pub global_begin: u64,
    pub stack_begin: u64,
    pub heap_begin: u64,
    pub meta_begin: u64,
}

const SEGMENT_INFO_32: SegmentInfo = SegmentInfo {
    global_begin: 0x0001_0000,
    stack_begin: 0x4000_0000,
    heap_begin: 0x8000_0000,
    meta_begin: 0xff00_0000,
};

const SEGMENT_INFO_64: SegmentInfo = SegmentInfo {
    global_begin: 0x0000_0000_0001_0000,
    stack_begin: 0x4000_0000_0000_0000,
    heap_begin: 0x8000_0000_0000_0000,
    meta_begin: 0xff00_0000_0000_0000,
};

impl SegmentInfo {
    pub const fn for_target(target: &TargetLayout) -> SegmentInfo {
        if target.is_64_bit() {
            SEGMENT_INFO_64
        } else {
            SEGMENT_INFO_32
        }
    }

    /// The segment a non-null address belongs to.
    pub fn segment_of(&self, ptr: Ptr) -> MemorySegment {
        debug_assert!(!ptr.is_null());
        if ptr.0 >= self.meta_begin {
            MemorySegment::Meta
        } else if ptr.0 >= self.heap_begin {
            MemorySegment::Heap
        } else if ptr.0 >= self.stack_begin {
            MemorySegment::Stack
        } else {
            MemorySegment::Global
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orec_abi::target::{Endianness, PointerWidth};

    #[test]
    fn segment_selection() {
        let info = SegmentInfo::for_target(&TargetLayout::new(
            PointerWidth::Bits32,
            Endianness::Little,
        ));
        assert_eq!(info.segment_of(Ptr(0x0002_0000)), MemorySegment::Global);
        assert_eq!(info.segment_of(Ptr(0x4000_0010)), MemorySegment::Stack);
        assert_eq!(info.segment_of(Ptr(0x8123_0000)), MemorySegment::Heap);
        assert_eq!(info.segment_of(Ptr(0xff00_0001)), MemorySegment::Meta);
    }

    #[test]
    fn split_is_width_dependent() {
        let info64 = SegmentInfo::for_target(&TargetLayout::new(
            PointerWidth::Bits64,
            Endianness::Little,
        ));
        assert_eq!(info64.segment_of(Ptr(0x8000_0000)), MemorySegment::Global);
        assert_eq!(
            info64.segment_of(Ptr(0x8000_0000_0000_0000)),
            MemorySegment::Heap
        );
    }
}
