//! The global segment: string literals and consteval objects.
//!
//! Contents are written once, during codegen, and are read-only for every
//! execution. Addresses are assigned eagerly at object creation so that
//! serialized data can embed pointers to other global objects.

use orec_abi::size_and_align::Align;
use orec_ir::function::GlobalIdx;
use orec_ir::ty::TypeIdx;
use orec_utils::index_vec::IdxVec;
use tracing::trace;

#[derive(Debug)]
pub struct GlobalObject {
    pub address: u64,
    pub ty: TypeIdx,
    pub data: Vec<u8>,
}

impl GlobalObject {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[derive(Debug)]
pub struct GlobalMemory {
    segment_begin: u64,
    segment_end: u64,
    next_address: u64,
    objects: IdxVec<GlobalIdx, GlobalObject>,
}

impl GlobalMemory {
    pub fn new(segment_begin: u64, segment_end: u64) -> Self {
        GlobalMemory {
            segment_begin,
            segment_end,
            next_address: segment_begin,
            objects: IdxVec::new(),
        }
    }

    /// Places `data` at the next `align`ed address. The data must already be
    /// serialized for the object type; it is never written again.
    pub fn add_object(&mut self, ty: TypeIdx, align: Align, data: Vec<u8>) -> GlobalIdx {
        let address = align.align_up(self.next_address);
        // Zero-sized objects still get a distinct address, and a guard byte
        // keeps every object's one-past-the-end address out of its
        // neighbor, so serialized end pointers resolve unambiguously.
        let occupied = (data.len() as u64).max(1) + 1;
        assert!(
            address + occupied <= self.segment_end,
            "global memory segment exhausted"
        );
        self.next_address = address + occupied;
        trace!(address, size = data.len(), "global object added");
        self.objects.push(GlobalObject { address, ty, data })
    }

    pub fn object(&self, idx: GlobalIdx) -> &GlobalObject {
        &self.objects[idx]
    }

    pub fn objects_len(&self) -> usize {
        self.objects.len()
    }

    /// The object containing `addr`, if any. Objects are address-ordered,
    /// so this is a binary search.
    pub fn find(&self, addr: u64) -> Option<&GlobalObject> {
        if addr < self.segment_begin || addr >= self.next_address {
            return None;
        }
        let idx = self
            .objects
            .raw
            .partition_point(|object| object.address <= addr);
        let object = &self.objects.raw[idx.checked_sub(1)?];
        (addr < object.address + object.size().max(1)).then_some(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orec_abi::target::TargetLayout;
    use orec_ir::ty::{BuiltinKind, TypeSet};

    #[test]
    fn placement_and_lookup() {
        let set = TypeSet::new(TargetLayout::host_default());
        let i32_t = set.builtin_type(BuiltinKind::I32);
        let mut memory = GlobalMemory::new(0x1_0000, 0x4000_0000);

        let a = memory.add_object(i32_t, Align::from_bytes(4).unwrap(), vec![1, 2, 3, 4]);
        let b = memory.add_object(i32_t, Align::from_bytes(4).unwrap(), vec![5, 6, 7, 8]);
        let a_addr = memory.object(a).address;
        let b_addr = memory.object(b).address;
        assert_eq!(a_addr, 0x1_0000);
        // The guard byte keeps a's one-past-the-end address to itself.
        assert_eq!(b_addr, 0x1_0008);

        assert_eq!(memory.find(a_addr).unwrap().address, a_addr);
        assert_eq!(memory.find(a_addr + 3).unwrap().address, a_addr);
        assert!(memory.find(a_addr + 4).is_none());
        assert_eq!(memory.find(b_addr).unwrap().address, b_addr);
        assert!(memory.find(b_addr + 4).is_none());
        assert!(memory.find(0xffff).is_none());
    }
}
