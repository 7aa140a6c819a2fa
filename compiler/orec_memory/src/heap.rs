//! The heap segment: `malloc`-issued objects.
//!
//! Each allocation records its element type, count and source location;
//! `free` validates the pointer against those records and deadens the
//! allocation instead of recycling its address, so use-after-free and
//! double-free remain detectable for the rest of the evaluation.

use std::collections::BTreeMap;

use orec_ir::ty::{TypeIdx, TypeSet};
use orec_session::SrcSpan;
use tracing::trace;

use crate::error::MemoryError;

#[derive(Debug)]
pub struct HeapAllocation {
    pub address: u64,
    pub elem_ty: TypeIdx,
    pub count: u64,
    pub is_freed: bool,
    pub data: Vec<u8>,
    pub malloc_span: SrcSpan,
    pub free_span: Option<SrcSpan>,
}

impl HeapAllocation {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[derive(Debug)]
pub struct HeapMemory {
    segment_end: u64,
    next_address: u64,
    allocations: Vec<HeapAllocation>,
    index: BTreeMap<u64, usize>,
}

impl HeapMemory {
    pub fn new(segment_begin: u64, segment_end: u64) -> Self {
        HeapMemory {
            segment_end,
            next_address: segment_begin,
            allocations: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    pub fn malloc(
        &mut self,
        type_set: &TypeSet,
        elem_ty: TypeIdx,
        count: u64,
        span: SrcSpan,
    ) -> Result<u64, MemoryError> {
        let size = type_set
            .size_of(elem_ty)
            .checked_mul(count)
            .ok_or(MemoryError::HeapExhausted)?
            .bytes();
        let align = type_set.align_of(elem_ty);
        let address = align.align_up(self.next_address);
        if address + size.max(1) > self.segment_end {
            return Err(MemoryError::HeapExhausted);
        }
        self.next_address = address + size.max(1);

        self.index.insert(address, self.allocations.len());
        self.allocations.push(HeapAllocation {
            address,
            elem_ty,
            count,
            is_freed: false,
            data: vec![0; size as usize],
            malloc_span: span,
            free_span: None,
        });
        trace!(address, count, "heap allocation");
        Ok(address)
    }

    pub fn free(&mut self, addr: u64, span: SrcSpan) -> Result<(), MemoryError> {
        let allocation = self
            .find_mut(addr)
            .ok_or(MemoryError::FreeNonHeap)?;
        if allocation.address != addr {
            return Err(MemoryError::FreeNotAllocationBase);
        }
        if allocation.is_freed {
            return Err(MemoryError::DoubleFree {
                malloc_span: allocation.malloc_span,
                free_span: allocation.free_span.unwrap_or(span),
            });
        }
        allocation.is_freed = true;
        allocation.free_span = Some(span);
        allocation.data.fill(0);
        trace!(addr, "heap free");
        Ok(())
    }

    pub fn find(&self, addr: u64) -> Option<&HeapAllocation> {
        let (_, &idx) = self.index.range(..=addr).next_back()?;
        let allocation = &self.allocations[idx];
        (addr < allocation.address + allocation.size().max(1)).then_some(allocation)
    }

    pub fn find_mut(&mut self, addr: u64) -> Option<&mut HeapAllocation> {
        let (_, &idx) = self.index.range(..=addr).next_back()?;
        let allocation = &mut self.allocations[idx];
        (addr < allocation.address + allocation.size().max(1)).then_some(allocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orec_abi::target::TargetLayout;
    use orec_ir::ty::BuiltinKind;

    fn set() -> TypeSet {
        TypeSet::new(TargetLayout::host_default())
    }

    #[test]
    fn malloc_free_cycle() {
        let set = set();
        let i32_t = set.builtin_type(BuiltinKind::I32);
        let mut heap = HeapMemory::new(0x8000_0000_0000_0000, 0xff00_0000_0000_0000);
        let span = SrcSpan::synthetic();

        let addr = heap.malloc(&set, i32_t, 4, span).unwrap();
        assert_eq!(heap.find(addr).unwrap().size(), 16);
        assert!(heap.find(addr + 15).is_some());

        heap.free(addr, span).unwrap();
        assert!(heap.find(addr).unwrap().is_freed);

        // Double free keeps both source locations.
        match heap.free(addr, span) {
            Err(MemoryError::DoubleFree { .. }) => {}
            other => panic!("expected DoubleFree, got {:?}", other),
        }
    }

    #[test]
    fn free_validates_pointer() {
        let set = set();
        let i32_t = set.builtin_type(BuiltinKind::I32);
        let mut heap = HeapMemory::new(0x8000_0000_0000_0000, 0xff00_0000_0000_0000);
        let span = SrcSpan::synthetic();

        let addr = heap.malloc(&set, i32_t, 4, span).unwrap();
        assert_eq!(
            heap.free(addr + 4, span),
            Err(MemoryError::FreeNotAllocationBase)
        );
        assert_eq!(heap.free(0x1234, span), Err(MemoryError::FreeNonHeap));
    }
}
