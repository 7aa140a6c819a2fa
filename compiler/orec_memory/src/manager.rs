//! The memory manager the executor drives.
//!
//! One instance exists per top-level evaluation: the global segment is a
//! shared, read-only view of what codegen serialized, while the stack, heap
//! and meta segments are private to the evaluation. Every abstract-memory
//! pointer primitive lives here: dereference validation, slice
//! construction, pointer arithmetic and comparison, lifetimes, `malloc` and
//! `free`.

use std::cmp::Ordering;

use orec_ir::function::AllocaDecl;
use orec_ir::ty::{TypeIdx, TypeSet};
use orec_session::SrcSpan;

use crate::error::MemoryError;
use crate::global::GlobalMemory;
use crate::heap::HeapMemory;
use crate::meta::MetaMemory;
use crate::object::{is_valid_access, is_valid_elem_range};
use crate::segments::{MemorySegment, Ptr, SegmentInfo};
use crate::stack::StackMemory;

/// The shape of a live object: either a typed object or a heap allocation
/// whose length was only known at `malloc` time.
#[derive(Debug, Clone, Copy)]
enum ObjectShape {
    Typed(TypeIdx),
    HeapArray { elem: TypeIdx, count: u64 },
}

#[derive(Debug, Clone, Copy)]
struct ObjectInfo {
    base: u64,
    size: u64,
    alive: bool,
    segment: MemorySegment,
    shape: ObjectShape,
}

pub struct MemoryManager<'a> {
    type_set: &'a TypeSet,
    segments: SegmentInfo,
    global: &'a GlobalMemory,
    pub stack: StackMemory,
    pub heap: HeapMemory,
    pub meta: MetaMemory,
}

impl<'a> MemoryManager<'a> {
    pub fn new(type_set: &'a TypeSet, global: &'a GlobalMemory) -> Self {
        let segments = SegmentInfo::for_target(type_set.target());
        MemoryManager {
            type_set,
            segments,
            global,
            stack: StackMemory::new(segments.stack_begin, segments.heap_begin),
            heap: HeapMemory::new(segments.heap_begin, segments.meta_begin),
            meta: MetaMemory::new(segments.meta_begin),
        }
    }

    pub fn type_set(&self) -> &TypeSet {
        self.type_set
    }

    pub fn global(&self) -> &GlobalMemory {
        self.global
    }

    ////////// frames and lifetimes //////////

    pub fn push_frame(&mut self, allocas: &[AllocaDecl]) -> Result<Vec<u64>, MemoryError> {
        self.stack.push_frame(self.type_set, allocas)
    }

    pub fn pop_frame(&mut self) {
        self.stack.pop_frame();
    }

    pub fn start_lifetime(&mut self, ptr: Ptr) -> Result<(), MemoryError> {
        self.stack.set_lifetime(ptr.addr(), true)
    }

    pub fn end_lifetime(&mut self, ptr: Ptr) -> Result<(), MemoryError> {
        self.stack.set_lifetime(ptr.addr(), false)
    }

    ////////// heap //////////

    pub fn malloc(
        &mut self,
        elem_ty: TypeIdx,
        count: u64,
        span: SrcSpan,
    ) -> Result<Ptr, MemoryError> {
        self.heap
            .malloc(self.type_set, elem_ty, count, span)
            .map(Ptr)
    }

    pub fn free(&mut self, ptr: Ptr, span: SrcSpan) -> Result<(), MemoryError> {
        if ptr.is_null() || self.segments.segment_of(ptr) != MemorySegment::Heap {
            return Err(MemoryError::FreeNonHeap);
        }
        self.heap.free(ptr.addr(), span)
    }

    ////////// object lookup //////////

    /// Decodes a meta pointer to its real address. Returns the address and
    /// whether the pointer was a one-past-the-end marker.
    fn normalize(&self, ptr: Ptr) -> Result<(u64, bool), MemoryError> {
        debug_assert!(!ptr.is_null());
        if self.segments.segment_of(ptr) == MemorySegment::Meta {
            let real = self.meta.real_address(ptr).ok_or(MemoryError::NoObject)?;
            Ok((real, true))
        } else {
            Ok((ptr.addr(), false))
        }
    }

    fn find_object(&self, addr: u64) -> Option<ObjectInfo> {
        match self.segments.segment_of(Ptr(addr)) {
            MemorySegment::Global => self.global.find(addr).map(|object| ObjectInfo {
                base: object.address,
                size: object.size(),
                alive: true,
                segment: MemorySegment::Global,
                shape: ObjectShape::Typed(object.ty),
            }),
            MemorySegment::Stack => self.stack.find(addr).map(|object| ObjectInfo {
                base: object.address,
                size: object.size(),
                alive: object.is_alive,
                segment: MemorySegment::Stack,
                shape: ObjectShape::Typed(object.ty),
            }),
            MemorySegment::Heap => self.heap.find(addr).map(|allocation| ObjectInfo {
                base: allocation.address,
                size: allocation.size(),
                alive: !allocation.is_freed,
                segment: MemorySegment::Heap,
                shape: ObjectShape::HeapArray {
                    elem: allocation.elem_ty,
                    count: allocation.count,
                },
            }),
            MemorySegment::Meta => None,
        }
    }

    /// The object a (possibly one-past-the-end) pointer belongs to.
    ///
    /// A raw address that no object contains may still be the serialized
    /// one-past-the-end of the object just below it (global objects keep a
    /// guard byte so this is unambiguous); such pointers come from
    /// constant data rather than from pointer arithmetic, which always
    /// yields meta markers.
    fn resolve_object(&self, addr: u64, one_past_end: bool) -> Result<ObjectInfo, MemoryError> {
        if !one_past_end {
            if let Some(info) = self.find_object(addr) {
                return Ok(info);
            }
        }
        let info = self
            .find_object(addr.wrapping_sub(1))
            .ok_or(MemoryError::NoObject)?;
        if info.base + info.size != addr {
            return Err(MemoryError::NoObject);
        }
        Ok(info)
    }

    fn shape_valid_access(&self, shape: ObjectShape, offset: u64, access: TypeIdx) -> bool {
        match shape {
            ObjectShape::Typed(ty) => is_valid_access(self.type_set, ty, offset, access),
            ObjectShape::HeapArray { elem, count } => {
                let stride = self.type_set.size_of(elem).bytes();
                if stride == 0 {
                    return false;
                }
                offset / stride < count
                    && is_valid_access(self.type_set, elem, offset % stride, access)
            }
        }
    }

    fn shape_valid_elem_range(
        &self,
        shape: ObjectShape,
        begin_offset: u64,
        end_offset: u64,
        elem: TypeIdx,
    ) -> bool {
        match shape {
            ObjectShape::Typed(ty) => {
                is_valid_elem_range(self.type_set, ty, begin_offset, end_offset, elem)
            }
            ObjectShape::HeapArray {
                elem: alloc_elem, ..
            } => {
                let stride = self.type_set.size_of(elem).bytes();
                if begin_offset == end_offset {
                    return true;
                }
                if stride == 0 || (end_offset - begin_offset) % stride != 0 {
                    return false;
                }
                // Byte offsets are in range already; only the element shape
                // needs to line up with the allocation's element type.
                begin_offset % stride == 0
                    && (elem == alloc_elem
                        || is_valid_access(self.type_set, alloc_elem, begin_offset % stride, elem))
            }
        }
    }

    ////////// dereference and data access //////////

    /// Validates that `ptr` can be read or written as one object of
    /// `access` type: live object, in-bounds and layout-compatible.
    pub fn check_dereference(&self, ptr: Ptr, access: TypeIdx) -> Result<(), MemoryError> {
        if ptr.is_null() {
            return Err(MemoryError::NullDereference);
        }
        let (addr, one_past_end) = self.normalize(ptr)?;
        if one_past_end {
            return Err(MemoryError::OnePastEndDereference);
        }
        let info = self.resolve_object(addr, false)?;
        if !info.alive {
            return Err(MemoryError::ObjectDead);
        }
        let offset = addr - info.base;
        let access_size = self.type_set.size_of(access).bytes();
        if offset + access_size > info.size {
            return Err(MemoryError::OutOfBounds);
        }
        if !self.shape_valid_access(info.shape, offset, access) {
            return Err(MemoryError::IncompatibleType);
        }
        Ok(())
    }

    /// Validates an in-place construction target: like a dereference check,
    /// except the target may currently be outside its lifetime.
    pub fn check_inplace_construct(&self, ptr: Ptr, object: TypeIdx) -> Result<(), MemoryError> {
        if ptr.is_null() {
            return Err(MemoryError::NullDereference);
        }
        let (addr, one_past_end) = self.normalize(ptr)?;
        if one_past_end {
            return Err(MemoryError::OnePastEndDereference);
        }
        let info = self.resolve_object(addr, false)?;
        let offset = addr - info.base;
        let object_size = self.type_set.size_of(object).bytes();
        if offset + object_size > info.size {
            return Err(MemoryError::OutOfBounds);
        }
        if !self.shape_valid_access(info.shape, offset, object) {
            return Err(MemoryError::IncompatibleType);
        }
        Ok(())
    }

    /// Checked, typed read access. The returned slice is exactly the size
    /// of the access type.
    pub fn get_memory(&self, ptr: Ptr, access: TypeIdx) -> Result<&[u8], MemoryError> {
        self.check_dereference(ptr, access)?;
        let size = self.type_set.size_of(access).bytes() as usize;
        let bytes = self.object_bytes(ptr.addr())?;
        Ok(&bytes[..size])
    }

    /// Checked, typed write access.
    pub fn get_memory_mut(&mut self, ptr: Ptr, access: TypeIdx) -> Result<&mut [u8], MemoryError> {
        self.check_dereference(ptr, access)?;
        let size = self.type_set.size_of(access).bytes() as usize;
        let bytes = self.object_bytes_mut(ptr.addr())?;
        Ok(&mut bytes[..size])
    }

    /// Raw range access for bulk operations: live object and in-bounds,
    /// without the subobject-type rule.
    pub fn get_memory_raw(&self, ptr: Ptr, size: u64) -> Result<&[u8], MemoryError> {
        self.check_range(ptr, size)?;
        let bytes = self.object_bytes(ptr.addr())?;
        Ok(&bytes[..size as usize])
    }

    pub fn get_memory_raw_mut(&mut self, ptr: Ptr, size: u64) -> Result<&mut [u8], MemoryError> {
        self.check_range(ptr, size)?;
        let bytes = self.object_bytes_mut(ptr.addr())?;
        Ok(&mut bytes[..size as usize])
    }

    fn check_range(&self, ptr: Ptr, size: u64) -> Result<(), MemoryError> {
        if ptr.is_null() {
            return Err(MemoryError::NullDereference);
        }
        let (addr, one_past_end) = self.normalize(ptr)?;
        if one_past_end {
            return if size == 0 {
                Ok(())
            } else {
                Err(MemoryError::OnePastEndDereference)
            };
        }
        let info = self.resolve_object(addr, false)?;
        if !info.alive {
            return Err(MemoryError::ObjectDead);
        }
        if addr - info.base + size > info.size {
            return Err(MemoryError::OutOfBounds);
        }
        Ok(())
    }

    /// The object's bytes from `addr` to its end.
    fn object_bytes(&self, addr: u64) -> Result<&[u8], MemoryError> {
        match self.segments.segment_of(Ptr(addr)) {
            MemorySegment::Global => {
                let object = self.global.find(addr).ok_or(MemoryError::NoObject)?;
                Ok(&object.data[(addr - object.address) as usize..])
            }
            MemorySegment::Stack => {
                let object = self.stack.find(addr).ok_or(MemoryError::NoObject)?;
                Ok(&object.data[(addr - object.address) as usize..])
            }
            MemorySegment::Heap => {
                let allocation = self.heap.find(addr).ok_or(MemoryError::NoObject)?;
                Ok(&allocation.data[(addr - allocation.address) as usize..])
            }
            MemorySegment::Meta => Err(MemoryError::OnePastEndDereference),
        }
    }

    fn object_bytes_mut(&mut self, addr: u64) -> Result<&mut [u8], MemoryError> {
        match self.segments.segment_of(Ptr(addr)) {
            MemorySegment::Global => Err(MemoryError::WriteToGlobal),
            MemorySegment::Stack => {
                let object = self.stack.find_mut(addr).ok_or(MemoryError::NoObject)?;
                let offset = (addr - object.address) as usize;
                Ok(&mut object.data[offset..])
            }
            MemorySegment::Heap => {
                let allocation = self.heap.find_mut(addr).ok_or(MemoryError::NoObject)?;
                let offset = (addr - allocation.address) as usize;
                Ok(&mut allocation.data[offset..])
            }
            MemorySegment::Meta => Err(MemoryError::OnePastEndDereference),
        }
    }

    ////////// bulk memory //////////

    pub fn memcpy(&mut self, dest: Ptr, src: Ptr, size: u64) -> Result<(), MemoryError> {
        if size == 0 {
            return Ok(());
        }
        let bytes = self.get_memory_raw(src, size)?.to_vec();
        self.get_memory_raw_mut(dest, size)?.copy_from_slice(&bytes);
        Ok(())
    }

    pub fn memset_zero(&mut self, dest: Ptr, size: u64) -> Result<(), MemoryError> {
        if size == 0 {
            return Ok(());
        }
        self.get_memory_raw_mut(dest, size)?.fill(0);
        Ok(())
    }

    ////////// slice and string construction //////////

    pub fn check_str_construction(&self, begin: Ptr, end: Ptr) -> Result<(), MemoryError> {
        let u8_ty = self.type_set.builtin_type(orec_ir::ty::BuiltinKind::I8);
        self.check_slice_construction(begin, end, u8_ty)
    }

    /// Validates that `begin..end` delimits a whole number of live `elem`
    /// objects inside one object. A null pair is the empty slice.
    pub fn check_slice_construction(
        &self,
        begin: Ptr,
        end: Ptr,
        elem: TypeIdx,
    ) -> Result<(), MemoryError> {
        match (begin.is_null(), end.is_null()) {
            (true, true) => return Ok(()),
            (true, false) | (false, true) => return Err(MemoryError::SliceUnrelatedPointers),
            (false, false) => {}
        }

        let (begin_addr, begin_past) = self.normalize(begin)?;
        let (end_addr, end_past) = self.normalize(end)?;
        let begin_info = self.resolve_object(begin_addr, begin_past)?;
        let end_info = self.resolve_object(end_addr, end_past)?;
        if begin_info.base != end_info.base {
            return Err(MemoryError::SliceUnrelatedPointers);
        }
        if !begin_info.alive {
            return Err(MemoryError::ObjectDead);
        }
        if end_addr < begin_addr {
            return Err(MemoryError::SliceReversed);
        }

        let stride = self.type_set.size_of(elem).bytes();
        if stride == 0 || (end_addr - begin_addr) % stride != 0 {
            return Err(MemoryError::SliceMisaligned);
        }
        let begin_offset = begin_addr - begin_info.base;
        let end_offset = end_addr - begin_info.base;
        if !self.shape_valid_elem_range(begin_info.shape, begin_offset, end_offset, elem) {
            return Err(MemoryError::SliceIncompatibleType);
        }
        Ok(())
    }

    ////////// pointer arithmetic and comparison //////////

    /// `ptr + offset_count * sizeof(elem)`, validated to stay inside (or
    /// one past) the underlying object. The result keeps the provenance of
    /// `ptr`; landing exactly on the end yields a meta marker.
    pub fn ptr_arithmetic(
        &mut self,
        ptr: Ptr,
        offset_count: i64,
        elem: TypeIdx,
    ) -> Result<Ptr, MemoryError> {
        if ptr.is_null() {
            return if offset_count == 0 {
                Ok(Ptr::NULL)
            } else {
                Err(MemoryError::PtrArithOnNull)
            };
        }

        let stride = self.type_set.size_of(elem).bytes();
        let (addr, one_past_end) = self.normalize(ptr)?;
        let info = self.resolve_object(addr, one_past_end)?;
        if !info.alive {
            return Err(MemoryError::ObjectDead);
        }

        let new_addr = addr as i128 + offset_count as i128 * stride as i128;
        let base = info.base as i128;
        let end = (info.base + info.size) as i128;
        if new_addr < base || new_addr > end {
            return Err(MemoryError::PtrArithOutOfBounds);
        }
        if new_addr == end && info.size != 0 {
            Ok(self.meta.make_one_past_end(new_addr as u64))
        } else {
            Ok(Ptr(new_addr as u64))
        }
    }

    /// Ordering comparison; both pointers must point into (or one past)
    /// the same object.
    pub fn compare_ptrs(&self, lhs: Ptr, rhs: Ptr) -> Result<Ordering, MemoryError> {
        match (lhs.is_null(), rhs.is_null()) {
            (true, true) => return Ok(Ordering::Equal),
            (true, false) | (false, true) => return Err(MemoryError::UnrelatedPointers),
            (false, false) => {}
        }
        let (lhs_addr, lhs_past) = self.normalize(lhs)?;
        let (rhs_addr, rhs_past) = self.normalize(rhs)?;
        let lhs_info = self.resolve_object(lhs_addr, lhs_past)?;
        let rhs_info = self.resolve_object(rhs_addr, rhs_past)?;
        if lhs_info.base != rhs_info.base {
            return Err(MemoryError::UnrelatedPointers);
        }
        Ok(lhs_addr.cmp(&rhs_addr))
    }

    /// `(lhs - rhs) / stride`; both pointers must share an object and the
    /// byte difference must be a whole number of elements.
    pub fn ptr_diff(&self, lhs: Ptr, rhs: Ptr, stride: u64) -> Result<i64, MemoryError> {
        if lhs.is_null() && rhs.is_null() {
            return Ok(0);
        }
        if lhs.is_null() || rhs.is_null() {
            return Err(MemoryError::UnrelatedPointerDiff);
        }
        let (lhs_addr, lhs_past) = self.normalize(lhs)?;
        let (rhs_addr, rhs_past) = self.normalize(rhs)?;
        let lhs_info = self.resolve_object(lhs_addr, lhs_past)?;
        let rhs_info = self.resolve_object(rhs_addr, rhs_past)?;
        if lhs_info.base != rhs_info.base {
            return Err(MemoryError::UnrelatedPointerDiff);
        }
        let diff = lhs_addr as i64 - rhs_addr as i64;
        let stride = stride.max(1) as i64;
        if diff % stride != 0 {
            return Err(MemoryError::MisalignedPointerDiff);
        }
        Ok(diff / stride)
    }

    /// The marker used when a computed address lands exactly one past an
    /// object's end.
    pub fn make_one_past_end(&mut self, real: u64) -> Ptr {
        self.meta.make_one_past_end(real)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orec_abi::target::TargetLayout;
    use orec_ir::ty::BuiltinKind;

    struct Fixture {
        type_set: TypeSet,
        global: GlobalMemory,
    }

    impl Fixture {
        fn new() -> Self {
            let type_set = TypeSet::new(TargetLayout::host_default());
            let segments = SegmentInfo::for_target(type_set.target());
            let global = GlobalMemory::new(segments.global_begin, segments.stack_begin);
            Fixture { type_set, global }
        }
    }

    #[test]
    fn stack_dereference_checks() {
        let fixture = Fixture::new();
        let i32_t = fixture.type_set.builtin_type(BuiltinKind::I32);
        let mut memory = MemoryManager::new(&fixture.type_set, &fixture.global);

        let addrs = memory
            .push_frame(&[AllocaDecl {
                ty: i32_t,
                has_lifetime: false,
            }])
            .unwrap();
        let ptr = Ptr(addrs[0]);

        memory.get_memory_mut(ptr, i32_t).unwrap()[..4].copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(memory.get_memory(ptr, i32_t).unwrap(), &[1, 2, 3, 4]);

        assert_eq!(
            memory.check_dereference(Ptr::NULL, i32_t),
            Err(MemoryError::NullDereference)
        );
        let i64_t = fixture.type_set.builtin_type(BuiltinKind::I64);
        assert_eq!(
            memory.check_dereference(ptr, i64_t),
            Err(MemoryError::OutOfBounds)
        );
    }

    #[test]
    fn lifetime_is_enforced() {
        let fixture = Fixture::new();
        let i32_t = fixture.type_set.builtin_type(BuiltinKind::I32);
        let mut memory = MemoryManager::new(&fixture.type_set, &fixture.global);

        let addrs = memory
            .push_frame(&[AllocaDecl {
                ty: i32_t,
                has_lifetime: true,
            }])
            .unwrap();
        let ptr = Ptr(addrs[0]);

        assert_eq!(
            memory.check_dereference(ptr, i32_t),
            Err(MemoryError::ObjectDead)
        );
        memory.start_lifetime(ptr).unwrap();
        assert!(memory.check_dereference(ptr, i32_t).is_ok());
        memory.end_lifetime(ptr).unwrap();
        assert_eq!(
            memory.check_dereference(ptr, i32_t),
            Err(MemoryError::ObjectDead)
        );
    }

    #[test]
    fn pointer_arithmetic_bounds() {
        let mut fixture = Fixture::new();
        let i32_t = fixture.type_set.builtin_type(BuiltinKind::I32);
        let arr_t = fixture.type_set.array_type(i32_t, 3);
        let mut memory = MemoryManager::new(&fixture.type_set, &fixture.global);

        let addrs = memory
            .push_frame(&[AllocaDecl {
                ty: arr_t,
                has_lifetime: false,
            }])
            .unwrap();
        let base = Ptr(addrs[0]);

        let second = memory.ptr_arithmetic(base, 1, i32_t).unwrap();
        assert_eq!(second.addr(), base.addr() + 4);

        // One past the end is representable but not dereferenceable.
        let end = memory.ptr_arithmetic(base, 3, i32_t).unwrap();
        assert_eq!(
            memory.check_dereference(end, i32_t),
            Err(MemoryError::OnePastEndDereference)
        );

        // Going past one-past-the-end is an error, as is walking backwards.
        assert_eq!(
            memory.ptr_arithmetic(base, 4, i32_t),
            Err(MemoryError::PtrArithOutOfBounds)
        );
        assert_eq!(
            memory.ptr_arithmetic(base, -1, i32_t),
            Err(MemoryError::PtrArithOutOfBounds)
        );

        // The marker can be walked back into the object.
        let last = memory.ptr_arithmetic(end, -1, i32_t).unwrap();
        assert_eq!(last.addr(), base.addr() + 8);
    }

    #[test]
    fn one_past_end_comparisons() {
        let mut fixture = Fixture::new();
        let i32_t = fixture.type_set.builtin_type(BuiltinKind::I32);
        let arr_t = fixture.type_set.array_type(i32_t, 3);
        let mut memory = MemoryManager::new(&fixture.type_set, &fixture.global);

        let addrs = memory
            .push_frame(&[AllocaDecl {
                ty: arr_t,
                has_lifetime: false,
            }])
            .unwrap();
        let base = Ptr(addrs[0]);

        let end_a = memory.ptr_arithmetic(base, 3, i32_t).unwrap();
        let second = memory.ptr_arithmetic(base, 1, i32_t).unwrap();
        let end_b = memory.ptr_arithmetic(second, 2, i32_t).unwrap();
        // Two independently computed end pointers are the same marker.
        assert_eq!(end_a, end_b);

        assert_eq!(memory.compare_ptrs(base, end_a), Ok(Ordering::Less));
        assert_eq!(memory.ptr_diff(end_a, base, 4), Ok(3));
    }

    #[test]
    fn slice_construction() {
        let mut fixture = Fixture::new();
        let i32_t = fixture.type_set.builtin_type(BuiltinKind::I32);
        let arr_t = fixture.type_set.array_type(i32_t, 4);
        let mut memory = MemoryManager::new(&fixture.type_set, &fixture.global);

        let addrs = memory
            .push_frame(&[
                AllocaDecl {
                    ty: arr_t,
                    has_lifetime: false,
                },
                AllocaDecl {
                    ty: arr_t,
                    has_lifetime: false,
                },
            ])
            .unwrap();
        let a = Ptr(addrs[0]);
        let b = Ptr(addrs[1]);

        let a_end = memory.ptr_arithmetic(a, 4, i32_t).unwrap();
        assert!(memory.check_slice_construction(a, a_end, i32_t).is_ok());
        assert!(memory
            .check_slice_construction(Ptr::NULL, Ptr::NULL, i32_t)
            .is_ok());
        assert_eq!(
            memory.check_slice_construction(a, b, i32_t),
            Err(MemoryError::SliceUnrelatedPointers)
        );
        assert_eq!(
            memory.check_slice_construction(a_end, a, i32_t),
            Err(MemoryError::SliceReversed)
        );
        assert_eq!(
            memory.check_slice_construction(Ptr(a.addr() + 2), Ptr(a.addr() + 6), i32_t),
            Err(MemoryError::SliceIncompatibleType)
        );
    }

    #[test]
    fn inplace_construct_ignores_lifetime() {
        let fixture = Fixture::new();
        let i32_t = fixture.type_set.builtin_type(BuiltinKind::I32);
        let mut memory = MemoryManager::new(&fixture.type_set, &fixture.global);

        let addrs = memory
            .push_frame(&[AllocaDecl {
                ty: i32_t,
                has_lifetime: true,
            }])
            .unwrap();
        let ptr = Ptr(addrs[0]);

        // Before its lifetime starts the slot cannot be read, but it is a
        // valid construction target.
        assert_eq!(
            memory.check_dereference(ptr, i32_t),
            Err(MemoryError::ObjectDead)
        );
        assert!(memory.check_inplace_construct(ptr, i32_t).is_ok());
        assert_eq!(
            memory.check_inplace_construct(Ptr(ptr.addr() + 1), i32_t),
            Err(MemoryError::OutOfBounds)
        );
    }

    #[test]
    fn use_after_free_is_detected() {
        let fixture = Fixture::new();
        let i32_t = fixture.type_set.builtin_type(BuiltinKind::I32);
        let mut memory = MemoryManager::new(&fixture.type_set, &fixture.global);
        let span = SrcSpan::synthetic();

        let ptr = memory.malloc(i32_t, 2, span).unwrap();
        memory.get_memory_mut(ptr, i32_t).unwrap()[0] = 7;
        memory.free(ptr, span).unwrap();
        assert_eq!(
            memory.check_dereference(ptr, i32_t),
            Err(MemoryError::ObjectDead)
        );
    }
}
