//! The stack segment: allocas, one frame per call.
//!
//! Frame layout is decided at frame entry from the function's alloca table;
//! objects with lifetime tracking start dead and are toggled by the
//! `start_lifetime`/`end_lifetime` instructions, objects without (move
//! indicators) live for the whole call.

use std::collections::BTreeMap;

use orec_ir::function::AllocaDecl;
use orec_ir::ty::{TypeIdx, TypeSet};
use tracing::trace;

use crate::error::MemoryError;

#[derive(Debug)]
pub struct StackObject {
    pub address: u64,
    pub ty: TypeIdx,
    pub is_alive: bool,
    pub data: Vec<u8>,
}

impl StackObject {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[derive(Debug, Default)]
struct StackFrame {
    objects: Vec<StackObject>,
}

#[derive(Debug)]
pub struct StackMemory {
    segment_end: u64,
    next_address: u64,
    frames: Vec<StackFrame>,
    /// Object base address -> (frame, object) for containing-object lookup.
    index: BTreeMap<u64, (usize, usize)>,
}

impl StackMemory {
    pub fn new(segment_begin: u64, segment_end: u64) -> Self {
        StackMemory {
            segment_end,
            next_address: segment_begin,
            frames: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// Allocates one frame holding all of the function's allocas, returning
    /// their addresses in declaration order.
    pub fn push_frame(
        &mut self,
        type_set: &TypeSet,
        allocas: &[AllocaDecl],
    ) -> Result<Vec<u64>, MemoryError> {
        let frame_index = self.frames.len();
        let mut frame = StackFrame::default();
        let mut addresses = Vec::with_capacity(allocas.len());
        let mut next = self.next_address;

        for decl in allocas {
            let size = type_set.size_of(decl.ty).bytes();
            let align = type_set.align_of(decl.ty);
            let address = align.align_up(next);
            let occupied = size.max(1);
            if address + occupied > self.segment_end {
                return Err(MemoryError::StackExhausted);
            }
            next = address + occupied;

            self.index.insert(address, (frame_index, frame.objects.len()));
            frame.objects.push(StackObject {
                address,
                ty: decl.ty,
                is_alive: !decl.has_lifetime,
                data: vec![0; size as usize],
            });
            addresses.push(address);
        }

        trace!(frame_index, allocas = allocas.len(), "stack frame pushed");
        self.next_address = next;
        self.frames.push(frame);
        Ok(addresses)
    }

    /// Drops the most recent frame and everything allocated in it.
    pub fn pop_frame(&mut self) {
        let frame = self.frames.pop().expect("pop_frame without a live frame");
        if let Some(first) = frame.objects.first() {
            self.next_address = first.address;
        }
        for object in &frame.objects {
            self.index.remove(&object.address);
        }
    }

    /// The live-or-dead object containing `addr`.
    pub fn find(&self, addr: u64) -> Option<&StackObject> {
        let (_, &(frame, object)) = self.index.range(..=addr).next_back()?;
        let object = &self.frames[frame].objects[object];
        (addr < object.address + object.size().max(1)).then_some(object)
    }

    pub fn find_mut(&mut self, addr: u64) -> Option<&mut StackObject> {
        let (_, &(frame, object)) = self.index.range(..=addr).next_back()?;
        let object = &mut self.frames[frame].objects[object];
        (addr < object.address + object.size().max(1)).then_some(object)
    }

    /// Toggles the lifetime of the object whose base is `addr`.
    pub fn set_lifetime(&mut self, addr: u64, alive: bool) -> Result<(), MemoryError> {
        let object = self.find_mut(addr).ok_or(MemoryError::NoObject)?;
        if object.address != addr {
            return Err(MemoryError::NoObject);
        }
        object.is_alive = alive;
        if !alive {
            // A later start_lifetime must not observe the previous contents.
            object.data.fill(0);
        }
        Ok(())
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
    fn frames_nest_and_unwind() {
        let set = set();
        let i64_t = set.builtin_type(BuiltinKind::I64);
        let mut stack = StackMemory::new(0x4000_0000, 0x8000_0000);

        let outer = stack
            .push_frame(
                &set,
                &[AllocaDecl {
                    ty: i64_t,
                    has_lifetime: false,
                }],
            )
            .unwrap();
        let inner = stack
            .push_frame(
                &set,
                &[AllocaDecl {
                    ty: i64_t,
                    has_lifetime: false,
                }],
            )
            .unwrap();
        assert!(inner[0] > outer[0]);
        assert!(stack.find(inner[0]).is_some());

        stack.pop_frame();
        assert!(stack.find(inner[0]).is_none());
        assert!(stack.find(outer[0] + 7).is_some());
    }

    #[test]
    fn lifetimes_toggle() {
        let set = set();
        let i32_t = set.builtin_type(BuiltinKind::I32);
        let mut stack = StackMemory::new(0x4000_0000, 0x8000_0000);
        let addrs = stack
            .push_frame(
                &set,
                &[AllocaDecl {
                    ty: i32_t,
                    has_lifetime: true,
                }],
            )
            .unwrap();

        assert!(!stack.find(addrs[0]).unwrap().is_alive);
        stack.set_lifetime(addrs[0], true).unwrap();
        assert!(stack.find(addrs[0]).unwrap().is_alive);
        stack.set_lifetime(addrs[0], false).unwrap();
        assert!(!stack.find(addrs[0]).unwrap().is_alive);

        // Lifetime ops address object bases only.
        assert!(stack.set_lifetime(addrs[0] + 1, true).is_err());
    }
}
