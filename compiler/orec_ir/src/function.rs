//! IR containers: basic blocks during construction, flat functions after
//! finalization, and the dense index types tying them together.

use orec_session::SrcSpan;
use orec_utils::index_vec::IdxVec;
use orec_utils::newtype_index;

use crate::inst::Instruction;
use crate::ty::TypeIdx;

newtype_index!(
    /// A function in the compilation's function arena.
    pub struct FuncIdx
);

newtype_index!(
    /// A flat index into a finalized function's `instructions`. Jump and
    /// switch destinations always point at the first instruction of a block.
    pub struct InstIdx
);

newtype_index!(
    /// A flat index into a frame's value slots. Allocas occupy the first
    /// `allocas.len()` slots, instruction results follow in block order.
    /// Produced only by finalization.
    pub struct ValueIdx
);

impl ValueIdx {
    /// Placeholder operand during construction; every occurrence is
    /// rewritten by finalization.
    pub const UNRESOLVED: ValueIdx = ValueIdx::from_u32(u32::MAX);
}

newtype_index!(
    /// A global memory object.
    pub struct GlobalIdx
);

newtype_index!(
    /// An entry in a function's source-span table.
    pub struct SpanIdx
);

newtype_index!(
    /// An entry in a function's error table.
    pub struct ErrorIdx
);

newtype_index!(
    /// An entry in a function's call-argument table.
    pub struct CallArgsIdx
);

newtype_index!(
    /// An entry in a function's switch table.
    pub struct SwitchIdx
);

newtype_index!(
    /// An entry in a function's slice-construction check table.
    pub struct SliceCheckIdx
);

newtype_index!(
    /// An entry in a function's pointer-arithmetic check table.
    pub struct PtrArithCheckIdx
);

newtype_index!(
    /// An entry in a function's memory-access check table.
    pub struct AccessCheckIdx
);

/// A stack slot, allocated at function entry. Referenced during
/// construction by an `InstrRef` with the sentinel block index, and after
/// finalization by one of the leading value slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocaDecl {
    pub ty: TypeIdx,
    /// Move-destruct indicators live outside the lifetime discipline; their
    /// slot is valid for the whole call.
    pub has_lifetime: bool,
}

/// A basic block during construction: a maximal straight-line instruction
/// sequence ending in a terminator. `value_offset` is assigned by
/// finalization when blocks are linearized.
#[derive(Debug, Default)]
pub struct BasicBlockData {
    pub instructions: Vec<Instruction>,
    pub value_offset: u32,
}

impl BasicBlockData {
    pub fn has_terminator(&self) -> bool {
        self.instructions
            .last()
            .is_some_and(Instruction::is_terminator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub span: SrcSpan,
    pub message: String,
}

/// Sorted dispatch table of a `switch_*` instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchInfo {
    /// `(case value, destination)` pairs, sorted by value.
    pub values: Vec<(u64, InstIdx)>,
    pub default_dest: InstIdx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceCheckInfo {
    pub elem_type: TypeIdx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtrArithCheckInfo {
    /// The object type the pointer arithmetic steps over.
    pub object_type: TypeIdx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessCheckInfo {
    /// The object type the checked access reads or writes.
    pub object_type: TypeIdx,
}

/// A finalized function: immutable, flat, ready to execute.
///
/// All intra-function references are dense indices: operands are
/// [`ValueIdx`], jump targets are [`InstIdx`], and every side table is keyed
/// by its own index type carried in instruction payloads.
#[derive(Debug)]
pub struct Function {
    /// Symbol name, for tracing and diagnostics only.
    pub name: String,

    pub arg_types: Vec<TypeIdx>,
    /// The builtin `void` type for functions with no return value.
    pub return_type: TypeIdx,

    pub instructions: Vec<Instruction>,
    pub allocas: Vec<AllocaDecl>,

    pub spans: IdxVec<SpanIdx, SrcSpan>,
    pub errors: IdxVec<ErrorIdx, ErrorInfo>,
    pub call_args: IdxVec<CallArgsIdx, Vec<ValueIdx>>,
    pub switch_infos: IdxVec<SwitchIdx, SwitchInfo>,
    pub slice_check_infos: IdxVec<SliceCheckIdx, SliceCheckInfo>,
    pub ptr_arith_check_infos: IdxVec<PtrArithCheckIdx, PtrArithCheckInfo>,
    pub access_check_infos: IdxVec<AccessCheckIdx, AccessCheckInfo>,
}

impl Function {
    pub fn new(name: String, arg_types: Vec<TypeIdx>, return_type: TypeIdx) -> Self {
        Function {
            name,
            arg_types,
            return_type,
            instructions: Vec::new(),
            allocas: Vec::new(),
            spans: IdxVec::new(),
            errors: IdxVec::new(),
            call_args: IdxVec::new(),
            switch_infos: IdxVec::new(),
            slice_check_infos: IdxVec::new(),
            ptr_arith_check_infos: IdxVec::new(),
            access_check_infos: IdxVec::new(),
        }
    }

    /// The number of value slots a frame for this function needs.
    pub fn value_slot_count(&self) -> usize {
        self.allocas.len() + self.instructions.len()
    }
}
