//! Structured failure reasons for memory operations.
//!
//! The executor turns these into diagnostics, attaching the span of the
//! faulting instruction; reasons that know about another relevant location
//! (an allocation or free site) carry it so it can become a note.

use orec_session::SrcSpan;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MemoryError {
    #[error("null pointer dereference")]
    NullDereference,

    #[error("dereferencing a one-past-the-end pointer")]
    OnePastEndDereference,

    #[error("memory access to an invalid address")]
    NoObject,

    #[error("memory access to an object outside its lifetime")]
    ObjectDead,

    #[error("memory access out of the bounds of the object")]
    OutOfBounds,

    #[error("memory access with a type incompatible with the object")]
    IncompatibleType,

    #[error("modifying a constant object is not allowed")]
    WriteToGlobal,

    #[error("pointer arithmetic out of bounds")]
    PtrArithOutOfBounds,

    #[error("pointer arithmetic on a null pointer")]
    PtrArithOnNull,

    #[error("comparing pointers into different objects")]
    UnrelatedPointers,

    #[error("subtracting pointers into different objects")]
    UnrelatedPointerDiff,

    #[error("pointer difference is not a multiple of the element size")]
    MisalignedPointerDiff,

    #[error("invalid slice construction: the pointers point into different objects")]
    SliceUnrelatedPointers,

    #[error("invalid slice construction: the end pointer precedes the begin pointer")]
    SliceReversed,

    #[error("invalid slice construction: the range is not a whole number of elements")]
    SliceMisaligned,

    #[error("invalid slice construction: the element type is incompatible with the object")]
    SliceIncompatibleType,

    #[error("`free` called on a non-heap pointer")]
    FreeNonHeap,

    #[error("`free` called on a pointer that is not an allocation base")]
    FreeNotAllocationBase,

    #[error("double free")]
    DoubleFree {
        /// Where the allocation was made and first freed.
        malloc_span: SrcSpan,
        free_span: SrcSpan,
    },

    #[error("allocation size overflows the heap segment")]
    HeapExhausted,

    #[error("stack segment exhausted")]
    StackExhausted,
}

impl MemoryError {
    /// Locations worth attaching to the diagnostic as notes, with a label.
    pub fn notes(&self) -> Vec<(SrcSpan, &'static str)> {
        match self {
            MemoryError::DoubleFree {
                malloc_span,
                free_span,
            } => vec![
                (*malloc_span, "allocated here"),
                (*free_span, "first freed here"),
            ],
            _ => Vec::new(),
        }
    }
}
