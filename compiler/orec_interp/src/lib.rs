//! The compile-time executor: a synchronous interpreter over finalized IR.
//!
//! The dispatch loop walks a function's flat instruction array, reading
//! operands out of per-frame value slots and writing each instruction's
//! result back into its own slot. All memory traffic goes through the
//! segmented [`orec_memory::MemoryManager`], so every load, store, pointer
//! operation and lifetime event is validated.

pub mod eval;
pub mod exec;

pub use eval::{evaluate, EvalRequest};
pub use exec::{ExecLimits, ExecutorContext};
