pub mod function;
pub mod inst;
pub mod printer;
pub mod ty;
pub mod value;

pub use function::{
    AccessCheckIdx, AccessCheckInfo, AllocaDecl, BasicBlockData, CallArgsIdx, ErrorIdx, ErrorInfo,
    FuncIdx, Function, GlobalIdx, InstIdx, PtrArithCheckIdx, PtrArithCheckInfo, SliceCheckIdx,
    SliceCheckInfo, SpanIdx, SwitchIdx, SwitchInfo, ValueIdx,
};
pub use inst::Instruction;
pub use ty::{BuiltinKind, TypeIdx, TypeKind, TypeSet};
pub use value::{InstrValue, ValueType};
