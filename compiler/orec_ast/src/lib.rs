//! The resolved AST consumed by the compile-time evaluation core.
//!
//! Tokenization, parsing and name resolution happen upstream; what arrives
//! here is an immutable tree of function bodies whose expressions carry
//! their final types and, where known, folded constant values. The core
//! never mutates these nodes.

pub mod body;
pub mod const_value;
pub mod expr;
pub mod stmt;
pub mod typespec;

pub use body::{Ast, BodyId, FunctionBody, Param, VarId};
pub use const_value::ConstValue;
pub use expr::{
    BinaryOp, BuiltinOp, Expr, ExprKind, MathBinaryOp, MathUnaryOp, ShortCircuitOp, UnaryOp,
};
pub use stmt::{Stmt, SwitchCase, VarDecl};
pub use typespec::{FloatKind, IntKind, TypeSpec};
