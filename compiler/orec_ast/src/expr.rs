//! Resolved, typed expressions.

use orec_session::SrcSpan;

use crate::body::{BodyId, VarId};
use crate::const_value::ConstValue;
use crate::stmt::Stmt;
use crate::typespec::TypeSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Boolean not.
    Not,
    /// Bitwise complement.
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortCircuitOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathUnaryOp {
    Exp,
    Exp2,
    Expm1,
    Log,
    Log10,
    Log2,
    Log1p,
    Sqrt,
    Cbrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Erf,
    Erfc,
    Tgamma,
    Lgamma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathBinaryOp {
    Pow,
    Atan2,
    Hypot,
}

/// Compiler builtins with dedicated instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinOp {
    MathUnary(MathUnaryOp),
    MathBinary(MathBinaryOp),
    Abs,
    Min,
    Max,
    Bitreverse,
    Popcount,
    Byteswap,
    Clz,
    Ctz,
    Fshl,
    Fshr,
    /// `malloc(count)`; the element type is the expression's pointee type.
    Malloc,
    Free,
    /// Reports the `str` argument as an error diagnostic when reached.
    ComptimeError,
    /// Reports the `str` argument as a warning of the given family.
    ComptimeWarning(orec_session::WarningKind),
}

/// A resolved expression: its kind, its final type and its source range.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub span: SrcSpan,
    pub ty: TypeSpec,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: TypeSpec, span: SrcSpan) -> Self {
        Expr { span, ty, kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A literal or an already-folded constant.
    Const(ConstValue),
    /// A reference to a local variable or parameter; an lvalue.
    VarRef(VarId),
    /// Reads a variable while marking it moved-from, so its conditional
    /// destructor will not run.
    MoveVar(VarId),
    Tuple(Vec<Expr>),
    /// An array built from element expressions. When the element type has
    /// a destructor, resolution records it here so partially constructed
    /// arrays can be unwound.
    ArrayInit {
        elems: Vec<Expr>,
        elem_destructor: Option<BodyId>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// A binary operator resolved to builtin semantics; pointer arithmetic
    /// and pointer comparisons arrive here too, distinguished by the
    /// operand types.
    BinaryOp {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    ShortCircuit {
        op: ShortCircuitOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Ternaries and `if` expressions. With no else branch the type is
    /// `Unit`.
    Conditional {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Option<Box<Expr>>,
    },
    /// Array and slice subscripts; an lvalue.
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    AddressOf(Box<Expr>),
    /// Pointer dereference; an lvalue.
    Deref(Box<Expr>),
    Cast {
        expr: Box<Expr>,
        to: TypeSpec,
    },
    Call {
        callee: BodyId,
        args: Vec<Expr>,
    },
    Builtin {
        op: BuiltinOp,
        args: Vec<Expr>,
    },
    Assign {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Block {
        stmts: Vec<Stmt>,
        value: Option<Box<Expr>>,
    },
    /// Wraps a value into a non-empty optional.
    OptionalSome(Box<Expr>),
    /// Reads `optional.has_value`.
    OptionalHasValue(Box<Expr>),
    /// Reads the optional's payload; checked at run time.
    OptionalGetValue(Box<Expr>),
    /// Builds a slice from a begin/end pointer pair; checked at run time.
    MakeSlice {
        begin: Box<Expr>,
        end: Box<Expr>,
    },
    /// The inner expression materializes a temporary of a type with a
    /// destructor; resolution wraps such rvalues so the temporary is
    /// destroyed when its enclosing scope exits.
    WithDestructor {
        expr: Box<Expr>,
        destructor: BodyId,
    },
}
