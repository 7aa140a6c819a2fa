//! Resolved statements.

use orec_session::SrcSpan;

use crate::body::{BodyId, VarId};
use crate::expr::Expr;
use crate::typespec::TypeSpec;

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub id: VarId,
    pub name: String,
    pub ty: TypeSpec,
    pub span: SrcSpan,
    pub init: Option<Expr>,
    /// The destructor to run when the variable goes out of scope.
    pub destructor: Option<BodyId>,
    /// Whether some path moves the variable out. If so, destruction is
    /// conditioned on a move-destruct indicator.
    pub may_be_moved: bool,
}

/// One arm of a `switch`; several case values may share a body.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub values: Vec<u64>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    VarDecl(VarDecl),
    While {
        span: SrcSpan,
        cond: Expr,
        body: Vec<Stmt>,
    },
    Switch {
        span: SrcSpan,
        value: Expr,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Stmt>>,
    },
    For {
        span: SrcSpan,
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Vec<Stmt>,
    },
    Return {
        span: SrcSpan,
        value: Option<Expr>,
    },
    Break(SrcSpan),
    Continue(SrcSpan),
    /// Runs the expression when the enclosing scope exits, through the same
    /// destruction stack as variable destructors.
    Defer {
        span: SrcSpan,
        expr: Expr,
    },
    NoOp,
}

impl Stmt {
    pub fn expr(expr: Expr) -> Stmt {
        Stmt::Expr(expr)
    }

    pub fn var_decl(id: VarId, name: &str, ty: TypeSpec, span: SrcSpan, init: Option<Expr>) -> Stmt {
        Stmt::VarDecl(VarDecl {
            id,
            name: name.to_string(),
            ty,
            span,
            init,
            destructor: None,
            may_be_moved: false,
        })
    }
}
