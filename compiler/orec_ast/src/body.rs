//! Function bodies and the per-compilation body arena.

use orec_session::SrcSpan;
use orec_utils::index_vec::IdxVec;
use orec_utils::newtype_index;

use crate::stmt::Stmt;
use crate::typespec::TypeSpec;

newtype_index!(
    /// A function body in the compilation's arena. Calls reference bodies
    /// by this index, which is how mutual recursion avoids cyclic borrows.
    pub struct BodyId
);

newtype_index!(
    /// A variable or parameter, unique within its body.
    pub struct VarId
);

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub id: VarId,
    pub name: String,
    pub ty: TypeSpec,
}

/// A fully resolved function body.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBody {
    pub name: String,
    pub span: SrcSpan,
    pub params: Vec<Param>,
    pub return_type: TypeSpec,
    pub stmts: Vec<Stmt>,
}

/// The bodies of one compilation.
#[derive(Debug, Default)]
pub struct Ast {
    pub bodies: IdxVec<BodyId, FunctionBody>,
}

impl Ast {
    pub fn new() -> Self {
        Ast::default()
    }

    pub fn add_body(&mut self, body: FunctionBody) -> BodyId {
        self.bodies.push(body)
    }

    pub fn body(&self, id: BodyId) -> &FunctionBody {
        &self.bodies[id]
    }
}
