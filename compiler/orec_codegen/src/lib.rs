//! Lowering of the resolved AST into the typed, SSA-like IR.
//!
//! The [`context::CodegenCtx`] owns everything shared across a compilation
//! (the type set, global memory, the function arena); one
//! [`context::FunctionBuilder`] at a time accumulates basic blocks and side
//! tables for the function being generated, and finalization flattens them
//! into an executable [`orec_ir::Function`].

pub mod builders;
pub mod consts;
pub mod context;
pub mod expr;
pub mod stmt;

pub use context::{CodegenCtx, ExprValue, InstrRef};

use orec_ast::BodyId;
use orec_ir::function::FuncIdx;
use tracing::instrument;

/// Generates (or returns the already generated) IR function for a resolved
/// body. Bodies referenced by calls are generated recursively; recursive
/// and mutually recursive calls just reuse the callee's pre-assigned index.
#[instrument(level = "debug", skip(ctx), fields(body = %ctx.ast.body(body_id).name))]
pub fn generate_function(ctx: &mut CodegenCtx<'_>, body_id: BodyId) -> FuncIdx {
    if let Some(func_idx) = ctx.function_for(body_id) {
        return func_idx;
    }
    let func_idx = ctx.declare_function(body_id);
    let builder_state = ctx.begin_function(body_id, func_idx);

    stmt::generate_body(ctx, body_id);

    ctx.end_function(builder_state, func_idx);
    func_idx
}
