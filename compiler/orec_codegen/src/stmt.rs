//! Statement lowering and function-body generation.

use orec_ast::{BodyId, Stmt, VarDecl};
use orec_session::SrcSpan;
use tracing::trace;

use crate::context::{CodegenCtx, DestructOp, ExprValue};
use crate::expr::generate_expr;

/// Lowers a whole resolved body into the current function builder: binds
/// parameters, generates the statements, and closes the fall-through path.
pub fn generate_body(ctx: &mut CodegenCtx<'_>, body_id: BodyId) {
    let ast = ctx.ast;
    let body = ast.body(body_id);

    let arg_offset = ctx.fb().needs_return_slot as u32;
    for (index, param) in body.params.iter().enumerate() {
        let ty = ctx.lower_type(&param.ty);
        let arg = ctx.create_get_function_arg(arg_offset + index as u32);
        if ctx.type_set.is_simple_value_type(ty) {
            // Scalar parameters get a slot so they are addressable and
            // assignable like any other variable.
            let slot = ctx.create_alloca_without_lifetime(ty);
            let value = ExprValue::new_value(arg, ty);
            ctx.create_store(value, slot);
            ctx.add_variable(param.id, slot);
        } else {
            // Aggregate parameters arrive as a pointer to a caller-owned
            // copy.
            ctx.add_variable(param.id, ExprValue::new_reference(arg, ty));
        }
    }

    let scope = ctx.push_expression_scope();
    for stmt in &body.stmts {
        generate_stmt(ctx, stmt);
    }
    ctx.pop_expression_scope(scope);

    if !ctx.has_terminator() {
        let return_type = ctx.fb().return_type;
        if return_type == ctx.type_set.null_type() {
            ctx.create_ret_void();
        } else {
            // Reaching here means a non-void function fell off its end;
            // resolution should reject this, so report and stop.
            ctx.create_error(
                body.span,
                "execution reached the end of a function with a return type",
            );
            ctx.create_unreachable();
        }
    }
}

pub fn generate_stmt(ctx: &mut CodegenCtx<'_>, stmt: &Stmt) {
    trace!(kind = ?std::mem::discriminant(stmt), "generate stmt");
    match stmt {
        Stmt::Expr(expr) => {
            let scope = ctx.push_expression_scope();
            generate_expr(ctx, expr, None);
            ctx.pop_expression_scope(scope);
        }
        Stmt::VarDecl(decl) => generate_var_decl(ctx, decl),
        Stmt::While { cond, body, .. } => {
            let cond_block = ctx.add_basic_block();
            let body_block = ctx.add_basic_block();
            let end_block = ctx.add_basic_block();
            ctx.create_jump(cond_block);

            ctx.set_current_block(cond_block);
            let cond_scope = ctx.push_expression_scope();
            let cond_value = generate_expr(ctx, cond, None);
            let cond_value = ctx.value_of(cond_value);
            ctx.pop_expression_scope(cond_scope);
            ctx.create_conditional_jump(cond_value, body_block, end_block);

            ctx.set_current_block(body_block);
            let previous_loop = ctx.push_loop(end_block, cond_block);
            let body_scope = ctx.push_expression_scope();
            for stmt in body {
                generate_stmt(ctx, stmt);
            }
            ctx.pop_expression_scope(body_scope);
            if !ctx.has_terminator() {
                ctx.create_jump(cond_block);
            }
            ctx.pop_loop(previous_loop);

            ctx.set_current_block(end_block);
        }
        Stmt::For {
            init,
            cond,
            step,
            body,
            ..
        } => {
            let outer_scope = ctx.push_expression_scope();
            if let Some(init) = init {
                generate_stmt(ctx, init);
            }

            let cond_block = ctx.add_basic_block();
            let body_block = ctx.add_basic_block();
            let step_block = ctx.add_basic_block();
            let end_block = ctx.add_basic_block();
            ctx.create_jump(cond_block);

            ctx.set_current_block(cond_block);
            match cond {
                Some(cond) => {
                    let cond_scope = ctx.push_expression_scope();
                    let cond_value = generate_expr(ctx, cond, None);
                    let cond_value = ctx.value_of(cond_value);
                    ctx.pop_expression_scope(cond_scope);
                    ctx.create_conditional_jump(cond_value, body_block, end_block);
                }
                None => {
                    ctx.create_jump(body_block);
                }
            }

            ctx.set_current_block(body_block);
            let previous_loop = ctx.push_loop(end_block, step_block);
            let body_scope = ctx.push_expression_scope();
            for stmt in body {
                generate_stmt(ctx, stmt);
            }
            ctx.pop_expression_scope(body_scope);
            if !ctx.has_terminator() {
                ctx.create_jump(step_block);
            }
            ctx.pop_loop(previous_loop);

            ctx.set_current_block(step_block);
            if let Some(step) = step {
                let step_scope = ctx.push_expression_scope();
                generate_expr(ctx, step, None);
                ctx.pop_expression_scope(step_scope);
            }
            ctx.create_jump(cond_block);

            ctx.set_current_block(end_block);
            ctx.pop_expression_scope(outer_scope);
        }
        Stmt::Switch {
            value,
            cases,
            default,
            ..
        } => {
            let value_scope = ctx.push_expression_scope();
            let switch_value = generate_expr(ctx, value, None);
            let switch_value = ctx.value_of(switch_value);
            ctx.pop_expression_scope(value_scope);

            let end_block = ctx.add_basic_block();
            let default_block = match default {
                Some(_) => ctx.add_basic_block(),
                None => end_block,
            };

            let mut pairs = Vec::new();
            let mut case_blocks = Vec::with_capacity(cases.len());
            for case in cases {
                let block = ctx.add_basic_block();
                case_blocks.push(block);
                for &case_value in &case.values {
                    pairs.push((case_value, block));
                }
            }
            ctx.create_switch(switch_value, pairs, default_block);

            for (case, block) in cases.iter().zip(case_blocks) {
                ctx.set_current_block(block);
                let case_scope = ctx.push_expression_scope();
                for stmt in &case.body {
                    generate_stmt(ctx, stmt);
                }
                ctx.pop_expression_scope(case_scope);
                if !ctx.has_terminator() {
                    ctx.create_jump(end_block);
                }
            }

            if let Some(default_body) = default {
                ctx.set_current_block(default_block);
                let default_scope = ctx.push_expression_scope();
                for stmt in default_body {
                    generate_stmt(ctx, stmt);
                }
                ctx.pop_expression_scope(default_scope);
                if !ctx.has_terminator() {
                    ctx.create_jump(end_block);
                }
            }

            ctx.set_current_block(end_block);
        }
        Stmt::Return { span, value } => generate_return(ctx, *span, value.as_ref()),
        Stmt::Break(_) => {
            if ctx.has_terminator() {
                return;
            }
            let break_block = ctx.fb().loop_info.break_block;
            debug_assert!(ctx.fb().loop_info.in_loop, "break outside of a loop");
            ctx.emit_loop_destruct_operations();
            ctx.create_jump(break_block);
        }
        Stmt::Continue(_) => {
            if ctx.has_terminator() {
                return;
            }
            let continue_block = ctx.fb().loop_info.continue_block;
            debug_assert!(ctx.fb().loop_info.in_loop, "continue outside of a loop");
            ctx.emit_loop_destruct_operations();
            ctx.create_jump(continue_block);
        }
        Stmt::Defer { expr, .. } => {
            ctx.push_destruct_operation(DestructOp::DeferExpr { expr: expr.clone() });
        }
        Stmt::NoOp => {}
    }
}

fn generate_var_decl(ctx: &mut CodegenCtx<'_>, decl: &VarDecl) {
    let ty = ctx.lower_type(&decl.ty);
    let slot = ctx.create_alloca(ty);

    match &decl.init {
        Some(init) => {
            generate_expr(ctx, init, Some(slot));
        }
        None => {
            // Uninitialized variables read as zeroed storage.
            if ctx.type_set.size_of(ty).bytes() != 0 {
                ctx.create_const_memset_zero(slot);
            }
        }
    }

    let indicator = if decl.may_be_moved && decl.destructor.is_some() {
        Some(ctx.add_move_destruct_indicator(decl.id))
    } else {
        None
    };
    ctx.register_variable_destruct(decl.destructor, slot, indicator);
    ctx.add_variable(decl.id, slot);
}

fn generate_return(ctx: &mut CodegenCtx<'_>, _span: SrcSpan, value: Option<&orec_ast::Expr>) {
    if ctx.has_terminator() {
        return;
    }
    match value {
        Some(value) => {
            if ctx.fb().needs_return_slot {
                let slot = ctx
                    .fb()
                    .return_address
                    .expect("missing return slot in a function that needs one");
                generate_expr(ctx, value, Some(slot));
                ctx.emit_all_destruct_operations();
                ctx.create_ret_void();
            } else {
                let return_type = ctx.fb().return_type;
                if ctx.type_set.is_simple_value_type(return_type) {
                    let result = generate_expr(ctx, value, None);
                    let result = ctx.value_instr_of(result);
                    ctx.emit_all_destruct_operations();
                    ctx.create_ret(result);
                } else {
                    // Unit-valued return expression: evaluate for effects.
                    generate_expr(ctx, value, None);
                    ctx.emit_all_destruct_operations();
                    ctx.create_ret_void();
                }
            }
        }
        None => {
            ctx.emit_all_destruct_operations();
            ctx.create_ret_void();
        }
    }
}
