//! Expression lowering.
//!
//! `generate_expr(expr, result_slot)` lowers one resolved expression. When
//! `result_slot` is a reference, value-producing expressions store into it
//! and return the slot; lvalue-producing expressions (variables, indexing,
//! dereferences) return a reference into existing memory, copying into the
//! slot only when one was requested.

use orec_ast::{
    BinaryOp, BuiltinOp, ConstValue, Expr, ExprKind, ShortCircuitOp, TypeSpec, UnaryOp,
};
use orec_ir::ty::{BuiltinKind, TypeIdx};
use orec_session::SrcSpan;
use smallvec::SmallVec;
use tracing::trace;

use crate::context::{CodegenCtx, DestructOp, ExprValue, InstrRef};

/// Lowers `expr`, optionally into `result_slot`.
pub fn generate_expr(ctx: &mut CodegenCtx<'_>, expr: &Expr, result_slot: Option<ExprValue>) -> ExprValue {
    trace!(kind = ?std::mem::discriminant(&expr.kind), "generate expr");
    match &expr.kind {
        ExprKind::Const(value) => generate_const(ctx, expr, value, result_slot),
        ExprKind::VarRef(id) => {
            let var = ctx.get_variable(*id);
            copy_or_forward(ctx, var, result_slot)
        }
        ExprKind::MoveVar(id) => {
            if let Some(indicator) = ctx.get_move_destruct_indicator(*id) {
                let i1 = ctx.type_set.builtin_type(BuiltinKind::I1);
                let false_value = ctx.create_const_i1(false);
                let slot = ExprValue::new_reference(indicator, i1);
                ctx.create_store(false_value, slot);
            }
            let var = ctx.get_variable(*id);
            copy_or_forward(ctx, var, result_slot)
        }
        ExprKind::Tuple(elems) => {
            let ty = ctx.lower_type(&expr.ty);
            let slot = slot_or_temp(ctx, ty, result_slot);
            for (index, elem) in elems.iter().enumerate() {
                let member_slot = ctx.create_struct_gep(slot, index as u64);
                generate_expr(ctx, elem, Some(member_slot));
            }
            slot
        }
        ExprKind::ArrayInit {
            elems,
            elem_destructor,
        } => generate_array_init(ctx, expr, elems, *elem_destructor, result_slot),
        ExprKind::UnaryOp { op, operand } => {
            let result = generate_unary_op(ctx, expr.span, *op, operand);
            store_or_forward(ctx, result, result_slot)
        }
        ExprKind::BinaryOp { op, lhs, rhs } => {
            let result = generate_binary_op(ctx, expr.span, *op, lhs, rhs);
            store_or_forward(ctx, result, result_slot)
        }
        ExprKind::ShortCircuit { op, lhs, rhs } => {
            let result = generate_short_circuit(ctx, *op, lhs, rhs);
            store_or_forward(ctx, result, result_slot)
        }
        ExprKind::Conditional {
            cond,
            then_expr,
            else_expr,
        } => generate_conditional(ctx, expr, cond, then_expr, else_expr.as_deref(), result_slot),
        ExprKind::Index { base, index } => {
            let elem_ref = generate_index(ctx, expr, base, index);
            copy_or_forward(ctx, elem_ref, result_slot)
        }
        ExprKind::AddressOf(inner) => {
            let inner_value = generate_expr(ctx, inner, None);
            debug_assert!(inner_value.is_reference(), "address of a non-lvalue");
            let pointer = ctx.type_set.pointer_type();
            let result = ExprValue::new_value(inner_value.get_reference(), pointer);
            store_or_forward(ctx, result, result_slot)
        }
        ExprKind::Deref(inner) => {
            let pointee = match &inner.ty {
                TypeSpec::Pointer(pointee) => pointee.as_ref().clone(),
                other => unreachable!("dereference of non-pointer type {:?}", other),
            };
            let pointee_ty = ctx.lower_type(&pointee);
            let ptr = generate_expr(ctx, inner, None);
            let ptr = ctx.value_of(ptr);
            ctx.create_memory_access_check(expr.span, ptr, pointee_ty);
            let result = ExprValue::new_reference(ptr.instr(), pointee_ty);
            copy_or_forward(ctx, result, result_slot)
        }
        ExprKind::Cast { expr: inner, to } => {
            let result = generate_cast(ctx, inner, to);
            store_or_forward(ctx, result, result_slot)
        }
        ExprKind::Call { callee, args } => generate_call(ctx, expr.span, *callee, args, result_slot),
        ExprKind::Builtin { op, args } => {
            generate_builtin(ctx, expr, *op, args, result_slot)
        }
        ExprKind::Assign { lhs, rhs } => {
            let lhs_ref = generate_expr(ctx, lhs, None);
            debug_assert!(lhs_ref.is_reference(), "assignment to a non-lvalue");
            generate_expr(ctx, rhs, Some(lhs_ref));
            ExprValue::none()
        }
        ExprKind::Block { stmts, value } => {
            let scope = ctx.push_expression_scope();
            for stmt in stmts {
                crate::stmt::generate_stmt(ctx, stmt);
            }
            let result = match value {
                Some(value) => generate_expr(ctx, value, result_slot),
                None => result_slot.unwrap_or_else(ExprValue::none),
            };
            ctx.pop_expression_scope(scope);
            result
        }
        ExprKind::OptionalSome(inner) => generate_optional_some(ctx, expr, inner, result_slot),
        ExprKind::OptionalHasValue(inner) => {
            let result = generate_optional_has_value(ctx, inner);
            store_or_forward(ctx, result, result_slot)
        }
        ExprKind::OptionalGetValue(inner) => {
            let result = generate_optional_get_value(ctx, expr.span, inner);
            copy_or_forward(ctx, result, result_slot)
        }
        ExprKind::MakeSlice { begin, end } => generate_make_slice(ctx, expr, begin, end, result_slot),
        ExprKind::WithDestructor {
            expr: inner,
            destructor,
        } => {
            let ty = ctx.lower_type(&expr.ty);
            let slot = slot_or_temp(ctx, ty, result_slot);
            generate_expr(ctx, inner, Some(slot));
            ctx.push_destruct_operation(DestructOp::SelfDestruct {
                destructor: *destructor,
                value: slot,
            });
            slot
        }
    }
}

/// A destination slot: the caller's, or a fresh temporary.
fn slot_or_temp(ctx: &mut CodegenCtx<'_>, ty: TypeIdx, result_slot: Option<ExprValue>) -> ExprValue {
    match result_slot {
        Some(slot) => {
            debug_assert!(slot.is_reference());
            slot
        }
        None => ctx.create_alloca(ty),
    }
}

/// Stores a computed value into the slot when one was requested.
fn store_or_forward(
    ctx: &mut CodegenCtx<'_>,
    value: ExprValue,
    result_slot: Option<ExprValue>,
) -> ExprValue {
    match result_slot {
        Some(slot) => {
            ctx.create_store(value, slot);
            slot
        }
        None => value,
    }
}

/// Copies an lvalue into the slot when one was requested; otherwise the
/// reference itself is the result.
fn copy_or_forward(
    ctx: &mut CodegenCtx<'_>,
    value: ExprValue,
    result_slot: Option<ExprValue>,
) -> ExprValue {
    match result_slot {
        Some(slot) => {
            ctx.copy_into(value, slot);
            slot
        }
        None => value,
    }
}

////////// constants //////////

fn generate_const(
    ctx: &mut CodegenCtx<'_>,
    expr: &Expr,
    value: &ConstValue,
    result_slot: Option<ExprValue>,
) -> ExprValue {
    let ty = ctx.lower_type(&expr.ty);

    if ctx.type_set.is_simple_value_type(ty) {
        let result = generate_scalar_const(ctx, value, &expr.ty, ty);
        return store_or_forward(ctx, result, result_slot);
    }

    // Unit-like constants occupy no storage.
    if ctx.type_set.size_of(ty).bytes() == 0 {
        return result_slot.unwrap_or_else(ExprValue::none);
    }

    // String literals build their backing array object and then the pair;
    // without a destination they become a read-only global pair object.
    if let ConstValue::String(text) = value {
        return match result_slot {
            Some(slot) => ctx.create_string(text, slot),
            None => ctx.create_string_global(text),
        };
    }

    // Everything else is serialized once into the global segment.
    let data = crate::consts::object_from_const_value(ctx, value, &expr.ty, ty);
    let (global, _) = ctx.create_global_object(ty, data);
    copy_or_forward(ctx, global, result_slot)
}

fn generate_scalar_const(
    ctx: &mut CodegenCtx<'_>,
    value: &ConstValue,
    spec: &TypeSpec,
    ty: TypeIdx,
) -> ExprValue {
    match value {
        ConstValue::Bool(value) => ctx.create_const_i1(*value),
        ConstValue::Sint(value) => ctx.create_const_int(ty, *value),
        ConstValue::Uint(value) => ctx.create_const_uint(ty, *value),
        ConstValue::Char(value) => ctx.create_const_u32(*value),
        ConstValue::Float32(value) => ctx.create_const_f32(*value),
        ConstValue::Float64(value) => ctx.create_const_f64(*value),
        ConstValue::Null => ctx.create_const_ptr_null(),
        ConstValue::Enum { value, .. } => ctx.create_const_uint(ty, *value),
        ConstValue::Optional(inner) if spec_is_pointer_like_optional(spec) => {
            generate_scalar_const(ctx, inner, spec, ty)
        }
        other => unreachable!("scalar constant {:?} of type {:?}", other, spec),
    }
}

fn spec_is_pointer_like_optional(spec: &TypeSpec) -> bool {
    matches!(spec, TypeSpec::Optional(payload) if payload.is_pointer())
}

////////// arrays //////////

fn generate_array_init(
    ctx: &mut CodegenCtx<'_>,
    expr: &Expr,
    elems: &[Expr],
    elem_destructor: Option<orec_ast::BodyId>,
    result_slot: Option<ExprValue>,
) -> ExprValue {
    let ty = ctx.lower_type(&expr.ty);
    let slot = slot_or_temp(ctx, ty, result_slot);
    let (elem_ty, _) = ctx.type_set.array_parts(ty);

    // Partial-construction cleanup: a next-to-destroy pointer tracks how
    // far construction got, and the registered destruct operation unwinds
    // exactly that many elements.
    let elem_ptr = elem_destructor.map(|destructor| {
        let pointer = ctx.type_set.pointer_type();
        let tracker = ctx.create_alloca_without_lifetime(pointer);
        let begin = ExprValue::new_value(slot.get_reference(), pointer);
        ctx.create_store(begin, tracker);
        let tracker_ref = tracker.get_reference();
        ctx.push_destruct_operation(DestructOp::RvalueArray {
            destructor,
            value: slot,
            elem_ptr: tracker_ref,
        });
        (tracker, destructor)
    });

    for (index, elem) in elems.iter().enumerate() {
        let elem_slot = ctx.create_struct_gep(slot, index as u64);
        generate_expr(ctx, elem, Some(elem_slot));
        if let Some((tracker, _)) = elem_ptr {
            let pointer = ctx.type_set.pointer_type();
            let begin = ExprValue::new_value(slot.get_reference(), pointer);
            let next = ctx.create_ptr_add_const_unchecked(begin, index as i64 + 1, elem_ty);
            ctx.create_store(next, tracker);
        }
    }
    slot
}

////////// operators //////////

fn generate_unary_op(
    ctx: &mut CodegenCtx<'_>,
    span: SrcSpan,
    op: UnaryOp,
    operand: &Expr,
) -> ExprValue {
    let is_signed = operand.ty.is_signed_int();
    let value = generate_expr(ctx, operand, None);
    let value = ctx.value_of(value);
    match op {
        UnaryOp::Neg => {
            if is_signed {
                ctx.create_neg_check(span, value);
            }
            ctx.create_neg(value)
        }
        UnaryOp::Not | UnaryOp::BitNot => ctx.create_not(value),
    }
}

fn generate_binary_op(
    ctx: &mut CodegenCtx<'_>,
    span: SrcSpan,
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
) -> ExprValue {
    // Pointer arithmetic and pointer comparisons are distinguished by the
    // operand types, not by the operator.
    let lhs_is_ptr = lhs.ty.is_pointer();
    let rhs_is_ptr = rhs.ty.is_pointer();

    if lhs_is_ptr && !rhs_is_ptr {
        let elem = pointee_of(&lhs.ty);
        let elem_ty = ctx.lower_type(&elem);
        let address = generate_expr(ctx, lhs, None);
        let address = ctx.value_of(address);
        let offset_signed = rhs.ty.is_signed_int();
        let offset = generate_ptr_offset(ctx, rhs);
        return match op {
            BinaryOp::Add => ctx.create_ptr_add(span, address, offset, offset_signed, elem_ty),
            BinaryOp::Sub => ctx.create_ptr_sub(span, address, offset, offset_signed, elem_ty),
            other => unreachable!("pointer-integer operator {:?}", other),
        };
    }

    if lhs_is_ptr && rhs_is_ptr {
        let lhs_value = generate_expr(ctx, lhs, None);
        let lhs_value = ctx.value_of(lhs_value);
        let rhs_value = generate_expr(ctx, rhs, None);
        let rhs_value = ctx.value_of(rhs_value);
        return match op {
            BinaryOp::Sub => {
                let elem = pointee_of(&lhs.ty);
                let elem_ty = ctx.lower_type(&elem);
                ctx.create_ptrdiff(span, lhs_value, rhs_value, elem_ty)
            }
            BinaryOp::Eq => ctx.create_pointer_cmp_eq(lhs_value, rhs_value),
            BinaryOp::Neq => ctx.create_pointer_cmp_neq(lhs_value, rhs_value),
            BinaryOp::Lt => ctx.create_pointer_cmp_lt(span, lhs_value, rhs_value),
            BinaryOp::Gt => ctx.create_pointer_cmp_gt(span, lhs_value, rhs_value),
            BinaryOp::Lte => ctx.create_pointer_cmp_lte(span, lhs_value, rhs_value),
            BinaryOp::Gte => ctx.create_pointer_cmp_gte(span, lhs_value, rhs_value),
            other => unreachable!("pointer-pointer operator {:?}", other),
        };
    }

    let is_float = lhs.ty.is_float();
    let is_signed = lhs.ty.int_kind().is_some_and(|kind| kind.is_signed());
    let lhs_value = generate_expr(ctx, lhs, None);
    let lhs_value = ctx.value_of(lhs_value);
    let rhs_value = generate_expr(ctx, rhs, None);
    let rhs_value = ctx.value_of(rhs_value);

    match op {
        BinaryOp::Add => {
            ctx.create_add_check(span, lhs_value, rhs_value, is_signed);
            ctx.create_add(lhs_value, rhs_value)
        }
        BinaryOp::Sub => {
            ctx.create_sub_check(span, lhs_value, rhs_value, is_signed);
            ctx.create_sub(lhs_value, rhs_value)
        }
        BinaryOp::Mul => {
            ctx.create_mul_check(span, lhs_value, rhs_value, is_signed);
            ctx.create_mul(lhs_value, rhs_value)
        }
        BinaryOp::Div => ctx.create_div(span, lhs_value, rhs_value, is_signed),
        BinaryOp::Rem => ctx.create_rem(span, lhs_value, rhs_value, is_signed),
        BinaryOp::BitAnd => ctx.create_and(lhs_value, rhs_value),
        BinaryOp::BitOr => ctx.create_or(lhs_value, rhs_value),
        BinaryOp::BitXor => ctx.create_xor(lhs_value, rhs_value),
        BinaryOp::Shl => {
            let rhs_signed = rhs.ty.is_signed_int();
            ctx.create_shl(span, lhs_value, rhs_value, rhs_signed)
        }
        BinaryOp::Shr => {
            let rhs_signed = rhs.ty.is_signed_int();
            ctx.create_shr(span, lhs_value, rhs_value, rhs_signed)
        }
        BinaryOp::Eq if is_float => {
            ctx.create_float_cmp_check(span, op, lhs_value, rhs_value);
            ctx.create_float_cmp_eq(lhs_value, rhs_value)
        }
        BinaryOp::Neq if is_float => {
            ctx.create_float_cmp_check(span, op, lhs_value, rhs_value);
            ctx.create_float_cmp_neq(lhs_value, rhs_value)
        }
        BinaryOp::Lt if is_float => {
            ctx.create_float_cmp_check(span, op, lhs_value, rhs_value);
            ctx.create_float_cmp_lt(lhs_value, rhs_value)
        }
        BinaryOp::Gt if is_float => {
            ctx.create_float_cmp_check(span, op, lhs_value, rhs_value);
            ctx.create_float_cmp_gt(lhs_value, rhs_value)
        }
        BinaryOp::Lte if is_float => {
            ctx.create_float_cmp_check(span, op, lhs_value, rhs_value);
            ctx.create_float_cmp_lte(lhs_value, rhs_value)
        }
        BinaryOp::Gte if is_float => {
            ctx.create_float_cmp_check(span, op, lhs_value, rhs_value);
            ctx.create_float_cmp_gte(lhs_value, rhs_value)
        }
        BinaryOp::Eq => ctx.create_int_cmp_eq(lhs_value, rhs_value),
        BinaryOp::Neq => ctx.create_int_cmp_neq(lhs_value, rhs_value),
        BinaryOp::Lt => ctx.create_int_cmp_lt(lhs_value, rhs_value, is_signed),
        BinaryOp::Gt => ctx.create_int_cmp_gt(lhs_value, rhs_value, is_signed),
        BinaryOp::Lte => ctx.create_int_cmp_lte(lhs_value, rhs_value, is_signed),
        BinaryOp::Gte => ctx.create_int_cmp_gte(lhs_value, rhs_value, is_signed),
    }
}

fn pointee_of(ty: &TypeSpec) -> TypeSpec {
    match ty {
        TypeSpec::Pointer(pointee) => pointee.as_ref().clone(),
        other => unreachable!("pointee of non-pointer {:?}", other),
    }
}

/// Pointer offsets are widened to the 32- or 64-bit arithmetic forms.
fn generate_ptr_offset(ctx: &mut CodegenCtx<'_>, offset: &Expr) -> ExprValue {
    let is_signed = offset.ty.is_signed_int();
    let value = generate_expr(ctx, offset, None);
    let value = ctx.value_of(value);
    use orec_ir::value::ValueType;
    match ctx.type_set.value_type_of(value.ty()) {
        ValueType::I32 | ValueType::I64 => value,
        ValueType::I8 | ValueType::I16 => {
            let i32_t = ctx.type_set.builtin_type(BuiltinKind::I32);
            ctx.create_int_cast(value, i32_t, is_signed)
        }
        other => unreachable!("pointer offset of value type {:?}", other),
    }
}

fn generate_short_circuit(
    ctx: &mut CodegenCtx<'_>,
    op: ShortCircuitOp,
    lhs: &Expr,
    rhs: &Expr,
) -> ExprValue {
    let i1 = ctx.type_set.builtin_type(BuiltinKind::I1);
    let result = ctx.create_alloca_without_lifetime(i1);

    let lhs_value = generate_expr(ctx, lhs, None);
    let lhs_value = ctx.value_of(lhs_value);
    ctx.create_store(lhs_value, result);

    let rhs_block = ctx.add_basic_block();
    let end_block = ctx.add_basic_block();
    match op {
        // `lhs && rhs`: evaluate rhs only when lhs was true.
        ShortCircuitOp::And => ctx.create_conditional_jump(lhs_value, rhs_block, end_block),
        // `lhs || rhs`: evaluate rhs only when lhs was false.
        ShortCircuitOp::Or => ctx.create_conditional_jump(lhs_value, end_block, rhs_block),
    };

    ctx.set_current_block(rhs_block);
    let scope = ctx.push_expression_scope();
    let rhs_value = generate_expr(ctx, rhs, None);
    let rhs_value = ctx.value_of(rhs_value);
    ctx.create_store(rhs_value, result);
    ctx.pop_expression_scope(scope);
    ctx.create_jump(end_block);

    ctx.set_current_block(end_block);
    ctx.create_load(result)
}

fn generate_conditional(
    ctx: &mut CodegenCtx<'_>,
    expr: &Expr,
    cond: &Expr,
    then_expr: &Expr,
    else_expr: Option<&Expr>,
    result_slot: Option<ExprValue>,
) -> ExprValue {
    let cond_value = generate_expr(ctx, cond, None);
    let cond_value = ctx.value_of(cond_value);

    let ty = ctx.lower_type(&expr.ty);
    let produces_value = ctx.type_set.size_of(ty).bytes() != 0;
    let slot = if produces_value {
        Some(slot_or_temp(ctx, ty, result_slot))
    } else {
        None
    };

    let then_block = ctx.add_basic_block();
    let else_block = ctx.add_basic_block();
    let end_block = ctx.add_basic_block();
    ctx.create_conditional_jump(cond_value, then_block, else_block);

    ctx.set_current_block(then_block);
    let scope = ctx.push_expression_scope();
    generate_expr(ctx, then_expr, slot);
    ctx.pop_expression_scope(scope);
    if !ctx.has_terminator() {
        ctx.create_jump(end_block);
    }

    ctx.set_current_block(else_block);
    if let Some(else_expr) = else_expr {
        let scope = ctx.push_expression_scope();
        generate_expr(ctx, else_expr, slot);
        ctx.pop_expression_scope(scope);
    }
    if !ctx.has_terminator() {
        ctx.create_jump(end_block);
    }

    ctx.set_current_block(end_block);
    slot.unwrap_or_else(ExprValue::none)
}

////////// indexing //////////

fn generate_index(ctx: &mut CodegenCtx<'_>, expr: &Expr, base: &Expr, index: &Expr) -> ExprValue {
    let index_signed = index.ty.is_signed_int();
    match &base.ty {
        TypeSpec::Array(len, _) => {
            let base_ref = generate_expr(ctx, base, None);
            debug_assert!(base_ref.is_reference());
            let index_value = generate_expr(ctx, index, None);
            let index_value = ctx.value_of(index_value);

            let i64_t = ctx.type_set.builtin_type(BuiltinKind::I64);
            let wide_index = ctx.create_int_cast(index_value, i64_t, index_signed);
            let size = ctx.create_const_uint(i64_t, *len);
            ctx.create_array_bounds_check(expr.span, wide_index, size, index_signed);

            ctx.create_array_gep(base_ref, index_value)
        }
        TypeSpec::Slice(elem) => {
            let elem_ty = ctx.lower_type(elem);
            let pair_ref = generate_expr(ctx, base, None);
            debug_assert!(pair_ref.is_reference());
            let begin_slot = ctx.create_struct_gep(pair_ref, 0);
            let begin = ctx.create_load(begin_slot);
            let end_slot = ctx.create_struct_gep(pair_ref, 1);
            let end = ctx.create_load(end_slot);

            let index_value = generate_expr(ctx, index, None);
            let index_value = ctx.value_of(index_value);

            let size = ctx.create_ptrdiff(expr.span, end, begin, elem_ty);
            let i64_t = ctx.type_set.builtin_type(BuiltinKind::I64);
            let wide_index = ctx.create_int_cast(index_value, i64_t, index_signed);
            let wide_size = ctx.create_int_cast(size, i64_t, true);
            ctx.create_array_bounds_check(expr.span, wide_index, wide_size, index_signed);

            ctx.create_array_slice_gep(begin, index_value, elem_ty)
        }
        TypeSpec::Str => {
            let u8_spec = TypeSpec::Int(orec_ast::IntKind::U8);
            let elem_ty = ctx.lower_type(&u8_spec);
            let pair_ref = generate_expr(ctx, base, None);
            let begin_slot = ctx.create_struct_gep(pair_ref, 0);
            let begin = ctx.create_load(begin_slot);
            let end_slot = ctx.create_struct_gep(pair_ref, 1);
            let end = ctx.create_load(end_slot);

            let index_value = generate_expr(ctx, index, None);
            let index_value = ctx.value_of(index_value);

            let size = ctx.create_ptrdiff(expr.span, end, begin, elem_ty);
            let i64_t = ctx.type_set.builtin_type(BuiltinKind::I64);
            let wide_index = ctx.create_int_cast(index_value, i64_t, index_signed);
            let wide_size = ctx.create_int_cast(size, i64_t, true);
            ctx.create_array_bounds_check(expr.span, wide_index, wide_size, index_signed);

            ctx.create_array_slice_gep(begin, index_value, elem_ty)
        }
        other => unreachable!("indexing into {:?}", other),
    }
}

////////// casts //////////

fn generate_cast(ctx: &mut CodegenCtx<'_>, inner: &Expr, to: &TypeSpec) -> ExprValue {
    let value = generate_expr(ctx, inner, None);
    let value = ctx.value_of(value);
    let dest = ctx.lower_type(to);

    match (&inner.ty, to) {
        (from, to) if from.int_kind().is_some() && to.int_kind().is_some() => {
            let signed = from.int_kind().unwrap().is_signed();
            ctx.create_int_cast(value, dest, signed)
        }
        (TypeSpec::Bool, to) if to.int_kind().is_some() => ctx.create_int_cast(value, dest, false),
        (from, TypeSpec::Float(_)) if from.int_kind().is_some() => {
            let signed = from.int_kind().unwrap().is_signed();
            ctx.create_int_to_float_cast(value, dest, signed)
        }
        (TypeSpec::Float(_), to) if to.int_kind().is_some() => {
            let signed = to.int_kind().unwrap().is_signed();
            ctx.create_float_to_int_cast(value, dest, signed)
        }
        (TypeSpec::Float(_), TypeSpec::Float(_)) => ctx.create_float_cast(value, dest),
        (TypeSpec::Pointer(_), TypeSpec::Pointer(_)) => {
            // Pointer-to-pointer casts keep the representation.
            ExprValue::new_value(value.instr(), dest)
        }
        (from, to) => unreachable!("cast {:?} -> {:?}", from, to),
    }
}

////////// calls //////////

fn generate_call(
    ctx: &mut CodegenCtx<'_>,
    span: SrcSpan,
    callee: orec_ast::BodyId,
    args: &[Expr],
    result_slot: Option<ExprValue>,
) -> ExprValue {
    let func = crate::generate_function(ctx, callee);
    let ast = ctx.ast;
    let callee_body = ast.body(callee);

    let return_ty = ctx.lower_type(&callee_body.return_type);
    let returns_scalar = ctx.type_set.is_simple_value_type(return_ty);
    let needs_return_slot = !returns_scalar && ctx.type_set.size_of(return_ty).bytes() != 0;

    let mut call_args: SmallVec<[InstrRef; 8]> = SmallVec::new();
    let return_slot = if needs_return_slot {
        let slot = slot_or_temp(ctx, return_ty, result_slot);
        call_args.push(slot.get_reference());
        Some(slot)
    } else {
        None
    };

    for (arg, param) in args.iter().zip(&callee_body.params) {
        let param_ty = ctx.lower_type(&param.ty);
        if ctx.type_set.is_simple_value_type(param_ty) {
            let value = generate_expr(ctx, arg, None);
            call_args.push(ctx.value_instr_of(value));
        } else {
            // Aggregates travel by pointer to a caller-owned copy.
            let temp = ctx.create_alloca(param_ty);
            generate_expr(ctx, arg, Some(temp));
            call_args.push(temp.get_reference());
        }
    }

    let call = ctx.create_function_call(span, func, call_args.into_vec(), return_ty);

    if returns_scalar {
        store_or_forward(ctx, call, result_slot)
    } else if let Some(slot) = return_slot {
        slot
    } else {
        ExprValue::none()
    }
}

////////// builtins //////////

fn generate_builtin(
    ctx: &mut CodegenCtx<'_>,
    expr: &Expr,
    op: BuiltinOp,
    args: &[Expr],
    result_slot: Option<ExprValue>,
) -> ExprValue {
    let span = expr.span;
    let result = match op {
        BuiltinOp::MathUnary(op) => {
            let x = generate_expr(ctx, &args[0], None);
            let x = ctx.value_of(x);
            ctx.create_math_unary_check(span, op, x);
            ctx.create_math_unary(op, x)
        }
        BuiltinOp::MathBinary(op) => {
            let x = generate_expr(ctx, &args[0], None);
            let x = ctx.value_of(x);
            let y = generate_expr(ctx, &args[1], None);
            let y = ctx.value_of(y);
            ctx.create_math_binary_check(span, op, x, y);
            ctx.create_math_binary(op, x, y)
        }
        BuiltinOp::Abs => {
            let x = generate_expr(ctx, &args[0], None);
            let x = ctx.value_of(x);
            ctx.create_abs_check(span, x);
            ctx.create_abs(x)
        }
        BuiltinOp::Min | BuiltinOp::Max => {
            let is_signed = args[0].ty.is_signed_int();
            let x = generate_expr(ctx, &args[0], None);
            let x = ctx.value_of(x);
            let y = generate_expr(ctx, &args[1], None);
            let y = ctx.value_of(y);
            if op == BuiltinOp::Min {
                ctx.create_min_check(span, x, y);
                ctx.create_min(x, y, is_signed)
            } else {
                ctx.create_max_check(span, x, y);
                ctx.create_max(x, y, is_signed)
            }
        }
        BuiltinOp::Bitreverse => {
            let x = generate_expr(ctx, &args[0], None);
            ctx.create_bitreverse(x)
        }
        BuiltinOp::Popcount => {
            let x = generate_expr(ctx, &args[0], None);
            ctx.create_popcount(x)
        }
        BuiltinOp::Byteswap => {
            let x = generate_expr(ctx, &args[0], None);
            ctx.create_byteswap(x)
        }
        BuiltinOp::Clz => {
            let x = generate_expr(ctx, &args[0], None);
            ctx.create_clz(x)
        }
        BuiltinOp::Ctz => {
            let x = generate_expr(ctx, &args[0], None);
            ctx.create_ctz(x)
        }
        BuiltinOp::Fshl => {
            let a = generate_expr(ctx, &args[0], None);
            let b = generate_expr(ctx, &args[1], None);
            let amount = generate_expr(ctx, &args[2], None);
            ctx.create_fshl(a, b, amount)
        }
        BuiltinOp::Fshr => {
            let a = generate_expr(ctx, &args[0], None);
            let b = generate_expr(ctx, &args[1], None);
            let amount = generate_expr(ctx, &args[2], None);
            ctx.create_fshr(a, b, amount)
        }
        BuiltinOp::Malloc => {
            let elem = pointee_of(&expr.ty);
            let elem_ty = ctx.lower_type(&elem);
            let count_signed = args[0].ty.is_signed_int();
            let count = generate_expr(ctx, &args[0], None);
            let count = ctx.value_of(count);
            let i64_t = ctx.type_set.builtin_type(BuiltinKind::I64);
            let count = ctx.create_int_cast(count, i64_t, count_signed);
            ctx.create_malloc(span, elem_ty, count)
        }
        BuiltinOp::Free => {
            let ptr = generate_expr(ctx, &args[0], None);
            let ptr = ctx.value_of(ptr);
            ctx.create_free(span, ptr);
            return result_slot.unwrap_or_else(ExprValue::none);
        }
        BuiltinOp::ComptimeError | BuiltinOp::ComptimeWarning(_) => {
            let (begin, end) = generate_str_pointers(ctx, &args[0]);
            match op {
                BuiltinOp::ComptimeError => {
                    ctx.create_error_str(span, begin, end);
                }
                BuiltinOp::ComptimeWarning(kind) => {
                    ctx.create_warning_str(span, kind, begin, end);
                }
                _ => unreachable!(),
            }
            return result_slot.unwrap_or_else(ExprValue::none);
        }
    };
    store_or_forward(ctx, result, result_slot)
}

/// The (begin, one-past-end) pointer values of a `str` expression.
fn generate_str_pointers(ctx: &mut CodegenCtx<'_>, text: &Expr) -> (ExprValue, ExprValue) {
    let pair_ref = generate_expr(ctx, text, None);
    debug_assert!(pair_ref.is_reference());
    let begin_slot = ctx.create_struct_gep(pair_ref, 0);
    let begin = ctx.create_load(begin_slot);
    let end_slot = ctx.create_struct_gep(pair_ref, 1);
    let end = ctx.create_load(end_slot);
    (begin, end)
}

////////// optionals and slices //////////

fn generate_optional_some(
    ctx: &mut CodegenCtx<'_>,
    expr: &Expr,
    inner: &Expr,
    result_slot: Option<ExprValue>,
) -> ExprValue {
    if spec_is_pointer_like_optional(&expr.ty) {
        let value = generate_expr(ctx, inner, None);
        let value = ctx.value_of(value);
        return store_or_forward(ctx, value, result_slot);
    }
    let ty = ctx.lower_type(&expr.ty);
    let slot = slot_or_temp(ctx, ty, result_slot);
    let payload_slot = ctx.create_struct_gep(slot, 0);
    generate_expr(ctx, inner, Some(payload_slot));
    let flag_slot = ctx.create_struct_gep(slot, 1);
    let true_value = ctx.create_const_i1(true);
    ctx.create_store(true_value, flag_slot);
    slot
}

fn generate_optional_has_value(ctx: &mut CodegenCtx<'_>, inner: &Expr) -> ExprValue {
    if spec_is_pointer_like_optional(&inner.ty) {
        let ptr = generate_expr(ctx, inner, None);
        let ptr = ctx.value_of(ptr);
        let null = ctx.create_const_ptr_null();
        return ctx.create_pointer_cmp_neq(ptr, null);
    }
    let opt_ref = generate_expr(ctx, inner, None);
    debug_assert!(opt_ref.is_reference());
    let flag_slot = ctx.create_struct_gep(opt_ref, 1);
    ctx.create_load(flag_slot)
}

fn generate_optional_get_value(ctx: &mut CodegenCtx<'_>, span: SrcSpan, inner: &Expr) -> ExprValue {
    if spec_is_pointer_like_optional(&inner.ty) {
        let ptr = generate_expr(ctx, inner, None);
        let ptr = ctx.value_of(ptr);
        let null = ctx.create_const_ptr_null();
        let has_value = ctx.create_pointer_cmp_neq(ptr, null);
        ctx.create_optional_get_value_check(span, has_value);
        return ptr;
    }
    let opt_ref = generate_expr(ctx, inner, None);
    debug_assert!(opt_ref.is_reference());
    let flag_slot = ctx.create_struct_gep(opt_ref, 1);
    let has_value = ctx.create_load(flag_slot);
    ctx.create_optional_get_value_check(span, has_value);
    ctx.create_struct_gep(opt_ref, 0)
}

fn generate_make_slice(
    ctx: &mut CodegenCtx<'_>,
    expr: &Expr,
    begin: &Expr,
    end: &Expr,
    result_slot: Option<ExprValue>,
) -> ExprValue {
    let elem = match &expr.ty {
        TypeSpec::Slice(elem) => elem.as_ref().clone(),
        TypeSpec::Str => TypeSpec::Int(orec_ast::IntKind::U8),
        other => unreachable!("slice construction of type {:?}", other),
    };
    let elem_ty = ctx.lower_type(&elem);

    let begin_value = generate_expr(ctx, begin, None);
    let begin_value = ctx.value_of(begin_value);
    let end_value = generate_expr(ctx, end, None);
    let end_value = ctx.value_of(end_value);

    if matches!(expr.ty, TypeSpec::Str) {
        ctx.create_str_construction_check(expr.span, begin_value, end_value);
    } else {
        ctx.create_slice_construction_check(expr.span, begin_value, end_value, elem_ty);
    }

    let ty = ctx.lower_type(&expr.ty);
    let slot = slot_or_temp(ctx, ty, result_slot);
    let begin_slot = ctx.create_struct_gep(slot, 0);
    ctx.create_store(begin_value, begin_slot);
    let end_slot = ctx.create_struct_gep(slot, 1);
    ctx.create_store(end_value, end_slot);
    slot
}
