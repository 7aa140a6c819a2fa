//! Structural invariants of finalized IR, checked over real generated
//! functions: operand value types line up with their producers, jump
//! targets are in range, and alloca slots precede instruction slots.

use orec_abi::target::TargetLayout;
use orec_ast::{
    Ast, BinaryOp, BodyId, ConstValue, Expr, ExprKind, FunctionBody, IntKind, Param, Stmt,
    TypeSpec, VarId,
};
use orec_codegen::{generate_function, CodegenCtx};
use orec_ir::function::Function;
use orec_ir::inst::Instruction;
use orec_ir::value::ValueType;
use orec_session::{SrcSpan, WarningConfig};

fn sp() -> SrcSpan {
    SrcSpan::synthetic()
}

fn expr(kind: ExprKind, ty: TypeSpec) -> Expr {
    Expr::new(kind, ty, sp())
}

fn int64(value: i64) -> Expr {
    expr(ExprKind::Const(ConstValue::Sint(value)), TypeSpec::Int(IntKind::I64))
}

fn sample_ast() -> (Ast, BodyId) {
    // fn triangle(n: i64) -> i64 {
    //     let total: i64 = 0;
    //     while (n > 0) { total = total + n; n = n - 1; }
    //     return total;
    // }
    let i64_ty = TypeSpec::Int(IntKind::I64);
    let n = VarId::from_u32(0);
    let total = VarId::from_u32(1);
    let mut ast = Ast::new();
    let n_ref = || expr(ExprKind::VarRef(n), TypeSpec::Int(IntKind::I64));
    let total_ref = || expr(ExprKind::VarRef(total), TypeSpec::Int(IntKind::I64));

    let body = ast.add_body(FunctionBody {
        name: "triangle".to_string(),
        span: sp(),
        params: vec![Param {
            id: n,
            name: "n".to_string(),
            ty: i64_ty.clone(),
        }],
        return_type: i64_ty.clone(),
        stmts: vec![
            Stmt::var_decl(total, "total", i64_ty.clone(), sp(), Some(int64(0))),
            Stmt::While {
                span: sp(),
                cond: expr(
                    ExprKind::BinaryOp {
                        op: BinaryOp::Gt,
                        lhs: Box::new(n_ref()),
                        rhs: Box::new(int64(0)),
                    },
                    TypeSpec::Bool,
                ),
                body: vec![
                    Stmt::Expr(expr(
                        ExprKind::Assign {
                            lhs: Box::new(total_ref()),
                            rhs: Box::new(expr(
                                ExprKind::BinaryOp {
                                    op: BinaryOp::Add,
                                    lhs: Box::new(total_ref()),
                                    rhs: Box::new(n_ref()),
                                },
                                i64_ty.clone(),
                            )),
                        },
                        TypeSpec::Unit,
                    )),
                    Stmt::Expr(expr(
                        ExprKind::Assign {
                            lhs: Box::new(n_ref()),
                            rhs: Box::new(expr(
                                ExprKind::BinaryOp {
                                    op: BinaryOp::Sub,
                                    lhs: Box::new(n_ref()),
                                    rhs: Box::new(int64(1)),
                                },
                                i64_ty.clone(),
                            )),
                        },
                        TypeSpec::Unit,
                    )),
                ],
            },
            Stmt::Return {
                span: sp(),
                value: Some(total_ref()),
            },
        ],
    });
    (ast, body)
}

fn generate(ast: &Ast, body: BodyId) -> (CodegenCtx<'_>, orec_ir::function::FuncIdx) {
    let mut ctx = CodegenCtx::new(TargetLayout::host_default(), WarningConfig::all(), ast);
    let func = generate_function(&mut ctx, body);
    (ctx, func)
}

/// The value type an operand slot reads: alloca slots hold frame
/// addresses, instruction slots hold the producing instruction's result.
fn producer_type(func: &Function, value: orec_ir::function::ValueIdx) -> ValueType {
    let alloca_count = func.allocas.len();
    if value.as_usize() < alloca_count {
        ValueType::Ptr
    } else {
        func.instructions[value.as_usize() - alloca_count].result_type()
    }
}

fn types_compatible(consumer: ValueType, producer: ValueType) -> bool {
    consumer == producer || consumer == ValueType::Any || producer == ValueType::Any
}

#[test]
fn operand_value_types_are_sound() {
    let (ast, body) = sample_ast();
    let (ctx, func_idx) = generate(&ast, body);
    let func = ctx.function(func_idx);

    for inst in &func.instructions {
        for (slot, &arg) in inst.arg_types().iter().zip(inst.args()) {
            assert_ne!(
                arg,
                orec_ir::function::ValueIdx::UNRESOLVED,
                "unresolved operand survived finalization in {}",
                inst.mnemonic()
            );
            let produced = producer_type(func, arg);
            assert!(
                types_compatible(*slot, produced),
                "{} consumes {:?} but its operand produces {:?}",
                inst.mnemonic(),
                slot,
                produced
            );
        }
    }

    // Call argument tables went through the same rewrite.
    for args in &func.call_args {
        for &arg in args {
            assert_ne!(arg, orec_ir::function::ValueIdx::UNRESOLVED);
            assert!(arg.as_usize() < func.value_slot_count());
        }
    }
}

#[test]
fn jump_targets_are_in_range_and_flow_terminates() {
    let (ast, body) = sample_ast();
    let (ctx, func_idx) = generate(&ast, body);
    let func = ctx.function(func_idx);

    assert!(
        func.instructions
            .last()
            .is_some_and(Instruction::is_terminator),
        "function does not end with a terminator"
    );

    let len = func.instructions.len();
    let mut has_loop_back_edge = false;
    for (index, inst) in func.instructions.iter().enumerate() {
        match inst {
            Instruction::Jump { dest, .. } => {
                assert!(dest.as_usize() < len);
                has_loop_back_edge |= dest.as_usize() <= index;
            }
            Instruction::ConditionalJump {
                true_dest,
                false_dest,
                ..
            } => {
                assert!(true_dest.as_usize() < len);
                assert!(false_dest.as_usize() < len);
            }
            Instruction::SwitchI8 { info, .. }
            | Instruction::SwitchI16 { info, .. }
            | Instruction::SwitchI32 { info, .. }
            | Instruction::SwitchI64 { info, .. } => {
                let table = &func.switch_infos[*info];
                assert!(table.default_dest.as_usize() < len);
                for &(_, dest) in &table.values {
                    assert!(dest.as_usize() < len);
                }
                // Case values are sorted for the binary search.
                assert!(table.values.windows(2).all(|w| w[0].0 < w[1].0));
            }
            _ => {}
        }
    }
    // The while loop must have produced a backwards jump.
    assert!(has_loop_back_edge);
}

#[test]
fn alloca_slots_precede_instruction_slots() {
    let (ast, body) = sample_ast();
    let (ctx, func_idx) = generate(&ast, body);
    let func = ctx.function(func_idx);

    assert!(!func.allocas.is_empty());
    assert_eq!(
        func.value_slot_count(),
        func.allocas.len() + func.instructions.len()
    );

    // No instruction may reference a slot past the last instruction.
    for inst in &func.instructions {
        for &arg in inst.args() {
            assert!(arg.as_usize() < func.value_slot_count());
        }
    }
}
