//! End-to-end consteval scenarios: resolved AST in, constant value and
//! diagnostics out.

use orec_abi::target::{Endianness, PointerWidth, TargetLayout};
use orec_ast::{
    Ast, BinaryOp, BodyId, BuiltinOp, ConstValue, Expr, ExprKind, FunctionBody, IntKind, Param,
    ShortCircuitOp, Stmt, SwitchCase, TypeSpec, VarDecl, VarId,
};
use orec_interp::{evaluate, EvalRequest, ExecLimits};
use orec_session::{CollectingSink, Severity, SrcSpan, WarningConfig};

fn sp() -> SrcSpan {
    SrcSpan::synthetic()
}

fn expr(kind: ExprKind, ty: TypeSpec) -> Expr {
    Expr::new(kind, ty, sp())
}

fn int32(value: i64) -> Expr {
    expr(ExprKind::Const(ConstValue::Sint(value)), TypeSpec::Int(IntKind::I32))
}

fn int64(value: i64) -> Expr {
    expr(ExprKind::Const(ConstValue::Sint(value)), TypeSpec::Int(IntKind::I64))
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, ty: TypeSpec) -> Expr {
    expr(
        ExprKind::BinaryOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        ty,
    )
}

fn var_ref(id: VarId, ty: TypeSpec) -> Expr {
    expr(ExprKind::VarRef(id), ty)
}

fn ret(value: Expr) -> Stmt {
    Stmt::Return {
        span: sp(),
        value: Some(value),
    }
}

fn entry_body(name: &str, return_type: TypeSpec, stmts: Vec<Stmt>) -> FunctionBody {
    FunctionBody {
        name: name.to_string(),
        span: sp(),
        params: vec![],
        return_type,
        stmts,
    }
}

fn eval_on(
    ast: &Ast,
    body: BodyId,
    machine: TargetLayout,
) -> (Option<ConstValue>, CollectingSink) {
    let mut sink = CollectingSink::new();
    let result = evaluate(
        ast,
        machine,
        WarningConfig::all(),
        EvalRequest {
            body,
            limits: ExecLimits::default(),
        },
        &mut sink,
    );
    (result, sink)
}

fn eval(ast: &Ast, body: BodyId) -> (Option<ConstValue>, CollectingSink) {
    eval_on(ast, body, TargetLayout::host_default())
}

/// `let x: i32 = 2_000_000_000 + 2_000_000_000;` — wraps, with a warning.
#[test]
fn int_overflow_warns_and_wraps() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let x = VarId::from_u32(0);
    let mut ast = Ast::new();
    let body = ast.add_body(entry_body(
        "overflowing",
        i32_ty.clone(),
        vec![
            Stmt::var_decl(
                x,
                "x",
                i32_ty.clone(),
                sp(),
                Some(binary(
                    BinaryOp::Add,
                    int32(2_000_000_000),
                    int32(2_000_000_000),
                    i32_ty.clone(),
                )),
            ),
            ret(var_ref(x, i32_ty)),
        ],
    ));

    let (result, sink) = eval(&ast, body);
    assert_eq!(result, Some(ConstValue::Sint(-294_967_296)));
    let warnings: Vec<_> = sink.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message, "integer overflow");
    assert_eq!(warnings[0].severity, Severity::Warning);
}

/// `10 / 0` — aborts with an error, no constant.
#[test]
fn division_by_zero_is_an_error() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let mut ast = Ast::new();
    let body = ast.add_body(entry_body(
        "div_by_zero",
        i32_ty.clone(),
        vec![ret(binary(BinaryOp::Div, int32(10), int32(0), i32_ty))],
    ));

    let (result, sink) = eval(&ast, body);
    assert_eq!(result, None);
    let errors: Vec<_> = sink.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "division by zero");
}

/// `a[3]` with `a: [3]i32` — bounds check fires.
#[test]
fn out_of_bounds_index_is_an_error() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let arr_ty = TypeSpec::array(3, i32_ty.clone());
    let a = VarId::from_u32(0);
    let mut ast = Ast::new();
    let body = ast.add_body(entry_body(
        "oob",
        i32_ty.clone(),
        vec![
            Stmt::var_decl(
                a,
                "a",
                arr_ty.clone(),
                sp(),
                Some(expr(
                    ExprKind::ArrayInit {
                        elems: vec![int32(1), int32(2), int32(3)],
                        elem_destructor: None,
                    },
                    arr_ty.clone(),
                )),
            ),
            ret(expr(
                ExprKind::Index {
                    base: Box::new(var_ref(a, arr_ty)),
                    index: Box::new(int64(3)),
                },
                i32_ty,
            )),
        ],
    ));

    let (result, sink) = eval(&ast, body);
    assert_eq!(result, None);
    let errors: Vec<_> = sink.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "out-of-bounds access: index 3, size 3");
}

/// `let p = &a[0]; let q = p + 4;` with `a` of length 3 — the arithmetic
/// step itself faults.
#[test]
fn pointer_arithmetic_past_the_end_is_an_error() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let ptr_ty = TypeSpec::pointer(i32_ty.clone());
    let arr_ty = TypeSpec::array(3, i32_ty.clone());
    let a = VarId::from_u32(0);
    let p = VarId::from_u32(1);
    let q = VarId::from_u32(2);
    let mut ast = Ast::new();
    let body = ast.add_body(entry_body(
        "past_end",
        i32_ty.clone(),
        vec![
            Stmt::var_decl(
                a,
                "a",
                arr_ty.clone(),
                sp(),
                Some(expr(
                    ExprKind::ArrayInit {
                        elems: vec![int32(1), int32(2), int32(3)],
                        elem_destructor: None,
                    },
                    arr_ty.clone(),
                )),
            ),
            Stmt::var_decl(
                p,
                "p",
                ptr_ty.clone(),
                sp(),
                Some(expr(
                    ExprKind::AddressOf(Box::new(expr(
                        ExprKind::Index {
                            base: Box::new(var_ref(a, arr_ty)),
                            index: Box::new(int64(0)),
                        },
                        i32_ty.clone(),
                    ))),
                    ptr_ty.clone(),
                )),
            ),
            Stmt::var_decl(
                q,
                "q",
                ptr_ty.clone(),
                sp(),
                Some(binary(
                    BinaryOp::Add,
                    var_ref(p, ptr_ty.clone()),
                    int32(4),
                    ptr_ty.clone(),
                )),
            ),
            ret(int32(0)),
        ],
    ));

    let (result, sink) = eval(&ast, body);
    assert_eq!(result, None);
    let errors: Vec<_> = sink.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "pointer arithmetic out of bounds");
}

/// One-past-the-end itself is fine; only going further faults.
#[test]
fn pointer_one_past_the_end_is_representable() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let ptr_ty = TypeSpec::pointer(i32_ty.clone());
    let arr_ty = TypeSpec::array(3, i32_ty.clone());
    let a = VarId::from_u32(0);
    let p = VarId::from_u32(1);
    let mut ast = Ast::new();
    // return (p + 3) - p;  (== 3, via pointer difference)
    let p_plus_3 = binary(
        BinaryOp::Add,
        var_ref(p, ptr_ty.clone()),
        int32(3),
        ptr_ty.clone(),
    );
    let diff = binary(
        BinaryOp::Sub,
        p_plus_3,
        var_ref(p, ptr_ty.clone()),
        TypeSpec::Int(IntKind::I64),
    );
    let body = ast.add_body(entry_body(
        "one_past_end",
        TypeSpec::Int(IntKind::I64),
        vec![
            Stmt::var_decl(
                a,
                "a",
                arr_ty.clone(),
                sp(),
                Some(expr(
                    ExprKind::ArrayInit {
                        elems: vec![int32(1), int32(2), int32(3)],
                        elem_destructor: None,
                    },
                    arr_ty.clone(),
                )),
            ),
            Stmt::var_decl(
                p,
                "p",
                ptr_ty.clone(),
                sp(),
                Some(expr(
                    ExprKind::AddressOf(Box::new(expr(
                        ExprKind::Index {
                            base: Box::new(var_ref(a, arr_ty)),
                            index: Box::new(int64(0)),
                        },
                        i32_ty,
                    ))),
                    ptr_ty,
                )),
            ),
            ret(diff),
        ],
    ));

    let (result, sink) = eval(&ast, body);
    assert!(!sink.has_errors());
    assert_eq!(result, Some(ConstValue::Sint(3)));
}

/// A string literal reads back exactly, covering 6 bytes of UTF-8.
#[test]
fn string_literal_roundtrip() {
    let mut ast = Ast::new();
    let body = ast.add_body(entry_body(
        "greeting",
        TypeSpec::Str,
        vec![ret(expr(
            ExprKind::Const(ConstValue::String("héllo".to_string())),
            TypeSpec::Str,
        ))],
    ));

    let (result, sink) = eval(&ast, body);
    assert!(!sink.has_errors());
    let value = result.unwrap();
    assert_eq!(value, ConstValue::String("héllo".to_string()));
    assert_eq!(value.as_str().unwrap().len(), 6);
}

fn add_factorial(ast: &mut Ast) -> BodyId {
    let i64_ty = TypeSpec::Int(IntKind::I64);
    let n = VarId::from_u32(0);
    let fact_id = BodyId::from_u32(ast.bodies.len() as u32);
    let ternary = expr(
        ExprKind::Conditional {
            cond: Box::new(binary(
                BinaryOp::Lte,
                var_ref(n, i64_ty.clone()),
                int64(1),
                TypeSpec::Bool,
            )),
            then_expr: Box::new(int64(1)),
            else_expr: Some(Box::new(binary(
                BinaryOp::Mul,
                var_ref(n, i64_ty.clone()),
                expr(
                    ExprKind::Call {
                        callee: fact_id,
                        args: vec![binary(
                            BinaryOp::Sub,
                            var_ref(n, i64_ty.clone()),
                            int64(1),
                            i64_ty.clone(),
                        )],
                    },
                    i64_ty.clone(),
                ),
                i64_ty.clone(),
            ))),
        },
        i64_ty.clone(),
    );
    ast.add_body(FunctionBody {
        name: "fact".to_string(),
        span: sp(),
        params: vec![Param {
            id: n,
            name: "n".to_string(),
            ty: i64_ty.clone(),
        }],
        return_type: i64_ty,
        stmts: vec![ret(ternary)],
    })
}

/// `fact(5) == 120`, no diagnostics.
#[test]
fn recursive_factorial() {
    let i64_ty = TypeSpec::Int(IntKind::I64);
    let mut ast = Ast::new();
    let fact = add_factorial(&mut ast);
    let body = ast.add_body(entry_body(
        "fact5",
        i64_ty.clone(),
        vec![ret(expr(
            ExprKind::Call {
                callee: fact,
                args: vec![int64(5)],
            },
            i64_ty,
        ))],
    ));

    let (result, sink) = eval(&ast, body);
    assert!(sink.diagnostics.is_empty());
    assert_eq!(result, Some(ConstValue::Sint(120)));
}

/// The same pipeline under the big-endian 32-bit machine model.
#[test]
fn factorial_and_strings_on_big_endian_32_bit() {
    let machine = TargetLayout::new(PointerWidth::Bits32, Endianness::Big);
    let i64_ty = TypeSpec::Int(IntKind::I64);

    let mut ast = Ast::new();
    let fact = add_factorial(&mut ast);
    let fact_entry = ast.add_body(entry_body(
        "fact6",
        i64_ty.clone(),
        vec![ret(expr(
            ExprKind::Call {
                callee: fact,
                args: vec![int64(6)],
            },
            i64_ty,
        ))],
    ));
    let string_entry = ast.add_body(entry_body(
        "text",
        TypeSpec::Str,
        vec![ret(expr(
            ExprKind::Const(ConstValue::String("héllo".to_string())),
            TypeSpec::Str,
        ))],
    ));

    let (result, sink) = eval_on(&ast, fact_entry, machine);
    assert!(sink.diagnostics.is_empty());
    assert_eq!(result, Some(ConstValue::Sint(720)));

    let (result, sink) = eval_on(&ast, string_entry, machine);
    assert!(!sink.has_errors());
    assert_eq!(result, Some(ConstValue::String("héllo".to_string())));
}

/// `while` with `break`/`continue`: sum of odd numbers below 10.
#[test]
fn while_loop_with_break_and_continue() {
    let i64_ty = TypeSpec::Int(IntKind::I64);
    let sum = VarId::from_u32(0);
    let i = VarId::from_u32(1);
    let mut ast = Ast::new();

    // while (true) {
    //     i = i + 1;
    //     if (i >= 10) { break; }
    //     if (i % 2 == 0) { continue; }
    //     sum = sum + i;
    // }
    let incr_i = expr(
        ExprKind::Assign {
            lhs: Box::new(var_ref(i, i64_ty.clone())),
            rhs: Box::new(binary(
                BinaryOp::Add,
                var_ref(i, i64_ty.clone()),
                int64(1),
                i64_ty.clone(),
            )),
        },
        TypeSpec::Unit,
    );
    let break_if_done = expr(
        ExprKind::Conditional {
            cond: Box::new(binary(
                BinaryOp::Gte,
                var_ref(i, i64_ty.clone()),
                int64(10),
                TypeSpec::Bool,
            )),
            then_expr: Box::new(expr(
                ExprKind::Block {
                    stmts: vec![Stmt::Break(sp())],
                    value: None,
                },
                TypeSpec::Unit,
            )),
            else_expr: None,
        },
        TypeSpec::Unit,
    );
    let skip_evens = expr(
        ExprKind::Conditional {
            cond: Box::new(binary(
                BinaryOp::Eq,
                binary(BinaryOp::Rem, var_ref(i, i64_ty.clone()), int64(2), i64_ty.clone()),
                int64(0),
                TypeSpec::Bool,
            )),
            then_expr: Box::new(expr(
                ExprKind::Block {
                    stmts: vec![Stmt::Continue(sp())],
                    value: None,
                },
                TypeSpec::Unit,
            )),
            else_expr: None,
        },
        TypeSpec::Unit,
    );
    let accumulate = expr(
        ExprKind::Assign {
            lhs: Box::new(var_ref(sum, i64_ty.clone())),
            rhs: Box::new(binary(
                BinaryOp::Add,
                var_ref(sum, i64_ty.clone()),
                var_ref(i, i64_ty.clone()),
                i64_ty.clone(),
            )),
        },
        TypeSpec::Unit,
    );

    let body = ast.add_body(entry_body(
        "odd_sum",
        i64_ty.clone(),
        vec![
            Stmt::var_decl(sum, "sum", i64_ty.clone(), sp(), Some(int64(0))),
            Stmt::var_decl(i, "i", i64_ty.clone(), sp(), Some(int64(0))),
            Stmt::While {
                span: sp(),
                cond: expr(ExprKind::Const(ConstValue::Bool(true)), TypeSpec::Bool),
                body: vec![
                    Stmt::Expr(incr_i),
                    Stmt::Expr(break_if_done),
                    Stmt::Expr(skip_evens),
                    Stmt::Expr(accumulate),
                ],
            },
            ret(var_ref(sum, i64_ty)),
        ],
    ));

    let (result, sink) = eval(&ast, body);
    assert!(sink.diagnostics.is_empty());
    // 1 + 3 + 5 + 7 + 9
    assert_eq!(result, Some(ConstValue::Sint(25)));
}

/// `false && (1 / 0 == 1)` never evaluates the division.
#[test]
fn short_circuit_skips_the_right_hand_side() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let mut ast = Ast::new();
    let poisoned = binary(
        BinaryOp::Eq,
        binary(BinaryOp::Div, int32(1), int32(0), i32_ty),
        int32(1),
        TypeSpec::Bool,
    );
    let and = expr(
        ExprKind::ShortCircuit {
            op: ShortCircuitOp::And,
            lhs: Box::new(expr(ExprKind::Const(ConstValue::Bool(false)), TypeSpec::Bool)),
            rhs: Box::new(poisoned),
        },
        TypeSpec::Bool,
    );
    let body = ast.add_body(entry_body("short_circuit", TypeSpec::Bool, vec![ret(and)]));

    let (result, sink) = eval(&ast, body);
    assert!(sink.diagnostics.is_empty());
    assert_eq!(result, Some(ConstValue::Bool(false)));
}

/// Switch over an integer: sorted case values, default fallthrough.
#[test]
fn switch_dispatches_and_defaults() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let mut ast = Ast::new();
    let make_switch_body = |ast: &mut Ast, name: &str, scrutinee: i64| {
        let out = VarId::from_u32(0);
        ast.add_body(entry_body(
            name,
            i32_ty.clone(),
            vec![
                Stmt::var_decl(out, "out", i32_ty.clone(), sp(), Some(int32(0))),
                Stmt::Switch {
                    span: sp(),
                    value: int32(scrutinee),
                    cases: vec![
                        SwitchCase {
                            values: vec![3, 1],
                            body: vec![Stmt::Expr(expr(
                                ExprKind::Assign {
                                    lhs: Box::new(var_ref(out, i32_ty.clone())),
                                    rhs: Box::new(int32(10)),
                                },
                                TypeSpec::Unit,
                            ))],
                        },
                        SwitchCase {
                            values: vec![2],
                            body: vec![Stmt::Expr(expr(
                                ExprKind::Assign {
                                    lhs: Box::new(var_ref(out, i32_ty.clone())),
                                    rhs: Box::new(int32(20)),
                                },
                                TypeSpec::Unit,
                            ))],
                        },
                    ],
                    default: Some(vec![Stmt::Expr(expr(
                        ExprKind::Assign {
                            lhs: Box::new(var_ref(out, i32_ty.clone())),
                            rhs: Box::new(int32(-1)),
                        },
                        TypeSpec::Unit,
                    ))]),
                },
                ret(var_ref(out, i32_ty.clone())),
            ],
        ))
    };

    let on_two = make_switch_body(&mut ast, "on_two", 2);
    let on_one = make_switch_body(&mut ast, "on_one", 1);
    let on_nine = make_switch_body(&mut ast, "on_nine", 9);

    assert_eq!(eval(&ast, on_two).0, Some(ConstValue::Sint(20)));
    assert_eq!(eval(&ast, on_one).0, Some(ConstValue::Sint(10)));
    assert_eq!(eval(&ast, on_nine).0, Some(ConstValue::Sint(-1)));
}

/// A tuple result is read back member by member through the return slot.
#[test]
fn aggregate_result_readback() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let tuple_ty = TypeSpec::Tuple(vec![
        TypeSpec::Int(IntKind::U8),
        i32_ty.clone(),
        TypeSpec::Bool,
    ]);
    let mut ast = Ast::new();
    let value = expr(
        ExprKind::Tuple(vec![
            expr(ExprKind::Const(ConstValue::Uint(7)), TypeSpec::Int(IntKind::U8)),
            binary(BinaryOp::Mul, int32(6), int32(7), i32_ty),
            expr(ExprKind::Const(ConstValue::Bool(true)), TypeSpec::Bool),
        ]),
        tuple_ty.clone(),
    );
    let body = ast.add_body(entry_body("pair", tuple_ty, vec![ret(value)]));

    let (result, sink) = eval(&ast, body);
    assert!(sink.diagnostics.is_empty());
    assert_eq!(
        result,
        Some(ConstValue::Tuple(vec![
            ConstValue::Uint(7),
            ConstValue::Sint(42),
            ConstValue::Bool(true),
        ]))
    );
}

/// Optionals: `get_value` on an empty optional aborts; on a present one it
/// reads the payload.
#[test]
fn optional_get_value_is_checked() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let opt_ty = TypeSpec::optional(i32_ty.clone());
    let mut ast = Ast::new();

    let present = ast.add_body(entry_body(
        "present",
        i32_ty.clone(),
        vec![ret(expr(
            ExprKind::OptionalGetValue(Box::new(expr(
                ExprKind::OptionalSome(Box::new(int32(11))),
                opt_ty.clone(),
            ))),
            i32_ty.clone(),
        ))],
    ));
    let empty = ast.add_body(entry_body(
        "empty",
        i32_ty.clone(),
        vec![ret(expr(
            ExprKind::OptionalGetValue(Box::new(expr(
                ExprKind::Const(ConstValue::Null),
                opt_ty,
            ))),
            i32_ty,
        ))],
    ));

    let (result, sink) = eval(&ast, present);
    assert!(sink.diagnostics.is_empty());
    assert_eq!(result, Some(ConstValue::Sint(11)));

    let (result, sink) = eval(&ast, empty);
    assert_eq!(result, None);
    assert_eq!(
        sink.errors().next().unwrap().message,
        "getting the value of an empty optional"
    );
}

/// Slices constructed from pointer pairs are checked and indexable.
#[test]
fn slice_construction_and_indexing() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let ptr_ty = TypeSpec::pointer(i32_ty.clone());
    let arr_ty = TypeSpec::array(4, i32_ty.clone());
    let slice_ty = TypeSpec::slice(i32_ty.clone());
    let a = VarId::from_u32(0);
    let s = VarId::from_u32(1);
    let mut ast = Ast::new();

    let begin = expr(
        ExprKind::AddressOf(Box::new(expr(
            ExprKind::Index {
                base: Box::new(var_ref(a, arr_ty.clone())),
                index: Box::new(int64(0)),
            },
            i32_ty.clone(),
        ))),
        ptr_ty.clone(),
    );
    let end = binary(BinaryOp::Add, begin.clone(), int32(4), ptr_ty.clone());

    let body = ast.add_body(entry_body(
        "sliced",
        i32_ty.clone(),
        vec![
            Stmt::var_decl(
                a,
                "a",
                arr_ty.clone(),
                sp(),
                Some(expr(
                    ExprKind::ArrayInit {
                        elems: vec![int32(5), int32(6), int32(7), int32(8)],
                        elem_destructor: None,
                    },
                    arr_ty,
                )),
            ),
            Stmt::var_decl(
                s,
                "s",
                slice_ty.clone(),
                sp(),
                Some(expr(
                    ExprKind::MakeSlice {
                        begin: Box::new(begin),
                        end: Box::new(end),
                    },
                    slice_ty.clone(),
                )),
            ),
            ret(expr(
                ExprKind::Index {
                    base: Box::new(var_ref(s, slice_ty)),
                    index: Box::new(int64(2)),
                },
                i32_ty,
            )),
        ],
    ));

    let (result, sink) = eval(&ast, body);
    assert!(sink.diagnostics.is_empty());
    assert_eq!(result, Some(ConstValue::Sint(7)));
}

/// Heap round trip, and use-after-free detection.
#[test]
fn malloc_free_and_use_after_free() {
    let i64_ty = TypeSpec::Int(IntKind::I64);
    let ptr_ty = TypeSpec::pointer(i64_ty.clone());
    let p = VarId::from_u32(0);
    let out = VarId::from_u32(1);
    let mut ast = Ast::new();

    let malloc = expr(
        ExprKind::Builtin {
            op: BuiltinOp::Malloc,
            args: vec![int64(1)],
        },
        ptr_ty.clone(),
    );
    let deref_p = || {
        expr(
            ExprKind::Deref(Box::new(var_ref(p, ptr_ty.clone()))),
            i64_ty.clone(),
        )
    };
    let free = expr(
        ExprKind::Builtin {
            op: BuiltinOp::Free,
            args: vec![var_ref(p, ptr_ty.clone())],
        },
        TypeSpec::Unit,
    );

    let ok_body = ast.add_body(entry_body(
        "heap_roundtrip",
        i64_ty.clone(),
        vec![
            Stmt::var_decl(p, "p", ptr_ty.clone(), sp(), Some(malloc.clone())),
            Stmt::Expr(expr(
                ExprKind::Assign {
                    lhs: Box::new(deref_p()),
                    rhs: Box::new(int64(99)),
                },
                TypeSpec::Unit,
            )),
            Stmt::var_decl(out, "out", i64_ty.clone(), sp(), Some(deref_p())),
            Stmt::Expr(free.clone()),
            ret(var_ref(out, i64_ty.clone())),
        ],
    ));

    let bad_body = ast.add_body(entry_body(
        "use_after_free",
        i64_ty.clone(),
        vec![
            Stmt::var_decl(p, "p", ptr_ty.clone(), sp(), Some(malloc)),
            Stmt::Expr(free),
            ret(deref_p()),
        ],
    ));

    let (result, sink) = eval(&ast, ok_body);
    assert!(sink.diagnostics.is_empty());
    assert_eq!(result, Some(ConstValue::Sint(99)));

    let (result, sink) = eval(&ast, bad_body);
    assert_eq!(result, None);
    assert!(sink.has_errors());
}

fn add_poisoned_destructor(ast: &mut Ast) -> BodyId {
    // fn drop_loud(p: *i32) { let _ = 1 / 0; }
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let p = VarId::from_u32(0);
    ast.add_body(FunctionBody {
        name: "drop_loud".to_string(),
        span: sp(),
        params: vec![Param {
            id: p,
            name: "p".to_string(),
            ty: TypeSpec::pointer(i32_ty.clone()),
        }],
        return_type: TypeSpec::Unit,
        stmts: vec![Stmt::Expr(binary(
            BinaryOp::Div,
            int32(1),
            int32(0),
            i32_ty,
        ))],
    })
}

/// A variable destructor runs at scope exit (observable here by the error
/// its body raises).
#[test]
fn variable_destructor_runs_at_scope_exit() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let mut ast = Ast::new();
    let destructor = add_poisoned_destructor(&mut ast);
    let x = VarId::from_u32(0);
    let body = ast.add_body(entry_body(
        "dropped",
        i32_ty.clone(),
        vec![
            Stmt::VarDecl(VarDecl {
                id: x,
                name: "x".to_string(),
                ty: i32_ty.clone(),
                span: sp(),
                init: Some(int32(1)),
                destructor: Some(destructor),
                may_be_moved: false,
            }),
            ret(int32(0)),
        ],
    ));

    let (result, sink) = eval(&ast, body);
    // The destructor runs during return unwinding and divides by zero.
    assert_eq!(result, None);
    assert_eq!(sink.errors().next().unwrap().message, "division by zero");
}

/// Moving out of a variable lowers its move-destruct indicator, so the
/// destructor does not run.
#[test]
fn moved_from_variable_skips_its_destructor() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let mut ast = Ast::new();
    let destructor = add_poisoned_destructor(&mut ast);
    let x = VarId::from_u32(0);
    let y = VarId::from_u32(1);
    let body = ast.add_body(entry_body(
        "moved",
        i32_ty.clone(),
        vec![
            Stmt::VarDecl(VarDecl {
                id: x,
                name: "x".to_string(),
                ty: i32_ty.clone(),
                span: sp(),
                init: Some(int32(5)),
                destructor: Some(destructor),
                may_be_moved: true,
            }),
            Stmt::var_decl(
                y,
                "y",
                i32_ty.clone(),
                sp(),
                Some(expr(ExprKind::MoveVar(x), i32_ty.clone())),
            ),
            ret(var_ref(y, i32_ty)),
        ],
    ));

    let (result, sink) = eval(&ast, body);
    assert!(sink.diagnostics.is_empty());
    assert_eq!(result, Some(ConstValue::Sint(5)));
}

/// `defer` expressions run through the destruction stack at scope exit.
#[test]
fn defer_runs_at_scope_exit() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let mut ast = Ast::new();
    let body = ast.add_body(entry_body(
        "deferred",
        i32_ty.clone(),
        vec![
            Stmt::Defer {
                span: sp(),
                expr: binary(BinaryOp::Div, int32(1), int32(0), i32_ty.clone()),
            },
            ret(int32(3)),
        ],
    ));

    let (result, sink) = eval(&ast, body);
    assert_eq!(result, None);
    assert_eq!(sink.errors().next().unwrap().message, "division by zero");
}

/// Disabled warning families emit no check instructions at all.
#[test]
fn disabled_overflow_warning_emits_nothing() {
    use orec_session::WarningKind;
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let mut ast = Ast::new();
    let body = ast.add_body(entry_body(
        "silent",
        i32_ty.clone(),
        vec![ret(binary(
            BinaryOp::Add,
            int32(2_000_000_000),
            int32(2_000_000_000),
            i32_ty,
        ))],
    ));

    let mut sink = CollectingSink::new();
    let result = evaluate(
        &ast,
        TargetLayout::host_default(),
        WarningConfig::all().without(WarningKind::IntOverflow),
        EvalRequest {
            body,
            limits: ExecLimits::default(),
        },
        &mut sink,
    );
    assert!(sink.diagnostics.is_empty());
    assert_eq!(result, Some(ConstValue::Sint(-294_967_296)));
}

/// Math intrinsics report domain errors as warnings and still produce NaN.
#[test]
fn math_domain_warning() {
    use orec_ast::MathUnaryOp;
    let f64_ty = TypeSpec::Float(orec_ast::FloatKind::F64);
    let mut ast = Ast::new();
    let body = ast.add_body(entry_body(
        "sqrt_neg",
        f64_ty.clone(),
        vec![ret(expr(
            ExprKind::Builtin {
                op: BuiltinOp::MathUnary(MathUnaryOp::Sqrt),
                args: vec![expr(
                    ExprKind::Const(ConstValue::Float64(-1.0)),
                    f64_ty.clone(),
                )],
            },
            f64_ty,
        ))],
    ));

    let (result, sink) = eval(&ast, body);
    assert_eq!(sink.warnings().count(), 1);
    assert_eq!(sink.warnings().next().unwrap().message, "math domain error");
    match result {
        Some(ConstValue::Float64(value)) => assert!(value.is_nan()),
        other => panic!("expected a NaN result, got {:?}", other),
    }
}

/// Exceeding the instruction quota aborts with a diagnostic.
#[test]
fn runaway_evaluation_hits_the_quota() {
    let i64_ty = TypeSpec::Int(IntKind::I64);
    let mut ast = Ast::new();
    let body = ast.add_body(entry_body(
        "forever",
        i64_ty.clone(),
        vec![
            Stmt::While {
                span: sp(),
                cond: expr(ExprKind::Const(ConstValue::Bool(true)), TypeSpec::Bool),
                body: vec![Stmt::NoOp],
            },
            ret(int64(0)),
        ],
    ));

    let mut sink = CollectingSink::new();
    let result = evaluate(
        &ast,
        TargetLayout::host_default(),
        WarningConfig::all(),
        EvalRequest {
            body,
            limits: ExecLimits {
                max_call_depth: 16,
                max_instructions: 10_000,
            },
        },
        &mut sink,
    );
    assert_eq!(result, None);
    assert_eq!(
        sink.errors().next().unwrap().message,
        "constant evaluation quota exceeded"
    );
}

/// `__comptime_error` / `__comptime_warning` report the pointed-at string.
#[test]
fn comptime_error_and_warning_builtins()  {
    use orec_session::WarningKind;
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let mut ast = Ast::new();
    let literal = |text: &str| {
        expr(
            ExprKind::Const(ConstValue::String(text.to_string())),
            TypeSpec::Str,
        )
    };

    let failing = ast.add_body(entry_body(
        "failing",
        i32_ty.clone(),
        vec![
            Stmt::Expr(expr(
                ExprKind::Builtin {
                    op: BuiltinOp::ComptimeError,
                    args: vec![literal("custom failure")],
                },
                TypeSpec::Unit,
            )),
            ret(int32(1)),
        ],
    ));
    let warning = ast.add_body(entry_body(
        "warned",
        i32_ty.clone(),
        vec![
            Stmt::Expr(expr(
                ExprKind::Builtin {
                    op: BuiltinOp::ComptimeWarning(WarningKind::UnusedValue),
                    args: vec![literal("look here")],
                },
                TypeSpec::Unit,
            )),
            ret(int32(2)),
        ],
    ));

    let (result, sink) = eval(&ast, failing);
    assert_eq!(result, None);
    assert_eq!(sink.errors().next().unwrap().message, "custom failure");

    let (result, sink) = eval(&ast, warning);
    assert_eq!(result, Some(ConstValue::Sint(2)));
    assert_eq!(sink.warnings().next().unwrap().message, "look here");
}

/// A temporary wrapped with a destructor is destroyed at the end of its
/// statement's scope, before the function continues.
#[test]
fn temporary_destructor_runs_at_statement_end() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let mut ast = Ast::new();
    let destructor = add_poisoned_destructor(&mut ast);
    let body = ast.add_body(entry_body(
        "temp_dropped",
        i32_ty.clone(),
        vec![
            Stmt::Expr(expr(
                ExprKind::WithDestructor {
                    expr: Box::new(int32(9)),
                    destructor,
                },
                i32_ty.clone(),
            )),
            ret(int32(0)),
        ],
    ));

    let (result, sink) = eval(&ast, body);
    assert_eq!(result, None);
    assert_eq!(sink.errors().next().unwrap().message, "division by zero");
}

/// Copying an aggregate variable into another goes through memcpy, and an
/// uninitialized variable reads as zeroed storage.
#[test]
fn aggregate_copies_and_zero_initialization() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let arr_ty = TypeSpec::array(3, i32_ty.clone());
    let a = VarId::from_u32(0);
    let b = VarId::from_u32(1);
    let z = VarId::from_u32(2);
    let mut ast = Ast::new();

    let copied = ast.add_body(entry_body(
        "copied",
        i32_ty.clone(),
        vec![
            Stmt::var_decl(
                a,
                "a",
                arr_ty.clone(),
                sp(),
                Some(expr(
                    ExprKind::ArrayInit {
                        elems: vec![int32(4), int32(5), int32(6)],
                        elem_destructor: None,
                    },
                    arr_ty.clone(),
                )),
            ),
            Stmt::var_decl(b, "b", arr_ty.clone(), sp(), Some(var_ref(a, arr_ty.clone()))),
            ret(expr(
                ExprKind::Index {
                    base: Box::new(var_ref(b, arr_ty.clone())),
                    index: Box::new(int64(1)),
                },
                i32_ty.clone(),
            )),
        ],
    ));

    let zeroed = ast.add_body(entry_body(
        "zeroed",
        i32_ty.clone(),
        vec![
            Stmt::var_decl(z, "z", arr_ty.clone(), sp(), None),
            ret(expr(
                ExprKind::Index {
                    base: Box::new(var_ref(z, arr_ty)),
                    index: Box::new(int64(2)),
                },
                i32_ty,
            )),
        ],
    ));

    let (result, sink) = eval(&ast, copied);
    assert!(sink.diagnostics.is_empty());
    assert_eq!(result, Some(ConstValue::Sint(5)));

    let (result, sink) = eval(&ast, zeroed);
    assert!(sink.diagnostics.is_empty());
    assert_eq!(result, Some(ConstValue::Sint(0)));
}

/// Falling off the end of a function with a return type is reported by the
/// error instruction codegen plants there.
#[test]
fn falling_off_a_valued_function_is_an_error() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let mut ast = Ast::new();
    let body = ast.add_body(entry_body("no_return", i32_ty, vec![Stmt::NoOp]));

    let (result, sink) = eval(&ast, body);
    assert_eq!(result, None);
    assert_eq!(
        sink.errors().next().unwrap().message,
        "execution reached the end of a function with a return type"
    );
}

/// `for (i = 0; i < 5; i = i + 1) total = total + i;`
#[test]
fn for_loop_with_init_cond_and_step() {
    let i64_ty = TypeSpec::Int(IntKind::I64);
    let i = VarId::from_u32(0);
    let total = VarId::from_u32(1);
    let mut ast = Ast::new();

    let body = ast.add_body(entry_body(
        "for_sum",
        i64_ty.clone(),
        vec![
            Stmt::var_decl(total, "total", i64_ty.clone(), sp(), Some(int64(0))),
            Stmt::For {
                span: sp(),
                init: Some(Box::new(Stmt::var_decl(
                    i,
                    "i",
                    i64_ty.clone(),
                    sp(),
                    Some(int64(0)),
                ))),
                cond: Some(binary(
                    BinaryOp::Lt,
                    var_ref(i, i64_ty.clone()),
                    int64(5),
                    TypeSpec::Bool,
                )),
                step: Some(expr(
                    ExprKind::Assign {
                        lhs: Box::new(var_ref(i, i64_ty.clone())),
                        rhs: Box::new(binary(
                            BinaryOp::Add,
                            var_ref(i, i64_ty.clone()),
                            int64(1),
                            i64_ty.clone(),
                        )),
                    },
                    TypeSpec::Unit,
                )),
                body: vec![Stmt::Expr(expr(
                    ExprKind::Assign {
                        lhs: Box::new(var_ref(total, i64_ty.clone())),
                        rhs: Box::new(binary(
                            BinaryOp::Add,
                            var_ref(total, i64_ty.clone()),
                            var_ref(i, i64_ty.clone()),
                            i64_ty.clone(),
                        )),
                    },
                    TypeSpec::Unit,
                ))],
            },
            ret(var_ref(total, i64_ty)),
        ],
    ));

    let (result, sink) = eval(&ast, body);
    assert!(sink.diagnostics.is_empty());
    assert_eq!(result, Some(ConstValue::Sint(10)));
}

/// Ordering comparisons of pointers into the same object, including its
/// one-past-the-end marker; unrelated pointers fail.
#[test]
fn pointer_ordering_comparisons() {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let ptr_ty = TypeSpec::pointer(i32_ty.clone());
    let arr_ty = TypeSpec::array(3, i32_ty.clone());
    let a = VarId::from_u32(0);
    let b = VarId::from_u32(1);
    let p = VarId::from_u32(2);
    let mut ast = Ast::new();

    let addr_of_elem = |var: VarId, index: i64| {
        expr(
            ExprKind::AddressOf(Box::new(expr(
                ExprKind::Index {
                    base: Box::new(var_ref(var, arr_ty.clone())),
                    index: Box::new(int64(index)),
                },
                i32_ty.clone(),
            ))),
            ptr_ty.clone(),
        )
    };
    let array_init = || {
        expr(
            ExprKind::ArrayInit {
                elems: vec![int32(1), int32(2), int32(3)],
                elem_destructor: None,
            },
            arr_ty.clone(),
        )
    };

    // p < p + 3 within one object.
    let in_object = ast.add_body(entry_body(
        "ordered",
        TypeSpec::Bool,
        vec![
            Stmt::var_decl(a, "a", arr_ty.clone(), sp(), Some(array_init())),
            Stmt::var_decl(p, "p", ptr_ty.clone(), sp(), Some(addr_of_elem(a, 0))),
            ret(binary(
                BinaryOp::Lt,
                var_ref(p, ptr_ty.clone()),
                binary(
                    BinaryOp::Add,
                    var_ref(p, ptr_ty.clone()),
                    int32(3),
                    ptr_ty.clone(),
                ),
                TypeSpec::Bool,
            )),
        ],
    ));

    // Ordering across two distinct objects is an error.
    let unrelated = ast.add_body(entry_body(
        "unrelated",
        TypeSpec::Bool,
        vec![
            Stmt::var_decl(a, "a", arr_ty.clone(), sp(), Some(array_init())),
            Stmt::var_decl(b, "b", arr_ty.clone(), sp(), Some(array_init())),
            ret(binary(
                BinaryOp::Lt,
                addr_of_elem(a, 0),
                addr_of_elem(b, 0),
                TypeSpec::Bool,
            )),
        ],
    ));

    let (result, sink) = eval(&ast, in_object);
    assert!(sink.diagnostics.is_empty());
    assert_eq!(result, Some(ConstValue::Bool(true)));

    let (result, sink) = eval(&ast, unrelated);
    assert_eq!(result, None);
    assert_eq!(
        sink.errors().next().unwrap().message,
        "comparing pointers into different objects"
    );
}
