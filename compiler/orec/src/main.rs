// OREC_LOG_FILTER=debug cargo run
//
// Drives the compile-time evaluation pipeline over a couple of
// hand-assembled resolved bodies, the same way the front-end would once
// name resolution hands them over:
//
// ```
// consteval fact5   = fact(5);
// consteval greeting = "héllo";
// consteval answer  = { let x: i32 = 2_000_000_000 + 2_000_000_000; x };
// ```

use anyhow::Result;
use orec_abi::target::TargetLayout;
use orec_ast::{
    Ast, BinaryOp, BodyId, ConstValue, Expr, ExprKind, FunctionBody, IntKind, Param, Stmt,
    TypeSpec, VarId,
};
use orec_interp::{evaluate, EvalRequest, ExecLimits};
use orec_session::{CollectingSink, SrcSpan, WarningConfig};
use tracing::debug;

fn main() -> Result<()> {
    init_orec_logger();
    debug!("logging initialized");

    let mut ast = Ast::new();
    let fact = add_factorial(&mut ast);
    let entries = vec![
        ("fact(5)", add_entry_fact5(&mut ast, fact)),
        ("\"héllo\"", add_entry_greeting(&mut ast)),
        ("2_000_000_000 + 2_000_000_000", add_entry_overflow(&mut ast)),
    ];

    let machine = TargetLayout::host_default();
    for (label, body) in &entries {
        let mut sink = CollectingSink::new();
        let result = evaluate(
            &ast,
            machine,
            WarningConfig::all(),
            EvalRequest {
                body: *body,
                limits: ExecLimits::default(),
            },
            &mut sink,
        );

        println!("consteval {label}");
        for diagnostic in &sink.diagnostics {
            println!("  [{:?}] {}", diagnostic.severity, diagnostic.message);
        }
        match result {
            Some(value) => println!("  = {:?}", value),
            None => println!("  (no constant produced)"),
        }
    }

    if matches!(std::env::var("OREC_DUMP_IR"), Ok(ref v) if v == "1") {
        let mut ctx = orec_codegen::CodegenCtx::new(machine, WarningConfig::all(), &ast);
        for (label, body) in &entries {
            let func = orec_codegen::generate_function(&mut ctx, *body);
            println!("; {label}");
            println!("{}", ctx.function(func).display());
        }
    }

    Ok(())
}

fn span() -> SrcSpan {
    SrcSpan::synthetic()
}

fn int_expr(value: i64, ty: TypeSpec) -> Expr {
    Expr::new(ExprKind::Const(ConstValue::Sint(value)), ty, span())
}

/// `fn fact(n: i64) -> i64 { return n <= 1 ? 1 : n * fact(n - 1); }`
fn add_factorial(ast: &mut Ast) -> BodyId {
    let i64_ty = TypeSpec::Int(IntKind::I64);
    let n = VarId::from_u32(0);
    // Bodies are interned before their callees resolve, so the recursive
    // call can reference the body's own (pre-assigned) id.
    let fact_id = BodyId::from_u32(ast.bodies.len() as u32);

    let n_ref = || Expr::new(ExprKind::VarRef(n), i64_ty.clone(), span());
    let cond = Expr::new(
        ExprKind::BinaryOp {
            op: BinaryOp::Lte,
            lhs: Box::new(n_ref()),
            rhs: Box::new(int_expr(1, i64_ty.clone())),
        },
        TypeSpec::Bool,
        span(),
    );
    let n_minus_1 = Expr::new(
        ExprKind::BinaryOp {
            op: BinaryOp::Sub,
            lhs: Box::new(n_ref()),
            rhs: Box::new(int_expr(1, i64_ty.clone())),
        },
        i64_ty.clone(),
        span(),
    );
    let recursive = Expr::new(
        ExprKind::Call {
            callee: fact_id,
            args: vec![n_minus_1],
        },
        i64_ty.clone(),
        span(),
    );
    let product = Expr::new(
        ExprKind::BinaryOp {
            op: BinaryOp::Mul,
            lhs: Box::new(n_ref()),
            rhs: Box::new(recursive),
        },
        i64_ty.clone(),
        span(),
    );
    let ternary = Expr::new(
        ExprKind::Conditional {
            cond: Box::new(cond),
            then_expr: Box::new(int_expr(1, i64_ty.clone())),
            else_expr: Some(Box::new(product)),
        },
        i64_ty.clone(),
        span(),
    );

    ast.add_body(FunctionBody {
        name: "fact".to_string(),
        span: span(),
        params: vec![Param {
            id: n,
            name: "n".to_string(),
            ty: i64_ty.clone(),
        }],
        return_type: i64_ty,
        stmts: vec![Stmt::Return {
            span: span(),
            value: Some(ternary),
        }],
    })
}

fn add_entry_fact5(ast: &mut Ast, fact: BodyId) -> BodyId {
    let i64_ty = TypeSpec::Int(IntKind::I64);
    let call = Expr::new(
        ExprKind::Call {
            callee: fact,
            args: vec![int_expr(5, i64_ty.clone())],
        },
        i64_ty.clone(),
        span(),
    );
    ast.add_body(FunctionBody {
        name: "fact5".to_string(),
        span: span(),
        params: vec![],
        return_type: i64_ty,
        stmts: vec![Stmt::Return {
            span: span(),
            value: Some(call),
        }],
    })
}

fn add_entry_greeting(ast: &mut Ast) -> BodyId {
    let literal = Expr::new(
        ExprKind::Const(ConstValue::String("héllo".to_string())),
        TypeSpec::Str,
        span(),
    );
    ast.add_body(FunctionBody {
        name: "greeting".to_string(),
        span: span(),
        params: vec![],
        return_type: TypeSpec::Str,
        stmts: vec![Stmt::Return {
            span: span(),
            value: Some(literal),
        }],
    })
}

fn add_entry_overflow(ast: &mut Ast) -> BodyId {
    let i32_ty = TypeSpec::Int(IntKind::I32);
    let x = VarId::from_u32(0);
    let sum = Expr::new(
        ExprKind::BinaryOp {
            op: BinaryOp::Add,
            lhs: Box::new(int_expr(2_000_000_000, i32_ty.clone())),
            rhs: Box::new(int_expr(2_000_000_000, i32_ty.clone())),
        },
        i32_ty.clone(),
        span(),
    );
    ast.add_body(FunctionBody {
        name: "answer".to_string(),
        span: span(),
        params: vec![],
        return_type: i32_ty.clone(),
        stmts: vec![
            Stmt::var_decl(x, "x", i32_ty.clone(), span(), Some(sum)),
            Stmt::Return {
                span: span(),
                value: Some(Expr::new(ExprKind::VarRef(x), i32_ty, span())),
            },
        ],
    })
}

/// Initialize the logger for the orec binary.
fn init_orec_logger() {
    if let Err(err) = orec_log::Logger::init_logger(orec_log::LoggerConfig::from_env("OREC_LOG")) {
        eprintln!("Error initializing logger: {:?}", err);
        std::process::exit(1);
    }
}
