//! Top-level consteval entry point.
//!
//! `evaluate` drives the whole pipeline for one resolved body: lower it
//! (and everything it calls) to IR, execute it, and materialize the result
//! object back into a constant value. Errors abort and yield no constant;
//! warnings are routed to the sink either way.

use orec_abi::target::TargetLayout;
use orec_ast::{Ast, BodyId, ConstValue, TypeSpec};
use orec_codegen::consts::const_value_from_object;
use orec_codegen::CodegenCtx;
use orec_ir::function::AllocaDecl;
use orec_ir::value::InstrValue;
use orec_memory::Ptr;
use orec_session::{DiagnosticSink, WarningConfig};
use tracing::{debug, instrument};

use crate::exec::{ExecLimits, ExecutorContext};

/// One consteval request: a resolved, parameterless body whose return value
/// becomes a source-level constant.
pub struct EvalRequest {
    pub body: BodyId,
    pub limits: ExecLimits,
}

#[instrument(level = "debug", skip_all, fields(body = %ast.body(request.body).name))]
pub fn evaluate(
    ast: &Ast,
    machine: TargetLayout,
    warnings: WarningConfig,
    request: EvalRequest,
    sink: &mut dyn DiagnosticSink,
) -> Option<ConstValue> {
    let body = ast.body(request.body);
    assert!(
        body.params.is_empty(),
        "a consteval entry body takes no parameters"
    );
    let result_spec = body.return_type.clone();

    let mut ctx = CodegenCtx::new(machine, warnings, ast);
    let func_idx = orec_codegen::generate_function(&mut ctx, request.body);
    let result_ty = ctx.lower_type(&result_spec);
    let (type_set, global_memory, functions) = ctx.into_functions();

    let mut executor =
        ExecutorContext::new(&type_set, &global_memory, &functions, request.limits, sink);
    let func = &functions[func_idx];

    let result = if type_set.is_simple_value_type(result_ty) {
        let value = executor.execute_function(func, &[]).ok()?;
        scalar_const_value(&result_spec, value)
    } else if type_set.size_of(result_ty).bytes() == 0 {
        executor.execute_function(func, &[]).ok()?;
        Ok(ConstValue::Unit)
    } else {
        // The result object lives in a synthetic caller frame; the callee
        // receives its address as the hidden first argument.
        let addresses = match executor.memory.push_frame(&[AllocaDecl {
            ty: result_ty,
            has_lifetime: false,
        }]) {
            Ok(addresses) => addresses,
            Err(error) => {
                sink.report(orec_session::Diagnostic::error(body.span, error.to_string()));
                return None;
            }
        };
        let result_ptr = addresses[0];
        executor
            .execute_function(func, &[InstrValue::from_ptr(result_ptr)])
            .ok()?;

        let size = type_set.size_of(result_ty).bytes();
        let bytes = executor
            .memory
            .get_memory_raw(Ptr(result_ptr), size)
            .map_err(|error| error.to_string())
            .and_then(|bytes| {
                const_value_from_object(&executor.memory, &result_spec, result_ty, bytes)
            });
        bytes
    };

    debug!(succeeded = result.is_ok(), "consteval finished");
    match result {
        Ok(value) => Some(value),
        Err(message) => {
            sink.report(orec_session::Diagnostic::error(
                body.span,
                format!("result of constant evaluation is not a constant: {}", message),
            ));
            None
        }
    }
}

fn scalar_const_value(spec: &TypeSpec, value: InstrValue) -> Result<ConstValue, String> {
    match spec {
        TypeSpec::Bool => Ok(ConstValue::Bool(value.as_i1())),
        TypeSpec::Int(kind) => {
            let width = kind.bit_width();
            if kind.is_signed() {
                let signed = match width {
                    8 => value.as_u8() as i8 as i64,
                    16 => value.as_u16() as i16 as i64,
                    32 => value.as_u32() as i32 as i64,
                    _ => value.as_u64() as i64,
                };
                Ok(ConstValue::Sint(signed))
            } else {
                let unsigned = match width {
                    8 => value.as_u8() as u64,
                    16 => value.as_u16() as u64,
                    32 => value.as_u32() as u64,
                    _ => value.as_u64(),
                };
                Ok(ConstValue::Uint(unsigned))
            }
        }
        TypeSpec::Char => Ok(ConstValue::Char(value.as_u32())),
        TypeSpec::Float(orec_ast::FloatKind::F32) => Ok(ConstValue::Float32(value.as_f32())),
        TypeSpec::Float(orec_ast::FloatKind::F64) => Ok(ConstValue::Float64(value.as_f64())),
        TypeSpec::Enum { underlying } => Ok(ConstValue::Enum {
            underlying: *underlying,
            value: value.as_u64(),
        }),
        TypeSpec::Pointer(_) | TypeSpec::Optional(_) => {
            if value.as_ptr() == 0 {
                Ok(ConstValue::Null)
            } else {
                Err("a pointer into evaluation memory cannot be a constant".to_string())
            }
        }
        other => Err(format!("type {:?} has no scalar representation", other)),
    }
}
