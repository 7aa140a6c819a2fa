//! Byte-exact conversion between constant values and object buffers.
//!
//! `object_from_const_value` is what codegen uses to materialize constants
//! into global memory; `const_value_from_object` is the reverse reader that
//! materializes a consteval result back out of executor memory. Both follow
//! the machine's byte order through the same helpers the executor's
//! load/store instructions use, which is what makes the round-trip exact.

use orec_ast::{ConstValue, TypeSpec};
use orec_ir::ty::{TypeIdx, TypeKind};
use orec_memory::endian;
use orec_memory::{MemoryManager, Ptr};

use crate::context::CodegenCtx;

/// Serializes `value` into a fresh buffer laid out as `ty`.
pub fn object_from_const_value(
    ctx: &mut CodegenCtx<'_>,
    value: &ConstValue,
    spec: &TypeSpec,
    ty: TypeIdx,
) -> Vec<u8> {
    let size = ctx.type_set.size_of(ty).bytes() as usize;
    let mut buffer = vec![0u8; size];
    write_const_value(ctx, value, spec, ty, &mut buffer);
    buffer
}

fn write_const_value(
    ctx: &mut CodegenCtx<'_>,
    value: &ConstValue,
    spec: &TypeSpec,
    ty: TypeIdx,
    buffer: &mut [u8],
) {
    let endianness = ctx.machine.endianness;
    let pointer_bytes = ctx.machine.pointer_size().bytes();

    match value {
        ConstValue::Unit => {}
        ConstValue::Bool(value) => buffer[0] = *value as u8,
        ConstValue::Sint(value) => {
            write_int(buffer, *value as u64, ctx.type_set.size_of(ty).bytes(), endianness)
        }
        ConstValue::Uint(value) | ConstValue::Enum { value, .. } => {
            write_int(buffer, *value, ctx.type_set.size_of(ty).bytes(), endianness)
        }
        ConstValue::Char(value) => endian::write_u32(buffer, *value, endianness),
        ConstValue::Float32(value) => endian::write_f32(buffer, *value, endianness),
        ConstValue::Float64(value) => endian::write_f64(buffer, *value, endianness),
        ConstValue::Null => {
            // The null pointer, the empty pointer-like optional, or the
            // empty aggregate optional; zeroed storage covers all three.
            buffer.fill(0);
        }
        ConstValue::String(text) => {
            let (begin, end) = if text.is_empty() {
                (0u64, 0u64)
            } else {
                let bytes = text.as_bytes().to_vec();
                let len = bytes.len() as u64;
                let u8_ty = ctx.type_set.builtin_type(orec_ir::ty::BuiltinKind::I8);
                let array_ty = ctx.type_set.array_type(u8_ty, len);
                let align = ctx.type_set.align_of(array_ty);
                let global = ctx.global_memory.add_object(array_ty, align, bytes);
                let begin = ctx.global_memory.object(global).address;
                (begin, begin + len)
            };
            endian::write_ptr(buffer, begin, pointer_bytes, endianness);
            endian::write_ptr(
                &mut buffer[pointer_bytes as usize..],
                end,
                pointer_bytes,
                endianness,
            );
        }
        ConstValue::Array(elems) => {
            let (elem_ty, len) = ctx.type_set.array_parts(ty);
            debug_assert_eq!(elems.len() as u64, len);
            let elem_spec = match spec {
                TypeSpec::Array(_, elem) => elem.as_ref().clone(),
                other => unreachable!("array constant of type {:?}", other),
            };
            let stride = ctx.type_set.size_of(elem_ty).bytes() as usize;
            for (index, elem) in elems.iter().enumerate() {
                let chunk = &mut buffer[index * stride..(index + 1) * stride];
                write_const_value(ctx, elem, &elem_spec, elem_ty, chunk);
            }
        }
        ConstValue::Tuple(elems) => {
            let member_specs = match spec {
                TypeSpec::Tuple(members) => members.clone(),
                other => unreachable!("tuple constant of type {:?}", other),
            };
            let (members, offsets) = {
                let (members, offsets) = ctx.type_set.aggregate_members(ty);
                (members.to_vec(), offsets.to_vec())
            };
            for (((elem, member_spec), member_ty), offset) in elems
                .iter()
                .zip(&member_specs)
                .zip(members)
                .zip(offsets)
            {
                let size = ctx.type_set.size_of(member_ty).bytes() as usize;
                let chunk = &mut buffer[offset as usize..offset as usize + size];
                write_const_value(ctx, elem, member_spec, member_ty, chunk);
            }
        }
        ConstValue::Optional(inner) => match spec {
            TypeSpec::Optional(payload) if payload.is_pointer() => {
                write_const_value(ctx, inner, payload, ty, buffer);
            }
            TypeSpec::Optional(payload) => {
                let (members, offsets) = {
                    let (members, offsets) = ctx.type_set.aggregate_members(ty);
                    (members.to_vec(), offsets.to_vec())
                };
                write_const_value(ctx, inner, payload, members[0], buffer);
                buffer[offsets[1] as usize] = 1;
            }
            other => unreachable!("optional constant of type {:?}", other),
        },
    }
}

fn write_int(buffer: &mut [u8], value: u64, size: u64, endianness: orec_abi::target::Endianness) {
    match size {
        1 => endian::write_u8(buffer, value as u8),
        2 => endian::write_u16(buffer, value as u16, endianness),
        4 => endian::write_u32(buffer, value as u32, endianness),
        8 => endian::write_u64(buffer, value, endianness),
        other => unreachable!("integer of size {}", other),
    }
}

fn read_int(buffer: &[u8], size: u64, endianness: orec_abi::target::Endianness) -> u64 {
    match size {
        1 => endian::read_u8(buffer) as u64,
        2 => endian::read_u16(buffer, endianness) as u64,
        4 => endian::read_u32(buffer, endianness) as u64,
        8 => endian::read_u64(buffer, endianness),
        other => unreachable!("integer of size {}", other),
    }
}

fn sign_extend(value: u64, size: u64) -> i64 {
    match size {
        1 => value as u8 as i8 as i64,
        2 => value as u16 as i16 as i64,
        4 => value as u32 as i32 as i64,
        _ => value as i64,
    }
}

/// Reads an object buffer back into a constant value, following string
/// pointers through `memory`. Fails on values that cannot become source
/// constants (live non-null pointers, malformed UTF-8).
pub fn const_value_from_object(
    memory: &MemoryManager<'_>,
    spec: &TypeSpec,
    ty: TypeIdx,
    buffer: &[u8],
) -> Result<ConstValue, String> {
    let type_set = memory.type_set();
    let target = type_set.target();
    let endianness = target.endianness;
    let pointer_bytes = target.pointer_size().bytes();
    let size = type_set.size_of(ty).bytes();

    match spec {
        TypeSpec::Unit => Ok(ConstValue::Unit),
        TypeSpec::Bool => Ok(ConstValue::Bool(buffer[0] != 0)),
        TypeSpec::Int(kind) => {
            let raw = read_int(buffer, size, endianness);
            if kind.is_signed() {
                Ok(ConstValue::Sint(sign_extend(raw, size)))
            } else {
                Ok(ConstValue::Uint(raw))
            }
        }
        TypeSpec::Enum { underlying } => {
            let raw = read_int(buffer, size, endianness);
            Ok(ConstValue::Enum {
                underlying: *underlying,
                value: raw,
            })
        }
        TypeSpec::Char => Ok(ConstValue::Char(endian::read_u32(buffer, endianness))),
        TypeSpec::Float(orec_ast::FloatKind::F32) => {
            Ok(ConstValue::Float32(endian::read_f32(buffer, endianness)))
        }
        TypeSpec::Float(orec_ast::FloatKind::F64) => {
            Ok(ConstValue::Float64(endian::read_f64(buffer, endianness)))
        }
        TypeSpec::Str => {
            let begin = endian::read_ptr(buffer, pointer_bytes, endianness);
            let end = endian::read_ptr(&buffer[pointer_bytes as usize..], pointer_bytes, endianness);
            if begin == 0 && end == 0 {
                return Ok(ConstValue::String(String::new()));
            }
            let len = memory
                .ptr_diff(Ptr(end), Ptr(begin), 1)
                .map_err(|err| err.to_string())?;
            if len < 0 {
                return Err("string end pointer precedes its begin pointer".to_string());
            }
            let bytes = memory
                .get_memory_raw(Ptr(begin), len as u64)
                .map_err(|err| err.to_string())?;
            String::from_utf8(bytes.to_vec())
                .map(ConstValue::String)
                .map_err(|_| "string constant is not valid UTF-8".to_string())
        }
        TypeSpec::Pointer(_) => {
            let raw = endian::read_ptr(buffer, pointer_bytes, endianness);
            if raw == 0 {
                Ok(ConstValue::Null)
            } else {
                Err("a pointer into evaluation memory cannot be a constant".to_string())
            }
        }
        TypeSpec::Optional(payload) if payload.is_pointer() => {
            let raw = endian::read_ptr(buffer, pointer_bytes, endianness);
            if raw == 0 {
                Ok(ConstValue::Null)
            } else {
                Err("a pointer into evaluation memory cannot be a constant".to_string())
            }
        }
        TypeSpec::Optional(payload) => {
            let (members, offsets) = type_set.aggregate_members(ty);
            let flag = buffer[offsets[1] as usize] != 0;
            if !flag {
                return Ok(ConstValue::Null);
            }
            let payload_ty = members[0];
            let payload_size = type_set.size_of(payload_ty).bytes() as usize;
            let inner = const_value_from_object(memory, payload, payload_ty, &buffer[..payload_size])?;
            Ok(ConstValue::Optional(Box::new(inner)))
        }
        TypeSpec::Array(_, elem_spec) => {
            let (elem_ty, len) = type_set.array_parts(ty);
            let stride = type_set.size_of(elem_ty).bytes() as usize;
            let mut elems = Vec::with_capacity(len as usize);
            for index in 0..len as usize {
                let chunk = &buffer[index * stride..(index + 1) * stride];
                elems.push(const_value_from_object(memory, elem_spec, elem_ty, chunk)?);
            }
            Ok(ConstValue::Array(elems))
        }
        TypeSpec::Tuple(member_specs) => {
            let (members, offsets) = {
                let (members, offsets) = type_set.aggregate_members(ty);
                (members.to_vec(), offsets.to_vec())
            };
            let mut elems = Vec::with_capacity(members.len());
            for ((member_spec, member_ty), offset) in
                member_specs.iter().zip(members).zip(offsets)
            {
                let member_size = type_set.size_of(member_ty).bytes() as usize;
                let chunk = &buffer[offset as usize..offset as usize + member_size];
                elems.push(const_value_from_object(memory, member_spec, member_ty, chunk)?);
            }
            Ok(ConstValue::Tuple(elems))
        }
        TypeSpec::Slice(_) => {
            Err("a slice into evaluation memory cannot be a constant".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orec_abi::target::{Endianness, PointerWidth, TargetLayout};
    use orec_ast::{Ast, IntKind, TypeSpec};
    use orec_session::WarningConfig;

    fn roundtrip(value: ConstValue, spec: TypeSpec, target: TargetLayout) -> ConstValue {
        let ast = Ast::new();
        let mut ctx = CodegenCtx::new(target, WarningConfig::all(), &ast);
        let ty = ctx.lower_type(&spec);
        let buffer = object_from_const_value(&mut ctx, &value, &spec, ty);
        let memory = MemoryManager::new(&ctx.type_set, &ctx.global_memory);
        const_value_from_object(&memory, &spec, ty, &buffer).unwrap()
    }

    #[test]
    fn scalar_roundtrips_both_orders() {
        for target in [
            TargetLayout::new(PointerWidth::Bits64, Endianness::Little),
            TargetLayout::new(PointerWidth::Bits64, Endianness::Big),
        ] {
            let value = ConstValue::Sint(-123456);
            assert_eq!(
                roundtrip(value.clone(), TypeSpec::Int(IntKind::I64), target),
                value
            );
            let value = ConstValue::Uint(0xfedc);
            assert_eq!(
                roundtrip(value.clone(), TypeSpec::Int(IntKind::U16), target),
                value
            );
            let value = ConstValue::Float64(-0.5);
            assert_eq!(
                roundtrip(
                    value.clone(),
                    TypeSpec::Float(orec_ast::FloatKind::F64),
                    target
                ),
                value
            );
            let value = ConstValue::Bool(true);
            assert_eq!(roundtrip(value.clone(), TypeSpec::Bool, target), value);
        }
    }

    #[test]
    fn negative_narrow_ints_sign_extend() {
        let target = TargetLayout::host_default();
        let value = ConstValue::Sint(-5);
        assert_eq!(
            roundtrip(value.clone(), TypeSpec::Int(IntKind::I8), target),
            value
        );
    }

    #[test]
    fn aggregate_roundtrip() {
        let target = TargetLayout::new(PointerWidth::Bits64, Endianness::Big);
        let spec = TypeSpec::Tuple(vec![
            TypeSpec::Int(IntKind::U8),
            TypeSpec::Int(IntKind::I32),
            TypeSpec::Array(3, Box::new(TypeSpec::Int(IntKind::I16))),
        ]);
        let value = ConstValue::Tuple(vec![
            ConstValue::Uint(7),
            ConstValue::Sint(-40),
            ConstValue::Array(vec![
                ConstValue::Sint(1),
                ConstValue::Sint(-2),
                ConstValue::Sint(3),
            ]),
        ]);
        assert_eq!(roundtrip(value.clone(), spec, target), value);
    }

    #[test]
    fn string_roundtrip_follows_global_pointers() {
        let target = TargetLayout::host_default();
        let value = ConstValue::String("héllo".to_string());
        assert_eq!(roundtrip(value.clone(), TypeSpec::Str, target), value);
        let empty = ConstValue::String(String::new());
        assert_eq!(roundtrip(empty.clone(), TypeSpec::Str, target), empty);
    }

    #[test]
    fn optional_roundtrip() {
        let target = TargetLayout::host_default();
        let spec = TypeSpec::optional(TypeSpec::Int(IntKind::I32));
        let value = ConstValue::Optional(Box::new(ConstValue::Sint(17)));
        assert_eq!(roundtrip(value.clone(), spec.clone(), target), value);
        assert_eq!(roundtrip(ConstValue::Null, spec, target), ConstValue::Null);
    }

    #[test]
    fn enum_uses_underlying_width() {
        let ast = Ast::new();
        let target = TargetLayout::new(PointerWidth::Bits64, Endianness::Little);
        let mut ctx = CodegenCtx::new(target, WarningConfig::all(), &ast);
        let spec = TypeSpec::Enum {
            underlying: IntKind::U16,
        };
        let ty = ctx.lower_type(&spec);
        let value = ConstValue::Enum {
            underlying: IntKind::U16,
            value: 0x0102,
        };
        let buffer = object_from_const_value(&mut ctx, &value, &spec, ty);
        assert_eq!(buffer, vec![0x02, 0x01]);
    }
}
