//! The `create_*` builder vocabulary, one entry point per instruction
//! family.
//!
//! Every builder appends to the current block (opening a fresh block first
//! if the current one is already terminated), records unresolved operands
//! for finalization, and returns an [`ExprValue`] for the caller to
//! consume. Checked variants consult the warning configuration for their
//! family and emit nothing when it is disabled; check families whose
//! failure is a hard error are emitted unconditionally.

use orec_ast::{BodyId, MathBinaryOp, MathUnaryOp};
use orec_ir::function::{
    AccessCheckInfo, CallArgsIdx, FuncIdx, GlobalIdx, InstIdx, PtrArithCheckInfo, SliceCheckInfo,
    SwitchIdx, ValueIdx,
};
use orec_ir::inst::Instruction;
use orec_ir::ty::{BuiltinKind, TypeIdx};
use orec_ir::value::ValueType;
use orec_memory::endian;
use orec_session::{SrcSpan, WarningKind};

use crate::context::{BlockRef, CodegenCtx, ExprValue, InstrRef};

const A0: [ValueIdx; 0] = [];
const A1: [ValueIdx; 1] = [ValueIdx::UNRESOLVED; 1];
const A2: [ValueIdx; 2] = [ValueIdx::UNRESOLVED; 2];
const A3: [ValueIdx; 3] = [ValueIdx::UNRESOLVED; 3];

const NO_DEST: InstIdx = InstIdx::from_u32(u32::MAX);

impl<'a> CodegenCtx<'a> {
    fn value_type(&self, ty: TypeIdx) -> ValueType {
        self.type_set.value_type_of(ty)
    }

    ////////// constants //////////

    pub fn create_const_i1(&mut self, value: bool) -> ExprValue {
        let ty = self.type_set.builtin_type(BuiltinKind::I1);
        let inst = self.add_inst(Instruction::ConstI1 { args: A0, value });
        ExprValue::new_value(inst, ty)
    }

    pub fn create_const_i8(&mut self, value: i8) -> ExprValue {
        let ty = self.type_set.builtin_type(BuiltinKind::I8);
        let inst = self.add_inst(Instruction::ConstI8 { args: A0, value });
        ExprValue::new_value(inst, ty)
    }

    pub fn create_const_i16(&mut self, value: i16) -> ExprValue {
        let ty = self.type_set.builtin_type(BuiltinKind::I16);
        let inst = self.add_inst(Instruction::ConstI16 { args: A0, value });
        ExprValue::new_value(inst, ty)
    }

    pub fn create_const_i32(&mut self, value: i32) -> ExprValue {
        let ty = self.type_set.builtin_type(BuiltinKind::I32);
        let inst = self.add_inst(Instruction::ConstI32 { args: A0, value });
        ExprValue::new_value(inst, ty)
    }

    pub fn create_const_i64(&mut self, value: i64) -> ExprValue {
        let ty = self.type_set.builtin_type(BuiltinKind::I64);
        let inst = self.add_inst(Instruction::ConstI64 { args: A0, value });
        ExprValue::new_value(inst, ty)
    }

    pub fn create_const_u8(&mut self, value: u8) -> ExprValue {
        let ty = self.type_set.builtin_type(BuiltinKind::I8);
        let inst = self.add_inst(Instruction::ConstU8 { args: A0, value });
        ExprValue::new_value(inst, ty)
    }

    pub fn create_const_u16(&mut self, value: u16) -> ExprValue {
        let ty = self.type_set.builtin_type(BuiltinKind::I16);
        let inst = self.add_inst(Instruction::ConstU16 { args: A0, value });
        ExprValue::new_value(inst, ty)
    }

    pub fn create_const_u32(&mut self, value: u32) -> ExprValue {
        let ty = self.type_set.builtin_type(BuiltinKind::I32);
        let inst = self.add_inst(Instruction::ConstU32 { args: A0, value });
        ExprValue::new_value(inst, ty)
    }

    pub fn create_const_u64(&mut self, value: u64) -> ExprValue {
        let ty = self.type_set.builtin_type(BuiltinKind::I64);
        let inst = self.add_inst(Instruction::ConstU64 { args: A0, value });
        ExprValue::new_value(inst, ty)
    }

    pub fn create_const_f32(&mut self, value: f32) -> ExprValue {
        let ty = self.type_set.builtin_type(BuiltinKind::F32);
        let inst = self.add_inst(Instruction::ConstF32 { args: A0, value });
        ExprValue::new_value(inst, ty)
    }

    pub fn create_const_f64(&mut self, value: f64) -> ExprValue {
        let ty = self.type_set.builtin_type(BuiltinKind::F64);
        let inst = self.add_inst(Instruction::ConstF64 { args: A0, value });
        ExprValue::new_value(inst, ty)
    }

    pub fn create_const_ptr_null(&mut self) -> ExprValue {
        let ty = self.type_set.pointer_type();
        let inst = self.add_inst(Instruction::ConstPtrNull { args: A0 });
        ExprValue::new_value(inst, ty)
    }

    /// A signed integer constant of the given integer object type.
    pub fn create_const_int(&mut self, ty: TypeIdx, value: i64) -> ExprValue {
        let inst = match self.value_type(ty) {
            ValueType::I8 => Instruction::ConstI8 {
                args: A0,
                value: value as i8,
            },
            ValueType::I16 => Instruction::ConstI16 {
                args: A0,
                value: value as i16,
            },
            ValueType::I32 => Instruction::ConstI32 {
                args: A0,
                value: value as i32,
            },
            ValueType::I64 => Instruction::ConstI64 { args: A0, value },
            other => unreachable!("const int of value type {:?}", other),
        };
        let inst = self.add_inst(inst);
        ExprValue::new_value(inst, ty)
    }

    /// An unsigned integer constant of the given integer object type.
    pub fn create_const_uint(&mut self, ty: TypeIdx, value: u64) -> ExprValue {
        let inst = match self.value_type(ty) {
            ValueType::I8 => Instruction::ConstU8 {
                args: A0,
                value: value as u8,
            },
            ValueType::I16 => Instruction::ConstU16 {
                args: A0,
                value: value as u16,
            },
            ValueType::I32 => Instruction::ConstU32 {
                args: A0,
                value: value as u32,
            },
            ValueType::I64 => Instruction::ConstU64 { args: A0, value },
            other => unreachable!("const uint of value type {:?}", other),
        };
        let inst = self.add_inst(inst);
        ExprValue::new_value(inst, ty)
    }

    ////////// globals, arguments //////////

    /// A reference to a serialized global object.
    pub fn create_get_global_object(&mut self, global: GlobalIdx) -> ExprValue {
        let ty = self.global_memory.object(global).ty;
        let inst = self.add_inst(Instruction::GetGlobalAddress { args: A0, global });
        ExprValue::new_reference(inst, ty)
    }

    pub fn create_get_function_arg(&mut self, arg_index: u32) -> InstrRef {
        self.add_inst(Instruction::GetFunctionArg {
            args: A0,
            arg_index,
        })
    }

    /// The hidden return-slot pointer of functions returning non-scalars,
    /// as a reference to the (caller-owned) result object.
    pub fn create_get_function_return_address(&mut self) -> ExprValue {
        let return_type = self.fb().return_type;
        let inst = self.create_get_function_arg(0);
        ExprValue::new_reference(inst, return_type)
    }

    /// Serializes `data` into the global segment and returns a reference
    /// to the new object.
    pub fn create_global_object(&mut self, ty: TypeIdx, data: Vec<u8>) -> (ExprValue, GlobalIdx) {
        let align = self.type_set.align_of(ty);
        let global = self.global_memory.add_object(ty, align, data);
        let value = self.create_get_global_object(global);
        (value, global)
    }

    /// Builds a `str` value out of a literal: the bytes become a global
    /// array object, the result is the (begin, one-past-end) pair written
    /// into `result_address`. Empty strings are the null pair.
    pub fn create_string(&mut self, text: &str, result_address: ExprValue) -> ExprValue {
        debug_assert!(result_address.is_reference());
        let (begin, end) = if text.is_empty() {
            let begin = self.create_const_ptr_null();
            let end = self.create_const_ptr_null();
            (begin, end)
        } else {
            let bytes = text.as_bytes().to_vec();
            let len = bytes.len() as u64;
            let u8_ty = self.type_set.builtin_type(BuiltinKind::I8);
            let array_ty = self.type_set.array_type(u8_ty, len);
            let (array, _) = self.create_global_object(array_ty, bytes);
            let pointer = self.type_set.pointer_type();
            let begin = ExprValue::new_value(array.get_reference(), pointer);
            let end = self.create_ptr_add_const_unchecked(begin, len as i64, u8_ty);
            (begin, end)
        };
        let begin_slot = self.create_struct_gep(result_address, 0);
        self.create_store(begin, begin_slot);
        let end_slot = self.create_struct_gep(result_address, 1);
        self.create_store(end, end_slot);
        result_address
    }

    /// Serializes a string literal into a read-only global `str` object.
    pub fn create_string_global(&mut self, text: &str) -> ExprValue {
        let pair_ty = self.type_set.str_type();
        let pointer_bytes = self.machine.pointer_size().bytes();
        let endianness = self.machine.endianness;

        let (begin_addr, end_addr) = if text.is_empty() {
            (0u64, 0u64)
        } else {
            let bytes = text.as_bytes().to_vec();
            let len = bytes.len() as u64;
            let u8_ty = self.type_set.builtin_type(BuiltinKind::I8);
            let array_ty = self.type_set.array_type(u8_ty, len);
            let align = self.type_set.align_of(array_ty);
            let global = self.global_memory.add_object(array_ty, align, bytes);
            let begin = self.global_memory.object(global).address;
            (begin, begin + len)
        };

        let mut data = vec![0u8; self.type_set.size_of(pair_ty).bytes() as usize];
        endian::write_ptr(&mut data, begin_addr, pointer_bytes, endianness);
        endian::write_ptr(
            &mut data[pointer_bytes as usize..],
            end_addr,
            pointer_bytes,
            endianness,
        );
        let (value, _) = self.create_global_object(pair_ty, data);
        value
    }

    ////////// loads and stores //////////

    /// Loads the scalar a reference points at. Dispatch is static: the
    /// instruction tag carries both the width and the byte order.
    pub fn create_load(&mut self, ptr: ExprValue) -> ExprValue {
        debug_assert!(ptr.is_reference());
        let ty = ptr.ty();
        let little = self.is_little_endian();
        let is_64 = self.is_64_bit();
        let inst = match (self.value_type(ty), little) {
            (ValueType::I1, true) => Instruction::LoadI1Le { args: A1 },
            (ValueType::I1, false) => Instruction::LoadI1Be { args: A1 },
            (ValueType::I8, true) => Instruction::LoadI8Le { args: A1 },
            (ValueType::I8, false) => Instruction::LoadI8Be { args: A1 },
            (ValueType::I16, true) => Instruction::LoadI16Le { args: A1 },
            (ValueType::I16, false) => Instruction::LoadI16Be { args: A1 },
            (ValueType::I32, true) => Instruction::LoadI32Le { args: A1 },
            (ValueType::I32, false) => Instruction::LoadI32Be { args: A1 },
            (ValueType::I64, true) => Instruction::LoadI64Le { args: A1 },
            (ValueType::I64, false) => Instruction::LoadI64Be { args: A1 },
            (ValueType::F32, true) => Instruction::LoadF32Le { args: A1 },
            (ValueType::F32, false) => Instruction::LoadF32Be { args: A1 },
            (ValueType::F64, true) => Instruction::LoadF64Le { args: A1 },
            (ValueType::F64, false) => Instruction::LoadF64Be { args: A1 },
            (ValueType::Ptr, true) if is_64 => Instruction::LoadPtr64Le { args: A1 },
            (ValueType::Ptr, false) if is_64 => Instruction::LoadPtr64Be { args: A1 },
            (ValueType::Ptr, true) => Instruction::LoadPtr32Le { args: A1 },
            (ValueType::Ptr, false) => Instruction::LoadPtr32Be { args: A1 },
            (other, _) => unreachable!("load of value type {:?}", other),
        };
        let inst = self.add_inst1(inst, ptr.get_reference());
        ExprValue::new_value(inst, ty)
    }

    pub fn create_store(&mut self, value: ExprValue, ptr: ExprValue) -> InstrRef {
        debug_assert!(ptr.is_reference());
        let value = self.value_of(value);
        let little = self.is_little_endian();
        let is_64 = self.is_64_bit();
        let inst = match (self.value_type(value.ty()), little) {
            (ValueType::I1, true) => Instruction::StoreI1Le { args: A2 },
            (ValueType::I1, false) => Instruction::StoreI1Be { args: A2 },
            (ValueType::I8, true) => Instruction::StoreI8Le { args: A2 },
            (ValueType::I8, false) => Instruction::StoreI8Be { args: A2 },
            (ValueType::I16, true) => Instruction::StoreI16Le { args: A2 },
            (ValueType::I16, false) => Instruction::StoreI16Be { args: A2 },
            (ValueType::I32, true) => Instruction::StoreI32Le { args: A2 },
            (ValueType::I32, false) => Instruction::StoreI32Be { args: A2 },
            (ValueType::I64, true) => Instruction::StoreI64Le { args: A2 },
            (ValueType::I64, false) => Instruction::StoreI64Be { args: A2 },
            (ValueType::F32, true) => Instruction::StoreF32Le { args: A2 },
            (ValueType::F32, false) => Instruction::StoreF32Be { args: A2 },
            (ValueType::F64, true) => Instruction::StoreF64Le { args: A2 },
            (ValueType::F64, false) => Instruction::StoreF64Be { args: A2 },
            (ValueType::Ptr, true) if is_64 => Instruction::StorePtr64Le { args: A2 },
            (ValueType::Ptr, false) if is_64 => Instruction::StorePtr64Be { args: A2 },
            (ValueType::Ptr, true) => Instruction::StorePtr32Le { args: A2 },
            (ValueType::Ptr, false) => Instruction::StorePtr32Be { args: A2 },
            (other, _) => unreachable!("store of value type {:?}", other),
        };
        self.add_inst2(inst, value.instr(), ptr.get_reference())
    }

    ////////// allocas and lifetimes //////////

    /// A stack slot with lifetime tracking: starts its lifetime here and
    /// registers the end on the enclosing scope.
    pub fn create_alloca(&mut self, ty: TypeIdx) -> ExprValue {
        let value = self.create_alloca_without_lifetime(ty);
        self.create_start_lifetime(value);
        self.push_end_lifetime(value);
        value
    }

    pub fn create_alloca_without_lifetime(&mut self, ty: TypeIdx) -> ExprValue {
        let builder = self.fb_mut();
        let index = builder.allocas.len() as u32;
        builder.allocas.push(orec_ir::function::AllocaDecl {
            ty,
            has_lifetime: false,
        });
        ExprValue::new_reference(InstrRef::alloca(index), ty)
    }

    pub fn create_start_lifetime(&mut self, value: ExprValue) {
        debug_assert!(value.is_reference());
        // Mark the alloca as lifetime-tracked so the frame starts it dead.
        let inst_ref = value.get_reference();
        if inst_ref.is_alloca() {
            self.fb_mut().allocas[inst_ref.index as usize].has_lifetime = true;
        }
        let size = self.type_set.size_of(value.ty()).bytes();
        let inst = Instruction::StartLifetime { args: A1, size };
        self.add_inst1(inst, inst_ref);
    }

    pub fn create_end_lifetime(&mut self, value: ExprValue) {
        debug_assert!(value.is_reference());
        let ty = value.ty();
        if self.type_set.size_of(ty).bytes() == 0 {
            // Nothing to end for an empty type.
            return;
        }
        let size = self.type_set.size_of(ty).bytes();
        let inst = Instruction::EndLifetime { args: A1, size };
        self.add_inst1(inst, value.get_reference());
    }

    ////////// control flow //////////

    pub fn create_jump(&mut self, dest: BlockRef) -> InstrRef {
        let inst = self.add_inst(Instruction::Jump {
            args: A0,
            dest: NO_DEST,
        });
        self.add_unresolved_jump(inst, [dest, dest]);
        inst
    }

    pub fn create_conditional_jump(
        &mut self,
        condition: ExprValue,
        true_dest: BlockRef,
        false_dest: BlockRef,
    ) -> InstrRef {
        let condition = self.value_instr_of(condition);
        let inst = self.add_inst1(
            Instruction::ConditionalJump {
                args: A1,
                true_dest: NO_DEST,
                false_dest: NO_DEST,
            },
            condition,
        );
        self.add_unresolved_jump(inst, [true_dest, false_dest]);
        inst
    }

    pub fn create_switch(
        &mut self,
        value: ExprValue,
        values: Vec<(u64, BlockRef)>,
        default_dest: BlockRef,
    ) -> InstrRef {
        let info = SwitchIdx::from_u32(self.fb().switch_count as u32);
        self.fb_mut().switch_count += 1;
        let value = self.value_of(value);
        let inst = match self.value_type(value.ty()) {
            ValueType::I1 | ValueType::I8 => Instruction::SwitchI8 { args: A1, info },
            ValueType::I16 => Instruction::SwitchI16 { args: A1, info },
            ValueType::I32 => Instruction::SwitchI32 { args: A1, info },
            ValueType::I64 => Instruction::SwitchI64 { args: A1, info },
            other => unreachable!("switch over value type {:?}", other),
        };
        let inst = self.add_inst1(inst, value.instr());
        self.add_unresolved_switch(inst, values, default_dest);
        inst
    }

    pub fn create_ret(&mut self, value: InstrRef) -> InstrRef {
        self.add_inst1(Instruction::Ret { args: A1 }, value)
    }

    pub fn create_ret_void(&mut self) -> InstrRef {
        self.add_inst(Instruction::RetVoid { args: A0 })
    }

    pub fn create_unreachable(&mut self) -> InstrRef {
        self.add_inst(Instruction::Unreachable { args: A0 })
    }

    ////////// address computation //////////

    /// A reference to aggregate member `index`, or to array element
    /// `index` when the index is a compile-time constant.
    pub fn create_struct_gep(&mut self, value: ExprValue, index: u64) -> ExprValue {
        debug_assert!(value.is_reference());
        let ty = value.ty();
        let (member_ty, offset) = match self.type_set.kind(ty) {
            orec_ir::ty::TypeKind::Aggregate { members, offsets } => {
                (members[index as usize], offsets[index as usize])
            }
            orec_ir::ty::TypeKind::Array { elem, len } => {
                // Clamp to one-past-the-end for end-pointer formation.
                debug_assert!(index <= *len);
                let stride = self.type_set.size_of(*elem).bytes();
                (*elem, stride * index)
            }
            other => unreachable!("struct gep into {:?}", other),
        };
        let inst = self.add_inst1(
            Instruction::ConstGep { args: A1, offset },
            value.get_reference(),
        );
        ExprValue::new_reference(inst, member_ty)
    }

    /// A reference to the array element selected by a runtime index. The
    /// caller is responsible for the bounds check.
    pub fn create_array_gep(&mut self, array: ExprValue, index: ExprValue) -> ExprValue {
        debug_assert!(array.is_reference());
        let (elem_ty, _) = self.type_set.array_parts(array.ty());
        let stride = self.type_set.size_of(elem_ty).bytes();
        let pointer = self.type_set.pointer_type();
        let base = ExprValue::new_value(array.get_reference(), pointer);
        self.create_array_gep_impl(base, index, elem_ty, stride)
    }

    /// Element reference off a begin pointer, for slices.
    pub fn create_array_slice_gep(
        &mut self,
        begin_ptr: ExprValue,
        index: ExprValue,
        elem_ty: TypeIdx,
    ) -> ExprValue {
        let stride = self.type_set.size_of(elem_ty).bytes();
        self.create_array_gep_impl(begin_ptr, index, elem_ty, stride)
    }

    fn create_array_gep_impl(
        &mut self,
        base: ExprValue,
        index: ExprValue,
        elem_ty: TypeIdx,
        stride: u64,
    ) -> ExprValue {
        let base = self.value_instr_of(base);
        let index = self.value_of(index);
        let inst = match self.value_type(index.ty()) {
            ValueType::I32 => Instruction::ArrayGepI32 { args: A2, stride },
            ValueType::I64 => Instruction::ArrayGepI64 { args: A2, stride },
            other => unreachable!("array gep index of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, base, index.instr());
        ExprValue::new_reference(inst, elem_ty)
    }

    ////////// bulk memory //////////

    pub fn create_const_memcpy(&mut self, dest: ExprValue, src: ExprValue, size: u64) -> InstrRef {
        let dest = dest.get_reference();
        let src = src.get_reference();
        self.add_inst2(Instruction::ConstMemcpy { args: A2, size }, dest, src)
    }

    pub fn create_const_memset_zero(&mut self, dest: ExprValue) -> InstrRef {
        let size = self.type_set.size_of(dest.ty()).bytes();
        let dest = dest.get_reference();
        self.add_inst1(Instruction::ConstMemsetZero { args: A1, size }, dest)
    }

    /// Copies a value of any object type into a destination reference:
    /// scalars by load/store, aggregates by memcpy.
    pub fn copy_into(&mut self, source: ExprValue, dest: ExprValue) {
        debug_assert!(dest.is_reference());
        let ty = dest.ty();
        if self.type_set.is_simple_value_type(ty) {
            let value = self.value_of(source);
            self.create_store(value, dest);
        } else if self.type_set.size_of(ty).bytes() != 0 {
            debug_assert!(source.is_reference());
            let size = self.type_set.size_of(ty).bytes();
            self.create_const_memcpy(dest, source, size);
        }
    }

    ////////// calls and heap //////////

    /// Emits the call instruction. Scalar results come back as a value;
    /// non-scalar results land in the return slot the caller passed as the
    /// hidden first argument, and void calls produce nothing.
    pub fn create_function_call(
        &mut self,
        span: SrcSpan,
        func: FuncIdx,
        args: Vec<InstrRef>,
        return_type: TypeIdx,
    ) -> ExprValue {
        let src = self.add_span(span);
        let args_index = CallArgsIdx::from_u32(self.fb().call_args.len() as u32);
        self.fb_mut().call_args.push(args);
        let inst = self.add_inst(Instruction::FunctionCall {
            args: A0,
            func,
            args_index,
            src,
        });
        if self.type_set.is_simple_value_type(return_type) {
            ExprValue::new_value(inst, return_type)
        } else {
            ExprValue::none()
        }
    }

    pub fn create_malloc(&mut self, span: SrcSpan, elem_type: TypeIdx, count: ExprValue) -> ExprValue {
        let src = self.add_span(span);
        let count = self.value_instr_of(count);
        let pointer = self.type_set.pointer_type();
        let inst = self.add_inst1(
            Instruction::Malloc {
                args: A1,
                src,
                elem_type,
            },
            count,
        );
        ExprValue::new_value(inst, pointer)
    }

    pub fn create_free(&mut self, span: SrcSpan, ptr: ExprValue) -> InstrRef {
        let src = self.add_span(span);
        let ptr = self.value_instr_of(ptr);
        self.add_inst1(Instruction::Free { args: A1, src }, ptr)
    }

    ////////// casts //////////

    pub fn create_int_cast(&mut self, value: ExprValue, dest: TypeIdx, is_value_signed: bool) -> ExprValue {
        let value = self.value_of(value);
        let from = self.value_type(value.ty());
        let to = self.value_type(dest);
        if from == to {
            return ExprValue::new_value(value.instr(), dest);
        }
        let inst = match (from, to, is_value_signed) {
            (ValueType::I1, ValueType::I8, _) => Instruction::CastZextI1ToI8 { args: A1 },
            (ValueType::I1, ValueType::I16, _) => Instruction::CastZextI1ToI16 { args: A1 },
            (ValueType::I1, ValueType::I32, _) => Instruction::CastZextI1ToI32 { args: A1 },
            (ValueType::I1, ValueType::I64, _) => Instruction::CastZextI1ToI64 { args: A1 },
            (ValueType::I8, ValueType::I16, false) => Instruction::CastZextI8ToI16 { args: A1 },
            (ValueType::I8, ValueType::I32, false) => Instruction::CastZextI8ToI32 { args: A1 },
            (ValueType::I8, ValueType::I64, false) => Instruction::CastZextI8ToI64 { args: A1 },
            (ValueType::I16, ValueType::I32, false) => Instruction::CastZextI16ToI32 { args: A1 },
            (ValueType::I16, ValueType::I64, false) => Instruction::CastZextI16ToI64 { args: A1 },
            (ValueType::I32, ValueType::I64, false) => Instruction::CastZextI32ToI64 { args: A1 },
            (ValueType::I8, ValueType::I16, true) => Instruction::CastSextI8ToI16 { args: A1 },
            (ValueType::I8, ValueType::I32, true) => Instruction::CastSextI8ToI32 { args: A1 },
            (ValueType::I8, ValueType::I64, true) => Instruction::CastSextI8ToI64 { args: A1 },
            (ValueType::I16, ValueType::I32, true) => Instruction::CastSextI16ToI32 { args: A1 },
            (ValueType::I16, ValueType::I64, true) => Instruction::CastSextI16ToI64 { args: A1 },
            (ValueType::I32, ValueType::I64, true) => Instruction::CastSextI32ToI64 { args: A1 },
            (ValueType::I64, ValueType::I8, _) => Instruction::CastTruncI64ToI8 { args: A1 },
            (ValueType::I64, ValueType::I16, _) => Instruction::CastTruncI64ToI16 { args: A1 },
            (ValueType::I64, ValueType::I32, _) => Instruction::CastTruncI64ToI32 { args: A1 },
            (ValueType::I32, ValueType::I8, _) => Instruction::CastTruncI32ToI8 { args: A1 },
            (ValueType::I32, ValueType::I16, _) => Instruction::CastTruncI32ToI16 { args: A1 },
            (ValueType::I16, ValueType::I8, _) => Instruction::CastTruncI16ToI8 { args: A1 },
            (from, to, _) => unreachable!("int cast {:?} -> {:?}", from, to),
        };
        let inst = self.add_inst1(inst, value.instr());
        ExprValue::new_value(inst, dest)
    }

    pub fn create_float_cast(&mut self, value: ExprValue, dest: TypeIdx) -> ExprValue {
        let value = self.value_of(value);
        let from = self.value_type(value.ty());
        let to = self.value_type(dest);
        let inst = match (from, to) {
            (ValueType::F32, ValueType::F32) | (ValueType::F64, ValueType::F64) => {
                return ExprValue::new_value(value.instr(), dest);
            }
            (ValueType::F32, ValueType::F64) => Instruction::CastF32ToF64 { args: A1 },
            (ValueType::F64, ValueType::F32) => Instruction::CastF64ToF32 { args: A1 },
            (from, to) => unreachable!("float cast {:?} -> {:?}", from, to),
        };
        let inst = self.add_inst1(inst, value.instr());
        ExprValue::new_value(inst, dest)
    }

    pub fn create_float_to_int_cast(
        &mut self,
        value: ExprValue,
        dest: TypeIdx,
        is_dest_signed: bool,
    ) -> ExprValue {
        let value = self.value_of(value);
        let from = self.value_type(value.ty());
        let to = self.value_type(dest);
        let inst = match (from, to, is_dest_signed) {
            (ValueType::F32, ValueType::I8, true) => Instruction::CastF32ToI8 { args: A1 },
            (ValueType::F32, ValueType::I16, true) => Instruction::CastF32ToI16 { args: A1 },
            (ValueType::F32, ValueType::I32, true) => Instruction::CastF32ToI32 { args: A1 },
            (ValueType::F32, ValueType::I64, true) => Instruction::CastF32ToI64 { args: A1 },
            (ValueType::F32, ValueType::I8, false) => Instruction::CastF32ToU8 { args: A1 },
            (ValueType::F32, ValueType::I16, false) => Instruction::CastF32ToU16 { args: A1 },
            (ValueType::F32, ValueType::I32, false) => Instruction::CastF32ToU32 { args: A1 },
            (ValueType::F32, ValueType::I64, false) => Instruction::CastF32ToU64 { args: A1 },
            (ValueType::F64, ValueType::I8, true) => Instruction::CastF64ToI8 { args: A1 },
            (ValueType::F64, ValueType::I16, true) => Instruction::CastF64ToI16 { args: A1 },
            (ValueType::F64, ValueType::I32, true) => Instruction::CastF64ToI32 { args: A1 },
            (ValueType::F64, ValueType::I64, true) => Instruction::CastF64ToI64 { args: A1 },
            (ValueType::F64, ValueType::I8, false) => Instruction::CastF64ToU8 { args: A1 },
            (ValueType::F64, ValueType::I16, false) => Instruction::CastF64ToU16 { args: A1 },
            (ValueType::F64, ValueType::I32, false) => Instruction::CastF64ToU32 { args: A1 },
            (ValueType::F64, ValueType::I64, false) => Instruction::CastF64ToU64 { args: A1 },
            (from, to, _) => unreachable!("float-int cast {:?} -> {:?}", from, to),
        };
        let inst = self.add_inst1(inst, value.instr());
        ExprValue::new_value(inst, dest)
    }

    pub fn create_int_to_float_cast(
        &mut self,
        value: ExprValue,
        dest: TypeIdx,
        is_value_signed: bool,
    ) -> ExprValue {
        let value = self.value_of(value);
        let from = self.value_type(value.ty());
        let to = self.value_type(dest);
        let inst = match (from, to, is_value_signed) {
            (ValueType::I8, ValueType::F32, true) => Instruction::CastI8ToF32 { args: A1 },
            (ValueType::I16, ValueType::F32, true) => Instruction::CastI16ToF32 { args: A1 },
            (ValueType::I32, ValueType::F32, true) => Instruction::CastI32ToF32 { args: A1 },
            (ValueType::I64, ValueType::F32, true) => Instruction::CastI64ToF32 { args: A1 },
            (ValueType::I8, ValueType::F32, false) => Instruction::CastU8ToF32 { args: A1 },
            (ValueType::I16, ValueType::F32, false) => Instruction::CastU16ToF32 { args: A1 },
            (ValueType::I32, ValueType::F32, false) => Instruction::CastU32ToF32 { args: A1 },
            (ValueType::I64, ValueType::F32, false) => Instruction::CastU64ToF32 { args: A1 },
            (ValueType::I8, ValueType::F64, true) => Instruction::CastI8ToF64 { args: A1 },
            (ValueType::I16, ValueType::F64, true) => Instruction::CastI16ToF64 { args: A1 },
            (ValueType::I32, ValueType::F64, true) => Instruction::CastI32ToF64 { args: A1 },
            (ValueType::I64, ValueType::F64, true) => Instruction::CastI64ToF64 { args: A1 },
            (ValueType::I8, ValueType::F64, false) => Instruction::CastU8ToF64 { args: A1 },
            (ValueType::I16, ValueType::F64, false) => Instruction::CastU16ToF64 { args: A1 },
            (ValueType::I32, ValueType::F64, false) => Instruction::CastU32ToF64 { args: A1 },
            (ValueType::I64, ValueType::F64, false) => Instruction::CastU64ToF64 { args: A1 },
            (from, to, _) => unreachable!("int-float cast {:?} -> {:?}", from, to),
        };
        let inst = self.add_inst1(inst, value.instr());
        ExprValue::new_value(inst, dest)
    }

    ////////// comparisons //////////

    fn binary_value_args(&mut self, lhs: ExprValue, rhs: ExprValue) -> (InstrRef, InstrRef, TypeIdx) {
        let lhs = self.value_of(lhs);
        let rhs = self.value_of(rhs);
        debug_assert_eq!(
            self.value_type(lhs.ty()),
            self.value_type(rhs.ty()),
            "mismatched binary operand value types"
        );
        (lhs.instr(), rhs.instr(), lhs.ty())
    }

    fn cmp_result(&mut self, inst: InstrRef) -> ExprValue {
        let i1 = self.type_set.builtin_type(BuiltinKind::I1);
        ExprValue::new_value(inst, i1)
    }

    pub fn create_int_cmp_eq(&mut self, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match self.value_type(ty) {
            ValueType::I1 => Instruction::CmpEqI1 { args: A2 },
            ValueType::I8 => Instruction::CmpEqI8 { args: A2 },
            ValueType::I16 => Instruction::CmpEqI16 { args: A2 },
            ValueType::I32 => Instruction::CmpEqI32 { args: A2 },
            ValueType::I64 => Instruction::CmpEqI64 { args: A2 },
            other => unreachable!("int eq of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        self.cmp_result(inst)
    }

    pub fn create_int_cmp_neq(&mut self, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match self.value_type(ty) {
            ValueType::I1 => Instruction::CmpNeqI1 { args: A2 },
            ValueType::I8 => Instruction::CmpNeqI8 { args: A2 },
            ValueType::I16 => Instruction::CmpNeqI16 { args: A2 },
            ValueType::I32 => Instruction::CmpNeqI32 { args: A2 },
            ValueType::I64 => Instruction::CmpNeqI64 { args: A2 },
            other => unreachable!("int neq of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        self.cmp_result(inst)
    }

    pub fn create_int_cmp_lt(&mut self, lhs: ExprValue, rhs: ExprValue, is_signed: bool) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match (self.value_type(ty), is_signed) {
            (ValueType::I8, true) => Instruction::CmpLtI8 { args: A2 },
            (ValueType::I16, true) => Instruction::CmpLtI16 { args: A2 },
            (ValueType::I32, true) => Instruction::CmpLtI32 { args: A2 },
            (ValueType::I64, true) => Instruction::CmpLtI64 { args: A2 },
            (ValueType::I8, false) => Instruction::CmpLtU8 { args: A2 },
            (ValueType::I16, false) => Instruction::CmpLtU16 { args: A2 },
            (ValueType::I32, false) => Instruction::CmpLtU32 { args: A2 },
            (ValueType::I64, false) => Instruction::CmpLtU64 { args: A2 },
            (other, _) => unreachable!("int lt of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        self.cmp_result(inst)
    }

    pub fn create_int_cmp_gt(&mut self, lhs: ExprValue, rhs: ExprValue, is_signed: bool) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match (self.value_type(ty), is_signed) {
            (ValueType::I8, true) => Instruction::CmpGtI8 { args: A2 },
            (ValueType::I16, true) => Instruction::CmpGtI16 { args: A2 },
            (ValueType::I32, true) => Instruction::CmpGtI32 { args: A2 },
            (ValueType::I64, true) => Instruction::CmpGtI64 { args: A2 },
            (ValueType::I8, false) => Instruction::CmpGtU8 { args: A2 },
            (ValueType::I16, false) => Instruction::CmpGtU16 { args: A2 },
            (ValueType::I32, false) => Instruction::CmpGtU32 { args: A2 },
            (ValueType::I64, false) => Instruction::CmpGtU64 { args: A2 },
            (other, _) => unreachable!("int gt of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        self.cmp_result(inst)
    }

    pub fn create_int_cmp_lte(&mut self, lhs: ExprValue, rhs: ExprValue, is_signed: bool) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match (self.value_type(ty), is_signed) {
            (ValueType::I8, true) => Instruction::CmpLteI8 { args: A2 },
            (ValueType::I16, true) => Instruction::CmpLteI16 { args: A2 },
            (ValueType::I32, true) => Instruction::CmpLteI32 { args: A2 },
            (ValueType::I64, true) => Instruction::CmpLteI64 { args: A2 },
            (ValueType::I8, false) => Instruction::CmpLteU8 { args: A2 },
            (ValueType::I16, false) => Instruction::CmpLteU16 { args: A2 },
            (ValueType::I32, false) => Instruction::CmpLteU32 { args: A2 },
            (ValueType::I64, false) => Instruction::CmpLteU64 { args: A2 },
            (other, _) => unreachable!("int lte of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        self.cmp_result(inst)
    }

    pub fn create_int_cmp_gte(&mut self, lhs: ExprValue, rhs: ExprValue, is_signed: bool) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match (self.value_type(ty), is_signed) {
            (ValueType::I8, true) => Instruction::CmpGteI8 { args: A2 },
            (ValueType::I16, true) => Instruction::CmpGteI16 { args: A2 },
            (ValueType::I32, true) => Instruction::CmpGteI32 { args: A2 },
            (ValueType::I64, true) => Instruction::CmpGteI64 { args: A2 },
            (ValueType::I8, false) => Instruction::CmpGteU8 { args: A2 },
            (ValueType::I16, false) => Instruction::CmpGteU16 { args: A2 },
            (ValueType::I32, false) => Instruction::CmpGteU32 { args: A2 },
            (ValueType::I64, false) => Instruction::CmpGteU64 { args: A2 },
            (other, _) => unreachable!("int gte of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        self.cmp_result(inst)
    }

    pub fn create_float_cmp_eq(&mut self, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match self.value_type(ty) {
            ValueType::F32 => Instruction::CmpEqF32 { args: A2 },
            ValueType::F64 => Instruction::CmpEqF64 { args: A2 },
            other => unreachable!("float eq of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        self.cmp_result(inst)
    }

    pub fn create_float_cmp_neq(&mut self, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match self.value_type(ty) {
            ValueType::F32 => Instruction::CmpNeqF32 { args: A2 },
            ValueType::F64 => Instruction::CmpNeqF64 { args: A2 },
            other => unreachable!("float neq of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        self.cmp_result(inst)
    }

    pub fn create_float_cmp_lt(&mut self, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match self.value_type(ty) {
            ValueType::F32 => Instruction::CmpLtF32 { args: A2 },
            ValueType::F64 => Instruction::CmpLtF64 { args: A2 },
            other => unreachable!("float lt of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        self.cmp_result(inst)
    }

    pub fn create_float_cmp_gt(&mut self, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match self.value_type(ty) {
            ValueType::F32 => Instruction::CmpGtF32 { args: A2 },
            ValueType::F64 => Instruction::CmpGtF64 { args: A2 },
            other => unreachable!("float gt of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        self.cmp_result(inst)
    }

    pub fn create_float_cmp_lte(&mut self, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match self.value_type(ty) {
            ValueType::F32 => Instruction::CmpLteF32 { args: A2 },
            ValueType::F64 => Instruction::CmpLteF64 { args: A2 },
            other => unreachable!("float lte of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        self.cmp_result(inst)
    }

    pub fn create_float_cmp_gte(&mut self, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match self.value_type(ty) {
            ValueType::F32 => Instruction::CmpGteF32 { args: A2 },
            ValueType::F64 => Instruction::CmpGteF64 { args: A2 },
            other => unreachable!("float gte of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        self.cmp_result(inst)
    }

    /// NaN-operand checks paired with float comparisons.
    pub fn create_float_cmp_check(
        &mut self,
        span: SrcSpan,
        op: orec_ast::BinaryOp,
        lhs: ExprValue,
        rhs: ExprValue,
    ) {
        if !self.warnings.is_enabled(WarningKind::NanCompare) {
            return;
        }
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let src = self.add_span(span);
        let is_f32 = matches!(self.value_type(ty), ValueType::F32);
        use orec_ast::BinaryOp::*;
        let inst = match (op, is_f32) {
            (Eq, true) => Instruction::CmpEqF32Check { args: A2, src },
            (Eq, false) => Instruction::CmpEqF64Check { args: A2, src },
            (Neq, true) => Instruction::CmpNeqF32Check { args: A2, src },
            (Neq, false) => Instruction::CmpNeqF64Check { args: A2, src },
            (Lt, true) => Instruction::CmpLtF32Check { args: A2, src },
            (Lt, false) => Instruction::CmpLtF64Check { args: A2, src },
            (Gt, true) => Instruction::CmpGtF32Check { args: A2, src },
            (Gt, false) => Instruction::CmpGtF64Check { args: A2, src },
            (Lte, true) => Instruction::CmpLteF32Check { args: A2, src },
            (Lte, false) => Instruction::CmpLteF64Check { args: A2, src },
            (Gte, true) => Instruction::CmpGteF32Check { args: A2, src },
            (Gte, false) => Instruction::CmpGteF64Check { args: A2, src },
            (other, _) => unreachable!("float cmp check for operator {:?}", other),
        };
        self.add_inst2(inst, lhs, rhs);
    }

    pub fn create_pointer_cmp_eq(&mut self, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, _) = self.binary_value_args(lhs, rhs);
        let inst = self.add_inst2(Instruction::CmpEqPtr { args: A2 }, lhs, rhs);
        self.cmp_result(inst)
    }

    pub fn create_pointer_cmp_neq(&mut self, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, _) = self.binary_value_args(lhs, rhs);
        let inst = self.add_inst2(Instruction::CmpNeqPtr { args: A2 }, lhs, rhs);
        self.cmp_result(inst)
    }

    pub fn create_pointer_cmp_lt(&mut self, span: SrcSpan, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, _) = self.binary_value_args(lhs, rhs);
        let src = self.add_span(span);
        let inst = self.add_inst2(Instruction::CmpLtPtr { args: A2, src }, lhs, rhs);
        self.cmp_result(inst)
    }

    pub fn create_pointer_cmp_gt(&mut self, span: SrcSpan, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, _) = self.binary_value_args(lhs, rhs);
        let src = self.add_span(span);
        let inst = self.add_inst2(Instruction::CmpGtPtr { args: A2, src }, lhs, rhs);
        self.cmp_result(inst)
    }

    pub fn create_pointer_cmp_lte(&mut self, span: SrcSpan, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, _) = self.binary_value_args(lhs, rhs);
        let src = self.add_span(span);
        let inst = self.add_inst2(Instruction::CmpLtePtr { args: A2, src }, lhs, rhs);
        self.cmp_result(inst)
    }

    pub fn create_pointer_cmp_gte(&mut self, span: SrcSpan, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, _) = self.binary_value_args(lhs, rhs);
        let src = self.add_span(span);
        let inst = self.add_inst2(Instruction::CmpGtePtr { args: A2, src }, lhs, rhs);
        self.cmp_result(inst)
    }

    ////////// arithmetic //////////

    pub fn create_neg(&mut self, value: ExprValue) -> ExprValue {
        let value = self.value_of(value);
        let ty = value.ty();
        let inst = match self.value_type(ty) {
            ValueType::I8 => Instruction::NegI8 { args: A1 },
            ValueType::I16 => Instruction::NegI16 { args: A1 },
            ValueType::I32 => Instruction::NegI32 { args: A1 },
            ValueType::I64 => Instruction::NegI64 { args: A1 },
            ValueType::F32 => Instruction::NegF32 { args: A1 },
            ValueType::F64 => Instruction::NegF64 { args: A1 },
            other => unreachable!("neg of value type {:?}", other),
        };
        let inst = self.add_inst1(inst, value.instr());
        ExprValue::new_value(inst, ty)
    }

    pub fn create_neg_check(&mut self, span: SrcSpan, value: ExprValue) {
        if !self.warnings.is_enabled(WarningKind::IntOverflow) {
            return;
        }
        let value = self.value_of(value);
        let src = self.add_span(span);
        let inst = match self.value_type(value.ty()) {
            ValueType::I8 => Instruction::NegI8Check { args: A1, src },
            ValueType::I16 => Instruction::NegI16Check { args: A1, src },
            ValueType::I32 => Instruction::NegI32Check { args: A1, src },
            ValueType::I64 => Instruction::NegI64Check { args: A1, src },
            _ => return,
        };
        self.add_inst1(inst, value.instr());
    }

    pub fn create_add(&mut self, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match self.value_type(ty) {
            ValueType::I8 => Instruction::AddI8 { args: A2 },
            ValueType::I16 => Instruction::AddI16 { args: A2 },
            ValueType::I32 => Instruction::AddI32 { args: A2 },
            ValueType::I64 => Instruction::AddI64 { args: A2 },
            ValueType::F32 => Instruction::AddF32 { args: A2 },
            ValueType::F64 => Instruction::AddF64 { args: A2 },
            other => unreachable!("add of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        ExprValue::new_value(inst, ty)
    }

    pub fn create_add_check(&mut self, span: SrcSpan, lhs: ExprValue, rhs: ExprValue, is_signed: bool) {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let value_type = self.value_type(ty);
        let is_float = matches!(value_type, ValueType::F32 | ValueType::F64);
        let kind = if is_float {
            WarningKind::FloatOverflow
        } else {
            WarningKind::IntOverflow
        };
        if !self.warnings.is_enabled(kind) {
            return;
        }
        let src = self.add_span(span);
        let inst = match (value_type, is_signed) {
            (ValueType::I8, true) => Instruction::AddI8Check { args: A2, src },
            (ValueType::I16, true) => Instruction::AddI16Check { args: A2, src },
            (ValueType::I32, true) => Instruction::AddI32Check { args: A2, src },
            (ValueType::I64, true) => Instruction::AddI64Check { args: A2, src },
            (ValueType::I8, false) => Instruction::AddU8Check { args: A2, src },
            (ValueType::I16, false) => Instruction::AddU16Check { args: A2, src },
            (ValueType::I32, false) => Instruction::AddU32Check { args: A2, src },
            (ValueType::I64, false) => Instruction::AddU64Check { args: A2, src },
            (ValueType::F32, _) => Instruction::AddF32Check { args: A2, src },
            (ValueType::F64, _) => Instruction::AddF64Check { args: A2, src },
            (other, _) => unreachable!("add check of value type {:?}", other),
        };
        self.add_inst2(inst, lhs, rhs);
    }

    pub fn create_sub(&mut self, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match self.value_type(ty) {
            ValueType::I8 => Instruction::SubI8 { args: A2 },
            ValueType::I16 => Instruction::SubI16 { args: A2 },
            ValueType::I32 => Instruction::SubI32 { args: A2 },
            ValueType::I64 => Instruction::SubI64 { args: A2 },
            ValueType::F32 => Instruction::SubF32 { args: A2 },
            ValueType::F64 => Instruction::SubF64 { args: A2 },
            other => unreachable!("sub of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        ExprValue::new_value(inst, ty)
    }

    pub fn create_sub_check(&mut self, span: SrcSpan, lhs: ExprValue, rhs: ExprValue, is_signed: bool) {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let value_type = self.value_type(ty);
        let is_float = matches!(value_type, ValueType::F32 | ValueType::F64);
        let kind = if is_float {
            WarningKind::FloatOverflow
        } else {
            WarningKind::IntOverflow
        };
        if !self.warnings.is_enabled(kind) {
            return;
        }
        let src = self.add_span(span);
        let inst = match (value_type, is_signed) {
            (ValueType::I8, true) => Instruction::SubI8Check { args: A2, src },
            (ValueType::I16, true) => Instruction::SubI16Check { args: A2, src },
            (ValueType::I32, true) => Instruction::SubI32Check { args: A2, src },
            (ValueType::I64, true) => Instruction::SubI64Check { args: A2, src },
            (ValueType::I8, false) => Instruction::SubU8Check { args: A2, src },
            (ValueType::I16, false) => Instruction::SubU16Check { args: A2, src },
            (ValueType::I32, false) => Instruction::SubU32Check { args: A2, src },
            (ValueType::I64, false) => Instruction::SubU64Check { args: A2, src },
            (ValueType::F32, _) => Instruction::SubF32Check { args: A2, src },
            (ValueType::F64, _) => Instruction::SubF64Check { args: A2, src },
            (other, _) => unreachable!("sub check of value type {:?}", other),
        };
        self.add_inst2(inst, lhs, rhs);
    }

    pub fn create_mul(&mut self, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match self.value_type(ty) {
            ValueType::I8 => Instruction::MulI8 { args: A2 },
            ValueType::I16 => Instruction::MulI16 { args: A2 },
            ValueType::I32 => Instruction::MulI32 { args: A2 },
            ValueType::I64 => Instruction::MulI64 { args: A2 },
            ValueType::F32 => Instruction::MulF32 { args: A2 },
            ValueType::F64 => Instruction::MulF64 { args: A2 },
            other => unreachable!("mul of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        ExprValue::new_value(inst, ty)
    }

    pub fn create_mul_check(&mut self, span: SrcSpan, lhs: ExprValue, rhs: ExprValue, is_signed: bool) {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let value_type = self.value_type(ty);
        let is_float = matches!(value_type, ValueType::F32 | ValueType::F64);
        let kind = if is_float {
            WarningKind::FloatOverflow
        } else {
            WarningKind::IntOverflow
        };
        if !self.warnings.is_enabled(kind) {
            return;
        }
        let src = self.add_span(span);
        let inst = match (value_type, is_signed) {
            (ValueType::I8, true) => Instruction::MulI8Check { args: A2, src },
            (ValueType::I16, true) => Instruction::MulI16Check { args: A2, src },
            (ValueType::I32, true) => Instruction::MulI32Check { args: A2, src },
            (ValueType::I64, true) => Instruction::MulI64Check { args: A2, src },
            (ValueType::I8, false) => Instruction::MulU8Check { args: A2, src },
            (ValueType::I16, false) => Instruction::MulU16Check { args: A2, src },
            (ValueType::I32, false) => Instruction::MulU32Check { args: A2, src },
            (ValueType::I64, false) => Instruction::MulU64Check { args: A2, src },
            (ValueType::F32, _) => Instruction::MulF32Check { args: A2, src },
            (ValueType::F64, _) => Instruction::MulF64Check { args: A2, src },
            (other, _) => unreachable!("mul check of value type {:?}", other),
        };
        self.add_inst2(inst, lhs, rhs);
    }

    /// Division; the zero-divisor (and signed overflow) check is emitted
    /// unconditionally because its failure is a hard error.
    pub fn create_div(&mut self, span: SrcSpan, lhs: ExprValue, rhs: ExprValue, is_signed: bool) -> ExprValue {
        self.create_div_check(span, lhs, rhs, is_signed);
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match (self.value_type(ty), is_signed) {
            (ValueType::I8, true) => Instruction::DivI8 { args: A2 },
            (ValueType::I16, true) => Instruction::DivI16 { args: A2 },
            (ValueType::I32, true) => Instruction::DivI32 { args: A2 },
            (ValueType::I64, true) => Instruction::DivI64 { args: A2 },
            (ValueType::I8, false) => Instruction::DivU8 { args: A2 },
            (ValueType::I16, false) => Instruction::DivU16 { args: A2 },
            (ValueType::I32, false) => Instruction::DivU32 { args: A2 },
            (ValueType::I64, false) => Instruction::DivU64 { args: A2 },
            (ValueType::F32, _) => Instruction::DivF32 { args: A2 },
            (ValueType::F64, _) => Instruction::DivF64 { args: A2 },
            (other, _) => unreachable!("div of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        ExprValue::new_value(inst, ty)
    }

    pub fn create_div_check(&mut self, span: SrcSpan, lhs: ExprValue, rhs: ExprValue, is_signed: bool) {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let value_type = self.value_type(ty);
        if matches!(value_type, ValueType::F32 | ValueType::F64)
            && !self.warnings.is_enabled(WarningKind::FloatDivideByZero)
        {
            return;
        }
        let src = self.add_span(span);
        let inst = match (value_type, is_signed) {
            (ValueType::I8, true) => Instruction::DivI8Check { args: A2, src },
            (ValueType::I16, true) => Instruction::DivI16Check { args: A2, src },
            (ValueType::I32, true) => Instruction::DivI32Check { args: A2, src },
            (ValueType::I64, true) => Instruction::DivI64Check { args: A2, src },
            (ValueType::I8, false) => Instruction::DivU8Check { args: A2, src },
            (ValueType::I16, false) => Instruction::DivU16Check { args: A2, src },
            (ValueType::I32, false) => Instruction::DivU32Check { args: A2, src },
            (ValueType::I64, false) => Instruction::DivU64Check { args: A2, src },
            (ValueType::F32, _) => Instruction::DivF32Check { args: A2, src },
            (ValueType::F64, _) => Instruction::DivF64Check { args: A2, src },
            (other, _) => unreachable!("div check of value type {:?}", other),
        };
        self.add_inst2(inst, lhs, rhs);
    }

    pub fn create_rem(&mut self, span: SrcSpan, lhs: ExprValue, rhs: ExprValue, is_signed: bool) -> ExprValue {
        // Zero-divisor check first; a hard error at run time.
        {
            let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
            let src = self.add_span(span);
            let inst = match (self.value_type(ty), is_signed) {
                (ValueType::I8, true) => Instruction::RemI8Check { args: A2, src },
                (ValueType::I16, true) => Instruction::RemI16Check { args: A2, src },
                (ValueType::I32, true) => Instruction::RemI32Check { args: A2, src },
                (ValueType::I64, true) => Instruction::RemI64Check { args: A2, src },
                (ValueType::I8, false) => Instruction::RemU8Check { args: A2, src },
                (ValueType::I16, false) => Instruction::RemU16Check { args: A2, src },
                (ValueType::I32, false) => Instruction::RemU32Check { args: A2, src },
                (ValueType::I64, false) => Instruction::RemU64Check { args: A2, src },
                (other, _) => unreachable!("rem check of value type {:?}", other),
            };
            self.add_inst2(inst, lhs, rhs);
        }
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match (self.value_type(ty), is_signed) {
            (ValueType::I8, true) => Instruction::RemI8 { args: A2 },
            (ValueType::I16, true) => Instruction::RemI16 { args: A2 },
            (ValueType::I32, true) => Instruction::RemI32 { args: A2 },
            (ValueType::I64, true) => Instruction::RemI64 { args: A2 },
            (ValueType::I8, false) => Instruction::RemU8 { args: A2 },
            (ValueType::I16, false) => Instruction::RemU16 { args: A2 },
            (ValueType::I32, false) => Instruction::RemU32 { args: A2 },
            (ValueType::I64, false) => Instruction::RemU64 { args: A2 },
            (other, _) => unreachable!("rem of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        ExprValue::new_value(inst, ty)
    }

    ////////// pointer arithmetic //////////

    /// Pointer plus integer offset, bounds-checked against the underlying
    /// object at run time.
    pub fn create_ptr_add(
        &mut self,
        span: SrcSpan,
        address: ExprValue,
        offset: ExprValue,
        is_offset_signed: bool,
        elem_ty: TypeIdx,
    ) -> ExprValue {
        let src = self.add_span(span);
        let check = self.add_ptr_arith_check_info(PtrArithCheckInfo {
            object_type: elem_ty,
        });
        let address_instr = self.value_instr_of(address);
        let offset = self.value_of(offset);
        let pointer = self.type_set.pointer_type();
        let inst = match (self.value_type(offset.ty()), is_offset_signed) {
            (ValueType::I32, true) => Instruction::AddPtrI32 { args: A2, src, check },
            (ValueType::I32, false) => Instruction::AddPtrU32 { args: A2, src, check },
            (ValueType::I64, true) => Instruction::AddPtrI64 { args: A2, src, check },
            (ValueType::I64, false) => Instruction::AddPtrU64 { args: A2, src, check },
            (other, _) => unreachable!("ptr add offset of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, address_instr, offset.instr());
        ExprValue::new_value(inst, pointer)
    }

    pub fn create_ptr_sub(
        &mut self,
        span: SrcSpan,
        address: ExprValue,
        offset: ExprValue,
        is_offset_signed: bool,
        elem_ty: TypeIdx,
    ) -> ExprValue {
        let src = self.add_span(span);
        let check = self.add_ptr_arith_check_info(PtrArithCheckInfo {
            object_type: elem_ty,
        });
        let address_instr = self.value_instr_of(address);
        let offset = self.value_of(offset);
        let pointer = self.type_set.pointer_type();
        let inst = match (self.value_type(offset.ty()), is_offset_signed) {
            (ValueType::I32, true) => Instruction::SubPtrI32 { args: A2, src, check },
            (ValueType::I32, false) => Instruction::SubPtrU32 { args: A2, src, check },
            (ValueType::I64, true) => Instruction::SubPtrI64 { args: A2, src, check },
            (ValueType::I64, false) => Instruction::SubPtrU64 { args: A2, src, check },
            (other, _) => unreachable!("ptr sub offset of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, address_instr, offset.instr());
        ExprValue::new_value(inst, pointer)
    }

    /// Statically known pointer displacement with no run-time check; used
    /// by codegen itself where the bound is known to hold.
    pub fn create_ptr_add_const_unchecked(
        &mut self,
        address: ExprValue,
        amount: i64,
        elem_ty: TypeIdx,
    ) -> ExprValue {
        let stride = self.type_set.size_of(elem_ty).bytes();
        let pointer = self.type_set.pointer_type();
        let address = self.value_instr_of(address);
        let offset = (amount as i128 * stride as i128) as u64;
        let inst = self.add_inst1(Instruction::ConstGep { args: A1, offset }, address);
        ExprValue::new_value(inst, pointer)
    }

    /// Pointer difference in elements of `elem_ty`.
    pub fn create_ptrdiff(
        &mut self,
        span: SrcSpan,
        lhs: ExprValue,
        rhs: ExprValue,
        elem_ty: TypeIdx,
    ) -> ExprValue {
        let src = self.add_span(span);
        let stride = self.type_set.size_of(elem_ty).bytes();
        let lhs = self.value_instr_of(lhs);
        let rhs = self.value_instr_of(rhs);
        let (inst, result_ty) = if self.is_64_bit() {
            (
                Instruction::Ptr64Diff { args: A2, src, stride },
                self.type_set.builtin_type(BuiltinKind::I64),
            )
        } else {
            (
                Instruction::Ptr32Diff { args: A2, src, stride },
                self.type_set.builtin_type(BuiltinKind::I32),
            )
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        ExprValue::new_value(inst, result_ty)
    }

    ////////// bit operations //////////

    pub fn create_not(&mut self, value: ExprValue) -> ExprValue {
        let value = self.value_of(value);
        let ty = value.ty();
        let inst = match self.value_type(ty) {
            ValueType::I1 => Instruction::NotI1 { args: A1 },
            ValueType::I8 => Instruction::NotI8 { args: A1 },
            ValueType::I16 => Instruction::NotI16 { args: A1 },
            ValueType::I32 => Instruction::NotI32 { args: A1 },
            ValueType::I64 => Instruction::NotI64 { args: A1 },
            other => unreachable!("not of value type {:?}", other),
        };
        let inst = self.add_inst1(inst, value.instr());
        ExprValue::new_value(inst, ty)
    }

    pub fn create_and(&mut self, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match self.value_type(ty) {
            ValueType::I1 => Instruction::AndI1 { args: A2 },
            ValueType::I8 => Instruction::AndI8 { args: A2 },
            ValueType::I16 => Instruction::AndI16 { args: A2 },
            ValueType::I32 => Instruction::AndI32 { args: A2 },
            ValueType::I64 => Instruction::AndI64 { args: A2 },
            other => unreachable!("and of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        ExprValue::new_value(inst, ty)
    }

    pub fn create_xor(&mut self, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match self.value_type(ty) {
            ValueType::I1 => Instruction::XorI1 { args: A2 },
            ValueType::I8 => Instruction::XorI8 { args: A2 },
            ValueType::I16 => Instruction::XorI16 { args: A2 },
            ValueType::I32 => Instruction::XorI32 { args: A2 },
            ValueType::I64 => Instruction::XorI64 { args: A2 },
            other => unreachable!("xor of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        ExprValue::new_value(inst, ty)
    }

    pub fn create_or(&mut self, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match self.value_type(ty) {
            ValueType::I1 => Instruction::OrI1 { args: A2 },
            ValueType::I8 => Instruction::OrI8 { args: A2 },
            ValueType::I16 => Instruction::OrI16 { args: A2 },
            ValueType::I32 => Instruction::OrI32 { args: A2 },
            ValueType::I64 => Instruction::OrI64 { args: A2 },
            other => unreachable!("or of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        ExprValue::new_value(inst, ty)
    }

    /// Shift left. Out-of-range amounts are reported through the embedded
    /// check; the produced value is then unobservable.
    pub fn create_shl(&mut self, span: SrcSpan, lhs: ExprValue, rhs: ExprValue, is_rhs_signed: bool) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let src = self.add_span(span);
        let inst = match (self.value_type(ty), is_rhs_signed) {
            (ValueType::I8, true) => Instruction::ShlI8Signed { args: A2, src },
            (ValueType::I16, true) => Instruction::ShlI16Signed { args: A2, src },
            (ValueType::I32, true) => Instruction::ShlI32Signed { args: A2, src },
            (ValueType::I64, true) => Instruction::ShlI64Signed { args: A2, src },
            (ValueType::I8, false) => Instruction::ShlI8Unsigned { args: A2, src },
            (ValueType::I16, false) => Instruction::ShlI16Unsigned { args: A2, src },
            (ValueType::I32, false) => Instruction::ShlI32Unsigned { args: A2, src },
            (ValueType::I64, false) => Instruction::ShlI64Unsigned { args: A2, src },
            (other, _) => unreachable!("shl of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        ExprValue::new_value(inst, ty)
    }

    pub fn create_shr(&mut self, span: SrcSpan, lhs: ExprValue, rhs: ExprValue, is_rhs_signed: bool) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let src = self.add_span(span);
        let inst = match (self.value_type(ty), is_rhs_signed) {
            (ValueType::I8, true) => Instruction::ShrI8Signed { args: A2, src },
            (ValueType::I16, true) => Instruction::ShrI16Signed { args: A2, src },
            (ValueType::I32, true) => Instruction::ShrI32Signed { args: A2, src },
            (ValueType::I64, true) => Instruction::ShrI64Signed { args: A2, src },
            (ValueType::I8, false) => Instruction::ShrI8Unsigned { args: A2, src },
            (ValueType::I16, false) => Instruction::ShrI16Unsigned { args: A2, src },
            (ValueType::I32, false) => Instruction::ShrI32Unsigned { args: A2, src },
            (ValueType::I64, false) => Instruction::ShrI64Unsigned { args: A2, src },
            (other, _) => unreachable!("shr of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        ExprValue::new_value(inst, ty)
    }

    ////////// abs, min, max //////////

    pub fn create_abs(&mut self, value: ExprValue) -> ExprValue {
        let value = self.value_of(value);
        let ty = value.ty();
        let inst = match self.value_type(ty) {
            ValueType::I8 => Instruction::AbsI8 { args: A1 },
            ValueType::I16 => Instruction::AbsI16 { args: A1 },
            ValueType::I32 => Instruction::AbsI32 { args: A1 },
            ValueType::I64 => Instruction::AbsI64 { args: A1 },
            ValueType::F32 => Instruction::AbsF32 { args: A1 },
            ValueType::F64 => Instruction::AbsF64 { args: A1 },
            other => unreachable!("abs of value type {:?}", other),
        };
        let inst = self.add_inst1(inst, value.instr());
        ExprValue::new_value(inst, ty)
    }

    pub fn create_abs_check(&mut self, span: SrcSpan, value: ExprValue) {
        let value = self.value_of(value);
        let value_type = self.value_type(value.ty());
        let kind = match value_type {
            ValueType::F32 | ValueType::F64 => WarningKind::MathDomainError,
            _ => WarningKind::IntOverflow,
        };
        if !self.warnings.is_enabled(kind) {
            return;
        }
        let src = self.add_span(span);
        let inst = match value_type {
            ValueType::I8 => Instruction::AbsI8Check { args: A1, src },
            ValueType::I16 => Instruction::AbsI16Check { args: A1, src },
            ValueType::I32 => Instruction::AbsI32Check { args: A1, src },
            ValueType::I64 => Instruction::AbsI64Check { args: A1, src },
            ValueType::F32 => Instruction::AbsF32Check { args: A1, src },
            ValueType::F64 => Instruction::AbsF64Check { args: A1, src },
            other => unreachable!("abs check of value type {:?}", other),
        };
        self.add_inst1(inst, value.instr());
    }

    pub fn create_min(&mut self, lhs: ExprValue, rhs: ExprValue, is_signed: bool) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match (self.value_type(ty), is_signed) {
            (ValueType::I8, true) => Instruction::MinI8 { args: A2 },
            (ValueType::I16, true) => Instruction::MinI16 { args: A2 },
            (ValueType::I32, true) => Instruction::MinI32 { args: A2 },
            (ValueType::I64, true) => Instruction::MinI64 { args: A2 },
            (ValueType::I8, false) => Instruction::MinU8 { args: A2 },
            (ValueType::I16, false) => Instruction::MinU16 { args: A2 },
            (ValueType::I32, false) => Instruction::MinU32 { args: A2 },
            (ValueType::I64, false) => Instruction::MinU64 { args: A2 },
            (ValueType::F32, _) => Instruction::MinF32 { args: A2 },
            (ValueType::F64, _) => Instruction::MinF64 { args: A2 },
            (other, _) => unreachable!("min of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        ExprValue::new_value(inst, ty)
    }

    pub fn create_min_check(&mut self, span: SrcSpan, lhs: ExprValue, rhs: ExprValue) {
        if !self.warnings.is_enabled(WarningKind::MathDomainError) {
            return;
        }
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let src = self.add_span(span);
        let inst = match self.value_type(ty) {
            ValueType::F32 => Instruction::MinF32Check { args: A2, src },
            ValueType::F64 => Instruction::MinF64Check { args: A2, src },
            _ => return,
        };
        self.add_inst2(inst, lhs, rhs);
    }

    pub fn create_max(&mut self, lhs: ExprValue, rhs: ExprValue, is_signed: bool) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let inst = match (self.value_type(ty), is_signed) {
            (ValueType::I8, true) => Instruction::MaxI8 { args: A2 },
            (ValueType::I16, true) => Instruction::MaxI16 { args: A2 },
            (ValueType::I32, true) => Instruction::MaxI32 { args: A2 },
            (ValueType::I64, true) => Instruction::MaxI64 { args: A2 },
            (ValueType::I8, false) => Instruction::MaxU8 { args: A2 },
            (ValueType::I16, false) => Instruction::MaxU16 { args: A2 },
            (ValueType::I32, false) => Instruction::MaxU32 { args: A2 },
            (ValueType::I64, false) => Instruction::MaxU64 { args: A2 },
            (ValueType::F32, _) => Instruction::MaxF32 { args: A2 },
            (ValueType::F64, _) => Instruction::MaxF64 { args: A2 },
            (other, _) => unreachable!("max of value type {:?}", other),
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        ExprValue::new_value(inst, ty)
    }

    pub fn create_max_check(&mut self, span: SrcSpan, lhs: ExprValue, rhs: ExprValue) {
        if !self.warnings.is_enabled(WarningKind::MathDomainError) {
            return;
        }
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let src = self.add_span(span);
        let inst = match self.value_type(ty) {
            ValueType::F32 => Instruction::MaxF32Check { args: A2, src },
            ValueType::F64 => Instruction::MaxF64Check { args: A2, src },
            _ => return,
        };
        self.add_inst2(inst, lhs, rhs);
    }

    ////////// math intrinsics //////////

    pub fn create_math_unary(&mut self, op: MathUnaryOp, value: ExprValue) -> ExprValue {
        let value = self.value_of(value);
        let ty = value.ty();
        let is_f32 = matches!(self.value_type(ty), ValueType::F32);
        use MathUnaryOp::*;
        let inst = match (op, is_f32) {
            (Exp, true) => Instruction::ExpF32 { args: A1 },
            (Exp, false) => Instruction::ExpF64 { args: A1 },
            (Exp2, true) => Instruction::Exp2F32 { args: A1 },
            (Exp2, false) => Instruction::Exp2F64 { args: A1 },
            (Expm1, true) => Instruction::Expm1F32 { args: A1 },
            (Expm1, false) => Instruction::Expm1F64 { args: A1 },
            (Log, true) => Instruction::LogF32 { args: A1 },
            (Log, false) => Instruction::LogF64 { args: A1 },
            (Log10, true) => Instruction::Log10F32 { args: A1 },
            (Log10, false) => Instruction::Log10F64 { args: A1 },
            (Log2, true) => Instruction::Log2F32 { args: A1 },
            (Log2, false) => Instruction::Log2F64 { args: A1 },
            (Log1p, true) => Instruction::Log1pF32 { args: A1 },
            (Log1p, false) => Instruction::Log1pF64 { args: A1 },
            (Sqrt, true) => Instruction::SqrtF32 { args: A1 },
            (Sqrt, false) => Instruction::SqrtF64 { args: A1 },
            (Cbrt, true) => Instruction::CbrtF32 { args: A1 },
            (Cbrt, false) => Instruction::CbrtF64 { args: A1 },
            (Sin, true) => Instruction::SinF32 { args: A1 },
            (Sin, false) => Instruction::SinF64 { args: A1 },
            (Cos, true) => Instruction::CosF32 { args: A1 },
            (Cos, false) => Instruction::CosF64 { args: A1 },
            (Tan, true) => Instruction::TanF32 { args: A1 },
            (Tan, false) => Instruction::TanF64 { args: A1 },
            (Asin, true) => Instruction::AsinF32 { args: A1 },
            (Asin, false) => Instruction::AsinF64 { args: A1 },
            (Acos, true) => Instruction::AcosF32 { args: A1 },
            (Acos, false) => Instruction::AcosF64 { args: A1 },
            (Atan, true) => Instruction::AtanF32 { args: A1 },
            (Atan, false) => Instruction::AtanF64 { args: A1 },
            (Sinh, true) => Instruction::SinhF32 { args: A1 },
            (Sinh, false) => Instruction::SinhF64 { args: A1 },
            (Cosh, true) => Instruction::CoshF32 { args: A1 },
            (Cosh, false) => Instruction::CoshF64 { args: A1 },
            (Tanh, true) => Instruction::TanhF32 { args: A1 },
            (Tanh, false) => Instruction::TanhF64 { args: A1 },
            (Asinh, true) => Instruction::AsinhF32 { args: A1 },
            (Asinh, false) => Instruction::AsinhF64 { args: A1 },
            (Acosh, true) => Instruction::AcoshF32 { args: A1 },
            (Acosh, false) => Instruction::AcoshF64 { args: A1 },
            (Atanh, true) => Instruction::AtanhF32 { args: A1 },
            (Atanh, false) => Instruction::AtanhF64 { args: A1 },
            (Erf, true) => Instruction::ErfF32 { args: A1 },
            (Erf, false) => Instruction::ErfF64 { args: A1 },
            (Erfc, true) => Instruction::ErfcF32 { args: A1 },
            (Erfc, false) => Instruction::ErfcF64 { args: A1 },
            (Tgamma, true) => Instruction::TgammaF32 { args: A1 },
            (Tgamma, false) => Instruction::TgammaF64 { args: A1 },
            (Lgamma, true) => Instruction::LgammaF32 { args: A1 },
            (Lgamma, false) => Instruction::LgammaF64 { args: A1 },
        };
        let inst = self.add_inst1(inst, value.instr());
        ExprValue::new_value(inst, ty)
    }

    pub fn create_math_unary_check(&mut self, span: SrcSpan, op: MathUnaryOp, value: ExprValue) {
        if !self.warnings.is_enabled(WarningKind::MathDomainError) {
            return;
        }
        let value = self.value_of(value);
        let is_f32 = matches!(self.value_type(value.ty()), ValueType::F32);
        let src = self.add_span(span);
        use MathUnaryOp::*;
        let inst = match (op, is_f32) {
            (Exp, true) => Instruction::ExpF32Check { args: A1, src },
            (Exp, false) => Instruction::ExpF64Check { args: A1, src },
            (Exp2, true) => Instruction::Exp2F32Check { args: A1, src },
            (Exp2, false) => Instruction::Exp2F64Check { args: A1, src },
            (Expm1, true) => Instruction::Expm1F32Check { args: A1, src },
            (Expm1, false) => Instruction::Expm1F64Check { args: A1, src },
            (Log, true) => Instruction::LogF32Check { args: A1, src },
            (Log, false) => Instruction::LogF64Check { args: A1, src },
            (Log10, true) => Instruction::Log10F32Check { args: A1, src },
            (Log10, false) => Instruction::Log10F64Check { args: A1, src },
            (Log2, true) => Instruction::Log2F32Check { args: A1, src },
            (Log2, false) => Instruction::Log2F64Check { args: A1, src },
            (Log1p, true) => Instruction::Log1pF32Check { args: A1, src },
            (Log1p, false) => Instruction::Log1pF64Check { args: A1, src },
            (Sqrt, true) => Instruction::SqrtF32Check { args: A1, src },
            (Sqrt, false) => Instruction::SqrtF64Check { args: A1, src },
            (Cbrt, true) => Instruction::CbrtF32Check { args: A1, src },
            (Cbrt, false) => Instruction::CbrtF64Check { args: A1, src },
            (Sin, true) => Instruction::SinF32Check { args: A1, src },
            (Sin, false) => Instruction::SinF64Check { args: A1, src },
            (Cos, true) => Instruction::CosF32Check { args: A1, src },
            (Cos, false) => Instruction::CosF64Check { args: A1, src },
            (Tan, true) => Instruction::TanF32Check { args: A1, src },
            (Tan, false) => Instruction::TanF64Check { args: A1, src },
            (Asin, true) => Instruction::AsinF32Check { args: A1, src },
            (Asin, false) => Instruction::AsinF64Check { args: A1, src },
            (Acos, true) => Instruction::AcosF32Check { args: A1, src },
            (Acos, false) => Instruction::AcosF64Check { args: A1, src },
            (Atan, true) => Instruction::AtanF32Check { args: A1, src },
            (Atan, false) => Instruction::AtanF64Check { args: A1, src },
            (Sinh, true) => Instruction::SinhF32Check { args: A1, src },
            (Sinh, false) => Instruction::SinhF64Check { args: A1, src },
            (Cosh, true) => Instruction::CoshF32Check { args: A1, src },
            (Cosh, false) => Instruction::CoshF64Check { args: A1, src },
            (Tanh, true) => Instruction::TanhF32Check { args: A1, src },
            (Tanh, false) => Instruction::TanhF64Check { args: A1, src },
            (Asinh, true) => Instruction::AsinhF32Check { args: A1, src },
            (Asinh, false) => Instruction::AsinhF64Check { args: A1, src },
            (Acosh, true) => Instruction::AcoshF32Check { args: A1, src },
            (Acosh, false) => Instruction::AcoshF64Check { args: A1, src },
            (Atanh, true) => Instruction::AtanhF32Check { args: A1, src },
            (Atanh, false) => Instruction::AtanhF64Check { args: A1, src },
            (Erf, true) => Instruction::ErfF32Check { args: A1, src },
            (Erf, false) => Instruction::ErfF64Check { args: A1, src },
            (Erfc, true) => Instruction::ErfcF32Check { args: A1, src },
            (Erfc, false) => Instruction::ErfcF64Check { args: A1, src },
            (Tgamma, true) => Instruction::TgammaF32Check { args: A1, src },
            (Tgamma, false) => Instruction::TgammaF64Check { args: A1, src },
            (Lgamma, true) => Instruction::LgammaF32Check { args: A1, src },
            (Lgamma, false) => Instruction::LgammaF64Check { args: A1, src },
        };
        self.add_inst1(inst, value.instr());
    }

    pub fn create_math_binary(&mut self, op: MathBinaryOp, lhs: ExprValue, rhs: ExprValue) -> ExprValue {
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let is_f32 = matches!(self.value_type(ty), ValueType::F32);
        let inst = match (op, is_f32) {
            (MathBinaryOp::Pow, true) => Instruction::PowF32 { args: A2 },
            (MathBinaryOp::Pow, false) => Instruction::PowF64 { args: A2 },
            (MathBinaryOp::Atan2, true) => Instruction::Atan2F32 { args: A2 },
            (MathBinaryOp::Atan2, false) => Instruction::Atan2F64 { args: A2 },
            (MathBinaryOp::Hypot, true) => Instruction::HypotF32 { args: A2 },
            (MathBinaryOp::Hypot, false) => Instruction::HypotF64 { args: A2 },
        };
        let inst = self.add_inst2(inst, lhs, rhs);
        ExprValue::new_value(inst, ty)
    }

    pub fn create_math_binary_check(
        &mut self,
        span: SrcSpan,
        op: MathBinaryOp,
        lhs: ExprValue,
        rhs: ExprValue,
    ) {
        if !self.warnings.is_enabled(WarningKind::MathDomainError) {
            return;
        }
        let (lhs, rhs, ty) = self.binary_value_args(lhs, rhs);
        let is_f32 = matches!(self.value_type(ty), ValueType::F32);
        let src = self.add_span(span);
        let inst = match (op, is_f32) {
            (MathBinaryOp::Pow, true) => Instruction::PowF32Check { args: A2, src },
            (MathBinaryOp::Pow, false) => Instruction::PowF64Check { args: A2, src },
            (MathBinaryOp::Atan2, true) => Instruction::Atan2F32Check { args: A2, src },
            (MathBinaryOp::Atan2, false) => Instruction::Atan2F64Check { args: A2, src },
            (MathBinaryOp::Hypot, true) => Instruction::HypotF32Check { args: A2, src },
            (MathBinaryOp::Hypot, false) => Instruction::HypotF64Check { args: A2, src },
        };
        self.add_inst2(inst, lhs, rhs);
    }

    ////////// bit manipulation intrinsics //////////

    pub fn create_bitreverse(&mut self, value: ExprValue) -> ExprValue {
        let value = self.value_of(value);
        let ty = value.ty();
        let inst = match self.value_type(ty) {
            ValueType::I8 => Instruction::BitreverseU8 { args: A1 },
            ValueType::I16 => Instruction::BitreverseU16 { args: A1 },
            ValueType::I32 => Instruction::BitreverseU32 { args: A1 },
            ValueType::I64 => Instruction::BitreverseU64 { args: A1 },
            other => unreachable!("bitreverse of value type {:?}", other),
        };
        let inst = self.add_inst1(inst, value.instr());
        ExprValue::new_value(inst, ty)
    }

    pub fn create_popcount(&mut self, value: ExprValue) -> ExprValue {
        let value = self.value_of(value);
        let ty = value.ty();
        let inst = match self.value_type(ty) {
            ValueType::I8 => Instruction::PopcountU8 { args: A1 },
            ValueType::I16 => Instruction::PopcountU16 { args: A1 },
            ValueType::I32 => Instruction::PopcountU32 { args: A1 },
            ValueType::I64 => Instruction::PopcountU64 { args: A1 },
            other => unreachable!("popcount of value type {:?}", other),
        };
        let inst = self.add_inst1(inst, value.instr());
        ExprValue::new_value(inst, ty)
    }

    pub fn create_byteswap(&mut self, value: ExprValue) -> ExprValue {
        let value = self.value_of(value);
        let ty = value.ty();
        let inst = match self.value_type(ty) {
            ValueType::I16 => Instruction::ByteswapU16 { args: A1 },
            ValueType::I32 => Instruction::ByteswapU32 { args: A1 },
            ValueType::I64 => Instruction::ByteswapU64 { args: A1 },
            other => unreachable!("byteswap of value type {:?}", other),
        };
        let inst = self.add_inst1(inst, value.instr());
        ExprValue::new_value(inst, ty)
    }

    pub fn create_clz(&mut self, value: ExprValue) -> ExprValue {
        let value = self.value_of(value);
        let ty = value.ty();
        let inst = match self.value_type(ty) {
            ValueType::I8 => Instruction::ClzU8 { args: A1 },
            ValueType::I16 => Instruction::ClzU16 { args: A1 },
            ValueType::I32 => Instruction::ClzU32 { args: A1 },
            ValueType::I64 => Instruction::ClzU64 { args: A1 },
            other => unreachable!("clz of value type {:?}", other),
        };
        let inst = self.add_inst1(inst, value.instr());
        ExprValue::new_value(inst, ty)
    }

    pub fn create_ctz(&mut self, value: ExprValue) -> ExprValue {
        let value = self.value_of(value);
        let ty = value.ty();
        let inst = match self.value_type(ty) {
            ValueType::I8 => Instruction::CtzU8 { args: A1 },
            ValueType::I16 => Instruction::CtzU16 { args: A1 },
            ValueType::I32 => Instruction::CtzU32 { args: A1 },
            ValueType::I64 => Instruction::CtzU64 { args: A1 },
            other => unreachable!("ctz of value type {:?}", other),
        };
        let inst = self.add_inst1(inst, value.instr());
        ExprValue::new_value(inst, ty)
    }

    pub fn create_fshl(&mut self, a: ExprValue, b: ExprValue, amount: ExprValue) -> ExprValue {
        let a = self.value_of(a);
        let b = self.value_of(b);
        let amount = self.value_of(amount);
        let ty = a.ty();
        let inst = match self.value_type(ty) {
            ValueType::I8 => Instruction::FshlU8 { args: A3 },
            ValueType::I16 => Instruction::FshlU16 { args: A3 },
            ValueType::I32 => Instruction::FshlU32 { args: A3 },
            ValueType::I64 => Instruction::FshlU64 { args: A3 },
            other => unreachable!("fshl of value type {:?}", other),
        };
        let inst = self.add_inst3(inst, a.instr(), b.instr(), amount.instr());
        ExprValue::new_value(inst, ty)
    }

    pub fn create_fshr(&mut self, a: ExprValue, b: ExprValue, amount: ExprValue) -> ExprValue {
        let a = self.value_of(a);
        let b = self.value_of(b);
        let amount = self.value_of(amount);
        let ty = a.ty();
        let inst = match self.value_type(ty) {
            ValueType::I8 => Instruction::FshrU8 { args: A3 },
            ValueType::I16 => Instruction::FshrU16 { args: A3 },
            ValueType::I32 => Instruction::FshrU32 { args: A3 },
            ValueType::I64 => Instruction::FshrU64 { args: A3 },
            other => unreachable!("fshr of value type {:?}", other),
        };
        let inst = self.add_inst3(inst, a.instr(), b.instr(), amount.instr());
        ExprValue::new_value(inst, ty)
    }

    ////////// diagnostics and runtime checks //////////

    /// An `error` instruction whose message fires if execution reaches it.
    pub fn create_error(&mut self, span: SrcSpan, message: impl Into<String>) -> InstrRef {
        let error = self.add_error_info(span, message.into());
        self.add_inst(Instruction::Error { args: A0, error })
    }

    /// A runtime-reported error whose message is the pointed-at string.
    pub fn create_error_str(&mut self, span: SrcSpan, begin: ExprValue, end: ExprValue) -> InstrRef {
        let src = self.add_span(span);
        let begin = self.value_instr_of(begin);
        let end = self.value_instr_of(end);
        self.add_inst2(
            Instruction::DiagnosticStr {
                args: A2,
                src,
                kind: None,
            },
            begin,
            end,
        )
    }

    pub fn create_warning_str(
        &mut self,
        span: SrcSpan,
        kind: WarningKind,
        begin: ExprValue,
        end: ExprValue,
    ) -> Option<InstrRef> {
        if !self.warnings.is_enabled(kind) {
            return None;
        }
        let src = self.add_span(span);
        let begin = self.value_instr_of(begin);
        let end = self.value_instr_of(end);
        Some(self.add_inst2(
            Instruction::DiagnosticStr {
                args: A2,
                src,
                kind: Some(kind),
            },
            begin,
            end,
        ))
    }

    pub fn create_array_bounds_check(
        &mut self,
        span: SrcSpan,
        index: ExprValue,
        size: ExprValue,
        is_index_signed: bool,
    ) {
        if !self.warnings.is_enabled(WarningKind::OutOfBoundsIndex) {
            return;
        }
        let (index, size, ty) = self.binary_value_args(index, size);
        let src = self.add_span(span);
        let inst = match (self.value_type(ty), is_index_signed) {
            (ValueType::I32, true) => Instruction::ArrayBoundsCheckI32 { args: A2, src },
            (ValueType::I32, false) => Instruction::ArrayBoundsCheckU32 { args: A2, src },
            (ValueType::I64, true) => Instruction::ArrayBoundsCheckI64 { args: A2, src },
            (ValueType::I64, false) => Instruction::ArrayBoundsCheckU64 { args: A2, src },
            (other, _) => unreachable!("bounds check of value type {:?}", other),
        };
        self.add_inst2(inst, index, size);
    }

    pub fn create_optional_get_value_check(&mut self, span: SrcSpan, has_value: ExprValue) {
        let has_value = self.value_instr_of(has_value);
        let src = self.add_span(span);
        self.add_inst1(Instruction::OptionalGetValueCheck { args: A1, src }, has_value);
    }

    pub fn create_str_construction_check(&mut self, span: SrcSpan, begin: ExprValue, end: ExprValue) {
        if !self.warnings.is_enabled(WarningKind::BadSliceConstruction) {
            return;
        }
        let src = self.add_span(span);
        let begin = self.value_instr_of(begin);
        let end = self.value_instr_of(end);
        self.add_inst2(Instruction::StrConstructionCheck { args: A2, src }, begin, end);
    }

    pub fn create_slice_construction_check(
        &mut self,
        span: SrcSpan,
        begin: ExprValue,
        end: ExprValue,
        elem_ty: TypeIdx,
    ) {
        if !self.warnings.is_enabled(WarningKind::BadSliceConstruction) {
            return;
        }
        let src = self.add_span(span);
        let info = self.add_slice_check_info(SliceCheckInfo { elem_type: elem_ty });
        let begin = self.value_instr_of(begin);
        let end = self.value_instr_of(end);
        self.add_inst2(
            Instruction::SliceConstructionCheck { args: A2, src, info },
            begin,
            end,
        );
    }

    /// A dereferenceability check emitted ahead of loads through user
    /// pointers.
    pub fn create_memory_access_check(&mut self, span: SrcSpan, ptr: ExprValue, object_ty: TypeIdx) {
        if !self.warnings.is_enabled(WarningKind::NullPointerDereference) {
            return;
        }
        let src = self.add_span(span);
        let info = self.add_access_check_info(AccessCheckInfo {
            object_type: object_ty,
        });
        let ptr = self.value_instr_of(ptr);
        self.add_inst1(Instruction::MemoryAccessCheck { args: A1, src, info }, ptr);
    }

    ////////// destructor helpers //////////

    /// Registers a conditional variable destructor; used by variable
    /// declarations whose value may be moved out.
    pub fn register_variable_destruct(
        &mut self,
        destructor: Option<BodyId>,
        value: ExprValue,
        condition: Option<InstrRef>,
    ) {
        if destructor.is_none() {
            return;
        }
        self.push_destruct_operation(crate::context::DestructOp::Variable {
            destructor,
            value,
            condition,
        });
    }
}
