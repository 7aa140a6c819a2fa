//! The closed instruction taxonomy.
//!
//! Every variant is declared exactly once in the `for_each_instruction!`
//! list below, together with its payload fields, its operand value types
//! and its result value type. The `define_instructions!` consumer expands
//! that list into the [`Instruction`] enum and its static metadata
//! accessors, so the enum, the operand tables and the mnemonics can never
//! drift apart.
//!
//! Operands are stored as a fixed `args` array of [`ValueIdx`]; during
//! construction they hold [`ValueIdx::UNRESOLVED`] and the codegen context
//! records the real `InstrRef`s on the side, to be patched in by
//! finalization. Variable-length argument lists (`function_call`) go
//! through the per-function `call_args` side table instead.

use orec_session::warnings::WarningKind;

use crate::function::{
    AccessCheckIdx, CallArgsIdx, ErrorIdx, FuncIdx, GlobalIdx, InstIdx, PtrArithCheckIdx,
    SliceCheckIdx, SpanIdx, SwitchIdx, ValueIdx,
};
use crate::ty::TypeIdx;
use crate::value::ValueType;

macro_rules! count_args {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count_args!($($tail)*) };
}

macro_rules! define_instructions {
    (
        $(
            $snake:ident => $Variant:ident { $( $field:ident : $field_ty:ty ),* $(,)? },
                [ $( $arg:ident ),* $(,)? ], $result:ident;
        )*
    ) => {
        /// One instruction of the abstract machine. See the module docs.
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub enum Instruction {
            $(
                $Variant {
                    args: [ValueIdx; count_args!($($arg)*)],
                    $( $field: $field_ty, )*
                },
            )*
        }

        impl Instruction {
            /// The operand slots of this instruction, in declaration order.
            pub fn args(&self) -> &[ValueIdx] {
                match self {
                    $( Instruction::$Variant { args, .. } => args, )*
                }
            }

            /// Mutable operand slots; used by finalization to patch
            /// placeholders into flat value indices.
            pub fn args_mut(&mut self) -> &mut [ValueIdx] {
                match self {
                    $( Instruction::$Variant { args, .. } => args, )*
                }
            }

            /// The statically declared value type of each operand slot.
            pub fn arg_types(&self) -> &'static [ValueType] {
                match self {
                    $( Instruction::$Variant { .. } => &[ $( ValueType::$arg ),* ], )*
                }
            }

            /// The statically declared value type of the result.
            pub fn result_type(&self) -> ValueType {
                match self {
                    $( Instruction::$Variant { .. } => ValueType::$result, )*
                }
            }

            /// The display mnemonic, e.g. `add_i32_check`.
            pub fn mnemonic(&self) -> &'static str {
                match self {
                    $( Instruction::$Variant { .. } => stringify!($snake), )*
                }
            }
        }
    };
}

macro_rules! for_each_instruction {
    ($cb:ident) => {
        $cb! {
            // constants
            const_i1 => ConstI1 { value: bool }, [], I1;
            const_i8 => ConstI8 { value: i8 }, [], I8;
            const_i16 => ConstI16 { value: i16 }, [], I16;
            const_i32 => ConstI32 { value: i32 }, [], I32;
            const_i64 => ConstI64 { value: i64 }, [], I64;
            const_u8 => ConstU8 { value: u8 }, [], I8;
            const_u16 => ConstU16 { value: u16 }, [], I16;
            const_u32 => ConstU32 { value: u32 }, [], I32;
            const_u64 => ConstU64 { value: u64 }, [], I64;
            const_f32 => ConstF32 { value: f32 }, [], F32;
            const_f64 => ConstF64 { value: f64 }, [], F64;
            const_ptr_null => ConstPtrNull {}, [], Ptr;
            get_global_address => GetGlobalAddress { global: GlobalIdx }, [], Ptr;
            get_function_arg => GetFunctionArg { arg_index: u32 }, [], Any;

            // loads, big-endian
            load_i1_be => LoadI1Be {}, [Ptr], I1;
            load_i8_be => LoadI8Be {}, [Ptr], I8;
            load_i16_be => LoadI16Be {}, [Ptr], I16;
            load_i32_be => LoadI32Be {}, [Ptr], I32;
            load_i64_be => LoadI64Be {}, [Ptr], I64;
            load_f32_be => LoadF32Be {}, [Ptr], F32;
            load_f64_be => LoadF64Be {}, [Ptr], F64;
            load_ptr32_be => LoadPtr32Be {}, [Ptr], Ptr;
            load_ptr64_be => LoadPtr64Be {}, [Ptr], Ptr;

            // loads, little-endian
            load_i1_le => LoadI1Le {}, [Ptr], I1;
            load_i8_le => LoadI8Le {}, [Ptr], I8;
            load_i16_le => LoadI16Le {}, [Ptr], I16;
            load_i32_le => LoadI32Le {}, [Ptr], I32;
            load_i64_le => LoadI64Le {}, [Ptr], I64;
            load_f32_le => LoadF32Le {}, [Ptr], F32;
            load_f64_le => LoadF64Le {}, [Ptr], F64;
            load_ptr32_le => LoadPtr32Le {}, [Ptr], Ptr;
            load_ptr64_le => LoadPtr64Le {}, [Ptr], Ptr;

            // stores, big-endian
            store_i1_be => StoreI1Be {}, [I1, Ptr], None;
            store_i8_be => StoreI8Be {}, [I8, Ptr], None;
            store_i16_be => StoreI16Be {}, [I16, Ptr], None;
            store_i32_be => StoreI32Be {}, [I32, Ptr], None;
            store_i64_be => StoreI64Be {}, [I64, Ptr], None;
            store_f32_be => StoreF32Be {}, [F32, Ptr], None;
            store_f64_be => StoreF64Be {}, [F64, Ptr], None;
            store_ptr32_be => StorePtr32Be {}, [Ptr, Ptr], None;
            store_ptr64_be => StorePtr64Be {}, [Ptr, Ptr], None;

            // stores, little-endian
            store_i1_le => StoreI1Le {}, [I1, Ptr], None;
            store_i8_le => StoreI8Le {}, [I8, Ptr], None;
            store_i16_le => StoreI16Le {}, [I16, Ptr], None;
            store_i32_le => StoreI32Le {}, [I32, Ptr], None;
            store_i64_le => StoreI64Le {}, [I64, Ptr], None;
            store_f32_le => StoreF32Le {}, [F32, Ptr], None;
            store_f64_le => StoreF64Le {}, [F64, Ptr], None;
            store_ptr32_le => StorePtr32Le {}, [Ptr, Ptr], None;
            store_ptr64_le => StorePtr64Le {}, [Ptr, Ptr], None;

            // zero extension
            cast_zext_i1_to_i8 => CastZextI1ToI8 {}, [I1], I8;
            cast_zext_i1_to_i16 => CastZextI1ToI16 {}, [I1], I16;
            cast_zext_i1_to_i32 => CastZextI1ToI32 {}, [I1], I32;
            cast_zext_i1_to_i64 => CastZextI1ToI64 {}, [I1], I64;
            cast_zext_i8_to_i16 => CastZextI8ToI16 {}, [I8], I16;
            cast_zext_i8_to_i32 => CastZextI8ToI32 {}, [I8], I32;
            cast_zext_i8_to_i64 => CastZextI8ToI64 {}, [I8], I64;
            cast_zext_i16_to_i32 => CastZextI16ToI32 {}, [I16], I32;
            cast_zext_i16_to_i64 => CastZextI16ToI64 {}, [I16], I64;
            cast_zext_i32_to_i64 => CastZextI32ToI64 {}, [I32], I64;

            // sign extension
            cast_sext_i8_to_i16 => CastSextI8ToI16 {}, [I8], I16;
            cast_sext_i8_to_i32 => CastSextI8ToI32 {}, [I8], I32;
            cast_sext_i8_to_i64 => CastSextI8ToI64 {}, [I8], I64;
            cast_sext_i16_to_i32 => CastSextI16ToI32 {}, [I16], I32;
            cast_sext_i16_to_i64 => CastSextI16ToI64 {}, [I16], I64;
            cast_sext_i32_to_i64 => CastSextI32ToI64 {}, [I32], I64;

            // truncation
            cast_trunc_i64_to_i8 => CastTruncI64ToI8 {}, [I64], I8;
            cast_trunc_i64_to_i16 => CastTruncI64ToI16 {}, [I64], I16;
            cast_trunc_i64_to_i32 => CastTruncI64ToI32 {}, [I64], I32;
            cast_trunc_i32_to_i8 => CastTruncI32ToI8 {}, [I32], I8;
            cast_trunc_i32_to_i16 => CastTruncI32ToI16 {}, [I32], I16;
            cast_trunc_i16_to_i8 => CastTruncI16ToI8 {}, [I16], I8;

            // float-float casts
            cast_f32_to_f64 => CastF32ToF64 {}, [F32], F64;
            cast_f64_to_f32 => CastF64ToF32 {}, [F64], F32;

            // float-int casts
            cast_f32_to_i8 => CastF32ToI8 {}, [F32], I8;
            cast_f32_to_i16 => CastF32ToI16 {}, [F32], I16;
            cast_f32_to_i32 => CastF32ToI32 {}, [F32], I32;
            cast_f32_to_i64 => CastF32ToI64 {}, [F32], I64;
            cast_f32_to_u8 => CastF32ToU8 {}, [F32], I8;
            cast_f32_to_u16 => CastF32ToU16 {}, [F32], I16;
            cast_f32_to_u32 => CastF32ToU32 {}, [F32], I32;
            cast_f32_to_u64 => CastF32ToU64 {}, [F32], I64;
            cast_f64_to_i8 => CastF64ToI8 {}, [F64], I8;
            cast_f64_to_i16 => CastF64ToI16 {}, [F64], I16;
            cast_f64_to_i32 => CastF64ToI32 {}, [F64], I32;
            cast_f64_to_i64 => CastF64ToI64 {}, [F64], I64;
            cast_f64_to_u8 => CastF64ToU8 {}, [F64], I8;
            cast_f64_to_u16 => CastF64ToU16 {}, [F64], I16;
            cast_f64_to_u32 => CastF64ToU32 {}, [F64], I32;
            cast_f64_to_u64 => CastF64ToU64 {}, [F64], I64;

            // int-float casts
            cast_i8_to_f32 => CastI8ToF32 {}, [I8], F32;
            cast_i16_to_f32 => CastI16ToF32 {}, [I16], F32;
            cast_i32_to_f32 => CastI32ToF32 {}, [I32], F32;
            cast_i64_to_f32 => CastI64ToF32 {}, [I64], F32;
            cast_u8_to_f32 => CastU8ToF32 {}, [I8], F32;
            cast_u16_to_f32 => CastU16ToF32 {}, [I16], F32;
            cast_u32_to_f32 => CastU32ToF32 {}, [I32], F32;
            cast_u64_to_f32 => CastU64ToF32 {}, [I64], F32;
            cast_i8_to_f64 => CastI8ToF64 {}, [I8], F64;
            cast_i16_to_f64 => CastI16ToF64 {}, [I16], F64;
            cast_i32_to_f64 => CastI32ToF64 {}, [I32], F64;
            cast_i64_to_f64 => CastI64ToF64 {}, [I64], F64;
            cast_u8_to_f64 => CastU8ToF64 {}, [I8], F64;
            cast_u16_to_f64 => CastU16ToF64 {}, [I16], F64;
            cast_u32_to_f64 => CastU32ToF64 {}, [I32], F64;
            cast_u64_to_f64 => CastU64ToF64 {}, [I64], F64;

            // equality comparison
            cmp_eq_i1 => CmpEqI1 {}, [I1, I1], I1;
            cmp_eq_i8 => CmpEqI8 {}, [I8, I8], I1;
            cmp_eq_i16 => CmpEqI16 {}, [I16, I16], I1;
            cmp_eq_i32 => CmpEqI32 {}, [I32, I32], I1;
            cmp_eq_i64 => CmpEqI64 {}, [I64, I64], I1;
            cmp_eq_f32 => CmpEqF32 {}, [F32, F32], I1;
            cmp_eq_f64 => CmpEqF64 {}, [F64, F64], I1;
            cmp_eq_f32_check => CmpEqF32Check { src: SpanIdx }, [F32, F32], None;
            cmp_eq_f64_check => CmpEqF64Check { src: SpanIdx }, [F64, F64], None;
            cmp_eq_ptr => CmpEqPtr {}, [Ptr, Ptr], I1;

            cmp_neq_i1 => CmpNeqI1 {}, [I1, I1], I1;
            cmp_neq_i8 => CmpNeqI8 {}, [I8, I8], I1;
            cmp_neq_i16 => CmpNeqI16 {}, [I16, I16], I1;
            cmp_neq_i32 => CmpNeqI32 {}, [I32, I32], I1;
            cmp_neq_i64 => CmpNeqI64 {}, [I64, I64], I1;
            cmp_neq_f32 => CmpNeqF32 {}, [F32, F32], I1;
            cmp_neq_f64 => CmpNeqF64 {}, [F64, F64], I1;
            cmp_neq_f32_check => CmpNeqF32Check { src: SpanIdx }, [F32, F32], None;
            cmp_neq_f64_check => CmpNeqF64Check { src: SpanIdx }, [F64, F64], None;
            cmp_neq_ptr => CmpNeqPtr {}, [Ptr, Ptr], I1;

            // ordering comparisons
            cmp_lt_i8 => CmpLtI8 {}, [I8, I8], I1;
            cmp_lt_i16 => CmpLtI16 {}, [I16, I16], I1;
            cmp_lt_i32 => CmpLtI32 {}, [I32, I32], I1;
            cmp_lt_i64 => CmpLtI64 {}, [I64, I64], I1;
            cmp_lt_u8 => CmpLtU8 {}, [I8, I8], I1;
            cmp_lt_u16 => CmpLtU16 {}, [I16, I16], I1;
            cmp_lt_u32 => CmpLtU32 {}, [I32, I32], I1;
            cmp_lt_u64 => CmpLtU64 {}, [I64, I64], I1;
            cmp_lt_f32 => CmpLtF32 {}, [F32, F32], I1;
            cmp_lt_f64 => CmpLtF64 {}, [F64, F64], I1;
            cmp_lt_f32_check => CmpLtF32Check { src: SpanIdx }, [F32, F32], None;
            cmp_lt_f64_check => CmpLtF64Check { src: SpanIdx }, [F64, F64], None;
            cmp_lt_ptr => CmpLtPtr { src: SpanIdx }, [Ptr, Ptr], I1;

            cmp_gt_i8 => CmpGtI8 {}, [I8, I8], I1;
            cmp_gt_i16 => CmpGtI16 {}, [I16, I16], I1;
            cmp_gt_i32 => CmpGtI32 {}, [I32, I32], I1;
            cmp_gt_i64 => CmpGtI64 {}, [I64, I64], I1;
            cmp_gt_u8 => CmpGtU8 {}, [I8, I8], I1;
            cmp_gt_u16 => CmpGtU16 {}, [I16, I16], I1;
            cmp_gt_u32 => CmpGtU32 {}, [I32, I32], I1;
            cmp_gt_u64 => CmpGtU64 {}, [I64, I64], I1;
            cmp_gt_f32 => CmpGtF32 {}, [F32, F32], I1;
            cmp_gt_f64 => CmpGtF64 {}, [F64, F64], I1;
            cmp_gt_f32_check => CmpGtF32Check { src: SpanIdx }, [F32, F32], None;
            cmp_gt_f64_check => CmpGtF64Check { src: SpanIdx }, [F64, F64], None;
            cmp_gt_ptr => CmpGtPtr { src: SpanIdx }, [Ptr, Ptr], I1;

            cmp_lte_i8 => CmpLteI8 {}, [I8, I8], I1;
            cmp_lte_i16 => CmpLteI16 {}, [I16, I16], I1;
            cmp_lte_i32 => CmpLteI32 {}, [I32, I32], I1;
            cmp_lte_i64 => CmpLteI64 {}, [I64, I64], I1;
            cmp_lte_u8 => CmpLteU8 {}, [I8, I8], I1;
            cmp_lte_u16 => CmpLteU16 {}, [I16, I16], I1;
            cmp_lte_u32 => CmpLteU32 {}, [I32, I32], I1;
            cmp_lte_u64 => CmpLteU64 {}, [I64, I64], I1;
            cmp_lte_f32 => CmpLteF32 {}, [F32, F32], I1;
            cmp_lte_f64 => CmpLteF64 {}, [F64, F64], I1;
            cmp_lte_f32_check => CmpLteF32Check { src: SpanIdx }, [F32, F32], None;
            cmp_lte_f64_check => CmpLteF64Check { src: SpanIdx }, [F64, F64], None;
            cmp_lte_ptr => CmpLtePtr { src: SpanIdx }, [Ptr, Ptr], I1;

            cmp_gte_i8 => CmpGteI8 {}, [I8, I8], I1;
            cmp_gte_i16 => CmpGteI16 {}, [I16, I16], I1;
            cmp_gte_i32 => CmpGteI32 {}, [I32, I32], I1;
            cmp_gte_i64 => CmpGteI64 {}, [I64, I64], I1;
            cmp_gte_u8 => CmpGteU8 {}, [I8, I8], I1;
            cmp_gte_u16 => CmpGteU16 {}, [I16, I16], I1;
            cmp_gte_u32 => CmpGteU32 {}, [I32, I32], I1;
            cmp_gte_u64 => CmpGteU64 {}, [I64, I64], I1;
            cmp_gte_f32 => CmpGteF32 {}, [F32, F32], I1;
            cmp_gte_f64 => CmpGteF64 {}, [F64, F64], I1;
            cmp_gte_f32_check => CmpGteF32Check { src: SpanIdx }, [F32, F32], None;
            cmp_gte_f64_check => CmpGteF64Check { src: SpanIdx }, [F64, F64], None;
            cmp_gte_ptr => CmpGtePtr { src: SpanIdx }, [Ptr, Ptr], I1;

            // negation
            neg_i8 => NegI8 {}, [I8], I8;
            neg_i16 => NegI16 {}, [I16], I16;
            neg_i32 => NegI32 {}, [I32], I32;
            neg_i64 => NegI64 {}, [I64], I64;
            neg_f32 => NegF32 {}, [F32], F32;
            neg_f64 => NegF64 {}, [F64], F64;
            neg_i8_check => NegI8Check { src: SpanIdx }, [I8], None;
            neg_i16_check => NegI16Check { src: SpanIdx }, [I16], None;
            neg_i32_check => NegI32Check { src: SpanIdx }, [I32], None;
            neg_i64_check => NegI64Check { src: SpanIdx }, [I64], None;

            // addition
            add_i8 => AddI8 {}, [I8, I8], I8;
            add_i16 => AddI16 {}, [I16, I16], I16;
            add_i32 => AddI32 {}, [I32, I32], I32;
            add_i64 => AddI64 {}, [I64, I64], I64;
            add_f32 => AddF32 {}, [F32, F32], F32;
            add_f64 => AddF64 {}, [F64, F64], F64;
            add_ptr_i32 => AddPtrI32 { src: SpanIdx, check: PtrArithCheckIdx }, [Ptr, I32], Ptr;
            add_ptr_u32 => AddPtrU32 { src: SpanIdx, check: PtrArithCheckIdx }, [Ptr, I32], Ptr;
            add_ptr_i64 => AddPtrI64 { src: SpanIdx, check: PtrArithCheckIdx }, [Ptr, I64], Ptr;
            add_ptr_u64 => AddPtrU64 { src: SpanIdx, check: PtrArithCheckIdx }, [Ptr, I64], Ptr;
            add_i8_check => AddI8Check { src: SpanIdx }, [I8, I8], None;
            add_i16_check => AddI16Check { src: SpanIdx }, [I16, I16], None;
            add_i32_check => AddI32Check { src: SpanIdx }, [I32, I32], None;
            add_i64_check => AddI64Check { src: SpanIdx }, [I64, I64], None;
            add_u8_check => AddU8Check { src: SpanIdx }, [I8, I8], None;
            add_u16_check => AddU16Check { src: SpanIdx }, [I16, I16], None;
            add_u32_check => AddU32Check { src: SpanIdx }, [I32, I32], None;
            add_u64_check => AddU64Check { src: SpanIdx }, [I64, I64], None;
            add_f32_check => AddF32Check { src: SpanIdx }, [F32, F32], None;
            add_f64_check => AddF64Check { src: SpanIdx }, [F64, F64], None;

            // subtraction
            sub_i8 => SubI8 {}, [I8, I8], I8;
            sub_i16 => SubI16 {}, [I16, I16], I16;
            sub_i32 => SubI32 {}, [I32, I32], I32;
            sub_i64 => SubI64 {}, [I64, I64], I64;
            sub_f32 => SubF32 {}, [F32, F32], F32;
            sub_f64 => SubF64 {}, [F64, F64], F64;
            sub_ptr_i32 => SubPtrI32 { src: SpanIdx, check: PtrArithCheckIdx }, [Ptr, I32], Ptr;
            sub_ptr_u32 => SubPtrU32 { src: SpanIdx, check: PtrArithCheckIdx }, [Ptr, I32], Ptr;
            sub_ptr_i64 => SubPtrI64 { src: SpanIdx, check: PtrArithCheckIdx }, [Ptr, I64], Ptr;
            sub_ptr_u64 => SubPtrU64 { src: SpanIdx, check: PtrArithCheckIdx }, [Ptr, I64], Ptr;
            sub_i8_check => SubI8Check { src: SpanIdx }, [I8, I8], None;
            sub_i16_check => SubI16Check { src: SpanIdx }, [I16, I16], None;
            sub_i32_check => SubI32Check { src: SpanIdx }, [I32, I32], None;
            sub_i64_check => SubI64Check { src: SpanIdx }, [I64, I64], None;
            sub_u8_check => SubU8Check { src: SpanIdx }, [I8, I8], None;
            sub_u16_check => SubU16Check { src: SpanIdx }, [I16, I16], None;
            sub_u32_check => SubU32Check { src: SpanIdx }, [I32, I32], None;
            sub_u64_check => SubU64Check { src: SpanIdx }, [I64, I64], None;
            sub_f32_check => SubF32Check { src: SpanIdx }, [F32, F32], None;
            sub_f64_check => SubF64Check { src: SpanIdx }, [F64, F64], None;

            // pointer difference
            ptr32_diff => Ptr32Diff { src: SpanIdx, stride: u64 }, [Ptr, Ptr], I32;
            ptr64_diff => Ptr64Diff { src: SpanIdx, stride: u64 }, [Ptr, Ptr], I64;

            // multiplication
            mul_i8 => MulI8 {}, [I8, I8], I8;
            mul_i16 => MulI16 {}, [I16, I16], I16;
            mul_i32 => MulI32 {}, [I32, I32], I32;
            mul_i64 => MulI64 {}, [I64, I64], I64;
            mul_f32 => MulF32 {}, [F32, F32], F32;
            mul_f64 => MulF64 {}, [F64, F64], F64;
            mul_i8_check => MulI8Check { src: SpanIdx }, [I8, I8], None;
            mul_i16_check => MulI16Check { src: SpanIdx }, [I16, I16], None;
            mul_i32_check => MulI32Check { src: SpanIdx }, [I32, I32], None;
            mul_i64_check => MulI64Check { src: SpanIdx }, [I64, I64], None;
            mul_u8_check => MulU8Check { src: SpanIdx }, [I8, I8], None;
            mul_u16_check => MulU16Check { src: SpanIdx }, [I16, I16], None;
            mul_u32_check => MulU32Check { src: SpanIdx }, [I32, I32], None;
            mul_u64_check => MulU64Check { src: SpanIdx }, [I64, I64], None;
            mul_f32_check => MulF32Check { src: SpanIdx }, [F32, F32], None;
            mul_f64_check => MulF64Check { src: SpanIdx }, [F64, F64], None;

            // division
            div_i8 => DivI8 {}, [I8, I8], I8;
            div_i16 => DivI16 {}, [I16, I16], I16;
            div_i32 => DivI32 {}, [I32, I32], I32;
            div_i64 => DivI64 {}, [I64, I64], I64;
            div_u8 => DivU8 {}, [I8, I8], I8;
            div_u16 => DivU16 {}, [I16, I16], I16;
            div_u32 => DivU32 {}, [I32, I32], I32;
            div_u64 => DivU64 {}, [I64, I64], I64;
            div_f32 => DivF32 {}, [F32, F32], F32;
            div_f64 => DivF64 {}, [F64, F64], F64;
            div_i8_check => DivI8Check { src: SpanIdx }, [I8, I8], None;
            div_i16_check => DivI16Check { src: SpanIdx }, [I16, I16], None;
            div_i32_check => DivI32Check { src: SpanIdx }, [I32, I32], None;
            div_i64_check => DivI64Check { src: SpanIdx }, [I64, I64], None;
            div_u8_check => DivU8Check { src: SpanIdx }, [I8, I8], None;
            div_u16_check => DivU16Check { src: SpanIdx }, [I16, I16], None;
            div_u32_check => DivU32Check { src: SpanIdx }, [I32, I32], None;
            div_u64_check => DivU64Check { src: SpanIdx }, [I64, I64], None;
            div_f32_check => DivF32Check { src: SpanIdx }, [F32, F32], None;
            div_f64_check => DivF64Check { src: SpanIdx }, [F64, F64], None;

            // remainder
            rem_i8 => RemI8 {}, [I8, I8], I8;
            rem_i16 => RemI16 {}, [I16, I16], I16;
            rem_i32 => RemI32 {}, [I32, I32], I32;
            rem_i64 => RemI64 {}, [I64, I64], I64;
            rem_u8 => RemU8 {}, [I8, I8], I8;
            rem_u16 => RemU16 {}, [I16, I16], I16;
            rem_u32 => RemU32 {}, [I32, I32], I32;
            rem_u64 => RemU64 {}, [I64, I64], I64;
            rem_i8_check => RemI8Check { src: SpanIdx }, [I8, I8], None;
            rem_i16_check => RemI16Check { src: SpanIdx }, [I16, I16], None;
            rem_i32_check => RemI32Check { src: SpanIdx }, [I32, I32], None;
            rem_i64_check => RemI64Check { src: SpanIdx }, [I64, I64], None;
            rem_u8_check => RemU8Check { src: SpanIdx }, [I8, I8], None;
            rem_u16_check => RemU16Check { src: SpanIdx }, [I16, I16], None;
            rem_u32_check => RemU32Check { src: SpanIdx }, [I32, I32], None;
            rem_u64_check => RemU64Check { src: SpanIdx }, [I64, I64], None;

            // bitwise operations
            not_i1 => NotI1 {}, [I1], I1;
            not_i8 => NotI8 {}, [I8], I8;
            not_i16 => NotI16 {}, [I16], I16;
            not_i32 => NotI32 {}, [I32], I32;
            not_i64 => NotI64 {}, [I64], I64;
            and_i1 => AndI1 {}, [I1, I1], I1;
            and_i8 => AndI8 {}, [I8, I8], I8;
            and_i16 => AndI16 {}, [I16, I16], I16;
            and_i32 => AndI32 {}, [I32, I32], I32;
            and_i64 => AndI64 {}, [I64, I64], I64;
            xor_i1 => XorI1 {}, [I1, I1], I1;
            xor_i8 => XorI8 {}, [I8, I8], I8;
            xor_i16 => XorI16 {}, [I16, I16], I16;
            xor_i32 => XorI32 {}, [I32, I32], I32;
            xor_i64 => XorI64 {}, [I64, I64], I64;
            or_i1 => OrI1 {}, [I1, I1], I1;
            or_i8 => OrI8 {}, [I8, I8], I8;
            or_i16 => OrI16 {}, [I16, I16], I16;
            or_i32 => OrI32 {}, [I32, I32], I32;
            or_i64 => OrI64 {}, [I64, I64], I64;

            // shifts; out-of-range amounts produce zero and report through
            // the embedded check
            shl_i8_signed => ShlI8Signed { src: SpanIdx }, [I8, I8], I8;
            shl_i16_signed => ShlI16Signed { src: SpanIdx }, [I16, I16], I16;
            shl_i32_signed => ShlI32Signed { src: SpanIdx }, [I32, I32], I32;
            shl_i64_signed => ShlI64Signed { src: SpanIdx }, [I64, I64], I64;
            shl_i8_unsigned => ShlI8Unsigned { src: SpanIdx }, [I8, I8], I8;
            shl_i16_unsigned => ShlI16Unsigned { src: SpanIdx }, [I16, I16], I16;
            shl_i32_unsigned => ShlI32Unsigned { src: SpanIdx }, [I32, I32], I32;
            shl_i64_unsigned => ShlI64Unsigned { src: SpanIdx }, [I64, I64], I64;
            shr_i8_signed => ShrI8Signed { src: SpanIdx }, [I8, I8], I8;
            shr_i16_signed => ShrI16Signed { src: SpanIdx }, [I16, I16], I16;
            shr_i32_signed => ShrI32Signed { src: SpanIdx }, [I32, I32], I32;
            shr_i64_signed => ShrI64Signed { src: SpanIdx }, [I64, I64], I64;
            shr_i8_unsigned => ShrI8Unsigned { src: SpanIdx }, [I8, I8], I8;
            shr_i16_unsigned => ShrI16Unsigned { src: SpanIdx }, [I16, I16], I16;
            shr_i32_unsigned => ShrI32Unsigned { src: SpanIdx }, [I32, I32], I32;
            shr_i64_unsigned => ShrI64Unsigned { src: SpanIdx }, [I64, I64], I64;

            // absolute value
            abs_i8 => AbsI8 {}, [I8], I8;
            abs_i16 => AbsI16 {}, [I16], I16;
            abs_i32 => AbsI32 {}, [I32], I32;
            abs_i64 => AbsI64 {}, [I64], I64;
            abs_f32 => AbsF32 {}, [F32], F32;
            abs_f64 => AbsF64 {}, [F64], F64;
            abs_i8_check => AbsI8Check { src: SpanIdx }, [I8], None;
            abs_i16_check => AbsI16Check { src: SpanIdx }, [I16], None;
            abs_i32_check => AbsI32Check { src: SpanIdx }, [I32], None;
            abs_i64_check => AbsI64Check { src: SpanIdx }, [I64], None;
            abs_f32_check => AbsF32Check { src: SpanIdx }, [F32], None;
            abs_f64_check => AbsF64Check { src: SpanIdx }, [F64], None;

            // minimum
            min_i8 => MinI8 {}, [I8, I8], I8;
            min_i16 => MinI16 {}, [I16, I16], I16;
            min_i32 => MinI32 {}, [I32, I32], I32;
            min_i64 => MinI64 {}, [I64, I64], I64;
            min_u8 => MinU8 {}, [I8, I8], I8;
            min_u16 => MinU16 {}, [I16, I16], I16;
            min_u32 => MinU32 {}, [I32, I32], I32;
            min_u64 => MinU64 {}, [I64, I64], I64;
            min_f32 => MinF32 {}, [F32, F32], F32;
            min_f64 => MinF64 {}, [F64, F64], F64;
            min_f32_check => MinF32Check { src: SpanIdx }, [F32, F32], None;
            min_f64_check => MinF64Check { src: SpanIdx }, [F64, F64], None;

            // maximum
            max_i8 => MaxI8 {}, [I8, I8], I8;
            max_i16 => MaxI16 {}, [I16, I16], I16;
            max_i32 => MaxI32 {}, [I32, I32], I32;
            max_i64 => MaxI64 {}, [I64, I64], I64;
            max_u8 => MaxU8 {}, [I8, I8], I8;
            max_u16 => MaxU16 {}, [I16, I16], I16;
            max_u32 => MaxU32 {}, [I32, I32], I32;
            max_u64 => MaxU64 {}, [I64, I64], I64;
            max_f32 => MaxF32 {}, [F32, F32], F32;
            max_f64 => MaxF64 {}, [F64, F64], F64;
            max_f32_check => MaxF32Check { src: SpanIdx }, [F32, F32], None;
            max_f64_check => MaxF64Check { src: SpanIdx }, [F64, F64], None;

            // math intrinsics, unary
            exp_f32 => ExpF32 {}, [F32], F32;
            exp_f64 => ExpF64 {}, [F64], F64;
            exp_f32_check => ExpF32Check { src: SpanIdx }, [F32], None;
            exp_f64_check => ExpF64Check { src: SpanIdx }, [F64], None;
            exp2_f32 => Exp2F32 {}, [F32], F32;
            exp2_f64 => Exp2F64 {}, [F64], F64;
            exp2_f32_check => Exp2F32Check { src: SpanIdx }, [F32], None;
            exp2_f64_check => Exp2F64Check { src: SpanIdx }, [F64], None;
            expm1_f32 => Expm1F32 {}, [F32], F32;
            expm1_f64 => Expm1F64 {}, [F64], F64;
            expm1_f32_check => Expm1F32Check { src: SpanIdx }, [F32], None;
            expm1_f64_check => Expm1F64Check { src: SpanIdx }, [F64], None;
            log_f32 => LogF32 {}, [F32], F32;
            log_f64 => LogF64 {}, [F64], F64;
            log_f32_check => LogF32Check { src: SpanIdx }, [F32], None;
            log_f64_check => LogF64Check { src: SpanIdx }, [F64], None;
            log10_f32 => Log10F32 {}, [F32], F32;
            log10_f64 => Log10F64 {}, [F64], F64;
            log10_f32_check => Log10F32Check { src: SpanIdx }, [F32], None;
            log10_f64_check => Log10F64Check { src: SpanIdx }, [F64], None;
            log2_f32 => Log2F32 {}, [F32], F32;
            log2_f64 => Log2F64 {}, [F64], F64;
            log2_f32_check => Log2F32Check { src: SpanIdx }, [F32], None;
            log2_f64_check => Log2F64Check { src: SpanIdx }, [F64], None;
            log1p_f32 => Log1pF32 {}, [F32], F32;
            log1p_f64 => Log1pF64 {}, [F64], F64;
            log1p_f32_check => Log1pF32Check { src: SpanIdx }, [F32], None;
            log1p_f64_check => Log1pF64Check { src: SpanIdx }, [F64], None;
            sqrt_f32 => SqrtF32 {}, [F32], F32;
            sqrt_f64 => SqrtF64 {}, [F64], F64;
            sqrt_f32_check => SqrtF32Check { src: SpanIdx }, [F32], None;
            sqrt_f64_check => SqrtF64Check { src: SpanIdx }, [F64], None;
            cbrt_f32 => CbrtF32 {}, [F32], F32;
            cbrt_f64 => CbrtF64 {}, [F64], F64;
            cbrt_f32_check => CbrtF32Check { src: SpanIdx }, [F32], None;
            cbrt_f64_check => CbrtF64Check { src: SpanIdx }, [F64], None;
            sin_f32 => SinF32 {}, [F32], F32;
            sin_f64 => SinF64 {}, [F64], F64;
            sin_f32_check => SinF32Check { src: SpanIdx }, [F32], None;
            sin_f64_check => SinF64Check { src: SpanIdx }, [F64], None;
            cos_f32 => CosF32 {}, [F32], F32;
            cos_f64 => CosF64 {}, [F64], F64;
            cos_f32_check => CosF32Check { src: SpanIdx }, [F32], None;
            cos_f64_check => CosF64Check { src: SpanIdx }, [F64], None;
            tan_f32 => TanF32 {}, [F32], F32;
            tan_f64 => TanF64 {}, [F64], F64;
            tan_f32_check => TanF32Check { src: SpanIdx }, [F32], None;
            tan_f64_check => TanF64Check { src: SpanIdx }, [F64], None;
            asin_f32 => AsinF32 {}, [F32], F32;
            asin_f64 => AsinF64 {}, [F64], F64;
            asin_f32_check => AsinF32Check { src: SpanIdx }, [F32], None;
            asin_f64_check => AsinF64Check { src: SpanIdx }, [F64], None;
            acos_f32 => AcosF32 {}, [F32], F32;
            acos_f64 => AcosF64 {}, [F64], F64;
            acos_f32_check => AcosF32Check { src: SpanIdx }, [F32], None;
            acos_f64_check => AcosF64Check { src: SpanIdx }, [F64], None;
            atan_f32 => AtanF32 {}, [F32], F32;
            atan_f64 => AtanF64 {}, [F64], F64;
            atan_f32_check => AtanF32Check { src: SpanIdx }, [F32], None;
            atan_f64_check => AtanF64Check { src: SpanIdx }, [F64], None;
            sinh_f32 => SinhF32 {}, [F32], F32;
            sinh_f64 => SinhF64 {}, [F64], F64;
            sinh_f32_check => SinhF32Check { src: SpanIdx }, [F32], None;
            sinh_f64_check => SinhF64Check { src: SpanIdx }, [F64], None;
            cosh_f32 => CoshF32 {}, [F32], F32;
            cosh_f64 => CoshF64 {}, [F64], F64;
            cosh_f32_check => CoshF32Check { src: SpanIdx }, [F32], None;
            cosh_f64_check => CoshF64Check { src: SpanIdx }, [F64], None;
            tanh_f32 => TanhF32 {}, [F32], F32;
            tanh_f64 => TanhF64 {}, [F64], F64;
            tanh_f32_check => TanhF32Check { src: SpanIdx }, [F32], None;
            tanh_f64_check => TanhF64Check { src: SpanIdx }, [F64], None;
            asinh_f32 => AsinhF32 {}, [F32], F32;
            asinh_f64 => AsinhF64 {}, [F64], F64;
            asinh_f32_check => AsinhF32Check { src: SpanIdx }, [F32], None;
            asinh_f64_check => AsinhF64Check { src: SpanIdx }, [F64], None;
            acosh_f32 => AcoshF32 {}, [F32], F32;
            acosh_f64 => AcoshF64 {}, [F64], F64;
            acosh_f32_check => AcoshF32Check { src: SpanIdx }, [F32], None;
            acosh_f64_check => AcoshF64Check { src: SpanIdx }, [F64], None;
            atanh_f32 => AtanhF32 {}, [F32], F32;
            atanh_f64 => AtanhF64 {}, [F64], F64;
            atanh_f32_check => AtanhF32Check { src: SpanIdx }, [F32], None;
            atanh_f64_check => AtanhF64Check { src: SpanIdx }, [F64], None;
            erf_f32 => ErfF32 {}, [F32], F32;
            erf_f64 => ErfF64 {}, [F64], F64;
            erf_f32_check => ErfF32Check { src: SpanIdx }, [F32], None;
            erf_f64_check => ErfF64Check { src: SpanIdx }, [F64], None;
            erfc_f32 => ErfcF32 {}, [F32], F32;
            erfc_f64 => ErfcF64 {}, [F64], F64;
            erfc_f32_check => ErfcF32Check { src: SpanIdx }, [F32], None;
            erfc_f64_check => ErfcF64Check { src: SpanIdx }, [F64], None;
            tgamma_f32 => TgammaF32 {}, [F32], F32;
            tgamma_f64 => TgammaF64 {}, [F64], F64;
            tgamma_f32_check => TgammaF32Check { src: SpanIdx }, [F32], None;
            tgamma_f64_check => TgammaF64Check { src: SpanIdx }, [F64], None;
            lgamma_f32 => LgammaF32 {}, [F32], F32;
            lgamma_f64 => LgammaF64 {}, [F64], F64;
            lgamma_f32_check => LgammaF32Check { src: SpanIdx }, [F32], None;
            lgamma_f64_check => LgammaF64Check { src: SpanIdx }, [F64], None;

            // math intrinsics, binary
            pow_f32 => PowF32 {}, [F32, F32], F32;
            pow_f64 => PowF64 {}, [F64, F64], F64;
            pow_f32_check => PowF32Check { src: SpanIdx }, [F32, F32], None;
            pow_f64_check => PowF64Check { src: SpanIdx }, [F64, F64], None;
            atan2_f32 => Atan2F32 {}, [F32, F32], F32;
            atan2_f64 => Atan2F64 {}, [F64, F64], F64;
            atan2_f32_check => Atan2F32Check { src: SpanIdx }, [F32, F32], None;
            atan2_f64_check => Atan2F64Check { src: SpanIdx }, [F64, F64], None;
            hypot_f32 => HypotF32 {}, [F32, F32], F32;
            hypot_f64 => HypotF64 {}, [F64, F64], F64;
            hypot_f32_check => HypotF32Check { src: SpanIdx }, [F32, F32], None;
            hypot_f64_check => HypotF64Check { src: SpanIdx }, [F64, F64], None;

            // bit manipulation intrinsics
            bitreverse_u8 => BitreverseU8 {}, [I8], I8;
            bitreverse_u16 => BitreverseU16 {}, [I16], I16;
            bitreverse_u32 => BitreverseU32 {}, [I32], I32;
            bitreverse_u64 => BitreverseU64 {}, [I64], I64;
            popcount_u8 => PopcountU8 {}, [I8], I8;
            popcount_u16 => PopcountU16 {}, [I16], I16;
            popcount_u32 => PopcountU32 {}, [I32], I32;
            popcount_u64 => PopcountU64 {}, [I64], I64;
            byteswap_u16 => ByteswapU16 {}, [I16], I16;
            byteswap_u32 => ByteswapU32 {}, [I32], I32;
            byteswap_u64 => ByteswapU64 {}, [I64], I64;
            clz_u8 => ClzU8 {}, [I8], I8;
            clz_u16 => ClzU16 {}, [I16], I16;
            clz_u32 => ClzU32 {}, [I32], I32;
            clz_u64 => ClzU64 {}, [I64], I64;
            ctz_u8 => CtzU8 {}, [I8], I8;
            ctz_u16 => CtzU16 {}, [I16], I16;
            ctz_u32 => CtzU32 {}, [I32], I32;
            ctz_u64 => CtzU64 {}, [I64], I64;
            fshl_u8 => FshlU8 {}, [I8, I8, I8], I8;
            fshl_u16 => FshlU16 {}, [I16, I16, I16], I16;
            fshl_u32 => FshlU32 {}, [I32, I32, I32], I32;
            fshl_u64 => FshlU64 {}, [I64, I64, I64], I64;
            fshr_u8 => FshrU8 {}, [I8, I8, I8], I8;
            fshr_u16 => FshrU16 {}, [I16, I16, I16], I16;
            fshr_u32 => FshrU32 {}, [I32, I32, I32], I32;
            fshr_u64 => FshrU64 {}, [I64, I64, I64], I64;

            // address computation
            const_gep => ConstGep { offset: u64 }, [Ptr], Ptr;
            array_gep_i32 => ArrayGepI32 { stride: u64 }, [Ptr, I32], Ptr;
            array_gep_i64 => ArrayGepI64 { stride: u64 }, [Ptr, I64], Ptr;

            // bulk memory
            const_memcpy => ConstMemcpy { size: u64 }, [Ptr, Ptr], None;
            const_memset_zero => ConstMemsetZero { size: u64 }, [Ptr], None;

            // object lifetimes
            start_lifetime => StartLifetime { size: u64 }, [Ptr], None;
            end_lifetime => EndLifetime { size: u64 }, [Ptr], None;

            // heap
            malloc => Malloc { src: SpanIdx, elem_type: TypeIdx }, [I64], Ptr;
            free => Free { src: SpanIdx }, [Ptr], None;

            // calls and control flow
            function_call => FunctionCall { func: FuncIdx, args_index: CallArgsIdx, src: SpanIdx }, [], Any;
            jump => Jump { dest: InstIdx }, [], None;
            conditional_jump => ConditionalJump { true_dest: InstIdx, false_dest: InstIdx }, [I1], None;
            switch_i8 => SwitchI8 { info: SwitchIdx }, [I8], None;
            switch_i16 => SwitchI16 { info: SwitchIdx }, [I16], None;
            switch_i32 => SwitchI32 { info: SwitchIdx }, [I32], None;
            switch_i64 => SwitchI64 { info: SwitchIdx }, [I64], None;
            ret => Ret {}, [Any], None;
            ret_void => RetVoid {}, [], None;
            unreachable => Unreachable {}, [], None;

            // diagnostics and runtime checks
            error => Error { error: ErrorIdx }, [], None;
            diagnostic_str => DiagnosticStr { src: SpanIdx, kind: Option<WarningKind> }, [Ptr, Ptr], None;
            array_bounds_check_i32 => ArrayBoundsCheckI32 { src: SpanIdx }, [I32, I32], None;
            array_bounds_check_u32 => ArrayBoundsCheckU32 { src: SpanIdx }, [I32, I32], None;
            array_bounds_check_i64 => ArrayBoundsCheckI64 { src: SpanIdx }, [I64, I64], None;
            array_bounds_check_u64 => ArrayBoundsCheckU64 { src: SpanIdx }, [I64, I64], None;
            optional_get_value_check => OptionalGetValueCheck { src: SpanIdx }, [I1], None;
            str_construction_check => StrConstructionCheck { src: SpanIdx }, [Ptr, Ptr], None;
            slice_construction_check => SliceConstructionCheck { src: SpanIdx, info: SliceCheckIdx }, [Ptr, Ptr], None;
            memory_access_check => MemoryAccessCheck { src: SpanIdx, info: AccessCheckIdx }, [Ptr], None;
        }
    };
}

for_each_instruction!(define_instructions);

impl Instruction {
    /// Whether this instruction ends a basic block. Exactly one terminator
    /// closes every block; finalization asserts this.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Jump { .. }
                | Instruction::ConditionalJump { .. }
                | Instruction::SwitchI8 { .. }
                | Instruction::SwitchI16 { .. }
                | Instruction::SwitchI32 { .. }
                | Instruction::SwitchI64 { .. }
                | Instruction::Ret { .. }
                | Instruction::RetVoid { .. }
                | Instruction::Unreachable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arg_metadata_matches_slots() {
        let inst = Instruction::AddI32 {
            args: [ValueIdx::UNRESOLVED; 2],
        };
        assert_eq!(inst.args().len(), 2);
        assert_eq!(inst.arg_types(), &[ValueType::I32, ValueType::I32]);
        assert_eq!(inst.result_type(), ValueType::I32);
        assert_eq!(inst.mnemonic(), "add_i32");
    }

    #[test]
    fn checks_produce_no_value() {
        let inst = Instruction::AddI32Check {
            args: [ValueIdx::UNRESOLVED; 2],
            src: SpanIdx::from_u32(0),
        };
        assert_eq!(inst.result_type(), ValueType::None);
        assert!(!inst.is_terminator());
    }

    #[test]
    fn terminators() {
        assert!(Instruction::RetVoid { args: [] }.is_terminator());
        assert!(Instruction::Jump {
            args: [],
            dest: InstIdx::from_u32(0)
        }
        .is_terminator());
        assert!(!Instruction::ConstI1 {
            args: [],
            value: true
        }
        .is_terminator());
    }

    #[test]
    fn args_mut_patches_operands() {
        let mut inst = Instruction::StoreI32Le {
            args: [ValueIdx::UNRESOLVED; 2],
        };
        inst.args_mut()[0] = ValueIdx::from_u32(3);
        inst.args_mut()[1] = ValueIdx::from_u32(7);
        assert_eq!(inst.args(), &[ValueIdx::from_u32(3), ValueIdx::from_u32(7)]);
        assert_eq!(inst.arg_types(), &[ValueType::I32, ValueType::Ptr]);
    }
}
