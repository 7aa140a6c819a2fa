//! The dispatch loop.

use orec_abi::target::Endianness;
use orec_ir::function::{FuncIdx, Function, SpanIdx, ValueIdx};
use orec_ir::inst::Instruction;
use orec_ir::ty::{BuiltinKind, TypeIdx, TypeSet};
use orec_ir::value::InstrValue;
use orec_memory::endian;
use orec_memory::error::MemoryError;
use orec_memory::{MemoryManager, Ptr};
use orec_session::{Diagnostic, DiagnosticSink, SrcSpan, WarningKind};
use orec_utils::index_vec::IdxVec;
use tracing::{debug, trace};

/// Bounds imposed by the front-end on one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ExecLimits {
    pub max_call_depth: u32,
    pub max_instructions: u64,
}

impl Default for ExecLimits {
    fn default() -> Self {
        ExecLimits {
            max_call_depth: 512,
            max_instructions: 1 << 26,
        }
    }
}

/// Evaluation stopped: an error diagnostic was raised or a quota was hit.
/// Diagnostics were already routed to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aborted;

pub type ExecResult<T> = Result<T, Aborted>;

/// Scalar type handles used by load/store dispatch.
struct ScalarTypes {
    i1: TypeIdx,
    i8: TypeIdx,
    i16: TypeIdx,
    i32: TypeIdx,
    i64: TypeIdx,
    f32: TypeIdx,
    f64: TypeIdx,
    ptr: TypeIdx,
}

pub struct ExecutorContext<'a> {
    functions: &'a IdxVec<FuncIdx, Function>,
    pub memory: MemoryManager<'a>,
    sink: &'a mut dyn DiagnosticSink,
    limits: ExecLimits,
    executed_instructions: u64,
    call_depth: u32,
    had_error: bool,
    tys: ScalarTypes,
}

impl<'a> ExecutorContext<'a> {
    pub fn new(
        type_set: &'a TypeSet,
        global: &'a orec_memory::GlobalMemory,
        functions: &'a IdxVec<FuncIdx, Function>,
        limits: ExecLimits,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        let tys = ScalarTypes {
            i1: type_set.builtin_type(BuiltinKind::I1),
            i8: type_set.builtin_type(BuiltinKind::I8),
            i16: type_set.builtin_type(BuiltinKind::I16),
            i32: type_set.builtin_type(BuiltinKind::I32),
            i64: type_set.builtin_type(BuiltinKind::I64),
            f32: type_set.builtin_type(BuiltinKind::F32),
            f64: type_set.builtin_type(BuiltinKind::F64),
            ptr: type_set.pointer_type(),
        };
        ExecutorContext {
            functions,
            memory: MemoryManager::new(type_set, global),
            sink,
            limits,
            executed_instructions: 0,
            call_depth: 0,
            had_error: false,
            tys,
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    ////////// diagnostics //////////

    fn span_of(&self, func: &Function, src: SpanIdx) -> SrcSpan {
        func.spans[src]
    }

    fn report_error(&mut self, span: SrcSpan, message: String) -> Aborted {
        self.had_error = true;
        self.sink.report(Diagnostic::error(span, message));
        Aborted
    }

    fn report_warning(&mut self, kind: WarningKind, span: SrcSpan, message: String) {
        self.sink.report(Diagnostic::warning(kind, span, message));
    }

    fn report_memory_error(&mut self, span: SrcSpan, error: MemoryError) -> Aborted {
        self.had_error = true;
        let mut diagnostic = Diagnostic::error(span, error.to_string());
        for (note_span, label) in error.notes() {
            diagnostic = diagnostic.with_note(note_span, label);
        }
        self.sink.report(diagnostic);
        Aborted
    }

    ////////// memory helpers //////////

    /// A checked scalar load; the returned array holds the access's bytes
    /// in its prefix.
    fn load_bytes(
        &mut self,
        span: SrcSpan,
        ptr: u64,
        access: TypeIdx,
    ) -> ExecResult<[u8; 8]> {
        match self.memory.get_memory(Ptr(ptr), access) {
            Ok(bytes) => {
                let mut buffer = [0u8; 8];
                buffer[..bytes.len()].copy_from_slice(bytes);
                Ok(buffer)
            }
            Err(error) => Err(self.report_memory_error(span, error)),
        }
    }

    fn store_bytes(
        &mut self,
        span: SrcSpan,
        ptr: u64,
        access: TypeIdx,
        bytes: &[u8],
    ) -> ExecResult<()> {
        match self.memory.get_memory_mut(Ptr(ptr), access) {
            Ok(memory) => {
                memory.copy_from_slice(&bytes[..memory.len()]);
                Ok(())
            }
            Err(error) => Err(self.report_memory_error(span, error)),
        }
    }

    /// Reads the UTF-8 text a (begin, end) pointer pair delimits.
    fn read_str(&mut self, span: SrcSpan, begin: u64, end: u64) -> ExecResult<String> {
        if begin == 0 && end == 0 {
            return Ok(String::new());
        }
        let len = match self.memory.ptr_diff(Ptr(end), Ptr(begin), 1) {
            Ok(len) if len >= 0 => len as u64,
            Ok(_) => return Err(self.report_memory_error(span, MemoryError::SliceReversed)),
            Err(error) => return Err(self.report_memory_error(span, error)),
        };
        let bytes = match self.memory.get_memory_raw(Ptr(begin), len) {
            Ok(bytes) => bytes.to_vec(),
            Err(error) => return Err(self.report_memory_error(span, error)),
        };
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    ////////// the dispatch loop //////////

    /// Runs `func` to completion with the given argument values, returning
    /// the `ret` value (NONE for void functions).
    pub fn execute_function(
        &mut self,
        func: &Function,
        args: &[InstrValue],
    ) -> ExecResult<InstrValue> {
        if self.call_depth >= self.limits.max_call_depth {
            return Err(self.report_error(
                SrcSpan::synthetic(),
                "maximum call depth exceeded in constant evaluation".to_string(),
            ));
        }
        self.call_depth += 1;

        let alloca_addresses = match self.memory.push_frame(&func.allocas) {
            Ok(addresses) => addresses,
            Err(error) => {
                self.call_depth -= 1;
                return Err(self.report_memory_error(SrcSpan::synthetic(), error));
            }
        };

        debug!(name = %func.name, args = args.len(), "executing function");
        let result = self.run_frame(func, args, &alloca_addresses);

        self.memory.pop_frame();
        self.call_depth -= 1;
        result
    }

    fn run_frame(
        &mut self,
        func: &Function,
        args: &[InstrValue],
        alloca_addresses: &[u64],
    ) -> ExecResult<InstrValue> {
        let alloca_count = func.allocas.len();
        let mut values = vec![InstrValue::NONE; func.value_slot_count()];
        for (slot, address) in values.iter_mut().zip(alloca_addresses) {
            *slot = InstrValue::from_ptr(*address);
        }

        let mut current: usize = 0;
        loop {
            self.executed_instructions += 1;
            if self.executed_instructions > self.limits.max_instructions {
                return Err(self.report_error(
                    SrcSpan::synthetic(),
                    "constant evaluation quota exceeded".to_string(),
                ));
            }

            let inst = func.instructions[current];
            trace!(current, mnemonic = inst.mnemonic(), "dispatch");
            let mut next = current + 1;

            let result = self.dispatch(func, args, &values, inst, &mut next)?;
            match result {
                StepResult::Value(value) => {
                    values[alloca_count + current] = value;
                }
                StepResult::Return(value) => return Ok(value),
            }
            current = next;
        }
    }

    fn dispatch(
        &mut self,
        func: &Function,
        frame_args: &[InstrValue],
        values: &[InstrValue],
        inst: Instruction,
        next: &mut usize,
    ) -> ExecResult<StepResult> {
        use Instruction as I;

        let v = |idx: ValueIdx| values[idx.as_usize()];
        let ok = |value: InstrValue| Ok(StepResult::Value(value));
        let none = || Ok(StepResult::Value(InstrValue::NONE));

        const LE: Endianness = Endianness::Little;
        const BE: Endianness = Endianness::Big;

        match inst {
            ////////// constants //////////
            I::ConstI1 { value, .. } => ok(InstrValue::from_i1(value)),
            I::ConstI8 { value, .. } => ok(InstrValue::from_u8(value as u8)),
            I::ConstI16 { value, .. } => ok(InstrValue::from_u16(value as u16)),
            I::ConstI32 { value, .. } => ok(InstrValue::from_u32(value as u32)),
            I::ConstI64 { value, .. } => ok(InstrValue::from_u64(value as u64)),
            I::ConstU8 { value, .. } => ok(InstrValue::from_u8(value)),
            I::ConstU16 { value, .. } => ok(InstrValue::from_u16(value)),
            I::ConstU32 { value, .. } => ok(InstrValue::from_u32(value)),
            I::ConstU64 { value, .. } => ok(InstrValue::from_u64(value)),
            I::ConstF32 { value, .. } => ok(InstrValue::from_f32(value)),
            I::ConstF64 { value, .. } => ok(InstrValue::from_f64(value)),
            I::ConstPtrNull { .. } => ok(InstrValue::from_ptr(0)),
            I::GetGlobalAddress { global, .. } => {
                ok(InstrValue::from_ptr(self.memory.global().object(global).address))
            }
            I::GetFunctionArg { arg_index, .. } => ok(frame_args[arg_index as usize]),

            ////////// loads //////////
            I::LoadI1Be { args } | I::LoadI1Le { args } => {
                let bytes = self.load_bytes(SrcSpan::synthetic(), v(args[0]).as_ptr(), self.tys.i1)?;
                ok(InstrValue::from_i1(bytes[0] != 0))
            }
            I::LoadI8Be { args } | I::LoadI8Le { args } => {
                let bytes = self.load_bytes(SrcSpan::synthetic(), v(args[0]).as_ptr(), self.tys.i8)?;
                ok(InstrValue::from_u8(bytes[0]))
            }
            I::LoadI16Be { args } => {
                let bytes = self.load_bytes(SrcSpan::synthetic(), v(args[0]).as_ptr(), self.tys.i16)?;
                ok(InstrValue::from_u16(endian::read_u16(&bytes, BE)))
            }
            I::LoadI16Le { args } => {
                let bytes = self.load_bytes(SrcSpan::synthetic(), v(args[0]).as_ptr(), self.tys.i16)?;
                ok(InstrValue::from_u16(endian::read_u16(&bytes, LE)))
            }
            I::LoadI32Be { args } => {
                let bytes = self.load_bytes(SrcSpan::synthetic(), v(args[0]).as_ptr(), self.tys.i32)?;
                ok(InstrValue::from_u32(endian::read_u32(&bytes, BE)))
            }
            I::LoadI32Le { args } => {
                let bytes = self.load_bytes(SrcSpan::synthetic(), v(args[0]).as_ptr(), self.tys.i32)?;
                ok(InstrValue::from_u32(endian::read_u32(&bytes, LE)))
            }
            I::LoadI64Be { args } => {
                let bytes = self.load_bytes(SrcSpan::synthetic(), v(args[0]).as_ptr(), self.tys.i64)?;
                ok(InstrValue::from_u64(endian::read_u64(&bytes, BE)))
            }
            I::LoadI64Le { args } => {
                let bytes = self.load_bytes(SrcSpan::synthetic(), v(args[0]).as_ptr(), self.tys.i64)?;
                ok(InstrValue::from_u64(endian::read_u64(&bytes, LE)))
            }
            I::LoadF32Be { args } => {
                let bytes = self.load_bytes(SrcSpan::synthetic(), v(args[0]).as_ptr(), self.tys.f32)?;
                ok(InstrValue::from_f32(endian::read_f32(&bytes, BE)))
            }
            I::LoadF32Le { args } => {
                let bytes = self.load_bytes(SrcSpan::synthetic(), v(args[0]).as_ptr(), self.tys.f32)?;
                ok(InstrValue::from_f32(endian::read_f32(&bytes, LE)))
            }
            I::LoadF64Be { args } => {
                let bytes = self.load_bytes(SrcSpan::synthetic(), v(args[0]).as_ptr(), self.tys.f64)?;
                ok(InstrValue::from_f64(endian::read_f64(&bytes, BE)))
            }
            I::LoadF64Le { args } => {
                let bytes = self.load_bytes(SrcSpan::synthetic(), v(args[0]).as_ptr(), self.tys.f64)?;
                ok(InstrValue::from_f64(endian::read_f64(&bytes, LE)))
            }
            I::LoadPtr32Be { args } => {
                let bytes = self.load_bytes(SrcSpan::synthetic(), v(args[0]).as_ptr(), self.tys.ptr)?;
                ok(InstrValue::from_ptr(endian::read_u32(&bytes, BE) as u64))
            }
            I::LoadPtr32Le { args } => {
                let bytes = self.load_bytes(SrcSpan::synthetic(), v(args[0]).as_ptr(), self.tys.ptr)?;
                ok(InstrValue::from_ptr(endian::read_u32(&bytes, LE) as u64))
            }
            I::LoadPtr64Be { args } => {
                let bytes = self.load_bytes(SrcSpan::synthetic(), v(args[0]).as_ptr(), self.tys.ptr)?;
                ok(InstrValue::from_ptr(endian::read_u64(&bytes, BE)))
            }
            I::LoadPtr64Le { args } => {
                let bytes = self.load_bytes(SrcSpan::synthetic(), v(args[0]).as_ptr(), self.tys.ptr)?;
                ok(InstrValue::from_ptr(endian::read_u64(&bytes, LE)))
            }

            ////////// stores //////////
            I::StoreI1Be { args } | I::StoreI1Le { args } => {
                let byte = [v(args[0]).as_i1() as u8];
                self.store_bytes(SrcSpan::synthetic(), v(args[1]).as_ptr(), self.tys.i1, &byte)?;
                none()
            }
            I::StoreI8Be { args } | I::StoreI8Le { args } => {
                let byte = [v(args[0]).as_u8()];
                self.store_bytes(SrcSpan::synthetic(), v(args[1]).as_ptr(), self.tys.i8, &byte)?;
                none()
            }
            I::StoreI16Be { args } => {
                let mut bytes = [0u8; 2];
                endian::write_u16(&mut bytes, v(args[0]).as_u16(), BE);
                self.store_bytes(SrcSpan::synthetic(), v(args[1]).as_ptr(), self.tys.i16, &bytes)?;
                none()
            }
            I::StoreI16Le { args } => {
                let mut bytes = [0u8; 2];
                endian::write_u16(&mut bytes, v(args[0]).as_u16(), LE);
                self.store_bytes(SrcSpan::synthetic(), v(args[1]).as_ptr(), self.tys.i16, &bytes)?;
                none()
            }
            I::StoreI32Be { args } => {
                let mut bytes = [0u8; 4];
                endian::write_u32(&mut bytes, v(args[0]).as_u32(), BE);
                self.store_bytes(SrcSpan::synthetic(), v(args[1]).as_ptr(), self.tys.i32, &bytes)?;
                none()
            }
            I::StoreI32Le { args } => {
                let mut bytes = [0u8; 4];
                endian::write_u32(&mut bytes, v(args[0]).as_u32(), LE);
                self.store_bytes(SrcSpan::synthetic(), v(args[1]).as_ptr(), self.tys.i32, &bytes)?;
                none()
            }
            I::StoreI64Be { args } => {
                let mut bytes = [0u8; 8];
                endian::write_u64(&mut bytes, v(args[0]).as_u64(), BE);
                self.store_bytes(SrcSpan::synthetic(), v(args[1]).as_ptr(), self.tys.i64, &bytes)?;
                none()
            }
            I::StoreI64Le { args } => {
                let mut bytes = [0u8; 8];
                endian::write_u64(&mut bytes, v(args[0]).as_u64(), LE);
                self.store_bytes(SrcSpan::synthetic(), v(args[1]).as_ptr(), self.tys.i64, &bytes)?;
                none()
            }
            I::StoreF32Be { args } => {
                let mut bytes = [0u8; 4];
                endian::write_f32(&mut bytes, v(args[0]).as_f32(), BE);
                self.store_bytes(SrcSpan::synthetic(), v(args[1]).as_ptr(), self.tys.f32, &bytes)?;
                none()
            }
            I::StoreF32Le { args } => {
                let mut bytes = [0u8; 4];
                endian::write_f32(&mut bytes, v(args[0]).as_f32(), LE);
                self.store_bytes(SrcSpan::synthetic(), v(args[1]).as_ptr(), self.tys.f32, &bytes)?;
                none()
            }
            I::StoreF64Be { args } => {
                let mut bytes = [0u8; 8];
                endian::write_f64(&mut bytes, v(args[0]).as_f64(), BE);
                self.store_bytes(SrcSpan::synthetic(), v(args[1]).as_ptr(), self.tys.f64, &bytes)?;
                none()
            }
            I::StoreF64Le { args } => {
                let mut bytes = [0u8; 8];
                endian::write_f64(&mut bytes, v(args[0]).as_f64(), LE);
                self.store_bytes(SrcSpan::synthetic(), v(args[1]).as_ptr(), self.tys.f64, &bytes)?;
                none()
            }
            I::StorePtr32Be { args } => {
                let mut bytes = [0u8; 4];
                endian::write_u32(&mut bytes, v(args[0]).as_ptr() as u32, BE);
                self.store_bytes(SrcSpan::synthetic(), v(args[1]).as_ptr(), self.tys.ptr, &bytes)?;
                none()
            }
            I::StorePtr32Le { args } => {
                let mut bytes = [0u8; 4];
                endian::write_u32(&mut bytes, v(args[0]).as_ptr() as u32, LE);
                self.store_bytes(SrcSpan::synthetic(), v(args[1]).as_ptr(), self.tys.ptr, &bytes)?;
                none()
            }
            I::StorePtr64Be { args } => {
                let mut bytes = [0u8; 8];
                endian::write_u64(&mut bytes, v(args[0]).as_ptr(), BE);
                self.store_bytes(SrcSpan::synthetic(), v(args[1]).as_ptr(), self.tys.ptr, &bytes)?;
                none()
            }
            I::StorePtr64Le { args } => {
                let mut bytes = [0u8; 8];
                endian::write_u64(&mut bytes, v(args[0]).as_ptr(), LE);
                self.store_bytes(SrcSpan::synthetic(), v(args[1]).as_ptr(), self.tys.ptr, &bytes)?;
                none()
            }

            ////////// casts //////////
            I::CastZextI1ToI8 { args } => ok(InstrValue::from_u8(v(args[0]).as_i1() as u8)),
            I::CastZextI1ToI16 { args } => ok(InstrValue::from_u16(v(args[0]).as_i1() as u16)),
            I::CastZextI1ToI32 { args } => ok(InstrValue::from_u32(v(args[0]).as_i1() as u32)),
            I::CastZextI1ToI64 { args } => ok(InstrValue::from_u64(v(args[0]).as_i1() as u64)),
            I::CastZextI8ToI16 { args } => ok(InstrValue::from_u16(v(args[0]).as_u8() as u16)),
            I::CastZextI8ToI32 { args } => ok(InstrValue::from_u32(v(args[0]).as_u8() as u32)),
            I::CastZextI8ToI64 { args } => ok(InstrValue::from_u64(v(args[0]).as_u8() as u64)),
            I::CastZextI16ToI32 { args } => ok(InstrValue::from_u32(v(args[0]).as_u16() as u32)),
            I::CastZextI16ToI64 { args } => ok(InstrValue::from_u64(v(args[0]).as_u16() as u64)),
            I::CastZextI32ToI64 { args } => ok(InstrValue::from_u64(v(args[0]).as_u32() as u64)),
            I::CastSextI8ToI16 { args } => {
                ok(InstrValue::from_u16(v(args[0]).as_u8() as i8 as i16 as u16))
            }
            I::CastSextI8ToI32 { args } => {
                ok(InstrValue::from_u32(v(args[0]).as_u8() as i8 as i32 as u32))
            }
            I::CastSextI8ToI64 { args } => {
                ok(InstrValue::from_u64(v(args[0]).as_u8() as i8 as i64 as u64))
            }
            I::CastSextI16ToI32 { args } => {
                ok(InstrValue::from_u32(v(args[0]).as_u16() as i16 as i32 as u32))
            }
            I::CastSextI16ToI64 { args } => {
                ok(InstrValue::from_u64(v(args[0]).as_u16() as i16 as i64 as u64))
            }
            I::CastSextI32ToI64 { args } => {
                ok(InstrValue::from_u64(v(args[0]).as_u32() as i32 as i64 as u64))
            }
            I::CastTruncI64ToI8 { args } => ok(InstrValue::from_u8(v(args[0]).as_u64() as u8)),
            I::CastTruncI64ToI16 { args } => ok(InstrValue::from_u16(v(args[0]).as_u64() as u16)),
            I::CastTruncI64ToI32 { args } => ok(InstrValue::from_u32(v(args[0]).as_u64() as u32)),
            I::CastTruncI32ToI8 { args } => ok(InstrValue::from_u8(v(args[0]).as_u32() as u8)),
            I::CastTruncI32ToI16 { args } => ok(InstrValue::from_u16(v(args[0]).as_u32() as u16)),
            I::CastTruncI16ToI8 { args } => ok(InstrValue::from_u8(v(args[0]).as_u16() as u8)),
            I::CastF32ToF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f32() as f64)),
            I::CastF64ToF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f64() as f32)),
            I::CastF32ToI8 { args } => ok(InstrValue::from_u8(v(args[0]).as_f32() as i8 as u8)),
            I::CastF32ToI16 { args } => ok(InstrValue::from_u16(v(args[0]).as_f32() as i16 as u16)),
            I::CastF32ToI32 { args } => ok(InstrValue::from_u32(v(args[0]).as_f32() as i32 as u32)),
            I::CastF32ToI64 { args } => ok(InstrValue::from_u64(v(args[0]).as_f32() as i64 as u64)),
            I::CastF32ToU8 { args } => ok(InstrValue::from_u8(v(args[0]).as_f32() as u8)),
            I::CastF32ToU16 { args } => ok(InstrValue::from_u16(v(args[0]).as_f32() as u16)),
            I::CastF32ToU32 { args } => ok(InstrValue::from_u32(v(args[0]).as_f32() as u32)),
            I::CastF32ToU64 { args } => ok(InstrValue::from_u64(v(args[0]).as_f32() as u64)),
            I::CastF64ToI8 { args } => ok(InstrValue::from_u8(v(args[0]).as_f64() as i8 as u8)),
            I::CastF64ToI16 { args } => ok(InstrValue::from_u16(v(args[0]).as_f64() as i16 as u16)),
            I::CastF64ToI32 { args } => ok(InstrValue::from_u32(v(args[0]).as_f64() as i32 as u32)),
            I::CastF64ToI64 { args } => ok(InstrValue::from_u64(v(args[0]).as_f64() as i64 as u64)),
            I::CastF64ToU8 { args } => ok(InstrValue::from_u8(v(args[0]).as_f64() as u8)),
            I::CastF64ToU16 { args } => ok(InstrValue::from_u16(v(args[0]).as_f64() as u16)),
            I::CastF64ToU32 { args } => ok(InstrValue::from_u32(v(args[0]).as_f64() as u32)),
            I::CastF64ToU64 { args } => ok(InstrValue::from_u64(v(args[0]).as_f64() as u64)),
            I::CastI8ToF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_u8() as i8 as f32)),
            I::CastI16ToF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_u16() as i16 as f32)),
            I::CastI32ToF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_u32() as i32 as f32)),
            I::CastI64ToF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_u64() as i64 as f32)),
            I::CastU8ToF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_u8() as f32)),
            I::CastU16ToF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_u16() as f32)),
            I::CastU32ToF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_u32() as f32)),
            I::CastU64ToF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_u64() as f32)),
            I::CastI8ToF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_u8() as i8 as f64)),
            I::CastI16ToF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_u16() as i16 as f64)),
            I::CastI32ToF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_u32() as i32 as f64)),
            I::CastI64ToF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_u64() as i64 as f64)),
            I::CastU8ToF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_u8() as f64)),
            I::CastU16ToF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_u16() as f64)),
            I::CastU32ToF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_u32() as f64)),
            I::CastU64ToF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_u64() as f64)),

            ////////// integer comparisons //////////
            I::CmpEqI1 { args } => ok(InstrValue::from_i1(v(args[0]).as_i1() == v(args[1]).as_i1())),
            I::CmpEqI8 { args } => ok(InstrValue::from_i1(v(args[0]).as_u8() == v(args[1]).as_u8())),
            I::CmpEqI16 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u16() == v(args[1]).as_u16()))
            }
            I::CmpEqI32 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u32() == v(args[1]).as_u32()))
            }
            I::CmpEqI64 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u64() == v(args[1]).as_u64()))
            }
            I::CmpNeqI1 { args } => ok(InstrValue::from_i1(v(args[0]).as_i1() != v(args[1]).as_i1())),
            I::CmpNeqI8 { args } => ok(InstrValue::from_i1(v(args[0]).as_u8() != v(args[1]).as_u8())),
            I::CmpNeqI16 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u16() != v(args[1]).as_u16()))
            }
            I::CmpNeqI32 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u32() != v(args[1]).as_u32()))
            }
            I::CmpNeqI64 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u64() != v(args[1]).as_u64()))
            }
            I::CmpLtI8 { args } => {
                ok(InstrValue::from_i1((v(args[0]).as_u8() as i8) < v(args[1]).as_u8() as i8))
            }
            I::CmpLtI16 { args } => {
                ok(InstrValue::from_i1((v(args[0]).as_u16() as i16) < v(args[1]).as_u16() as i16))
            }
            I::CmpLtI32 { args } => {
                ok(InstrValue::from_i1((v(args[0]).as_u32() as i32) < v(args[1]).as_u32() as i32))
            }
            I::CmpLtI64 { args } => {
                ok(InstrValue::from_i1((v(args[0]).as_u64() as i64) < v(args[1]).as_u64() as i64))
            }
            I::CmpLtU8 { args } => ok(InstrValue::from_i1(v(args[0]).as_u8() < v(args[1]).as_u8())),
            I::CmpLtU16 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u16() < v(args[1]).as_u16()))
            }
            I::CmpLtU32 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u32() < v(args[1]).as_u32()))
            }
            I::CmpLtU64 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u64() < v(args[1]).as_u64()))
            }
            I::CmpGtI8 { args } => {
                ok(InstrValue::from_i1((v(args[0]).as_u8() as i8) > v(args[1]).as_u8() as i8))
            }
            I::CmpGtI16 { args } => {
                ok(InstrValue::from_i1((v(args[0]).as_u16() as i16) > v(args[1]).as_u16() as i16))
            }
            I::CmpGtI32 { args } => {
                ok(InstrValue::from_i1((v(args[0]).as_u32() as i32) > v(args[1]).as_u32() as i32))
            }
            I::CmpGtI64 { args } => {
                ok(InstrValue::from_i1((v(args[0]).as_u64() as i64) > v(args[1]).as_u64() as i64))
            }
            I::CmpGtU8 { args } => ok(InstrValue::from_i1(v(args[0]).as_u8() > v(args[1]).as_u8())),
            I::CmpGtU16 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u16() > v(args[1]).as_u16()))
            }
            I::CmpGtU32 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u32() > v(args[1]).as_u32()))
            }
            I::CmpGtU64 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u64() > v(args[1]).as_u64()))
            }
            I::CmpLteI8 { args } => {
                ok(InstrValue::from_i1((v(args[0]).as_u8() as i8) <= v(args[1]).as_u8() as i8))
            }
            I::CmpLteI16 { args } => {
                ok(InstrValue::from_i1((v(args[0]).as_u16() as i16) <= v(args[1]).as_u16() as i16))
            }
            I::CmpLteI32 { args } => {
                ok(InstrValue::from_i1((v(args[0]).as_u32() as i32) <= v(args[1]).as_u32() as i32))
            }
            I::CmpLteI64 { args } => {
                ok(InstrValue::from_i1((v(args[0]).as_u64() as i64) <= v(args[1]).as_u64() as i64))
            }
            I::CmpLteU8 { args } => ok(InstrValue::from_i1(v(args[0]).as_u8() <= v(args[1]).as_u8())),
            I::CmpLteU16 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u16() <= v(args[1]).as_u16()))
            }
            I::CmpLteU32 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u32() <= v(args[1]).as_u32()))
            }
            I::CmpLteU64 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u64() <= v(args[1]).as_u64()))
            }
            I::CmpGteI8 { args } => {
                ok(InstrValue::from_i1((v(args[0]).as_u8() as i8) >= v(args[1]).as_u8() as i8))
            }
            I::CmpGteI16 { args } => {
                ok(InstrValue::from_i1((v(args[0]).as_u16() as i16) >= v(args[1]).as_u16() as i16))
            }
            I::CmpGteI32 { args } => {
                ok(InstrValue::from_i1((v(args[0]).as_u32() as i32) >= v(args[1]).as_u32() as i32))
            }
            I::CmpGteI64 { args } => {
                ok(InstrValue::from_i1((v(args[0]).as_u64() as i64) >= v(args[1]).as_u64() as i64))
            }
            I::CmpGteU8 { args } => ok(InstrValue::from_i1(v(args[0]).as_u8() >= v(args[1]).as_u8())),
            I::CmpGteU16 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u16() >= v(args[1]).as_u16()))
            }
            I::CmpGteU32 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u32() >= v(args[1]).as_u32()))
            }
            I::CmpGteU64 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_u64() >= v(args[1]).as_u64()))
            }

            ////////// float comparisons //////////
            I::CmpEqF32 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_f32() == v(args[1]).as_f32()))
            }
            I::CmpEqF64 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_f64() == v(args[1]).as_f64()))
            }
            I::CmpNeqF32 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_f32() != v(args[1]).as_f32()))
            }
            I::CmpNeqF64 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_f64() != v(args[1]).as_f64()))
            }
            I::CmpLtF32 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_f32() < v(args[1]).as_f32()))
            }
            I::CmpLtF64 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_f64() < v(args[1]).as_f64()))
            }
            I::CmpGtF32 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_f32() > v(args[1]).as_f32()))
            }
            I::CmpGtF64 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_f64() > v(args[1]).as_f64()))
            }
            I::CmpLteF32 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_f32() <= v(args[1]).as_f32()))
            }
            I::CmpLteF64 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_f64() <= v(args[1]).as_f64()))
            }
            I::CmpGteF32 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_f32() >= v(args[1]).as_f32()))
            }
            I::CmpGteF64 { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_f64() >= v(args[1]).as_f64()))
            }
            I::CmpEqF32Check { args, src }
            | I::CmpNeqF32Check { args, src }
            | I::CmpLtF32Check { args, src }
            | I::CmpGtF32Check { args, src }
            | I::CmpLteF32Check { args, src }
            | I::CmpGteF32Check { args, src } => {
                if v(args[0]).as_f32().is_nan() || v(args[1]).as_f32().is_nan() {
                    let span = self.span_of(func, src);
                    self.report_warning(
                        WarningKind::NanCompare,
                        span,
                        "comparing with a NaN operand".to_string(),
                    );
                }
                none()
            }
            I::CmpEqF64Check { args, src }
            | I::CmpNeqF64Check { args, src }
            | I::CmpLtF64Check { args, src }
            | I::CmpGtF64Check { args, src }
            | I::CmpLteF64Check { args, src }
            | I::CmpGteF64Check { args, src } => {
                if v(args[0]).as_f64().is_nan() || v(args[1]).as_f64().is_nan() {
                    let span = self.span_of(func, src);
                    self.report_warning(
                        WarningKind::NanCompare,
                        span,
                        "comparing with a NaN operand".to_string(),
                    );
                }
                none()
            }

            ////////// pointer comparisons //////////
            I::CmpEqPtr { args } => {
                // Raw compare; one-past-the-end markers are deduplicated,
                // so equal end addresses compare equal and an end marker
                // never collides with an adjacent object's base.
                ok(InstrValue::from_i1(v(args[0]).as_ptr() == v(args[1]).as_ptr()))
            }
            I::CmpNeqPtr { args } => {
                ok(InstrValue::from_i1(v(args[0]).as_ptr() != v(args[1]).as_ptr()))
            }
            I::CmpLtPtr { args, src } => {
                let ordering = self.compare_ptrs(func, src, v(args[0]), v(args[1]))?;
                ok(InstrValue::from_i1(ordering.is_lt()))
            }
            I::CmpGtPtr { args, src } => {
                let ordering = self.compare_ptrs(func, src, v(args[0]), v(args[1]))?;
                ok(InstrValue::from_i1(ordering.is_gt()))
            }
            I::CmpLtePtr { args, src } => {
                let ordering = self.compare_ptrs(func, src, v(args[0]), v(args[1]))?;
                ok(InstrValue::from_i1(ordering.is_le()))
            }
            I::CmpGtePtr { args, src } => {
                let ordering = self.compare_ptrs(func, src, v(args[0]), v(args[1]))?;
                ok(InstrValue::from_i1(ordering.is_ge()))
            }

            ////////// negation //////////
            I::NegI8 { args } => ok(InstrValue::from_u8((v(args[0]).as_u8()).wrapping_neg())),
            I::NegI16 { args } => ok(InstrValue::from_u16((v(args[0]).as_u16()).wrapping_neg())),
            I::NegI32 { args } => ok(InstrValue::from_u32((v(args[0]).as_u32()).wrapping_neg())),
            I::NegI64 { args } => ok(InstrValue::from_u64((v(args[0]).as_u64()).wrapping_neg())),
            I::NegF32 { args } => ok(InstrValue::from_f32(-v(args[0]).as_f32())),
            I::NegF64 { args } => ok(InstrValue::from_f64(-v(args[0]).as_f64())),
            I::NegI8Check { args, src } => {
                self.int_overflow_warning(func, src, v(args[0]).as_u8() as i8 == i8::MIN);
                none()
            }
            I::NegI16Check { args, src } => {
                self.int_overflow_warning(func, src, v(args[0]).as_u16() as i16 == i16::MIN);
                none()
            }
            I::NegI32Check { args, src } => {
                self.int_overflow_warning(func, src, v(args[0]).as_u32() as i32 == i32::MIN);
                none()
            }
            I::NegI64Check { args, src } => {
                self.int_overflow_warning(func, src, v(args[0]).as_u64() as i64 == i64::MIN);
                none()
            }

            ////////// addition //////////
            I::AddI8 { args } => {
                ok(InstrValue::from_u8(v(args[0]).as_u8().wrapping_add(v(args[1]).as_u8())))
            }
            I::AddI16 { args } => {
                ok(InstrValue::from_u16(v(args[0]).as_u16().wrapping_add(v(args[1]).as_u16())))
            }
            I::AddI32 { args } => {
                ok(InstrValue::from_u32(v(args[0]).as_u32().wrapping_add(v(args[1]).as_u32())))
            }
            I::AddI64 { args } => {
                ok(InstrValue::from_u64(v(args[0]).as_u64().wrapping_add(v(args[1]).as_u64())))
            }
            I::AddF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32() + v(args[1]).as_f32())),
            I::AddF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64() + v(args[1]).as_f64())),
            I::AddPtrI32 { args, src, .. } => {
                let offset = v(args[1]).as_u32() as i32 as i64;
                self.ptr_arith(func, src, inst, v(args[0]), offset)
            }
            I::AddPtrU32 { args, src, .. } => {
                let offset = v(args[1]).as_u32() as i64;
                self.ptr_arith(func, src, inst, v(args[0]), offset)
            }
            I::AddPtrI64 { args, src, .. } => {
                let offset = v(args[1]).as_u64() as i64;
                self.ptr_arith(func, src, inst, v(args[0]), offset)
            }
            I::AddPtrU64 { args, src, .. } => {
                let offset = v(args[1]).as_u64();
                if offset > i64::MAX as u64 {
                    let span = self.span_of(func, src);
                    return Err(self.report_memory_error(span, MemoryError::PtrArithOutOfBounds));
                }
                self.ptr_arith(func, src, inst, v(args[0]), offset as i64)
            }
            I::AddI8Check { args, src } => {
                let overflow = (v(args[0]).as_u8() as i8)
                    .checked_add(v(args[1]).as_u8() as i8)
                    .is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::AddI16Check { args, src } => {
                let overflow = (v(args[0]).as_u16() as i16)
                    .checked_add(v(args[1]).as_u16() as i16)
                    .is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::AddI32Check { args, src } => {
                let overflow = (v(args[0]).as_u32() as i32)
                    .checked_add(v(args[1]).as_u32() as i32)
                    .is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::AddI64Check { args, src } => {
                let overflow = (v(args[0]).as_u64() as i64)
                    .checked_add(v(args[1]).as_u64() as i64)
                    .is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::AddU8Check { args, src } => {
                let overflow = v(args[0]).as_u8().checked_add(v(args[1]).as_u8()).is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::AddU16Check { args, src } => {
                let overflow = v(args[0]).as_u16().checked_add(v(args[1]).as_u16()).is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::AddU32Check { args, src } => {
                let overflow = v(args[0]).as_u32().checked_add(v(args[1]).as_u32()).is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::AddU64Check { args, src } => {
                let overflow = v(args[0]).as_u64().checked_add(v(args[1]).as_u64()).is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::AddF32Check { args, src } => {
                let (a, b) = (v(args[0]).as_f32(), v(args[1]).as_f32());
                self.float_overflow_warning(func, src, (a + b).is_finite(), a.is_finite() && b.is_finite());
                none()
            }
            I::AddF64Check { args, src } => {
                let (a, b) = (v(args[0]).as_f64(), v(args[1]).as_f64());
                self.float_overflow_warning(func, src, (a + b).is_finite(), a.is_finite() && b.is_finite());
                none()
            }

            ////////// subtraction //////////
            I::SubI8 { args } => {
                ok(InstrValue::from_u8(v(args[0]).as_u8().wrapping_sub(v(args[1]).as_u8())))
            }
            I::SubI16 { args } => {
                ok(InstrValue::from_u16(v(args[0]).as_u16().wrapping_sub(v(args[1]).as_u16())))
            }
            I::SubI32 { args } => {
                ok(InstrValue::from_u32(v(args[0]).as_u32().wrapping_sub(v(args[1]).as_u32())))
            }
            I::SubI64 { args } => {
                ok(InstrValue::from_u64(v(args[0]).as_u64().wrapping_sub(v(args[1]).as_u64())))
            }
            I::SubF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32() - v(args[1]).as_f32())),
            I::SubF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64() - v(args[1]).as_f64())),
            I::SubPtrI32 { args, src, .. } => {
                let offset = -(v(args[1]).as_u32() as i32 as i64);
                self.ptr_arith(func, src, inst, v(args[0]), offset)
            }
            I::SubPtrU32 { args, src, .. } => {
                let offset = -(v(args[1]).as_u32() as i64);
                self.ptr_arith(func, src, inst, v(args[0]), offset)
            }
            I::SubPtrI64 { args, src, .. } => {
                let offset = v(args[1]).as_u64() as i64;
                if offset == i64::MIN {
                    let span = self.span_of(func, src);
                    return Err(self.report_memory_error(span, MemoryError::PtrArithOutOfBounds));
                }
                self.ptr_arith(func, src, inst, v(args[0]), -offset)
            }
            I::SubPtrU64 { args, src, .. } => {
                let offset = v(args[1]).as_u64();
                if offset > i64::MAX as u64 {
                    let span = self.span_of(func, src);
                    return Err(self.report_memory_error(span, MemoryError::PtrArithOutOfBounds));
                }
                self.ptr_arith(func, src, inst, v(args[0]), -(offset as i64))
            }
            I::SubI8Check { args, src } => {
                let overflow = (v(args[0]).as_u8() as i8)
                    .checked_sub(v(args[1]).as_u8() as i8)
                    .is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::SubI16Check { args, src } => {
                let overflow = (v(args[0]).as_u16() as i16)
                    .checked_sub(v(args[1]).as_u16() as i16)
                    .is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::SubI32Check { args, src } => {
                let overflow = (v(args[0]).as_u32() as i32)
                    .checked_sub(v(args[1]).as_u32() as i32)
                    .is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::SubI64Check { args, src } => {
                let overflow = (v(args[0]).as_u64() as i64)
                    .checked_sub(v(args[1]).as_u64() as i64)
                    .is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::SubU8Check { args, src } => {
                let overflow = v(args[0]).as_u8().checked_sub(v(args[1]).as_u8()).is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::SubU16Check { args, src } => {
                let overflow = v(args[0]).as_u16().checked_sub(v(args[1]).as_u16()).is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::SubU32Check { args, src } => {
                let overflow = v(args[0]).as_u32().checked_sub(v(args[1]).as_u32()).is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::SubU64Check { args, src } => {
                let overflow = v(args[0]).as_u64().checked_sub(v(args[1]).as_u64()).is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::SubF32Check { args, src } => {
                let (a, b) = (v(args[0]).as_f32(), v(args[1]).as_f32());
                self.float_overflow_warning(func, src, (a - b).is_finite(), a.is_finite() && b.is_finite());
                none()
            }
            I::SubF64Check { args, src } => {
                let (a, b) = (v(args[0]).as_f64(), v(args[1]).as_f64());
                self.float_overflow_warning(func, src, (a - b).is_finite(), a.is_finite() && b.is_finite());
                none()
            }

            ////////// pointer difference //////////
            I::Ptr32Diff { args, src, stride } => {
                let diff = self.ptr_diff(func, src, v(args[0]), v(args[1]), stride)?;
                ok(InstrValue::from_u32(diff as i32 as u32))
            }
            I::Ptr64Diff { args, src, stride } => {
                let diff = self.ptr_diff(func, src, v(args[0]), v(args[1]), stride)?;
                ok(InstrValue::from_u64(diff as u64))
            }

            ////////// multiplication //////////
            I::MulI8 { args } => {
                ok(InstrValue::from_u8(v(args[0]).as_u8().wrapping_mul(v(args[1]).as_u8())))
            }
            I::MulI16 { args } => {
                ok(InstrValue::from_u16(v(args[0]).as_u16().wrapping_mul(v(args[1]).as_u16())))
            }
            I::MulI32 { args } => {
                ok(InstrValue::from_u32(v(args[0]).as_u32().wrapping_mul(v(args[1]).as_u32())))
            }
            I::MulI64 { args } => {
                ok(InstrValue::from_u64(v(args[0]).as_u64().wrapping_mul(v(args[1]).as_u64())))
            }
            I::MulF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32() * v(args[1]).as_f32())),
            I::MulF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64() * v(args[1]).as_f64())),
            I::MulI8Check { args, src } => {
                let overflow = (v(args[0]).as_u8() as i8)
                    .checked_mul(v(args[1]).as_u8() as i8)
                    .is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::MulI16Check { args, src } => {
                let overflow = (v(args[0]).as_u16() as i16)
                    .checked_mul(v(args[1]).as_u16() as i16)
                    .is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::MulI32Check { args, src } => {
                let overflow = (v(args[0]).as_u32() as i32)
                    .checked_mul(v(args[1]).as_u32() as i32)
                    .is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::MulI64Check { args, src } => {
                let overflow = (v(args[0]).as_u64() as i64)
                    .checked_mul(v(args[1]).as_u64() as i64)
                    .is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::MulU8Check { args, src } => {
                let overflow = v(args[0]).as_u8().checked_mul(v(args[1]).as_u8()).is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::MulU16Check { args, src } => {
                let overflow = v(args[0]).as_u16().checked_mul(v(args[1]).as_u16()).is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::MulU32Check { args, src } => {
                let overflow = v(args[0]).as_u32().checked_mul(v(args[1]).as_u32()).is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::MulU64Check { args, src } => {
                let overflow = v(args[0]).as_u64().checked_mul(v(args[1]).as_u64()).is_none();
                self.int_overflow_warning(func, src, overflow);
                none()
            }
            I::MulF32Check { args, src } => {
                let (a, b) = (v(args[0]).as_f32(), v(args[1]).as_f32());
                self.float_overflow_warning(func, src, (a * b).is_finite(), a.is_finite() && b.is_finite());
                none()
            }
            I::MulF64Check { args, src } => {
                let (a, b) = (v(args[0]).as_f64(), v(args[1]).as_f64());
                self.float_overflow_warning(func, src, (a * b).is_finite(), a.is_finite() && b.is_finite());
                none()
            }

            ////////// division //////////
            I::DivI8 { args } => {
                let (a, b) = (v(args[0]).as_u8() as i8, v(args[1]).as_u8() as i8);
                ok(InstrValue::from_u8((if b == 0 { 0 } else { a.wrapping_div(b) }) as u8))
            }
            I::DivI16 { args } => {
                let (a, b) = (v(args[0]).as_u16() as i16, v(args[1]).as_u16() as i16);
                ok(InstrValue::from_u16((if b == 0 { 0 } else { a.wrapping_div(b) }) as u16))
            }
            I::DivI32 { args } => {
                let (a, b) = (v(args[0]).as_u32() as i32, v(args[1]).as_u32() as i32);
                ok(InstrValue::from_u32((if b == 0 { 0 } else { a.wrapping_div(b) }) as u32))
            }
            I::DivI64 { args } => {
                let (a, b) = (v(args[0]).as_u64() as i64, v(args[1]).as_u64() as i64);
                ok(InstrValue::from_u64((if b == 0 { 0 } else { a.wrapping_div(b) }) as u64))
            }
            I::DivU8 { args } => {
                let (a, b) = (v(args[0]).as_u8(), v(args[1]).as_u8());
                ok(InstrValue::from_u8(if b == 0 { 0 } else { a / b }))
            }
            I::DivU16 { args } => {
                let (a, b) = (v(args[0]).as_u16(), v(args[1]).as_u16());
                ok(InstrValue::from_u16(if b == 0 { 0 } else { a / b }))
            }
            I::DivU32 { args } => {
                let (a, b) = (v(args[0]).as_u32(), v(args[1]).as_u32());
                ok(InstrValue::from_u32(if b == 0 { 0 } else { a / b }))
            }
            I::DivU64 { args } => {
                let (a, b) = (v(args[0]).as_u64(), v(args[1]).as_u64());
                ok(InstrValue::from_u64(if b == 0 { 0 } else { a / b }))
            }
            I::DivF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32() / v(args[1]).as_f32())),
            I::DivF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64() / v(args[1]).as_f64())),
            I::DivI8Check { args, src } => {
                let (a, b) = (v(args[0]).as_u8() as i8, v(args[1]).as_u8() as i8);
                self.signed_div_check(func, src, b == 0, a == i8::MIN && b == -1)?;
                none()
            }
            I::DivI16Check { args, src } => {
                let (a, b) = (v(args[0]).as_u16() as i16, v(args[1]).as_u16() as i16);
                self.signed_div_check(func, src, b == 0, a == i16::MIN && b == -1)?;
                none()
            }
            I::DivI32Check { args, src } => {
                let (a, b) = (v(args[0]).as_u32() as i32, v(args[1]).as_u32() as i32);
                self.signed_div_check(func, src, b == 0, a == i32::MIN && b == -1)?;
                none()
            }
            I::DivI64Check { args, src } => {
                let (a, b) = (v(args[0]).as_u64() as i64, v(args[1]).as_u64() as i64);
                self.signed_div_check(func, src, b == 0, a == i64::MIN && b == -1)?;
                none()
            }
            I::DivU8Check { args, src } => {
                self.signed_div_check(func, src, v(args[1]).as_u8() == 0, false)?;
                none()
            }
            I::DivU16Check { args, src } => {
                self.signed_div_check(func, src, v(args[1]).as_u16() == 0, false)?;
                none()
            }
            I::DivU32Check { args, src } => {
                self.signed_div_check(func, src, v(args[1]).as_u32() == 0, false)?;
                none()
            }
            I::DivU64Check { args, src } => {
                self.signed_div_check(func, src, v(args[1]).as_u64() == 0, false)?;
                none()
            }
            I::DivF32Check { args, src } => {
                if v(args[1]).as_f32() == 0.0 {
                    let span = self.span_of(func, src);
                    self.report_warning(
                        WarningKind::FloatDivideByZero,
                        span,
                        "floating-point division by zero".to_string(),
                    );
                }
                none()
            }
            I::DivF64Check { args, src } => {
                if v(args[1]).as_f64() == 0.0 {
                    let span = self.span_of(func, src);
                    self.report_warning(
                        WarningKind::FloatDivideByZero,
                        span,
                        "floating-point division by zero".to_string(),
                    );
                }
                none()
            }

            ////////// remainder //////////
            I::RemI8 { args } => {
                let (a, b) = (v(args[0]).as_u8() as i8, v(args[1]).as_u8() as i8);
                ok(InstrValue::from_u8((if b == 0 { 0 } else { a.wrapping_rem(b) }) as u8))
            }
            I::RemI16 { args } => {
                let (a, b) = (v(args[0]).as_u16() as i16, v(args[1]).as_u16() as i16);
                ok(InstrValue::from_u16((if b == 0 { 0 } else { a.wrapping_rem(b) }) as u16))
            }
            I::RemI32 { args } => {
                let (a, b) = (v(args[0]).as_u32() as i32, v(args[1]).as_u32() as i32);
                ok(InstrValue::from_u32((if b == 0 { 0 } else { a.wrapping_rem(b) }) as u32))
            }
            I::RemI64 { args } => {
                let (a, b) = (v(args[0]).as_u64() as i64, v(args[1]).as_u64() as i64);
                ok(InstrValue::from_u64((if b == 0 { 0 } else { a.wrapping_rem(b) }) as u64))
            }
            I::RemU8 { args } => {
                let (a, b) = (v(args[0]).as_u8(), v(args[1]).as_u8());
                ok(InstrValue::from_u8(if b == 0 { 0 } else { a % b }))
            }
            I::RemU16 { args } => {
                let (a, b) = (v(args[0]).as_u16(), v(args[1]).as_u16());
                ok(InstrValue::from_u16(if b == 0 { 0 } else { a % b }))
            }
            I::RemU32 { args } => {
                let (a, b) = (v(args[0]).as_u32(), v(args[1]).as_u32());
                ok(InstrValue::from_u32(if b == 0 { 0 } else { a % b }))
            }
            I::RemU64 { args } => {
                let (a, b) = (v(args[0]).as_u64(), v(args[1]).as_u64());
                ok(InstrValue::from_u64(if b == 0 { 0 } else { a % b }))
            }
            I::RemI8Check { args, src } => {
                let (a, b) = (v(args[0]).as_u8() as i8, v(args[1]).as_u8() as i8);
                self.signed_div_check(func, src, b == 0, a == i8::MIN && b == -1)?;
                none()
            }
            I::RemI16Check { args, src } => {
                let (a, b) = (v(args[0]).as_u16() as i16, v(args[1]).as_u16() as i16);
                self.signed_div_check(func, src, b == 0, a == i16::MIN && b == -1)?;
                none()
            }
            I::RemI32Check { args, src } => {
                let (a, b) = (v(args[0]).as_u32() as i32, v(args[1]).as_u32() as i32);
                self.signed_div_check(func, src, b == 0, a == i32::MIN && b == -1)?;
                none()
            }
            I::RemI64Check { args, src } => {
                let (a, b) = (v(args[0]).as_u64() as i64, v(args[1]).as_u64() as i64);
                self.signed_div_check(func, src, b == 0, a == i64::MIN && b == -1)?;
                none()
            }
            I::RemU8Check { args, src } => {
                self.signed_div_check(func, src, v(args[1]).as_u8() == 0, false)?;
                none()
            }
            I::RemU16Check { args, src } => {
                self.signed_div_check(func, src, v(args[1]).as_u16() == 0, false)?;
                none()
            }
            I::RemU32Check { args, src } => {
                self.signed_div_check(func, src, v(args[1]).as_u32() == 0, false)?;
                none()
            }
            I::RemU64Check { args, src } => {
                self.signed_div_check(func, src, v(args[1]).as_u64() == 0, false)?;
                none()
            }

            ////////// bitwise //////////
            I::NotI1 { args } => ok(InstrValue::from_i1(!v(args[0]).as_i1())),
            I::NotI8 { args } => ok(InstrValue::from_u8(!v(args[0]).as_u8())),
            I::NotI16 { args } => ok(InstrValue::from_u16(!v(args[0]).as_u16())),
            I::NotI32 { args } => ok(InstrValue::from_u32(!v(args[0]).as_u32())),
            I::NotI64 { args } => ok(InstrValue::from_u64(!v(args[0]).as_u64())),
            I::AndI1 { args } => ok(InstrValue::from_i1(v(args[0]).as_i1() & v(args[1]).as_i1())),
            I::AndI8 { args } => ok(InstrValue::from_u8(v(args[0]).as_u8() & v(args[1]).as_u8())),
            I::AndI16 { args } => ok(InstrValue::from_u16(v(args[0]).as_u16() & v(args[1]).as_u16())),
            I::AndI32 { args } => ok(InstrValue::from_u32(v(args[0]).as_u32() & v(args[1]).as_u32())),
            I::AndI64 { args } => ok(InstrValue::from_u64(v(args[0]).as_u64() & v(args[1]).as_u64())),
            I::XorI1 { args } => ok(InstrValue::from_i1(v(args[0]).as_i1() ^ v(args[1]).as_i1())),
            I::XorI8 { args } => ok(InstrValue::from_u8(v(args[0]).as_u8() ^ v(args[1]).as_u8())),
            I::XorI16 { args } => ok(InstrValue::from_u16(v(args[0]).as_u16() ^ v(args[1]).as_u16())),
            I::XorI32 { args } => ok(InstrValue::from_u32(v(args[0]).as_u32() ^ v(args[1]).as_u32())),
            I::XorI64 { args } => ok(InstrValue::from_u64(v(args[0]).as_u64() ^ v(args[1]).as_u64())),
            I::OrI1 { args } => ok(InstrValue::from_i1(v(args[0]).as_i1() | v(args[1]).as_i1())),
            I::OrI8 { args } => ok(InstrValue::from_u8(v(args[0]).as_u8() | v(args[1]).as_u8())),
            I::OrI16 { args } => ok(InstrValue::from_u16(v(args[0]).as_u16() | v(args[1]).as_u16())),
            I::OrI32 { args } => ok(InstrValue::from_u32(v(args[0]).as_u32() | v(args[1]).as_u32())),
            I::OrI64 { args } => ok(InstrValue::from_u64(v(args[0]).as_u64() | v(args[1]).as_u64())),

            ////////// shifts //////////
            I::ShlI8Signed { args, src } | I::ShlI8Unsigned { args, src } => {
                let amount = self.shift_amount(func, src, inst, v(args[1]).as_u64(), 8)?;
                ok(InstrValue::from_u8(amount.map_or(0, |s| v(args[0]).as_u8() << s)))
            }
            I::ShlI16Signed { args, src } | I::ShlI16Unsigned { args, src } => {
                let amount = self.shift_amount(func, src, inst, v(args[1]).as_u64(), 16)?;
                ok(InstrValue::from_u16(amount.map_or(0, |s| v(args[0]).as_u16() << s)))
            }
            I::ShlI32Signed { args, src } | I::ShlI32Unsigned { args, src } => {
                let amount = self.shift_amount(func, src, inst, v(args[1]).as_u64(), 32)?;
                ok(InstrValue::from_u32(amount.map_or(0, |s| v(args[0]).as_u32() << s)))
            }
            I::ShlI64Signed { args, src } | I::ShlI64Unsigned { args, src } => {
                let amount = self.shift_amount(func, src, inst, v(args[1]).as_u64(), 64)?;
                ok(InstrValue::from_u64(amount.map_or(0, |s| v(args[0]).as_u64() << s)))
            }
            I::ShrI8Signed { args, src } | I::ShrI8Unsigned { args, src } => {
                let amount = self.shift_amount(func, src, inst, v(args[1]).as_u64(), 8)?;
                ok(InstrValue::from_u8(amount.map_or(0, |s| v(args[0]).as_u8() >> s)))
            }
            I::ShrI16Signed { args, src } | I::ShrI16Unsigned { args, src } => {
                let amount = self.shift_amount(func, src, inst, v(args[1]).as_u64(), 16)?;
                ok(InstrValue::from_u16(amount.map_or(0, |s| v(args[0]).as_u16() >> s)))
            }
            I::ShrI32Signed { args, src } | I::ShrI32Unsigned { args, src } => {
                let amount = self.shift_amount(func, src, inst, v(args[1]).as_u64(), 32)?;
                ok(InstrValue::from_u32(amount.map_or(0, |s| v(args[0]).as_u32() >> s)))
            }
            I::ShrI64Signed { args, src } | I::ShrI64Unsigned { args, src } => {
                let amount = self.shift_amount(func, src, inst, v(args[1]).as_u64(), 64)?;
                ok(InstrValue::from_u64(amount.map_or(0, |s| v(args[0]).as_u64() >> s)))
            }

            ////////// abs, min, max //////////
            I::AbsI8 { args } => {
                ok(InstrValue::from_u8((v(args[0]).as_u8() as i8).wrapping_abs() as u8))
            }
            I::AbsI16 { args } => {
                ok(InstrValue::from_u16((v(args[0]).as_u16() as i16).wrapping_abs() as u16))
            }
            I::AbsI32 { args } => {
                ok(InstrValue::from_u32((v(args[0]).as_u32() as i32).wrapping_abs() as u32))
            }
            I::AbsI64 { args } => {
                ok(InstrValue::from_u64((v(args[0]).as_u64() as i64).wrapping_abs() as u64))
            }
            I::AbsF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().abs())),
            I::AbsF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().abs())),
            I::AbsI8Check { args, src } => {
                self.int_overflow_warning(func, src, v(args[0]).as_u8() as i8 == i8::MIN);
                none()
            }
            I::AbsI16Check { args, src } => {
                self.int_overflow_warning(func, src, v(args[0]).as_u16() as i16 == i16::MIN);
                none()
            }
            I::AbsI32Check { args, src } => {
                self.int_overflow_warning(func, src, v(args[0]).as_u32() as i32 == i32::MIN);
                none()
            }
            I::AbsI64Check { args, src } => {
                self.int_overflow_warning(func, src, v(args[0]).as_u64() as i64 == i64::MIN);
                none()
            }
            I::AbsF32Check { args, src } => {
                self.math_domain_warning_f32(func, src, v(args[0]).as_f32(), v(args[0]).as_f32().abs());
                none()
            }
            I::AbsF64Check { args, src } => {
                self.math_domain_warning_f64(func, src, v(args[0]).as_f64(), v(args[0]).as_f64().abs());
                none()
            }
            I::MinI8 { args } => ok(InstrValue::from_u8(
                (v(args[0]).as_u8() as i8).min(v(args[1]).as_u8() as i8) as u8,
            )),
            I::MinI16 { args } => ok(InstrValue::from_u16(
                (v(args[0]).as_u16() as i16).min(v(args[1]).as_u16() as i16) as u16,
            )),
            I::MinI32 { args } => ok(InstrValue::from_u32(
                (v(args[0]).as_u32() as i32).min(v(args[1]).as_u32() as i32) as u32,
            )),
            I::MinI64 { args } => ok(InstrValue::from_u64(
                (v(args[0]).as_u64() as i64).min(v(args[1]).as_u64() as i64) as u64,
            )),
            I::MinU8 { args } => ok(InstrValue::from_u8(v(args[0]).as_u8().min(v(args[1]).as_u8()))),
            I::MinU16 { args } => {
                ok(InstrValue::from_u16(v(args[0]).as_u16().min(v(args[1]).as_u16())))
            }
            I::MinU32 { args } => {
                ok(InstrValue::from_u32(v(args[0]).as_u32().min(v(args[1]).as_u32())))
            }
            I::MinU64 { args } => {
                ok(InstrValue::from_u64(v(args[0]).as_u64().min(v(args[1]).as_u64())))
            }
            I::MinF32 { args } => {
                ok(InstrValue::from_f32(v(args[0]).as_f32().min(v(args[1]).as_f32())))
            }
            I::MinF64 { args } => {
                ok(InstrValue::from_f64(v(args[0]).as_f64().min(v(args[1]).as_f64())))
            }
            I::MinF32Check { args, src } | I::MaxF32Check { args, src } => {
                if v(args[0]).as_f32().is_nan() || v(args[1]).as_f32().is_nan() {
                    let span = self.span_of(func, src);
                    self.report_warning(
                        WarningKind::MathDomainError,
                        span,
                        "NaN operand in min/max".to_string(),
                    );
                }
                none()
            }
            I::MinF64Check { args, src } | I::MaxF64Check { args, src } => {
                if v(args[0]).as_f64().is_nan() || v(args[1]).as_f64().is_nan() {
                    let span = self.span_of(func, src);
                    self.report_warning(
                        WarningKind::MathDomainError,
                        span,
                        "NaN operand in min/max".to_string(),
                    );
                }
                none()
            }
            I::MaxI8 { args } => ok(InstrValue::from_u8(
                (v(args[0]).as_u8() as i8).max(v(args[1]).as_u8() as i8) as u8,
            )),
            I::MaxI16 { args } => ok(InstrValue::from_u16(
                (v(args[0]).as_u16() as i16).max(v(args[1]).as_u16() as i16) as u16,
            )),
            I::MaxI32 { args } => ok(InstrValue::from_u32(
                (v(args[0]).as_u32() as i32).max(v(args[1]).as_u32() as i32) as u32,
            )),
            I::MaxI64 { args } => ok(InstrValue::from_u64(
                (v(args[0]).as_u64() as i64).max(v(args[1]).as_u64() as i64) as u64,
            )),
            I::MaxU8 { args } => ok(InstrValue::from_u8(v(args[0]).as_u8().max(v(args[1]).as_u8()))),
            I::MaxU16 { args } => {
                ok(InstrValue::from_u16(v(args[0]).as_u16().max(v(args[1]).as_u16())))
            }
            I::MaxU32 { args } => {
                ok(InstrValue::from_u32(v(args[0]).as_u32().max(v(args[1]).as_u32())))
            }
            I::MaxU64 { args } => {
                ok(InstrValue::from_u64(v(args[0]).as_u64().max(v(args[1]).as_u64())))
            }
            I::MaxF32 { args } => {
                ok(InstrValue::from_f32(v(args[0]).as_f32().max(v(args[1]).as_f32())))
            }
            I::MaxF64 { args } => {
                ok(InstrValue::from_f64(v(args[0]).as_f64().max(v(args[1]).as_f64())))
            }

            ////////// math intrinsics //////////
            I::ExpF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().exp())),
            I::ExpF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().exp())),
            I::Exp2F32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().exp2())),
            I::Exp2F64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().exp2())),
            I::Expm1F32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().exp_m1())),
            I::Expm1F64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().exp_m1())),
            I::LogF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().ln())),
            I::LogF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().ln())),
            I::Log10F32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().log10())),
            I::Log10F64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().log10())),
            I::Log2F32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().log2())),
            I::Log2F64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().log2())),
            I::Log1pF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().ln_1p())),
            I::Log1pF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().ln_1p())),
            I::SqrtF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().sqrt())),
            I::SqrtF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().sqrt())),
            I::CbrtF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().cbrt())),
            I::CbrtF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().cbrt())),
            I::SinF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().sin())),
            I::SinF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().sin())),
            I::CosF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().cos())),
            I::CosF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().cos())),
            I::TanF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().tan())),
            I::TanF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().tan())),
            I::AsinF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().asin())),
            I::AsinF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().asin())),
            I::AcosF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().acos())),
            I::AcosF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().acos())),
            I::AtanF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().atan())),
            I::AtanF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().atan())),
            I::SinhF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().sinh())),
            I::SinhF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().sinh())),
            I::CoshF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().cosh())),
            I::CoshF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().cosh())),
            I::TanhF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().tanh())),
            I::TanhF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().tanh())),
            I::AsinhF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().asinh())),
            I::AsinhF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().asinh())),
            I::AcoshF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().acosh())),
            I::AcoshF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().acosh())),
            I::AtanhF32 { args } => ok(InstrValue::from_f32(v(args[0]).as_f32().atanh())),
            I::AtanhF64 { args } => ok(InstrValue::from_f64(v(args[0]).as_f64().atanh())),
            I::ErfF32 { args } => ok(InstrValue::from_f32(libm::erff(v(args[0]).as_f32()))),
            I::ErfF64 { args } => ok(InstrValue::from_f64(libm::erf(v(args[0]).as_f64()))),
            I::ErfcF32 { args } => ok(InstrValue::from_f32(libm::erfcf(v(args[0]).as_f32()))),
            I::ErfcF64 { args } => ok(InstrValue::from_f64(libm::erfc(v(args[0]).as_f64()))),
            I::TgammaF32 { args } => ok(InstrValue::from_f32(libm::tgammaf(v(args[0]).as_f32()))),
            I::TgammaF64 { args } => ok(InstrValue::from_f64(libm::tgamma(v(args[0]).as_f64()))),
            I::LgammaF32 { args } => {
                ok(InstrValue::from_f32(libm::lgammaf_r(v(args[0]).as_f32()).0))
            }
            I::LgammaF64 { args } => ok(InstrValue::from_f64(libm::lgamma_r(v(args[0]).as_f64()).0)),
            I::PowF32 { args } => {
                ok(InstrValue::from_f32(v(args[0]).as_f32().powf(v(args[1]).as_f32())))
            }
            I::PowF64 { args } => {
                ok(InstrValue::from_f64(v(args[0]).as_f64().powf(v(args[1]).as_f64())))
            }
            I::Atan2F32 { args } => {
                ok(InstrValue::from_f32(v(args[0]).as_f32().atan2(v(args[1]).as_f32())))
            }
            I::Atan2F64 { args } => {
                ok(InstrValue::from_f64(v(args[0]).as_f64().atan2(v(args[1]).as_f64())))
            }
            I::HypotF32 { args } => {
                ok(InstrValue::from_f32(v(args[0]).as_f32().hypot(v(args[1]).as_f32())))
            }
            I::HypotF64 { args } => {
                ok(InstrValue::from_f64(v(args[0]).as_f64().hypot(v(args[1]).as_f64())))
            }

            // Unary math domain checks: the result is NaN although the
            // input was not.
            I::ExpF32Check { args, src }
            | I::Exp2F32Check { args, src }
            | I::Expm1F32Check { args, src }
            | I::LogF32Check { args, src }
            | I::Log10F32Check { args, src }
            | I::Log2F32Check { args, src }
            | I::Log1pF32Check { args, src }
            | I::SqrtF32Check { args, src }
            | I::CbrtF32Check { args, src }
            | I::SinF32Check { args, src }
            | I::CosF32Check { args, src }
            | I::TanF32Check { args, src }
            | I::AsinF32Check { args, src }
            | I::AcosF32Check { args, src }
            | I::AtanF32Check { args, src }
            | I::SinhF32Check { args, src }
            | I::CoshF32Check { args, src }
            | I::TanhF32Check { args, src }
            | I::AsinhF32Check { args, src }
            | I::AcoshF32Check { args, src }
            | I::AtanhF32Check { args, src }
            | I::ErfF32Check { args, src }
            | I::ErfcF32Check { args, src }
            | I::TgammaF32Check { args, src }
            | I::LgammaF32Check { args, src } => {
                let x = v(args[0]).as_f32();
                let result = math_unary_f32(inst, x);
                self.math_domain_warning_f32(func, src, x, result);
                none()
            }
            I::ExpF64Check { args, src }
            | I::Exp2F64Check { args, src }
            | I::Expm1F64Check { args, src }
            | I::LogF64Check { args, src }
            | I::Log10F64Check { args, src }
            | I::Log2F64Check { args, src }
            | I::Log1pF64Check { args, src }
            | I::SqrtF64Check { args, src }
            | I::CbrtF64Check { args, src }
            | I::SinF64Check { args, src }
            | I::CosF64Check { args, src }
            | I::TanF64Check { args, src }
            | I::AsinF64Check { args, src }
            | I::AcosF64Check { args, src }
            | I::AtanF64Check { args, src }
            | I::SinhF64Check { args, src }
            | I::CoshF64Check { args, src }
            | I::TanhF64Check { args, src }
            | I::AsinhF64Check { args, src }
            | I::AcoshF64Check { args, src }
            | I::AtanhF64Check { args, src }
            | I::ErfF64Check { args, src }
            | I::ErfcF64Check { args, src }
            | I::TgammaF64Check { args, src }
            | I::LgammaF64Check { args, src } => {
                let x = v(args[0]).as_f64();
                let result = math_unary_f64(inst, x);
                self.math_domain_warning_f64(func, src, x, result);
                none()
            }
            I::PowF32Check { args, src }
            | I::Atan2F32Check { args, src }
            | I::HypotF32Check { args, src } => {
                let (x, y) = (v(args[0]).as_f32(), v(args[1]).as_f32());
                let result = math_binary_f32(inst, x, y);
                if result.is_nan() && !x.is_nan() && !y.is_nan() {
                    let span = self.span_of(func, src);
                    self.report_warning(
                        WarningKind::MathDomainError,
                        span,
                        "math domain error".to_string(),
                    );
                }
                none()
            }
            I::PowF64Check { args, src }
            | I::Atan2F64Check { args, src }
            | I::HypotF64Check { args, src } => {
                let (x, y) = (v(args[0]).as_f64(), v(args[1]).as_f64());
                let result = math_binary_f64(inst, x, y);
                if result.is_nan() && !x.is_nan() && !y.is_nan() {
                    let span = self.span_of(func, src);
                    self.report_warning(
                        WarningKind::MathDomainError,
                        span,
                        "math domain error".to_string(),
                    );
                }
                none()
            }

            ////////// bit manipulation //////////
            I::BitreverseU8 { args } => ok(InstrValue::from_u8(v(args[0]).as_u8().reverse_bits())),
            I::BitreverseU16 { args } => {
                ok(InstrValue::from_u16(v(args[0]).as_u16().reverse_bits()))
            }
            I::BitreverseU32 { args } => {
                ok(InstrValue::from_u32(v(args[0]).as_u32().reverse_bits()))
            }
            I::BitreverseU64 { args } => {
                ok(InstrValue::from_u64(v(args[0]).as_u64().reverse_bits()))
            }
            I::PopcountU8 { args } => ok(InstrValue::from_u8(v(args[0]).as_u8().count_ones() as u8)),
            I::PopcountU16 { args } => {
                ok(InstrValue::from_u16(v(args[0]).as_u16().count_ones() as u16))
            }
            I::PopcountU32 { args } => ok(InstrValue::from_u32(v(args[0]).as_u32().count_ones())),
            I::PopcountU64 { args } => {
                ok(InstrValue::from_u64(v(args[0]).as_u64().count_ones() as u64))
            }
            I::ByteswapU16 { args } => ok(InstrValue::from_u16(v(args[0]).as_u16().swap_bytes())),
            I::ByteswapU32 { args } => ok(InstrValue::from_u32(v(args[0]).as_u32().swap_bytes())),
            I::ByteswapU64 { args } => ok(InstrValue::from_u64(v(args[0]).as_u64().swap_bytes())),
            I::ClzU8 { args } => ok(InstrValue::from_u8(v(args[0]).as_u8().leading_zeros() as u8)),
            I::ClzU16 { args } => {
                ok(InstrValue::from_u16(v(args[0]).as_u16().leading_zeros() as u16))
            }
            I::ClzU32 { args } => ok(InstrValue::from_u32(v(args[0]).as_u32().leading_zeros())),
            I::ClzU64 { args } => {
                ok(InstrValue::from_u64(v(args[0]).as_u64().leading_zeros() as u64))
            }
            I::CtzU8 { args } => ok(InstrValue::from_u8(v(args[0]).as_u8().trailing_zeros() as u8)),
            I::CtzU16 { args } => {
                ok(InstrValue::from_u16(v(args[0]).as_u16().trailing_zeros() as u16))
            }
            I::CtzU32 { args } => ok(InstrValue::from_u32(v(args[0]).as_u32().trailing_zeros())),
            I::CtzU64 { args } => {
                ok(InstrValue::from_u64(v(args[0]).as_u64().trailing_zeros() as u64))
            }
            I::FshlU8 { args } => {
                let result = fshl(8, v(args[0]).as_u8() as u64, v(args[1]).as_u8() as u64, v(args[2]).as_u8() as u64);
                ok(InstrValue::from_u8(result as u8))
            }
            I::FshlU16 { args } => {
                let result = fshl(16, v(args[0]).as_u16() as u64, v(args[1]).as_u16() as u64, v(args[2]).as_u16() as u64);
                ok(InstrValue::from_u16(result as u16))
            }
            I::FshlU32 { args } => {
                let result = fshl(32, v(args[0]).as_u32() as u64, v(args[1]).as_u32() as u64, v(args[2]).as_u32() as u64);
                ok(InstrValue::from_u32(result as u32))
            }
            I::FshlU64 { args } => {
                let result = fshl(64, v(args[0]).as_u64(), v(args[1]).as_u64(), v(args[2]).as_u64());
                ok(InstrValue::from_u64(result))
            }
            I::FshrU8 { args } => {
                let result = fshr(8, v(args[0]).as_u8() as u64, v(args[1]).as_u8() as u64, v(args[2]).as_u8() as u64);
                ok(InstrValue::from_u8(result as u8))
            }
            I::FshrU16 { args } => {
                let result = fshr(16, v(args[0]).as_u16() as u64, v(args[1]).as_u16() as u64, v(args[2]).as_u16() as u64);
                ok(InstrValue::from_u16(result as u16))
            }
            I::FshrU32 { args } => {
                let result = fshr(32, v(args[0]).as_u32() as u64, v(args[1]).as_u32() as u64, v(args[2]).as_u32() as u64);
                ok(InstrValue::from_u32(result as u32))
            }
            I::FshrU64 { args } => {
                let result = fshr(64, v(args[0]).as_u64(), v(args[1]).as_u64(), v(args[2]).as_u64());
                ok(InstrValue::from_u64(result))
            }

            ////////// address computation //////////
            I::ConstGep { args, offset } => {
                let base = v(args[0]).as_ptr();
                ok(InstrValue::from_ptr(base.wrapping_add(offset)))
            }
            I::ArrayGepI32 { args, stride } => {
                let base = v(args[0]).as_ptr();
                let index = v(args[1]).as_u32() as i32 as i64;
                let address = (base as i128 + index as i128 * stride as i128) as u64;
                ok(InstrValue::from_ptr(address))
            }
            I::ArrayGepI64 { args, stride } => {
                let base = v(args[0]).as_ptr();
                let index = v(args[1]).as_u64() as i64;
                let address = (base as i128 + index as i128 * stride as i128) as u64;
                ok(InstrValue::from_ptr(address))
            }

            ////////// bulk memory //////////
            I::ConstMemcpy { args, size } => {
                let dest = Ptr(v(args[0]).as_ptr());
                let src_ptr = Ptr(v(args[1]).as_ptr());
                if let Err(error) = self.memory.memcpy(dest, src_ptr, size) {
                    return Err(self.report_memory_error(SrcSpan::synthetic(), error));
                }
                none()
            }
            I::ConstMemsetZero { args, size } => {
                let dest = Ptr(v(args[0]).as_ptr());
                if let Err(error) = self.memory.memset_zero(dest, size) {
                    return Err(self.report_memory_error(SrcSpan::synthetic(), error));
                }
                none()
            }

            ////////// lifetimes //////////
            I::StartLifetime { args, .. } => {
                let ptr = Ptr(v(args[0]).as_ptr());
                if let Err(error) = self.memory.start_lifetime(ptr) {
                    return Err(self.report_memory_error(SrcSpan::synthetic(), error));
                }
                none()
            }
            I::EndLifetime { args, .. } => {
                let ptr = Ptr(v(args[0]).as_ptr());
                if let Err(error) = self.memory.end_lifetime(ptr) {
                    return Err(self.report_memory_error(SrcSpan::synthetic(), error));
                }
                none()
            }

            ////////// heap //////////
            I::Malloc { args, src, elem_type } => {
                let count = v(args[0]).as_u64();
                let span = self.span_of(func, src);
                match self.memory.malloc(elem_type, count, span) {
                    Ok(ptr) => ok(InstrValue::from_ptr(ptr.addr())),
                    Err(error) => Err(self.report_memory_error(span, error)),
                }
            }
            I::Free { args, src } => {
                let ptr = Ptr(v(args[0]).as_ptr());
                let span = self.span_of(func, src);
                if let Err(error) = self.memory.free(ptr, span) {
                    return Err(self.report_memory_error(span, error));
                }
                none()
            }

            ////////// calls and control flow //////////
            I::FunctionCall {
                func: callee,
                args_index,
                ..
            } => {
                let call_args: Vec<InstrValue> = func.call_args[args_index]
                    .iter()
                    .map(|&arg| v(arg))
                    .collect();
                let functions = self.functions;
                let callee = &functions[callee];
                let result = self.execute_function(callee, &call_args)?;
                ok(result)
            }
            I::Jump { dest, .. } => {
                *next = dest.as_usize();
                none()
            }
            I::ConditionalJump {
                args,
                true_dest,
                false_dest,
            } => {
                *next = if v(args[0]).as_i1() {
                    true_dest.as_usize()
                } else {
                    false_dest.as_usize()
                };
                none()
            }
            I::SwitchI8 { args, info } => {
                let value = v(args[0]).as_u8() as u64;
                *next = switch_dest(&func.switch_infos[info], value);
                none()
            }
            I::SwitchI16 { args, info } => {
                let value = v(args[0]).as_u16() as u64;
                *next = switch_dest(&func.switch_infos[info], value);
                none()
            }
            I::SwitchI32 { args, info } => {
                let value = v(args[0]).as_u32() as u64;
                *next = switch_dest(&func.switch_infos[info], value);
                none()
            }
            I::SwitchI64 { args, info } => {
                let value = v(args[0]).as_u64();
                *next = switch_dest(&func.switch_infos[info], value);
                none()
            }
            I::Ret { args } => Ok(StepResult::Return(v(args[0]))),
            I::RetVoid { .. } => Ok(StepResult::Return(InstrValue::NONE)),
            I::Unreachable { .. } => {
                // Reaching this is a codegen bug, not a user error.
                panic!("unreachable instruction executed in `{}`", func.name);
            }

            ////////// diagnostics and checks //////////
            I::Error { error, .. } => {
                let info = &func.errors[error];
                Err(self.report_error(info.span, info.message.clone()))
            }
            I::DiagnosticStr { args, src, kind } => {
                let span = self.span_of(func, src);
                let message = self.read_str(span, v(args[0]).as_ptr(), v(args[1]).as_ptr())?;
                match kind {
                    Some(kind) => {
                        self.report_warning(kind, span, message);
                        none()
                    }
                    None => Err(self.report_error(span, message)),
                }
            }
            I::ArrayBoundsCheckI32 { args, src } => {
                let index = v(args[0]).as_u32() as i32 as i64;
                let size = v(args[1]).as_u32() as i32 as i64;
                self.bounds_check(func, src, index, size as u64, index < 0)?;
                none()
            }
            I::ArrayBoundsCheckU32 { args, src } => {
                let index = v(args[0]).as_u32() as i64;
                let size = v(args[1]).as_u32() as u64;
                self.bounds_check(func, src, index, size, false)?;
                none()
            }
            I::ArrayBoundsCheckI64 { args, src } => {
                let index = v(args[0]).as_u64() as i64;
                let size = v(args[1]).as_u64();
                self.bounds_check(func, src, index, size, index < 0)?;
                none()
            }
            I::ArrayBoundsCheckU64 { args, src } => {
                let index = v(args[0]).as_u64();
                let size = v(args[1]).as_u64();
                if index >= size {
                    let span = self.span_of(func, src);
                    return Err(self.report_error(
                        span,
                        format!("out-of-bounds access: index {}, size {}", index, size),
                    ));
                }
                none()
            }
            I::OptionalGetValueCheck { args, src } => {
                if !v(args[0]).as_i1() {
                    let span = self.span_of(func, src);
                    return Err(
                        self.report_error(span, "getting the value of an empty optional".to_string())
                    );
                }
                none()
            }
            I::StrConstructionCheck { args, src } => {
                let begin = Ptr(v(args[0]).as_ptr());
                let end = Ptr(v(args[1]).as_ptr());
                if let Err(error) = self.memory.check_str_construction(begin, end) {
                    let span = self.span_of(func, src);
                    return Err(self.report_memory_error(span, error));
                }
                none()
            }
            I::SliceConstructionCheck { args, src, info } => {
                let begin = Ptr(v(args[0]).as_ptr());
                let end = Ptr(v(args[1]).as_ptr());
                let elem = func.slice_check_infos[info].elem_type;
                if let Err(error) = self.memory.check_slice_construction(begin, end, elem) {
                    let span = self.span_of(func, src);
                    return Err(self.report_memory_error(span, error));
                }
                none()
            }
            I::MemoryAccessCheck { args, src, info } => {
                let ptr = Ptr(v(args[0]).as_ptr());
                let object = func.access_check_infos[info].object_type;
                if let Err(error) = self.memory.check_dereference(ptr, object) {
                    let span = self.span_of(func, src);
                    return Err(self.report_memory_error(span, error));
                }
                none()
            }
        }
    }

    ////////// check helpers //////////

    fn int_overflow_warning(&mut self, func: &Function, src: SpanIdx, overflow: bool) {
        if overflow {
            let span = self.span_of(func, src);
            self.report_warning(WarningKind::IntOverflow, span, "integer overflow".to_string());
        }
    }

    fn float_overflow_warning(
        &mut self,
        func: &Function,
        src: SpanIdx,
        result_finite: bool,
        operands_finite: bool,
    ) {
        if !result_finite && operands_finite {
            let span = self.span_of(func, src);
            self.report_warning(
                WarningKind::FloatOverflow,
                span,
                "floating-point overflow".to_string(),
            );
        }
    }

    fn math_domain_warning_f32(&mut self, func: &Function, src: SpanIdx, input: f32, result: f32) {
        if result.is_nan() && !input.is_nan() {
            let span = self.span_of(func, src);
            self.report_warning(
                WarningKind::MathDomainError,
                span,
                "math domain error".to_string(),
            );
        }
    }

    fn math_domain_warning_f64(&mut self, func: &Function, src: SpanIdx, input: f64, result: f64) {
        if result.is_nan() && !input.is_nan() {
            let span = self.span_of(func, src);
            self.report_warning(
                WarningKind::MathDomainError,
                span,
                "math domain error".to_string(),
            );
        }
    }

    fn signed_div_check(
        &mut self,
        func: &Function,
        src: SpanIdx,
        divisor_is_zero: bool,
        overflows: bool,
    ) -> ExecResult<()> {
        if divisor_is_zero {
            let span = self.span_of(func, src);
            return Err(self.report_error(span, "division by zero".to_string()));
        }
        if overflows {
            let span = self.span_of(func, src);
            return Err(self.report_error(span, "overflow in division".to_string()));
        }
        Ok(())
    }

    fn bounds_check(
        &mut self,
        func: &Function,
        src: SpanIdx,
        index: i64,
        size: u64,
        is_negative: bool,
    ) -> ExecResult<()> {
        if is_negative || index as u64 >= size {
            let span = self.span_of(func, src);
            return Err(self.report_error(
                span,
                format!("out-of-bounds access: index {}, size {}", index, size),
            ));
        }
        Ok(())
    }

    fn shift_amount(
        &mut self,
        func: &Function,
        src: SpanIdx,
        inst: Instruction,
        amount: u64,
        width: u32,
    ) -> ExecResult<Option<u32>> {
        let signed_amount = matches!(
            inst,
            Instruction::ShlI8Signed { .. }
                | Instruction::ShlI16Signed { .. }
                | Instruction::ShlI32Signed { .. }
                | Instruction::ShlI64Signed { .. }
                | Instruction::ShrI8Signed { .. }
                | Instruction::ShrI16Signed { .. }
                | Instruction::ShrI32Signed { .. }
                | Instruction::ShrI64Signed { .. }
        );
        let masked = amount & (width_mask(width));
        let out_of_range = if signed_amount {
            let value = sign_extend_to_i64(amount, width);
            value < 0 || value >= width as i64
        } else {
            masked >= width as u64 || amount > width_mask(width)
        };
        if out_of_range {
            let span = self.span_of(func, src);
            // The shift still produces zero, but that value can never be
            // observed since the evaluation aborts here.
            return Err(self.report_error(
                span,
                format!("shift amount is out of range for a {}-bit operand", width),
            ));
        }
        Ok(Some(masked as u32))
    }

    fn ptr_arith(
        &mut self,
        func: &Function,
        src: SpanIdx,
        inst: Instruction,
        ptr: InstrValue,
        offset: i64,
    ) -> ExecResult<StepResult> {
        let elem = match inst {
            Instruction::AddPtrI32 { check, .. }
            | Instruction::AddPtrU32 { check, .. }
            | Instruction::AddPtrI64 { check, .. }
            | Instruction::AddPtrU64 { check, .. }
            | Instruction::SubPtrI32 { check, .. }
            | Instruction::SubPtrU32 { check, .. }
            | Instruction::SubPtrI64 { check, .. }
            | Instruction::SubPtrU64 { check, .. } => func.ptr_arith_check_infos[check].object_type,
            _ => unreachable!("ptr_arith on a non-pointer-arithmetic instruction"),
        };
        match self.memory.ptr_arithmetic(Ptr(ptr.as_ptr()), offset, elem) {
            Ok(result) => Ok(StepResult::Value(InstrValue::from_ptr(result.addr()))),
            Err(error) => {
                let span = self.span_of(func, src);
                Err(self.report_memory_error(span, error))
            }
        }
    }

    fn compare_ptrs(
        &mut self,
        func: &Function,
        src: SpanIdx,
        lhs: InstrValue,
        rhs: InstrValue,
    ) -> ExecResult<std::cmp::Ordering> {
        match self.memory.compare_ptrs(Ptr(lhs.as_ptr()), Ptr(rhs.as_ptr())) {
            Ok(ordering) => Ok(ordering),
            Err(error) => {
                let span = self.span_of(func, src);
                Err(self.report_memory_error(span, error))
            }
        }
    }

    fn ptr_diff(
        &mut self,
        func: &Function,
        src: SpanIdx,
        lhs: InstrValue,
        rhs: InstrValue,
        stride: u64,
    ) -> ExecResult<i64> {
        match self.memory.ptr_diff(Ptr(lhs.as_ptr()), Ptr(rhs.as_ptr()), stride) {
            Ok(diff) => Ok(diff),
            Err(error) => {
                let span = self.span_of(func, src);
                Err(self.report_memory_error(span, error))
            }
        }
    }
}

enum StepResult {
    Value(InstrValue),
    Return(InstrValue),
}

fn width_mask(width: u32) -> u64 {
    if width == 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn sign_extend_to_i64(value: u64, width: u32) -> i64 {
    match width {
        8 => value as u8 as i8 as i64,
        16 => value as u16 as i16 as i64,
        32 => value as u32 as i32 as i64,
        _ => value as i64,
    }
}

/// Funnel shift left over a `width`-bit domain.
fn fshl(width: u32, a: u64, b: u64, amount: u64) -> u64 {
    let mask = width_mask(width);
    let amount = amount % width as u64;
    if amount == 0 {
        a & mask
    } else {
        ((a << amount) | ((b & mask) >> (width as u64 - amount))) & mask
    }
}

/// Funnel shift right over a `width`-bit domain.
fn fshr(width: u32, a: u64, b: u64, amount: u64) -> u64 {
    let mask = width_mask(width);
    let amount = amount % width as u64;
    if amount == 0 {
        b & mask
    } else {
        (((b & mask) >> amount) | (a << (width as u64 - amount))) & mask
    }
}

fn switch_dest(info: &orec_ir::function::SwitchInfo, value: u64) -> usize {
    match info.values.binary_search_by_key(&value, |&(v, _)| v) {
        Ok(index) => info.values[index].1.as_usize(),
        Err(_) => info.default_dest.as_usize(),
    }
}

fn math_unary_f32(inst: Instruction, x: f32) -> f32 {
    use Instruction as I;
    match inst {
        I::ExpF32Check { .. } => x.exp(),
        I::Exp2F32Check { .. } => x.exp2(),
        I::Expm1F32Check { .. } => x.exp_m1(),
        I::LogF32Check { .. } => x.ln(),
        I::Log10F32Check { .. } => x.log10(),
        I::Log2F32Check { .. } => x.log2(),
        I::Log1pF32Check { .. } => x.ln_1p(),
        I::SqrtF32Check { .. } => x.sqrt(),
        I::CbrtF32Check { .. } => x.cbrt(),
        I::SinF32Check { .. } => x.sin(),
        I::CosF32Check { .. } => x.cos(),
        I::TanF32Check { .. } => x.tan(),
        I::AsinF32Check { .. } => x.asin(),
        I::AcosF32Check { .. } => x.acos(),
        I::AtanF32Check { .. } => x.atan(),
        I::SinhF32Check { .. } => x.sinh(),
        I::CoshF32Check { .. } => x.cosh(),
        I::TanhF32Check { .. } => x.tanh(),
        I::AsinhF32Check { .. } => x.asinh(),
        I::AcoshF32Check { .. } => x.acosh(),
        I::AtanhF32Check { .. } => x.atanh(),
        I::ErfF32Check { .. } => libm::erff(x),
        I::ErfcF32Check { .. } => libm::erfcf(x),
        I::TgammaF32Check { .. } => libm::tgammaf(x),
        I::LgammaF32Check { .. } => libm::lgammaf_r(x).0,
        _ => unreachable!("not an f32 math check"),
    }
}

fn math_unary_f64(inst: Instruction, x: f64) -> f64 {
    use Instruction as I;
    match inst {
        I::ExpF64Check { .. } => x.exp(),
        I::Exp2F64Check { .. } => x.exp2(),
        I::Expm1F64Check { .. } => x.exp_m1(),
        I::LogF64Check { .. } => x.ln(),
        I::Log10F64Check { .. } => x.log10(),
        I::Log2F64Check { .. } => x.log2(),
        I::Log1pF64Check { .. } => x.ln_1p(),
        I::SqrtF64Check { .. } => x.sqrt(),
        I::CbrtF64Check { .. } => x.cbrt(),
        I::SinF64Check { .. } => x.sin(),
        I::CosF64Check { .. } => x.cos(),
        I::TanF64Check { .. } => x.tan(),
        I::AsinF64Check { .. } => x.asin(),
        I::AcosF64Check { .. } => x.acos(),
        I::AtanF64Check { .. } => x.atan(),
        I::SinhF64Check { .. } => x.sinh(),
        I::CoshF64Check { .. } => x.cosh(),
        I::TanhF64Check { .. } => x.tanh(),
        I::AsinhF64Check { .. } => x.asinh(),
        I::AcoshF64Check { .. } => x.acosh(),
        I::AtanhF64Check { .. } => x.atanh(),
        I::ErfF64Check { .. } => libm::erf(x),
        I::ErfcF64Check { .. } => libm::erfc(x),
        I::TgammaF64Check { .. } => libm::tgamma(x),
        I::LgammaF64Check { .. } => libm::lgamma_r(x).0,
        _ => unreachable!("not an f64 math check"),
    }
}

fn math_binary_f32(inst: Instruction, x: f32, y: f32) -> f32 {
    use Instruction as I;
    match inst {
        I::PowF32Check { .. } => x.powf(y),
        I::Atan2F32Check { .. } => x.atan2(y),
        I::HypotF32Check { .. } => x.hypot(y),
        _ => unreachable!("not an f32 binary math check"),
    }
}

fn math_binary_f64(inst: Instruction, x: f64, y: f64) -> f64 {
    use Instruction as I;
    match inst {
        I::PowF64Check { .. } => x.powf(y),
        I::Atan2F64Check { .. } => x.atan2(y),
        I::HypotF64Check { .. } => x.hypot(y),
        _ => unreachable!("not an f64 binary math check"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orec_ir::function::InstIdx;
    use orec_ir::function::SwitchInfo;

    #[test]
    fn funnel_shifts() {
        // fshl over 8 bits: (a:b) rotated left by the amount.
        assert_eq!(fshl(8, 0b1000_0001, 0b1111_0000, 1), 0b0000_0011);
        assert_eq!(fshl(8, 0xab, 0xcd, 0), 0xab);
        assert_eq!(fshl(8, 0xab, 0xcd, 8), 0xab);
        assert_eq!(fshr(8, 0b0000_0011, 0b1000_0000, 1), 0b1100_0000);
        assert_eq!(fshr(8, 0xab, 0xcd, 0), 0xcd);
        assert_eq!(fshl(64, 1, u64::MAX, 1), 0b11);
    }

    #[test]
    fn width_masks_and_sign_extension() {
        assert_eq!(width_mask(8), 0xff);
        assert_eq!(width_mask(64), u64::MAX);
        assert_eq!(sign_extend_to_i64(0xff, 8), -1);
        assert_eq!(sign_extend_to_i64(0x7f, 8), 127);
        assert_eq!(sign_extend_to_i64(0xffff_fffe, 32), -2);
    }

    #[test]
    fn switch_search_hits_and_defaults() {
        let info = SwitchInfo {
            values: vec![
                (1, InstIdx::from_u32(10)),
                (4, InstIdx::from_u32(20)),
                (9, InstIdx::from_u32(30)),
            ],
            default_dest: InstIdx::from_u32(99),
        };
        assert_eq!(switch_dest(&info, 4), 20);
        assert_eq!(switch_dest(&info, 9), 30);
        assert_eq!(switch_dest(&info, 2), 99);
        assert_eq!(switch_dest(&info, u64::MAX), 99);
    }
}
