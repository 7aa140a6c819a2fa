//! The codegen context and per-function builder state.
//!
//! The context owns the compilation-wide pieces (type set, global memory,
//! function arena, warning configuration); the builder accumulates one
//! function's basic blocks, allocas, side tables and unresolved references
//! until finalization rewrites everything into flat indices.

use orec_abi::target::TargetLayout;
use orec_ast::{Ast, BodyId, TypeSpec, VarId};
use orec_ir::function::{
    AccessCheckIdx, AccessCheckInfo, AllocaDecl, BasicBlockData, CallArgsIdx, ErrorIdx, ErrorInfo,
    FuncIdx, Function, InstIdx, PtrArithCheckIdx, PtrArithCheckInfo, SliceCheckIdx, SliceCheckInfo,
    SpanIdx, SwitchInfo, ValueIdx,
};
use orec_ir::inst::Instruction;
use orec_ir::ty::{BuiltinKind, TypeIdx, TypeSet};
use orec_memory::{GlobalMemory, SegmentInfo};
use orec_session::{SrcSpan, WarningConfig};
use orec_utils::index_vec::IdxVec;
use orec_utils::newtype_index;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

newtype_index!(
    /// A basic block during construction.
    pub struct BlockRef
);

/// A (block, in-block index) pair identifying an instruction during
/// construction. The sentinel block marks an alloca slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstrRef {
    pub block: u32,
    pub index: u32,
}

impl InstrRef {
    pub const ALLOCA_BLOCK: u32 = u32::MAX;

    pub const fn alloca(index: u32) -> InstrRef {
        InstrRef {
            block: Self::ALLOCA_BLOCK,
            index,
        }
    }

    pub const fn is_alloca(&self) -> bool {
        self.block == Self::ALLOCA_BLOCK
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExprValueKind {
    None,
    Reference,
    Value,
}

/// What an expression lowered to: a value in an instruction slot, a
/// reference (an lvalue address), or nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExprValue {
    value: InstrRef,
    kind: ExprValueKind,
    ty: Option<TypeIdx>,
}

impl ExprValue {
    pub fn none() -> ExprValue {
        ExprValue {
            value: InstrRef { block: 0, index: 0 },
            kind: ExprValueKind::None,
            ty: None,
        }
    }

    pub fn new_value(value: InstrRef, ty: TypeIdx) -> ExprValue {
        ExprValue {
            value,
            kind: ExprValueKind::Value,
            ty: Some(ty),
        }
    }

    pub fn new_reference(value: InstrRef, ty: TypeIdx) -> ExprValue {
        ExprValue {
            value,
            kind: ExprValueKind::Reference,
            ty: Some(ty),
        }
    }

    pub fn is_none(&self) -> bool {
        self.kind == ExprValueKind::None
    }

    pub fn is_value(&self) -> bool {
        self.kind == ExprValueKind::Value
    }

    pub fn is_reference(&self) -> bool {
        self.kind == ExprValueKind::Reference
    }

    /// The instruction producing the reference address.
    pub fn get_reference(&self) -> InstrRef {
        debug_assert!(self.is_reference());
        self.value
    }

    pub fn instr(&self) -> InstrRef {
        debug_assert!(!self.is_none());
        self.value
    }

    pub fn ty(&self) -> TypeIdx {
        self.ty.expect("expr value has no type")
    }
}

/// A deferred cleanup action registered on the destruction stack.
#[derive(Debug, Clone)]
pub enum DestructOp {
    /// Runs `destructor(&value)`; skipped when the move-destruct indicator
    /// (if any) is false.
    Variable {
        destructor: Option<BodyId>,
        value: ExprValue,
        condition: Option<InstrRef>,
    },
    /// Unconditional destructor call on a temporary.
    SelfDestruct {
        destructor: BodyId,
        value: ExprValue,
    },
    /// Partial-construction cleanup for rvalue arrays: destroys elements
    /// from the array's begin up to the pointer stored in `elem_ptr`.
    RvalueArray {
        destructor: BodyId,
        value: ExprValue,
        elem_ptr: InstrRef,
    },
    /// A `defer`red expression, evaluated at scope exit.
    DeferExpr { expr: orec_ast::Expr },
}

/// Marks capturing the state of the two cleanup stacks at scope entry.
#[derive(Debug, Clone, Copy)]
pub struct ScopeInfo {
    pub destruct_mark: usize,
    pub lifetime_mark: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct LoopInfo {
    pub break_block: BlockRef,
    pub continue_block: BlockRef,
    pub destruct_mark: usize,
    pub lifetime_mark: usize,
    pub in_loop: bool,
}

impl Default for LoopInfo {
    fn default() -> Self {
        LoopInfo {
            break_block: BlockRef::from_u32(0),
            continue_block: BlockRef::from_u32(0),
            destruct_mark: 0,
            lifetime_mark: 0,
            in_loop: false,
        }
    }
}

struct UnresolvedInstruction {
    inst: InstrRef,
    args: [Option<InstrRef>; 3],
}

struct UnresolvedJump {
    inst: InstrRef,
    dests: [BlockRef; 2],
}

struct UnresolvedSwitch {
    inst: InstrRef,
    values: Vec<(u64, BlockRef)>,
    default_dest: BlockRef,
}

/// Construction state of the function currently being generated.
pub struct FunctionBuilder {
    pub body_id: BodyId,
    pub name: String,
    pub arg_types: Vec<TypeIdx>,
    pub return_type: TypeIdx,
    /// Whether the function returns a non-scalar and receives a hidden
    /// return-slot pointer as its first argument.
    pub needs_return_slot: bool,

    pub blocks: IdxVec<BlockRef, BasicBlockData>,
    pub current_block: BlockRef,
    pub global_init_block: BlockRef,
    pub entry_block: BlockRef,

    pub allocas: Vec<AllocaDecl>,
    pub return_address: Option<ExprValue>,

    unresolved_instructions: Vec<UnresolvedInstruction>,
    unresolved_jumps: Vec<UnresolvedJump>,
    unresolved_switches: Vec<UnresolvedSwitch>,

    pub spans: IdxVec<SpanIdx, SrcSpan>,
    pub errors: IdxVec<ErrorIdx, ErrorInfo>,
    pub call_args: IdxVec<CallArgsIdx, Vec<InstrRef>>,
    pub switch_count: usize,
    pub slice_check_infos: IdxVec<SliceCheckIdx, SliceCheckInfo>,
    pub ptr_arith_check_infos: IdxVec<PtrArithCheckIdx, PtrArithCheckInfo>,
    pub access_check_infos: IdxVec<AccessCheckIdx, AccessCheckInfo>,

    pub destructor_calls: Vec<DestructOp>,
    pub lifetimes: Vec<ExprValue>,
    pub variables: FxHashMap<VarId, ExprValue>,
    pub move_indicators: FxHashMap<VarId, InstrRef>,
    pub loop_info: LoopInfo,
}

/// Everything shared across one compilation.
pub struct CodegenCtx<'a> {
    pub machine: TargetLayout,
    pub type_set: TypeSet,
    pub global_memory: GlobalMemory,
    pub warnings: WarningConfig,
    pub ast: &'a Ast,

    functions: IdxVec<FuncIdx, Option<Function>>,
    function_ids: FxHashMap<BodyId, FuncIdx>,

    pub(crate) current: Option<FunctionBuilder>,
}

impl<'a> CodegenCtx<'a> {
    pub fn new(machine: TargetLayout, warnings: WarningConfig, ast: &'a Ast) -> Self {
        let segments = SegmentInfo::for_target(&machine);
        CodegenCtx {
            machine,
            type_set: TypeSet::new(machine),
            global_memory: GlobalMemory::new(segments.global_begin, segments.stack_begin),
            warnings,
            ast,
            functions: IdxVec::new(),
            function_ids: FxHashMap::default(),
            current: None,
        }
    }

    pub fn is_little_endian(&self) -> bool {
        self.machine.is_little_endian()
    }

    pub fn is_64_bit(&self) -> bool {
        self.machine.is_64_bit()
    }

    ////////// type lowering //////////

    /// Maps a resolved source type onto its object-layout descriptor.
    pub fn lower_type(&mut self, ty: &TypeSpec) -> TypeIdx {
        match ty {
            TypeSpec::Unit => self.type_set.null_type(),
            TypeSpec::Bool => self.type_set.builtin_type(BuiltinKind::I1),
            TypeSpec::Int(kind) => {
                let builtin = match kind.bit_width() {
                    8 => BuiltinKind::I8,
                    16 => BuiltinKind::I16,
                    32 => BuiltinKind::I32,
                    _ => BuiltinKind::I64,
                };
                self.type_set.builtin_type(builtin)
            }
            TypeSpec::Float(orec_ast::FloatKind::F32) => self.type_set.builtin_type(BuiltinKind::F32),
            TypeSpec::Float(orec_ast::FloatKind::F64) => self.type_set.builtin_type(BuiltinKind::F64),
            TypeSpec::Char => self.type_set.builtin_type(BuiltinKind::I32),
            TypeSpec::Str => self.type_set.str_type(),
            TypeSpec::Pointer(_) => self.type_set.pointer_type(),
            // Pointer-like optionals are a nullable pointer; everything
            // else gets a flag member.
            TypeSpec::Optional(payload) if payload.is_pointer() => self.type_set.pointer_type(),
            TypeSpec::Optional(payload) => {
                let payload = self.lower_type(payload);
                self.type_set.optional_type(payload)
            }
            TypeSpec::Array(len, elem) => {
                let elem = self.lower_type(elem);
                self.type_set.array_type(elem, *len)
            }
            TypeSpec::Slice(_) => self.type_set.slice_type(),
            TypeSpec::Tuple(members) => {
                let members: Vec<TypeIdx> =
                    members.iter().map(|member| self.lower_type(member)).collect();
                self.type_set.aggregate_type(&members)
            }
            TypeSpec::Enum { underlying } => {
                self.lower_type(&TypeSpec::Int(*underlying))
            }
        }
    }

    ////////// function arena //////////

    pub fn function_for(&self, body_id: BodyId) -> Option<FuncIdx> {
        self.function_ids.get(&body_id).copied()
    }

    pub fn function(&self, func_idx: FuncIdx) -> &Function {
        self.functions[func_idx]
            .as_ref()
            .expect("function is still being generated")
    }

    pub fn into_functions(self) -> (TypeSet, GlobalMemory, IdxVec<FuncIdx, Function>) {
        let functions = self
            .functions
            .into_iter()
            .map(|function| function.expect("unfinalized function at end of codegen"))
            .collect();
        (self.type_set, self.global_memory, functions)
    }

    /// Reserves a function index and records the lowered signature. The
    /// body is filled in by `end_function`.
    pub fn declare_function(&mut self, body_id: BodyId) -> FuncIdx {
        debug_assert!(!self.function_ids.contains_key(&body_id));
        let func_idx = self.functions.push(None);
        self.function_ids.insert(body_id, func_idx);
        func_idx
    }

    /// Starts building `body_id`, returning the previously active builder
    /// (if a callee is generated in the middle of another function).
    pub fn begin_function(&mut self, body_id: BodyId, func_idx: FuncIdx) -> Option<FunctionBuilder> {
        let body = &self.ast.bodies[body_id];
        let name = body.name.clone();
        let return_type_spec = body.return_type.clone();
        let param_types: Vec<TypeSpec> = body.params.iter().map(|p| p.ty.clone()).collect();

        let return_type = self.lower_type(&return_type_spec);
        let needs_return_slot = !self.type_set.is_simple_value_type(return_type)
            && return_type != self.type_set.null_type();

        let mut arg_types = Vec::new();
        if needs_return_slot {
            arg_types.push(self.type_set.pointer_type());
        }
        for param in &param_types {
            let lowered = self.lower_type(param);
            if self.type_set.is_simple_value_type(lowered) {
                arg_types.push(lowered);
            } else {
                // Aggregates are passed by pointer to a caller-owned copy.
                arg_types.push(self.type_set.pointer_type());
            }
        }

        let mut builder = FunctionBuilder {
            body_id,
            name,
            arg_types,
            return_type,
            needs_return_slot,
            blocks: IdxVec::new(),
            current_block: BlockRef::from_u32(0),
            global_init_block: BlockRef::from_u32(0),
            entry_block: BlockRef::from_u32(0),
            allocas: Vec::new(),
            return_address: None,
            unresolved_instructions: Vec::new(),
            unresolved_jumps: Vec::new(),
            unresolved_switches: Vec::new(),
            spans: IdxVec::new(),
            errors: IdxVec::new(),
            call_args: IdxVec::new(),
            switch_count: 0,
            slice_check_infos: IdxVec::new(),
            ptr_arith_check_infos: IdxVec::new(),
            access_check_infos: IdxVec::new(),
            destructor_calls: Vec::new(),
            lifetimes: Vec::new(),
            variables: FxHashMap::default(),
            move_indicators: FxHashMap::default(),
            loop_info: LoopInfo::default(),
        };
        builder.global_init_block = builder.blocks.push(BasicBlockData::default());
        builder.entry_block = builder.blocks.push(BasicBlockData::default());
        builder.current_block = builder.entry_block;

        debug!(func = ?func_idx, name = %builder.name, "begin function");
        let previous = self.current.replace(builder);

        if self.fb().needs_return_slot {
            let return_address = self.create_get_function_return_address();
            self.fb_mut().return_address = Some(return_address);
        }
        previous
    }

    /// Finalizes the current builder into the arena and restores the
    /// enclosing builder.
    pub fn end_function(&mut self, previous: Option<FunctionBuilder>, func_idx: FuncIdx) {
        // The synthetic first block runs consteval-global initialization
        // and falls through to the body.
        let entry = self.fb().entry_block;
        let global_init = self.fb().global_init_block;
        let saved = self.fb().current_block;
        self.set_current_block(global_init);
        self.create_jump(entry);
        self.set_current_block(saved);

        let builder = self.current.take().expect("end_function without builder");
        let function = builder.finalize();
        debug!(func = ?func_idx, instructions = function.instructions.len(), "function finalized");
        trace!("\n{}", function.display());
        self.functions[func_idx] = Some(function);
        self.current = previous;
    }

    ////////// builder access //////////

    pub(crate) fn fb(&self) -> &FunctionBuilder {
        self.current.as_ref().expect("no function is being built")
    }

    pub(crate) fn fb_mut(&mut self) -> &mut FunctionBuilder {
        self.current.as_mut().expect("no function is being built")
    }

    ////////// control flow structure //////////

    pub fn current_block(&self) -> BlockRef {
        self.fb().current_block
    }

    pub fn add_basic_block(&mut self) -> BlockRef {
        self.fb_mut().blocks.push(BasicBlockData::default())
    }

    pub fn set_current_block(&mut self, block: BlockRef) {
        self.fb_mut().current_block = block;
    }

    pub fn has_terminator(&self) -> bool {
        let builder = self.fb();
        builder.blocks[builder.current_block].has_terminator()
    }

    ////////// instruction insertion //////////

    fn push_instruction(&mut self, inst: Instruction) -> InstrRef {
        if self.has_terminator() {
            let block = self.add_basic_block();
            self.set_current_block(block);
        }
        let builder = self.fb_mut();
        let block = builder.current_block;
        let instructions = &mut builder.blocks[block].instructions;
        instructions.push(inst);
        InstrRef {
            block: block.as_u32(),
            index: (instructions.len() - 1) as u32,
        }
    }

    pub(crate) fn add_inst(&mut self, inst: Instruction) -> InstrRef {
        debug_assert_eq!(inst.args().len(), 0);
        self.push_instruction(inst)
    }

    pub(crate) fn add_inst1(&mut self, inst: Instruction, arg: InstrRef) -> InstrRef {
        debug_assert_eq!(inst.args().len(), 1);
        let result = self.push_instruction(inst);
        self.fb_mut()
            .unresolved_instructions
            .push(UnresolvedInstruction {
                inst: result,
                args: [Some(arg), None, None],
            });
        result
    }

    pub(crate) fn add_inst2(&mut self, inst: Instruction, arg1: InstrRef, arg2: InstrRef) -> InstrRef {
        debug_assert_eq!(inst.args().len(), 2);
        let result = self.push_instruction(inst);
        self.fb_mut()
            .unresolved_instructions
            .push(UnresolvedInstruction {
                inst: result,
                args: [Some(arg1), Some(arg2), None],
            });
        result
    }

    pub(crate) fn add_inst3(
        &mut self,
        inst: Instruction,
        arg1: InstrRef,
        arg2: InstrRef,
        arg3: InstrRef,
    ) -> InstrRef {
        debug_assert_eq!(inst.args().len(), 3);
        let result = self.push_instruction(inst);
        self.fb_mut()
            .unresolved_instructions
            .push(UnresolvedInstruction {
                inst: result,
                args: [Some(arg1), Some(arg2), Some(arg3)],
            });
        result
    }

    pub(crate) fn add_unresolved_jump(&mut self, inst: InstrRef, dests: [BlockRef; 2]) {
        self.fb_mut()
            .unresolved_jumps
            .push(UnresolvedJump { inst, dests });
    }

    pub(crate) fn add_unresolved_switch(
        &mut self,
        inst: InstrRef,
        values: Vec<(u64, BlockRef)>,
        default_dest: BlockRef,
    ) {
        self.fb_mut().unresolved_switches.push(UnresolvedSwitch {
            inst,
            values,
            default_dest,
        });
    }

    ////////// side tables //////////

    pub fn add_span(&mut self, span: SrcSpan) -> SpanIdx {
        self.fb_mut().spans.push(span)
    }

    pub fn add_error_info(&mut self, span: SrcSpan, message: String) -> ErrorIdx {
        self.fb_mut().errors.push(ErrorInfo { span, message })
    }

    pub fn add_slice_check_info(&mut self, info: SliceCheckInfo) -> SliceCheckIdx {
        self.fb_mut().slice_check_infos.push(info)
    }

    pub fn add_ptr_arith_check_info(&mut self, info: PtrArithCheckInfo) -> PtrArithCheckIdx {
        self.fb_mut().ptr_arith_check_infos.push(info)
    }

    pub fn add_access_check_info(&mut self, info: AccessCheckInfo) -> AccessCheckIdx {
        self.fb_mut().access_check_infos.push(info)
    }

    ////////// variables //////////

    pub fn add_variable(&mut self, id: VarId, value: ExprValue) {
        let previous = self.fb_mut().variables.insert(id, value);
        debug_assert!(previous.is_none(), "variable bound twice");
    }

    pub fn get_variable(&self, id: VarId) -> ExprValue {
        *self.fb().variables.get(&id).expect("unresolved variable")
    }

    /// Allocates the `i1` move-destruct indicator for a variable and
    /// initializes it to true.
    pub fn add_move_destruct_indicator(&mut self, id: VarId) -> InstrRef {
        let i1 = self.type_set.builtin_type(BuiltinKind::I1);
        let indicator = self.create_alloca_without_lifetime(i1);
        let indicator_ref = indicator.get_reference();
        self.fb_mut().move_indicators.insert(id, indicator_ref);
        let true_value = self.create_const_i1(true);
        self.create_store(true_value, indicator);
        indicator_ref
    }

    pub fn get_move_destruct_indicator(&self, id: VarId) -> Option<InstrRef> {
        self.fb().move_indicators.get(&id).copied()
    }

    ////////// scopes and destruction //////////

    #[must_use]
    pub fn push_expression_scope(&mut self) -> ScopeInfo {
        let builder = self.fb();
        ScopeInfo {
            destruct_mark: builder.destructor_calls.len(),
            lifetime_mark: builder.lifetimes.len(),
        }
    }

    pub fn pop_expression_scope(&mut self, scope: ScopeInfo) {
        self.emit_destruct_operations(scope.destruct_mark, scope.lifetime_mark);
        let builder = self.fb_mut();
        builder.destructor_calls.truncate(scope.destruct_mark);
        builder.lifetimes.truncate(scope.lifetime_mark);
    }

    #[must_use]
    pub fn push_loop(&mut self, break_block: BlockRef, continue_block: BlockRef) -> LoopInfo {
        let builder = self.fb_mut();
        let previous = builder.loop_info;
        builder.loop_info = LoopInfo {
            break_block,
            continue_block,
            destruct_mark: builder.destructor_calls.len(),
            lifetime_mark: builder.lifetimes.len(),
            in_loop: true,
        };
        previous
    }

    pub fn pop_loop(&mut self, previous: LoopInfo) {
        self.fb_mut().loop_info = previous;
    }

    pub fn push_destruct_operation(&mut self, op: DestructOp) {
        self.fb_mut().destructor_calls.push(op);
    }

    pub fn push_end_lifetime(&mut self, value: ExprValue) {
        debug_assert!(value.is_reference());
        self.fb_mut().lifetimes.push(value);
    }

    /// Emits, in reverse registration order, the cleanup registered since
    /// the given marks. Skipped entirely when the block is already
    /// terminated (the early exit emitted its own unwinding).
    pub fn emit_destruct_operations(&mut self, destruct_mark: usize, lifetime_mark: usize) {
        if self.has_terminator() {
            return;
        }
        let ops: Vec<DestructOp> = self.fb().destructor_calls[destruct_mark..].to_vec();
        for op in ops.iter().rev() {
            self.emit_destruct_operation(op);
        }
        let lifetimes: Vec<ExprValue> = self.fb().lifetimes[lifetime_mark..].to_vec();
        for value in lifetimes.iter().rev() {
            self.create_end_lifetime(*value);
        }
    }

    /// Unwinds to the marks of the innermost loop, for `break`/`continue`.
    pub fn emit_loop_destruct_operations(&mut self) {
        let info = self.fb().loop_info;
        self.emit_destruct_operations(info.destruct_mark, info.lifetime_mark);
    }

    /// Unwinds everything, for `return`.
    pub fn emit_all_destruct_operations(&mut self) {
        self.emit_destruct_operations(0, 0);
    }

    fn emit_destruct_operation(&mut self, op: &DestructOp) {
        match op {
            DestructOp::Variable {
                destructor,
                value,
                condition,
            } => match (destructor, condition) {
                (None, _) => {}
                (Some(destructor), None) => self.emit_destructor_call(*destructor, *value),
                (Some(destructor), Some(condition)) => {
                    // if (indicator) { destructor(&value); }
                    let i1 = self.type_set.builtin_type(BuiltinKind::I1);
                    let indicator = ExprValue::new_reference(*condition, i1);
                    let loaded = self.create_load(indicator);
                    let destruct_block = self.add_basic_block();
                    let continue_block = self.add_basic_block();
                    self.create_conditional_jump(loaded, destruct_block, continue_block);
                    self.set_current_block(destruct_block);
                    self.emit_destructor_call(*destructor, *value);
                    self.create_jump(continue_block);
                    self.set_current_block(continue_block);
                }
            },
            DestructOp::SelfDestruct { destructor, value } => {
                self.emit_destructor_call(*destructor, *value)
            }
            DestructOp::RvalueArray {
                destructor,
                value,
                elem_ptr,
            } => {
                self.emit_rvalue_array_destruct(*destructor, *value, *elem_ptr);
            }
            DestructOp::DeferExpr { expr } => {
                let expr = expr.clone();
                let scope = self.push_expression_scope();
                crate::expr::generate_expr(self, &expr, None);
                self.pop_expression_scope(scope);
            }
        }
    }

    fn emit_destructor_call(&mut self, destructor: BodyId, value: ExprValue) {
        debug_assert!(value.is_reference());
        let func_idx = crate::generate_function(self, destructor);
        let args = vec![value.get_reference()];
        let span = self.ast.bodies[destructor].span;
        self.create_function_call(span, func_idx, args, self.type_set.null_type());
    }

    /// Destroys the elements of a partially constructed rvalue array, from
    /// its begin up to (not including) the element `elem_ptr` points at, in
    /// reverse construction order.
    fn emit_rvalue_array_destruct(
        &mut self,
        destructor: BodyId,
        value: ExprValue,
        elem_ptr: InstrRef,
    ) {
        let (elem_ty, _) = self.type_set.array_parts(value.ty());
        let pointer = self.type_set.pointer_type();
        let span = self.ast.bodies[destructor].span;

        // while (next != begin) { next -= 1; destructor(next); }
        let begin = self.create_struct_like_begin_ptr(value);
        let elem_slot = ExprValue::new_reference(elem_ptr, pointer);

        let cond_block = self.add_basic_block();
        let body_block = self.add_basic_block();
        let end_block = self.add_basic_block();
        self.create_jump(cond_block);

        self.set_current_block(cond_block);
        let current = self.create_load(elem_slot);
        let done = self.create_pointer_cmp_eq(current, begin);
        self.create_conditional_jump(done, end_block, body_block);

        self.set_current_block(body_block);
        let current = self.create_load(elem_slot);
        let previous = self.create_ptr_add_const_unchecked(current, -1, elem_ty);
        self.create_store(previous, elem_slot);
        let func_idx = crate::generate_function(self, destructor);
        let previous_value = self.create_load(elem_slot);
        self.create_function_call(
            span,
            func_idx,
            vec![previous_value.instr()],
            self.type_set.null_type(),
        );
        self.create_jump(cond_block);

        self.set_current_block(end_block);
    }

    /// The address of an array reference's first element, as a value.
    fn create_struct_like_begin_ptr(&mut self, value: ExprValue) -> ExprValue {
        debug_assert!(value.is_reference());
        let pointer = self.type_set.pointer_type();
        ExprValue::new_value(value.get_reference(), pointer)
    }

    ////////// expr value helpers //////////

    /// Loads a reference into a value; values pass through.
    pub fn value_of(&mut self, value: ExprValue) -> ExprValue {
        if value.is_value() {
            value
        } else {
            self.create_load(value)
        }
    }

    pub fn value_instr_of(&mut self, value: ExprValue) -> InstrRef {
        self.value_of(value).instr()
    }
}

impl FunctionBuilder {
    /// Flattens blocks into a flat instruction array, assigns each
    /// instruction its value slot (allocas first), patches operands from
    /// `InstrRef` to [`ValueIdx`] and jump destinations from block refs to
    /// instruction indices, and sorts switch value lists.
    pub fn finalize(mut self) -> Function {
        let alloca_count = self.allocas.len() as u32;

        let mut value_offsets = Vec::with_capacity(self.blocks.len());
        let mut value_offset = alloca_count;
        for block in self.blocks.iter_mut() {
            assert!(
                block.has_terminator(),
                "basic block without terminator in `{}`",
                self.name
            );
            block.value_offset = value_offset;
            value_offsets.push(value_offset);
            value_offset += block.instructions.len() as u32;
        }

        let value_index = |inst_ref: InstrRef| -> ValueIdx {
            if inst_ref.is_alloca() {
                ValueIdx::from_u32(inst_ref.index)
            } else {
                ValueIdx::from_u32(value_offsets[inst_ref.block as usize] + inst_ref.index)
            }
        };
        let instruction_index = |block_ref: BlockRef| -> InstIdx {
            InstIdx::from_u32(value_offsets[block_ref.as_usize()] - alloca_count)
        };

        // Patch operands.
        let mut patches: Vec<(InstrRef, [Option<ValueIdx>; 3])> = Vec::new();
        for unresolved in &self.unresolved_instructions {
            let args = [
                unresolved.args[0].map(value_index),
                unresolved.args[1].map(value_index),
                unresolved.args[2].map(value_index),
            ];
            patches.push((unresolved.inst, args));
        }
        for (inst_ref, args) in patches {
            let block = BlockRef::from_u32(inst_ref.block);
            let inst = &mut self.blocks[block].instructions[inst_ref.index as usize];
            let slots = inst.args_mut();
            for (slot, arg) in slots.iter_mut().zip(args.into_iter().flatten()) {
                *slot = arg;
            }
        }

        // Patch jump destinations.
        let mut jump_patches: Vec<(InstrRef, InstIdx, InstIdx)> = Vec::new();
        for unresolved in &self.unresolved_jumps {
            jump_patches.push((
                unresolved.inst,
                instruction_index(unresolved.dests[0]),
                instruction_index(unresolved.dests[1]),
            ));
        }
        for (inst_ref, dest0, dest1) in jump_patches {
            let block = BlockRef::from_u32(inst_ref.block);
            let inst = &mut self.blocks[block].instructions[inst_ref.index as usize];
            match inst {
                Instruction::Jump { dest, .. } => *dest = dest0,
                Instruction::ConditionalJump {
                    true_dest,
                    false_dest,
                    ..
                } => {
                    *true_dest = dest0;
                    *false_dest = dest1;
                }
                _ => unreachable!("unresolved jump on a non-jump instruction"),
            }
        }

        // Build switch tables, sorted by case value.
        let mut switch_infos = IdxVec::new();
        for unresolved in &self.unresolved_switches {
            let mut values: Vec<(u64, InstIdx)> = unresolved
                .values
                .iter()
                .map(|&(value, block)| (value, instruction_index(block)))
                .collect();
            values.sort_by_key(|&(value, _)| value);
            let info = SwitchInfo {
                values,
                default_dest: instruction_index(unresolved.default_dest),
            };
            switch_infos.push(info);
        }

        let call_args = self
            .call_args
            .into_iter()
            .map(|args| args.into_iter().map(value_index).collect())
            .collect();

        let instructions: Vec<Instruction> = self
            .blocks
            .iter()
            .flat_map(|block| block.instructions.iter().copied())
            .collect();

        trace!(
            name = %self.name,
            blocks = self.blocks.len(),
            instructions = instructions.len(),
            "flattened function"
        );

        Function {
            name: self.name,
            arg_types: self.arg_types,
            return_type: self.return_type,
            instructions,
            allocas: self.allocas,
            spans: self.spans,
            errors: self.errors,
            call_args,
            switch_infos,
            slice_check_infos: self.slice_check_infos,
            ptr_arith_check_infos: self.ptr_arith_check_infos,
            access_check_infos: self.access_check_infos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orec_ast::FunctionBody;

    fn empty_body(name: &str, return_type: TypeSpec) -> FunctionBody {
        FunctionBody {
            name: name.to_string(),
            span: SrcSpan::synthetic(),
            params: vec![],
            return_type,
            stmts: vec![],
        }
    }

    fn manual_ctx(ast: &Ast) -> (CodegenCtx<'_>, FuncIdx, Option<FunctionBuilder>) {
        let mut ctx = CodegenCtx::new(TargetLayout::host_default(), WarningConfig::all(), ast);
        let body_id = BodyId::from_u32(0);
        let func_idx = ctx.declare_function(body_id);
        let previous = ctx.begin_function(body_id, func_idx);
        (ctx, func_idx, previous)
    }

    #[test]
    fn finalize_rewrites_operands_to_flat_indices() {
        let mut ast = Ast::new();
        ast.add_body(empty_body("manual", TypeSpec::Int(orec_ast::IntKind::I32)));
        let (mut ctx, func_idx, previous) = manual_ctx(&ast);

        let i32_t = ctx.type_set.builtin_type(BuiltinKind::I32);
        let slot = ctx.create_alloca(i32_t);
        let value = ctx.create_const_i32(42);
        ctx.create_store(value, slot);
        let loaded = ctx.create_load(slot);
        ctx.create_ret(loaded.instr());
        ctx.end_function(previous, func_idx);

        let func = ctx.function(func_idx);
        assert_eq!(func.allocas.len(), 1);
        // The synthetic global-init block heads the flat array and jumps to
        // the entry block right behind it.
        match func.instructions[0] {
            Instruction::Jump { dest, .. } => assert_eq!(dest.as_u32(), 1),
            ref other => panic!("expected the global-init jump, got {:?}", other),
        }
        for inst in &func.instructions {
            for &arg in inst.args() {
                assert_ne!(arg, ValueIdx::UNRESOLVED, "unresolved operand in {:?}", inst);
                assert!((arg.as_usize()) < func.value_slot_count());
            }
        }
        // The load reads through the alloca's value slot, which comes first.
        let load = func
            .instructions
            .iter()
            .find(|inst| matches!(inst, Instruction::LoadI32Le { .. }))
            .expect("missing load");
        assert_eq!(load.args()[0], ValueIdx::from_u32(0));
        assert!(func.instructions.last().unwrap().is_terminator());
    }

    #[test]
    fn jump_destinations_resolve_to_block_heads() {
        let mut ast = Ast::new();
        ast.add_body(empty_body("branches", TypeSpec::Unit));
        let (mut ctx, func_idx, previous) = manual_ctx(&ast);

        let condition = ctx.create_const_i1(true);
        let then_block = ctx.add_basic_block();
        let else_block = ctx.add_basic_block();
        ctx.create_conditional_jump(condition, then_block, else_block);
        ctx.set_current_block(then_block);
        ctx.create_ret_void();
        ctx.set_current_block(else_block);
        ctx.create_ret_void();
        ctx.end_function(previous, func_idx);

        let func = ctx.function(func_idx);
        let (true_dest, false_dest) = func
            .instructions
            .iter()
            .find_map(|inst| match inst {
                Instruction::ConditionalJump {
                    true_dest,
                    false_dest,
                    ..
                } => Some((*true_dest, *false_dest)),
                _ => None,
            })
            .expect("missing conditional jump");
        assert!(matches!(
            func.instructions[true_dest.as_usize()],
            Instruction::RetVoid { .. }
        ));
        assert!(matches!(
            func.instructions[false_dest.as_usize()],
            Instruction::RetVoid { .. }
        ));
        assert_ne!(true_dest, false_dest);
    }

    #[test]
    fn switch_values_are_sorted_by_finalization() {
        let mut ast = Ast::new();
        ast.add_body(empty_body("switchy", TypeSpec::Unit));
        let (mut ctx, func_idx, previous) = manual_ctx(&ast);

        let scrutinee = ctx.create_const_i32(2);
        let high = ctx.add_basic_block();
        let low = ctx.add_basic_block();
        let default = ctx.add_basic_block();
        ctx.create_switch(scrutinee, vec![(9, high), (1, low), (4, high)], default);
        for block in [high, low, default] {
            ctx.set_current_block(block);
            ctx.create_ret_void();
        }
        ctx.end_function(previous, func_idx);

        let func = ctx.function(func_idx);
        let values: Vec<u64> = func.switch_infos.raw[0]
            .values
            .iter()
            .map(|&(value, _)| value)
            .collect();
        assert_eq!(values, vec![1, 4, 9]);
    }

    #[test]
    fn terminated_blocks_reopen_on_further_insertion() {
        let mut ast = Ast::new();
        ast.add_body(empty_body("reopened", TypeSpec::Unit));
        let (mut ctx, func_idx, previous) = manual_ctx(&ast);

        ctx.create_ret_void();
        assert!(ctx.has_terminator());
        // Dead code after a terminator lands in a fresh block.
        ctx.create_const_i32(1);
        assert!(!ctx.has_terminator());
        ctx.create_ret_void();
        ctx.end_function(previous, func_idx);

        let func = ctx.function(func_idx);
        assert!(func.instructions.last().unwrap().is_terminator());
    }
}
