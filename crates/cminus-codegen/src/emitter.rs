//! The IR builder (component G): a single post-order walk of the AST that
//! lowers each function into LLVM IR, routing scalar locals through
//! [`SsaBuilder`] and addressing arrays directly via `alloca`/GEP.

use std::collections::HashMap;

use cminus_ast::{AssignOp, CmpOp, Expr, ExprKind, Function, FunctionId, MathOp, Program, Stmt};
use cminus_core::{IdentId, StringInterner, SymbolTable, Type};
use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::BasicTypeEnum;
use inkwell::values::{
    BasicMetadataValueEnum, BasicValue, BasicValueEnum, FunctionValue, PointerValue,
};
use inkwell::{AddressSpace, FloatPredicate, IntPredicate};

use crate::error::CodegenError;
use crate::ssa::SsaBuilder;
use crate::types_llvm::{array_element_llvm_type, local_array_llvm_type, param_llvm_type, scalar_llvm_type};

/// Where a live array value lives: its base pointer, the LLVM type of one
/// element, and -- for locally allocated fixed-size arrays only -- the
/// `alloca`'d array type itself, needed to form a two-index GEP. Pointer
/// parameters have no backing array type and are addressed with a single
/// index instead.
struct ArrayBinding<'ctx> {
    ptr: PointerValue<'ctx>,
    elem_ty: BasicTypeEnum<'ctx>,
    local_array_ty: Option<inkwell::types::ArrayType<'ctx>>,
}

/// Mutable state scoped to one function's emission.
struct Frame<'ctx> {
    fn_value: FunctionValue<'ctx>,
    ssa: SsaBuilder<'ctx>,
    arrays: HashMap<IdentId, ArrayBinding<'ctx>>,
    return_ty: Type,
}

pub struct Codegen<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    string_globals: HashMap<cminus_core::StringId, PointerValue<'ctx>>,
    functions: HashMap<FunctionId, FunctionValue<'ctx>>,
}

impl<'ctx> Codegen<'ctx> {
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        let module = context.create_module(module_name);
        let builder = context.create_builder();
        Codegen {
            context,
            module,
            builder,
            string_globals: HashMap::new(),
            functions: HashMap::new(),
        }
    }

    pub fn finish(self) -> Module<'ctx> {
        self.module
    }

    pub fn emit_program(
        &mut self,
        program: &Program,
        symbols: &mut SymbolTable,
        interner: &mut StringInterner,
    ) -> Result<(), CodegenError> {
        if program.needs_printf() {
            self.declare_printf();
        }
        self.declare_functions(program, symbols);
        for function in &program.functions {
            self.emit_function(function, symbols, interner)?;
        }
        Ok(())
    }

    fn declare_printf(&mut self) {
        let i32_ty = self.context.i32_type();
        let ptr_ty = self.context.i8_type().ptr_type(AddressSpace::default());
        let fn_ty = i32_ty.fn_type(&[ptr_ty.into()], true);
        self.module.add_function("printf", fn_ty, Some(Linkage::External));
    }

    fn declare_functions(&mut self, program: &Program, symbols: &mut SymbolTable) {
        for function in &program.functions {
            let name = symbols.ident(function.ident).name.clone();
            let param_types: Vec<BasicTypeEnum<'ctx>> = function
                .args
                .iter()
                .map(|arg| param_llvm_type(self.context, symbols.ident(arg.ident).ty))
                .collect();
            let metadata_params: Vec<_> = param_types.iter().map(|t| (*t).into()).collect();
            let fn_ty = match function.return_ty {
                Type::Void => self.context.void_type().fn_type(&metadata_params, false),
                Type::Int => self.context.i32_type().fn_type(&metadata_params, false),
                Type::Char => self.context.i8_type().fn_type(&metadata_params, false),
                Type::Double => self.context.f64_type().fn_type(&metadata_params, false),
                other => unreachable!("function cannot return {other}"),
            };
            let fn_value = self.module.add_function(&name, fn_ty, None);
            self.functions.insert(function.id, fn_value);
            symbols.ident_mut(function.ident).ir_handle = Some(name);
        }
    }

    fn emit_function(
        &mut self,
        function: &Function,
        symbols: &mut SymbolTable,
        interner: &mut StringInterner,
    ) -> Result<(), CodegenError> {
        let fn_value = self.functions[&function.id];
        let entry = self.context.append_basic_block(fn_value, "entry");
        self.builder.position_at_end(entry);

        let mut ssa = SsaBuilder::new();
        ssa.add_block(entry, true);
        let mut frame = Frame {
            fn_value,
            ssa,
            arrays: HashMap::new(),
            return_ty: function.return_ty,
        };

        for (i, arg) in function.args.iter().enumerate() {
            let ident = symbols.ident(arg.ident);
            let param = fn_value
                .get_nth_param(i as u32)
                .ok_or_else(|| CodegenError::Internal("missing parameter value".into()))?;
            if ident.ty.is_array() {
                let elem_ty = array_element_llvm_type(self.context, ident.ty);
                frame.arrays.insert(
                    arg.ident,
                    ArrayBinding {
                        ptr: param.into_pointer_value(),
                        elem_ty,
                        local_array_ty: None,
                    },
                );
            } else {
                let ty = scalar_llvm_type(self.context, ident.ty);
                frame.ssa.declare_variable(arg.ident, ty);
                frame.ssa.write_variable(arg.ident, entry, param);
            }
        }

        self.emit_stmt(&function.body, &mut frame, symbols, interner)?;

        let current = self
            .builder
            .get_insert_block()
            .ok_or_else(|| CodegenError::Internal("builder lost its insertion point".into()))?;
        if current.get_terminator().is_none() {
            match function.return_ty {
                Type::Void => {
                    self.builder.build_return(None);
                }
                other => {
                    // Unreachable per I6 for non-void functions, but emitted
                    // defensively so a verifier failure surfaces as a clear
                    // internal error rather than a dangling block.
                    let zero = self.zero_of(other);
                    self.builder.build_return(Some(&zero));
                }
            }
        }
        Ok(())
    }

    fn zero_of(&self, ty: Type) -> BasicValueEnum<'ctx> {
        match ty {
            Type::Int => self.context.i32_type().const_zero().into(),
            Type::Char => self.context.i8_type().const_zero().into(),
            Type::Double => self.context.f64_type().const_zero().into(),
            other => unreachable!("zero_of called on non-scalar type {other}"),
        }
    }

    fn current_block(&self) -> Result<BasicBlock<'ctx>, CodegenError> {
        self.builder
            .get_insert_block()
            .ok_or_else(|| CodegenError::Internal("builder lost its insertion point".into()))
    }

    fn block_terminated(&self, block: BasicBlock<'ctx>) -> bool {
        block.get_terminator().is_some()
    }

    fn emit_stmt(
        &mut self,
        stmt: &Stmt,
        frame: &mut Frame<'ctx>,
        symbols: &mut SymbolTable,
        interner: &mut StringInterner,
    ) -> Result<(), CodegenError> {
        match stmt {
            Stmt::Compound(stmts) => {
                for s in stmts {
                    if self.block_terminated(self.current_block()?) {
                        break;
                    }
                    self.emit_stmt(s, frame, symbols, interner)?;
                }
                Ok(())
            }
            Stmt::Declaration { ident, init } => self.emit_declaration(*ident, init.as_ref(), frame, symbols, interner),
            Stmt::If { cond, then_branch, else_branch } => {
                self.emit_if(cond, then_branch, else_branch.as_deref(), frame, symbols, interner)
            }
            Stmt::While { cond, body } => self.emit_while(cond, body, frame, symbols, interner),
            Stmt::For { init, cond, update, body, .. } => {
                self.emit_for(init.as_deref(), cond.as_ref(), update.as_ref(), body, frame, symbols, interner)
            }
            Stmt::Return { expr, .. } => {
                let value = match expr {
                    Some(e) => Some(self.emit_expr(e, frame, symbols, interner)?),
                    None => None,
                };
                match value {
                    Some(v) => self.builder.build_return(Some(&v)),
                    None => self.builder.build_return(None),
                };
                Ok(())
            }
            Stmt::ExprStmt(e) => {
                self.emit_expr(e, frame, symbols, interner)?;
                Ok(())
            }
            Stmt::Null => Ok(()),
        }
    }

    fn emit_declaration(
        &mut self,
        ident: IdentId,
        init: Option<&Expr>,
        frame: &mut Frame<'ctx>,
        symbols: &mut SymbolTable,
        interner: &mut StringInterner,
    ) -> Result<(), CodegenError> {
        let identifier = symbols.ident(ident);
        let ty = identifier.ty;
        let name = identifier.name.clone();
        let element_count = identifier.element_count;
        if ty.is_array() {
            let count = element_count
                .ok_or_else(|| CodegenError::Internal("local array missing element count".into()))?
                as u32;
            let elem_ty = array_element_llvm_type(self.context, ty);
            let array_ty = local_array_llvm_type(self.context, ty, count);
            let ptr = self.builder.build_alloca(array_ty, &name);

            if let Some(Expr { kind: ExprKind::StringLit(string_id), .. }) = init {
                let text = interner.get(*string_id).text.clone();
                let i32_ty = self.context.i32_type();
                let i8_ty = self.context.i8_type();
                for (i, byte) in text.bytes().enumerate() {
                    let indices = [i32_ty.const_zero(), i32_ty.const_int(i as u64, false)];
                    let elem_ptr = unsafe {
                        self.builder.build_gep(array_ty, ptr, &indices, "str.init")
                    };
                    self.builder.build_store(elem_ptr, i8_ty.const_int(byte as u64, false));
                }
                let null_index = [i32_ty.const_zero(), i32_ty.const_int(text.len() as u64, false)];
                let null_ptr = unsafe { self.builder.build_gep(array_ty, ptr, &null_index, "str.nul") };
                self.builder.build_store(null_ptr, i8_ty.const_zero());
            }

            frame.arrays.insert(ident, ArrayBinding { ptr, elem_ty, local_array_ty: Some(array_ty) });
            symbols.ident_mut(ident).ir_handle = Some(name);
        } else {
            let llvm_ty = scalar_llvm_type(self.context, ty);
            frame.ssa.declare_variable(ident, llvm_ty);
            let value = match init {
                Some(e) => self.emit_expr(e, frame, symbols, interner)?,
                None => self.zero_of(ty),
            };
            frame.ssa.write_variable(ident, self.current_block()?, value);
        }
        Ok(())
    }

    fn truthy(&mut self, value: BasicValueEnum<'ctx>) -> inkwell::values::IntValue<'ctx> {
        match value {
            BasicValueEnum::IntValue(i) => {
                self.builder
                    .build_int_compare(IntPredicate::NE, i, i.get_type().const_zero(), "truthy")
            }
            BasicValueEnum::FloatValue(f) => {
                self.builder
                    .build_float_compare(FloatPredicate::ONE, f, f.get_type().const_zero(), "truthy")
            }
            _ => unreachable!("condition value must be a scalar"),
        }
    }

    fn emit_if(
        &mut self,
        cond: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
        frame: &mut Frame<'ctx>,
        symbols: &mut SymbolTable,
        interner: &mut StringInterner,
    ) -> Result<(), CodegenError> {
        let cond_val = self.emit_expr(cond, frame, symbols, interner)?;
        let cond_bool = self.truthy(cond_val);
        let entry = self.current_block()?;

        let then_bb = self.context.append_basic_block(frame.fn_value, "if.then");
        let else_bb = if else_branch.is_some() {
            Some(self.context.append_basic_block(frame.fn_value, "if.else"))
        } else {
            None
        };
        let end_bb = self.context.append_basic_block(frame.fn_value, "if.end");

        self.builder.build_conditional_branch(cond_bool, then_bb, else_bb.unwrap_or(end_bb));

        let mut end_has_predecessor = false;

        frame.ssa.add_block(then_bb, true);
        frame.ssa.add_predecessor(then_bb, entry);
        self.builder.position_at_end(then_bb);
        self.emit_stmt(then_branch, frame, symbols, interner)?;
        let then_exit = self.current_block()?;
        if !self.block_terminated(then_exit) {
            self.builder.build_unconditional_branch(end_bb);
            frame.ssa.add_predecessor(end_bb, then_exit);
            end_has_predecessor = true;
        }

        if let Some(else_bb) = else_bb {
            frame.ssa.add_block(else_bb, true);
            frame.ssa.add_predecessor(else_bb, entry);
            self.builder.position_at_end(else_bb);
            self.emit_stmt(else_branch.unwrap(), frame, symbols, interner)?;
            let else_exit = self.current_block()?;
            if !self.block_terminated(else_exit) {
                self.builder.build_unconditional_branch(end_bb);
                frame.ssa.add_predecessor(end_bb, else_exit);
                end_has_predecessor = true;
            }
        } else {
            frame.ssa.add_predecessor(end_bb, entry);
            end_has_predecessor = true;
        }

        frame.ssa.add_block(end_bb, false);
        self.builder.position_at_end(end_bb);
        frame.ssa.seal_block(end_bb, &self.builder);
        if !end_has_predecessor {
            // Both branches terminate on every path (e.g. `if/else` each
            // ending in `return`): `if.end` is dead code with no
            // predecessor, so it gets its own terminator here rather than
            // falling through to the function's trailing-return synthesis,
            // which would otherwise fabricate a spurious live-looking
            // return in unreachable code.
            self.builder.build_unreachable();
        }
        Ok(())
    }

    fn emit_while(
        &mut self,
        cond: &Expr,
        body: &Stmt,
        frame: &mut Frame<'ctx>,
        symbols: &mut SymbolTable,
        interner: &mut StringInterner,
    ) -> Result<(), CodegenError> {
        let entry = self.current_block()?;
        let cond_bb = self.context.append_basic_block(frame.fn_value, "while.cond");
        let body_bb = self.context.append_basic_block(frame.fn_value, "while.body");
        let end_bb = self.context.append_basic_block(frame.fn_value, "while.end");

        self.builder.build_unconditional_branch(cond_bb);
        frame.ssa.add_block(cond_bb, false);
        frame.ssa.add_predecessor(cond_bb, entry);

        self.builder.position_at_end(cond_bb);
        let cond_val = self.emit_expr(cond, frame, symbols, interner)?;
        let cond_bool = self.truthy(cond_val);
        self.builder.build_conditional_branch(cond_bool, body_bb, end_bb);

        frame.ssa.add_block(body_bb, true);
        frame.ssa.add_predecessor(body_bb, cond_bb);
        self.builder.position_at_end(body_bb);
        self.emit_stmt(body, frame, symbols, interner)?;
        let body_exit = self.current_block()?;
        if !self.block_terminated(body_exit) {
            self.builder.build_unconditional_branch(cond_bb);
            frame.ssa.add_predecessor(cond_bb, body_exit);
        }
        frame.ssa.seal_block(cond_bb, &self.builder);

        frame.ssa.add_block(end_bb, true);
        frame.ssa.add_predecessor(end_bb, cond_bb);
        self.builder.position_at_end(end_bb);
        Ok(())
    }

    fn emit_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
        frame: &mut Frame<'ctx>,
        symbols: &mut SymbolTable,
        interner: &mut StringInterner,
    ) -> Result<(), CodegenError> {
        if let Some(init) = init {
            self.emit_stmt(init, frame, symbols, interner)?;
        }
        let preheader = self.current_block()?;

        let cond_bb = self.context.append_basic_block(frame.fn_value, "for.cond");
        let body_bb = self.context.append_basic_block(frame.fn_value, "for.body");
        let update_bb = self.context.append_basic_block(frame.fn_value, "for.update");
        let end_bb = self.context.append_basic_block(frame.fn_value, "for.end");

        self.builder.build_unconditional_branch(cond_bb);
        frame.ssa.add_block(cond_bb, false);
        frame.ssa.add_predecessor(cond_bb, preheader);

        self.builder.position_at_end(cond_bb);
        match cond {
            Some(cond) => {
                let cond_val = self.emit_expr(cond, frame, symbols, interner)?;
                let cond_bool = self.truthy(cond_val);
                self.builder.build_conditional_branch(cond_bool, body_bb, end_bb);
            }
            None => {
                self.builder.build_unconditional_branch(body_bb);
            }
        }

        frame.ssa.add_block(body_bb, true);
        frame.ssa.add_predecessor(body_bb, cond_bb);
        self.builder.position_at_end(body_bb);
        self.emit_stmt(body, frame, symbols, interner)?;
        let body_exit = self.current_block()?;
        if !self.block_terminated(body_exit) {
            self.builder.build_unconditional_branch(update_bb);
        }

        frame.ssa.add_block(update_bb, true);
        frame.ssa.add_predecessor(update_bb, body_exit);
        self.builder.position_at_end(update_bb);
        if let Some(update) = update {
            self.emit_expr(update, frame, symbols, interner)?;
        }
        let update_exit = self.current_block()?;
        self.builder.build_unconditional_branch(cond_bb);
        frame.ssa.add_predecessor(cond_bb, update_exit);
        frame.ssa.seal_block(cond_bb, &self.builder);

        frame.ssa.add_block(end_bb, true);
        frame.ssa.add_predecessor(end_bb, cond_bb);
        self.builder.position_at_end(end_bb);
        Ok(())
    }

    fn array_element_ptr(
        &mut self,
        array: IdentId,
        index: &Expr,
        frame: &mut Frame<'ctx>,
        symbols: &mut SymbolTable,
        interner: &mut StringInterner,
    ) -> Result<(PointerValue<'ctx>, BasicTypeEnum<'ctx>), CodegenError> {
        let index_val = self.emit_expr(index, frame, symbols, interner)?.into_int_value();
        let binding = frame
            .arrays
            .get(&array)
            .ok_or_else(|| CodegenError::Internal("array identifier has no binding".into()))?;
        let ptr = match binding.local_array_ty {
            Some(array_ty) => {
                let i32_ty = self.context.i32_type();
                let indices = [i32_ty.const_zero(), index_val];
                unsafe { self.builder.build_gep(array_ty, binding.ptr, &indices, "elem.ptr") }
            }
            None => unsafe {
                self.builder.build_gep(binding.elem_ty, binding.ptr, &[index_val], "elem.ptr")
            },
        };
        Ok((ptr, binding.elem_ty))
    }

    fn get_string_global(&mut self, id: cminus_core::StringId, interner: &mut StringInterner) -> PointerValue<'ctx> {
        if let Some(&ptr) = self.string_globals.get(&id) {
            return ptr;
        }
        let name = format!("str.{}", id.0);
        let text = interner.get(id).text.clone();
        let global = self.builder.build_global_string_ptr(&text, &name);
        let ptr = global.as_pointer_value();
        self.string_globals.insert(id, ptr);
        interner.set_ir_handle(id, name);
        ptr
    }

    fn emit_expr(
        &mut self,
        expr: &Expr,
        frame: &mut Frame<'ctx>,
        symbols: &mut SymbolTable,
        interner: &mut StringInterner,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        match &expr.kind {
            ExprKind::IdentRef(id) => {
                let block = self.current_block()?;
                Ok(frame.ssa.read_variable(*id, block, &self.builder))
            }
            ExprKind::ArraySubscript { array, index } => {
                let (ptr, elem_ty) = self.array_element_ptr(*array, index, frame, symbols, interner)?;
                Ok(self.builder.build_load(elem_ty, ptr, "elem.load"))
            }
            ExprKind::AddrOfArrayElement { array, index } => {
                let (ptr, _) = self.array_element_ptr(*array, index, frame, symbols, interner)?;
                Ok(ptr.into())
            }
            ExprKind::FunctionCall { callee, args } => self.emit_call(*callee, args, frame, symbols, interner),
            ExprKind::Assign { op, lhs, rhs } => self.emit_assign(*op, lhs, rhs, frame, symbols, interner),
            ExprKind::LogicalAnd(lhs, rhs) => self.emit_logical(true, lhs, rhs, frame, symbols, interner),
            ExprKind::LogicalOr(lhs, rhs) => self.emit_logical(false, lhs, rhs, frame, symbols, interner),
            ExprKind::BinaryCmp { op, lhs, rhs } => self.emit_cmp(*op, lhs, rhs, frame, symbols, interner),
            ExprKind::BinaryMath { op, lhs, rhs } => self.emit_math(*op, lhs, rhs, frame, symbols, interner),
            ExprKind::Not(e) => {
                let val = self.emit_expr(e, frame, symbols, interner)?.into_int_value();
                let zero = val.get_type().const_zero();
                let eq = self.builder.build_int_compare(IntPredicate::EQ, val, zero, "not");
                Ok(self.builder.build_int_z_extend(eq, self.context.i32_type(), "not.ext").into())
            }
            ExprKind::PreIncrement(id) => self.emit_pre_step(*id, true, frame, symbols),
            ExprKind::PreDecrement(id) => self.emit_pre_step(*id, false, frame, symbols),
            ExprKind::StringLit(id) => Ok(self.get_string_global(*id, interner).into()),
            ExprKind::IntLit(v) => Ok(self.context.i32_type().const_int(*v as u64, true).into()),
            ExprKind::DoubleLit(v) => Ok(self.context.f64_type().const_float(*v).into()),
            ExprKind::CharLit(v) => Ok(self.context.i8_type().const_int(*v as u64, false).into()),
        }
    }

    fn emit_pre_step(
        &mut self,
        id: IdentId,
        increment: bool,
        frame: &mut Frame<'ctx>,
        symbols: &mut SymbolTable,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let block = self.current_block()?;
        let current = frame.ssa.read_variable(id, block, &self.builder);
        let ty = symbols.ident(id).ty;
        let updated = self.step_value(current, ty, increment);
        frame.ssa.write_variable(id, block, updated);
        Ok(updated)
    }

    fn step_value(&mut self, current: BasicValueEnum<'ctx>, ty: Type, increment: bool) -> BasicValueEnum<'ctx> {
        match (current, ty) {
            (BasicValueEnum::IntValue(i), _) => {
                let one = i.get_type().const_int(1, false);
                let result = if increment {
                    self.builder.build_int_add(i, one, "step")
                } else {
                    self.builder.build_int_sub(i, one, "step")
                };
                result.into()
            }
            (BasicValueEnum::FloatValue(f), _) => {
                let one = f.get_type().const_float(1.0);
                let result = if increment {
                    self.builder.build_float_add(f, one, "step")
                } else {
                    self.builder.build_float_sub(f, one, "step")
                };
                result.into()
            }
            _ => unreachable!("pre-increment/decrement target must be a numeric scalar"),
        }
    }

    fn emit_call(
        &mut self,
        callee: IdentId,
        args: &[Expr],
        frame: &mut Frame<'ctx>,
        symbols: &mut SymbolTable,
        interner: &mut StringInterner,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let ident = symbols.ident(callee);
        if ident.name == "printf" {
            let mut metadata_args = Vec::with_capacity(args.len());
            for arg in args {
                metadata_args.push(self.emit_call_arg(arg, frame, symbols, interner)?);
            }
            let printf = self
                .module
                .get_function("printf")
                .ok_or_else(|| CodegenError::Internal("printf not declared".into()))?;
            let call = self.builder.build_call(printf, &metadata_args, "printf.call");
            return Ok(call
                .try_as_basic_value()
                .left()
                .unwrap_or_else(|| self.context.i32_type().const_zero().into()));
        }

        let function_id = ident
            .function_ref
            .map(FunctionId)
            .ok_or_else(|| CodegenError::Internal("callee identifier has no function_ref".into()))?;
        let fn_value = *self
            .functions
            .get(&function_id)
            .ok_or_else(|| CodegenError::Internal("callee not declared".into()))?;
        let mut metadata_args = Vec::with_capacity(args.len());
        for arg in args {
            metadata_args.push(self.emit_call_arg(arg, frame, symbols, interner)?);
        }
        let call = self.builder.build_call(fn_value, &metadata_args, "call");
        Ok(call
            .try_as_basic_value()
            .left()
            .unwrap_or_else(|| self.context.i32_type().const_zero().into()))
    }

    /// Lowers one call argument: array-typed arguments pass their base
    /// pointer (no load), scalars pass their value.
    fn emit_call_arg(
        &mut self,
        arg: &Expr,
        frame: &mut Frame<'ctx>,
        symbols: &mut SymbolTable,
        interner: &mut StringInterner,
    ) -> Result<BasicMetadataValueEnum<'ctx>, CodegenError> {
        if let ExprKind::IdentRef(id) = &arg.kind {
            if let Some(binding) = frame.arrays.get(id) {
                return Ok(binding.ptr.into());
            }
        }
        Ok(self.emit_expr(arg, frame, symbols, interner)?.into())
    }

    fn emit_assign(
        &mut self,
        op: AssignOp,
        lhs: &Expr,
        rhs: &Expr,
        frame: &mut Frame<'ctx>,
        symbols: &mut SymbolTable,
        interner: &mut StringInterner,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let rhs_val = self.emit_expr(rhs, frame, symbols, interner)?;

        match &lhs.kind {
            ExprKind::IdentRef(id) => {
                let block = self.current_block()?;
                let result = if op == AssignOp::Assign {
                    rhs_val
                } else {
                    let current = frame.ssa.read_variable(*id, block, &self.builder);
                    self.combine(current, rhs_val, op)
                };
                frame.ssa.write_variable(*id, block, result);
                Ok(result)
            }
            ExprKind::ArraySubscript { array, index } => {
                let (ptr, elem_ty) = self.array_element_ptr(*array, index, frame, symbols, interner)?;
                let result = if op == AssignOp::Assign {
                    rhs_val
                } else {
                    let current = self.builder.build_load(elem_ty, ptr, "compound.load");
                    self.combine(current, rhs_val, op)
                };
                self.builder.build_store(ptr, result);
                Ok(result)
            }
            _ => Err(CodegenError::Internal("assignment target is not an lvalue".into())),
        }
    }

    fn combine(&mut self, lhs: BasicValueEnum<'ctx>, rhs: BasicValueEnum<'ctx>, op: AssignOp) -> BasicValueEnum<'ctx> {
        let math_op = match op {
            AssignOp::AddAssign => MathOp::Add,
            AssignOp::SubAssign => MathOp::Sub,
            AssignOp::Assign => unreachable!("Assign has no arithmetic combine"),
        };
        self.build_math(lhs, rhs, math_op)
    }

    fn emit_logical(
        &mut self,
        is_and: bool,
        lhs: &Expr,
        rhs: &Expr,
        frame: &mut Frame<'ctx>,
        symbols: &mut SymbolTable,
        interner: &mut StringInterner,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let lhs_val = self.emit_expr(lhs, frame, symbols, interner)?;
        let lhs_bool = self.truthy(lhs_val);
        let entry = self.current_block()?;

        let label = if is_and { "and" } else { "or" };
        let rhs_bb = self.context.append_basic_block(frame.fn_value, &format!("{label}.rhs"));
        let end_bb = self.context.append_basic_block(frame.fn_value, &format!("{label}.end"));

        let short_circuit_value = self.context.i32_type().const_int(if is_and { 0 } else { 1 }, false);
        if is_and {
            self.builder.build_conditional_branch(lhs_bool, rhs_bb, end_bb);
        } else {
            self.builder.build_conditional_branch(lhs_bool, end_bb, rhs_bb);
        }

        self.builder.position_at_end(rhs_bb);
        let rhs_val = self.emit_expr(rhs, frame, symbols, interner)?;
        let rhs_bool = self.truthy(rhs_val);
        let rhs_i32 = self.builder.build_int_z_extend(rhs_bool, self.context.i32_type(), "logical.ext");
        let rhs_exit = self.current_block()?;
        self.builder.build_unconditional_branch(end_bb);

        self.builder.position_at_end(end_bb);
        let phi = self.builder.build_phi(self.context.i32_type(), "logical.result");
        phi.add_incoming(&[(&short_circuit_value, entry), (&rhs_i32, rhs_exit)]);
        Ok(phi.as_basic_value())
    }

    fn emit_cmp(
        &mut self,
        op: CmpOp,
        lhs: &Expr,
        rhs: &Expr,
        frame: &mut Frame<'ctx>,
        symbols: &mut SymbolTable,
        interner: &mut StringInterner,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let lhs_val = self.emit_expr(lhs, frame, symbols, interner)?.into_int_value();
        let rhs_val = self.emit_expr(rhs, frame, symbols, interner)?.into_int_value();
        let predicate = match op {
            CmpOp::Eq => IntPredicate::EQ,
            CmpOp::Ne => IntPredicate::NE,
            CmpOp::Lt => IntPredicate::SLT,
            CmpOp::Le => IntPredicate::SLE,
            CmpOp::Gt => IntPredicate::SGT,
            CmpOp::Ge => IntPredicate::SGE,
        };
        let cmp = self.builder.build_int_compare(predicate, lhs_val, rhs_val, "cmp");
        Ok(self.builder.build_int_z_extend(cmp, self.context.i32_type(), "cmp.ext").into())
    }

    fn emit_math(
        &mut self,
        op: MathOp,
        lhs: &Expr,
        rhs: &Expr,
        frame: &mut Frame<'ctx>,
        symbols: &mut SymbolTable,
        interner: &mut StringInterner,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let lhs_val = self.emit_expr(lhs, frame, symbols, interner)?;
        let rhs_val = self.emit_expr(rhs, frame, symbols, interner)?;
        Ok(self.build_math(lhs_val, rhs_val, op))
    }

    fn build_math(&mut self, lhs: BasicValueEnum<'ctx>, rhs: BasicValueEnum<'ctx>, op: MathOp) -> BasicValueEnum<'ctx> {
        match (lhs, rhs) {
            (BasicValueEnum::IntValue(l), BasicValueEnum::IntValue(r)) => match op {
                MathOp::Add => self.builder.build_int_add(l, r, "add").into(),
                MathOp::Sub => self.builder.build_int_sub(l, r, "sub").into(),
                MathOp::Mul => self.builder.build_int_mul(l, r, "mul").into(),
                MathOp::Div => self.builder.build_int_signed_div(l, r, "div").into(),
                MathOp::Mod => self.builder.build_int_signed_rem(l, r, "mod").into(),
            },
            (BasicValueEnum::FloatValue(l), BasicValueEnum::FloatValue(r)) => match op {
                MathOp::Add => self.builder.build_float_add(l, r, "fadd").into(),
                MathOp::Sub => self.builder.build_float_sub(l, r, "fsub").into(),
                MathOp::Mul => self.builder.build_float_mul(l, r, "fmul").into(),
                MathOp::Div => self.builder.build_float_div(l, r, "fdiv").into(),
                MathOp::Mod => self.builder.build_float_rem(l, r, "frem").into(),
            },
            _ => unreachable!("arithmetic operands must have matched scalar kinds (enforced at parse time)"),
        }
    }
}
