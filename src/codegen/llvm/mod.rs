//! Native backend: LLVM IR through inkwell, run on an MCJIT engine.
//!
//! Sealed modules stay in the engine so later units link against their
//! definitions. MCJIT cannot drop a single function, so the anonymous
//! entry is emitted under a per-unit name instead of being unloaded.

#[cfg(test)]
pub mod test;

use inkwell::OptimizationLevel;
use inkwell::builder::{Builder, BuilderError};
use inkwell::context::Context;
use inkwell::execution_engine::ExecutionEngine;
use inkwell::module::Module;
use inkwell::passes::PassBuilderOptions;
use inkwell::targets::{CodeModel, InitializationConfig, RelocMode, Target, TargetMachine};
use inkwell::types::BasicMetadataTypeEnum;
use inkwell::values::{AnyValueEnum, BasicMetadataValueEnum, FloatValue, FunctionValue};
use inkwell::FloatPredicate;

use crate::ast::ANON_FN_NAME;
use crate::codegen::{ArithOp, Backend, CmpOp};
use crate::error::{CodegenError, ExecutionError};
use crate::stdlib;

use std::collections::HashSet;
use std::mem;

const PASS_PIPELINE: &str = "instcombine,reassociate,gvn,simplifycfg";

type EntryFn = unsafe extern "C" fn() -> f64;

pub struct SealedUnit<'ctx> {
    module: Module<'ctx>,
    /// Engine-visible name of the anonymous entry, if the unit has one.
    entry: Option<String>,
}

pub struct LlvmBackend<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    engine: ExecutionEngine<'ctx>,
    machine: TargetMachine,
    /// Modules owned by the engine, the bootstrap module first.
    loaded: Vec<Module<'ctx>>,
    /// Functions with a body in some loaded module.
    defined: HashSet<String>,
    sealed: usize,
}

impl<'ctx> LlvmBackend<'ctx> {
    pub fn new(context: &'ctx Context, module_name: &str) -> Result<Self, ExecutionError> {
        Target::initialize_native(&InitializationConfig::default())
            .map_err(ExecutionError::Engine)?;
        ExecutionEngine::link_in_mc_jit();

        let triple = TargetMachine::get_default_triple();
        let target =
            Target::from_triple(&triple).map_err(|e| ExecutionError::Engine(e.to_string()))?;
        let machine = target
            .create_target_machine(
                &triple,
                &TargetMachine::get_host_cpu_name().to_string(),
                &TargetMachine::get_host_cpu_features().to_string(),
                OptimizationLevel::Default,
                RelocMode::Default,
                CodeModel::JITDefault,
            )
            .ok_or_else(|| ExecutionError::Engine("no target machine for host".to_string()))?;

        let bootstrap = context.create_module("bootstrap");
        let engine = bootstrap
            .create_jit_execution_engine(OptimizationLevel::None)
            .map_err(|e| ExecutionError::Engine(e.to_string()))?;

        Ok(LlvmBackend {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            engine,
            machine,
            loaded: vec![bootstrap],
            defined: HashSet::new(),
            sealed: 0,
        })
    }

    /// Name a function is emitted under. The anonymous entry is numbered
    /// per unit so the engine never finds a stale one.
    fn symbol(&self, name: &str) -> String {
        if name == ANON_FN_NAME {
            format!("{}.{}", ANON_FN_NAME, self.sealed)
        } else {
            name.to_string()
        }
    }

    /// Binds every called bodiless declaration of `module` to a loaded
    /// definition or a native. Nothing is mapped unless all of them resolve.
    fn link_declarations(&self, module: &Module<'ctx>) -> Result<(), ExecutionError> {
        let own: HashSet<String> = module
            .get_functions()
            .filter(|f| f.count_basic_blocks() > 0)
            .map(|f| f.get_name().to_string_lossy().into_owned())
            .collect();

        let mut natives = vec![];
        for function in module.get_functions() {
            if function.count_basic_blocks() > 0 || function.get_first_use().is_none() {
                continue;
            }
            let name = function.get_name().to_string_lossy().into_owned();
            if own.contains(&name) || self.defined.contains(&name) {
                continue;
            }
            match stdlib::lookup(&name) {
                Some(native) if native.arity() == function.count_params() as usize => {
                    natives.push((function, native))
                }
                Some(native) => {
                    return Err(ExecutionError::CallArity {
                        name,
                        expected: native.arity(),
                        found: function.count_params() as usize,
                    });
                }
                None => return Err(ExecutionError::UnresolvedSymbol(name)),
            }
        }

        for (function, native) in natives {
            self.engine
                .add_global_mapping(&function, native.address());
        }
        Ok(())
    }

    /// Hands `module` to the engine and records its definitions.
    fn load(&mut self, module: Module<'ctx>) -> Result<(), ExecutionError> {
        self.engine
            .add_module(&module)
            .map_err(|_| ExecutionError::Engine("unit is already owned by an engine".to_string()))?;
        for function in module.get_functions() {
            if function.count_basic_blocks() > 0 {
                self.defined
                    .insert(function.get_name().to_string_lossy().into_owned());
            }
        }
        self.loaded.push(module);
        Ok(())
    }

    /// Loads the definitions of a unit whose entry failed to link. The
    /// entry is erased first; if a definition itself calls an unresolved
    /// symbol the whole unit is dropped.
    fn salvage(&mut self, module: Module<'ctx>, entry: &str) -> Result<(), ExecutionError> {
        if let Some(function) = module.get_function(entry) {
            // SAFETY: nothing calls the anonymous entry.
            unsafe { function.delete() }
        }
        if self.link_declarations(&module).is_ok() {
            self.load(module)?;
        }
        Ok(())
    }
}

/// The function whose body contains `user`, when `user` is an instruction.
fn enclosing_function(user: AnyValueEnum<'_>) -> Option<FunctionValue<'_>> {
    let instruction = match user {
        AnyValueEnum::InstructionValue(instruction) => instruction,
        AnyValueEnum::FloatValue(value) => value.as_instruction()?,
        _ => return None,
    };
    instruction.get_parent()?.get_parent()
}

fn builder_error(error: BuilderError) -> CodegenError {
    CodegenError::EmissionFailure(error.to_string())
}

impl<'ctx> Backend for LlvmBackend<'ctx> {
    type Function = FunctionValue<'ctx>;
    type Value = FloatValue<'ctx>;
    type Unit = SealedUnit<'ctx>;

    fn declare_function(
        &mut self,
        name: &str,
        params: &[String],
    ) -> Result<FunctionValue<'ctx>, CodegenError> {
        let f64_type = self.context.f64_type();
        let param_types: Vec<BasicMetadataTypeEnum> = vec![f64_type.into(); params.len()];
        let fn_type = f64_type.fn_type(&param_types, false);

        let function = self.module.add_function(&self.symbol(name), fn_type, None);
        for (param, name) in function.get_param_iter().zip(params) {
            param.into_float_value().set_name(name);
        }
        Ok(function)
    }

    fn lookup_function(&self, name: &str) -> Option<FunctionValue<'ctx>> {
        self.module.get_function(&self.symbol(name))
    }

    fn function_name(&self, function: &FunctionValue<'ctx>) -> String {
        function.get_name().to_string_lossy().into_owned()
    }

    fn param_count(&self, function: &FunctionValue<'ctx>) -> usize {
        function.count_params() as usize
    }

    fn has_body(&self, function: &FunctionValue<'ctx>) -> bool {
        function.count_basic_blocks() > 0
    }

    fn begin_function_body(
        &mut self,
        function: &FunctionValue<'ctx>,
        params: &[String],
    ) -> Result<Vec<(String, FloatValue<'ctx>)>, CodegenError> {
        let entry = self.context.append_basic_block(*function, "entry");
        self.builder.position_at_end(entry);

        Ok(function
            .get_param_iter()
            .zip(params)
            .map(|(param, name)| {
                let value = param.into_float_value();
                value.set_name(name);
                (name.clone(), value)
            })
            .collect())
    }

    fn emit_constant(&mut self, value: f64) -> FloatValue<'ctx> {
        self.context.f64_type().const_float(value)
    }

    fn emit_arithmetic(
        &mut self,
        op: ArithOp,
        lhs: FloatValue<'ctx>,
        rhs: FloatValue<'ctx>,
    ) -> Result<FloatValue<'ctx>, CodegenError> {
        match op {
            ArithOp::Add => self.builder.build_float_add(lhs, rhs, "addtmp"),
            ArithOp::Sub => self.builder.build_float_sub(lhs, rhs, "subtmp"),
            ArithOp::Mul => self.builder.build_float_mul(lhs, rhs, "multmp"),
            ArithOp::Div => self.builder.build_float_div(lhs, rhs, "divtmp"),
        }
        .map_err(builder_error)
    }

    fn emit_comparison(
        &mut self,
        op: CmpOp,
        lhs: FloatValue<'ctx>,
        rhs: FloatValue<'ctx>,
    ) -> Result<FloatValue<'ctx>, CodegenError> {
        let predicate = match op {
            CmpOp::Less => FloatPredicate::ULT,
            CmpOp::Greater => FloatPredicate::UGT,
        };
        let flag = self
            .builder
            .build_float_compare(predicate, lhs, rhs, "cmptmp")
            .map_err(builder_error)?;
        self.builder
            .build_unsigned_int_to_float(flag, self.context.f64_type(), "booltmp")
            .map_err(builder_error)
    }

    fn emit_call(
        &mut self,
        callee: &FunctionValue<'ctx>,
        args: Vec<FloatValue<'ctx>>,
    ) -> Result<FloatValue<'ctx>, CodegenError> {
        let args: Vec<BasicMetadataValueEnum> = args.into_iter().map(Into::into).collect();
        let call = self
            .builder
            .build_call(*callee, &args, "calltmp")
            .map_err(builder_error)?;

        call.try_as_basic_value()
            .left()
            .map(|value| value.into_float_value())
            .ok_or_else(|| CodegenError::EmissionFailure("call produced no value".to_string()))
    }

    fn finalize_function(
        &mut self,
        function: &FunctionValue<'ctx>,
        ret: FloatValue<'ctx>,
    ) -> Result<(), CodegenError> {
        self.builder.build_return(Some(&ret)).map_err(builder_error)?;

        if function.verify(true) {
            Ok(())
        } else {
            Err(CodegenError::EmissionFailure(format!(
                "verification of '{}' failed",
                self.function_name(function)
            )))
        }
    }

    fn is_referenced(&self, function: &FunctionValue<'ctx>) -> bool {
        let mut next = function.get_first_use();
        while let Some(current) = next {
            if enclosing_function(current.get_user()) != Some(*function) {
                return true;
            }
            next = current.get_next_use();
        }
        false
    }

    fn discard_function(&mut self, function: &FunctionValue<'ctx>) {
        self.builder.clear_insertion_position();
        for block in function.get_basic_blocks() {
            // SAFETY: the block belongs to `function` and no handle to it or
            // its instructions outlives this call.
            let _ = unsafe { block.delete() };
        }
        // LLVM requires a function to be use-free before it is erased.
        if function.get_first_use().is_none() {
            // SAFETY: no remaining uses; callers drop the handle.
            unsafe { function.delete() }
        }
    }

    fn dump_function(&self, function: &FunctionValue<'ctx>) -> String {
        function.print_to_string().to_string()
    }

    fn seal_unit(&mut self) -> SealedUnit<'ctx> {
        let entry = self.symbol(ANON_FN_NAME);
        let entry = self.module.get_function(&entry).map(|_| entry);

        let name = self.module.get_name().to_string_lossy().into_owned();
        let module = mem::replace(&mut self.module, self.context.create_module(&name));
        self.sealed += 1;
        SealedUnit { module, entry }
    }

    fn execute(&mut self, unit: SealedUnit<'ctx>, symbol: &str) -> Result<f64, ExecutionError> {
        let entry = if symbol == ANON_FN_NAME {
            unit.entry
                .clone()
                .ok_or_else(|| ExecutionError::MissingEntry(symbol.to_string()))?
        } else {
            symbol.to_string()
        };

        unit.module
            .run_passes(PASS_PIPELINE, &self.machine, PassBuilderOptions::create())
            .map_err(|e| ExecutionError::Engine(e.to_string()))?;
        if let Err(error) = self.link_declarations(&unit.module) {
            self.salvage(unit.module, &entry)?;
            return Err(error);
        }
        self.load(unit.module)?;

        // SAFETY: every emitted function has type double(), matching EntryFn
        // for the zero-parameter anonymous entry.
        let value = unsafe {
            let function = self
                .engine
                .get_function::<EntryFn>(&entry)
                .map_err(|_| ExecutionError::MissingEntry(entry.clone()))?;
            function.call()
        };
        Ok(value)
    }

    fn reopen_unit(&mut self, name: &str) {
        self.module = self.context.create_module(name);
    }
}
