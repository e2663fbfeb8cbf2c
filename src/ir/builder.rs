use super::fold::fold_constants;
use super::irvalidator::IRValidator;
use super::*;
use crate::codegen::{ArithOp, Backend, CmpOp};
use crate::error::{CodegenError, ExecutionError};

use std::mem;

/// Handle to a function in the open unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef {
    pub name: String,
    pub arity: usize,
}

/// Builds [`Module`]s and runs them on the in-process [`Engine`].
pub struct IrBackend {
    module: Module,
    current_function: Option<String>,
    register_counter: usize,
    engine: Engine,
}

impl Default for IrBackend {
    fn default() -> Self {
        IrBackend::new(DEFAULT_MAX_CALL_DEPTH)
    }
}

impl IrBackend {
    pub fn new(max_call_depth: usize) -> Self {
        IrBackend {
            module: Module::default(),
            current_function: None,
            register_counter: 0,
            engine: Engine::new(max_call_depth),
        }
    }

    /// The open unit.
    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    fn new_register(&mut self, prefix: &str) -> String {
        self.register_counter += 1;
        format!("{}{}", prefix, self.register_counter)
    }

    fn add_instruction(&mut self, instruction: Instruction) -> Result<Value, CodegenError> {
        let dest = Value::Register(instruction.dest().to_string());
        let block = self
            .current_function
            .as_deref()
            .and_then(|name| self.module.get_function_mut(name))
            .and_then(|function| function.blocks.last_mut())
            .ok_or_else(|| {
                CodegenError::EmissionFailure("no insertion point for instruction".to_string())
            })?;

        block.instructions.push(instruction);
        Ok(dest)
    }

    fn function_mut(&mut self, name: &str) -> Result<&mut Function, CodegenError> {
        self.module
            .get_function_mut(name)
            .ok_or_else(|| CodegenError::EmissionFailure(format!("@{} is not in the open unit", name)))
    }
}

impl Backend for IrBackend {
    type Function = FunctionRef;
    type Value = Value;
    type Unit = Module;

    fn declare_function(
        &mut self,
        name: &str,
        params: &[String],
    ) -> Result<FunctionRef, CodegenError> {
        if self.module.get_function(name).is_some() {
            return Err(CodegenError::EmissionFailure(format!(
                "@{} is already declared in the open unit",
                name
            )));
        }

        self.module.functions.push(Function {
            name: name.to_string(),
            params: params.to_vec(),
            blocks: Vec::new(),
        });

        Ok(FunctionRef {
            name: name.to_string(),
            arity: params.len(),
        })
    }

    fn lookup_function(&self, name: &str) -> Option<FunctionRef> {
        self.module.get_function(name).map(|function| FunctionRef {
            name: function.name.clone(),
            arity: function.params.len(),
        })
    }

    fn function_name(&self, function: &FunctionRef) -> String {
        function.name.clone()
    }

    fn param_count(&self, function: &FunctionRef) -> usize {
        function.arity
    }

    fn has_body(&self, function: &FunctionRef) -> bool {
        self.module
            .get_function(&function.name)
            .is_some_and(|function| !function.is_declaration())
    }

    fn begin_function_body(
        &mut self,
        function: &FunctionRef,
        params: &[String],
    ) -> Result<Vec<(String, Value)>, CodegenError> {
        let target = self.function_mut(&function.name)?;
        // the definition's parameter names win over the declaration's
        target.params = params.to_vec();
        target.blocks.push(BasicBlock {
            label: "entry".to_string(),
            instructions: Vec::new(),
            terminator: None,
        });

        self.current_function = Some(function.name.clone());
        self.register_counter = 0;

        Ok(params
            .iter()
            .map(|param| (param.clone(), Value::Argument(param.clone())))
            .collect())
    }

    fn emit_constant(&mut self, value: f64) -> Value {
        Value::Constant(value)
    }

    fn emit_arithmetic(
        &mut self,
        op: ArithOp,
        lhs: Value,
        rhs: Value,
    ) -> Result<Value, CodegenError> {
        let instruction = match op {
            ArithOp::Add => Instruction::FAdd {
                dest: self.new_register("addtmp"),
                lhs,
                rhs,
            },
            ArithOp::Sub => Instruction::FSub {
                dest: self.new_register("subtmp"),
                lhs,
                rhs,
            },
            ArithOp::Mul => Instruction::FMul {
                dest: self.new_register("multmp"),
                lhs,
                rhs,
            },
            ArithOp::Div => Instruction::FDiv {
                dest: self.new_register("divtmp"),
                lhs,
                rhs,
            },
        };
        self.add_instruction(instruction)
    }

    fn emit_comparison(
        &mut self,
        op: CmpOp,
        lhs: Value,
        rhs: Value,
    ) -> Result<Value, CodegenError> {
        let cond = match op {
            CmpOp::Less => FCmpCond::Ult,
            CmpOp::Greater => FCmpCond::Ugt,
        };
        let dest = self.new_register("cmptmp");
        let flag = self.add_instruction(Instruction::FCmp {
            dest,
            cond,
            lhs,
            rhs,
        })?;

        let dest = self.new_register("booltmp");
        self.add_instruction(Instruction::UIToFP { dest, value: flag })
    }

    fn emit_call(
        &mut self,
        callee: &FunctionRef,
        args: Vec<Value>,
    ) -> Result<Value, CodegenError> {
        let dest = self.new_register("calltmp");
        self.add_instruction(Instruction::Call {
            dest,
            func: callee.name.clone(),
            args,
        })
    }

    fn finalize_function(&mut self, function: &FunctionRef, ret: Value) -> Result<(), CodegenError> {
        self.current_function = None;

        let target = self.function_mut(&function.name)?;
        match target.blocks.last_mut() {
            Some(block) => block.terminator = Some(Terminator::Ret { value: ret }),
            None => {
                return Err(CodegenError::EmissionFailure(format!(
                    "@{} has no body to terminate",
                    function.name
                )));
            }
        }

        let target = self.module.get_function(&function.name);
        if let Some(target) = target {
            IRValidator::validate_function(&self.module, target)
                .map_err(|errors| CodegenError::EmissionFailure(errors.join("; ")))?;
        }

        fold_constants(self.function_mut(&function.name)?);
        Ok(())
    }

    fn is_referenced(&self, function: &FunctionRef) -> bool {
        self.module
            .functions
            .iter()
            .filter(|caller| caller.name != function.name)
            .flat_map(|caller| &caller.blocks)
            .flat_map(|block| &block.instructions)
            .any(|instruction| {
                matches!(instruction, Instruction::Call { func, .. } if *func == function.name)
            })
    }

    fn discard_function(&mut self, function: &FunctionRef) {
        if self.current_function.as_deref() == Some(function.name.as_str()) {
            self.current_function = None;
        }
        if !self.is_referenced(function) {
            self.module.remove_function(&function.name);
        } else if let Some(declaration) = self.module.get_function_mut(&function.name) {
            declaration.blocks.clear();
        }
    }

    fn dump_function(&self, function: &FunctionRef) -> String {
        self.module
            .get_function(&function.name)
            .map(|function| function.to_string())
            .unwrap_or_default()
    }

    fn seal_unit(&mut self) -> Module {
        self.current_function = None;
        mem::take(&mut self.module)
    }

    fn execute(&mut self, unit: Module, symbol: &str) -> Result<f64, ExecutionError> {
        self.engine.load(unit);
        let result = self.engine.run(symbol);
        self.engine.unload_symbol(symbol);
        result
    }

    fn reopen_unit(&mut self, name: &str) {
        self.module = Module::new(name);
        self.register_counter = 0;
    }
}
