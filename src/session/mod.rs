
use crate::ast::{Function, Prototype};
use crate::codegen::Backend;
use crate::error::{CodegenError, ExecutionError, SessionError};

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name given to every freshly opened unit.
    pub module_name: String,
    pub print_ir: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            module_name: "my cool jit".to_string(),
            print_ir: false,
        }
    }
}

/// Symbol tables bound to one backend for the lifetime of a driving loop.
pub struct Session<B: Backend> {
    pub(crate) backend: B,
    /// Parameter bindings of the function being emitted, if any.
    pub(crate) named_values: HashMap<String, B::Value>,
    /// Forward-declaration table; outlives every unit.
    prototypes: HashMap<String, Prototype>,
    config: SessionConfig,
    sealed_units: usize,
}

impl<B: Backend> Session<B> {
    pub fn new(mut backend: B, config: SessionConfig) -> Self {
        backend.reopen_unit(&config.module_name);
        Session {
            backend,
            named_values: HashMap::new(),
            prototypes: HashMap::new(),
            config,
            sealed_units: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn prototype(&self, name: &str) -> Option<&Prototype> {
        self.prototypes.get(name)
    }

    pub fn sealed_units(&self) -> usize {
        self.sealed_units
    }

    /// Resolves a callee: first the open unit, then the forward-declaration
    /// table, materializing the stored prototype into the open unit.
    pub fn get_function(&mut self, name: &str) -> Result<Option<B::Function>, CodegenError> {
        if let Some(function) = self.backend.lookup_function(name) {
            return Ok(Some(function));
        }

        match self.prototypes.get(name).cloned() {
            Some(prototype) => prototype.emit(self).map(Some),
            None => Ok(None),
        }
    }

    pub fn define(&mut self, function: &Function) -> Result<B::Function, CodegenError> {
        let declaration = function.emit(self)?;
        if !function.prototype.is_anonymous() {
            self.prototypes.insert(
                function.prototype.name.clone(),
                function.prototype.clone(),
            );
        }
        Ok(declaration)
    }

    pub fn declare(&mut self, prototype: &Prototype) -> Result<B::Function, CodegenError> {
        let declaration = prototype.emit(self)?;
        self.prototypes
            .insert(prototype.name.clone(), prototype.clone());
        Ok(declaration)
    }

    /// Emits an anonymous top-level expression into the open unit.
    /// Its prototype never enters the forward-declaration table.
    pub fn emit_top_level(&mut self, function: &Function) -> Result<B::Function, CodegenError> {
        function.emit(self)
    }

    /// Seals the open unit, runs `symbol` from it, and opens a fresh unit.
    /// The new unit is opened whether or not execution succeeds.
    pub fn run_top_level(&mut self, symbol: &str) -> Result<f64, ExecutionError> {
        let unit = self.backend.seal_unit();
        self.sealed_units += 1;

        let result = self.backend.execute(unit, symbol);
        self.backend.reopen_unit(&self.config.module_name);
        result
    }

    pub fn evaluate(&mut self, function: &Function) -> Result<f64, SessionError> {
        self.emit_top_level(function)?;
        Ok(self.run_top_level(&function.prototype.name)?)
    }
}
