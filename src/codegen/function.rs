use crate::ast::{Function, Prototype};
use crate::codegen::{Backend, emit_expr};
use crate::error::CodegenError;
use crate::session::Session;

use std::collections::HashSet;

impl Prototype {
    /// Materializes a callable declaration for this prototype in the open unit.
    ///
    /// An existing declaration with the same arity is reused. A bodiless one
    /// with a different arity is replaced unless something still calls it;
    /// a defined one is never touched.
    pub fn emit<B: Backend>(&self, session: &mut Session<B>) -> Result<B::Function, CodegenError> {
        self.check_params()?;

        let backend = &mut session.backend;
        if let Some(existing) = backend.lookup_function(&self.name) {
            if backend.param_count(&existing) == self.params.len() {
                return Ok(existing);
            }
            if backend.has_body(&existing) {
                return Err(CodegenError::Redefinition {
                    name: self.name.clone(),
                    span: self.span.clone(),
                });
            }
            self.replace(backend, &existing)?;
        }
        backend.declare_function(&self.name, &self.params)
    }

    /// Drops a bodiless declaration whose arity differs from this prototype.
    fn replace<B: Backend>(
        &self,
        backend: &mut B,
        existing: &B::Function,
    ) -> Result<(), CodegenError> {
        if backend.is_referenced(existing) {
            return Err(CodegenError::DeclarationInUse {
                name: self.name.clone(),
                arity: backend.param_count(existing),
                span: self.span.clone(),
            });
        }
        backend.discard_function(existing);
        Ok(())
    }

    fn check_params(&self) -> Result<(), CodegenError> {
        let mut seen = HashSet::new();
        match self.params.iter().find(|param| !seen.insert(param.as_str())) {
            Some(param) => Err(CodegenError::DuplicateParameter {
                function: self.name.clone(),
                param: param.clone(),
                span: self.span.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Function {
    /// Emits the definition into the open unit.
    ///
    /// On any failure after the declaration exists its body is discarded.
    /// The declaration itself survives only while other functions call it.
    pub fn emit<B: Backend>(&self, session: &mut Session<B>) -> Result<B::Function, CodegenError> {
        let prototype = &self.prototype;
        prototype.check_params()?;

        let declaration = match session.backend.lookup_function(&prototype.name) {
            Some(existing) if session.backend.has_body(&existing) => {
                return Err(CodegenError::Redefinition {
                    name: prototype.name.clone(),
                    span: prototype.span.clone(),
                });
            }
            Some(existing) if session.backend.param_count(&existing) == prototype.params.len() => {
                existing
            }
            Some(existing) => {
                prototype.replace(&mut session.backend, &existing)?;
                session
                    .backend
                    .declare_function(&prototype.name, &prototype.params)?
            }
            None => session
                .backend
                .declare_function(&prototype.name, &prototype.params)?,
        };

        let result = self.emit_body(session, &declaration);
        session.named_values.clear();

        match result {
            Ok(()) => Ok(declaration),
            Err(error) => {
                session.backend.discard_function(&declaration);
                Err(error)
            }
        }
    }

    fn emit_body<B: Backend>(
        &self,
        session: &mut Session<B>,
        declaration: &B::Function,
    ) -> Result<(), CodegenError> {
        let bindings = session
            .backend
            .begin_function_body(declaration, &self.prototype.params)?;
        // replaced, never merged
        session.named_values = bindings.into_iter().collect();

        let ret = emit_expr(session, &self.body)?;
        session.backend.finalize_function(declaration, ret)
    }
}
