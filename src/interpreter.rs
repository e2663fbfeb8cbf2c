//! Statement-at-a-time driver tying the parser to a [`Session`].

use crate::ast::{Function, Prototype};
use crate::codegen::Backend;
use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::parser::{Parser, Statement};
use crate::session::{Session, SessionConfig};

use std::fmt::{self, Display, Formatter};

/// What one handled statement produced. `ir` is filled only when the
/// session is configured to print IR.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Defined { name: String, ir: Option<String> },
    Declared { name: String, ir: Option<String> },
    Evaluated { value: f64, ir: Option<String> },
    /// Details went to the diagnostics sink.
    Failed,
}

impl Outcome {
    /// Emitted IR with a leading comment naming the statement kind.
    pub fn ir_listing(&self) -> Option<String> {
        let (header, ir) = match self {
            Outcome::Defined { ir, .. } => ("; parsed a function definition", ir),
            Outcome::Declared { ir, .. } => ("; parsed an external", ir),
            Outcome::Evaluated { ir, .. } => ("; parsed a top-level", ir),
            Outcome::Failed => return None,
        };
        ir.as_ref().map(|ir| format!("{}\n{}", header, ir))
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Defined { .. } => write!(f, "Parsed a function definition."),
            Outcome::Declared { .. } => write!(f, "Read an extern."),
            Outcome::Evaluated { value, .. } => write!(f, "Evaluated to {}", value),
            Outcome::Failed => Ok(()),
        }
    }
}

pub struct Interpreter<B: Backend> {
    session: Session<B>,
    diagnostics: Diagnostics,
}

impl<B: Backend> Interpreter<B> {
    pub fn new(backend: B, config: SessionConfig) -> Self {
        Interpreter {
            session: Session::new(backend, config),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn session(&self) -> &Session<B> {
        &self.session
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Hands over everything reported so far. Spans point into the source
    /// the reporting statements were parsed from.
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Drives one statement. Returns `None` once the parser is exhausted.
    pub fn run(&mut self, parser: &mut Parser<'_>) -> Option<Outcome> {
        match parser.parse_one_statement() {
            Statement::EndOfInput => None,
            statement => Some(self.handle(statement)),
        }
    }

    /// Drives every statement of `source` through the same session.
    pub fn run_to_end(&mut self, source: &str) -> Vec<Outcome> {
        let mut parser = Parser::new(source);
        let mut outcomes = vec![];
        while let Some(outcome) = self.run(&mut parser) {
            outcomes.push(outcome);
        }
        outcomes
    }

    pub fn handle(&mut self, statement: Statement) -> Outcome {
        match statement {
            Statement::Definition(function) => self.handle_definition(&function),
            Statement::External(prototype) => self.handle_extern(&prototype),
            Statement::TopLevelExpr(function) => self.handle_top_level(&function),
            Statement::Error(error) => {
                self.diagnostics.push(Diagnostic::from(&error));
                Outcome::Failed
            }
            Statement::EndOfInput => Outcome::Failed,
        }
    }

    fn handle_definition(&mut self, function: &Function) -> Outcome {
        match self.session.define(function) {
            Ok(handle) => Outcome::Defined {
                name: function.prototype.name.clone(),
                ir: self.dump(&handle),
            },
            Err(error) => {
                self.diagnostics.push(Diagnostic::from(&error));
                Outcome::Failed
            }
        }
    }

    fn handle_extern(&mut self, prototype: &Prototype) -> Outcome {
        match self.session.declare(prototype) {
            Ok(handle) => Outcome::Declared {
                name: prototype.name.clone(),
                ir: self.dump(&handle),
            },
            Err(error) => {
                self.diagnostics.push(Diagnostic::from(&error));
                Outcome::Failed
            }
        }
    }

    fn handle_top_level(&mut self, function: &Function) -> Outcome {
        let handle = match self.session.emit_top_level(function) {
            Ok(handle) => handle,
            Err(error) => {
                self.diagnostics.push(Diagnostic::from(&error));
                return Outcome::Failed;
            }
        };
        // dumped before sealing; the unit is gone afterwards
        let ir = self.dump(&handle);

        match self.session.run_top_level(&function.prototype.name) {
            Ok(value) => Outcome::Evaluated { value, ir },
            Err(error) => {
                self.diagnostics
                    .push(Diagnostic::execution(&error, function.body.1.clone()));
                Outcome::Failed
            }
        }
    }

    fn dump(&self, handle: &B::Function) -> Option<String> {
        self.session
            .config()
            .print_ir
            .then(|| self.session.backend().dump_function(handle))
    }
}
