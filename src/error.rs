use thiserror::Error;

use crate::ast::Span;
use crate::lexer::Token;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: Token,
        span: Span,
    },
    #[error("unrecognized input '{text}' while expecting {expected}")]
    LexicalAnomaly {
        expected: &'static str,
        text: String,
        span: Span,
    },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } | ParseError::LexicalAnomaly { span, .. } => {
                span.clone()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    #[error("unknown variable name '{name}'")]
    UnknownVariable { name: String, span: Span },
    #[error("unknown function referenced '{name}'")]
    UnknownFunction { name: String, span: Span },
    #[error("function '{name}' takes {expected} argument(s) but {found} were supplied")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    #[error("unknown binary operator '{op}'")]
    UnknownOperator { op: char, span: Span },
    #[error("function '{name}' cannot be redefined")]
    Redefinition { name: String, span: Span },
    #[error("parameter '{param}' appears more than once in '{function}'")]
    DuplicateParameter {
        function: String,
        param: String,
        span: Span,
    },
    #[error("'{name}' is still called with {arity} argument(s) and cannot be redeclared")]
    DeclarationInUse {
        name: String,
        arity: usize,
        span: Span,
    },
    #[error("emission failed: {0}")]
    EmissionFailure(String),
}

impl CodegenError {
    pub fn span(&self) -> Option<Span> {
        match self {
            CodegenError::UnknownVariable { span, .. }
            | CodegenError::UnknownFunction { span, .. }
            | CodegenError::ArityMismatch { span, .. }
            | CodegenError::UnknownOperator { span, .. }
            | CodegenError::Redefinition { span, .. }
            | CodegenError::DuplicateParameter { span, .. }
            | CodegenError::DeclarationInUse { span, .. } => Some(span.clone()),
            CodegenError::EmissionFailure(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("symbol '{0}' has no executable definition")]
    UnresolvedSymbol(String),
    #[error("'{name}' takes {expected} argument(s) but was called with {found}")]
    CallArity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("call depth exceeded {0} frames")]
    StackOverflow(usize),
    #[error("entry symbol '{0}' is missing from the sealed unit")]
    MissingEntry(String),
    #[error("execution engine failure: {0}")]
    Engine(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Codegen(#[from] CodegenError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}
