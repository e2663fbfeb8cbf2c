//! Emission of AST nodes into a compilation [`Session`](crate::session::Session)
//! through the [`Backend`] collaborator interface.

pub mod expression;
pub mod function;

#[cfg(feature = "llvm")]
pub mod llvm;


pub use expression::emit_expr;

use crate::error::{CodegenError, ExecutionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Ordered comparisons. Backends normalize the result to 1.0 / 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Less,
    Greater,
}

/// Code generator and execution engine, seen from the session.
///
/// Every function and value is the single numeric type (f64). A backend
/// has exactly one open unit at a time; [`Backend::seal_unit`] hands it to
/// the execution engine and [`Backend::reopen_unit`] starts the next one.
pub trait Backend {
    /// Declaration handle for a function in the open unit.
    type Function: Clone + std::fmt::Debug;
    type Value: Clone + std::fmt::Debug;
    type Unit;

    fn declare_function(
        &mut self,
        name: &str,
        params: &[String],
    ) -> Result<Self::Function, CodegenError>;

    /// Looks only at the open unit.
    fn lookup_function(&self, name: &str) -> Option<Self::Function>;

    fn function_name(&self, function: &Self::Function) -> String;

    fn param_count(&self, function: &Self::Function) -> usize;

    fn has_body(&self, function: &Self::Function) -> bool;

    /// Opens the entry block and returns one binding per parameter.
    fn begin_function_body(
        &mut self,
        function: &Self::Function,
        params: &[String],
    ) -> Result<Vec<(String, Self::Value)>, CodegenError>;

    fn emit_constant(&mut self, value: f64) -> Self::Value;

    fn emit_arithmetic(
        &mut self,
        op: ArithOp,
        lhs: Self::Value,
        rhs: Self::Value,
    ) -> Result<Self::Value, CodegenError>;

    fn emit_comparison(
        &mut self,
        op: CmpOp,
        lhs: Self::Value,
        rhs: Self::Value,
    ) -> Result<Self::Value, CodegenError>;

    fn emit_call(
        &mut self,
        callee: &Self::Function,
        args: Vec<Self::Value>,
    ) -> Result<Self::Value, CodegenError>;

    /// Terminates the body with `ret`, then verifies and optimizes it.
    fn finalize_function(
        &mut self,
        function: &Self::Function,
        ret: Self::Value,
    ) -> Result<(), CodegenError>;

    /// Whether a function other than `function` itself calls it in the
    /// open unit.
    fn is_referenced(&self, function: &Self::Function) -> bool;

    /// Drops the body of `function`. The declaration goes with it unless
    /// [`Backend::is_referenced`] holds, in which case it stays bodiless.
    fn discard_function(&mut self, function: &Self::Function);

    /// Textual IR of a declaration or definition in the open unit.
    fn dump_function(&self, function: &Self::Function) -> String;

    fn seal_unit(&mut self) -> Self::Unit;

    fn execute(&mut self, unit: Self::Unit, symbol: &str) -> Result<f64, ExecutionError>;

    fn reopen_unit(&mut self, name: &str);
}
