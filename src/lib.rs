pub mod ast;
pub mod codegen;
pub mod diagnostic;
pub mod error;
pub mod interpreter;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod session;
pub mod stdlib;
