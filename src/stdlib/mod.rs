//! Host functions an `extern` declaration can bind to when no
//! user definition of the same name exists.

pub mod io;
pub mod math;

use crate::error::ExecutionError;

pub type UnaryFn = extern "C" fn(f64) -> f64;
pub type BinaryFn = extern "C" fn(f64, f64) -> f64;

#[derive(Debug, Clone, Copy)]
pub enum NativeFn {
    Unary(UnaryFn),
    Binary(BinaryFn),
}

#[derive(Debug, Clone, Copy)]
pub struct Native {
    pub name: &'static str,
    pub func: NativeFn,
}

impl Native {
    pub fn arity(&self) -> usize {
        match self.func {
            NativeFn::Unary(_) => 1,
            NativeFn::Binary(_) => 2,
        }
    }

    pub fn call(&self, args: &[f64]) -> Result<f64, ExecutionError> {
        match (self.func, args) {
            (NativeFn::Unary(f), [x]) => Ok(f(*x)),
            (NativeFn::Binary(f), [x, y]) => Ok(f(*x, *y)),
            _ => Err(ExecutionError::CallArity {
                name: self.name.to_string(),
                expected: self.arity(),
                found: args.len(),
            }),
        }
    }

    /// Entry address, for engines that link natives by pointer.
    pub fn address(&self) -> usize {
        match self.func {
            NativeFn::Unary(f) => f as usize,
            NativeFn::Binary(f) => f as usize,
        }
    }
}

pub fn natives() -> impl Iterator<Item = &'static Native> {
    math::NATIVES.iter().chain(io::NATIVES.iter())
}

pub fn lookup(name: &str) -> Option<Native> {
    natives().find(|native| native.name == name).copied()
}
