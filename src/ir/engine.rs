use super::*;
use crate::error::ExecutionError;
use crate::stdlib::{self, Native};

use std::collections::HashMap;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;

/// Interprets sealed units. A loaded unit stays resident while it holds a
/// body, so later units can call the definitions in it.
#[derive(Debug)]
pub struct Engine {
    units: Vec<Module>,
    max_call_depth: usize,
}

enum Callee<'a> {
    Defined { unit: usize, function: &'a Function },
    Native(Native),
}

impl Engine {
    pub fn new(max_call_depth: usize) -> Self {
        Engine {
            units: Vec::new(),
            max_call_depth,
        }
    }

    pub fn units(&self) -> &[Module] {
        &self.units
    }

    pub fn load(&mut self, unit: Module) {
        self.units.push(unit);
    }

    /// Drops `symbol` from the most recently loaded unit that defines it.
    /// A unit left without any function body is dropped with it.
    pub fn unload_symbol(&mut self, symbol: &str) {
        let Some(index) = self
            .units
            .iter()
            .rposition(|unit| unit.get_function(symbol).is_some())
        else {
            return;
        };

        let unit = &mut self.units[index];
        unit.remove_function(symbol);
        if unit.functions.iter().all(Function::is_declaration) {
            self.units.remove(index);
        }
    }

    /// Runs the zero-argument entry `symbol` of the most recently loaded unit.
    pub fn run(&self, symbol: &str) -> Result<f64, ExecutionError> {
        let unit = self
            .units
            .len()
            .checked_sub(1)
            .ok_or_else(|| ExecutionError::MissingEntry(symbol.to_string()))?;

        let function = self.units[unit]
            .get_function(symbol)
            .filter(|function| !function.is_declaration())
            .ok_or_else(|| ExecutionError::MissingEntry(symbol.to_string()))?;

        let mut stack = Vec::new();
        self.push_frame(&mut stack, unit, function, &[])?;
        self.interpret(stack)
    }

    /// Resolution order: the caller's own unit, then the newest unit holding
    /// a body for `name`, then the host natives.
    fn resolve(&self, caller: usize, name: &str) -> Option<Callee<'_>> {
        let defined_in = |unit: usize| {
            self.units[unit]
                .get_function(name)
                .filter(|function| !function.is_declaration())
                .map(|function| Callee::Defined { unit, function })
        };

        defined_in(caller)
            .or_else(|| (0..self.units.len()).rev().find_map(defined_in))
            .or_else(|| stdlib::lookup(name).map(Callee::Native))
    }

    fn push_frame<'a>(
        &self,
        stack: &mut Vec<Frame<'a>>,
        unit: usize,
        function: &'a Function,
        args: &[f64],
    ) -> Result<(), ExecutionError> {
        if stack.len() >= self.max_call_depth {
            return Err(ExecutionError::StackOverflow(self.max_call_depth));
        }
        if function.params.len() != args.len() {
            return Err(ExecutionError::CallArity {
                name: function.name.clone(),
                expected: function.params.len(),
                found: args.len(),
            });
        }

        let block = function
            .entry()
            .ok_or_else(|| ExecutionError::UnresolvedSymbol(function.name.clone()))?;

        stack.push(Frame {
            unit,
            function,
            block,
            arguments: function
                .params
                .iter()
                .map(String::as_str)
                .zip(args.iter().copied())
                .collect(),
            registers: HashMap::new(),
            next: 0,
        });
        Ok(())
    }

    /// Frames live on the heap so recursion depth is bounded by
    /// `max_call_depth` alone, never by the host thread's stack.
    fn interpret<'a>(&'a self, mut stack: Vec<Frame<'a>>) -> Result<f64, ExecutionError> {
        let mut returned: Option<f64> = None;

        while let Some(frame) = stack.last_mut() {
            let block = frame.block;

            // the call awaiting this value sits at `next`
            if let Some(value) = returned.take() {
                let dest = block.instructions[frame.next].dest();
                frame.registers.insert(dest, value);
                frame.next += 1;
            }

            let Some(instruction) = block.instructions.get(frame.next) else {
                let value = frame.ret()?;
                stack.pop();
                if stack.is_empty() {
                    return Ok(value);
                }
                returned = Some(value);
                continue;
            };

            let result = match instruction {
                Instruction::Call { func, args, .. } => {
                    let values = args
                        .iter()
                        .map(|arg| frame.read(arg).ok_or_else(|| frame.undefined(arg)))
                        .collect::<Result<Vec<_>, _>>()?;

                    match self.resolve(frame.unit, func) {
                        Some(Callee::Defined { unit, function }) => {
                            self.push_frame(&mut stack, unit, function, &values)?;
                            continue;
                        }
                        Some(Callee::Native(native)) => native.call(&values)?,
                        None => return Err(ExecutionError::UnresolvedSymbol(func.clone())),
                    }
                }
                _ => instruction.evaluate(|value| frame.read(value)).ok_or_else(|| {
                    ExecutionError::Engine(format!(
                        "@{}: operands of %{} are undefined",
                        frame.function.name,
                        instruction.dest()
                    ))
                })?,
            };

            frame.registers.insert(instruction.dest(), result);
            frame.next += 1;
        }

        Err(ExecutionError::Engine("call stack emptied without a return".to_string()))
    }
}

/// One activation of a function body.
struct Frame<'a> {
    unit: usize,
    function: &'a Function,
    block: &'a BasicBlock,
    arguments: HashMap<&'a str, f64>,
    registers: HashMap<&'a str, f64>,
    next: usize,
}

impl<'a> Frame<'a> {
    fn read(&self, value: &Value) -> Option<f64> {
        match value {
            Value::Constant(c) => Some(*c),
            Value::Argument(name) => self.arguments.get(name.as_str()).copied(),
            Value::Register(name) => self.registers.get(name.as_str()).copied(),
        }
    }

    fn ret(&self) -> Result<f64, ExecutionError> {
        match &self.block.terminator {
            Some(Terminator::Ret { value }) => {
                self.read(value).ok_or_else(|| self.undefined(value))
            }
            None => Err(ExecutionError::Engine(format!(
                "@{}: block '{}' has no terminator",
                self.function.name, self.block.label
            ))),
        }
    }

    fn undefined(&self, value: &Value) -> ExecutionError {
        ExecutionError::Engine(format!("@{}: {} is undefined", self.function.name, value))
    }
}
