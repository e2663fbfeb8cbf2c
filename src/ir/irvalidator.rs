use super::*;

use std::collections::HashSet;

pub struct IRValidator;

impl IRValidator {
    pub fn validate_module(module: &Module) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for function in &module.functions {
            if let Err(mut func_errors) = Self::validate_function(module, function) {
                errors.append(&mut func_errors);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Checks a definition against the unit it lives in. Declarations
    /// always pass.
    pub fn validate_function(module: &Module, function: &Function) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let name = &function.name;

        let mut params = HashSet::new();
        for param in &function.params {
            if !params.insert(param.as_str()) {
                errors.push(format!("@{}: parameter %{} declared twice", name, param));
            }
        }

        let mut defined: HashSet<&str> = HashSet::new();
        for block in &function.blocks {
            for instruction in &block.instructions {
                for operand in instruction.operands() {
                    Self::check_operand(name, operand, &params, &defined, &mut errors);
                }

                if let Instruction::Call { func, args, .. } = instruction {
                    match module.get_function(func) {
                        Some(callee) if callee.params.len() != args.len() => errors.push(format!(
                            "@{}: call to @{} passes {} argument(s), expected {}",
                            name,
                            func,
                            args.len(),
                            callee.params.len()
                        )),
                        Some(_) => {}
                        None => errors.push(format!(
                            "@{}: call to @{} which is not declared in this unit",
                            name, func
                        )),
                    }
                }

                let dest = instruction.dest();
                if params.contains(dest) || !defined.insert(dest) {
                    errors.push(format!("@{}: %{} assigned more than once", name, dest));
                }
            }

            match &block.terminator {
                Some(Terminator::Ret { value }) => {
                    Self::check_operand(name, value, &params, &defined, &mut errors)
                }
                None => errors.push(format!(
                    "@{}: block '{}' has no terminator",
                    name, block.label
                )),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn check_operand(
        function: &str,
        operand: &Value,
        params: &HashSet<&str>,
        defined: &HashSet<&str>,
        errors: &mut Vec<String>,
    ) {
        match operand {
            Value::Constant(_) => {}
            Value::Argument(arg) if !params.contains(arg.as_str()) => {
                errors.push(format!("@{}: %{} is not a parameter", function, arg))
            }
            Value::Register(reg) if !defined.contains(reg.as_str()) => {
                errors.push(format!("@{}: %{} used before definition", function, reg))
            }
            _ => {}
        }
    }
}
