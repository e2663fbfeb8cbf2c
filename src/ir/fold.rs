use super::*;

use std::collections::HashMap;

/// Folds instructions whose operands are all constants, rewriting their
/// uses. Calls are never folded. Returns the number of instructions removed.
pub fn fold_constants(function: &mut Function) -> usize {
    let mut known: HashMap<String, f64> = HashMap::new();
    let mut folded = 0;

    for block in &mut function.blocks {
        let mut kept = Vec::with_capacity(block.instructions.len());

        for mut instruction in block.instructions.drain(..) {
            for operand in instruction.operands_mut() {
                substitute(operand, &known);
            }

            let value = instruction.evaluate(|operand| match operand {
                Value::Constant(c) => Some(*c),
                _ => None,
            });

            match value {
                Some(value) => {
                    known.insert(instruction.dest().to_string(), value);
                    folded += 1;
                }
                None => kept.push(instruction),
            }
        }

        block.instructions = kept;

        if let Some(Terminator::Ret { value }) = &mut block.terminator {
            substitute(value, &known);
        }
    }

    folded
}

fn substitute(operand: &mut Value, known: &HashMap<String, f64>) {
    if let Value::Register(reg) = operand {
        if let Some(c) = known.get(reg) {
            *operand = Value::Constant(*c);
        }
    }
}
