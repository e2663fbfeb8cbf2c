use std::fmt::{self, Display, Formatter};

pub mod builder;
pub mod engine;
pub mod fold;
pub mod irvalidator;

#[cfg(test)]
pub mod test;

pub use builder::{FunctionRef, IrBackend};
pub use engine::{DEFAULT_MAX_CALL_DEPTH, Engine};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Constant(f64),
    Register(String),
    Argument(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FCmpCond {
    /// unordered or less than
    Ult,
    /// unordered or greater than
    Ugt,
}

impl FCmpCond {
    pub fn holds(&self, lhs: f64, rhs: f64) -> bool {
        let unordered = lhs.is_nan() || rhs.is_nan();
        match self {
            FCmpCond::Ult => unordered || lhs < rhs,
            FCmpCond::Ugt => unordered || lhs > rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    FAdd {
        dest: String,
        lhs: Value,
        rhs: Value,
    },
    FSub {
        dest: String,
        lhs: Value,
        rhs: Value,
    },
    FMul {
        dest: String,
        lhs: Value,
        rhs: Value,
    },
    FDiv {
        dest: String,
        lhs: Value,
        rhs: Value,
    },

    // yields i1; only UIToFP consumes it
    FCmp {
        dest: String,
        cond: FCmpCond,
        lhs: Value,
        rhs: Value,
    },
    UIToFP {
        dest: String,
        value: Value,
    },

    Call {
        dest: String,
        func: String,
        args: Vec<Value>,
    },
}

impl Instruction {
    pub fn dest(&self) -> &str {
        match self {
            Instruction::FAdd { dest, .. }
            | Instruction::FSub { dest, .. }
            | Instruction::FMul { dest, .. }
            | Instruction::FDiv { dest, .. }
            | Instruction::FCmp { dest, .. }
            | Instruction::UIToFP { dest, .. }
            | Instruction::Call { dest, .. } => dest,
        }
    }

    pub fn operands(&self) -> Vec<&Value> {
        match self {
            Instruction::FAdd { lhs, rhs, .. }
            | Instruction::FSub { lhs, rhs, .. }
            | Instruction::FMul { lhs, rhs, .. }
            | Instruction::FDiv { lhs, rhs, .. }
            | Instruction::FCmp { lhs, rhs, .. } => vec![lhs, rhs],
            Instruction::UIToFP { value, .. } => vec![value],
            Instruction::Call { args, .. } => args.iter().collect(),
        }
    }

    pub fn operands_mut(&mut self) -> Vec<&mut Value> {
        match self {
            Instruction::FAdd { lhs, rhs, .. }
            | Instruction::FSub { lhs, rhs, .. }
            | Instruction::FMul { lhs, rhs, .. }
            | Instruction::FDiv { lhs, rhs, .. }
            | Instruction::FCmp { lhs, rhs, .. } => vec![lhs, rhs],
            Instruction::UIToFP { value, .. } => vec![value],
            Instruction::Call { args, .. } => args.iter_mut().collect(),
        }
    }

    /// Evaluates a non-call instruction given a way to read its operands.
    /// Returns `None` for calls or when an operand cannot be read.
    pub fn evaluate(&self, read: impl Fn(&Value) -> Option<f64>) -> Option<f64> {
        let value = match self {
            Instruction::FAdd { lhs, rhs, .. } => read(lhs)? + read(rhs)?,
            Instruction::FSub { lhs, rhs, .. } => read(lhs)? - read(rhs)?,
            Instruction::FMul { lhs, rhs, .. } => read(lhs)? * read(rhs)?,
            Instruction::FDiv { lhs, rhs, .. } => read(lhs)? / read(rhs)?,
            Instruction::FCmp { cond, lhs, rhs, .. } => {
                if cond.holds(read(lhs)?, read(rhs)?) {
                    1.0
                } else {
                    0.0
                }
            }
            Instruction::UIToFP { value, .. } => read(value)?,
            Instruction::Call { .. } => return None,
        };
        Some(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Ret { value: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub label: String,
    pub instructions: Vec<Instruction>,
    pub terminator: Option<Terminator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    /// Empty for a declaration.
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn entry(&self) -> Option<&BasicBlock> {
        self.blocks.first()
    }
}

/// One compilation unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new(name: &str) -> Self {
        Module {
            name: name.to_string(),
            functions: Vec::new(),
        }
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn get_function_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.functions.iter_mut().find(|f| f.name == name)
    }

    pub fn remove_function(&mut self, name: &str) -> Option<Function> {
        let index = self.functions.iter().position(|f| f.name == name)?;
        Some(self.functions.remove(index))
    }
}

// Display implementations

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Constant(c) => write!(f, "{:.6}", c),
            Value::Register(name) => write!(f, "%{}", name),
            Value::Argument(name) => write!(f, "%{}", name),
        }
    }
}

impl Display for FCmpCond {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            FCmpCond::Ult => "ult",
            FCmpCond::Ugt => "ugt",
        };
        write!(f, "{}", s)
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::FAdd { dest, lhs, rhs } => {
                write!(f, "  %{} = fadd double {}, {}", dest, lhs, rhs)
            }
            Instruction::FSub { dest, lhs, rhs } => {
                write!(f, "  %{} = fsub double {}, {}", dest, lhs, rhs)
            }
            Instruction::FMul { dest, lhs, rhs } => {
                write!(f, "  %{} = fmul double {}, {}", dest, lhs, rhs)
            }
            Instruction::FDiv { dest, lhs, rhs } => {
                write!(f, "  %{} = fdiv double {}, {}", dest, lhs, rhs)
            }
            Instruction::FCmp {
                dest,
                cond,
                lhs,
                rhs,
            } => {
                write!(f, "  %{} = fcmp {} double {}, {}", dest, cond, lhs, rhs)
            }
            Instruction::UIToFP { dest, value } => {
                write!(f, "  %{} = uitofp i1 {} to double", dest, value)
            }
            Instruction::Call { dest, func, args } => {
                write!(f, "  %{} = call double @{}(", dest, func)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "double {}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Display for Terminator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Ret { value } => write!(f, "  ret double {}", value),
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let keyword = if self.is_declaration() {
            "declare"
        } else {
            "define"
        };
        write!(f, "{} double @{}(", keyword, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "double %{}", param)?;
        }
        write!(f, ")")?;

        if self.is_declaration() {
            return writeln!(f);
        }

        writeln!(f, " {{")?;
        for block in &self.blocks {
            writeln!(f, "{}:", block.label)?;
            for instruction in &block.instructions {
                writeln!(f, "{}", instruction)?;
            }
            if let Some(terminator) = &block.terminator {
                writeln!(f, "{}", terminator)?;
            }
        }
        writeln!(f, "}}")
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        for function in &self.functions {
            writeln!(f)?;
            write!(f, "{}", function)?;
        }
        Ok(())
    }
}
