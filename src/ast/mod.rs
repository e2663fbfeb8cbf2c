use std::fmt::{self, Display, Formatter};
use std::ops::Range;

pub type Span = Range<usize>;

/// Reserved prototype name given to bare top-level expressions.
pub const ANON_FN_NAME: &str = "__anon_expr";

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),

    Variable(String),

    Binary {
        op: char,
        lhs: Box<(Expr, Span)>,
        rhs: Box<(Expr, Span)>,
    },

    Call {
        callee: String,
        args: Vec<(Expr, Span)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    pub name: String,
    pub params: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub prototype: Prototype,
    pub body: (Expr, Span),
}

impl Prototype {
    pub fn is_anonymous(&self) -> bool {
        self.name == ANON_FN_NAME
    }
}

// s-expression form, used by diagnostics and tests
impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(value) => write!(f, "{}", value),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", op, lhs.0, rhs.0),
            Expr::Call { callee, args } => {
                write!(f, "(call {}", callee)?;
                for (arg, _) in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Display for Prototype {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(", "))
    }
}
