use crate::ast::{Expr, Span};
use crate::codegen::{ArithOp, Backend, CmpOp};
use crate::error::CodegenError;
use crate::session::Session;

pub fn emit_expr<B: Backend>(
    session: &mut Session<B>,
    (expr, span): &(Expr, Span),
) -> Result<B::Value, CodegenError> {
    match expr {
        Expr::Number(value) => Ok(session.backend.emit_constant(*value)),

        Expr::Variable(name) => session.named_values.get(name).cloned().ok_or_else(|| {
            CodegenError::UnknownVariable {
                name: name.clone(),
                span: span.clone(),
            }
        }),

        Expr::Binary { op, lhs, rhs } => {
            let lhs = emit_expr(session, lhs)?;
            let rhs = emit_expr(session, rhs)?;

            let backend = &mut session.backend;
            match op {
                '+' => backend.emit_arithmetic(ArithOp::Add, lhs, rhs),
                '-' => backend.emit_arithmetic(ArithOp::Sub, lhs, rhs),
                '*' => backend.emit_arithmetic(ArithOp::Mul, lhs, rhs),
                '/' => backend.emit_arithmetic(ArithOp::Div, lhs, rhs),
                '<' => backend.emit_comparison(CmpOp::Less, lhs, rhs),
                '>' => backend.emit_comparison(CmpOp::Greater, lhs, rhs),
                _ => Err(CodegenError::UnknownOperator {
                    op: *op,
                    span: span.clone(),
                }),
            }
        }

        Expr::Call { callee, args } => {
            let Some(function) = session.get_function(callee)? else {
                return Err(CodegenError::UnknownFunction {
                    name: callee.clone(),
                    span: span.clone(),
                });
            };

            let expected = session.backend.param_count(&function);
            if expected != args.len() {
                return Err(CodegenError::ArityMismatch {
                    name: callee.clone(),
                    expected,
                    found: args.len(),
                    span: span.clone(),
                });
            }

            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(emit_expr(session, arg)?);
            }
            session.backend.emit_call(&function, values)
        }
    }
}
