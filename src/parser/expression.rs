use crate::ast::{Expr, Span};
use crate::error::ParseError;
use crate::lexer::{Punct, Token};
use crate::parser::Parser;

impl Parser<'_> {
    // expression ::= primary binop-rhs
    pub fn parse_expression(&mut self) -> Result<(Expr, Span), ParseError> {
        let lhs = self.parse_primary()?;
        self.parse_binop_rhs(0, lhs)
    }

    // primary ::= identifier-expr | number | '(' expression ')'
    fn parse_primary(&mut self) -> Result<(Expr, Span), ParseError> {
        match self.tokenizer.current() {
            Token::Identifier(_) => self.parse_identifier_expr(),
            Token::Number(value) => {
                let expr = (Expr::Number(*value), self.tokenizer.span());
                self.tokenizer.advance();
                Ok(expr)
            }
            Token::Punctuator(Punct::LParen) => self.parse_paren_expr(),
            // 'if' and 'else' are reserved without a production
            Token::Keyword(_) => Err(self.unexpected(
                "an expression (a keyword cannot start an expression)",
            )),
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_paren_expr(&mut self) -> Result<(Expr, Span), ParseError> {
        let open = self.tokenizer.span();
        self.tokenizer.advance(); // eat '('

        let (expr, _) = self.parse_expression()?;
        if !self.at(Punct::RParen) {
            return Err(self.unexpected("')' after parenthesized expression"));
        }
        let close = self.tokenizer.span();
        self.tokenizer.advance(); // eat ')'

        Ok((expr, open.start..close.end))
    }

    // identifier-expr ::= identifier | identifier '(' (expression (',' expression)*)? ')'
    fn parse_identifier_expr(&mut self) -> Result<(Expr, Span), ParseError> {
        let Token::Identifier(name) = self.tokenizer.current().clone() else {
            return Err(self.unexpected("an identifier"));
        };
        let span_name = self.tokenizer.span();
        self.tokenizer.advance();

        if !self.at(Punct::LParen) {
            return Ok((Expr::Variable(name), span_name));
        }
        self.tokenizer.advance(); // eat '('

        let mut args = vec![];
        if !self.at(Punct::RParen) {
            loop {
                args.push(self.parse_expression()?);

                if self.at(Punct::RParen) {
                    break;
                }
                if !self.at(Punct::Comma) {
                    return Err(self.unexpected("')' or ',' in argument list"));
                }
                self.tokenizer.advance(); // eat ','
            }
        }
        let span_r_paren = self.tokenizer.span();
        self.tokenizer.advance(); // eat ')'

        Ok((
            Expr::Call { callee: name, args },
            span_name.start..span_r_paren.end,
        ))
    }

    // binop-rhs ::= (binop primary)*
    //
    // Operators ranked below `min_precedence` end the loop. A strictly
    // tighter operator after the right operand is folded into it first,
    // so equal ranks associate to the left.
    fn parse_binop_rhs(
        &mut self,
        min_precedence: i32,
        mut lhs: (Expr, Span),
    ) -> Result<(Expr, Span), ParseError> {
        loop {
            let Some((op, precedence)) = self.binop_precedence() else {
                return Ok(lhs);
            };
            if precedence < min_precedence {
                return Ok(lhs);
            }
            self.tokenizer.advance(); // eat binop

            let mut rhs = self.parse_primary()?;

            if let Some((_, next_precedence)) = self.binop_precedence() {
                if precedence < next_precedence {
                    rhs = self.parse_binop_rhs(precedence + 1, rhs)?;
                }
            }

            let span = lhs.1.start..rhs.1.end;
            lhs = (
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
    }
}
