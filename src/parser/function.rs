use crate::ast::{ANON_FN_NAME, Function, Prototype};
use crate::error::ParseError;
use crate::lexer::{Punct, Token};
use crate::parser::Parser;

impl Parser<'_> {
    // prototype ::= identifier '(' (identifier (',' identifier)*)? ')'
    pub fn parse_prototype(&mut self) -> Result<Prototype, ParseError> {
        let Token::Identifier(name) = self.tokenizer.current().clone() else {
            return Err(self.unexpected("function name in prototype"));
        };
        let span_name = self.tokenizer.span();
        self.tokenizer.advance();

        if !self.at(Punct::LParen) {
            return Err(self.unexpected("'(' in prototype"));
        }
        self.tokenizer.advance(); // eat '('

        let mut params = vec![];
        if !self.at(Punct::RParen) {
            loop {
                let Token::Identifier(param) = self.tokenizer.current().clone() else {
                    return Err(self.unexpected("identifier in prototype"));
                };
                params.push(param);
                self.tokenizer.advance();

                if self.at(Punct::RParen) {
                    break;
                }
                if !self.at(Punct::Comma) {
                    return Err(self.unexpected("')' or ',' in prototype"));
                }
                self.tokenizer.advance(); // eat ','
            }
        }
        let span_r_paren = self.tokenizer.span();
        self.tokenizer.advance(); // eat ')'

        Ok(Prototype {
            name,
            params,
            span: span_name.start..span_r_paren.end,
        })
    }

    // definition ::= 'def' prototype expression
    pub fn parse_definition(&mut self) -> Result<Function, ParseError> {
        self.tokenizer.advance(); // eat 'def'
        let prototype = self.parse_prototype()?;
        let body = self.parse_expression()?;
        Ok(Function { prototype, body })
    }

    // external ::= 'extern' prototype
    pub fn parse_extern(&mut self) -> Result<Prototype, ParseError> {
        self.tokenizer.advance(); // eat 'extern'
        self.parse_prototype()
    }

    // toplevelexpr ::= expression
    pub fn parse_top_level_expr(&mut self) -> Result<Function, ParseError> {
        let body = self.parse_expression()?;
        let prototype = Prototype {
            name: ANON_FN_NAME.to_string(),
            params: vec![],
            span: body.1.clone(),
        };
        Ok(Function { prototype, body })
    }
}
