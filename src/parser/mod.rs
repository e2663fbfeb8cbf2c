pub mod expression;
pub mod function;


use crate::ast::{Function, Prototype};
use crate::error::ParseError;
use crate::lexer::{Keyword, Punct, Token, Tokenizer};

use std::collections::HashMap;

/// One top-level statement, as handed to the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Definition(Function),
    External(Prototype),
    TopLevelExpr(Function),
    EndOfInput,
    Error(ParseError),
}

pub struct Parser<'src> {
    tokenizer: Tokenizer<'src>,
    precedence: HashMap<Punct, i32>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut tokenizer = Tokenizer::new(source);
        // prime the first token; every rule below expects `current` to be unconsumed
        tokenizer.advance();

        let precedence = HashMap::from([
            (Punct::Less, 10),
            (Punct::Greater, 10),
            (Punct::Plus, 20),
            (Punct::Minus, 20),
            (Punct::Star, 40),
            (Punct::Slash, 40),
        ]);

        Parser {
            tokenizer,
            precedence,
        }
    }

    /// Parses the next top-level statement.
    ///
    /// A failed statement yields [`Statement::Error`] and the offending
    /// token is skipped, so the caller can keep driving.
    pub fn parse_one_statement(&mut self) -> Statement {
        loop {
            let result = match self.tokenizer.current() {
                Token::Eof => return Statement::EndOfInput,
                Token::Punctuator(Punct::Semicolon) => {
                    self.tokenizer.advance();
                    continue;
                }
                Token::Keyword(Keyword::Def) => self.parse_definition().map(Statement::Definition),
                Token::Keyword(Keyword::Extern) => self.parse_extern().map(Statement::External),
                _ => self.parse_top_level_expr().map(Statement::TopLevelExpr),
            };

            return match result {
                Ok(statement) => statement,
                Err(error) => {
                    self.tokenizer.advance();
                    Statement::Error(error)
                }
            };
        }
    }

    /// Collects statements until end of input, keeping failed ones in place.
    pub fn parse_program(&mut self) -> Vec<Statement> {
        let mut statements = vec![];
        loop {
            match self.parse_one_statement() {
                Statement::EndOfInput => return statements,
                statement => statements.push(statement),
            }
        }
    }

    fn at(&self, punct: Punct) -> bool {
        matches!(self.tokenizer.current(), Token::Punctuator(p) if *p == punct)
    }

    fn binop_precedence(&self) -> Option<(char, i32)> {
        let Token::Punctuator(punct) = self.tokenizer.current() else {
            return None;
        };
        self.precedence
            .get(punct)
            .map(|precedence| (punct.as_char(), *precedence))
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        let span = self.tokenizer.span();
        match self.tokenizer.current() {
            Token::Unknown(text) => ParseError::LexicalAnomaly {
                expected,
                text: text.clone(),
                span,
            },
            found => ParseError::UnexpectedToken {
                expected,
                found: found.clone(),
                span,
            },
        }
    }
}
