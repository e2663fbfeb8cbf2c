use logos::Logos;

use std::fmt::{self, Display, Formatter};
use std::ops::Range;

#[cfg(test)]
pub mod test;

/// Raw scanner rules. The public [`Token`] adds `Eof` and `Unknown`,
/// which logos reports as end of iteration and as errors.
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\n\r\x0B\x0C]+")]
#[logos(skip r"#[^\n\r]*[\n\r]?")]
enum Lexeme {
    #[token("def")]
    KeywordDef,

    #[token("extern")]
    KeywordExtern,

    #[token("if")]
    KeywordIf,

    #[token("else")]
    KeywordElse,

    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // digits and dots only; "1.2.3" fails the conversion and surfaces as Unknown
    #[regex(r"[0-9][0-9.]*", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("<")]
    Less,

    #[token(">")]
    Greater,

    #[token("=")]
    Assign,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Def,
    Extern,
    If,
    Else,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Def => "def",
            Keyword::Extern => "extern",
            Keyword::If => "if",
            Keyword::Else => "else",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punct {
    Plus,
    Minus,
    Star,
    Slash,
    Less,
    Greater,
    Assign,
    LParen,
    RParen,
    Semicolon,
    Comma,
}

impl Punct {
    pub fn as_char(&self) -> char {
        match self {
            Punct::Plus => '+',
            Punct::Minus => '-',
            Punct::Star => '*',
            Punct::Slash => '/',
            Punct::Less => '<',
            Punct::Greater => '>',
            Punct::Assign => '=',
            Punct::LParen => '(',
            Punct::RParen => ')',
            Punct::Semicolon => ';',
            Punct::Comma => ',',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Eof,
    Keyword(Keyword),
    Punctuator(Punct),
    Identifier(String),
    Number(f64),
    Unknown(String),
}

impl Lexeme {
    fn into_token(self) -> Token {
        match self {
            Lexeme::KeywordDef => Token::Keyword(Keyword::Def),
            Lexeme::KeywordExtern => Token::Keyword(Keyword::Extern),
            Lexeme::KeywordIf => Token::Keyword(Keyword::If),
            Lexeme::KeywordElse => Token::Keyword(Keyword::Else),
            Lexeme::Identifier(name) => Token::Identifier(name),
            Lexeme::Number(value) => Token::Number(value),
            Lexeme::Plus => Token::Punctuator(Punct::Plus),
            Lexeme::Minus => Token::Punctuator(Punct::Minus),
            Lexeme::Star => Token::Punctuator(Punct::Star),
            Lexeme::Slash => Token::Punctuator(Punct::Slash),
            Lexeme::Less => Token::Punctuator(Punct::Less),
            Lexeme::Greater => Token::Punctuator(Punct::Greater),
            Lexeme::Assign => Token::Punctuator(Punct::Assign),
            Lexeme::LParen => Token::Punctuator(Punct::LParen),
            Lexeme::RParen => Token::Punctuator(Punct::RParen),
            Lexeme::Semicolon => Token::Punctuator(Punct::Semicolon),
            Lexeme::Comma => Token::Punctuator(Punct::Comma),
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => write!(f, "end of file"),
            Token::Keyword(keyword) => write!(f, "keyword '{}'", keyword.as_str()),
            Token::Punctuator(punct) => write!(f, "'{}'", punct.as_char()),
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::Number(value) => write!(f, "number {}", value),
            Token::Unknown(text) => write!(f, "unknown '{}'", text),
        }
    }
}

/// Holds exactly one scanned token (the current one) and the input cursor.
pub struct Tokenizer<'src> {
    lexer: logos::Lexer<'src, Lexeme>,
    current: Token,
    span: Range<usize>,
}

impl<'src> Tokenizer<'src> {
    pub fn new(source: &'src str) -> Self {
        Tokenizer {
            lexer: Lexeme::lexer(source),
            current: Token::Eof,
            span: 0..0,
        }
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    pub fn advance(&mut self) -> &Token {
        let (token, span) = match self.lexer.next() {
            Some(Ok(lexeme)) => (lexeme.into_token(), self.lexer.span()),
            Some(Err(())) => (
                Token::Unknown(self.lexer.slice().to_string()),
                self.lexer.span(),
            ),
            None => {
                let end = self.lexer.source().len();
                (Token::Eof, end..end)
            }
        };
        self.current = token;
        self.span = span;
        &self.current
    }
}

/// Scans the whole input, ending with (and including) the first `Eof`.
pub fn tokenize(source: &str) -> Vec<(Token, Range<usize>)> {
    let mut tokenizer = Tokenizer::new(source);
    let mut tokens = vec![];
    loop {
        let token = tokenizer.advance().clone();
        let done = token == Token::Eof;
        tokens.push((token, tokenizer.span()));
        if done {
            return tokens;
        }
    }
}
