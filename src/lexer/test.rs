use super::*;

fn kinds(input: &str) -> Vec<Token> {
    tokenize(input).into_iter().map(|(token, _)| token).collect()
}

#[test]
fn test_basic_tokens() {
    assert_eq!(
        kinds("3.0+4 foo(x)"),
        vec![
            Token::Number(3.0),
            Token::Punctuator(Punct::Plus),
            Token::Number(4.0),
            Token::Identifier("foo".to_string()),
            Token::Punctuator(Punct::LParen),
            Token::Identifier("x".to_string()),
            Token::Punctuator(Punct::RParen),
            Token::Eof,
        ]
    );
}

#[test]
fn test_comment_is_skipped() {
    assert_eq!(kinds("# comment\n42"), vec![Token::Number(42.0), Token::Eof]);
    assert_eq!(kinds("1 # trailing"), vec![Token::Number(1.0), Token::Eof]);
    assert_eq!(kinds("#a\r#b\n7"), vec![Token::Number(7.0), Token::Eof]);
}

#[test]
fn test_keywords() {
    assert_eq!(
        kinds("def extern if else define"),
        vec![
            Token::Keyword(Keyword::Def),
            Token::Keyword(Keyword::Extern),
            Token::Keyword(Keyword::If),
            Token::Keyword(Keyword::Else),
            Token::Identifier("define".to_string()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_identifier_allows_digits_and_underscores() {
    assert_eq!(
        kinds("a_1b"),
        vec![Token::Identifier("a_1b".to_string()), Token::Eof]
    );
}

#[test]
fn test_malformed_number_is_unknown() {
    assert_eq!(
        kinds("1.2.3 + 1"),
        vec![
            Token::Unknown("1.2.3".to_string()),
            Token::Punctuator(Punct::Plus),
            Token::Number(1.0),
            Token::Eof,
        ]
    );
}

#[test]
fn test_error_recovery() {
    let tokens = kinds("x @ y");
    assert_eq!(tokens[0], Token::Identifier("x".to_string()));
    assert_eq!(tokens[1], Token::Unknown("@".to_string()));
    assert_eq!(tokens[2], Token::Identifier("y".to_string()));
    assert_eq!(tokens[3], Token::Eof);
}

#[test]
fn test_current_is_not_rescanned() {
    let mut tokenizer = Tokenizer::new("a b");
    assert_eq!(tokenizer.current(), &Token::Eof);
    tokenizer.advance();
    assert_eq!(tokenizer.current(), &Token::Identifier("a".to_string()));
    assert_eq!(tokenizer.current(), &Token::Identifier("a".to_string()));
    assert_eq!(tokenizer.span(), 0..1);
    tokenizer.advance();
    assert_eq!(tokenizer.span(), 2..3);
    tokenizer.advance();
    assert_eq!(tokenizer.current(), &Token::Eof);
    tokenizer.advance();
    assert_eq!(tokenizer.current(), &Token::Eof);
    assert_eq!(tokenizer.span(), 3..3);
}
