use super::*;
use crate::error::SessionError;
use crate::parser::{Parser, Statement};
use crate::session::{Session, SessionConfig};

use inkwell::context::Context;

fn session(context: &Context) -> Session<LlvmBackend<'_>> {
    let backend = LlvmBackend::new(context, "test").unwrap();
    Session::new(backend, SessionConfig::default())
}

/// Feeds `input` statement by statement; returns the value of the last
/// top-level expression.
fn feed(session: &mut Session<LlvmBackend<'_>>, input: &str) -> Result<f64, SessionError> {
    let mut parser = Parser::new(input);
    let mut last = Ok(f64::NAN);
    loop {
        match parser.parse_one_statement() {
            Statement::Definition(function) => {
                session.define(&function)?;
            }
            Statement::External(prototype) => {
                session.declare(&prototype)?;
            }
            Statement::TopLevelExpr(function) => last = session.evaluate(&function),
            Statement::Error(error) => panic!("unexpected parse error: {}", error),
            Statement::EndOfInput => return last,
        }
    }
}

#[test]
fn test_anonymous_entry_is_numbered_per_unit() {
    let context = Context::create();
    let mut session = session(&context);

    assert_eq!(feed(&mut session, "4+5"), Ok(9.0));
    assert_eq!(feed(&mut session, "2*3"), Ok(6.0));

    let backend = &mut session.backend;
    let entry = backend.declare_function(ANON_FN_NAME, &[]).unwrap();
    assert_eq!(backend.function_name(&entry), format!("{}.2", ANON_FN_NAME));
    assert_eq!(backend.lookup_function(ANON_FN_NAME), Some(entry));
}

#[test]
fn test_definitions_link_across_units() {
    let context = Context::create();
    let mut session = session(&context);

    assert_eq!(feed(&mut session, "def twice(x) x*2; twice(4)"), Ok(8.0));
    assert_eq!(feed(&mut session, "twice(twice(1))"), Ok(4.0));
}

#[test]
fn test_natives_are_mapped() {
    let context = Context::create();
    let mut session = session(&context);

    assert_eq!(feed(&mut session, "extern sqrt(x); sqrt(16)"), Ok(4.0));
    assert_eq!(feed(&mut session, "extern pow(b, e); pow(2, 10)"), Ok(1024.0));
}

#[test]
fn test_unresolved_symbol_fails_before_load() {
    let context = Context::create();
    let mut session = session(&context);

    assert_eq!(
        feed(&mut session, "extern bar(a, b); bar(1, 2)"),
        Err(SessionError::Execution(ExecutionError::UnresolvedSymbol(
            "bar".to_string()
        )))
    );
    // an uncalled declaration needs no resolution
    assert_eq!(feed(&mut session, "extern baz(a); 1"), Ok(1.0));
}

#[test]
fn test_definitions_survive_a_failed_entry() {
    let context = Context::create();
    let mut session = session(&context);

    assert!(feed(&mut session, "def foo(x) x+1; extern bar(a, b); bar(1, 2)").is_err());
    assert_eq!(feed(&mut session, "foo(1)"), Ok(2.0));
}

#[test]
fn test_called_declaration_is_never_erased() {
    let context = Context::create();
    let mut session = session(&context);

    assert!(feed(&mut session, "extern g(x); def h(x) g(x)").is_ok());
    assert!(matches!(
        feed(&mut session, "extern g(a, b)"),
        Err(SessionError::Codegen(CodegenError::DeclarationInUse { .. }))
    ));
    assert!(matches!(
        feed(&mut session, "def g(x) y"),
        Err(SessionError::Codegen(CodegenError::UnknownVariable { .. }))
    ));

    let backend = session.backend();
    let g = backend.lookup_function("g").unwrap();
    assert!(!backend.has_body(&g));
    assert!(backend.is_referenced(&g));
    let h = backend.lookup_function("h").unwrap();
    assert!(h.verify(false));

    assert_eq!(feed(&mut session, "def g(x) x*3; h(2)"), Ok(6.0));
}
