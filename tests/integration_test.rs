// End-to-end runs of the statement driver over whole programs

use kaleidoscope::diagnostic::Stage;
use kaleidoscope::interpreter::{Interpreter, Outcome};
use kaleidoscope::ir::IrBackend;
use kaleidoscope::session::SessionConfig;

fn interpreter(print_ir: bool) -> Interpreter<IrBackend> {
    let config = SessionConfig {
        print_ir,
        ..SessionConfig::default()
    };
    Interpreter::new(IrBackend::default(), config)
}

fn values(outcomes: &[Outcome]) -> Vec<f64> {
    outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            Outcome::Evaluated { value, .. } => Some(*value),
            _ => None,
        })
        .collect()
}

#[test]
fn test_program_runs_to_end() {
    let source = r#"
        # distance helpers
        extern sqrt(x);
        def square(x) x*x;
        def hypot(a, b) sqrt(square(a) + square(b));

        hypot(3, 4);
        square(hypot(6, 8)) / 4;
        1 < 2;
    "#;

    let mut interpreter = interpreter(false);
    let outcomes = interpreter.run_to_end(source);

    assert_eq!(outcomes.len(), 6);
    assert_eq!(
        outcomes[0],
        Outcome::Declared {
            name: "sqrt".to_string(),
            ir: None
        }
    );
    assert_eq!(outcomes[0].to_string(), "Read an extern.");
    assert_eq!(outcomes[1].to_string(), "Parsed a function definition.");
    assert_eq!(values(&outcomes), vec![5.0, 25.0, 1.0]);
    assert_eq!(outcomes[3].to_string(), "Evaluated to 5");
    assert!(interpreter.diagnostics().is_empty());
    assert_eq!(interpreter.session().sealed_units(), 3);
}

#[test]
fn test_session_survives_across_sources() {
    let mut interpreter = interpreter(false);
    interpreter.run_to_end("def inc(x) x+1;");
    let outcomes = interpreter.run_to_end("inc(inc(1)); inc(0.5)");
    assert_eq!(values(&outcomes), vec![3.0, 1.5]);
}

#[test]
fn test_errors_recover_at_statement_boundary() {
    let source = "def ( 1+1; def f(x) y; nope(2); def g(x) x*3; g(2)";

    let mut interpreter = interpreter(false);
    let outcomes = interpreter.run_to_end(source);

    // the stray '(' is skipped, so `1+1` runs on its own
    assert_eq!(values(&outcomes), vec![2.0, 6.0]);
    let stages: Vec<Stage> = interpreter.diagnostics().iter().map(|d| d.stage).collect();
    assert_eq!(stages, vec![Stage::Parse, Stage::Emit, Stage::Emit]);
}

#[test]
fn test_execution_failure_is_reported() {
    let mut interpreter = interpreter(false);
    let outcomes = interpreter.run_to_end("extern bar(a, b); bar(1, 2); 7");

    assert_eq!(outcomes[1], Outcome::Failed);
    assert_eq!(values(&outcomes), vec![7.0]);

    let diagnostics = interpreter.take_diagnostics();
    let diagnostic = diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.stage, Stage::Execute);
    assert_eq!(diagnostic.span, Some(18..27));
    assert!(diagnostic.message.contains("'bar'"));
    assert!(interpreter.diagnostics().is_empty());
}

#[test]
fn test_print_ir_listing() {
    let mut interpreter = interpreter(true);
    let outcomes = interpreter.run_to_end("def double(x) x*2; 4+5");

    assert_eq!(
        outcomes[0].ir_listing().unwrap(),
        "; parsed a function definition\n\
         define double @double(double %x) {\n\
         entry:\n  \
         %multmp1 = fmul double %x, 2.000000\n  \
         ret double %multmp1\n\
         }\n"
    );
    // constants are folded before the listing is taken
    assert!(
        outcomes[1]
            .ir_listing()
            .unwrap()
            .contains("ret double 9.000000")
    );
}

#[test]
fn test_diagnostics_render_with_source() {
    let source = "def foo(x x";
    let mut interpreter = interpreter(false);
    interpreter.run_to_end(source);

    let mut rendered = Vec::new();
    interpreter
        .diagnostics()
        .write("input.kal", source, &mut rendered, false)
        .unwrap();
    let rendered = String::from_utf8(rendered).unwrap();

    assert!(rendered.contains("SYNTAX"), "{}", rendered);
    assert!(rendered.contains("expected ')' or ',' in prototype"), "{}", rendered);
    assert!(rendered.contains("input.kal"), "{}", rendered);
}

#[test]
fn test_runaway_recursion_is_reported_with_default_config() {
    let mut interpreter = interpreter(false);
    let outcomes = interpreter.run_to_end("def spin(x) spin(x+1); spin(0); 3");

    assert_eq!(outcomes[1], Outcome::Failed);
    assert_eq!(values(&outcomes), vec![3.0]);

    let diagnostic = interpreter.diagnostics().iter().next().unwrap();
    assert_eq!(diagnostic.stage, Stage::Execute);
}
