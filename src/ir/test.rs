use super::fold::fold_constants;
use super::irvalidator::IRValidator;
use super::*;
use crate::codegen::{ArithOp, Backend, CmpOp};
use crate::error::ExecutionError;

fn reg(name: &str) -> Value {
    Value::Register(name.to_string())
}

fn arg(name: &str) -> Value {
    Value::Argument(name.to_string())
}

fn define(name: &str, params: &[&str], instructions: Vec<Instruction>, ret: Value) -> Function {
    Function {
        name: name.to_string(),
        params: params.iter().map(|p| p.to_string()).collect(),
        blocks: vec![BasicBlock {
            label: "entry".to_string(),
            instructions,
            terminator: Some(Terminator::Ret { value: ret }),
        }],
    }
}

fn declare(name: &str, params: &[&str]) -> Function {
    Function {
        name: name.to_string(),
        params: params.iter().map(|p| p.to_string()).collect(),
        blocks: Vec::new(),
    }
}

fn unit(functions: Vec<Function>) -> Module {
    Module {
        name: "test".to_string(),
        functions,
    }
}

#[test]
fn test_display_definition() {
    let function = define(
        "foo",
        &["x", "y"],
        vec![Instruction::FMul {
            dest: "multmp1".to_string(),
            lhs: arg("x"),
            rhs: Value::Constant(2.0),
        }],
        reg("multmp1"),
    );

    assert_eq!(
        function.to_string(),
        "define double @foo(double %x, double %y) {\n\
         entry:\n  \
         %multmp1 = fmul double %x, 2.000000\n  \
         ret double %multmp1\n\
         }\n"
    );
}

#[test]
fn test_display_declaration() {
    assert_eq!(
        declare("sin", &["x"]).to_string(),
        "declare double @sin(double %x)\n"
    );
}

#[test]
fn test_fcmp_unordered() {
    assert!(FCmpCond::Ult.holds(1.0, 2.0));
    assert!(!FCmpCond::Ult.holds(2.0, 2.0));
    assert!(FCmpCond::Ugt.holds(f64::NAN, 0.0));
    assert!(FCmpCond::Ult.holds(0.0, f64::NAN));
}

#[test]
fn test_fold_constant_chain() {
    let mut function = define(
        "__anon_expr",
        &[],
        vec![
            Instruction::FMul {
                dest: "multmp1".to_string(),
                lhs: Value::Constant(2.0),
                rhs: Value::Constant(3.0),
            },
            Instruction::FAdd {
                dest: "addtmp2".to_string(),
                lhs: Value::Constant(1.0),
                rhs: reg("multmp1"),
            },
        ],
        reg("addtmp2"),
    );

    assert_eq!(fold_constants(&mut function), 2);
    let entry = function.entry().unwrap();
    assert!(entry.instructions.is_empty());
    assert_eq!(
        entry.terminator,
        Some(Terminator::Ret {
            value: Value::Constant(7.0)
        })
    );
}

#[test]
fn test_fold_stops_at_arguments_and_calls() {
    let mut function = define(
        "f",
        &["x"],
        vec![
            Instruction::FCmp {
                dest: "cmptmp1".to_string(),
                cond: FCmpCond::Ult,
                lhs: Value::Constant(1.0),
                rhs: Value::Constant(2.0),
            },
            Instruction::UIToFP {
                dest: "booltmp2".to_string(),
                value: reg("cmptmp1"),
            },
            Instruction::FAdd {
                dest: "addtmp3".to_string(),
                lhs: arg("x"),
                rhs: reg("booltmp2"),
            },
            Instruction::Call {
                dest: "calltmp4".to_string(),
                func: "f".to_string(),
                args: vec![Value::Constant(0.0)],
            },
        ],
        reg("addtmp3"),
    );

    assert_eq!(fold_constants(&mut function), 2);
    let entry = function.entry().unwrap();
    assert_eq!(entry.instructions.len(), 2);
    assert_eq!(
        entry.instructions[0],
        Instruction::FAdd {
            dest: "addtmp3".to_string(),
            lhs: arg("x"),
            rhs: Value::Constant(1.0),
        }
    );
}

#[test]
fn test_validator_accepts_well_formed_unit() {
    let module = unit(vec![
        declare("sin", &["x"]),
        define(
            "f",
            &["x"],
            vec![Instruction::Call {
                dest: "calltmp1".to_string(),
                func: "sin".to_string(),
                args: vec![arg("x")],
            }],
            reg("calltmp1"),
        ),
    ]);

    assert!(IRValidator::validate_module(&module).is_ok());
}

#[test]
fn test_validator_reports_errors() {
    let mut function = define(
        "f",
        &["x"],
        vec![
            Instruction::FAdd {
                dest: "addtmp1".to_string(),
                lhs: arg("y"),
                rhs: reg("nope"),
            },
            Instruction::Call {
                dest: "calltmp2".to_string(),
                func: "g".to_string(),
                args: vec![],
            },
        ],
        reg("addtmp1"),
    );
    function.blocks[0].terminator = None;

    let module = unit(vec![function]);
    let errors = IRValidator::validate_module(&module).unwrap_err();
    assert_eq!(errors.len(), 4, "{:?}", errors);
    assert!(errors[0].contains("%y is not a parameter"));
    assert!(errors[1].contains("%nope used before definition"));
    assert!(errors[2].contains("@g which is not declared"));
    assert!(errors[3].contains("no terminator"));
}

#[test]
fn test_engine_resolves_across_units() {
    let mut engine = Engine::new(64);
    engine.load(unit(vec![define(
        "double",
        &["x"],
        vec![Instruction::FMul {
            dest: "multmp1".to_string(),
            lhs: arg("x"),
            rhs: Value::Constant(2.0),
        }],
        reg("multmp1"),
    )]));
    engine.load(unit(vec![
        declare("double", &["x"]),
        define(
            "main",
            &[],
            vec![Instruction::Call {
                dest: "calltmp1".to_string(),
                func: "double".to_string(),
                args: vec![Value::Constant(21.0)],
            }],
            reg("calltmp1"),
        ),
    ]));

    assert_eq!(engine.run("main"), Ok(42.0));

    engine.unload_symbol("main");
    // the second unit only held a declaration once main was gone
    assert_eq!(engine.units().len(), 1);
    assert_eq!(
        engine.run("main"),
        Err(ExecutionError::MissingEntry("main".to_string()))
    );
}

#[test]
fn test_engine_prefers_callers_unit() {
    let constant = |value: f64| define("k", &[], vec![], Value::Constant(value));
    let call = |dest: &str, func: &str| Instruction::Call {
        dest: dest.to_string(),
        func: func.to_string(),
        args: vec![],
    };

    let mut engine = Engine::new(64);
    engine.load(unit(vec![
        constant(1.0),
        define("g", &[], vec![call("calltmp1", "k")], reg("calltmp1")),
    ]));
    engine.load(unit(vec![
        constant(3.0),
        declare("g", &[]),
        define("main", &[], vec![call("calltmp1", "g")], reg("calltmp1")),
    ]));

    // g runs in the first unit and binds to its own k
    assert_eq!(engine.run("main"), Ok(1.0));
}

#[test]
fn test_engine_natives_and_unresolved() {
    let mut engine = Engine::new(64);
    engine.load(unit(vec![
        declare("sqrt", &["x"]),
        declare("missing", &[]),
        define(
            "root",
            &[],
            vec![Instruction::Call {
                dest: "calltmp1".to_string(),
                func: "sqrt".to_string(),
                args: vec![Value::Constant(16.0)],
            }],
            reg("calltmp1"),
        ),
        define(
            "broken",
            &[],
            vec![Instruction::Call {
                dest: "calltmp1".to_string(),
                func: "missing".to_string(),
                args: vec![],
            }],
            reg("calltmp1"),
        ),
    ]));

    assert_eq!(engine.run("root"), Ok(4.0));
    assert_eq!(
        engine.run("broken"),
        Err(ExecutionError::UnresolvedSymbol("missing".to_string()))
    );
}

#[test]
fn test_engine_call_depth_limit() {
    let mut engine = Engine::new(16);
    engine.load(unit(vec![define(
        "loop",
        &[],
        vec![Instruction::Call {
            dest: "calltmp1".to_string(),
            func: "loop".to_string(),
            args: vec![],
        }],
        reg("calltmp1"),
    )]));

    assert_eq!(engine.run("loop"), Err(ExecutionError::StackOverflow(16)));
}

#[test]
fn test_engine_depth_limit_is_independent_of_host_stack() {
    let mut engine = Engine::new(200_000);
    engine.load(unit(vec![define(
        "spin",
        &["x"],
        vec![
            Instruction::FAdd {
                dest: "addtmp1".to_string(),
                lhs: arg("x"),
                rhs: Value::Constant(1.0),
            },
            Instruction::Call {
                dest: "calltmp2".to_string(),
                func: "spin".to_string(),
                args: vec![reg("addtmp1")],
            },
        ],
        reg("calltmp2"),
    )]));
    engine.load(unit(vec![define(
        "main",
        &[],
        vec![Instruction::Call {
            dest: "calltmp1".to_string(),
            func: "spin".to_string(),
            args: vec![Value::Constant(0.0)],
        }],
        reg("calltmp1"),
    )]));

    assert_eq!(engine.run("main"), Err(ExecutionError::StackOverflow(200_000)));
}

#[test]
fn test_engine_unload_keeps_units_with_bodies() {
    let mut engine = Engine::new(64);
    engine.load(unit(vec![
        declare("sqrt", &["x"]),
        define("k", &[], vec![], Value::Constant(1.0)),
        define("main", &[], vec![], Value::Constant(2.0)),
    ]));

    engine.unload_symbol("main");
    assert_eq!(engine.units().len(), 1);
    engine.unload_symbol("k");
    assert!(engine.units().is_empty());
}

#[test]
fn test_backend_builds_and_folds() {
    let mut backend = IrBackend::new(64);
    backend.reopen_unit("unit");

    let params = vec!["a".to_string(), "b".to_string()];
    let f = backend.declare_function("f", &params).unwrap();
    let bindings = backend.begin_function_body(&f, &params).unwrap();
    assert_eq!(bindings[0], ("a".to_string(), arg("a")));

    let two = backend.emit_constant(2.0);
    let three = backend.emit_constant(3.0);
    let folded = backend.emit_arithmetic(ArithOp::Sub, three, two).unwrap();
    let cmp = backend
        .emit_comparison(CmpOp::Less, bindings[0].1.clone(), bindings[1].1.clone())
        .unwrap();
    let sum = backend.emit_arithmetic(ArithOp::Add, cmp, folded).unwrap();
    backend.finalize_function(&f, sum).unwrap();

    assert!(backend.has_body(&f));
    assert_eq!(
        backend.dump_function(&f),
        "define double @f(double %a, double %b) {\n\
         entry:\n  \
         %cmptmp2 = fcmp ult double %a, %b\n  \
         %booltmp3 = uitofp i1 %cmptmp2 to double\n  \
         %addtmp4 = fadd double %booltmp3, 1.000000\n  \
         ret double %addtmp4\n\
         }\n"
    );
}

#[test]
fn test_backend_execute_unloads_entry() {
    let mut backend = IrBackend::new(64);
    backend.reopen_unit("unit");

    let anon = backend.declare_function("__anon_expr", &[]).unwrap();
    backend.begin_function_body(&anon, &[]).unwrap();
    let value = backend.emit_constant(5.0);
    backend.finalize_function(&anon, value).unwrap();

    let sealed = backend.seal_unit();
    assert_eq!(sealed.functions.len(), 1);
    assert_eq!(backend.execute(sealed, "__anon_expr"), Ok(5.0));
    assert!(backend.engine().units().is_empty());
}
