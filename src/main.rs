use kaleidoscope::codegen::Backend;
use kaleidoscope::interpreter::{Interpreter, Outcome};
use kaleidoscope::ir::{DEFAULT_MAX_CALL_DEPTH, IrBackend};
use kaleidoscope::parser::Parser;
use kaleidoscope::session::SessionConfig;

use anyhow::{Context, Result, bail};
use clap::Parser as ClapParser;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(ClapParser, Debug)]
#[command(version, about = "Kaleidoscope JIT driver", long_about = None)]
struct Cli {
    /// Source file. Without one, stdin is read line by line.
    input: Option<PathBuf>,

    #[arg(long, help = "Print the IR of every emitted function")]
    print_ir: bool,

    #[arg(long, value_name = "NAME", default_value = "my cool jit")]
    module_name: String,

    #[arg(
        long,
        value_name = "BACKEND",
        default_value = "ir",
        help = "Code generator: ir, llvm"
    )]
    backend: String,

    #[arg(
        long,
        value_name = "FRAMES",
        default_value_t = DEFAULT_MAX_CALL_DEPTH,
        help = "Call-depth limit of the ir backend"
    )]
    max_call_depth: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let config = SessionConfig {
        module_name: cli.module_name,
        print_ir: cli.print_ir,
    };
    let input = cli.input.as_deref();

    match cli.backend.as_str() {
        "ir" => {
            let backend = IrBackend::new(cli.max_call_depth);
            drive(Interpreter::new(backend, config), input)
        }
        "llvm" => drive_llvm(config, input),
        other => bail!("unsupported backend: {other}"),
    }
}

#[cfg(feature = "llvm")]
fn drive_llvm(config: SessionConfig, input: Option<&Path>) -> Result<()> {
    use kaleidoscope::codegen::llvm::LlvmBackend;

    let context = inkwell::context::Context::create();
    let backend = LlvmBackend::new(&context, &config.module_name)
        .context("failed to start the llvm execution engine")?;
    drive(Interpreter::new(backend, config), input)
}

#[cfg(not(feature = "llvm"))]
fn drive_llvm(_config: SessionConfig, _input: Option<&Path>) -> Result<()> {
    bail!("the llvm backend is not compiled in; rebuild with `--features llvm`")
}

fn drive<B: Backend>(mut interpreter: Interpreter<B>, input: Option<&Path>) -> Result<()> {
    match input {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read input file {}", path.display()))?;
            run_source(&mut interpreter, &path.display().to_string(), &source)
        }
        None => {
            let stdin = io::stdin();
            let mut line = String::new();
            loop {
                eprint!("ready> ");
                io::stderr().flush()?;

                line.clear();
                if stdin.lock().read_line(&mut line)? == 0 {
                    return Ok(());
                }
                run_source(&mut interpreter, "<stdin>", &line)?;
            }
        }
    }
}

/// Runs every statement of `source`, printing outcomes to stdout and
/// diagnostics to stderr as they happen.
fn run_source<B: Backend>(interpreter: &mut Interpreter<B>, name: &str, source: &str) -> Result<()> {
    let mut parser = Parser::new(source);
    let mut stdout = io::stdout().lock();

    while let Some(outcome) = interpreter.run(&mut parser) {
        if let Some(listing) = outcome.ir_listing() {
            writeln!(stdout, "{}", listing)?;
        }
        match outcome {
            Outcome::Failed => {
                stdout.flush()?;
                interpreter.take_diagnostics().report(name, source)?;
            }
            outcome => writeln!(stdout, "{}", outcome)?,
        }
    }
    Ok(())
}
