use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;
use iml_lang::{compile, Error, ErrorCode, Runtime};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Run an image-manipulation script.
#[derive(Debug, ClapParser)]
#[command(name = "iml", version, about)]
struct Cli {
    /// Script to execute.
    script: PathBuf,

    /// Print the parsed syntax tree before running.
    #[arg(long)]
    dump_ast: bool,
}

/// `RUST_LOG` picks the level; clamped-argument warnings show by default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn phase(e: &Error) -> &'static str {
    match e.code {
        ErrorCode::L001 | ErrorCode::L002 => "lex",
        ErrorCode::P001 | ErrorCode::P002 => "parse",
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let source = match std::fs::read_to_string(&cli.script) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("cannot read {}: {e}", cli.script.display());
            return ExitCode::FAILURE;
        }
    };

    let program = match compile(&source) {
        Ok(p) => p,
        Err(errs) => {
            for e in &errs {
                eprintln!("[{}] {e}", phase(e));
            }
            return ExitCode::FAILURE;
        }
    };

    if cli.dump_ast {
        print!("{}", program.dump());
    }

    debug!(script = %cli.script.display(), "running");
    let mut runtime = Runtime::new(program);
    let result = runtime.run();
    runtime.shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
