pub mod syntax;
pub mod imaging;
pub mod runtime;
pub mod error;
pub mod namespaces;

pub use error::{Error, ErrorCode, RunError, RuntimeError, RuntimeErrorKind};
pub use syntax::token::{Token, TokenKind};
pub use syntax::ast::TypeId;
pub use runtime::value::Value;
pub use runtime::env::Environment;
pub use namespaces::RuntimeState;
pub use imaging::{Image, ImageError};
pub use imaging::codec::{CodecError, FileCodec, ImageCodec, MemoryCodec};

use std::io::Write;

use tracing::debug;

use crate::syntax::ast::Program as AstProgram;
use namespaces::NamespaceRegistry;
use runtime::interpreter::Interpreter;

// ─── Public API types ─────────────────────────────────────────────────────────

/// A parsed IML script. Produced by `compile`.
pub struct Program {
    pub(crate) ast: AstProgram,
    pub(crate) registry: NamespaceRegistry,
}

impl Program {
    pub fn ast(&self) -> &AstProgram { &self.ast }

    /// Indented tree dump, for diagnostics.
    pub fn dump(&self) -> String { self.ast.root.dump() }
}

// ─── Public API ───────────────────────────────────────────────────────────────

/// Lex and parse source text. Every lexer or parser error found is returned.
pub fn compile(source: &str) -> Result<Program, Vec<Error>> {
    let tokens = syntax::lexer::Lexer::new(source).tokenize()?;
    let ast = syntax::parser::Parser::new(tokens).parse()?;
    Ok(Program { ast, registry: NamespaceRegistry::standard() })
}

/// Runs a script against the filesystem and stdout. Front-end errors are
/// returned before anything executes.
pub fn run_source(source: &str) -> Result<(), RunError> {
    let program = compile(source).map_err(RunError::Compile)?;
    let mut rt = Runtime::new(program);
    let result = rt.run();
    rt.shutdown();
    Ok(result?)
}

// ─── Runtime ──────────────────────────────────────────────────────────────────

/// Owns a compiled program together with its variable bindings and the
/// codec and output sink builtins use.
///
/// Lifecycle:
///   1. `Runtime::new(program)`, optionally `.with_codec(..)` / `.with_output(..)`.
///   2. `runtime.run()` executes the top-level block once.
///   3. `runtime.shutdown()` drops every binding.
pub struct Runtime {
    program: Program,
    env: Environment,
    runtime_state: RuntimeState,
}

impl Runtime {
    pub fn new(program: Program) -> Self {
        Self { program, env: Environment::new(), runtime_state: RuntimeState::default() }
    }

    pub fn with_codec(mut self, codec: impl ImageCodec + 'static) -> Self {
        self.runtime_state.codec = Box::new(codec);
        self
    }

    pub fn with_output(mut self, out: impl Write + 'static) -> Self {
        self.runtime_state.out = Box::new(out);
        self
    }

    /// Execute the program. Bindings made before a failure stay visible
    /// through `env()`.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        let mut interp = Interpreter::new(&self.program.ast, &self.program.registry)
            .with_env(std::mem::take(&mut self.env))
            .with_runtime_state(std::mem::take(&mut self.runtime_state));

        let result = interp.run();

        let (env, runtime_state) = interp.into_parts();
        self.env = env;
        self.runtime_state = runtime_state;
        result
    }

    pub fn env(&self) -> &Environment { &self.env }

    pub fn shutdown(&mut self) {
        debug!(bindings = self.env.len(), "shutdown");
        self.env.shutdown();
    }
}
