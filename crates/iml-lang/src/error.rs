use thiserror::Error as ThisError;

use crate::imaging::ImageError;
use crate::imaging::codec::CodecError;
use crate::syntax::ast::TypeId;

/// Error codes prefixed by phase: L = lexer, P = parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer
    L001, // unexpected character
    L002, // unterminated string literal

    // Parser
    P001, // unexpected token
    P002, // missing expected token
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L001 => "L001",
            Self::L002 => "L002",
            Self::P001 => "P001",
            Self::P002 => "P002",
        }
    }
}

/// A front-end (lex or parse) error with its source position.
#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { code, line, column, message: message.into() }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}:{} — {}", self.code.as_str(), self.line, self.column, self.message)
    }
}

impl std::error::Error for Error {}

// ─────────────────────────────────────────────────────────────────────────────

/// Everything that can abandon a run. None of these are recoverable: the
/// interpreter propagates the first one straight to the driver.
#[derive(Debug, ThisError)]
pub enum RuntimeErrorKind {
    #[error("variable `{0}` not found")]
    UndefinedVariable(String),

    #[error("unknown function call: `{0}`")]
    UnknownFunction(String),

    #[error("`{name}()` expects {expected} arguments, got {got}")]
    Arity { name: String, expected: usize, got: usize },

    #[error("`{name}()` argument {position}: expected {expected}, got {got}")]
    ArgType { name: String, position: usize, expected: TypeId, got: &'static str },

    #[error("type mismatch: cannot assign {got} to {declared} `{name}`")]
    DeclType { name: String, declared: TypeId, got: &'static str },

    #[error("declaration of `{0}` has no type annotation")]
    MalformedDeclaration(String),

    #[error("`{name}()` {message}")]
    InvalidArgument { name: &'static str, message: String },

    #[error("`{name}()` failed: {source}")]
    Image {
        name: &'static str,
        #[source]
        source: ImageError,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("output failed: {0}")]
    Output(String),

    #[error("pipeline right-hand side must be a function call")]
    MalformedPipeline,

    #[error("obsolete {0} node encountered")]
    ObsoleteNode(&'static str),

    #[error("unknown statement type {0}")]
    UnknownStatement(&'static str),

    #[error("unknown expression type {0}")]
    UnknownExpression(&'static str),

    #[error("program root must be a block, got {0}")]
    MalformedProgram(&'static str),
}

/// A fatal runtime error, tagged with the source line of the node that raised it.
#[derive(Debug, ThisError)]
#[error("[runtime] {line} — {kind}")]
pub struct RuntimeError {
    pub line: usize,
    #[source]
    pub kind: RuntimeErrorKind,
}

impl RuntimeError {
    pub fn new(line: usize, kind: RuntimeErrorKind) -> Self {
        Self { line, kind }
    }
}

/// Either phase of a whole-script run failing.
#[derive(Debug, ThisError)]
pub enum RunError {
    #[error("{}", join_lines(.0))]
    Compile(Vec<Error>),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

fn join_lines(errors: &[Error]) -> String {
    errors.iter().map(Error::to_string).collect::<Vec<_>>().join("\n")
}
