use crate::syntax::ast::TypeId;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    Ident(String),
    StringLit(String),

    // Keywords
    Func,
    Return,
    If,
    Else,
    While,
    For,
    Break,
    Continue,

    // Type keywords
    TInt,
    TFloat,
    TString,
    TImage,

    // Operators
    Eq,         // =
    Minus,      // -
    Pipe,       // |>

    // Punctuation
    Comma,      // ,
    Semicolon,  // ;
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }

    Eof,
}

impl TokenKind {
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_) | Self::StringLit(_))
    }

    pub fn is_type_keyword(&self) -> bool {
        self.type_id().is_some()
    }

    /// The declared type named by a type keyword.
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Self::TInt    => Some(TypeId::Int),
            Self::TFloat  => Some(TypeId::Float),
            Self::TString => Some(TypeId::String),
            Self::TImage  => Some(TypeId::Image),
            _ => None,
        }
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::Func | Self::Return | Self::If | Self::Else | Self::While | Self::For
            | Self::Break | Self::Continue
        ) || self.is_type_keyword()
    }
}

/// Maps an identifier string to its keyword token, or returns `Ident`.
pub fn keyword_or_ident(s: String) -> TokenKind {
    match s.as_str() {
        "func"     => TokenKind::Func,
        "return"   => TokenKind::Return,
        "if"       => TokenKind::If,
        "else"     => TokenKind::Else,
        "while"    => TokenKind::While,
        "for"      => TokenKind::For,
        "break"    => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "int"      => TokenKind::TInt,
        "float"    => TokenKind::TFloat,
        "string"   => TokenKind::TString,
        "image"    => TokenKind::TImage,
        _          => TokenKind::Ident(s),
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}
