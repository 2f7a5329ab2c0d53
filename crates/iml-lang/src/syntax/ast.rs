use std::fmt::{self, Write};

/// Source location attached to every node for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

// ─── Types ───────────────────────────────────────────────────────────────────

/// Static type recorded by declarations and type annotation nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeId {
    Int,
    Float,
    String,
    Image,
    Unknown,
}

impl TypeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int     => "int",
            Self::Float   => "float",
            Self::String  => "string",
            Self::Image   => "image",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────────

/// One syntax tree node. A node exclusively owns its children and strings;
/// `Clone` is a full deep copy and dropping the root tears the tree down.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub kind: AstKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstKind {
    // Statements
    /// `int x = expr;`
    Decl { ty: Box<Ast>, name: String, expr: Box<Ast> },
    /// `x = expr;`
    Assign { name: String, expr: Box<Ast> },
    /// `expr;`
    ExprStmt(Box<Ast>),
    /// `{ stmt* }`. The program root is always a block.
    Block(Vec<Ast>),
    Return(Option<Box<Ast>>),
    If { cond: Box<Ast>, block: Box<Ast> },
    IfElse { cond: Box<Ast>, then_block: Box<Ast>, else_block: Box<Ast> },
    While { cond: Box<Ast>, block: Box<Ast> },
    For { init: Box<Ast>, cond: Box<Ast>, update: Box<Ast>, block: Box<Ast> },
    Break,
    Continue,
    /// `func name(a, b) { ... }`. Parsed, never invoked.
    FuncDef { name: String, params: Vec<String>, body: Box<Ast> },
    /// Parameter names collected while parsing a function header.
    ArgList(Vec<String>),

    // Expressions
    Call { name: String, args: Vec<Ast> },
    /// `left |> right`; `right` is expected to be a `Call`.
    Pipeline { left: Box<Ast>, right: Box<Ast> },
    IntLit(i64),
    FloatLit(f64),
    StringLit(String),
    Ident(String),
    Type(TypeId),

    // Obsolete literal forms from older front ends; rejected by the evaluator.
    Number(f64),
    Str(String),
}

impl Ast {
    pub fn new(kind: AstKind) -> Self {
        Self { kind, span: Span::default() }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    // ─── Constructors ────────────────────────────────────────────────────────

    pub fn int_lit(v: i64) -> Self { Self::new(AstKind::IntLit(v)) }
    pub fn float_lit(v: f64) -> Self { Self::new(AstKind::FloatLit(v)) }
    pub fn string_lit(s: impl Into<String>) -> Self { Self::new(AstKind::StringLit(s.into())) }
    pub fn ident(name: impl Into<String>) -> Self { Self::new(AstKind::Ident(name.into())) }
    pub fn type_node(t: TypeId) -> Self { Self::new(AstKind::Type(t)) }
    pub fn number(v: f64) -> Self { Self::new(AstKind::Number(v)) }
    pub fn string(s: impl Into<String>) -> Self { Self::new(AstKind::Str(s.into())) }

    pub fn decl(ty: Ast, name: impl Into<String>, expr: Ast) -> Self {
        Self::new(AstKind::Decl { ty: Box::new(ty), name: name.into(), expr: Box::new(expr) })
    }

    pub fn assign(name: impl Into<String>, expr: Ast) -> Self {
        Self::new(AstKind::Assign { name: name.into(), expr: Box::new(expr) })
    }

    pub fn expr_stmt(expr: Ast) -> Self {
        Self::new(AstKind::ExprStmt(Box::new(expr)))
    }

    pub fn call(name: impl Into<String>, args: Vec<Ast>) -> Self {
        Self::new(AstKind::Call { name: name.into(), args })
    }

    pub fn pipe(left: Ast, right: Ast) -> Self {
        Self::new(AstKind::Pipeline { left: Box::new(left), right: Box::new(right) })
    }

    pub fn block(stmts: Vec<Ast>) -> Self {
        Self::new(AstKind::Block(stmts))
    }

    pub fn ret(expr: Option<Ast>) -> Self {
        Self::new(AstKind::Return(expr.map(Box::new)))
    }

    pub fn if_stmt(cond: Ast, block: Ast) -> Self {
        Self::new(AstKind::If { cond: Box::new(cond), block: Box::new(block) })
    }

    pub fn if_else(cond: Ast, then_block: Ast, else_block: Ast) -> Self {
        Self::new(AstKind::IfElse {
            cond: Box::new(cond),
            then_block: Box::new(then_block),
            else_block: Box::new(else_block),
        })
    }

    pub fn while_stmt(cond: Ast, block: Ast) -> Self {
        Self::new(AstKind::While { cond: Box::new(cond), block: Box::new(block) })
    }

    pub fn for_stmt(init: Ast, cond: Ast, update: Ast, block: Ast) -> Self {
        Self::new(AstKind::For {
            init: Box::new(init),
            cond: Box::new(cond),
            update: Box::new(update),
            block: Box::new(block),
        })
    }

    pub fn brk() -> Self { Self::new(AstKind::Break) }
    pub fn cont() -> Self { Self::new(AstKind::Continue) }

    pub fn func_def(name: impl Into<String>, params: Vec<String>, body: Ast) -> Self {
        Self::new(AstKind::FuncDef { name: name.into(), params, body: Box::new(body) })
    }

    pub fn arg_list(first: impl Into<String>) -> Self {
        Self::new(AstKind::ArgList(vec![first.into()]))
    }

    /// Appends a parameter name. A no-op on anything but an `ArgList`.
    pub fn append_arg(mut self, name: impl Into<String>) -> Self {
        if let AstKind::ArgList(args) = &mut self.kind {
            args.push(name.into());
        }
        self
    }

    // ─── Inspection ──────────────────────────────────────────────────────────

    /// Short kind label used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            AstKind::Decl { .. }     => "Decl",
            AstKind::Assign { .. }   => "Assign",
            AstKind::ExprStmt(_)     => "ExprStmt",
            AstKind::Block(_)        => "Block",
            AstKind::Return(_)       => "Return",
            AstKind::If { .. }       => "If",
            AstKind::IfElse { .. }   => "IfElse",
            AstKind::While { .. }    => "While",
            AstKind::For { .. }      => "For",
            AstKind::Break           => "Break",
            AstKind::Continue        => "Continue",
            AstKind::FuncDef { .. }  => "FuncDef",
            AstKind::ArgList(_)      => "ArgList",
            AstKind::Call { .. }     => "Call",
            AstKind::Pipeline { .. } => "Pipe",
            AstKind::IntLit(_)       => "Int",
            AstKind::FloatLit(_)     => "Float",
            AstKind::StringLit(_)    => "String",
            AstKind::Ident(_)        => "Ident",
            AstKind::Type(_)         => "Type",
            AstKind::Number(_)       => "Number",
            AstKind::Str(_)          => "Str",
        }
    }

    /// Render the tree as indented text, two spaces per level.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        // Writing into a String cannot fail.
        let _ = match &self.kind {
            AstKind::IntLit(v)    => writeln!(out, "{pad}Int: {v}"),
            AstKind::FloatLit(v)  => writeln!(out, "{pad}Float: {v:.6}"),
            AstKind::StringLit(s) => writeln!(out, "{pad}String: \"{s}\""),
            AstKind::Type(t)      => writeln!(out, "{pad}Type: {t}"),
            AstKind::Ident(s)     => writeln!(out, "{pad}Ident: {s}"),
            AstKind::Number(v)    => writeln!(out, "{pad}Number: {v:.6}"),
            AstKind::Str(s)       => writeln!(out, "{pad}String: {s}"),
            AstKind::Break        => writeln!(out, "{pad}Break"),
            AstKind::Continue     => writeln!(out, "{pad}Continue"),
            AstKind::ArgList(args) => {
                for a in args {
                    let _ = writeln!(out, "{pad}Arg: {a}");
                }
                Ok(())
            }
            AstKind::Decl { ty, name, expr } => {
                let _ = writeln!(out, "{pad}Decl: {name}");
                ty.dump_into(out, indent + 1);
                expr.dump_into(out, indent + 1);
                Ok(())
            }
            AstKind::Assign { name, expr } => {
                let _ = writeln!(out, "{pad}Assign: {name}");
                expr.dump_into(out, indent + 1);
                Ok(())
            }
            AstKind::ExprStmt(expr) => {
                let _ = writeln!(out, "{pad}ExprStmt:");
                expr.dump_into(out, indent + 1);
                Ok(())
            }
            AstKind::Call { name, args } => {
                let _ = writeln!(out, "{pad}Call: {name}");
                for a in args { a.dump_into(out, indent + 1); }
                Ok(())
            }
            AstKind::Pipeline { left, right } => {
                let _ = writeln!(out, "{pad}Pipe:");
                left.dump_into(out, indent + 1);
                right.dump_into(out, indent + 1);
                Ok(())
            }
            AstKind::Block(stmts) => {
                let _ = writeln!(out, "{pad}Block:");
                for s in stmts { s.dump_into(out, indent + 1); }
                Ok(())
            }
            AstKind::Return(expr) => {
                let _ = writeln!(out, "{pad}Return:");
                if let Some(e) = expr { e.dump_into(out, indent + 1); }
                Ok(())
            }
            AstKind::If { cond, block } => {
                let _ = writeln!(out, "{pad}If:");
                cond.dump_into(out, indent + 1);
                block.dump_into(out, indent + 1);
                Ok(())
            }
            AstKind::IfElse { cond, then_block, else_block } => {
                let _ = writeln!(out, "{pad}IfElse:");
                cond.dump_into(out, indent + 1);
                then_block.dump_into(out, indent + 1);
                else_block.dump_into(out, indent + 1);
                Ok(())
            }
            AstKind::While { cond, block } => {
                let _ = writeln!(out, "{pad}While:");
                cond.dump_into(out, indent + 1);
                block.dump_into(out, indent + 1);
                Ok(())
            }
            AstKind::For { init, cond, update, block } => {
                let _ = writeln!(out, "{pad}For:");
                init.dump_into(out, indent + 1);
                cond.dump_into(out, indent + 1);
                update.dump_into(out, indent + 1);
                block.dump_into(out, indent + 1);
                Ok(())
            }
            AstKind::FuncDef { name, params, body } => {
                let _ = writeln!(out, "{pad}FuncDef: {name}");
                for p in params {
                    let _ = writeln!(out, "{pad}  Param: {p}");
                }
                body.dump_into(out, indent + 1);
                Ok(())
            }
        };
    }
}

// ─── Program ─────────────────────────────────────────────────────────────────

/// Parser output. `root` is a `Block` for anything the parser produces; the
/// interpreter still checks, since trees can also be built by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub root: Ast,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
