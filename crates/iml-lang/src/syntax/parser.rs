use crate::syntax::ast::*;
use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parses the whole token stream into a single root block.
    pub fn parse(mut self) -> Result<Program, Vec<Error>> {
        let mut errors = Vec::new();
        let mut stmts = Vec::new();
        let root_span = self.span();

        while !self.is_at_end() {
            let pos_before = self.pos;

            match self.parse_stmt() {
                Ok(s) => stmts.push(s),
                Err(e) => { errors.push(e); self.recover(); }
            }

            // guarantee progress: a stray `}` at top level is consumed here
            if self.pos == pos_before {
                self.advance();
            }
        }

        if errors.is_empty() {
            Ok(Program { root: Ast::block(stmts).with_span(root_span) })
        } else {
            Err(errors)
        }
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn parse_block(&mut self) -> Result<Ast, Error> {
        let span = self.span();
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Ast::block(stmts).with_span(span))
    }

    fn parse_stmt(&mut self) -> Result<Ast, Error> {
        match self.peek_kind() {
            TokenKind::Func   => self.parse_func_def(),
            TokenKind::If     => self.parse_if(),
            TokenKind::While  => self.parse_while(),
            TokenKind::For    => self.parse_for(),
            TokenKind::LBrace => self.parse_block(),
            _ => {
                let stmt = self.parse_simple_stmt()?;
                self.matches(TokenKind::Semicolon);
                Ok(stmt)
            }
        }
    }

    /// Statements that may be followed by an optional `;`. Also used for the
    /// init and update clauses of `for`, where the separator is not optional.
    fn parse_simple_stmt(&mut self) -> Result<Ast, Error> {
        match self.peek_kind() {
            k if k.is_type_keyword() => self.parse_decl(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => {
                let span = self.span();
                self.advance();
                Ok(Ast::brk().with_span(span))
            }
            TokenKind::Continue => {
                let span = self.span();
                self.advance();
                Ok(Ast::cont().with_span(span))
            }
            TokenKind::Ident(_) if self.peek_next_is(TokenKind::Eq) => self.parse_assign(),
            _ => {
                let span = self.span();
                let expr = self.parse_expr()?;
                Ok(Ast::expr_stmt(expr).with_span(span))
            }
        }
    }

    fn parse_decl(&mut self) -> Result<Ast, Error> {
        let span = self.span();
        let ty = self.parse_type()?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::Eq)?;
        let expr = self.parse_expr()?;
        Ok(Ast::decl(ty, name, expr).with_span(span))
    }

    fn parse_assign(&mut self) -> Result<Ast, Error> {
        let span = self.span();
        let name = self.expect_ident()?;
        self.expect(TokenKind::Eq)?;
        let expr = self.parse_expr()?;
        Ok(Ast::assign(name, expr).with_span(span))
    }

    fn parse_return(&mut self) -> Result<Ast, Error> {
        let span = self.span();
        self.expect(TokenKind::Return)?;
        let value = if self.check(TokenKind::Semicolon) || self.check(TokenKind::RBrace) || self.is_at_end() {
            None
        } else {
            Some(self.parse_expr()?)
        };
        Ok(Ast::ret(value).with_span(span))
    }

    fn parse_if(&mut self) -> Result<Ast, Error> {
        let span = self.span();
        self.expect(TokenKind::If)?;
        let cond = self.parse_condition()?;
        let then_block = self.parse_block()?;
        if self.matches(TokenKind::Else) {
            let else_block = self.parse_block()?;
            Ok(Ast::if_else(cond, then_block, else_block).with_span(span))
        } else {
            Ok(Ast::if_stmt(cond, then_block).with_span(span))
        }
    }

    fn parse_while(&mut self) -> Result<Ast, Error> {
        let span = self.span();
        self.expect(TokenKind::While)?;
        let cond = self.parse_condition()?;
        let block = self.parse_block()?;
        Ok(Ast::while_stmt(cond, block).with_span(span))
    }

    fn parse_for(&mut self) -> Result<Ast, Error> {
        let span = self.span();
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;
        let init = self.parse_simple_stmt()?;
        self.expect(TokenKind::Semicolon)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        let update = self.parse_simple_stmt()?;
        self.expect(TokenKind::RParen)?;
        let block = self.parse_block()?;
        Ok(Ast::for_stmt(init, cond, update, block).with_span(span))
    }

    /// `'(' expr ')'` as used by `if` and `while`.
    fn parse_condition(&mut self) -> Result<Ast, Error> {
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        Ok(cond)
    }

    // ─── Function definition ─────────────────────────────────────────────────

    /// `func name(a, b) { ... }`. Parameters are gathered into an `ArgList`
    /// node first and then moved into the definition.
    fn parse_func_def(&mut self) -> Result<Ast, Error> {
        let span = self.span();
        self.expect(TokenKind::Func)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;

        let mut list: Option<Ast> = None;
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            let param = self.expect_ident()?;
            list = Some(match list {
                None => Ast::arg_list(param),
                Some(l) => l.append_arg(param),
            });
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RParen)?;

        let params = match list.map(|l| l.kind) {
            Some(AstKind::ArgList(args)) => args,
            _ => Vec::new(),
        };
        let body = self.parse_block()?;
        Ok(Ast::func_def(name, params, body).with_span(span))
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    /// `primary ('|>' primary)*`, folded to the left.
    fn parse_expr(&mut self) -> Result<Ast, Error> {
        let mut left = self.parse_primary()?;
        while self.check(TokenKind::Pipe) {
            let span = self.span();
            self.advance();
            let right = self.parse_primary()?;
            left = Ast::pipe(left, right).with_span(span);
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Ast, Error> {
        let tok = self.peek().clone();
        let span = Span::new(tok.line, tok.column);

        match tok.kind {
            TokenKind::Int(v)       => { self.advance(); Ok(Ast::int_lit(v).with_span(span)) }
            TokenKind::Float(v)     => { self.advance(); Ok(Ast::float_lit(v).with_span(span)) }
            TokenKind::StringLit(s) => { self.advance(); Ok(Ast::string_lit(s).with_span(span)) }

            // negative numeric literal
            TokenKind::Minus => {
                self.advance();
                let next = self.advance();
                match next.kind {
                    TokenKind::Int(v)   => Ok(Ast::int_lit(-v).with_span(span)),
                    TokenKind::Float(v) => Ok(Ast::float_lit(-v).with_span(span)),
                    _ => Err(self.error_at(&next, "expected number after `-`")),
                }
            }

            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }

            TokenKind::Ident(_) => self.parse_call_or_ident(),

            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_call_or_ident(&mut self) -> Result<Ast, Error> {
        let tok = self.advance();
        let span = Span::new(tok.line, tok.column);
        let name = match tok.kind {
            TokenKind::Ident(s) => s,
            _ => return Err(self.error_at(&tok, "expected identifier")),
        };

        if self.check(TokenKind::LParen) {
            self.advance();
            let args = self.parse_arg_list()?;
            self.expect(TokenKind::RParen)?;
            Ok(Ast::call(name, args).with_span(span))
        } else {
            Ok(Ast::ident(name).with_span(span))
        }
    }

    fn parse_arg_list(&mut self) -> Result<Vec<Ast>, Error> {
        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            args.push(self.parse_expr()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        Ok(args)
    }

    // ─── Types ───────────────────────────────────────────────────────────────

    fn parse_type(&mut self) -> Result<Ast, Error> {
        let tok = self.advance();
        match tok.kind.type_id() {
            Some(t) => Ok(Ast::type_node(t).with_span(Span::new(tok.line, tok.column))),
            None => Err(self.error_at(&tok, "expected type")),
        }
    }

    // ─── Token primitives ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind.clone()
    }

    fn peek_next_is(&self, kind: TokenKind) -> bool {
        if self.pos + 1 < self.tokens.len() {
            self.tokens[self.pos + 1].kind == kind
        } else {
            false
        }
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) { self.advance(); true } else { false }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Error> {
        if self.check(kind.clone()) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(Error::new(
                ErrorCode::P002,
                tok.line,
                tok.column,
                format!("expected {:?}, found {:?}", kind, tok.kind),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, Error> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Ident(s) => Ok(s),
            _ => Err(self.error_at(&tok, "expected identifier")),
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn span(&self) -> Span {
        let tok = self.peek();
        Span::new(tok.line, tok.column)
    }

    fn unexpected(&self, expected: &str) -> Error {
        let tok = self.peek();
        Error::new(
            ErrorCode::P001,
            tok.line,
            tok.column,
            format!("expected {}, found {:?}", expected, tok.kind),
        )
    }

    fn error_at(&self, tok: &Token, msg: &str) -> Error {
        Error::new(ErrorCode::P001, tok.line, tok.column, msg)
    }

    /// Skip tokens until something that looks like the start of a new
    /// statement. A `;` is consumed and ends recovery.
    fn recover(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Semicolon => { self.advance(); break; }
                k if k.is_type_keyword() => break,
                TokenKind::Eof
                | TokenKind::Func
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::RBrace => break,
                _ => { self.advance(); }
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
