//! Tree-walking interpreter. Runs the top-level block of a program in order.
//! Every function call is dispatched through the NamespaceRegistry; the
//! interpreter itself implements no builtins.

use tracing::trace;

use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::namespaces::{NamespaceRegistry, RuntimeState};
use crate::runtime::env::Environment;
use crate::runtime::value::Value;
use crate::syntax::ast::{self, Ast, AstKind, TypeId};

pub struct Interpreter<'a> {
    program: &'a ast::Program,
    registry: &'a NamespaceRegistry,
    env: Environment,
    runtime_state: RuntimeState,
}

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a ast::Program, registry: &'a NamespaceRegistry) -> Self {
        Self {
            program,
            registry,
            env: Environment::new(),
            runtime_state: RuntimeState::default(),
        }
    }

    /// Replace the codec and output sink builtins use.
    pub fn with_runtime_state(mut self, rs: RuntimeState) -> Self {
        self.runtime_state = rs;
        self
    }

    /// Start from an existing set of bindings.
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    pub fn env(&self) -> &Environment { &self.env }

    /// Hand back the bindings and runtime state, consuming the interpreter.
    pub fn into_parts(self) -> (Environment, RuntimeState) {
        (self.env, self.runtime_state)
    }

    // ─── Entry point ──────────────────────────────────────────────────────────

    /// Executes every top-level statement. The first error abandons the run.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        let program = self.program;
        let AstKind::Block(stmts) = &program.root.kind else {
            return Err(RuntimeError::new(
                program.root.span.line,
                RuntimeErrorKind::MalformedProgram(program.root.kind_name()),
            ));
        };
        for stmt in stmts {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    // ─── Statements ───────────────────────────────────────────────────────────

    pub fn exec_stmt(&mut self, stmt: &Ast) -> Result<(), RuntimeError> {
        let line = stmt.span.line;
        match &stmt.kind {
            AstKind::Decl { ty, name, expr } => {
                let value = self.eval_expr(expr)?;
                let AstKind::Type(declared) = ty.kind else {
                    return Err(RuntimeError::new(line, RuntimeErrorKind::MalformedDeclaration(name.clone())));
                };
                let value = coerce_decl(name, declared, value, line)?;
                self.env.set(name.as_str(), value);
                Ok(())
            }
            // No check against the declared type.
            AstKind::Assign { name, expr } => {
                let value = self.eval_expr(expr)?;
                self.env.set(name.as_str(), value);
                Ok(())
            }
            AstKind::ExprStmt(expr) => {
                self.eval_expr(expr)?;
                Ok(())
            }
            AstKind::FuncDef { name, params, .. } => {
                trace!(name = name.as_str(), params = params.len(), line, "function definition skipped");
                Ok(())
            }
            _ => Err(RuntimeError::new(line, RuntimeErrorKind::UnknownStatement(stmt.kind_name()))),
        }
    }

    // ─── Expressions ──────────────────────────────────────────────────────────

    pub fn eval_expr(&mut self, expr: &Ast) -> Result<Value, RuntimeError> {
        let line = expr.span.line;
        match &expr.kind {
            AstKind::IntLit(v)    => Ok(Value::Int(*v)),
            AstKind::FloatLit(v)  => Ok(Value::Float(*v)),
            AstKind::StringLit(s) => Ok(Value::Str(s.clone())),
            AstKind::Ident(name)  => self.env.get(name).map_err(|kind| RuntimeError::new(line, kind)),

            AstKind::Call { name, args } => {
                let args = self.eval_args(args)?;
                self.eval_call(name, args, line)
            }

            AstKind::Pipeline { left, right } => {
                let first = self.eval_expr(left)?;
                let AstKind::Call { name, args } = &right.kind else {
                    return Err(RuntimeError::new(right.span.line, RuntimeErrorKind::MalformedPipeline));
                };
                let mut all = Vec::with_capacity(args.len() + 1);
                all.push(first);
                for arg in args {
                    all.push(self.eval_expr(arg)?);
                }
                self.eval_call(name, all, right.span.line)
            }

            AstKind::Number(_) | AstKind::Str(_) => {
                Err(RuntimeError::new(line, RuntimeErrorKind::ObsoleteNode(expr.kind_name())))
            }
            _ => Err(RuntimeError::new(line, RuntimeErrorKind::UnknownExpression(expr.kind_name()))),
        }
    }

    /// Left to right; the first failure drops everything evaluated so far.
    fn eval_args(&mut self, args: &[Ast]) -> Result<Vec<Value>, RuntimeError> {
        args.iter().map(|a| self.eval_expr(a)).collect()
    }

    pub fn eval_call(&mut self, name: &str, args: Vec<Value>, line: usize) -> Result<Value, RuntimeError> {
        self.registry.call(name, args, &mut self.runtime_state, line)
    }
}

fn coerce_decl(name: &str, declared: TypeId, value: Value, line: usize) -> Result<Value, RuntimeError> {
    value.coerce(declared).map_err(|v| {
        RuntimeError::new(line, RuntimeErrorKind::DeclType {
            name: name.to_string(),
            declared,
            got: v.type_name(),
        })
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::codec::MemoryCodec;
    use crate::syntax::ast::Span;

    fn at(node: Ast, line: usize) -> Ast {
        node.with_span(Span::new(line, 1))
    }

    fn run(root: Ast) -> Result<Environment, RuntimeError> {
        let program = ast::Program { root };
        let registry = NamespaceRegistry::standard();
        let state = RuntimeState::new(Box::new(MemoryCodec::new()), Box::new(std::io::sink()));
        let mut interp = Interpreter::new(&program, &registry).with_runtime_state(state);
        interp.run()?;
        Ok(interp.into_parts().0)
    }

    #[test]
    fn decl_coerces_float_to_int() {
        let env = run(Ast::block(vec![Ast::decl(Ast::type_node(TypeId::Int), "x", Ast::float_lit(2.9))])).unwrap();
        assert_eq!(env.peek("x"), Some(&Value::Int(2)));
    }

    #[test]
    fn decl_type_mismatch() {
        let root = Ast::block(vec![at(Ast::decl(Ast::type_node(TypeId::Image), "x", Ast::int_lit(1)), 3)]);
        let err = run(root).unwrap_err();
        assert_eq!(err.line, 3);
        assert!(matches!(err.kind, RuntimeErrorKind::DeclType { declared: TypeId::Image, got: "int", .. }));
    }

    #[test]
    fn decl_without_type_node() {
        let root = Ast::block(vec![Ast::decl(Ast::ident("int"), "x", Ast::int_lit(1))]);
        assert!(matches!(run(root).unwrap_err().kind, RuntimeErrorKind::MalformedDeclaration(n) if n == "x"));
    }

    #[test]
    fn assign_skips_type_check() {
        let root = Ast::block(vec![
            Ast::decl(Ast::type_node(TypeId::Int), "x", Ast::int_lit(1)),
            Ast::assign("x", Ast::string_lit("now a string")),
        ]);
        assert_eq!(run(root).unwrap().peek("x"), Some(&Value::Str("now a string".into())));
    }

    #[test]
    fn root_must_be_block() {
        let err = run(Ast::int_lit(1)).unwrap_err();
        assert!(matches!(err.kind, RuntimeErrorKind::MalformedProgram("Int")));
    }

    #[test]
    fn control_flow_is_rejected() {
        let root = Ast::block(vec![at(Ast::while_stmt(Ast::int_lit(1), Ast::block(vec![])), 2)]);
        let err = run(root).unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(err.kind, RuntimeErrorKind::UnknownStatement("While")));
    }

    #[test]
    fn func_def_is_a_no_op() {
        let root = Ast::block(vec![Ast::func_def("f", vec!["a".into()], Ast::block(vec![]))]);
        assert!(run(root).unwrap().is_empty());
    }

    #[test]
    fn obsolete_literals_rejected() {
        let root = Ast::block(vec![Ast::expr_stmt(Ast::number(1.0))]);
        assert!(matches!(run(root).unwrap_err().kind, RuntimeErrorKind::ObsoleteNode("Number")));
        let root = Ast::block(vec![Ast::expr_stmt(Ast::string("s"))]);
        assert!(matches!(run(root).unwrap_err().kind, RuntimeErrorKind::ObsoleteNode("Str")));
    }

    #[test]
    fn pipeline_right_side_must_be_call() {
        let root = Ast::block(vec![Ast::expr_stmt(Ast::pipe(Ast::int_lit(1), Ast::ident("f")))]);
        assert!(matches!(run(root).unwrap_err().kind, RuntimeErrorKind::MalformedPipeline));
    }

    #[test]
    fn pipeline_left_evaluated_first() {
        let root = Ast::block(vec![Ast::expr_stmt(Ast::pipe(Ast::ident("missing"), Ast::int_lit(1)))]);
        assert!(matches!(run(root).unwrap_err().kind, RuntimeErrorKind::UndefinedVariable(_)));
    }

    #[test]
    fn type_node_is_not_an_expression() {
        let root = Ast::block(vec![Ast::expr_stmt(Ast::type_node(TypeId::Int))]);
        assert!(matches!(run(root).unwrap_err().kind, RuntimeErrorKind::UnknownExpression("Type")));
    }

    #[test]
    fn call_args_evaluated_before_dispatch() {
        let root = Ast::block(vec![Ast::expr_stmt(Ast::call("sparkle", vec![Ast::ident("nope")]))]);
        assert!(matches!(run(root).unwrap_err().kind, RuntimeErrorKind::UndefinedVariable(_)));
    }
}
