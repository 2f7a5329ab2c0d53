use std::io::Write;

use tracing::debug;

use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::imaging::codec::{FileCodec, ImageCodec};
use crate::imaging::{Image, ImageError};
use crate::runtime::value::Value;
use crate::syntax::ast::TypeId;

// ─── Runtime state ────────────────────────────────────────────────────────────

/// Interpreter-level state passed to every builtin call: where images are
/// read from and written to, and where `print` output goes.
pub struct RuntimeState {
    pub codec: Box<dyn ImageCodec>,
    pub out: Box<dyn Write>,
}

impl RuntimeState {
    pub fn new(codec: Box<dyn ImageCodec>, out: Box<dyn Write>) -> Self {
        Self { codec, out }
    }
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self { codec: Box::new(FileCodec), out: Box::new(std::io::stdout()) }
    }
}

pub mod filters;
pub mod geometry;
pub mod io;

// ─── Export ───────────────────────────────────────────────────────────────────

/// Signature of one builtin. `Int` and `Float` parameters take either
/// numeric value; `Unknown` takes anything.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub name: &'static str,
    pub params: &'static [TypeId],
    pub variadic: bool,
}

impl Export {
    pub const fn func(name: &'static str, params: &'static [TypeId]) -> Self {
        Self { name, params, variadic: false }
    }

    /// Any number of arguments of any type.
    pub const fn variadic(name: &'static str) -> Self {
        Self { name, params: &[], variadic: true }
    }
}

// ─── Lookup interface ─────────────────────────────────────────────────────────

/// What a namespace exports. No dependency on runtime state.
pub trait NamespaceInfo: Send + Sync {
    fn name(&self) -> &'static str;
    fn exports(&self) -> Vec<Export>;

    fn get_export(&self, name: &str) -> Option<Export> {
        self.exports().into_iter().find(|e| e.name == name)
    }
}

// ─── Runtime interface ────────────────────────────────────────────────────────

/// Executes builtins. `args` has already been checked against the export's
/// signature; it is moved in and dropped when the call returns.
pub trait NamespaceProvider: NamespaceInfo {
    fn call(
        &self,
        name: &str,
        args: Vec<Value>,
        state: &mut RuntimeState,
        line: usize,
    ) -> Result<Value, RuntimeError>;
}

// ─── Registry ─────────────────────────────────────────────────────────────────

pub struct NamespaceRegistry {
    providers: Vec<Box<dyn NamespaceProvider>>,
}

impl NamespaceRegistry {
    pub fn new() -> Self { Self { providers: Vec::new() } }

    pub fn register(&mut self, p: Box<dyn NamespaceProvider>) { self.providers.push(p); }

    /// The first namespace exporting `function`, with the export.
    pub fn find(&self, function: &str) -> Option<(&dyn NamespaceProvider, Export)> {
        self.providers
            .iter()
            .find_map(|p| p.get_export(function).map(|e| (p.as_ref(), e)))
    }

    /// Every exported function name, in registration order.
    pub fn function_names(&self) -> Vec<&'static str> {
        self.providers.iter().flat_map(|p| p.exports()).map(|e| e.name).collect()
    }

    /// Resolves `name`, validates `args` against its signature, and calls it.
    pub fn call(
        &self,
        name: &str,
        args: Vec<Value>,
        state: &mut RuntimeState,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        let Some((provider, export)) = self.find(name) else {
            return Err(RuntimeError::new(line, RuntimeErrorKind::UnknownFunction(name.to_string())));
        };
        check_args(&export, &args, line)?;
        debug!(function = name, namespace = provider.name(), argc = args.len(), line, "dispatch");
        provider.call(name, args, state, line)
    }

    pub fn standard() -> Self {
        let mut r = Self::new();
        r.register(Box::new(io::IoNamespace));
        r.register(Box::new(filters::FiltersNamespace));
        r.register(Box::new(geometry::GeometryNamespace));
        r
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self { Self::standard() }
}

fn check_args(export: &Export, args: &[Value], line: usize) -> Result<(), RuntimeError> {
    if export.variadic {
        return Ok(());
    }
    check_argc(export.name, args, export.params.len(), line)?;
    for (i, (ty, v)) in export.params.iter().zip(args).enumerate() {
        if !ty.accepts(v) {
            return Err(arg_type(export.name, i, *ty, v, line));
        }
    }
    Ok(())
}

// ─── Shared helpers ───────────────────────────────────────────────────────────

pub(crate) fn check_argc(name: &str, args: &[Value], n: usize, line: usize) -> Result<(), RuntimeError> {
    if args.len() != n {
        Err(RuntimeError::new(line, RuntimeErrorKind::Arity {
            name: name.to_string(),
            expected: n,
            got: args.len(),
        }))
    } else {
        Ok(())
    }
}

/// Moves exactly `N` arguments out of `args`.
pub(crate) fn take<const N: usize>(name: &str, args: Vec<Value>, line: usize) -> Result<[Value; N], RuntimeError> {
    check_argc(name, &args, N, line)?;
    args.try_into().map_err(|rest: Vec<Value>| {
        RuntimeError::new(line, RuntimeErrorKind::Arity { name: name.to_string(), expected: N, got: rest.len() })
    })
}

/// `index` is zero-based; messages use one-based positions.
fn arg_type(name: &str, index: usize, expected: TypeId, got: &Value, line: usize) -> RuntimeError {
    RuntimeError::new(line, RuntimeErrorKind::ArgType {
        name: name.to_string(),
        position: index + 1,
        expected,
        got: got.type_name(),
    })
}

pub(crate) fn as_int(name: &str, index: usize, v: &Value, line: usize) -> Result<i64, RuntimeError> {
    v.as_int().ok_or_else(|| arg_type(name, index, TypeId::Int, v, line))
}

pub(crate) fn as_float(name: &str, index: usize, v: &Value, line: usize) -> Result<f64, RuntimeError> {
    v.as_float().ok_or_else(|| arg_type(name, index, TypeId::Float, v, line))
}

pub(crate) fn into_string(name: &str, index: usize, v: Value, line: usize) -> Result<String, RuntimeError> {
    match v {
        Value::Str(s) => Ok(s),
        other => Err(arg_type(name, index, TypeId::String, &other, line)),
    }
}

pub(crate) fn as_image<'v>(name: &str, index: usize, v: &'v Value, line: usize) -> Result<&'v Image, RuntimeError> {
    v.as_image().ok_or_else(|| arg_type(name, index, TypeId::Image, v, line))
}

/// Validates a 0/1 direction flag; `true` for 1.
pub(crate) fn direction_flag(name: &'static str, v: i64, meaning: &str, line: usize) -> Result<bool, RuntimeError> {
    match v {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(invalid(name, line, format!("direction must be {meaning}, got {other}"))),
    }
}

pub(crate) fn invalid(name: &'static str, line: usize, message: impl Into<String>) -> RuntimeError {
    RuntimeError::new(line, RuntimeErrorKind::InvalidArgument { name, message: message.into() })
}

/// Wraps an algorithm failure with the builtin that raised it.
pub(crate) fn image_err(name: &'static str, line: usize) -> impl FnOnce(ImageError) -> RuntimeError {
    move |source| RuntimeError::new(line, RuntimeErrorKind::Image { name, source })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::codec::MemoryCodec;

    fn state() -> RuntimeState {
        RuntimeState::new(Box::new(MemoryCodec::new()), Box::new(std::io::sink()))
    }

    fn img() -> Value {
        Value::Image(Image::filled(2, 2, [10, 20, 30]).unwrap())
    }

    #[test]
    fn standard_exports_every_builtin() {
        let names = NamespaceRegistry::standard().function_names();
        for f in [
            "load", "save", "print", "crop", "blur", "grayscale", "invert", "contrast", "brighten",
            "threshold", "sharpen", "blend", "mask", "resize", "scale", "rotate", "canny", "flip_x",
            "flip_y",
        ] {
            assert!(names.contains(&f), "missing builtin {f}");
        }
    }

    #[test]
    fn unknown_function() {
        let r = NamespaceRegistry::standard();
        let err = r.call("sparkle", vec![], &mut state(), 3).unwrap_err();
        assert_eq!(err.line, 3);
        assert!(matches!(err.kind, RuntimeErrorKind::UnknownFunction(n) if n == "sparkle"));
    }

    #[test]
    fn arity_checked_before_types() {
        let r = NamespaceRegistry::standard();
        let err = r.call("blur", vec![Value::Int(1)], &mut state(), 1).unwrap_err();
        assert!(matches!(err.kind, RuntimeErrorKind::Arity { expected: 2, got: 1, .. }));
    }

    #[test]
    fn invert_wrong_arity_is_arity_error() {
        let r = NamespaceRegistry::standard();
        let err = r.call("invert", vec![img(), img()], &mut state(), 1).unwrap_err();
        assert!(matches!(err.kind, RuntimeErrorKind::Arity { expected: 1, got: 2, .. }));
    }

    #[test]
    fn arg_type_position_is_one_based() {
        let r = NamespaceRegistry::standard();
        let err = r.call("blur", vec![img(), Value::Str("2".into())], &mut state(), 1).unwrap_err();
        match err.kind {
            RuntimeErrorKind::ArgType { position, expected, got, .. } => {
                assert_eq!(position, 2);
                assert_eq!(expected, TypeId::Int);
                assert_eq!(got, "string");
            }
            other => panic!("expected ArgType, got {other:?}"),
        }
    }

    #[test]
    fn numeric_params_coerce() {
        let r = NamespaceRegistry::standard();
        let out = r.call("blur", vec![img(), Value::Float(1.9)], &mut state(), 1).unwrap();
        assert!(matches!(out, Value::Image(_)));
    }

    #[test]
    fn take_moves_exact_count() {
        let [a, b] = take::<2>("f", vec![Value::Int(1), Value::Int(2)], 1).unwrap();
        assert_eq!((a, b), (Value::Int(1), Value::Int(2)));
        assert!(take::<2>("f", vec![Value::Int(1)], 1).is_err());
    }

    #[test]
    fn direction_flags() {
        assert_eq!(direction_flag("f", 0, "0 or 1", 1).unwrap(), false);
        assert_eq!(direction_flag("f", 1, "0 or 1", 1).unwrap(), true);
        assert!(direction_flag("f", 2, "0 or 1", 1).is_err());
    }
}
