//! Image files and console output: `load`, `save`, `print`.

use std::io::Write;

use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::runtime::value::Value;
use crate::syntax::ast::TypeId;
use super::{Export, NamespaceInfo, NamespaceProvider, RuntimeState, as_image, into_string, take};

pub fn io_exports() -> Vec<Export> {
    vec![
        Export::func("load", &[TypeId::String]),
        Export::func("save", &[TypeId::String, TypeId::Image]),
        Export::variadic("print"),
    ]
}

pub struct IoNamespace;

impl NamespaceInfo for IoNamespace {
    fn name(&self) -> &'static str { "io" }
    fn exports(&self) -> Vec<Export> { io_exports() }
}

impl NamespaceProvider for IoNamespace {
    fn call(
        &self,
        name: &str,
        args: Vec<Value>,
        state: &mut RuntimeState,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        match name {
            "load" => {
                let [path] = take::<1>(name, args, line)?;
                let path = into_string(name, 0, path, line)?;
                let img = state.codec.load(&path).map_err(|e| RuntimeError::new(line, e.into()))?;
                Ok(Value::Image(img))
            }
            "save" => {
                let [path, img] = take::<2>(name, args, line)?;
                let path = into_string(name, 0, path, line)?;
                let img = as_image(name, 1, &img, line)?;
                state.codec.save(&path, img).map_err(|e| RuntimeError::new(line, e.into()))?;
                Ok(Value::None)
            }
            "print" => {
                let output = |e: std::io::Error| RuntimeError::new(line, RuntimeErrorKind::Output(e.to_string()));
                for arg in &args {
                    write!(state.out, "{arg}").map_err(output)?;
                }
                state.out.flush().map_err(output)?;
                Ok(Value::None)
            }
            _ => Err(RuntimeError::new(line, RuntimeErrorKind::UnknownFunction(name.to_string()))),
        }
    }
}
