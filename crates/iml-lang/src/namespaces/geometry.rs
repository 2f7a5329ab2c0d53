//! Geometric transforms.

use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::imaging::geometry;
use crate::runtime::value::Value;
use crate::syntax::ast::TypeId;
use super::{Export, NamespaceInfo, NamespaceProvider, RuntimeState, as_float, as_image, as_int, image_err, take};

const IMG: TypeId = TypeId::Image;
const INT: TypeId = TypeId::Int;

pub fn geometry_exports() -> Vec<Export> {
    vec![
        Export::func("crop",   &[IMG, INT, INT, INT, INT]),
        Export::func("resize", &[IMG, INT, INT]),
        Export::func("scale",  &[IMG, TypeId::Float]),
        Export::func("rotate", &[IMG, INT]),
        Export::func("flip_x", &[IMG]),
        Export::func("flip_y", &[IMG]),
    ]
}

pub struct GeometryNamespace;

impl NamespaceInfo for GeometryNamespace {
    fn name(&self) -> &'static str { "geometry" }
    fn exports(&self) -> Vec<Export> { geometry_exports() }
}

impl NamespaceProvider for GeometryNamespace {
    fn call(
        &self,
        name: &str,
        args: Vec<Value>,
        _state: &mut RuntimeState,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        let out = match name {
            "crop" => {
                let [img, x, y, w, h] = take::<5>(name, args, line)?;
                let (x, y) = (as_int(name, 1, &x, line)?, as_int(name, 2, &y, line)?);
                let (w, h) = (as_int(name, 3, &w, line)?, as_int(name, 4, &h, line)?);
                geometry::crop(as_image(name, 0, &img, line)?, x, y, w, h).map_err(image_err("crop", line))?
            }
            "resize" => {
                let [img, w, h] = take::<3>(name, args, line)?;
                let (w, h) = (as_int(name, 1, &w, line)?, as_int(name, 2, &h, line)?);
                geometry::resize(as_image(name, 0, &img, line)?, w, h).map_err(image_err("resize", line))?
            }
            "scale" => {
                let [img, factor] = take::<2>(name, args, line)?;
                let factor = as_float(name, 1, &factor, line)? as f32;
                geometry::scale(as_image(name, 0, &img, line)?, factor).map_err(image_err("scale", line))?
            }
            "rotate" => {
                let [img, dir] = take::<2>(name, args, line)?;
                let dir = as_int(name, 1, &dir, line)?;
                geometry::rotate90(as_image(name, 0, &img, line)?, dir).map_err(image_err("rotate", line))?
            }
            "flip_x" => {
                let [img] = take::<1>(name, args, line)?;
                geometry::flip_x(as_image(name, 0, &img, line)?).map_err(image_err("flip_x", line))?
            }
            "flip_y" => {
                let [img] = take::<1>(name, args, line)?;
                geometry::flip_y(as_image(name, 0, &img, line)?).map_err(image_err("flip_y", line))?
            }
            _ => return Err(RuntimeError::new(line, RuntimeErrorKind::UnknownFunction(name.to_string()))),
        };
        Ok(Value::Image(out))
    }
}
