//! Pixel filters and edge detection.

use tracing::warn;

use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::imaging::{canny, filters};
use crate::runtime::value::Value;
use crate::syntax::ast::TypeId;
use super::{
    Export, NamespaceInfo, NamespaceProvider, RuntimeState, as_float, as_image, as_int, direction_flag,
    image_err, invalid, take,
};

const IMG: TypeId = TypeId::Image;
const INT: TypeId = TypeId::Int;
const FLOAT: TypeId = TypeId::Float;

const MAX_SHARPEN: i64 = 20;

pub fn filters_exports() -> Vec<Export> {
    vec![
        Export::func("grayscale", &[IMG]),
        Export::func("invert",    &[IMG]),
        Export::func("blur",      &[IMG, INT]),
        Export::func("contrast",  &[IMG, INT, INT]),
        Export::func("brighten",  &[IMG, INT, INT]),
        Export::func("threshold", &[IMG, INT, INT]),
        Export::func("sharpen",   &[IMG, INT, INT]),
        Export::func("blend",     &[IMG, IMG, FLOAT]),
        Export::func("mask",      &[IMG, IMG]),
        Export::func("canny",     &[IMG, FLOAT, INT, INT]),
    ]
}

pub struct FiltersNamespace;

impl NamespaceInfo for FiltersNamespace {
    fn name(&self) -> &'static str { "filters" }
    fn exports(&self) -> Vec<Export> { filters_exports() }
}

impl NamespaceProvider for FiltersNamespace {
    fn call(
        &self,
        name: &str,
        args: Vec<Value>,
        _state: &mut RuntimeState,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        let out = match name {
            "grayscale" => {
                let [img] = take::<1>(name, args, line)?;
                filters::grayscale(as_image(name, 0, &img, line)?).map_err(image_err("grayscale", line))?
            }
            "invert" => {
                let [img] = take::<1>(name, args, line)?;
                filters::invert(as_image(name, 0, &img, line)?).map_err(image_err("invert", line))?
            }
            "blur" => {
                let [img, radius] = take::<2>(name, args, line)?;
                let radius = as_int(name, 1, &radius, line)?;
                filters::box_blur(as_image(name, 0, &img, line)?, radius).map_err(image_err("blur", line))?
            }
            "contrast" => {
                let [img, amount, dir] = take::<3>(name, args, line)?;
                let increase = direction_flag("contrast", as_int(name, 2, &dir, line)?, "0 (reduce) or 1 (increase)", line)?;
                let mut amount = as_int(name, 1, &amount, line)?;
                if !(0..=100).contains(&amount) {
                    let clamped = amount.clamp(0, 100);
                    warn!(line, amount, clamped, "contrast amount outside 0-100, clamping");
                    amount = clamped;
                }
                filters::contrast(as_image(name, 0, &img, line)?, amount, increase)
                    .map_err(image_err("contrast", line))?
            }
            "brighten" => {
                let [img, bias, dir] = take::<3>(name, args, line)?;
                let increase = direction_flag("brighten", as_int(name, 2, &dir, line)?, "0 (darken) or 1 (brighten)", line)?;
                let bias = as_int(name, 1, &bias, line)?;
                filters::brightness(as_image(name, 0, &img, line)?, bias, increase)
                    .map_err(image_err("brighten", line))?
            }
            "threshold" => {
                let [img, value, dir] = take::<3>(name, args, line)?;
                let standard = direction_flag("threshold", as_int(name, 2, &dir, line)?, "0 (inverse) or 1 (standard)", line)?;
                let value = as_int(name, 1, &value, line)?;
                if !(0..=255).contains(&value) {
                    return Err(invalid("threshold", line, format!("value must be within 0-255, got {value}")));
                }
                filters::threshold(as_image(name, 0, &img, line)?, value, standard)
                    .map_err(image_err("threshold", line))?
            }
            "sharpen" => {
                let [img, amount, dir] = take::<3>(name, args, line)?;
                let sharpen = direction_flag("sharpen", as_int(name, 2, &dir, line)?, "0 (soften) or 1 (sharpen)", line)?;
                let amount = sharpen_amount(as_int(name, 1, &amount, line)?, sharpen, line);
                filters::sharpen(as_image(name, 0, &img, line)?, amount, sharpen)
                    .map_err(image_err("sharpen", line))?
            }
            "blend" => {
                let [a, b, alpha] = take::<3>(name, args, line)?;
                let mut alpha = as_float(name, 2, &alpha, line)?;
                if !(0.0..=1.0).contains(&alpha) {
                    let clamped = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
                    warn!(line, alpha, clamped, "blend alpha outside 0-1, clamping");
                    alpha = clamped;
                }
                filters::blend(as_image(name, 0, &a, line)?, as_image(name, 1, &b, line)?, alpha as f32)
                    .map_err(image_err("blend", line))?
            }
            "mask" => {
                let [img, m] = take::<2>(name, args, line)?;
                filters::mask(as_image(name, 0, &img, line)?, as_image(name, 1, &m, line)?)
                    .map_err(image_err("mask", line))?
            }
            "canny" => {
                let [img, sigma, low, high] = take::<4>(name, args, line)?;
                let sigma = as_float(name, 1, &sigma, line)?;
                if !sigma.is_finite() || sigma <= 0.0 {
                    return Err(invalid("canny", line, format!("sigma must be positive and finite, got {sigma}")));
                }
                let low = threshold_byte("low", as_int(name, 2, &low, line)?, line)?;
                let high = threshold_byte("high", as_int(name, 3, &high, line)?, line)?;
                if low > high {
                    return Err(invalid("canny", line, format!("low threshold {low} exceeds high threshold {high}")));
                }
                canny::canny(as_image(name, 0, &img, line)?, sigma as f32, low, high)
                    .map_err(image_err("canny", line))?
            }
            _ => return Err(RuntimeError::new(line, RuntimeErrorKind::UnknownFunction(name.to_string()))),
        };
        Ok(Value::Image(out))
    }
}

/// Soften needs a blur radius of at least 1.
fn sharpen_amount(mut amount: i64, sharpen: bool, line: usize) -> i64 {
    if amount < 0 {
        warn!(line, amount, "sharpen amount is negative, using 0");
        amount = 0;
    }
    if sharpen && amount > MAX_SHARPEN {
        warn!(line, amount, max = MAX_SHARPEN, "sharpen amount too large, clamping");
        amount = MAX_SHARPEN;
    }
    if !sharpen && amount == 0 {
        amount = 1;
    }
    amount
}

fn threshold_byte(which: &str, v: i64, line: usize) -> Result<u8, RuntimeError> {
    u8::try_from(v).map_err(|_| invalid("canny", line, format!("{which} threshold must be within 0-255, got {v}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Image;
    use crate::imaging::codec::MemoryCodec;

    fn state() -> RuntimeState {
        RuntimeState::new(Box::new(MemoryCodec::new()), Box::new(std::io::sink()))
    }

    fn img(rgb: [u8; 3]) -> Value {
        Value::Image(Image::filled(3, 3, rgb).unwrap())
    }

    fn call(name: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        FiltersNamespace.call(name, args, &mut state(), 7)
    }

    fn first_pixel(v: &Value) -> [u8; 3] {
        v.as_image().and_then(|i| i.pixel(0, 0)).unwrap()
    }

    fn invalid_arg(err: RuntimeError) -> &'static str {
        match err.kind {
            RuntimeErrorKind::InvalidArgument { name, .. } => name,
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn invert_pixels() {
        let out = call("invert", vec![img([0, 100, 255])]).unwrap();
        assert_eq!(first_pixel(&out), [255, 155, 0]);
    }

    #[test]
    fn contrast_direction_is_fatal() {
        let err = call("contrast", vec![img([10, 10, 10]), Value::Int(50), Value::Int(2)]).unwrap_err();
        assert_eq!(err.line, 7);
        assert_eq!(invalid_arg(err), "contrast");
    }

    #[test]
    fn contrast_amount_is_clamped() {
        let clamped = call("contrast", vec![img([200, 100, 50]), Value::Int(500), Value::Int(1)]).unwrap();
        let max = call("contrast", vec![img([200, 100, 50]), Value::Int(100), Value::Int(1)]).unwrap();
        assert_eq!(clamped, max);
    }

    #[test]
    fn brighten_both_ways() {
        let up = call("brighten", vec![img([10, 20, 250]), Value::Int(10), Value::Int(1)]).unwrap();
        let down = call("brighten", vec![img([10, 20, 250]), Value::Int(15), Value::Int(0)]).unwrap();
        assert_eq!(first_pixel(&up), [20, 30, 255]);
        assert_eq!(first_pixel(&down), [0, 5, 235]);
        assert!(call("brighten", vec![img([0, 0, 0]), Value::Int(1), Value::Int(-1)]).is_err());
    }

    #[test]
    fn threshold_value_out_of_range_is_fatal() {
        let err = call("threshold", vec![img([1, 1, 1]), Value::Int(256), Value::Int(1)]).unwrap_err();
        assert_eq!(invalid_arg(err), "threshold");
        let err = call("threshold", vec![img([1, 1, 1]), Value::Int(128), Value::Int(3)]).unwrap_err();
        assert_eq!(invalid_arg(err), "threshold");
    }

    #[test]
    fn threshold_directions() {
        let std = call("threshold", vec![img([200, 200, 200]), Value::Int(128), Value::Int(1)]).unwrap();
        let inv = call("threshold", vec![img([200, 200, 200]), Value::Int(128), Value::Int(0)]).unwrap();
        assert_eq!(first_pixel(&std), [255, 255, 255]);
        assert_eq!(first_pixel(&inv), [0, 0, 0]);
    }

    #[test]
    fn sharpen_amount_policy() {
        assert_eq!(sharpen_amount(-3, true, 1), 0);
        assert_eq!(sharpen_amount(35, true, 1), MAX_SHARPEN);
        assert_eq!(sharpen_amount(35, false, 1), 35);
        assert_eq!(sharpen_amount(0, false, 1), 1);
        assert_eq!(sharpen_amount(5, true, 1), 5);
    }

    #[test]
    fn sharpen_uniform_is_unchanged() {
        let out = call("sharpen", vec![img([90, 90, 90]), Value::Int(40), Value::Int(1)]).unwrap();
        assert_eq!(out, img([90, 90, 90]));
    }

    #[test]
    fn blend_alpha_is_clamped() {
        let a = img([0, 0, 0]);
        let b = img([200, 200, 200]);
        let over = call("blend", vec![a.clone(), b.clone(), Value::Float(3.0)]).unwrap();
        assert_eq!(over, b);
        let under = call("blend", vec![a.clone(), b, Value::Float(-1.0)]).unwrap();
        assert_eq!(under, a);
    }

    #[test]
    fn blend_dimension_mismatch() {
        let small = Value::Image(Image::new(1, 1).unwrap());
        let err = call("blend", vec![img([0, 0, 0]), small, Value::Float(0.5)]).unwrap_err();
        assert!(matches!(err.kind, RuntimeErrorKind::Image { name: "blend", .. }));
    }

    #[test]
    fn blur_radius_zero_fails() {
        let err = call("blur", vec![img([1, 2, 3]), Value::Int(0)]).unwrap_err();
        assert!(matches!(err.kind, RuntimeErrorKind::Image { name: "blur", .. }));
    }

    #[test]
    fn mask_keeps_where_red() {
        let m = Value::Image(Image::filled(3, 3, [1, 0, 0]).unwrap());
        let out = call("mask", vec![img([4, 5, 6]), m]).unwrap();
        assert_eq!(first_pixel(&out), [4, 5, 6]);
    }

    #[test]
    fn canny_validation() {
        let bad_sigma = call("canny", vec![img([0, 0, 0]), Value::Float(0.0), Value::Int(10), Value::Int(20)]);
        assert_eq!(invalid_arg(bad_sigma.unwrap_err()), "canny");
        let bad_range = call("canny", vec![img([0, 0, 0]), Value::Float(1.0), Value::Int(-1), Value::Int(20)]);
        assert_eq!(invalid_arg(bad_range.unwrap_err()), "canny");
        let crossed = call("canny", vec![img([0, 0, 0]), Value::Float(1.0), Value::Int(30), Value::Int(20)]);
        assert_eq!(invalid_arg(crossed.unwrap_err()), "canny");
    }

    #[test]
    fn canny_rejects_infinite_and_huge_sigma() {
        let inf = call("canny", vec![img([0, 0, 0]), Value::Float(f64::INFINITY), Value::Int(10), Value::Int(20)]);
        assert_eq!(invalid_arg(inf.unwrap_err()), "canny");
        let huge = call("canny", vec![img([0, 0, 0]), Value::Float(1e19), Value::Int(10), Value::Int(20)]);
        assert!(matches!(huge.unwrap_err().kind, RuntimeErrorKind::Image { name: "canny", .. }));
    }

    #[test]
    fn blur_and_soften_accept_huge_radius() {
        let out = call("blur", vec![img([9, 9, 9]), Value::Int(i64::MAX)]).unwrap();
        assert_eq!(out, img([9, 9, 9]));
        let out = call("sharpen", vec![img([9, 9, 9]), Value::Int(i64::MAX), Value::Int(0)]).unwrap();
        assert_eq!(out, img([9, 9, 9]));
    }

    #[test]
    fn canny_uniform_has_no_edges() {
        let out = call("canny", vec![img([120, 60, 30]), Value::Float(1.0), Value::Int(10), Value::Int(40)]).unwrap();
        assert!(out.as_image().unwrap().data().iter().all(|&b| b == 0));
    }
}
