//! Canny edge detector.
//!
//! Stages run over single-channel planes of `width * height` samples:
//! luminance, separable Gaussian smoothing, Sobel gradients, non-maximum
//! suppression, then double threshold with hysteresis. The final plane is
//! expanded back to RGB.

use std::f32::consts::PI;

use tracing::trace;

use super::{CHANNELS, Image, ImageError, alloc_exact, alloc_zeroed};

/// Marker for pixels between the two thresholds, before hysteresis.
pub const WEAK: u8 = 50;
/// Marker for confirmed edge pixels.
pub const STRONG: u8 = 255;

pub fn canny(img: &Image, sigma: f32, low: u8, high: u8) -> Result<Image, ImageError> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ImageError::InvalidParameter(format!("canny sigma must be positive and finite, got {sigma}")));
    }
    if low > high {
        return Err(ImageError::InvalidParameter(format!(
            "canny low threshold {low} is greater than high threshold {high}"
        )));
    }

    let (w, h) = (img.width() as usize, img.height() as usize);

    let mono = luminance(img)?;
    trace!(w, h, "canny: luminance");

    let blurred = gaussian_blur(&mono, w, h, sigma)?;
    drop(mono);
    trace!(sigma, "canny: gaussian");

    let (magnitude, direction) = sobel(&blurred, w, h)?;
    drop(blurred);
    trace!("canny: sobel");

    let mut edges = non_maximum_suppression(&magnitude, &direction, w, h)?;
    drop((magnitude, direction));
    trace!("canny: nms");

    hysteresis(&mut edges, w, h, low, high);
    trace!(low, high, "canny: hysteresis");

    let mut out = alloc_exact(edges.len() * CHANNELS)?;
    for v in edges {
        out.extend_from_slice(&[v, v, v]);
    }
    Image::from_raw(img.width(), img.height(), out)
}

// ─── Stages ──────────────────────────────────────────────────────────────────

fn luminance(img: &Image) -> Result<Vec<u8>, ImageError> {
    let mut mono = alloc_exact(img.data().len() / CHANNELS)?;
    mono.extend(img.data().chunks_exact(CHANNELS).map(|p| {
        (0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64) as u8
    }));
    Ok(mono)
}

/// Normalised 1-D Gaussian of radius `ceil(3 sigma)`.
pub fn gaussian_kernel(sigma: f32) -> Result<Vec<f32>, ImageError> {
    let radius = (3.0 * sigma as f64).ceil();
    if !radius.is_finite() || radius < 0.0 {
        return Err(ImageError::InvalidParameter(format!("gaussian sigma {sigma} has no finite radius")));
    }
    let radius = radius as i64;
    let len = radius
        .checked_mul(2)
        .and_then(|n| n.checked_add(1))
        .and_then(|n| usize::try_from(n).ok())
        .ok_or(ImageError::Allocation(usize::MAX))?;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let norm = (PI * two_sigma_sq).sqrt();

    let mut kernel = alloc_exact(len)?;
    kernel.extend((-radius..=radius).map(|i| {
        let i = i as f32;
        (-(i * i) / two_sigma_sq).exp() / norm
    }));
    let sum: f32 = kernel.iter().sum();
    for k in kernel.iter_mut() {
        *k /= sum;
    }
    Ok(kernel)
}

/// Horizontal then vertical pass with edge-clamped sampling. Each pass
/// truncates back to bytes.
fn gaussian_blur(src: &[u8], w: usize, h: usize, sigma: f32) -> Result<Vec<u8>, ImageError> {
    let kernel = gaussian_kernel(sigma)?;
    let radius = (kernel.len() / 2) as i64;
    let clamp = |v: i64, max: usize| v.clamp(0, max as i64 - 1) as usize;

    let mut tmp = alloc_exact(src.len())?;
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0.0f32;
            for (k, &kv) in (-radius..=radius).zip(&kernel) {
                sum += src[y * w + clamp(x as i64 + k, w)] as f32 * kv;
            }
            tmp.push(sum as u8);
        }
    }

    let mut out = alloc_exact(src.len())?;
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0.0f32;
            for (k, &kv) in (-radius..=radius).zip(&kernel) {
                sum += tmp[clamp(y as i64 + k, h) * w + x] as f32 * kv;
            }
            out.push(sum as u8);
        }
    }
    Ok(out)
}

const SOBEL_X: [[f32; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_Y: [[f32; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Gradient magnitude and direction (radians) for interior pixels; the border is 0.
fn sobel(src: &[u8], w: usize, h: usize) -> Result<(Vec<f32>, Vec<f32>), ImageError> {
    let mut magnitude = alloc_zeroed(src.len())?;
    let mut direction = alloc_zeroed(src.len())?;

    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let (mut gx, mut gy) = (0.0f32, 0.0f32);
            for dy in 0..3 {
                for dx in 0..3 {
                    let v = src[(y + dy - 1) * w + (x + dx - 1)] as f32;
                    gx += v * SOBEL_X[dy][dx];
                    gy += v * SOBEL_Y[dy][dx];
                }
            }
            let idx = y * w + x;
            magnitude[idx] = (gx * gx + gy * gy).sqrt();
            direction[idx] = gy.atan2(gx);
        }
    }
    Ok((magnitude, direction))
}

/// Keeps a pixel only if its magnitude is at least that of both neighbours
/// along the gradient direction, clamped to 255.
fn non_maximum_suppression(
    magnitude: &[f32],
    direction: &[f32],
    w: usize,
    h: usize,
) -> Result<Vec<u8>, ImageError> {
    let mut out = alloc_zeroed(magnitude.len())?;

    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let idx = y * w + x;
            let mag = magnitude[idx];
            if mag == 0.0 {
                continue;
            }

            let mut angle = direction[idx] * 180.0 / PI;
            if angle < 0.0 {
                angle += 180.0;
            }

            let (n1, n2) = if (0.0..22.5).contains(&angle) || (157.5..=180.0).contains(&angle) {
                (idx - 1, idx + 1)
            } else if (22.5..67.5).contains(&angle) {
                (idx - w + 1, idx + w - 1)
            } else if (67.5..112.5).contains(&angle) {
                (idx - w, idx + w)
            } else {
                (idx - w - 1, idx + w + 1)
            };

            if mag >= magnitude[n1] && mag >= magnitude[n2] {
                out[idx] = if mag > 255.0 { 255 } else { mag as u8 };
            }
        }
    }
    Ok(out)
}

/// Classifies every sample as strong, weak or zero, then promotes weak
/// samples 8-connected to a strong one. Uses a worklist so deep edge chains
/// cannot exhaust the stack. Unreached weak samples are cleared.
pub fn hysteresis(data: &mut [u8], w: usize, h: usize, low: u8, high: u8) {
    let mut stack = Vec::new();
    for (i, v) in data.iter_mut().enumerate() {
        *v = if *v >= high {
            stack.push(i);
            STRONG
        } else if *v >= low {
            WEAK
        } else {
            0
        };
    }

    while let Some(i) = stack.pop() {
        let (x, y) = ((i % w) as i64, (i / w) as i64);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                    continue;
                }
                let n = ny as usize * w + nx as usize;
                if data[n] == WEAK {
                    data[n] = STRONG;
                    stack.push(n);
                }
            }
        }
    }

    for v in data.iter_mut() {
        if *v == WEAK {
            *v = 0;
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(img: &Image) -> Vec<u8> {
        img.data().chunks(CHANNELS).map(|p| p[0]).collect()
    }

    /// Left half black, right half white.
    fn step_edge(w: u32, h: u32) -> Image {
        let mut data = Vec::new();
        for _ in 0..h {
            for x in 0..w {
                let v = if x < w / 2 { 0 } else { 255 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        Image::from_raw(w, h, data).unwrap()
    }

    #[test]
    fn kernel_is_normalised_and_symmetric() {
        let k = gaussian_kernel(1.4).unwrap();
        assert_eq!(k.len(), 2 * 5 + 1);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!((k[0] - k[10]).abs() < 1e-7);
        assert!(k[5] > k[4]);
    }

    #[test]
    fn uniform_image_has_no_edges() {
        let img = Image::filled(12, 9, [120, 60, 200]).unwrap();
        let out = canny(&img, 1.0, 20, 50).unwrap();
        assert_eq!(out.dimensions(), (12, 9));
        assert!(out.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn step_edge_is_detected() {
        let out = canny(&step_edge(16, 8), 1.0, 20, 60).unwrap();
        let p = plane(&out);
        // every interior row has an edge pixel and only 0/255 survive
        for y in 1..7 {
            assert!(p[y * 16..(y + 1) * 16].contains(&STRONG), "row {y} has no edge");
        }
        assert!(p.iter().all(|&v| v == 0 || v == STRONG));
    }

    #[test]
    fn output_is_grey() {
        let out = canny(&step_edge(10, 6), 0.8, 10, 40).unwrap();
        assert!(out.data().chunks(3).all(|p| p[0] == p[1] && p[1] == p[2]));
    }

    #[test]
    fn low_above_high_rejected() {
        let img = Image::new(4, 4).unwrap();
        assert!(matches!(canny(&img, 1.0, 100, 50), Err(ImageError::InvalidParameter(_))));
    }

    #[test]
    fn sigma_must_be_positive() {
        let img = Image::new(4, 4).unwrap();
        assert!(canny(&img, 0.0, 10, 50).is_err());
        assert!(canny(&img, -1.0, 10, 50).is_err());
    }

    #[test]
    fn sigma_must_be_finite() {
        let img = Image::new(4, 4).unwrap();
        assert!(matches!(canny(&img, f32::INFINITY, 10, 50), Err(ImageError::InvalidParameter(_))));
        assert!(canny(&img, f32::NAN, 10, 50).is_err());
    }

    #[test]
    fn huge_sigma_kernel_is_an_error() {
        // radius saturates at i64::MAX, so the kernel length overflows
        assert!(matches!(gaussian_kernel(1e19), Err(ImageError::Allocation(_))));
        assert!(gaussian_kernel(f32::MAX).is_err());
        assert!(canny(&Image::new(4, 4).unwrap(), 1e19, 10, 50).is_err());
    }

    #[test]
    fn tiny_image_is_all_zero() {
        let img = Image::filled(2, 1, [255, 0, 0]).unwrap();
        assert!(canny(&img, 1.0, 10, 50).unwrap().data().iter().all(|&b| b == 0));
    }

    #[test]
    fn hysteresis_promotes_connected_weak() {
        // strong at 0, a weak chain through 1..3, an isolated weak at 5
        let mut data = vec![200, 80, 80, 80, 0, 80];
        hysteresis(&mut data, 6, 1, 60, 150);
        assert_eq!(data, vec![255, 255, 255, 255, 0, 0]);
    }

    #[test]
    fn hysteresis_follows_diagonals() {
        #[rustfmt::skip]
        let mut data = vec![
            200, 0,  0,
            0,   80, 0,
            0,   0,  80,
        ];
        hysteresis(&mut data, 3, 3, 60, 150);
        assert_eq!(data, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]);
    }

    #[test]
    fn hysteresis_long_chain_no_overflow() {
        let w = 200_000;
        let mut data = vec![100u8; w];
        data[0] = 250;
        hysteresis(&mut data, w, 1, 50, 200);
        assert!(data.iter().all(|&v| v == STRONG));
    }

    #[test]
    fn hysteresis_weak_only_is_cleared() {
        let mut data = vec![80; 9];
        hysteresis(&mut data, 3, 3, 60, 150);
        assert!(data.iter().all(|&v| v == 0));
    }
}
