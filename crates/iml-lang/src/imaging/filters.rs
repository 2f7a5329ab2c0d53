//! Per-pixel and neighbourhood filters.

use super::{CHANNELS, Image, ImageError, alloc_exact, clamp_u8, same_dims};

/// 3x3 convolution kernel, row-major.
pub type Kernel3 = [[f32; 3]; 3];

/// Integer luminance `(299 R + 587 G + 114 B) / 1000` written to all three channels.
pub fn grayscale(img: &Image) -> Result<Image, ImageError> {
    let mut out = alloc_exact(img.data().len())?;
    for px in img.data().chunks_exact(CHANNELS) {
        let y = luma(px);
        out.extend_from_slice(&[y, y, y]);
    }
    Image::from_raw(img.width(), img.height(), out)
}

#[inline]
fn luma(px: &[u8]) -> u8 {
    let (r, g, b) = (px[0] as u32, px[1] as u32, px[2] as u32);
    ((299 * r + 587 * g + 114 * b) / 1000) as u8
}

pub fn invert(img: &Image) -> Result<Image, ImageError> {
    img.map_bytes(|b| 255 - b)
}

/// Adds `bias` to every byte when `increase` is set, subtracts it otherwise.
pub fn brightness(img: &Image, bias: i64, increase: bool) -> Result<Image, ImageError> {
    let bias = if increase { bias } else { bias.saturating_neg() };
    img.map_bytes(|b| (b as i64).saturating_add(bias).clamp(0, 255) as u8)
}

/// Scales each byte's distance from 128 by `1 ± amount/100`. `amount` is
/// clamped to `0..=100`.
pub fn contrast(img: &Image, amount: i64, increase: bool) -> Result<Image, ImageError> {
    let amount = amount.clamp(0, 100) as f32;
    let factor = if increase { 1.0 + amount / 100.0 } else { 1.0 - amount / 100.0 };
    img.map_bytes(|b| clamp_u8(factor * (b as f32 - 128.0) + 128.0))
}

/// Binarises the grayscale luminance. With `standard` set, pixels brighter
/// than `level` become white; otherwise they become black.
pub fn threshold(img: &Image, level: i64, standard: bool) -> Result<Image, ImageError> {
    let level = level.clamp(0, 255) as u8;
    let gray = grayscale(img)?;
    gray.map_bytes(|v| {
        let above = v > level;
        if above == standard { 255 } else { 0 }
    })
}

/// Applies `kernel` to interior pixels. Border pixels are copied unchanged.
pub fn convolve(img: &Image, kernel: &Kernel3) -> Result<Image, ImageError> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let src = img.data();
    let mut out = img.clone();
    let dst = out.data_mut();

    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let mut sum = [0.0f32; CHANNELS];
            for (ky, row) in kernel.iter().enumerate() {
                for (kx, &k) in row.iter().enumerate() {
                    let i = ((y + ky - 1) * w + (x + kx - 1)) * CHANNELS;
                    for c in 0..CHANNELS {
                        sum[c] += src[i + c] as f32 * k;
                    }
                }
            }
            let i = (y * w + x) * CHANNELS;
            for c in 0..CHANNELS {
                dst[i + c] = clamp_u8(sum[c]);
            }
        }
    }
    Ok(out)
}

/// Sharpens with a Laplacian-style kernel of strength `amount / 10`, or when
/// `sharpen` is false softens with a box blur of radius `max(amount, 1)`.
pub fn sharpen(img: &Image, amount: i64, sharpen: bool) -> Result<Image, ImageError> {
    if !sharpen {
        return box_blur(img, amount.max(1));
    }
    let k = amount as f32 / 10.0;
    let kernel = [
        [0.0, -k, 0.0],
        [-k, 1.0 + 4.0 * k, -k],
        [0.0, -k, 0.0],
    ];
    convolve(img, &kernel)
}

/// Mean over the in-bounds `(2r+1)²` window around each pixel.
pub fn box_blur(img: &Image, radius: i64) -> Result<Image, ImageError> {
    if radius < 1 {
        return Err(ImageError::InvalidParameter(format!("blur radius must be at least 1, got {radius}")));
    }
    let (w, h) = (img.width() as i64, img.height() as i64);
    // A window wider than the image covers all of it.
    let radius = radius.min(w.max(h));
    let src = img.data();
    let mut out = alloc_exact(src.len())?;

    for y in 0..h {
        let (y0, y1) = ((y - radius).max(0), (y + radius).min(h - 1));
        for x in 0..w {
            let (x0, x1) = ((x - radius).max(0), (x + radius).min(w - 1));
            let mut sum = [0u64; CHANNELS];
            for yy in y0..=y1 {
                for xx in x0..=x1 {
                    let i = img.offset(xx as usize, yy as usize);
                    for c in 0..CHANNELS {
                        sum[c] += src[i + c] as u64;
                    }
                }
            }
            let count = ((y1 - y0 + 1) * (x1 - x0 + 1)) as u64;
            out.extend(sum.iter().map(|s| (s / count) as u8));
        }
    }
    Image::from_raw(img.width(), img.height(), out)
}

/// `a * (1 - alpha) + b * alpha`, alpha clamped to `[0, 1]`. Evaluated as
/// `a + (b - a) * alpha` so equal bytes come back unchanged.
pub fn blend(a: &Image, b: &Image, alpha: f32) -> Result<Image, ImageError> {
    same_dims(a, b)?;
    let alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
    let mut out = alloc_exact(a.data().len())?;
    out.extend(a.data().iter().zip(b.data()).map(|(&p, &q)| {
        let p = p as f32;
        clamp_u8(p + (q as f32 - p) * alpha)
    }));
    Image::from_raw(a.width(), a.height(), out)
}

/// Keeps `img` where the mask's red channel is non-zero, black elsewhere.
pub fn mask(img: &Image, mask: &Image) -> Result<Image, ImageError> {
    same_dims(img, mask)?;
    let mut out = alloc_exact(img.data().len())?;
    for (px, m) in img.data().chunks_exact(CHANNELS).zip(mask.data().chunks_exact(CHANNELS)) {
        if m[0] > 0 {
            out.extend_from_slice(px);
        } else {
            out.extend_from_slice(&[0; CHANNELS]);
        }
    }
    Image::from_raw(img.width(), img.height(), out)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
