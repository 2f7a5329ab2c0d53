//! Geometric transforms: crop, resize, rotate, flip.

use super::{CHANNELS, Image, ImageError, alloc_exact, output_dims};

/// Copies the `w` x `h` region whose top-left corner is `(x, y)`.
pub fn crop(img: &Image, x: i64, y: i64, w: i64, h: i64) -> Result<Image, ImageError> {
    let out_of_bounds = || ImageError::OutOfBounds { x, y, w, h, width: img.width(), height: img.height() };

    if x < 0 || y < 0 || w <= 0 || h <= 0 {
        return Err(out_of_bounds());
    }
    if x.saturating_add(w) > img.width() as i64 || y.saturating_add(h) > img.height() as i64 {
        return Err(out_of_bounds());
    }

    let (x, y, w, h) = (x as usize, y as usize, w as usize, h as usize);
    let row = w * CHANNELS;
    let mut out = alloc_exact(row * h)?;
    for yy in y..y + h {
        let start = img.offset(x, yy);
        out.extend_from_slice(&img.data()[start..start + row]);
    }
    Image::from_raw(w as u32, h as u32, out)
}

/// Nearest-neighbour resize: destination `(x, y)` samples source
/// `(floor(x * old_w / new_w), floor(y * old_h / new_h))`.
pub fn resize(img: &Image, new_w: i64, new_h: i64) -> Result<Image, ImageError> {
    let (new_w, new_h) = output_dims(new_w, new_h)?;
    let x_ratio = img.width() as f32 / new_w as f32;
    let y_ratio = img.height() as f32 / new_h as f32;
    let max_x = img.width() as usize - 1;
    let max_y = img.height() as usize - 1;

    let len = (new_w as usize)
        .checked_mul(new_h as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or(ImageError::Allocation(usize::MAX))?;
    let mut out = alloc_exact(len)?;
    for y in 0..new_h as usize {
        let sy = ((y as f32 * y_ratio) as usize).min(max_y);
        for x in 0..new_w as usize {
            let sx = ((x as f32 * x_ratio) as usize).min(max_x);
            let i = img.offset(sx, sy);
            out.extend_from_slice(&img.data()[i..i + CHANNELS]);
        }
    }
    Image::from_raw(new_w, new_h, out)
}

/// Resizes to `trunc(w * factor)` x `trunc(h * factor)`.
pub fn scale(img: &Image, factor: f32) -> Result<Image, ImageError> {
    if factor.is_nan() || factor <= 0.0 {
        return Err(ImageError::InvalidParameter(format!("scale factor must be positive, got {factor}")));
    }
    let w = (img.width() as f32 * factor) as i64;
    let h = (img.height() as f32 * factor) as i64;
    if w <= 0 || h <= 0 {
        return Err(ImageError::InvalidParameter(format!(
            "scale factor {factor} gives an empty {w}x{h} image"
        )));
    }
    resize(img, w, h)
}

/// Quarter turn. `1` is clockwise, `-1` counter-clockwise; width and height swap.
pub fn rotate90(img: &Image, direction: i64) -> Result<Image, ImageError> {
    let clockwise = match direction {
        1 => true,
        -1 => false,
        other => {
            return Err(ImageError::InvalidParameter(format!(
                "rotate direction must be 1 or -1, got {other}"
            )));
        }
    };

    let (w_in, h_in) = (img.width() as usize, img.height() as usize);
    let (w_out, h_out) = (h_in, w_in);
    let mut out = alloc_exact(img.data().len())?;

    for y_out in 0..h_out {
        for x_out in 0..w_out {
            let (sx, sy) = if clockwise {
                (y_out, h_in - 1 - x_out)
            } else {
                (w_in - 1 - y_out, x_out)
            };
            let i = img.offset(sx, sy);
            out.extend_from_slice(&img.data()[i..i + CHANNELS]);
        }
    }
    Image::from_raw(img.height(), img.width(), out)
}

/// Mirrors rows: the top row becomes the bottom row.
pub fn flip_x(img: &Image) -> Result<Image, ImageError> {
    let row = img.width() as usize * CHANNELS;
    let mut out = alloc_exact(img.data().len())?;
    for src in img.data().chunks_exact(row).rev() {
        out.extend_from_slice(src);
    }
    Image::from_raw(img.width(), img.height(), out)
}

/// Mirrors columns: the left column becomes the right column.
pub fn flip_y(img: &Image) -> Result<Image, ImageError> {
    let row = img.width() as usize * CHANNELS;
    let mut out = alloc_exact(img.data().len())?;
    for src in img.data().chunks_exact(row) {
        for px in src.chunks_exact(CHANNELS).rev() {
            out.extend_from_slice(px);
        }
    }
    Image::from_raw(img.width(), img.height(), out)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// 3x2 image whose pixel `(x, y)` is `[10*y + x; 3]`.
    fn grid() -> Image {
        let mut data = Vec::new();
        for y in 0..2u8 {
            for x in 0..3u8 {
                let v = 10 * y + x;
                data.extend_from_slice(&[v, v, v]);
            }
        }
        Image::from_raw(3, 2, data).unwrap()
    }

    fn reds(img: &Image) -> Vec<u8> {
        img.data().chunks(CHANNELS).map(|p| p[0]).collect()
    }

    #[test]
    fn crop_region() {
        let out = crop(&grid(), 1, 0, 2, 2).unwrap();
        assert_eq!(out.dimensions(), (2, 2));
        assert_eq!(reds(&out), vec![1, 2, 11, 12]);
    }

    #[test]
    fn crop_whole_image() {
        assert_eq!(crop(&grid(), 0, 0, 3, 2).unwrap(), grid());
    }

    #[test]
    fn crop_out_of_bounds() {
        let img = grid();
        assert!(matches!(crop(&img, 2, 0, 2, 1), Err(ImageError::OutOfBounds { .. })));
        assert!(matches!(crop(&img, 0, 1, 1, 2), Err(ImageError::OutOfBounds { .. })));
        assert!(matches!(crop(&img, -1, 0, 1, 1), Err(ImageError::OutOfBounds { .. })));
        assert!(matches!(crop(&img, 0, 0, 0, 1), Err(ImageError::OutOfBounds { .. })));
    }

    #[test]
    fn resize_nearest_upscale() {
        let img = Image::from_raw(2, 1, vec![1, 1, 1, 2, 2, 2]).unwrap();
        let out = resize(&img, 4, 2).unwrap();
        assert_eq!(out.dimensions(), (4, 2));
        assert_eq!(reds(&out), vec![1, 1, 2, 2, 1, 1, 2, 2]);
    }

    #[test]
    fn resize_nearest_downscale() {
        let out = resize(&grid(), 1, 1).unwrap();
        assert_eq!(reds(&out), vec![0]);
    }

    #[test]
    fn resize_rejects_non_positive() {
        assert!(matches!(resize(&grid(), 0, 1), Err(ImageError::InvalidParameter(_))));
    }

    #[test]
    fn resize_too_large_is_an_allocation_error() {
        assert!(matches!(resize(&grid(), 4_000_000_000, 4_000_000_000), Err(ImageError::Allocation(_))));
    }

    #[test]
    fn scale_truncates() {
        let img = Image::new(5, 3).unwrap();
        assert_eq!(scale(&img, 0.5).unwrap().dimensions(), (2, 1));
        assert_eq!(scale(&img, 2.0).unwrap().dimensions(), (10, 6));
    }

    #[test]
    fn scale_to_nothing_fails() {
        let img = Image::new(5, 3).unwrap();
        assert!(scale(&img, 0.1).is_err());
        assert!(scale(&img, 0.0).is_err());
        assert!(scale(&img, -1.0).is_err());
    }

    #[test]
    fn rotate_clockwise() {
        // 0 1 2        10  0
        // 10 11 12  -> 11  1
        //              12  2
        let out = rotate90(&grid(), 1).unwrap();
        assert_eq!(out.dimensions(), (2, 3));
        assert_eq!(reds(&out), vec![10, 0, 11, 1, 12, 2]);
    }

    #[test]
    fn rotate_counter_clockwise() {
        // 0 1 2         2 12
        // 10 11 12  ->  1 11
        //               0 10
        let out = rotate90(&grid(), -1).unwrap();
        assert_eq!(reds(&out), vec![2, 12, 1, 11, 0, 10]);
    }

    #[test]
    fn rotate_there_and_back() {
        let img = grid();
        assert_eq!(rotate90(&rotate90(&img, 1).unwrap(), -1).unwrap(), img);
    }

    #[test]
    fn rotate_bad_direction() {
        assert!(matches!(rotate90(&grid(), 2), Err(ImageError::InvalidParameter(_))));
        assert!(rotate90(&grid(), 0).is_err());
    }

    #[test]
    fn flips() {
        assert_eq!(reds(&flip_x(&grid()).unwrap()), vec![10, 11, 12, 0, 1, 2]);
        assert_eq!(reds(&flip_y(&grid()).unwrap()), vec![2, 1, 0, 12, 11, 10]);
    }
}
