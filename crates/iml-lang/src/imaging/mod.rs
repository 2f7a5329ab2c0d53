//! Pixel-level image algorithms.
//!
//! Every operation takes its input by reference and returns a freshly
//! allocated [`Image`]; inputs are never mutated. Buffers are reserved with
//! `try_reserve_exact`, so running out of memory surfaces as
//! [`ImageError::Allocation`] instead of aborting the process.

pub mod canny;
pub mod codec;
pub mod filters;
pub mod geometry;

use thiserror::Error;

/// Interleaved RGB, one byte per channel.
pub const CHANNELS: usize = 3;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImageError {
    #[error("failed to allocate {0} bytes")]
    Allocation(usize),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("region x={x} y={y} w={w} h={h} is out of bounds for a {width}x{height} image")]
    OutOfBounds { x: i64, y: i64, w: i64, h: i64, width: u32, height: u32 },

    #[error("image dimensions must match ({0}x{1} vs {2}x{3})")]
    DimensionMismatch(u32, u32, u32, u32),

    #[error("image dimensions must be non-zero, got {0}x{1}")]
    EmptyDimensions(u32, u32),

    #[error("buffer holds {got} bytes, a {width}x{height} RGB image needs {expected}")]
    BufferSize { width: u32, height: u32, expected: usize, got: usize },
}

/// An owned RGB raster. Width and height are always at least 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Image {
    /// A black image.
    pub fn new(width: u32, height: u32) -> Result<Self, ImageError> {
        let len = buffer_len(width, height)?;
        Ok(Self { width, height, data: alloc_zeroed(len)? })
    }

    /// An image where every pixel is `rgb`.
    pub fn filled(width: u32, height: u32, rgb: [u8; CHANNELS]) -> Result<Self, ImageError> {
        let mut img = Self::new(width, height)?;
        for px in img.data.chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&rgb);
        }
        Ok(img)
    }

    /// Wraps an existing interleaved RGB buffer.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ImageError> {
        let expected = buffer_len(width, height)?;
        if data.len() != expected {
            return Err(ImageError::BufferSize { width, height, expected, got: data.len() });
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn data(&self) -> &[u8] { &self.data }
    pub fn into_raw(self) -> Vec<u8> { self.data }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Byte offset of pixel `(x, y)`. Callers guarantee the coordinates are in range.
    #[inline]
    pub(crate) fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width as usize + x) * CHANNELS
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; CHANNELS]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x as usize, y as usize);
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// New image of the same size with `f` applied to every byte.
    pub(crate) fn map_bytes(&self, f: impl Fn(u8) -> u8) -> Result<Image, ImageError> {
        let mut out = alloc_exact(self.data.len())?;
        out.extend(self.data.iter().map(|&b| f(b)));
        Ok(Image { width: self.width, height: self.height, data: out })
    }
}

// ─── Allocation ──────────────────────────────────────────────────────────────

fn buffer_len(width: u32, height: u32) -> Result<usize, ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::EmptyDimensions(width, height));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or(ImageError::Allocation(usize::MAX))
}

/// An empty vector with exactly `len` bytes of capacity.
pub(crate) fn alloc_exact<T>(len: usize) -> Result<Vec<T>, ImageError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| ImageError::Allocation(len.saturating_mul(std::mem::size_of::<T>())))?;
    Ok(v)
}

pub(crate) fn alloc_zeroed<T: Clone + Default>(len: usize) -> Result<Vec<T>, ImageError> {
    let mut v = alloc_exact(len)?;
    v.resize(len, T::default());
    Ok(v)
}

/// Checks `w`/`h` as requested output dimensions.
pub(crate) fn output_dims(w: i64, h: i64) -> Result<(u32, u32), ImageError> {
    match (u32::try_from(w), u32::try_from(h)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(ImageError::InvalidParameter(format!(
            "output dimensions must be positive, got {w}x{h}"
        ))),
    }
}

pub(crate) fn same_dims(a: &Image, b: &Image) -> Result<(), ImageError> {
    if a.dimensions() != b.dimensions() {
        return Err(ImageError::DimensionMismatch(a.width, a.height, b.width, b.height));
    }
    Ok(())
}

/// Clamp to the byte range and truncate toward zero.
#[inline]
pub(crate) fn clamp_u8(v: f32) -> u8 {
    if v < 0.0 { 0 } else if v > 255.0 { 255 } else { v as u8 }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
