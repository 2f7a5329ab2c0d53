//! Reading and writing image files.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use super::{Image, ImageError};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to load `{path}`: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to save `{path}`: {source}")]
    Save {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("`{path}` decoded to an unusable image: {source}")]
    Decode {
        path: String,
        #[source]
        source: ImageError,
    },

    #[error("no image stored at `{0}`")]
    NotFound(String),
}

/// Source and sink for images addressed by path.
pub trait ImageCodec {
    fn load(&self, path: &str) -> Result<Image, CodecError>;
    fn save(&self, path: &str, img: &Image) -> Result<(), CodecError>;
}

// ─── Filesystem ──────────────────────────────────────────────────────────────

/// Decodes any format the `image` crate is built with, always as RGB8.
/// Always encodes PNG, whatever the file extension says.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileCodec;

impl ImageCodec for FileCodec {
    fn load(&self, path: &str) -> Result<Image, CodecError> {
        let rgb = image::open(Path::new(path))
            .map_err(|source| CodecError::Load { path: path.to_string(), source })?
            .to_rgb8();
        let (w, h) = rgb.dimensions();
        debug!(path, w, h, "decoded image");
        Image::from_raw(w, h, rgb.into_raw())
            .map_err(|source| CodecError::Decode { path: path.to_string(), source })
    }

    fn save(&self, path: &str, img: &Image) -> Result<(), CodecError> {
        image::save_buffer_with_format(
            Path::new(path),
            img.data(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
            image::ImageFormat::Png,
        )
        .map_err(|source| CodecError::Save { path: path.to_string(), source })?;
        debug!(path, w = img.width(), h = img.height(), "encoded png");
        Ok(())
    }
}

// ─── In memory ───────────────────────────────────────────────────────────────

/// Keeps images in a shared map keyed by path. Clones share the same map, so
/// a caller can keep a handle and inspect what a script saved.
#[derive(Debug, Default, Clone)]
pub struct MemoryCodec {
    images: Rc<RefCell<HashMap<String, Image>>>,
}

impl MemoryCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, img: Image) {
        self.images.borrow_mut().insert(path.into(), img);
    }

    pub fn get(&self, path: &str) -> Option<Image> {
        self.images.borrow().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.images.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.borrow().is_empty()
    }
}

impl ImageCodec for MemoryCodec {
    fn load(&self, path: &str) -> Result<Image, CodecError> {
        self.get(path).ok_or_else(|| CodecError::NotFound(path.to_string()))
    }

    fn save(&self, path: &str, img: &Image) -> Result<(), CodecError> {
        self.insert(path, img.clone());
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
