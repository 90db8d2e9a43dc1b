//! Mask asset - the image drawn over each face
//!
//! Loaded once before the frame loop starts and shared read-only afterwards.

use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;

use crate::{FacemaskError, FacemaskResult};

/// Immutable mask image with known intrinsic size
#[derive(Debug, Clone)]
pub struct MaskAsset {
    image: Arc<RgbaImage>,
}

impl MaskAsset {
    /// Wrap a decoded image. Zero-sized images are rejected.
    pub fn from_image(image: RgbaImage) -> FacemaskResult<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(FacemaskError::InvalidMask { width, height });
        }
        Ok(MaskAsset {
            image: Arc::new(image),
        })
    }

    /// Decode a mask from disk (PNG or JPEG)
    pub fn load(path: impl AsRef<Path>) -> FacemaskResult<Self> {
        let path = path.as_ref();
        let decoded = image::open(path).map_err(|e| FacemaskError::AssetLoadFailure {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_image(decoded.into_rgba8())
    }

    /// Decode a mask from an in-memory encoded image
    pub fn from_bytes(bytes: &[u8]) -> FacemaskResult<Self> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| FacemaskError::AssetLoadFailure {
                path: "<memory>".into(),
                reason: e.to_string(),
            })?;
        Self::from_image(decoded.into_rgba8())
    }

    pub fn natural_width(&self) -> u32 {
        self.image.width()
    }

    pub fn natural_height(&self) -> u32 {
        self.image.height()
    }

    /// Height-to-width ratio
    pub fn aspect(&self) -> f32 {
        self.natural_height() as f32 / self.natural_width() as f32
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect() {
        let mask = MaskAsset::from_image(RgbaImage::new(200, 100)).unwrap();
        assert_eq!(mask.natural_width(), 200);
        assert_eq!(mask.natural_height(), 100);
        assert_eq!(mask.aspect(), 0.5);
    }

    #[test]
    fn test_zero_sized_rejected() {
        let err = MaskAsset::from_image(RgbaImage::new(0, 10)).unwrap_err();
        assert!(matches!(
            err,
            FacemaskError::InvalidMask {
                width: 0,
                height: 10
            }
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = MaskAsset::load("/nonexistent/cat_mask.png").unwrap_err();
        assert!(matches!(err, FacemaskError::AssetLoadFailure { .. }));
    }

    #[test]
    fn test_from_bytes_garbage() {
        let err = MaskAsset::from_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, FacemaskError::AssetLoadFailure { .. }));
    }
}
