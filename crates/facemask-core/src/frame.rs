//! Video frame descriptors

use std::sync::Arc;

use image::RgbaImage;

/// Pixel dimensions of a decoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A decoded video frame handed to the landmark source
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Monotonic frame counter assigned by the video source
    pub sequence: u64,
    pub size: FrameSize,
    pub pixels: Arc<RgbaImage>,
}

impl VideoFrame {
    pub fn new(sequence: u64, pixels: Arc<RgbaImage>) -> Self {
        let (width, height) = pixels.dimensions();
        VideoFrame {
            sequence,
            size: FrameSize::new(width, height),
            pixels,
        }
    }

    /// Fully transparent frame of the given size
    pub fn blank(sequence: u64, size: FrameSize) -> Self {
        Self::new(sequence, Arc::new(RgbaImage::new(size.width, size.height)))
    }
}
