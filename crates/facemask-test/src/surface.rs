//! Recording surface - a raster surface that keeps a log of draw calls

use facemask_core::{FrameSize, MaskAsset};
use facemask_visual::{RasterSurface, Surface};

/// A draw call, in device space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    /// Device position of the local origin (the placement center)
    pub origin: (f32, f32),
    /// Rotation of local space, radians
    pub rotation: f32,
    /// Local rect passed to `draw_image`
    pub rect: (f32, f32, f32, f32),
    /// Index of the frame (count of `clear` calls) the draw belongs to
    pub frame: usize,
}

impl DrawCall {
    pub fn width(&self) -> f32 {
        self.rect.2
    }

    pub fn height(&self) -> f32 {
        self.rect.3
    }
}

/// Raster surface that also records resizes, clears and draws
pub struct RecordingSurface {
    raster: RasterSurface,
    draws: Vec<DrawCall>,
    resizes: Vec<FrameSize>,
    clears: usize,
    unbalanced_restores: usize,
    depth: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        RecordingSurface {
            raster: RasterSurface::new(FrameSize::default()),
            draws: Vec::new(),
            resizes: Vec::new(),
            clears: 0,
            unbalanced_restores: 0,
            depth: 0,
        }
    }

    pub fn raster(&self) -> &RasterSurface {
        &self.raster
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Draws made since the most recent clear
    pub fn draws_in_last_frame(&self) -> Vec<DrawCall> {
        self.draws
            .iter()
            .filter(|d| d.frame == self.clears)
            .copied()
            .collect()
    }

    pub fn resizes(&self) -> &[FrameSize] {
        &self.resizes
    }

    pub fn clears(&self) -> usize {
        self.clears
    }

    /// Whether every save was matched by a restore
    pub fn is_balanced(&self) -> bool {
        self.depth == 0 && self.unbalanced_restores == 0
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> FrameSize {
        self.raster.size()
    }

    fn resize(&mut self, size: FrameSize) {
        self.resizes.push(size);
        self.raster.resize(size);
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.raster.clear();
    }

    fn save(&mut self) {
        self.depth += 1;
        self.raster.save();
    }

    fn restore(&mut self) {
        match self.depth.checked_sub(1) {
            Some(depth) => self.depth = depth,
            None => self.unbalanced_restores += 1,
        }
        self.raster.restore();
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.raster.translate(x, y);
    }

    fn rotate(&mut self, radians: f32) {
        self.raster.rotate(radians);
    }

    fn draw_image(&mut self, mask: &MaskAsset, x: f32, y: f32, width: f32, height: f32) {
        let t = self.raster.transform();
        self.draws.push(DrawCall {
            origin: (t.e, t.f),
            rotation: t.b.atan2(t.a),
            rect: (x, y, width, height),
            frame: self.clears,
        });
        self.raster.draw_image(mask, x, y, width, height);
    }
}
