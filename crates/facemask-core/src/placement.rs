//! Placement - where and how to draw the mask for one face in one frame

/// 2D affine placement: draw centered at `center`, rotated by `rotation`
/// radians, scaled to `width` x `height` pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub center: (f32, f32),
    pub rotation: f32,
    pub width: f32,
    pub height: f32,
}

impl Placement {
    /// Below this size (either axis, pixels) nothing visible is drawn
    pub const MIN_VISIBLE_EXTENT: f32 = 1e-3;

    /// True when the placement covers no visible area
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width.abs() < Self::MIN_VISIBLE_EXTENT
            || self.height.abs() < Self::MIN_VISIBLE_EXTENT
    }
}
