//! Compositor - paints the mask onto a frame-sized drawing surface
//!
//! The surface contract mirrors a 2D canvas context: a transform stack
//! (save/restore, translate, rotate) and an image draw in local space.

use facemask_core::{FrameSize, MaskAsset, Placement};

/// A 2D drawing target sized to the video frame
pub trait Surface {
    /// Current pixel size
    fn size(&self) -> FrameSize;

    /// Match the source resolution. Resizing discards previous content.
    fn resize(&mut self, size: FrameSize);

    /// Make every pixel fully transparent
    fn clear(&mut self);

    /// Push the current transform
    fn save(&mut self);

    /// Pop back to the last saved transform (no-op when nothing was saved)
    fn restore(&mut self);

    fn translate(&mut self, x: f32, y: f32);

    /// Rotate local space clockwise on screen (y axis points down)
    fn rotate(&mut self, radians: f32);

    /// Draw `mask` stretched over the local rect (x, y, width, height).
    /// Zero-area or non-finite rects draw nothing and must not fail.
    fn draw_image(&mut self, mask: &MaskAsset, x: f32, y: f32, width: f32, height: f32);
}

/// Draws placements onto a surface
#[derive(Debug, Clone, Copy, Default)]
pub struct Compositor;

impl Compositor {
    pub fn new() -> Self {
        Compositor
    }

    /// Size the surface to the frame and wipe it.
    pub fn begin_frame<S: Surface + ?Sized>(&self, surface: &mut S, size: FrameSize) {
        if surface.size() != size {
            surface.resize(size);
        }
        surface.clear();
    }

    /// Draw one face's mask. Each call leaves the surface transform as it found it,
    /// so faces in the same frame never affect one another.
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S, mask: &MaskAsset, placement: &Placement) {
        let (w, h) = (placement.width, placement.height);

        surface.save();
        surface.translate(placement.center.0, placement.center.1);
        surface.rotate(placement.rotation);
        surface.draw_image(mask, -w / 2.0, -h / 2.0, w, h);
        surface.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[derive(Debug, PartialEq)]
    enum Op {
        Resize(FrameSize),
        Clear,
        Save,
        Restore,
        Translate(f32, f32),
        Rotate(f32),
        Draw(f32, f32, f32, f32),
    }

    #[derive(Default)]
    struct LogSurface {
        size: FrameSize,
        ops: Vec<Op>,
    }

    impl Surface for LogSurface {
        fn size(&self) -> FrameSize {
            self.size
        }
        fn resize(&mut self, size: FrameSize) {
            self.size = size;
            self.ops.push(Op::Resize(size));
        }
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }
        fn save(&mut self) {
            self.ops.push(Op::Save);
        }
        fn restore(&mut self) {
            self.ops.push(Op::Restore);
        }
        fn translate(&mut self, x: f32, y: f32) {
            self.ops.push(Op::Translate(x, y));
        }
        fn rotate(&mut self, radians: f32) {
            self.ops.push(Op::Rotate(radians));
        }
        fn draw_image(&mut self, _mask: &MaskAsset, x: f32, y: f32, w: f32, h: f32) {
            self.ops.push(Op::Draw(x, y, w, h));
        }
    }

    #[test]
    fn test_draw_sequence() {
        let mask = MaskAsset::from_image(RgbaImage::new(4, 2)).unwrap();
        let mut surface = LogSurface::default();
        let placement = Placement {
            center: (150.0, 254.0),
            rotation: 0.25,
            width: 280.0,
            height: 140.0,
        };

        Compositor::new().draw(&mut surface, &mask, &placement);

        assert_eq!(
            surface.ops,
            vec![
                Op::Save,
                Op::Translate(150.0, 254.0),
                Op::Rotate(0.25),
                Op::Draw(-140.0, -70.0, 280.0, 140.0),
                Op::Restore,
            ]
        );
    }

    #[test]
    fn test_begin_frame_resizes_only_on_change() {
        let mut surface = LogSurface::default();
        let compositor = Compositor::new();

        compositor.begin_frame(&mut surface, FrameSize::new(640, 480));
        compositor.begin_frame(&mut surface, FrameSize::new(640, 480));

        assert_eq!(
            surface.ops,
            vec![Op::Resize(FrameSize::new(640, 480)), Op::Clear, Op::Clear]
        );
    }
}
