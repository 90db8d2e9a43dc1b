//! Raster surface - CPU implementation of [`Surface`] over an RGBA buffer
//!
//! The canvas starts transparent, so the result is a mask-only layer that
//! can be exported as PNG or flattened over the video frame.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};

use facemask_core::{FacemaskError, FacemaskResult, FrameSize, MaskAsset, Placement};

use crate::Surface;

/// 2D affine transform in canvas order:
/// x' = a*x + c*y + e, y' = b*x + d*y + f
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2 {
    pub const IDENTITY: Affine2 = Affine2 {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translation(x: f32, y: f32) -> Self {
        Affine2 {
            e: x,
            f: y,
            ..Self::IDENTITY
        }
    }

    pub fn rotation(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Affine2 {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self` applied after `rhs` (local transforms are post-multiplied)
    pub fn then(&self, rhs: &Affine2) -> Affine2 {
        Affine2 {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            e: self.a * rhs.e + self.c * rhs.f + self.e,
            f: self.b * rhs.e + self.d * rhs.f + self.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Inverse, or `None` when the transform collapses the plane
    pub fn invert(&self) -> Option<Affine2> {
        let det = self.a * self.d - self.b * self.c;
        if !det.is_finite() || det.abs() < 1e-12 {
            return None;
        }
        let inv = 1.0 / det;
        Some(Affine2 {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }
}

/// Frame-sized RGBA canvas with a canvas-style transform stack
#[derive(Debug, Clone)]
pub struct RasterSurface {
    canvas: RgbaImage,
    transform: Affine2,
    stack: Vec<Affine2>,
}

impl RasterSurface {
    pub fn new(size: FrameSize) -> Self {
        RasterSurface {
            canvas: RgbaImage::new(size.width, size.height),
            transform: Affine2::IDENTITY,
            stack: Vec::new(),
        }
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn transform(&self) -> Affine2 {
        self.transform
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x < self.canvas.width() && y < self.canvas.height() {
            Some(*self.canvas.get_pixel(x, y))
        } else {
            None
        }
    }

    /// Number of pixels with any coverage
    pub fn covered_pixels(&self) -> usize {
        self.canvas.pixels().filter(|p| p.0[3] > 0).count()
    }

    /// Encode the current layer as PNG (transparent background kept)
    pub fn encode_png(&self) -> FacemaskResult<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        self.canvas
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| FacemaskError::Encode(e.to_string()))?;
        Ok(out.into_inner())
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> FacemaskResult<()> {
        self.canvas
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| FacemaskError::Encode(e.to_string()))
    }

    /// The mask layer composited over a video frame
    pub fn flatten_over(&self, frame: &RgbaImage) -> RgbaImage {
        let mut base = frame.clone();
        image::imageops::overlay(&mut base, &self.canvas, 0, 0);
        base
    }

    /// Device-space pixel bounds touched by a local rect under the current transform
    fn device_bounds(&self, x: f32, y: f32, w: f32, h: f32) -> Option<(u32, u32, u32, u32)> {
        let corners = [
            self.transform.apply(x, y),
            self.transform.apply(x + w, y),
            self.transform.apply(x, y + h),
            self.transform.apply(x + w, y + h),
        ];
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for (cx, cy) in corners {
            min_x = min_x.min(cx);
            min_y = min_y.min(cy);
            max_x = max_x.max(cx);
            max_y = max_y.max(cy);
        }

        let (cw, ch) = (self.canvas.width() as f32, self.canvas.height() as f32);
        let x0 = min_x.floor().max(0.0);
        let y0 = min_y.floor().max(0.0);
        let x1 = max_x.ceil().min(cw);
        let y1 = max_y.ceil().min(ch);
        if !(x0 < x1 && y0 < y1) {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

/// Non-premultiplied source-over
fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let sa = src.0[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for i in 0..3 {
        let s = src.0[i] as f32;
        let d = dst.0[i] as f32;
        let c = (s * sa + d * da * (1.0 - sa)) / out_a;
        dst.0[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

impl Surface for RasterSurface {
    fn size(&self) -> FrameSize {
        FrameSize::new(self.canvas.width(), self.canvas.height())
    }

    fn resize(&mut self, size: FrameSize) {
        self.canvas = RgbaImage::new(size.width, size.height);
        self.transform = Affine2::IDENTITY;
        self.stack.clear();
    }

    fn clear(&mut self) {
        for p in self.canvas.pixels_mut() {
            *p = Rgba([0, 0, 0, 0]);
        }
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.transform = self.transform.then(&Affine2::translation(x, y));
    }

    fn rotate(&mut self, radians: f32) {
        self.transform = self.transform.then(&Affine2::rotation(radians));
    }

    fn draw_image(&mut self, mask: &MaskAsset, x: f32, y: f32, width: f32, height: f32) {
        let visible = |v: f32| v.is_finite() && v.abs() >= Placement::MIN_VISIBLE_EXTENT;
        if !visible(width) || !visible(height) || !x.is_finite() || !y.is_finite() {
            return;
        }
        let Some(inverse) = self.transform.invert() else {
            return;
        };
        let Some((x0, y0, x1, y1)) = self.device_bounds(x, y, width, height) else {
            return;
        };

        let src = mask.image();
        let (mw, mh) = (src.width(), src.height());

        for py in y0..y1 {
            for px in x0..x1 {
                // Sample at pixel centers
                let (lx, ly) = inverse.apply(px as f32 + 0.5, py as f32 + 0.5);
                let u = (lx - x) / width;
                let v = (ly - y) / height;
                if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                    continue;
                }
                let sx = ((u * mw as f32) as u32).min(mw - 1);
                let sy = ((v * mh as f32) as u32).min(mh - 1);
                blend_over(self.canvas.get_pixel_mut(px, py), *src.get_pixel(sx, sy));
            }
        }
    }
}
