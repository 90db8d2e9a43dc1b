//! facemask visual - From landmarks to pixels
//!
//! Two stages run once per detected face, every frame:
//!
//! 1. Transform: eye corners + nose tip → Placement (center, angle, size)
//! 2. Composite: Placement + mask image → pixels on a frame-sized surface
//!
//! Nothing here carries state between frames. Every placement is
//! recomputed from that frame's landmarks alone.

pub mod compositor;
pub mod raster;
pub mod transform;

pub use compositor::*;
pub use raster::*;
pub use transform::*;
