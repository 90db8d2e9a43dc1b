//! facemask Test Harness - Fakes and scenarios for the frame loop
//!
//! This crate provides:
//! - Face mesh builders and a seeded, drifting synthetic face
//! - A scripted landmark source (faces, failures, gated/pending detections)
//! - A synthetic video source with warm-up and resolution changes
//! - A recording surface that keeps every draw call
//! - A scenario builder wiring them into a `MaskPipeline`
//! - End-to-end integration testing

pub mod detector;
pub mod integration;
pub mod mesh;
pub mod scenario;
pub mod surface;
pub mod video;

pub use detector::*;
pub use integration::*;
pub use mesh::*;
pub use scenario::*;
pub use surface::*;
pub use video::*;
