//! facemask core - Fundamental types shared by every layer
//!
//! This crate defines:
//! - Landmarks (LandmarkPoint, FaceMesh, FaceRecord, LandmarkIndices)
//! - The mask image resource (MaskAsset)
//! - The per-face output of the transform engine (Placement)
//! - Video frame descriptors (FrameSize, VideoFrame)
//! - The error taxonomy

pub mod error;
pub mod frame;
pub mod landmark;
pub mod mask;
pub mod placement;

pub use error::*;
pub use frame::*;
pub use landmark::*;
pub use mask::*;
pub use placement::*;
