//! End-to-end Integration Test Suite
//!
//! Drives the full loop (video gate, detection, transform, composite)
//! through the scenario harness:
//! - Placement geometry as it lands on the surface
//! - Per-face independence and skips
//! - Fault recovery and lifecycle failures
//! - Cancellation, including results that resolve after it

use facemask_core::FaceRecord;

use crate::face;

/// Canonical upright face: eyes 100px apart at y=200, nose tip at (150, 260).
/// With the default constants and a square mask this places a 280x280 mask
/// centered on (150, 254).
pub fn reference_face() -> FaceRecord {
    face((100.0, 200.0), (200.0, 200.0), (150.0, 260.0))
}
