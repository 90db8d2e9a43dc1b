//! Landmarks - detector output for a single face in a single frame
//!
//! Points are in frame-pixel space. A mesh is indexed by semantic position:
//! the same index always names the same facial feature for a given detector.

use serde::{Deserialize, Serialize};

/// A single landmark (frame-pixel coordinates, `z` is depth and unused by the core)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl LandmarkPoint {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Point on the image plane
    pub const fn planar(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Euclidean distance on the image plane (depth ignored)
    pub fn planar_distance(&self, other: &LandmarkPoint) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Midpoint on the image plane
    pub fn planar_midpoint(&self, other: &LandmarkPoint) -> (f32, f32) {
        ((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn translated(&self, dx: f32, dy: f32) -> LandmarkPoint {
        LandmarkPoint {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z,
        }
    }

    /// Both planar coordinates are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f32; 3]> for LandmarkPoint {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<[f32; 2]> for LandmarkPoint {
    fn from(v: [f32; 2]) -> Self {
        Self::planar(v[0], v[1])
    }
}

/// Ordered landmark collection for one face
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceMesh {
    points: Vec<LandmarkPoint>,
}

impl FaceMesh {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    /// Landmark at a semantic index, `None` when out of range
    #[inline]
    pub fn get(&self, index: usize) -> Option<&LandmarkPoint> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }

    /// Copy of this mesh shifted by (dx, dy)
    pub fn translated(&self, dx: f32, dy: f32) -> FaceMesh {
        FaceMesh {
            points: self.points.iter().map(|p| p.translated(dx, dy)).collect(),
        }
    }
}

impl From<Vec<LandmarkPoint>> for FaceMesh {
    fn from(points: Vec<LandmarkPoint>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<LandmarkPoint> for FaceMesh {
    fn from_iter<I: IntoIterator<Item = LandmarkPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// One detected face. Detectors may report a face without a mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceRecord {
    pub mesh: Option<FaceMesh>,
}

impl FaceRecord {
    pub fn with_mesh(mesh: FaceMesh) -> Self {
        Self { mesh: Some(mesh) }
    }

    pub fn without_mesh() -> Self {
        Self::default()
    }
}

/// Semantic indices the transform engine reads from a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkIndices {
    pub left_eye_outer: usize,
    pub right_eye_outer: usize,
    pub nose_tip: usize,
}

impl LandmarkIndices {
    /// 468-point face mesh layout
    pub const FACE_MESH_468: LandmarkIndices = LandmarkIndices {
        left_eye_outer: 33,
        right_eye_outer: 263,
        nose_tip: 1,
    };

    /// Smallest mesh length that contains every required index
    pub fn required_len(&self) -> usize {
        self.left_eye_outer
            .max(self.right_eye_outer)
            .max(self.nose_tip)
            + 1
    }
}

impl Default for LandmarkIndices {
    fn default() -> Self {
        Self::FACE_MESH_468
    }
}
