//! Mask Transform - landmark geometry to mask placement
//!
//! Only three landmarks are read: both outer eye corners and the nose tip.
//!
//! - center: eye midpoint, pulled toward the nose by `k_y_offset`
//! - rotation: angle of the eye line (single in-plane degree of freedom)
//! - width: eye distance scaled by `k_width`
//! - height: width scaled by the mask's own aspect ratio

use std::fmt;

use serde::{Deserialize, Serialize};

use facemask_core::{
    FaceMesh, FaceRecord, FacemaskError, FacemaskResult, LandmarkIndices, LandmarkPoint,
    Placement,
};

/// Calibration for the transform engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Mask width as a multiple of eye distance
    pub k_width: f32,
    /// Fraction of the eye-midpoint → nose vertical gap added to center.y
    pub k_y_offset: f32,
    /// Which mesh indices hold the eye corners and nose tip
    pub indices: LandmarkIndices,
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            k_width: 2.8,
            k_y_offset: 0.9,
            indices: LandmarkIndices::default(),
        }
    }
}

impl TransformConfig {
    pub fn with_k_width(mut self, k_width: f32) -> Self {
        self.k_width = k_width;
        self
    }

    pub fn with_k_y_offset(mut self, k_y_offset: f32) -> Self {
        self.k_y_offset = k_y_offset;
        self
    }

    pub fn with_indices(mut self, indices: LandmarkIndices) -> Self {
        self.indices = indices;
        self
    }

    /// Reject calibrations that can never produce a usable placement
    pub fn validate(&self) -> FacemaskResult<()> {
        if !self.k_width.is_finite() || self.k_width <= 0.0 {
            return Err(FacemaskError::Config(format!(
                "k_width must be finite and positive, got {}",
                self.k_width
            )));
        }
        if !self.k_y_offset.is_finite() {
            return Err(FacemaskError::Config(format!(
                "k_y_offset must be finite, got {}",
                self.k_y_offset
            )));
        }
        Ok(())
    }
}

/// Why a face produced no placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Face record carried no mesh (or an empty one)
    NoMesh,
    /// Required index beyond the end of the mesh
    MissingIndex(usize),
    /// Required landmark has NaN/infinite coordinates
    NonFinite(usize),
}

impl SkipReason {
    /// Error taxonomy equivalent, for callers that report skips
    pub fn to_error(self) -> FacemaskError {
        match self {
            SkipReason::NoMesh => FacemaskError::MissingMesh,
            SkipReason::MissingIndex(index) => FacemaskError::MissingLandmarks { index },
            SkipReason::NonFinite(index) => FacemaskError::InvalidLandmark { index },
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoMesh => write!(f, "no mesh"),
            SkipReason::MissingIndex(i) => write!(f, "landmark {} out of range", i),
            SkipReason::NonFinite(i) => write!(f, "landmark {} not finite", i),
        }
    }
}

/// Outcome of placing a mask on one face
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementResult {
    Placed(Placement),
    Skipped(SkipReason),
}

impl PlacementResult {
    pub fn placement(&self) -> Option<&Placement> {
        match self {
            PlacementResult::Placed(p) => Some(p),
            PlacementResult::Skipped(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, PlacementResult::Skipped(_))
    }
}

fn landmark(mesh: &FaceMesh, index: usize) -> Result<&LandmarkPoint, SkipReason> {
    let point = mesh.get(index).ok_or(SkipReason::MissingIndex(index))?;
    if !point.is_finite() {
        return Err(SkipReason::NonFinite(index));
    }
    Ok(point)
}

/// Compute the mask placement for one face mesh.
///
/// `mask_aspect` is the mask's height / width. Pure: same inputs, same output.
pub fn compute_placement(
    mesh: Option<&FaceMesh>,
    mask_aspect: f32,
    config: &TransformConfig,
) -> PlacementResult {
    let mesh = match mesh {
        Some(mesh) if !mesh.is_empty() => mesh,
        _ => return PlacementResult::Skipped(SkipReason::NoMesh),
    };

    let indices = &config.indices;
    let (left, right, nose) = match (
        landmark(mesh, indices.left_eye_outer),
        landmark(mesh, indices.right_eye_outer),
        landmark(mesh, indices.nose_tip),
    ) {
        (Ok(l), Ok(r), Ok(n)) => (l, r, n),
        (Err(reason), _, _) | (_, Err(reason), _) | (_, _, Err(reason)) => {
            return PlacementResult::Skipped(reason)
        }
    };

    let (cx, cy) = left.planar_midpoint(right);
    let rotation = (right.y - left.y).atan2(right.x - left.x);
    let eye_distance = left.planar_distance(right);

    let width = eye_distance * config.k_width;
    let height = width * mask_aspect;
    let y_offset = (nose.y - cy) * config.k_y_offset;

    PlacementResult::Placed(Placement {
        center: (cx, cy + y_offset),
        rotation,
        width,
        height,
    })
}

/// Transform engine bound to a calibration
#[derive(Debug, Clone, Default)]
pub struct MaskTransform {
    config: TransformConfig,
}

impl MaskTransform {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Place the mask on one detected face
    pub fn place(&self, face: &FaceRecord, mask_aspect: f32) -> PlacementResult {
        compute_placement(face.mesh.as_ref(), mask_aspect, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPS: f32 = 1e-4;

    /// Mesh long enough for the default indices, zeros except the three we read
    fn mesh(left: (f32, f32), right: (f32, f32), nose: (f32, f32)) -> FaceMesh {
        let indices = LandmarkIndices::default();
        let mut points = vec![LandmarkPoint::default(); indices.required_len()];
        points[indices.left_eye_outer] = LandmarkPoint::planar(left.0, left.1);
        points[indices.right_eye_outer] = LandmarkPoint::planar(right.0, right.1);
        points[indices.nose_tip] = LandmarkPoint::planar(nose.0, nose.1);
        FaceMesh::new(points)
    }

    fn placed(result: PlacementResult) -> Placement {
        match result {
            PlacementResult::Placed(p) => p,
            PlacementResult::Skipped(reason) => panic!("unexpected skip: {}", reason),
        }
    }

    #[test]
    fn test_reference_scenario() {
        let m = mesh((100.0, 200.0), (200.0, 200.0), (150.0, 260.0));
        let p = placed(compute_placement(Some(&m), 1.0, &TransformConfig::default()));

        assert!((p.width - 280.0).abs() < EPS);
        assert!((p.height - 280.0).abs() < EPS);
        assert!(p.rotation.abs() < EPS);
        assert!((p.center.0 - 150.0).abs() < EPS);
        assert!((p.center.1 - 254.0).abs() < EPS);
    }

    #[test]
    fn test_right_eye_below_left_is_quarter_turn() {
        let m = mesh((50.0, 50.0), (50.0, 120.0), (40.0, 90.0));
        let p = placed(compute_placement(Some(&m), 1.0, &TransformConfig::default()));
        assert!((p.rotation - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_coincident_eyes_zero_width() {
        let m = mesh((80.0, 80.0), (80.0, 80.0), (80.0, 120.0));
        let p = placed(compute_placement(Some(&m), 1.3, &TransformConfig::default()));
        assert_eq!(p.width, 0.0);
        assert_eq!(p.height, 0.0);
        assert!(p.is_degenerate());
    }

    #[test]
    fn test_missing_mesh_skips() {
        let config = TransformConfig::default();
        assert_eq!(
            compute_placement(None, 1.0, &config),
            PlacementResult::Skipped(SkipReason::NoMesh)
        );
        assert_eq!(
            compute_placement(Some(&FaceMesh::default()), 1.0, &config),
            PlacementResult::Skipped(SkipReason::NoMesh)
        );
    }

    #[test]
    fn test_short_mesh_skips() {
        // 68-point mesh: index 263 is out of range
        let short = FaceMesh::new(vec![LandmarkPoint::planar(1.0, 1.0); 68]);
        let result = compute_placement(Some(&short), 1.0, &TransformConfig::default());
        assert_eq!(result, PlacementResult::Skipped(SkipReason::MissingIndex(263)));
        assert!(result.placement().is_none());
    }

    #[test]
    fn test_nan_landmark_skips() {
        let m = mesh((f32::NAN, 10.0), (20.0, 10.0), (15.0, 20.0));
        let result = compute_placement(Some(&m), 1.0, &TransformConfig::default());
        assert_eq!(result, PlacementResult::Skipped(SkipReason::NonFinite(33)));
    }

    #[test]
    fn test_skip_reason_errors() {
        assert!(matches!(SkipReason::NoMesh.to_error(), FacemaskError::MissingMesh));
        assert!(matches!(
            SkipReason::MissingIndex(263).to_error(),
            FacemaskError::MissingLandmarks { index: 263 }
        ));
        assert!(matches!(
            SkipReason::NonFinite(33).to_error(),
            FacemaskError::InvalidLandmark { index: 33 }
        ));
        assert_eq!(SkipReason::NoMesh.to_error().to_string(), "Face has no landmark mesh");
    }

    #[test]
    fn test_custom_indices() {
        let indices = LandmarkIndices {
            left_eye_outer: 0,
            right_eye_outer: 1,
            nose_tip: 2,
        };
        let m = FaceMesh::new(vec![
            LandmarkPoint::planar(0.0, 0.0),
            LandmarkPoint::planar(10.0, 0.0),
            LandmarkPoint::planar(5.0, 10.0),
        ]);
        let config = TransformConfig::default()
            .with_indices(indices)
            .with_k_width(2.0)
            .with_k_y_offset(0.5);
        let p = placed(compute_placement(Some(&m), 0.5, &config));
        assert!((p.width - 20.0).abs() < EPS);
        assert!((p.height - 10.0).abs() < EPS);
        assert!((p.center.1 - 5.0).abs() < EPS);
    }

    #[test]
    fn test_engine_place_face_record() {
        let engine = MaskTransform::default();
        let face = FaceRecord::without_mesh();
        assert!(engine.place(&face, 1.0).is_skipped());

        let face = FaceRecord::with_mesh(mesh((0.0, 0.0), (10.0, 0.0), (5.0, 5.0)));
        assert!(engine.place(&face, 1.0).placement().is_some());
    }

    #[test]
    fn test_validate() {
        assert!(TransformConfig::default().validate().is_ok());
        assert!(TransformConfig::default().with_k_width(0.0).validate().is_err());
        assert!(TransformConfig::default().with_k_width(f32::INFINITY).validate().is_err());
        assert!(TransformConfig::default().with_k_y_offset(f32::NAN).validate().is_err());
        assert!(TransformConfig::default().with_k_y_offset(-0.5).validate().is_ok());
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: TransformConfig = serde_json::from_str(r#"{"k_width": 3.0}"#).unwrap();
        assert_eq!(config.k_width, 3.0);
        assert_eq!(config.k_y_offset, 0.9);
        assert_eq!(config.indices, LandmarkIndices::default());
    }

    fn coord() -> impl Strategy<Value = f32> {
        -2000.0f32..2000.0
    }

    proptest! {
        #[test]
        fn prop_deterministic(
            lx in coord(), ly in coord(), rx in coord(), ry in coord(),
            nx in coord(), ny in coord(), aspect in 0.1f32..4.0,
        ) {
            let m = mesh((lx, ly), (rx, ry), (nx, ny));
            let config = TransformConfig::default();
            prop_assert_eq!(
                compute_placement(Some(&m), aspect, &config),
                compute_placement(Some(&m), aspect, &config)
            );
        }

        #[test]
        fn prop_rotation_translation_invariant(
            lx in coord(), ly in coord(), rx in coord(), ry in coord(),
            nx in coord(), ny in coord(),
            dx in -500.0f32..500.0, dy in -500.0f32..500.0,
        ) {
            let eye_distance = (rx - lx).hypot(ry - ly);
            prop_assume!(eye_distance > 1.0);
            let m = mesh((lx, ly), (rx, ry), (nx, ny));
            let shifted = m.translated(dx, dy);
            // f32 rounding of the shifted eye coordinates, as an angle
            let magnitude = [lx, ly, rx, ry].iter().fold(0.0f32, |acc, v| acc.max(v.abs()))
                + dx.abs().max(dy.abs());
            let tolerance = 8.0 * f32::EPSILON * magnitude / eye_distance + 1e-5;
            let config = TransformConfig::default();
            let a = placed(compute_placement(Some(&m), 1.0, &config));
            let b = placed(compute_placement(Some(&shifted), 1.0, &config));
            let diff = (a.rotation - b.rotation + PI).rem_euclid(2.0 * PI) - PI;
            prop_assert!(diff.abs() <= tolerance, "diff {} > {}", diff, tolerance);
        }

        #[test]
        fn prop_aspect_preserved(
            lx in coord(), ly in coord(), rx in coord(), ry in coord(),
            nx in coord(), ny in coord(), aspect in 0.1f32..4.0,
        ) {
            prop_assume!((rx - lx).hypot(ry - ly) > 1.0);
            let m = mesh((lx, ly), (rx, ry), (nx, ny));
            let p = placed(compute_placement(Some(&m), aspect, &TransformConfig::default()));
            prop_assert!(!p.is_degenerate());
            prop_assert!((p.height / p.width - aspect).abs() <= 1e-4 * aspect);
        }
    }
}
