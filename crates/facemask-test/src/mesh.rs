//! Face mesh builders

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use facemask_core::{FaceMesh, FaceRecord, LandmarkIndices, LandmarkPoint};

/// Number of points in the full face mesh layout
pub const FACE_MESH_POINTS: usize = 468;

/// A 468-point mesh with only the eye corners and nose tip set
pub fn face_mesh(left_eye: (f32, f32), right_eye: (f32, f32), nose: (f32, f32)) -> FaceMesh {
    mesh_with_indices(
        LandmarkIndices::default(),
        FACE_MESH_POINTS,
        left_eye,
        right_eye,
        nose,
    )
}

/// A mesh of `len` points with the given indices set. Indices past `len` are dropped.
pub fn mesh_with_indices(
    indices: LandmarkIndices,
    len: usize,
    left_eye: (f32, f32),
    right_eye: (f32, f32),
    nose: (f32, f32),
) -> FaceMesh {
    let mut points = vec![LandmarkPoint::default(); len];
    for (index, (x, y)) in [
        (indices.left_eye_outer, left_eye),
        (indices.right_eye_outer, right_eye),
        (indices.nose_tip, nose),
    ] {
        if let Some(p) = points.get_mut(index) {
            *p = LandmarkPoint::planar(x, y);
        }
    }
    FaceMesh::new(points)
}

/// Face record for [`face_mesh`]
pub fn face(left_eye: (f32, f32), right_eye: (f32, f32), nose: (f32, f32)) -> FaceRecord {
    FaceRecord::with_mesh(face_mesh(left_eye, right_eye, nose))
}

/// Upright face geometry: eye midpoint, eye distance, roll angle, nose drop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacePose {
    pub center: (f32, f32),
    pub eye_distance: f32,
    pub roll: f32,
    /// Distance from eye midpoint to nose tip, perpendicular to the eye line
    pub nose_drop: f32,
}

impl FacePose {
    pub fn new(center: (f32, f32), eye_distance: f32) -> Self {
        FacePose {
            center,
            eye_distance,
            roll: 0.0,
            nose_drop: eye_distance * 0.6,
        }
    }

    pub fn with_roll(mut self, roll: f32) -> Self {
        self.roll = roll;
        self
    }

    /// Landmark positions for this pose
    pub fn landmarks(&self) -> ((f32, f32), (f32, f32), (f32, f32)) {
        let (sin, cos) = self.roll.sin_cos();
        let half = self.eye_distance / 2.0;
        let (cx, cy) = self.center;
        let left = (cx - half * cos, cy - half * sin);
        let right = (cx + half * cos, cy + half * sin);
        // Perpendicular, pointing down the face
        let nose = (cx - self.nose_drop * sin, cy + self.nose_drop * cos);
        (left, right, nose)
    }

    pub fn to_face(&self) -> FaceRecord {
        let (l, r, n) = self.landmarks();
        face(l, r, n)
    }
}

/// Seeded random walk over face poses, one step per frame
pub struct SyntheticFace {
    pose: FacePose,
    bounds: (f32, f32),
    rng: StdRng,
    /// Max per-frame translation in pixels
    pub drift: f32,
    /// Max per-frame roll change in radians
    pub wobble: f32,
}

impl SyntheticFace {
    pub fn new(pose: FacePose, bounds: (f32, f32), seed: u64) -> Self {
        SyntheticFace {
            pose,
            bounds,
            rng: StdRng::seed_from_u64(seed),
            drift: 4.0,
            wobble: 0.03,
        }
    }

    pub fn pose(&self) -> FacePose {
        self.pose
    }

    /// Advance one frame and return the new face
    pub fn step(&mut self) -> FaceRecord {
        let dx = self.rng.gen_range(-self.drift..=self.drift);
        let dy = self.rng.gen_range(-self.drift..=self.drift);
        let dr = self.rng.gen_range(-self.wobble..=self.wobble);

        // Keep the eyes in frame; a face wider than the frame stays centered
        let (w, h) = (self.bounds.0.max(0.0), self.bounds.1.max(0.0));
        let margin_x = self.pose.eye_distance.min(w / 2.0);
        let margin_y = self.pose.eye_distance.min(h / 2.0);
        self.pose.center.0 = (self.pose.center.0 + dx).clamp(margin_x, w - margin_x);
        self.pose.center.1 = (self.pose.center.1 + dy).clamp(margin_y, h - margin_y);
        self.pose.roll = (self.pose.roll + dr).clamp(-0.6, 0.6);

        self.pose.to_face()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_mesh_layout() {
        let mesh = face_mesh((1.0, 2.0), (3.0, 4.0), (5.0, 6.0));
        assert_eq!(mesh.len(), FACE_MESH_POINTS);
        assert_eq!(mesh.get(33), Some(&LandmarkPoint::planar(1.0, 2.0)));
        assert_eq!(mesh.get(263), Some(&LandmarkPoint::planar(3.0, 4.0)));
        assert_eq!(mesh.get(1), Some(&LandmarkPoint::planar(5.0, 6.0)));
    }

    #[test]
    fn test_truncated_mesh_drops_indices() {
        let mesh = mesh_with_indices(LandmarkIndices::default(), 100, (1.0, 1.0), (2.0, 2.0), (3.0, 3.0));
        assert_eq!(mesh.len(), 100);
        assert!(mesh.get(263).is_none());
    }

    #[test]
    fn test_pose_landmarks_upright() {
        let pose = FacePose::new((100.0, 100.0), 40.0);
        let (l, r, n) = pose.landmarks();
        assert_eq!(l, (80.0, 100.0));
        assert_eq!(r, (120.0, 100.0));
        assert_eq!(n.0, 100.0);
        assert!((n.1 - 124.0).abs() < 1e-4);
    }

    #[test]
    fn test_synthetic_face_is_seeded() {
        let pose = FacePose::new((320.0, 240.0), 60.0);
        let mut a = SyntheticFace::new(pose, (640.0, 480.0), 7);
        let mut b = SyntheticFace::new(pose, (640.0, 480.0), 7);
        for _ in 0..20 {
            assert_eq!(a.step(), b.step());
        }
        let center = a.pose().center;
        assert!(center.0 >= 60.0 && center.0 <= 580.0);
    }

    #[test]
    fn test_face_wider_than_frame_stays_centered() {
        let pose = FacePose::new((320.0, 240.0), 300.0);
        let mut source = SyntheticFace::new(pose, (640.0, 480.0), 1);
        for _ in 0..10 {
            source.step();
            let (x, y) = source.pose().center;
            assert!((300.0..=340.0).contains(&x));
            assert_eq!(y, 240.0);
        }
    }
}
