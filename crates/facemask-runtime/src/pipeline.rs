//! Mask pipeline - the per-frame loop and its lifecycle
//!
//! ```text
//! Uninitialized --initialize()--> Ready --start()--> Running --cancel--> Stopped
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use facemask_core::{FacemaskError, FacemaskResult, FrameSize, MaskAsset};
use facemask_visual::{Compositor, MaskTransform, PlacementResult, SkipReason, Surface};

use crate::{CancellationToken, FrameScheduler, LandmarkSource, PipelineConfig, VideoSource};

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Ready,
    Running,
    Stopped,
}

impl PipelineState {
    pub fn name(self) -> &'static str {
        match self {
            PipelineState::Uninitialized => "Uninitialized",
            PipelineState::Ready => "Ready",
            PipelineState::Running => "Running",
            PipelineState::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What one rendered iteration did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub sequence: u64,
    pub faces_detected: usize,
    pub faces_drawn: usize,
    /// One entry per face that produced no placement
    pub skipped: Vec<SkipReason>,
    /// False when no mask asset is loaded (nothing is ever drawn)
    pub mask_enabled: bool,
}

/// Result of one loop iteration. Never an error: faults are recorded here.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Detection ran and the surface was redrawn
    Rendered(FrameReport),
    /// No decodable frame yet; detector not invoked
    SourceNotReady,
    /// Detector rejected; logged, loop continues
    DetectorFailed { error: String },
    /// Cancellation observed; any in-flight result was discarded
    Cancelled,
    /// Pipeline is not running (not started yet)
    Inactive(PipelineState),
}

impl FrameOutcome {
    /// Rendered, but at least one face was skipped
    pub fn is_partial(&self) -> bool {
        matches!(self, FrameOutcome::Rendered(r) if !r.skipped.is_empty())
    }

    /// Whether the loop should schedule another iteration
    pub fn continues(&self) -> bool {
        !matches!(self, FrameOutcome::Cancelled | FrameOutcome::Inactive(_))
    }

    pub fn report(&self) -> Option<&FrameReport> {
        match self {
            FrameOutcome::Rendered(r) => Some(r),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuntimeStats {
    pub iterations: u64,
    pub frames_rendered: u64,
    pub frames_not_ready: u64,
    pub detector_failures: u64,
    pub faces_detected: u64,
    pub faces_drawn: u64,
    pub faces_skipped: u64,
    /// Detection results that resolved after cancellation
    pub discarded_results: u64,
    pub last_iteration_duration: Duration,
}

/// The per-frame loop with its collaborators
pub struct MaskPipeline<D, V, S> {
    config: PipelineConfig,
    transform: MaskTransform,
    compositor: Compositor,
    detector: D,
    video: V,
    surface: S,
    /// `None` when loading failed: mask rendering disabled for the session
    mask: Option<MaskAsset>,
    state: PipelineState,
    cancel: CancellationToken,
    stats: RuntimeStats,
    stream_size: Option<FrameSize>,
    disposed: bool,
}

impl<D, V, S> MaskPipeline<D, V, S>
where
    D: LandmarkSource,
    V: VideoSource,
    S: Surface + Send,
{
    pub fn new(config: PipelineConfig, detector: D, video: V, surface: S) -> FacemaskResult<Self> {
        config.validate()?;
        Ok(MaskPipeline {
            transform: MaskTransform::new(config.transform),
            compositor: Compositor::new(),
            config,
            detector,
            video,
            surface,
            mask: None,
            state: PipelineState::Uninitialized,
            cancel: CancellationToken::new(),
            stats: RuntimeStats::default(),
            stream_size: None,
            disposed: false,
        })
    }

    /// Token that stops the loop when cancelled (hosting context teardown)
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Uninitialized → Ready.
    ///
    /// `mask` is the outcome of the asset load: a failure only disables mask
    /// rendering. Detector init or video attach failures are fatal and leave
    /// the pipeline inert in `Uninitialized`.
    pub async fn initialize(&mut self, mask: FacemaskResult<MaskAsset>) -> FacemaskResult<()> {
        self.expect_state(PipelineState::Uninitialized)?;

        match mask {
            Ok(mask) => {
                info!(
                    width = mask.natural_width(),
                    height = mask.natural_height(),
                    "Mask loaded"
                );
                self.mask = Some(mask);
            }
            Err(e) => {
                warn!(error = %e, "Mask failed to load, rendering disabled");
                self.mask = None;
            }
        }

        self.detector
            .init()
            .await
            .map_err(|e| FacemaskError::Initialization(format!("detector: {}", e)))?;

        let size = self
            .video
            .attach()
            .await
            .map_err(|e| FacemaskError::Initialization(format!("video: {}", e)))?;
        self.stream_size = Some(size);

        self.state = PipelineState::Ready;
        info!(width = size.width, height = size.height, "Pipeline ready");
        Ok(())
    }

    /// Ready → Running
    pub fn start(&mut self) -> FacemaskResult<()> {
        self.expect_state(PipelineState::Ready)?;
        self.state = PipelineState::Running;
        info!("Pipeline running");
        Ok(())
    }

    /// Execute one iteration of the loop.
    pub async fn drive_once(&mut self) -> FrameOutcome {
        if self.cancel.is_cancelled() {
            // Nothing to tear down before initialize() has completed
            if matches!(self.state, PipelineState::Ready | PipelineState::Running) {
                self.shutdown();
            }
            if self.state == PipelineState::Stopped {
                return FrameOutcome::Cancelled;
            }
        }
        if self.state != PipelineState::Running {
            return FrameOutcome::Inactive(self.state);
        }

        let start = Instant::now();
        self.stats.iterations += 1;
        let outcome = self.process_frame().await;
        self.stats.last_iteration_duration = start.elapsed();

        if outcome == FrameOutcome::Cancelled {
            self.shutdown();
        }
        outcome
    }

    async fn process_frame(&mut self) -> FrameOutcome {
        // Stage 1: Gate on a decodable frame
        let frame = if self.video.is_ready() {
            self.video.current_frame()
        } else {
            None
        };
        let Some(frame) = frame.filter(|f| !f.size.is_empty()) else {
            self.stats.frames_not_ready += 1;
            return FrameOutcome::SourceNotReady;
        };

        // Stage 2: Detect (may suspend across several frames)
        let detected = self.detector.detect(&frame).await;

        // Stage 3: Late results after cancellation are dropped unseen
        if self.cancel.is_cancelled() {
            self.stats.discarded_results += 1;
            debug!(sequence = frame.sequence, "Discarding detection after cancellation");
            return FrameOutcome::Cancelled;
        }

        let faces = match detected {
            Ok(faces) => faces,
            Err(e) => {
                self.stats.detector_failures += 1;
                warn!(sequence = frame.sequence, error = %e, "Landmark detection failed");
                return FrameOutcome::DetectorFailed {
                    error: e.to_string(),
                };
            }
        };

        // Stage 4: Track source resolution, wipe last frame's masks
        self.compositor.begin_frame(&mut self.surface, frame.size);

        let mut report = FrameReport {
            sequence: frame.sequence,
            faces_detected: faces.len(),
            mask_enabled: self.mask.is_some(),
            ..Default::default()
        };

        // Stages 5-6: Place and draw each face independently
        if let Some(mask) = &self.mask {
            let aspect = mask.aspect();
            for face in &faces {
                match self.transform.place(face, aspect) {
                    PlacementResult::Placed(placement) => {
                        self.compositor.draw(&mut self.surface, mask, &placement);
                        report.faces_drawn += 1;
                    }
                    PlacementResult::Skipped(reason) => {
                        debug!(
                            sequence = frame.sequence,
                            error = %reason.to_error(),
                            "Face skipped"
                        );
                        report.skipped.push(reason);
                    }
                }
            }
        }

        self.stats.frames_rendered += 1;
        self.stats.faces_detected += report.faces_detected as u64;
        self.stats.faces_drawn += report.faces_drawn as u64;
        self.stats.faces_skipped += report.skipped.len() as u64;

        debug!(
            sequence = report.sequence,
            detected = report.faces_detected,
            drawn = report.faces_drawn,
            "Frame rendered"
        );
        FrameOutcome::Rendered(report)
    }

    /// Drive iterations off `scheduler` until cancelled or the scheduler ends.
    /// Starts the pipeline if it is `Ready`.
    pub async fn run<F>(&mut self, scheduler: &mut F) -> FacemaskResult<RuntimeStats>
    where
        F: FrameScheduler + ?Sized,
    {
        if self.state == PipelineState::Ready {
            self.start()?;
        }
        self.expect_state(PipelineState::Running)?;

        let cancel = self.cancel.clone();
        loop {
            let more = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                more = scheduler.next_frame() => more,
            };
            if !more {
                break;
            }
            if !self.drive_once().await.continues() {
                break;
            }
        }

        self.shutdown();
        Ok(self.stats.clone())
    }

    /// Request cancellation and tear down (idempotent)
    pub fn stop(&mut self) {
        self.cancel.cancel();
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.state != PipelineState::Stopped {
            info!(iterations = self.stats.iterations, "Pipeline stopped");
        }
        self.state = PipelineState::Stopped;
        if !self.disposed {
            self.detector.dispose();
            self.disposed = true;
        }
    }

    fn expect_state(&self, expected: PipelineState) -> FacemaskResult<()> {
        if self.state != expected {
            return Err(FacemaskError::InvalidState {
                expected: expected.name(),
                actual: self.state.name(),
            });
        }
        Ok(())
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn mask_enabled(&self) -> bool {
        self.mask.is_some()
    }

    /// Frame size reported when the video stream attached
    pub fn stream_size(&self) -> Option<FrameSize> {
        self.stream_size
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn video(&self) -> &V {
        &self.video
    }

    pub fn video_mut(&mut self) -> &mut V {
        &mut self.video
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use facemask_core::{FaceMesh, FaceRecord, LandmarkPoint, VideoFrame};
    use facemask_visual::RasterSurface;
    use image::{Rgba, RgbaImage};

    struct FixedFaces {
        faces: Vec<FaceRecord>,
        fail: bool,
        disposed: u32,
    }

    #[async_trait]
    impl LandmarkSource for FixedFaces {
        async fn init(&mut self) -> FacemaskResult<()> {
            Ok(())
        }

        async fn detect(&mut self, _frame: &VideoFrame) -> FacemaskResult<Vec<FaceRecord>> {
            if self.fail {
                return Err(FacemaskError::DetectorFailure("model exploded".into()));
            }
            Ok(self.faces.clone())
        }

        fn dispose(&mut self) {
            self.disposed += 1;
        }
    }

    struct StillVideo {
        ready: bool,
        size: FrameSize,
    }

    #[async_trait]
    impl VideoSource for StillVideo {
        async fn attach(&mut self) -> FacemaskResult<FrameSize> {
            Ok(self.size)
        }

        fn is_ready(&self) -> bool {
            self.ready
        }

        fn current_frame(&mut self) -> Option<VideoFrame> {
            self.ready.then(|| VideoFrame::blank(1, self.size))
        }
    }

    fn face(left: (f32, f32), right: (f32, f32), nose: (f32, f32)) -> FaceRecord {
        let mut points = vec![LandmarkPoint::default(); 468];
        points[33] = LandmarkPoint::planar(left.0, left.1);
        points[263] = LandmarkPoint::planar(right.0, right.1);
        points[1] = LandmarkPoint::planar(nose.0, nose.1);
        FaceRecord::with_mesh(FaceMesh::new(points))
    }

    fn mask() -> MaskAsset {
        MaskAsset::from_image(RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255]))).unwrap()
    }

    fn pipeline(
        faces: Vec<FaceRecord>,
        ready: bool,
    ) -> MaskPipeline<FixedFaces, StillVideo, RasterSurface> {
        MaskPipeline::new(
            PipelineConfig::default(),
            FixedFaces {
                faces,
                fail: false,
                disposed: 0,
            },
            StillVideo {
                ready,
                size: FrameSize::new(320, 240),
            },
            RasterSurface::new(FrameSize::new(1, 1)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let mut p = pipeline(vec![], true);
        assert_eq!(p.state(), PipelineState::Uninitialized);
        assert!(p.start().is_err());

        p.initialize(Ok(mask())).await.unwrap();
        assert_eq!(p.state(), PipelineState::Ready);
        assert_eq!(p.stream_size(), Some(FrameSize::new(320, 240)));
        assert!(p.initialize(Ok(mask())).await.is_err());

        p.start().unwrap();
        assert_eq!(p.state(), PipelineState::Running);

        p.stop();
        p.stop();
        assert_eq!(p.state(), PipelineState::Stopped);
        assert_eq!(p.detector().disposed, 1);
    }

    #[tokio::test]
    async fn test_inactive_before_start() {
        let mut p = pipeline(vec![], true);
        assert_eq!(
            p.drive_once().await,
            FrameOutcome::Inactive(PipelineState::Uninitialized)
        );
        assert_eq!(p.stats().iterations, 0);
    }

    #[tokio::test]
    async fn test_renders_faces_and_resizes_surface() {
        let faces = vec![
            face((100.0, 100.0), (140.0, 100.0), (120.0, 130.0)),
            FaceRecord::without_mesh(),
        ];
        let mut p = pipeline(faces, true);
        p.initialize(Ok(mask())).await.unwrap();
        p.start().unwrap();

        let outcome = p.drive_once().await;
        let report = outcome.report().unwrap();
        assert_eq!(report.faces_detected, 2);
        assert_eq!(report.faces_drawn, 1);
        assert_eq!(report.skipped, vec![SkipReason::NoMesh]);
        assert!(outcome.is_partial());

        assert_eq!(p.surface().size(), FrameSize::new(320, 240));
        assert!(p.surface().covered_pixels() > 0);
        assert_eq!(p.stats().faces_drawn, 1);
        assert_eq!(p.stats().faces_skipped, 1);
    }

    #[tokio::test]
    async fn test_not_ready_skips_detection() {
        let mut p = pipeline(vec![], false);
        p.initialize(Ok(mask())).await.unwrap();
        p.start().unwrap();

        assert_eq!(p.drive_once().await, FrameOutcome::SourceNotReady);
        assert_eq!(p.stats().frames_not_ready, 1);
        assert_eq!(p.stats().frames_rendered, 0);
    }

    #[tokio::test]
    async fn test_detector_failure_is_recovered() {
        let mut p = pipeline(vec![], true);
        p.initialize(Ok(mask())).await.unwrap();
        p.start().unwrap();

        p.detector.fail = true;
        let outcome = p.drive_once().await;
        assert!(matches!(outcome, FrameOutcome::DetectorFailed { .. }));
        assert!(outcome.continues());

        p.detector.fail = false;
        assert!(matches!(p.drive_once().await, FrameOutcome::Rendered(_)));
        assert_eq!(p.stats().detector_failures, 1);
        assert_eq!(p.state(), PipelineState::Running);
    }

    #[tokio::test]
    async fn test_mask_load_failure_disables_rendering() {
        let faces = vec![face((100.0, 100.0), (140.0, 100.0), (120.0, 130.0))];
        let mut p = pipeline(faces, true);
        p.initialize(Err(FacemaskError::AssetLoadFailure {
            path: "cat_mask.png".into(),
            reason: "404".into(),
        }))
        .await
        .unwrap();
        p.start().unwrap();

        let outcome = p.drive_once().await;
        let report = outcome.report().unwrap();
        assert!(!report.mask_enabled);
        assert_eq!(report.faces_detected, 1);
        assert_eq!(report.faces_drawn, 0);
        assert_eq!(p.surface().covered_pixels(), 0);
    }

    #[tokio::test]
    async fn test_cancel_before_initialize_keeps_detector() {
        let mut p = pipeline(vec![], true);
        p.cancellation_token().cancel();

        assert_eq!(
            p.drive_once().await,
            FrameOutcome::Inactive(PipelineState::Uninitialized)
        );
        assert_eq!(p.state(), PipelineState::Uninitialized);
        assert_eq!(p.detector().disposed, 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_iteration() {
        let mut p = pipeline(vec![], true);
        p.initialize(Ok(mask())).await.unwrap();
        p.start().unwrap();

        p.cancellation_token().cancel();
        assert_eq!(p.drive_once().await, FrameOutcome::Cancelled);
        assert_eq!(p.state(), PipelineState::Stopped);
        assert_eq!(p.stats().iterations, 0);
        assert_eq!(p.detector().disposed, 1);
    }
}
