//! Scenario builder - wires the fakes into a running pipeline

use image::{Rgba, RgbaImage};

use facemask_core::{FaceRecord, FacemaskError, FacemaskResult, FrameSize, MaskAsset};
use facemask_runtime::{FrameOutcome, MaskPipeline, PipelineConfig};
use facemask_visual::TransformConfig;

use crate::{Detection, DetectorProbe, RecordingSurface, ScriptedLandmarkSource, SyntheticVideo};

/// Pipeline type every scenario drives
pub type ScenarioPipeline = MaskPipeline<ScriptedLandmarkSource, SyntheticVideo, RecordingSurface>;

/// Opaque single-color mask of the given size
pub fn solid_mask(width: u32, height: u32) -> MaskAsset {
    let image = RgbaImage::from_pixel(width.max(1), height.max(1), Rgba([200, 30, 30, 255]));
    MaskAsset::from_image(image).expect("mask is never empty")
}

pub struct ScenarioBuilder {
    config: PipelineConfig,
    frame_size: FrameSize,
    warmup: u32,
    faces: Vec<FaceRecord>,
    script: Vec<Detection>,
    mask: Option<MaskAsset>,
    init_error: Option<String>,
    attach_error: Option<String>,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        ScenarioBuilder {
            config: PipelineConfig::default(),
            frame_size: FrameSize::new(640, 480),
            warmup: 0,
            faces: Vec::new(),
            script: Vec::new(),
            mask: Some(solid_mask(64, 64)),
            init_error: None,
            attach_error: None,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_transform(mut self, transform: TransformConfig) -> Self {
        self.config.transform = transform;
        self
    }

    pub fn with_frame_size(mut self, size: FrameSize) -> Self {
        self.frame_size = size;
        self
    }

    /// Video reports no decodable frame for the first `frames` iterations
    pub fn with_warmup(mut self, frames: u32) -> Self {
        self.warmup = frames;
        self
    }

    /// Faces returned once the script runs out
    pub fn with_faces(mut self, faces: Vec<FaceRecord>) -> Self {
        self.faces = faces;
        self
    }

    pub fn with_detection(mut self, detection: Detection) -> Self {
        self.script.push(detection);
        self
    }

    pub fn with_mask(mut self, mask: MaskAsset) -> Self {
        self.mask = Some(mask);
        self
    }

    /// The mask asset fails to load
    pub fn without_mask(mut self) -> Self {
        self.mask = None;
        self
    }

    pub fn with_failing_detector(mut self, error: &str) -> Self {
        self.init_error = Some(error.to_string());
        self
    }

    pub fn with_failing_video(mut self, error: &str) -> Self {
        self.attach_error = Some(error.to_string());
        self
    }

    /// Build an uninitialized scenario
    pub fn build(self) -> FacemaskResult<Scenario> {
        let mut detector = ScriptedLandmarkSource::always(self.faces).with_script(self.script);
        if let Some(e) = &self.init_error {
            detector = detector.failing_init(e);
        }
        let probe = detector.probe();

        let mut video = SyntheticVideo::new(self.frame_size).with_warmup(self.warmup);
        if let Some(e) = &self.attach_error {
            video = video.failing_attach(e);
        }

        let pipeline = MaskPipeline::new(self.config, detector, video, RecordingSurface::new())?;
        Ok(Scenario {
            pipeline,
            probe,
            mask: self.mask,
        })
    }

    /// Build, initialize and start
    pub async fn start(self) -> FacemaskResult<Scenario> {
        let mut scenario = self.build()?;
        scenario.initialize().await?;
        scenario.pipeline.start()?;
        Ok(scenario)
    }
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A pipeline under test plus a view into its detector
pub struct Scenario {
    pub pipeline: ScenarioPipeline,
    pub probe: DetectorProbe,
    mask: Option<MaskAsset>,
}

impl Scenario {
    /// Initialize with the scenario's mask, or a load failure when it has none
    pub async fn initialize(&mut self) -> FacemaskResult<()> {
        let mask = self.mask.take().ok_or_else(|| FacemaskError::AssetLoadFailure {
            path: "mask.png".into(),
            reason: "not found".to_string(),
        });
        self.pipeline.initialize(mask).await
    }

    /// Drive `frames` iterations, stopping early once the loop would end
    pub async fn run_frames(&mut self, frames: usize) -> Vec<FrameOutcome> {
        let mut outcomes = Vec::with_capacity(frames);
        for _ in 0..frames {
            let outcome = self.pipeline.drive_once().await;
            let more = outcome.continues();
            outcomes.push(outcome);
            if !more {
                break;
            }
        }
        outcomes
    }

    pub fn surface(&self) -> &RecordingSurface {
        self.pipeline.surface()
    }
}
