//! facemask Demo
//!
//! Runs the full frame loop against synthetic input:
//! - A synthetic 640x480 video stream
//! - One or more drifting, rolling faces standing in for a landmark model
//! - A raster surface whose mask layer is written out as PNG per frame

use std::path::PathBuf;

use async_trait::async_trait;
use clap::Parser;
use tracing::{info, warn};

use facemask_core::{FaceRecord, FacemaskResult, FrameSize, MaskAsset, VideoFrame};
use facemask_runtime::{
    init_tracing, BoundedScheduler, FrameOutcome, FrameScheduler, IntervalScheduler,
    LandmarkSource, LogFormat, MaskPipeline, PipelineConfig,
};
use facemask_test::{solid_mask, FacePose, SyntheticFace, SyntheticVideo};
use facemask_visual::RasterSurface;

/// Overlay a mask on synthetic faces and dump the frames
#[derive(Parser)]
#[command(name = "mask-demo")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Mask image (PNG/JPEG). A flat square is used when omitted.
    #[arg(short, long)]
    mask: Option<PathBuf>,

    /// Pipeline config (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for per-frame PNGs of the mask layer
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Frames to render
    #[arg(short, long, default_value_t = 60)]
    frames: u64,

    /// Synthetic faces in view
    #[arg(long, default_value_t = 1)]
    faces: usize,

    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Emit JSON logs
    #[arg(long)]
    json: bool,
}

/// Landmark source that walks a set of synthetic faces one step per frame
struct DriftingFaces {
    faces: Vec<SyntheticFace>,
}

impl DriftingFaces {
    fn new(count: usize, size: FrameSize, seed: u64) -> Self {
        let bounds = (size.width as f32, size.height as f32);
        let faces = (0..count)
            .map(|i| {
                let slot = (i as f32 + 1.0) / (count as f32 + 1.0);
                let pose = FacePose::new((bounds.0 * slot, bounds.1 / 2.0), 60.0);
                SyntheticFace::new(pose, bounds, seed.wrapping_add(i as u64))
            })
            .collect();
        DriftingFaces { faces }
    }
}

#[async_trait]
impl LandmarkSource for DriftingFaces {
    async fn init(&mut self) -> FacemaskResult<()> {
        info!(faces = self.faces.len(), "Synthetic landmark model ready");
        Ok(())
    }

    async fn detect(&mut self, _frame: &VideoFrame) -> FacemaskResult<Vec<FaceRecord>> {
        Ok(self.faces.iter_mut().map(SyntheticFace::step).collect())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let format = if args.json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(format, "info")?;

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let mask = match &args.mask {
        Some(path) => MaskAsset::load(path),
        None => Ok(solid_mask(120, 80)),
    };
    if let Some(dir) = &args.out {
        std::fs::create_dir_all(dir)?;
    }

    let video = SyntheticVideo::vga();
    let detector = DriftingFaces::new(args.faces, video.size(), args.seed);
    let surface = RasterSurface::new(video.size());
    let interval = config.frame_interval();

    let mut pipeline = MaskPipeline::new(config, detector, video, surface)?;
    pipeline.initialize(mask).await?;
    pipeline.start()?;

    let mut scheduler = BoundedScheduler::new(IntervalScheduler::new(interval), args.frames);
    while scheduler.next_frame().await {
        match pipeline.drive_once().await {
            FrameOutcome::Rendered(report) => {
                if let Some(dir) = &args.out {
                    let path = dir.join(format!("frame_{:05}.png", report.sequence));
                    if let Err(e) = pipeline.surface().save_png(&path) {
                        warn!(path = %path.display(), error = %e, "Failed to write frame");
                    }
                }
            }
            outcome if !outcome.continues() => break,
            _ => {}
        }
    }

    pipeline.stop();
    let stats = pipeline.stats();
    info!(
        frames = stats.frames_rendered,
        drawn = stats.faces_drawn,
        skipped = stats.faces_skipped,
        last_iteration = ?stats.last_iteration_duration,
        "Done"
    );
    Ok(())
}
