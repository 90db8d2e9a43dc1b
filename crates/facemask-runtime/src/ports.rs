//! Ports - the external collaborators the loop drives
//!
//! Both traits are implemented outside this crate: by a camera/decoder
//! binding and a landmark model in production, by scripted fakes in tests.

use async_trait::async_trait;

use facemask_core::{FaceRecord, FacemaskResult, FrameSize, VideoFrame};

/// Face landmark detector
///
/// Owned by the pipeline, which calls `init` once before the first frame
/// and `dispose` once on teardown.
#[async_trait]
pub trait LandmarkSource: Send {
    /// Load model weights and warm up
    async fn init(&mut self) -> FacemaskResult<()>;

    /// Detect faces in one frame. An empty vec means no faces.
    async fn detect(&mut self, frame: &VideoFrame) -> FacemaskResult<Vec<FaceRecord>>;

    /// Release model resources
    fn dispose(&mut self) {}
}

/// Live video source
#[async_trait]
pub trait VideoSource: Send {
    /// Attach the stream. Resolves once frame dimensions are known.
    async fn attach(&mut self) -> FacemaskResult<FrameSize>;

    /// Whether the current frame can be decoded
    fn is_ready(&self) -> bool;

    /// The current decoded frame, `None` if not decodable yet
    fn current_frame(&mut self) -> Option<VideoFrame>;
}
