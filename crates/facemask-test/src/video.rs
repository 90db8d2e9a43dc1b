//! Synthetic video source

use std::cell::Cell;
use std::collections::VecDeque;

use async_trait::async_trait;

use facemask_core::{FacemaskError, FacemaskResult, FrameSize, VideoFrame};
use facemask_runtime::VideoSource;

/// Video source producing blank frames of a configurable size
pub struct SyntheticVideo {
    size: FrameSize,
    /// Readiness checks still to be answered "not decodable"
    warmup: Cell<u32>,
    /// Size changes applied one per produced frame, front first
    resolution_changes: VecDeque<FrameSize>,
    attach_error: Option<String>,
    sequence: u64,
}

impl SyntheticVideo {
    pub fn new(size: FrameSize) -> Self {
        SyntheticVideo {
            size,
            warmup: Cell::new(0),
            resolution_changes: VecDeque::new(),
            attach_error: None,
            sequence: 0,
        }
    }

    /// 640x480, the usual webcam default
    pub fn vga() -> Self {
        Self::new(FrameSize::new(640, 480))
    }

    /// First `frames` readiness checks report no decodable frame
    pub fn with_warmup(self, frames: u32) -> Self {
        self.warmup.set(frames);
        self
    }

    /// Switch to `size` starting with the next produced frame
    pub fn change_resolution(&mut self, size: FrameSize) {
        self.resolution_changes.push_back(size);
    }

    /// `attach` rejects (e.g. camera permission denied)
    pub fn failing_attach(mut self, error: &str) -> Self {
        self.attach_error = Some(error.to_string());
        self
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    pub fn frames_produced(&self) -> u64 {
        self.sequence
    }
}

#[async_trait]
impl VideoSource for SyntheticVideo {
    async fn attach(&mut self) -> FacemaskResult<FrameSize> {
        match &self.attach_error {
            Some(e) => Err(FacemaskError::Initialization(e.clone())),
            None => Ok(self.size),
        }
    }

    fn is_ready(&self) -> bool {
        let remaining = self.warmup.get();
        if remaining > 0 {
            self.warmup.set(remaining - 1);
            return false;
        }
        true
    }

    fn current_frame(&mut self) -> Option<VideoFrame> {
        if self.warmup.get() > 0 {
            return None;
        }
        if let Some(size) = self.resolution_changes.pop_front() {
            self.size = size;
        }
        self.sequence += 1;
        Some(VideoFrame::blank(self.sequence, self.size))
    }
}
