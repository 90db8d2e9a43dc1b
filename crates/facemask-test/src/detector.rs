//! Scripted landmark source

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use facemask_core::{FaceRecord, FacemaskError, FacemaskResult, VideoFrame};
use facemask_runtime::LandmarkSource;

/// One scripted response to a `detect` call
pub enum Detection {
    /// Resolve immediately with these faces
    Faces(Vec<FaceRecord>),
    /// Reject immediately
    Fail(String),
    /// Stay pending until the paired [`DetectionGate`] is released
    Gated(oneshot::Receiver<FacemaskResult<Vec<FaceRecord>>>),
}

/// Releases a [`Detection::Gated`] response
pub struct DetectionGate {
    tx: oneshot::Sender<FacemaskResult<Vec<FaceRecord>>>,
}

impl DetectionGate {
    pub fn release(self, faces: Vec<FaceRecord>) {
        let _ = self.tx.send(Ok(faces));
    }

    pub fn reject(self, error: &str) {
        let _ = self
            .tx
            .send(Err(FacemaskError::DetectorFailure(error.to_string())));
    }
}

/// Gated detection and the handle that resolves it
pub fn gated_detection() -> (Detection, DetectionGate) {
    let (tx, rx) = oneshot::channel();
    (Detection::Gated(rx), DetectionGate { tx })
}

/// Call counters shared between a [`ScriptedLandmarkSource`] and the test
#[derive(Debug, Default)]
pub struct DetectorCalls {
    pub init: u32,
    pub detect: u32,
    pub dispose: u32,
    /// Sequence numbers of every frame passed to `detect`
    pub frames: Vec<u64>,
}

/// Test-side view of a [`ScriptedLandmarkSource`]
#[derive(Clone, Default)]
pub struct DetectorProbe {
    calls: Arc<Mutex<DetectorCalls>>,
    script: Arc<Mutex<VecDeque<Detection>>>,
}

impl DetectorProbe {
    pub fn init_calls(&self) -> u32 {
        self.calls.lock().init
    }

    pub fn detect_calls(&self) -> u32 {
        self.calls.lock().detect
    }

    pub fn dispose_calls(&self) -> u32 {
        self.calls.lock().dispose
    }

    pub fn frames_seen(&self) -> Vec<u64> {
        self.calls.lock().frames.clone()
    }

    /// Append a response after the ones already scripted
    pub fn push(&self, detection: Detection) {
        self.script.lock().push_back(detection);
    }

    pub fn pending_script(&self) -> usize {
        self.script.lock().len()
    }
}

/// Landmark source that replays a script, then a fallback
pub struct ScriptedLandmarkSource {
    probe: DetectorProbe,
    fallback: Vec<FaceRecord>,
    init_error: Option<String>,
}

impl ScriptedLandmarkSource {
    pub fn new() -> Self {
        ScriptedLandmarkSource {
            probe: DetectorProbe::default(),
            fallback: Vec::new(),
            init_error: None,
        }
    }

    /// Every call returns the same faces once the script is exhausted
    pub fn always(faces: Vec<FaceRecord>) -> Self {
        Self::new().with_fallback(faces)
    }

    pub fn with_fallback(mut self, faces: Vec<FaceRecord>) -> Self {
        self.fallback = faces;
        self
    }

    pub fn with_script(self, script: impl IntoIterator<Item = Detection>) -> Self {
        for detection in script {
            self.probe.push(detection);
        }
        self
    }

    /// `init` rejects (model failed to load)
    pub fn failing_init(mut self, error: &str) -> Self {
        self.init_error = Some(error.to_string());
        self
    }

    pub fn probe(&self) -> DetectorProbe {
        self.probe.clone()
    }
}

impl Default for ScriptedLandmarkSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LandmarkSource for ScriptedLandmarkSource {
    async fn init(&mut self) -> FacemaskResult<()> {
        self.probe.calls.lock().init += 1;
        match &self.init_error {
            Some(e) => Err(FacemaskError::DetectorFailure(e.clone())),
            None => Ok(()),
        }
    }

    async fn detect(&mut self, frame: &VideoFrame) -> FacemaskResult<Vec<FaceRecord>> {
        {
            let mut calls = self.probe.calls.lock();
            calls.detect += 1;
            calls.frames.push(frame.sequence);
        }

        let next = self.probe.script.lock().pop_front();
        match next {
            Some(Detection::Faces(faces)) => Ok(faces),
            Some(Detection::Fail(e)) => Err(FacemaskError::DetectorFailure(e)),
            Some(Detection::Gated(rx)) => rx.await.unwrap_or_else(|_| {
                Err(FacemaskError::DetectorFailure("gate dropped".to_string()))
            }),
            None => Ok(self.fallback.clone()),
        }
    }

    fn dispose(&mut self) {
        self.probe.calls.lock().dispose += 1;
    }
}
