//! Pipeline configuration
//!
//! JSON, every field optional:
//!
//! ```json
//! {
//!   "transform": { "k_width": 2.8, "k_y_offset": 0.9,
//!                  "indices": { "left_eye_outer": 33, "right_eye_outer": 263, "nose_tip": 1 } },
//!   "frame_interval_ms": 16
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use facemask_core::{FacemaskError, FacemaskResult};
use facemask_visual::TransformConfig;

/// Pipeline configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Calibration of the landmark → placement transform
    pub transform: TransformConfig,
    /// Period of the built-in interval scheduler
    pub frame_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            transform: TransformConfig::default(),
            frame_interval_ms: 16,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> FacemaskResult<Self> {
        let config: PipelineConfig =
            serde_json::from_str(json).map_err(|e| FacemaskError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> FacemaskResult<Self> {
        let path = path.as_ref();
        debug!("Loading pipeline config from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> FacemaskResult<()> {
        self.transform.validate()?;
        if self.frame_interval_ms == 0 {
            return Err(FacemaskError::Config(
                "frame_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}
