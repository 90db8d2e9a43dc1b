//! Error types for facemask

use std::path::PathBuf;

use thiserror::Error;

/// Core facemask errors
#[derive(Error, Debug)]
pub enum FacemaskError {
    // Landmark errors
    #[error("Face has no landmark mesh")]
    MissingMesh,

    #[error("Missing landmark at index {index}")]
    MissingLandmarks { index: usize },

    #[error("Landmark {index} has non-finite coordinates")]
    InvalidLandmark { index: usize },

    // Detector errors
    #[error("Landmark detector failed: {0}")]
    DetectorFailure(String),

    // Asset errors
    #[error("Failed to load mask {path}: {reason}")]
    AssetLoadFailure { path: PathBuf, reason: String },

    #[error("Invalid mask: {width}x{height}")]
    InvalidMask { width: u32, height: u32 },

    // Video errors
    #[error("Video source not ready")]
    SourceNotReady,

    // Lifecycle errors
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Invalid pipeline state: expected {expected}, got {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    // Output errors
    #[error("Failed to encode surface: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for facemask operations
pub type FacemaskResult<T> = Result<T, FacemaskError>;
