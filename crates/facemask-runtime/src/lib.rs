//! facemask runtime - Per-frame orchestration
//!
//! Each iteration of the loop:
//! 1. Check the video source can decode a frame (else skip the iteration)
//! 2. Run landmark detection on the frame (may suspend)
//! 3. Discard the result if cancellation arrived meanwhile
//! 4. Resize and clear the surface
//! 5. Transform each face's landmarks into a placement
//! 6. Composite the mask for every placed face
//!
//! A failed iteration is reported as a [`FrameOutcome`] and never stops the
//! loop. Only cancellation (or the host ending its frame signal) does.

pub mod config;
pub mod pipeline;
pub mod ports;
pub mod scheduler;
pub mod telemetry;

pub use config::*;
pub use pipeline::*;
pub use ports::*;
pub use scheduler::*;
pub use telemetry::*;

pub use tokio_util::sync::CancellationToken;
