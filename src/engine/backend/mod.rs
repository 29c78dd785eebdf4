//! Backend abstractions for the external collaborators of the engine.
//!
//! The engine never touches a camera or an ML runtime directly. It sees:
//! - [`CameraBackend`]: opens and releases a [`VideoStream`]
//! - [`ModelLoader`]: creates the [`LandmarkProbe`] (face landmark model)
//! - [`TimeSource`]: monotonic clock for detector timestamps

use std::time::Instant;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::{CameraConfig, ModelConfig};
use crate::error::{AcquisitionError, LandmarkError};
use crate::landmarks::FaceLandmarkSet;

mod simulated;
pub use simulated::{SimulatedCamera, StubTimeSource, SyntheticFaceProbe, SyntheticModelLoader};

/// Opaque handle to the frame currently shown by the video source.
///
/// Only `timestamp_secs` carries meaning for the engine; dimensions tell
/// whether a frame has been decoded yet and size the overlay canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoFrame {
    /// Media time of the frame in seconds, non-decreasing while playing
    pub timestamp_secs: f64,
    pub width: u32,
    pub height: u32,
    /// Source-specific frame counter, passed through to the probe
    pub sequence: u64,
}

impl VideoFrame {
    /// A decoded frame has non-zero dimensions.
    pub fn is_ready(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// A playing camera stream.
pub trait VideoStream: Send {
    /// The frame the video element would currently display.
    fn current_frame(&mut self) -> VideoFrame;

    /// Stop all tracks. Called exactly once, on release.
    fn stop(&mut self);
}

/// External face landmark detector.
pub trait LandmarkProbe: Send {
    /// Detect at most one face in `frame`.
    ///
    /// # Arguments
    /// * `frame` - Frame to analyse
    /// * `timestamp_ms` - Monotonic wall-clock timestamp for the detector
    ///
    /// # Returns
    /// * `Ok(Some(set))` - One face found
    /// * `Ok(None)` - No face in frame
    /// * `Err(LandmarkError)` - Detector failed; the engine skips the frame
    fn detect(
        &mut self,
        frame: &VideoFrame,
        timestamp_ms: f64,
    ) -> Result<Option<FaceLandmarkSet>, LandmarkError>;
}

/// Camera acquisition API.
pub trait CameraBackend: Send + Sync {
    fn acquire(
        &self,
        constraints: &CameraConfig,
    ) -> BoxFuture<'static, Result<Box<dyn VideoStream>, AcquisitionError>>;

    fn release(&self, mut stream: Box<dyn VideoStream>) {
        stream.stop();
    }
}

/// Creates the landmark probe. Loaded once per tracker and reused across runs.
pub trait ModelLoader: Send + Sync {
    fn load(
        &self,
        options: &ModelConfig,
    ) -> BoxFuture<'static, Result<Box<dyn LandmarkProbe>, AcquisitionError>>;
}

/// Trait representing a monotonic time source used for detector timestamps.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Default time source backed by `Instant::now`.
#[derive(Default)]
pub struct SystemTimeSource {
    _unit: (),
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_readiness() {
        let mut frame = VideoFrame {
            timestamp_secs: 0.0,
            width: 0,
            height: 0,
            sequence: 0,
        };
        assert!(!frame.is_ready());
        frame.width = 640;
        frame.height = 360;
        assert!(frame.is_ready());
    }
}
