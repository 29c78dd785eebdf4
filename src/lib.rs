// Attention Tracker Core - facial landmark attention estimation
// Per-frame scoring, smoothing and session tracking behind a start/stop state machine

// Module declarations
pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod geometry;
pub mod landmarks;
pub mod managers;
pub mod overlay;

// Re-exports for convenience
pub use analysis::{AttentionEstimator, AttentionStatus, ScoreSmoother, SessionRecorder};
pub use config::AppConfig;
pub use engine::{AttentionTracker, LifecycleState, TickReport, TrackerBackends};
pub use error::{AcquisitionError, ErrorCode, LandmarkError};
pub use geometry::LandmarkPoint;
pub use landmarks::{FaceLandmarkSet, KeyLandmarks};
pub use overlay::OverlayGeometry;
