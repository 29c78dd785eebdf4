//! Engine module housing the attention tracking core.
//!
//! - `backend`: trait seams for camera, landmark model and time
//! - `clock`: frame clocks driving the per-frame loop
//! - `scheduler`: one pipeline evaluation per video frame
//! - `lifecycle`: Idle/Starting/Running/Stopping state machine
//! - `core`: the `AttentionTracker` handle with its broadcast channels

pub mod backend;
pub mod clock;
pub mod core;
pub mod events;
pub mod lifecycle;
pub mod scheduler;

pub use backend::{
    CameraBackend, LandmarkProbe, ModelLoader, StubTimeSource, SystemTimeSource, TimeSource,
    VideoFrame, VideoStream,
};
pub use clock::{FrameClock, FrameRequestId, FrameTicker, IntervalFrameClock, ManualFrameClock};
pub use core::{AttentionTracker, SimulationOptions, TrackerBackends};
pub use events::{TrackerEvent, TrackerEventKind};
pub use lifecycle::{LifecycleController, LifecycleState, SessionSummary, StopOutcome};
pub use scheduler::{FrameScheduler, TickOutcome, TickReport, TickStats};
