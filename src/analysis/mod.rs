// Analysis module - per-frame attention scoring and session aggregation
//
// Pipeline for one detected face:
//   AttentionEstimator → ScoreSmoother → SessionRecorder → AttentionStatus
//
// Everything in here is synchronous and owns no I/O; the engine module drives
// it once per video frame.

pub mod estimator;
pub mod session;
pub mod smoother;
pub mod status;

pub use estimator::{AttentionBreakdown, AttentionEstimator, AttentionSample};
pub use session::SessionRecorder;
pub use smoother::{ScoreSmoother, DEFAULT_HISTORY_CAPACITY};
pub use status::{AttentionStatus, ScoreDisplay, StatusTone};
