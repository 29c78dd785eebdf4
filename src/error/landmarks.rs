// Landmark error types and constants

use crate::error::ErrorCode;
use log::warn;
use std::fmt;

/// Landmark error code constants
///
/// Error code range: 2001-2003
pub struct LandmarkErrorCodes {}

impl LandmarkErrorCodes {
    /// A required landmark index is missing from the set
    pub const INVALID_LANDMARK_SET: i32 = 2001;

    /// A required landmark carries NaN or infinite coordinates
    pub const NON_FINITE_LANDMARK: i32 = 2002;

    /// The landmark probe failed outright
    pub const PROBE_FAILED: i32 = 2003;
}

/// Log a landmark error with structured context
///
/// Landmark errors are never fatal, so they are logged at warn level.
pub fn log_landmark_error(err: &LandmarkError, context: &str) {
    warn!(
        "Landmark error in {}: code={}, component=FrameScheduler, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Malformed or failed detector output.
///
/// The scheduler treats every variant as "no detection" for the current tick.
#[derive(Debug, Clone, PartialEq)]
pub enum LandmarkError {
    /// Required index is out of range for the set
    InvalidLandmarkSet { index: usize, len: usize },

    /// Required point has a non-finite coordinate
    NonFiniteLandmark { index: usize },

    /// Probe raised an error instead of returning a result
    ProbeFailed { reason: String },
}

impl ErrorCode for LandmarkError {
    fn code(&self) -> i32 {
        match self {
            LandmarkError::InvalidLandmarkSet { .. } => LandmarkErrorCodes::INVALID_LANDMARK_SET,
            LandmarkError::NonFiniteLandmark { .. } => LandmarkErrorCodes::NON_FINITE_LANDMARK,
            LandmarkError::ProbeFailed { .. } => LandmarkErrorCodes::PROBE_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            LandmarkError::InvalidLandmarkSet { index, len } => {
                format!(
                    "Invalid landmark set: index {} missing (set has {} points)",
                    index, len
                )
            }
            LandmarkError::NonFiniteLandmark { index } => {
                format!("Landmark {} has non-finite coordinates", index)
            }
            LandmarkError::ProbeFailed { reason } => {
                format!("Landmark probe failed: {}", reason)
            }
        }
    }
}

impl fmt::Display for LandmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LandmarkError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for LandmarkError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_error_codes() {
        assert_eq!(
            LandmarkError::InvalidLandmarkSet { index: 386, len: 10 }.code(),
            2001
        );
        assert_eq!(LandmarkError::NonFiniteLandmark { index: 1 }.code(), 2002);
        assert_eq!(
            LandmarkError::ProbeFailed {
                reason: "wasm trap".to_string()
            }
            .code(),
            2003
        );
    }

    #[test]
    fn test_landmark_error_display() {
        let err = LandmarkError::InvalidLandmarkSet { index: 386, len: 10 };
        assert!(err.message().contains("index 386"));
        assert!(err.message().contains("10 points"));

        let err = LandmarkError::ProbeFailed {
            reason: "wasm trap".to_string(),
        };
        assert!(err.to_string().contains("wasm trap"));
    }
}
