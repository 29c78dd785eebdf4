// Acquisition error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Acquisition error code constants
///
/// Single source of truth for the numeric codes surfaced to UI layers.
///
/// Error code range: 1001-1005
pub struct AcquisitionErrorCodes {}

impl AcquisitionErrorCodes {
    /// Camera could not be opened
    pub const CAMERA_UNAVAILABLE: i32 = 1001;

    /// Camera permission denied by the user or platform
    pub const PERMISSION_DENIED: i32 = 1002;

    /// Landmark model could not be created
    pub const MODEL_LOAD_FAILED: i32 = 1003;

    /// Camera opened but the stream failed to start playing
    pub const STREAM_START_FAILED: i32 = 1004;

    /// Mutex was poisoned
    pub const LOCK_POISONED: i32 = 1005;
}

/// Log an acquisition error with structured context
///
/// This function logs acquisition errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
pub fn log_acquisition_error(err: &AcquisitionError, component: &str, context: &str) {
    error!("{}", acquisition_log_line(err, component, context));
}

fn acquisition_log_line(err: &AcquisitionError, component: &str, context: &str) -> String {
    format!(
        "Acquisition error in {}: code={}, component={}, message={}",
        context,
        err.code(),
        component,
        err.message()
    )
}

/// Errors raised while acquiring the camera stream or the landmark model.
///
/// Any of these aborts a `start()`: the controller returns to `Idle` and
/// nothing stays acquired.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionError {
    /// Camera device missing or busy
    CameraUnavailable { reason: String },

    /// Camera permission denied
    PermissionDenied,

    /// Landmark model failed to load
    ModelLoadFailed { reason: String },

    /// Stream opened but playback never started
    StreamStartFailed { reason: String },

    /// Mutex was poisoned
    LockPoisoned { component: String },
}

impl AcquisitionError {
    /// Underlying reason suitable for a user-visible status line.
    pub fn reason(&self) -> String {
        match self {
            AcquisitionError::CameraUnavailable { reason }
            | AcquisitionError::ModelLoadFailed { reason }
            | AcquisitionError::StreamStartFailed { reason } => reason.clone(),
            AcquisitionError::PermissionDenied => "permission denied".to_string(),
            AcquisitionError::LockPoisoned { component } => {
                format!("{} lock poisoned", component)
            }
        }
    }
}

impl ErrorCode for AcquisitionError {
    fn code(&self) -> i32 {
        match self {
            AcquisitionError::CameraUnavailable { .. } => AcquisitionErrorCodes::CAMERA_UNAVAILABLE,
            AcquisitionError::PermissionDenied => AcquisitionErrorCodes::PERMISSION_DENIED,
            AcquisitionError::ModelLoadFailed { .. } => AcquisitionErrorCodes::MODEL_LOAD_FAILED,
            AcquisitionError::StreamStartFailed { .. } => {
                AcquisitionErrorCodes::STREAM_START_FAILED
            }
            AcquisitionError::LockPoisoned { .. } => AcquisitionErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            AcquisitionError::CameraUnavailable { reason } => {
                format!("Camera unavailable: {}", reason)
            }
            AcquisitionError::PermissionDenied => "Camera permission denied".to_string(),
            AcquisitionError::ModelLoadFailed { reason } => {
                format!("Failed to load attention model: {}", reason)
            }
            AcquisitionError::StreamStartFailed { reason } => {
                format!("Failed to start video stream: {}", reason)
            }
            AcquisitionError::LockPoisoned { component } => {
                format!("Lock poisoned for component: {}", component)
            }
        }
    }
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AcquisitionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AcquisitionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquisition_error_codes() {
        assert_eq!(
            AcquisitionError::CameraUnavailable {
                reason: "busy".to_string()
            }
            .code(),
            1001
        );
        assert_eq!(AcquisitionError::PermissionDenied.code(), 1002);
        assert_eq!(
            AcquisitionError::ModelLoadFailed {
                reason: "404".to_string()
            }
            .code(),
            1003
        );
        assert_eq!(
            AcquisitionError::StreamStartFailed {
                reason: "autoplay".to_string()
            }
            .code(),
            1004
        );
        assert_eq!(
            AcquisitionError::LockPoisoned {
                component: "tracker".to_string()
            }
            .code(),
            1005
        );
    }

    #[test]
    fn test_message_includes_reason() {
        let err = AcquisitionError::CameraUnavailable {
            reason: "device busy".to_string(),
        };
        assert!(err.message().contains("device busy"));
        assert_eq!(err.reason(), "device busy");
        assert!(err.to_string().contains("code 1001"));
    }

    #[test]
    fn test_log_line_names_calling_component() {
        let err = AcquisitionError::LockPoisoned {
            component: "LifecycleController".to_string(),
        };
        let line = acquisition_log_line(&err, "AttentionTracker", "lock_controller");
        assert!(line.contains("component=AttentionTracker"));
        assert!(line.contains("in lock_controller"));
        assert!(line.contains("code=1005"));
    }
}
