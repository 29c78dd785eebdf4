// Error types for the attention tracker
//
// This module defines custom error types for resource acquisition and landmark
// handling, providing structured error handling with stable error codes for
// whatever UI layer sits on top of the engine.

mod acquisition;
mod landmarks;

pub use acquisition::{log_acquisition_error, AcquisitionError, AcquisitionErrorCodes};
pub use landmarks::{log_landmark_error, LandmarkError, LandmarkErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the engine boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
