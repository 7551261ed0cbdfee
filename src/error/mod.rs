// Error types for the Steppo step tracker
//
// This module defines custom error types for tracker orchestration and sensor
// subscription, providing structured error handling with error codes suitable
// for FFI communication.

mod sensor;
mod tracking;

pub use sensor::{log_sensor_error, SensorError, SensorErrorCodes};
pub use tracking::{log_tracking_error, TrackingError, TrackingErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types across the FFI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
