// Tracking error types and constants

use crate::error::ErrorCode;
use flutter_rust_bridge::frb;
use log::error;
use std::fmt;

/// Tracking error code constants exposed to Dart via FFI
///
/// Error code range: 1001-1003
#[frb(unignore)]
pub struct TrackingErrorCodes {}

#[frb]
impl TrackingErrorCodes {
    /// Mutex/RwLock guarding tracker state was poisoned
    pub const LOCK_POISONED: i32 = 1001;

    /// Snapshot or telemetry stream closed unexpectedly
    pub const STREAM_FAILURE: i32 = 1002;

    /// Tracker used before its channels were initialized
    pub const NOT_INITIALIZED: i32 = 1003;

    /// Get LOCK_POISONED error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn lock_poisoned() -> i32 {
        Self::LOCK_POISONED
    }

    /// Get STREAM_FAILURE error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn stream_failure() -> i32 {
        Self::STREAM_FAILURE
    }

    /// Get NOT_INITIALIZED error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn not_initialized() -> i32 {
        Self::NOT_INITIALIZED
    }
}

/// Log a tracking error with structured context
pub fn log_tracking_error(err: &TrackingError, context: &str) {
    error!(
        "Tracking error in {}: code={}, component=TrackerHandle, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised by the tracker orchestration layer
///
/// The step-tracking core itself never fails; these cover the shared state
/// and stream plumbing around it.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingError {
    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },

    /// Stream channel disconnected unexpectedly
    StreamFailure { reason: String },

    /// Channel requested before initialization
    NotInitialized,
}

impl ErrorCode for TrackingError {
    fn code(&self) -> i32 {
        match self {
            TrackingError::LockPoisoned { .. } => TrackingErrorCodes::LOCK_POISONED,
            TrackingError::StreamFailure { .. } => TrackingErrorCodes::STREAM_FAILURE,
            TrackingError::NotInitialized => TrackingErrorCodes::NOT_INITIALIZED,
        }
    }

    fn message(&self) -> String {
        match self {
            TrackingError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
            TrackingError::StreamFailure { reason } => {
                format!("Tracking stream failed: {}", reason)
            }
            TrackingError::NotInitialized => {
                "Tracker channels not initialized".to_string()
            }
        }
    }
}

impl fmt::Display for TrackingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrackingError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for TrackingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_error_codes() {
        assert_eq!(
            TrackingError::LockPoisoned {
                component: "tracker".to_string()
            }
            .code(),
            TrackingErrorCodes::LOCK_POISONED
        );
        assert_eq!(
            TrackingError::StreamFailure {
                reason: "closed".to_string()
            }
            .code(),
            1002
        );
        assert_eq!(TrackingError::NotInitialized.code(), 1003);
    }

    #[test]
    fn test_tracking_error_display() {
        let err = TrackingError::LockPoisoned {
            component: "tracker".to_string(),
        };
        assert!(err.message().contains("tracker"));
        assert!(err.to_string().contains("code 1001"));
    }

    #[test]
    fn test_getters_match_constants() {
        assert_eq!(TrackingErrorCodes::lock_poisoned(), 1001);
        assert_eq!(TrackingErrorCodes::stream_failure(), 1002);
        assert_eq!(TrackingErrorCodes::not_initialized(), 1003);
    }
}
