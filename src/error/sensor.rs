// Sensor error types and constants

use crate::error::ErrorCode;
use flutter_rust_bridge::frb;
use log::error;
use std::fmt;

/// Sensor error code constants exposed to Dart via FFI
///
/// Error code range: 2001-2003
#[frb(unignore)]
pub struct SensorErrorCodes {}

#[frb]
impl SensorErrorCodes {
    /// Device has no step counter sensor
    pub const SENSOR_UNAVAILABLE: i32 = 2001;

    /// Backend could not register the listener
    pub const SUBSCRIPTION_FAILED: i32 = 2002;

    /// Backend listener registry lock was poisoned
    pub const LOCK_POISONED: i32 = 2003;

    /// Get SENSOR_UNAVAILABLE error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn sensor_unavailable() -> i32 {
        Self::SENSOR_UNAVAILABLE
    }

    /// Get SUBSCRIPTION_FAILED error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn subscription_failed() -> i32 {
        Self::SUBSCRIPTION_FAILED
    }

    /// Get LOCK_POISONED error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn lock_poisoned() -> i32 {
        Self::LOCK_POISONED
    }
}

/// Log a sensor error with structured context
pub fn log_sensor_error(err: &SensorError, context: &str) {
    error!(
        "Sensor error in {}: code={}, component=StepSensorBackend, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Sensor subscription errors
///
/// None of these stop a session from starting; without a subscription the
/// counters simply stay at zero.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorError {
    /// No step counter present on the device
    SensorUnavailable,

    /// Listener registration failed
    SubscriptionFailed { reason: String },

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },
}

impl ErrorCode for SensorError {
    fn code(&self) -> i32 {
        match self {
            SensorError::SensorUnavailable => SensorErrorCodes::SENSOR_UNAVAILABLE,
            SensorError::SubscriptionFailed { .. } => SensorErrorCodes::SUBSCRIPTION_FAILED,
            SensorError::LockPoisoned { .. } => SensorErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            SensorError::SensorUnavailable => "Step counter sensor not available".to_string(),
            SensorError::SubscriptionFailed { reason } => {
                format!("Failed to subscribe to step counter: {}", reason)
            }
            SensorError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SensorError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SensorError {}

impl From<std::io::Error> for SensorError {
    fn from(err: std::io::Error) -> Self {
        SensorError::SubscriptionFailed {
            reason: err.to_string(),
        }
    }
}
