// Public API for flutter_rust_bridge integration
// This module provides FFI functions for the Flutter UI to drive the step tracker

#![allow(dead_code)] // FFI functions are called from Dart, not detected by Rust analyzer

use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;

use crate::config::AppConfig;
use crate::engine::{HostFeedBackend, PermissionStatus, TrackerHandle};
use crate::error::{SensorErrorCodes, TrackingError, TrackingErrorCodes};
use crate::tracking::{SensorKind, SensorObservation, SessionSnapshot};

pub mod streams;

#[cfg(test)]
mod tests;

/// Backend receiving sensor events forwarded by the host listener
static HOST_FEED: Lazy<Arc<HostFeedBackend>> = Lazy::new(|| Arc::new(HostFeedBackend::new()));

/// Global TrackerHandle instance bound to the host feed
static TRACKER: Lazy<TrackerHandle> = Lazy::new(|| TrackerHandle::new(HOST_FEED.clone()));

/// Get the version of the step tracker core
#[flutter_rust_bridge::frb(sync)]
pub fn get_version() -> Result<String> {
    Ok(env!("CARGO_PKG_VERSION").to_string())
}

/// Initialize logging from the platform configuration
///
/// Safe to call more than once.
#[flutter_rust_bridge::frb(sync)]
pub fn init_app() -> Result<()> {
    let config = AppConfig::load_platform();
    crate::logging::init_logging(&config.logging);
    Ok(())
}

/// Start a tracking session (START button)
///
/// Resets the counters and subscribes to the step counter. Ignored while a
/// session is already running.
///
/// # Returns
/// * `Ok(SessionSnapshot)` - State after starting
/// * `Err(TrackingError)` - Tracker state lock poisoned
#[flutter_rust_bridge::frb]
pub fn start_tracking() -> Result<SessionSnapshot, TrackingError> {
    TRACKER.start_tracking()
}

/// Stop the tracking session (STOP button)
///
/// Freezes the displayed values and releases the sensor subscription.
#[flutter_rust_bridge::frb]
pub fn stop_tracking() -> Result<SessionSnapshot, TrackingError> {
    TRACKER.stop_tracking()
}

/// Zero the counters without changing tracking state
#[flutter_rust_bridge::frb]
pub fn reset_counters() -> Result<SessionSnapshot, TrackingError> {
    TRACKER.reset_counters()
}

/// Current step count, distance and tracking flag
#[flutter_rust_bridge::frb(sync)]
pub fn get_session_snapshot() -> Result<SessionSnapshot, TrackingError> {
    TRACKER.snapshot()
}

/// Forward one sensor event from the host listener
///
/// # Arguments
/// * `sensor_type` - Platform sensor type id (19 = step counter on Android)
/// * `timestamp_ns` - Event timestamp in nanoseconds
/// * `value` - Raw cumulative counter value (`event.values[0]`)
///
/// # Returns
/// Number of active subscriptions that received the event
#[flutter_rust_bridge::frb(sync)]
pub fn push_step_reading(sensor_type: i32, timestamp_ns: u64, value: f32) -> usize {
    let observation = SensorObservation::from_raw_value(
        SensorKind::from_platform_type(sensor_type),
        timestamp_ns,
        value,
    );
    HOST_FEED.push(observation)
}

/// Report the activity-recognition permission result
#[flutter_rust_bridge::frb(sync)]
pub fn report_permission(granted: bool) {
    let status = if granted {
        PermissionStatus::Granted
    } else {
        PermissionStatus::Denied
    };
    HOST_FEED.set_permission(status);
}

/// Whether the host still needs to request the permission
#[flutter_rust_bridge::frb(sync)]
pub fn needs_permission_request() -> bool {
    HOST_FEED.permission() != PermissionStatus::Granted
}

/// Report whether the device exposes a step counter sensor
#[flutter_rust_bridge::frb(sync)]
pub fn report_sensor_available(available: bool) {
    HOST_FEED.set_sensor_available(available);
}

// Error code constant accessors for Dart/Flutter

/// Get TrackingErrorCodes as a structured object with all error code constants
#[flutter_rust_bridge::frb(sync)]
pub fn get_tracking_error_codes() -> TrackingErrorCodes {
    TrackingErrorCodes {}
}

/// Get SensorErrorCodes as a structured object with all error code constants
#[flutter_rust_bridge::frb(sync)]
pub fn get_sensor_error_codes() -> SensorErrorCodes {
    SensorErrorCodes {}
}
