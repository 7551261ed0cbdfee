use futures::Stream;

use crate::error::TrackingError;
use crate::telemetry::{TelemetryEvent, TelemetrySnapshot};
use crate::tracking::SessionSnapshot;

use super::TRACKER;

/// Stream of session snapshots, one per observable change
///
/// The renderer redraws the step and distance cards on every item.
///
/// # Usage
/// ```dart
/// final stream = await sessionStream();
/// await for (final snapshot in stream) {
///   setState(() => steps = snapshot.stepCount);
/// }
/// ```
#[flutter_rust_bridge::frb(ignore)]
pub async fn session_stream() -> Result<impl Stream<Item = SessionSnapshot>, TrackingError> {
    TRACKER.snapshot_stream().await
}

/// Stream of tracker lifecycle telemetry for debug instrumentation
#[flutter_rust_bridge::frb(ignore)]
pub async fn telemetry_stream() -> impl Stream<Item = TelemetryEvent> {
    TRACKER.telemetry_stream().await
}

/// Bounded history of recent telemetry events
#[flutter_rust_bridge::frb(sync)]
pub fn get_telemetry_snapshot() -> TelemetrySnapshot {
    TRACKER.telemetry_snapshot()
}
