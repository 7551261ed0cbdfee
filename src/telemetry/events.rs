//! Telemetry event types describing tracker lifecycle, exposed to the CLI
//! and flutter_rust_bridge streams.

use serde::{Deserialize, Serialize};

/// Telemetry event emitted by the tracker handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryEvent {
    /// Milliseconds since the handle was created
    pub timestamp_ms: u64,
    pub kind: TelemetryEventKind,
    pub detail: Option<String>,
}

/// Types of telemetry events supported by the tracker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum TelemetryEventKind {
    TrackingStarted,
    TrackingStopped { step_count: u64 },
    CountersReset,
    SensorSubscribed { subscription_id: u64 },
    SensorReleased { subscription_id: u64 },
    BaselineCaptured { baseline: u64 },
    CounterDecreased { raw: u64, baseline: u64 },
    Warning,
}
