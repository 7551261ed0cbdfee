// Raw sensor observation as delivered by the host platform

use serde::{Deserialize, Serialize};

/// Sensor that produced an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Cumulative hardware step counter
    StepCounter,
    /// Any other sensor type, identified by its platform type id
    Other(i32),
}

impl SensorKind {
    /// Android `Sensor.TYPE_STEP_COUNTER`
    pub const ANDROID_STEP_COUNTER: i32 = 19;

    /// Map a platform sensor type id
    pub fn from_platform_type(sensor_type: i32) -> Self {
        if sensor_type == Self::ANDROID_STEP_COUNTER {
            SensorKind::StepCounter
        } else {
            SensorKind::Other(sensor_type)
        }
    }
}

/// One `(timestamp, cumulative-step-count)` reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorObservation {
    pub sensor: SensorKind,
    /// Event timestamp in nanoseconds (platform clock)
    pub timestamp_ns: u64,
    /// Steps counted since device boot
    pub cumulative_steps: u64,
}

impl SensorObservation {
    pub fn step_counter(timestamp_ns: u64, cumulative_steps: u64) -> Self {
        Self {
            sensor: SensorKind::StepCounter,
            timestamp_ns,
            cumulative_steps,
        }
    }

    /// Build an observation from the platform's floating-point counter value
    ///
    /// Truncates toward zero; negative and NaN values saturate to 0.
    pub fn from_raw_value(sensor: SensorKind, timestamp_ns: u64, value: f32) -> Self {
        Self {
            sensor,
            timestamp_ns,
            cumulative_steps: value as u64,
        }
    }

    pub fn is_step_counter(&self) -> bool {
        self.sensor == SensorKind::StepCounter
    }
}
