//! Engine module housing the step tracking orchestration.
//!
//! This module exposes trait-based sensor backends (`backend`) and the
//! `TrackerHandle` orchestration layer (`core`) shared by the FFI API, the
//! CLI and the fixture runner.

pub mod backend;
pub mod core;

pub use backend::{
    HostFeedBackend, ObservationSink, PermissionStatus, ReplayBackend, SensorAvailability,
    SensorDelay, SensorSubscription, StepSensorBackend, StubTimeSource, SystemTimeSource,
    TimeSource,
};
pub use core::TrackerHandle;
