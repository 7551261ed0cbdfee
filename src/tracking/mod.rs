// Tracking module - step counting state machine
//
// This module provides the pure, platform-independent core:
// 1. TrackingSession: observable step count / distance state
// 2. SensorDeltaFilter: cumulative counter -> session-relative steps
// 3. StepTracker: gates observations and feeds the filter into the session
//
// Data flow:
//   raw observation -> StepTracker::observe -> SensorDeltaFilter -> TrackingSession

pub mod delta_filter;
pub mod observation;
pub mod session;
pub mod tracker;


pub use delta_filter::{FilterState, SensorDeltaFilter};
pub use observation::{SensorKind, SensorObservation};
pub use session::{distance_for_steps, SessionSnapshot, TrackingSession, STRIDE_LENGTH_METERS};
pub use tracker::{ObservationOutcome, StepTracker};
