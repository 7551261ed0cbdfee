// StepTracker - session + delta filter composition
//
// Gates raw observations on sensor kind and tracking state before they reach
// the filter, so the baseline is only ever captured inside a session.

use super::delta_filter::SensorDeltaFilter;
use super::observation::SensorObservation;
use super::session::{SessionSnapshot, TrackingSession};

/// What happened to a single observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObservationOutcome {
    /// Observation came from a sensor other than the step counter
    IgnoredForeignSensor,
    /// Session is not tracking; filter left untouched
    IgnoredNotTracking,
    /// First reading of the session became the baseline
    BaselineCaptured { baseline: u64 },
    /// Session step count updated from the delta
    Updated { steps: u64, changed: bool },
    /// Counter went below the baseline; session left unchanged
    CounterDecreased { raw: u64, baseline: u64 },
}

impl ObservationOutcome {
    /// Whether the observable session state changed
    ///
    /// Capturing the baseline emits delta 0 into a freshly started session,
    /// which never changes it.
    pub fn changed_session(&self) -> bool {
        match self {
            ObservationOutcome::Updated { changed, .. } => *changed,
            _ => false,
        }
    }
}

/// One tracking session fed by one delta filter
#[derive(Debug, Clone, Default)]
pub struct StepTracker {
    session: TrackingSession,
    filter: SensorDeltaFilter,
}

impl StepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &TrackingSession {
        &self.session
    }

    pub fn filter(&self) -> &SensorDeltaFilter {
        &self.filter
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn is_tracking(&self) -> bool {
        self.session.is_tracking()
    }

    /// Begin a session with zeroed counters and a fresh baseline
    pub fn start(&mut self) -> bool {
        self.filter.disarm();
        self.session.start()
    }

    /// End the session; the baseline is cleared for the next start
    pub fn stop(&mut self) -> bool {
        self.filter.disarm();
        self.session.stop()
    }

    /// Zero the counters; the baseline is kept
    pub fn reset(&mut self) -> bool {
        self.session.reset()
    }

    /// Route one raw observation through the filter into the session
    pub fn observe(&mut self, observation: &SensorObservation) -> ObservationOutcome {
        if !observation.is_step_counter() {
            return ObservationOutcome::IgnoredForeignSensor;
        }
        if !self.session.is_tracking() {
            return ObservationOutcome::IgnoredNotTracking;
        }

        let raw = observation.cumulative_steps;
        let was_armed = self.filter.is_armed();
        let delta = self.filter.observe(raw);

        if !was_armed {
            self.session.update_steps(0);
            return ObservationOutcome::BaselineCaptured { baseline: raw };
        }

        if delta < 0 {
            return ObservationOutcome::CounterDecreased {
                raw,
                baseline: self.filter.baseline().unwrap_or(raw),
            };
        }

        let steps = delta as u64;
        let changed = self.session.update_steps(steps);
        ObservationOutcome::Updated { steps, changed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::observation::SensorKind;

    fn reading(raw: u64) -> SensorObservation {
        SensorObservation::step_counter(0, raw)
    }

    #[test]
    fn test_idle_tracker_ignores_readings() {
        let mut tracker = StepTracker::new();
        assert_eq!(
            tracker.observe(&reading(1000)),
            ObservationOutcome::IgnoredNotTracking
        );
        assert!(!tracker.filter().is_armed());
        assert_eq!(tracker.snapshot(), SessionSnapshot::default());
    }

    #[test]
    fn test_foreign_sensor_is_ignored() {
        let mut tracker = StepTracker::new();
        tracker.start();
        let accel = SensorObservation {
            sensor: SensorKind::Other(1),
            timestamp_ns: 0,
            cumulative_steps: 77,
        };
        assert_eq!(
            tracker.observe(&accel),
            ObservationOutcome::IgnoredForeignSensor
        );
        assert!(!tracker.filter().is_armed());
    }

    #[test]
    fn test_first_reading_captures_baseline() {
        let mut tracker = StepTracker::new();
        tracker.start();
        let outcome = tracker.observe(&reading(1000));
        assert_eq!(outcome, ObservationOutcome::BaselineCaptured { baseline: 1000 });
        assert!(!outcome.changed_session());
        assert_eq!(tracker.snapshot().step_count, 0);
    }

    #[test]
    fn test_counter_decrease_leaves_session_unchanged() {
        let mut tracker = StepTracker::new();
        tracker.start();
        tracker.observe(&reading(1000));
        tracker.observe(&reading(1004));

        let outcome = tracker.observe(&reading(990));
        assert_eq!(
            outcome,
            ObservationOutcome::CounterDecreased {
                raw: 990,
                baseline: 1000
            }
        );
        assert!(!outcome.changed_session());
        assert_eq!(tracker.snapshot().step_count, 4);
        assert_eq!(tracker.filter().baseline(), Some(1000));
    }

    #[test]
    fn test_stop_disarms_filter() {
        let mut tracker = StepTracker::new();
        tracker.start();
        tracker.observe(&reading(1000));
        tracker.stop();
        assert!(!tracker.filter().is_armed());
        assert_eq!(
            tracker.observe(&reading(1010)),
            ObservationOutcome::IgnoredNotTracking
        );
    }

    #[test]
    fn test_reset_keeps_baseline() {
        let mut tracker = StepTracker::new();
        tracker.start();
        tracker.observe(&reading(1000));
        tracker.observe(&reading(1006));

        assert!(tracker.reset());
        assert_eq!(tracker.snapshot().step_count, 0);
        assert_eq!(tracker.filter().baseline(), Some(1000));

        tracker.observe(&reading(1008));
        assert_eq!(tracker.snapshot().step_count, 8);
    }
}
