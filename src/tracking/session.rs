// TrackingSession - observable step/distance state for the tracking screen
//
// The session is a plain state holder. Every mutation reports whether the
// observable fields changed so the owner can publish on change only.

/// Fixed stride length used to estimate walking distance (meters per step)
pub const STRIDE_LENGTH_METERS: f64 = 0.76;

/// Immutable copy of the three observable session fields
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SessionSnapshot {
    /// Whether step updates are currently accepted
    pub is_tracking: bool,
    /// Steps taken since the session started
    pub step_count: u64,
    /// Estimated distance in meters (`step_count * STRIDE_LENGTH_METERS`)
    pub distance_meters: f64,
}

impl SessionSnapshot {
    /// Distance formatted with two decimals, as shown on the counter card
    pub fn distance_label(&self) -> String {
        format!("{:.2}", self.distance_meters)
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            is_tracking: false,
            step_count: 0,
            distance_meters: 0.0,
        }
    }
}

/// Compute distance for a step count using the fixed stride length
pub fn distance_for_steps(steps: u64) -> f64 {
    steps as f64 * STRIDE_LENGTH_METERS
}

/// Tracking state holder
///
/// Invariants:
/// - `distance_meters == step_count * STRIDE_LENGTH_METERS` after any mutation
/// - `step_count` and `distance_meters` only change while tracking, except
///   for `start()` and `reset()` which zero them
#[derive(Debug, Clone, Default)]
pub struct TrackingSession {
    is_tracking: bool,
    step_count: u64,
    distance_meters: f64,
}

impl TrackingSession {
    /// Create an idle session with zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_tracking(&self) -> bool {
        self.is_tracking
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn distance_meters(&self) -> f64 {
        self.distance_meters
    }

    pub fn stride_length_meters(&self) -> f64 {
        STRIDE_LENGTH_METERS
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            is_tracking: self.is_tracking,
            step_count: self.step_count,
            distance_meters: self.distance_meters,
        }
    }

    /// Reset counters to zero and begin accepting updates
    ///
    /// Returns `true` if the observable state changed.
    pub fn start(&mut self) -> bool {
        let before = self.snapshot();
        self.set_steps(0);
        self.is_tracking = true;
        before != self.snapshot()
    }

    /// Stop accepting updates, freezing the displayed values
    ///
    /// Idempotent. Returns `true` if the session was tracking.
    pub fn stop(&mut self) -> bool {
        let was_tracking = self.is_tracking;
        self.is_tracking = false;
        was_tracking
    }

    /// Apply a session-relative step count
    ///
    /// Updates received while not tracking are dropped: late sensor events
    /// after `stop()` must not corrupt the displayed values.
    pub fn update_steps(&mut self, steps: u64) -> bool {
        if !self.is_tracking {
            return false;
        }
        let changed = self.step_count != steps;
        self.set_steps(steps);
        changed
    }

    /// Zero the counters regardless of tracking state
    pub fn reset(&mut self) -> bool {
        let changed = self.step_count != 0;
        self.set_steps(0);
        changed
    }

    fn set_steps(&mut self, steps: u64) {
        self.step_count = steps;
        self.distance_meters = distance_for_steps(steps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle_and_zeroed() {
        let session = TrackingSession::new();
        assert!(!session.is_tracking());
        assert_eq!(session.step_count(), 0);
        assert_eq!(session.distance_meters(), 0.0);
        assert_eq!(session.stride_length_meters(), 0.76);
    }

    #[test]
    fn test_start_resets_counters() {
        let mut session = TrackingSession::new();
        session.start();
        session.update_steps(42);
        session.stop();

        assert!(session.start());
        assert!(session.is_tracking());
        assert_eq!(session.step_count(), 0);
        assert_eq!(session.distance_meters(), 0.0);
    }

    #[test]
    fn test_start_while_tracking_still_resets() {
        let mut session = TrackingSession::new();
        session.start();
        session.update_steps(17);

        session.start();
        assert!(session.is_tracking());
        assert_eq!(session.step_count(), 0);
    }

    #[test]
    fn test_update_steps_recomputes_distance() {
        let mut session = TrackingSession::new();
        session.start();

        for steps in [0_u64, 1, 3, 7, 250, 10_000] {
            session.update_steps(steps);
            assert_eq!(session.step_count(), steps);
            assert_eq!(session.distance_meters(), steps as f64 * STRIDE_LENGTH_METERS);
        }
    }

    #[test]
    fn test_update_ignored_while_idle() {
        let mut session = TrackingSession::new();
        assert!(!session.update_steps(12));
        assert_eq!(session.step_count(), 0);
        assert_eq!(session.distance_meters(), 0.0);
    }

    #[test]
    fn test_stop_freezes_values() {
        let mut session = TrackingSession::new();
        session.start();
        session.update_steps(5);
        assert!(session.stop());

        assert!(!session.update_steps(999));
        assert_eq!(session.step_count(), 5);
        assert_eq!(session.distance_meters(), 5.0 * STRIDE_LENGTH_METERS);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut session = TrackingSession::new();
        assert!(!session.stop());
        session.start();
        assert!(session.stop());
        assert!(!session.stop());
        assert!(!session.is_tracking());
    }

    #[test]
    fn test_reset_ignores_tracking_state() {
        let mut session = TrackingSession::new();
        session.start();
        session.update_steps(8);
        session.stop();

        assert!(session.reset());
        assert!(!session.is_tracking());
        assert_eq!(session.step_count(), 0);
        assert_eq!(session.distance_meters(), 0.0);
    }

    #[test]
    fn test_update_reports_change_only_on_new_value() {
        let mut session = TrackingSession::new();
        session.start();
        assert!(session.update_steps(3));
        assert!(!session.update_steps(3));
    }

    #[test]
    fn test_distance_label_uses_two_decimals() {
        let mut session = TrackingSession::new();
        session.start();
        session.update_steps(7);
        assert_eq!(session.snapshot().distance_label(), "5.32");
        assert_eq!(SessionSnapshot::default().distance_label(), "0.00");
    }
}
