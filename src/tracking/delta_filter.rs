// SensorDeltaFilter - cumulative counter to session-relative steps
//
// The host step counter increases monotonically since boot. The filter
// captures the first reading after arming as the baseline and reports every
// later reading relative to it.

/// Filter state: either waiting for a baseline or armed with one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    /// No baseline captured yet
    Unarmed,
    /// Baseline captured from the first reading of the session
    Armed { baseline: u64 },
}

/// Converts cumulative counter readings into session-relative deltas
#[derive(Debug, Clone)]
pub struct SensorDeltaFilter {
    state: FilterState,
}

impl SensorDeltaFilter {
    pub fn new() -> Self {
        Self {
            state: FilterState::Unarmed,
        }
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    pub fn baseline(&self) -> Option<u64> {
        match self.state {
            FilterState::Unarmed => None,
            FilterState::Armed { baseline } => Some(baseline),
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, FilterState::Armed { .. })
    }

    /// Feed one raw cumulative reading and return the session delta
    ///
    /// The first reading while unarmed becomes the baseline and yields 0.
    /// A counter that went backwards yields a negative delta; no clamping.
    pub fn observe(&mut self, raw: u64) -> i64 {
        match self.state {
            FilterState::Unarmed => {
                self.state = FilterState::Armed { baseline: raw };
                0
            }
            FilterState::Armed { baseline } => raw as i64 - baseline as i64,
        }
    }

    /// Clear the baseline so the next reading recaptures it
    pub fn disarm(&mut self) {
        self.state = FilterState::Unarmed;
    }
}

impl Default for SensorDeltaFilter {
    fn default() -> Self {
        Self::new()
    }
}
