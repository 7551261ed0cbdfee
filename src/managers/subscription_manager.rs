// SensorSubscriptionManager: scoped sensor subscription ownership
// Single Responsibility: acquire on tracking start, release on stop/teardown

use std::sync::Mutex;

use crate::engine::backend::{
    ObservationSink, SensorDelay, SensorSubscription, StepSensorBackend, SubscriptionId,
};
use crate::error::SensorError;

/// Holds at most one active sensor subscription
///
/// The guard is released on `release()` and, through `Drop`, whenever the
/// manager itself is torn down.
pub struct SensorSubscriptionManager {
    active: Mutex<Option<SensorSubscription>>,
}

impl SensorSubscriptionManager {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
        }
    }

    /// Acquire a subscription from `backend`, replacing any previous one
    pub fn acquire(
        &self,
        backend: &dyn StepSensorBackend,
        delay: SensorDelay,
        sink: ObservationSink,
    ) -> Result<SubscriptionId, SensorError> {
        let previous = self.take();
        if let Some(previous) = previous {
            previous.release();
        }

        let subscription = backend.subscribe(delay, sink)?;
        let id = subscription.id();
        *self.active.lock().unwrap_or_else(|err| err.into_inner()) = Some(subscription);
        Ok(id)
    }

    /// Release the active subscription, returning its id if one was held
    pub fn release(&self) -> Option<SubscriptionId> {
        let subscription = self.take()?;
        let id = subscription.id();
        subscription.release();
        Some(id)
    }

    pub fn active_id(&self) -> Option<SubscriptionId> {
        self.active
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .as_ref()
            .map(SensorSubscription::id)
    }

    pub fn is_active(&self) -> bool {
        self.active_id().is_some()
    }

    // The guard is moved out before release so listener teardown never runs
    // under this lock.
    fn take(&self) -> Option<SensorSubscription> {
        self.active
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .take()
    }
}

impl Default for SensorSubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}
