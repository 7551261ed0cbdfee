//! Backend abstractions for the step sensor subscription boundary.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::SensorError;
use crate::tracking::SensorObservation;

/// Callback receiving observations while a subscription is active.
pub type ObservationSink = Arc<dyn Fn(SensorObservation) + Send + Sync>;

/// Sampling rate hint, mirroring the platform sensor delay constants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorDelay {
    Fastest,
    Game,
    #[default]
    Ui,
    Normal,
}

impl SensorDelay {
    /// Sampling period in microseconds
    pub fn sampling_period_us(&self) -> u32 {
        match self {
            SensorDelay::Fastest => 0,
            SensorDelay::Game => 20_000,
            SensorDelay::Ui => 60_000,
            SensorDelay::Normal => 200_000,
        }
    }
}

/// Whether the device exposes a step counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorAvailability {
    Available,
    Unavailable,
}

/// Unique id of one acquired subscription.
pub type SubscriptionId = u64;

/// Scoped sensor subscription.
///
/// Releases the underlying listener exactly once, either through
/// [`SensorSubscription::release`] or when dropped.
pub struct SensorSubscription {
    id: SubscriptionId,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl SensorSubscription {
    pub fn new<F>(id: SubscriptionId, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id,
            release: Some(Box::new(release)),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Release the listener now.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for SensorSubscription {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl fmt::Debug for SensorSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorSubscription")
            .field("id", &self.id)
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Trait implemented by step counter sources.
///
/// Observations must only reach `sink` between `subscribe` returning and the
/// returned guard being released.
pub trait StepSensorBackend: Send + Sync {
    fn availability(&self) -> SensorAvailability;
    fn subscribe(
        &self,
        delay: SensorDelay,
        sink: ObservationSink,
    ) -> Result<SensorSubscription, SensorError>;
}

/// Trait representing a monotonic time source used for telemetry timestamps.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Default time source backed by `Instant::now`.
#[derive(Default)]
pub struct SystemTimeSource {
    _unit: (),
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

mod host_feed;
mod replay;
mod stub_time;

pub use host_feed::{HostFeedBackend, PermissionStatus};
pub use replay::ReplayBackend;
pub use stub_time::StubTimeSource;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscription_releases_once_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        {
            let sub = SensorSubscription::new(7, move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            assert_eq!(sub.id(), 7);
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_release_does_not_double_release() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let sub = SensorSubscription::new(1, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sub.release();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sensor_delay_periods() {
        assert_eq!(SensorDelay::default(), SensorDelay::Ui);
        assert_eq!(SensorDelay::Ui.sampling_period_us(), 60_000);
        assert_eq!(SensorDelay::Fastest.sampling_period_us(), 0);
        assert!(SensorDelay::Game.sampling_period_us() < SensorDelay::Normal.sampling_period_us());
    }
}
