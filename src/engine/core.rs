//! TrackerHandle: step tracking orchestration layer.
//!
//! Owns the `StepTracker`, the sensor backend, the scoped subscription, the
//! snapshot broadcast channel and telemetry. Shared by the FFI API, the CLI
//! and the fixture runner.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Instant;

use crate::config::AppConfig;
#[cfg(target_os = "android")]
use crate::engine::backend::SystemTimeSource;
#[cfg(not(target_os = "android"))]
use crate::engine::backend::StubTimeSource;
use crate::engine::backend::{ObservationSink, StepSensorBackend, TimeSource};
use crate::error::{log_sensor_error, log_tracking_error, SensorError, TrackingError};
use crate::managers::{BroadcastChannelManager, SensorSubscriptionManager};
use crate::telemetry::{TelemetryCollector, TelemetryEvent, TelemetryEventKind};
use crate::tracking::{ObservationOutcome, SensorObservation, SessionSnapshot, StepTracker};

#[path = "core_subscriptions.rs"]
mod core_subscriptions;


/// State shared between the handle and the observation sink.
///
/// The sink outlives neither the handle nor its subscription, but it runs on
/// backend threads, so everything it touches is reference counted.
struct TrackerShared {
    tracker: Mutex<StepTracker>,
    generation: AtomicU64,
    broadcasts: BroadcastChannelManager,
    telemetry: TelemetryCollector,
    time_source: Arc<dyn TimeSource>,
    start_instant: Instant,
}

impl TrackerShared {
    fn lock_tracker(&self) -> Result<MutexGuard<'_, StepTracker>, TrackingError> {
        self.tracker.lock().map_err(|_| TrackingError::LockPoisoned {
            component: "step_tracker".to_string(),
        })
    }

    fn publish_event(&self, kind: TelemetryEventKind, detail: Option<String>) {
        let timestamp_ms = self
            .time_source
            .now()
            .saturating_duration_since(self.start_instant)
            .as_millis() as u64;
        self.telemetry.publish(TelemetryEvent {
            timestamp_ms,
            kind,
            detail,
        });
    }

    /// Handle one observation delivered by the backend for `generation`.
    fn handle_observation(&self, generation: u64, observation: SensorObservation) {
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::trace!(generation, "dropping observation from released subscription");
            return;
        }

        let outcome = match self.lock_tracker() {
            Ok(mut tracker) => {
                // Re-checked under the lock: stop() bumps the generation
                // before taking it.
                if self.generation.load(Ordering::SeqCst) != generation {
                    return;
                }
                let outcome = tracker.observe(&observation);
                // Published under the lock so snapshots reach subscribers in
                // the order the session changed.
                if outcome.changed_session() {
                    self.broadcasts.publish_snapshot(tracker.snapshot());
                }
                outcome
            }
            Err(err) => {
                log_tracking_error(&err, "handle_observation");
                return;
            }
        };

        match outcome {
            ObservationOutcome::BaselineCaptured { baseline } => {
                tracing::debug!(baseline, "step counter baseline captured");
                self.publish_event(TelemetryEventKind::BaselineCaptured { baseline }, None);
            }
            ObservationOutcome::CounterDecreased { raw, baseline } => {
                tracing::warn!(raw, baseline, "step counter went below baseline, ignoring");
                self.publish_event(
                    TelemetryEventKind::CounterDecreased { raw, baseline },
                    Some("reading ignored".to_string()),
                );
            }
            ObservationOutcome::Updated { steps, .. } => {
                tracing::trace!(steps, "session steps updated");
            }
            ObservationOutcome::IgnoredForeignSensor | ObservationOutcome::IgnoredNotTracking => {}
        }
    }
}

/// TrackerHandle wires the step tracker to a sensor backend and the UI.
pub struct TrackerHandle {
    config: Arc<RwLock<AppConfig>>,
    /// Serializes start and stop across subscription acquire and release.
    lifecycle: Mutex<()>,
    backend: Arc<dyn StepSensorBackend>,
    subscription: SensorSubscriptionManager,
    shared: Arc<TrackerShared>,
}

impl TrackerHandle {
    /// Create a handle over `backend` with platform config and time source.
    pub fn new(backend: Arc<dyn StepSensorBackend>) -> Self {
        Self::with_config(AppConfig::load_platform(), backend)
    }

    /// Create a handle with an explicit configuration.
    pub fn with_config(config: AppConfig, backend: Arc<dyn StepSensorBackend>) -> Self {
        Self::with_time_source(config, backend, Self::create_time_source())
    }

    pub fn with_time_source(
        config: AppConfig,
        backend: Arc<dyn StepSensorBackend>,
        time_source: Arc<dyn TimeSource>,
    ) -> Self {
        let broadcasts = BroadcastChannelManager::new();
        broadcasts.init_snapshots(config.channels.snapshot_buffer);
        let telemetry = TelemetryCollector::new(
            config.channels.telemetry_buffer,
            config.channels.telemetry_history,
        );

        let shared = Arc::new(TrackerShared {
            tracker: Mutex::new(StepTracker::new()),
            generation: AtomicU64::new(0),
            broadcasts,
            telemetry,
            start_instant: time_source.now(),
            time_source,
        });

        Self {
            config: Arc::new(RwLock::new(config)),
            lifecycle: Mutex::new(()),
            backend,
            subscription: SensorSubscriptionManager::new(),
            shared,
        }
    }

    #[cfg(target_os = "android")]
    fn create_time_source() -> Arc<dyn TimeSource> {
        Arc::new(SystemTimeSource::default())
    }

    #[cfg(not(target_os = "android"))]
    fn create_time_source() -> Arc<dyn TimeSource> {
        Arc::new(StubTimeSource::default())
    }

    // ========================================================================
    // TRACKING LIFECYCLE
    // ========================================================================

    /// Start a tracking session and acquire the sensor subscription.
    ///
    /// A no-op while already tracking. Subscription failures do not fail the
    /// start: without a sensor the counters simply stay at zero.
    pub fn start_tracking(&self) -> Result<SessionSnapshot, TrackingError> {
        let _lifecycle = self.lock_lifecycle()?;
        let (generation, snapshot) = {
            let mut tracker = self.shared.lock_tracker()?;
            if tracker.is_tracking() {
                tracing::debug!("start_tracking ignored, session already active");
                return Ok(tracker.snapshot());
            }
            tracker.start();
            let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let snapshot = tracker.snapshot();
            self.shared.broadcasts.publish_snapshot(snapshot);
            (generation, snapshot)
        };

        tracing::info!(generation, "tracking started");
        self.shared
            .publish_event(TelemetryEventKind::TrackingStarted, None);

        self.acquire_subscription(generation);
        Ok(snapshot)
    }

    /// Stop the session and release the sensor subscription. Idempotent.
    pub fn stop_tracking(&self) -> Result<SessionSnapshot, TrackingError> {
        let _lifecycle = self.lock_lifecycle()?;
        let (was_tracking, snapshot) = {
            let mut tracker = self.shared.lock_tracker()?;
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
            let was_tracking = tracker.stop();
            let snapshot = tracker.snapshot();
            if was_tracking {
                self.shared.broadcasts.publish_snapshot(snapshot);
            }
            (was_tracking, snapshot)
        };

        // Released after the tracker lock is dropped so a backend worker
        // blocked on that lock can finish. The lifecycle lock is still held,
        // so a concurrent start cannot subscribe in between.
        self.release_subscription();

        if was_tracking {
            tracing::info!(step_count = snapshot.step_count, "tracking stopped");
            self.shared.publish_event(
                TelemetryEventKind::TrackingStopped {
                    step_count: snapshot.step_count,
                },
                None,
            );
        }
        Ok(snapshot)
    }

    /// Zero the counters regardless of tracking state.
    pub fn reset_counters(&self) -> Result<SessionSnapshot, TrackingError> {
        let snapshot = {
            let mut tracker = self.shared.lock_tracker()?;
            let changed = tracker.reset();
            let snapshot = tracker.snapshot();
            if changed {
                self.shared.broadcasts.publish_snapshot(snapshot);
            }
            snapshot
        };

        self.shared
            .publish_event(TelemetryEventKind::CountersReset, None);
        Ok(snapshot)
    }

    /// Current session state.
    pub fn snapshot(&self) -> Result<SessionSnapshot, TrackingError> {
        Ok(self.shared.lock_tracker()?.snapshot())
    }

    pub fn is_tracking(&self) -> bool {
        self.snapshot()
            .map(|snapshot| snapshot.is_tracking)
            .unwrap_or(false)
    }

    /// Feed an observation directly, bypassing the backend.
    ///
    /// Used by fixture tooling; honors the same tracking gate as the sink.
    pub fn observe(&self, observation: SensorObservation) {
        let generation = self.shared.generation.load(Ordering::SeqCst);
        self.shared.handle_observation(generation, observation);
    }

    /// Id of the active sensor subscription, if any.
    pub fn active_subscription(&self) -> Option<u64> {
        self.subscription.active_id()
    }

    fn lock_lifecycle(&self) -> Result<MutexGuard<'_, ()>, TrackingError> {
        self.lifecycle.lock().map_err(|_| TrackingError::LockPoisoned {
            component: "tracking_lifecycle".to_string(),
        })
    }

    fn acquire_subscription(&self, generation: u64) {
        let delay = self.config_snapshot().sensor.delay;
        let shared = Arc::clone(&self.shared);
        let sink: ObservationSink = Arc::new(move |observation: SensorObservation| {
            shared.handle_observation(generation, observation);
        });

        match self
            .subscription
            .acquire(self.backend.as_ref(), delay, sink)
        {
            Ok(subscription_id) => {
                tracing::info!(subscription_id, "step sensor subscribed");
                self.shared.publish_event(
                    TelemetryEventKind::SensorSubscribed { subscription_id },
                    None,
                );
            }
            Err(err) => {
                log_sensor_error(&err, "start_tracking");
                let detail = match err {
                    SensorError::SensorUnavailable => {
                        "no step counter; counters will stay at zero".to_string()
                    }
                    other => other.to_string(),
                };
                self.shared
                    .publish_event(TelemetryEventKind::Warning, Some(detail));
            }
        }
    }

    fn release_subscription(&self) {
        if let Some(subscription_id) = self.subscription.release() {
            tracing::info!(subscription_id, "step sensor released");
            self.shared.publish_event(
                TelemetryEventKind::SensorReleased { subscription_id },
                None,
            );
        }
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        // Teardown while tracking must still release the sensor.
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.release_subscription();
    }
}
