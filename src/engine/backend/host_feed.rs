use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::SensorError;
use crate::tracking::SensorObservation;

use super::{
    ObservationSink, SensorAvailability, SensorDelay, SensorSubscription, StepSensorBackend,
    SubscriptionId,
};

/// Activity-recognition permission as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    NotDetermined,
    Granted,
    Denied,
}

impl PermissionStatus {
    fn to_u8(self) -> u8 {
        match self {
            PermissionStatus::NotDetermined => 0,
            PermissionStatus::Granted => 1,
            PermissionStatus::Denied => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => PermissionStatus::Granted,
            2 => PermissionStatus::Denied,
            _ => PermissionStatus::NotDetermined,
        }
    }
}

type ListenerMap = HashMap<SubscriptionId, ObservationSink>;

/// Backend fed by the host platform over FFI.
///
/// The host registers the real platform listener and forwards every sensor
/// event through [`HostFeedBackend::push`]. Events pushed while permission is
/// not granted are dropped, so a denied permission looks exactly like a
/// stream that never produces events.
pub struct HostFeedBackend {
    listeners: Arc<Mutex<ListenerMap>>,
    next_id: AtomicU64,
    permission: AtomicU8,
    available: AtomicU8,
}

impl HostFeedBackend {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            permission: AtomicU8::new(PermissionStatus::NotDetermined.to_u8()),
            available: AtomicU8::new(1),
        }
    }

    /// Backend with permission already granted (desktop tooling and tests).
    pub fn granted() -> Self {
        let backend = Self::new();
        backend.set_permission(PermissionStatus::Granted);
        backend
    }

    pub fn set_permission(&self, status: PermissionStatus) {
        self.permission.store(status.to_u8(), Ordering::SeqCst);
        log::info!("[HostFeed] Permission status: {:?}", status);
    }

    pub fn permission(&self) -> PermissionStatus {
        PermissionStatus::from_u8(self.permission.load(Ordering::SeqCst))
    }

    pub fn set_sensor_available(&self, available: bool) {
        self.available.store(u8::from(available), Ordering::SeqCst);
        log::info!("[HostFeed] Step counter available: {}", available);
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .map(|listeners| listeners.len())
            .unwrap_or_else(|err| err.into_inner().len())
    }

    /// Forward one host sensor event to every active listener.
    ///
    /// Returns the number of listeners that received it.
    pub fn push(&self, observation: SensorObservation) -> usize {
        if self.permission() != PermissionStatus::Granted {
            log::debug!("[HostFeed] Dropping observation without permission");
            return 0;
        }

        // Sinks run outside the registry lock so a sink may release its own
        // subscription.
        let sinks: Vec<ObservationSink> = match self.listeners.lock() {
            Ok(listeners) => listeners.values().cloned().collect(),
            Err(err) => err.into_inner().values().cloned().collect(),
        };

        for sink in &sinks {
            sink(observation);
        }
        sinks.len()
    }
}

impl Default for HostFeedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StepSensorBackend for HostFeedBackend {
    fn availability(&self) -> SensorAvailability {
        if self.available.load(Ordering::SeqCst) == 1 {
            SensorAvailability::Available
        } else {
            SensorAvailability::Unavailable
        }
    }

    fn subscribe(
        &self,
        delay: SensorDelay,
        sink: ObservationSink,
    ) -> Result<SensorSubscription, SensorError> {
        if self.availability() == SensorAvailability::Unavailable {
            return Err(SensorError::SensorUnavailable);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners
            .lock()
            .map_err(|_| SensorError::LockPoisoned {
                component: "host_feed_listeners".to_string(),
            })?
            .insert(id, sink);

        log::debug!(
            "[HostFeed] Listener {} registered (period {}us)",
            id,
            delay.sampling_period_us()
        );

        let listeners = Arc::clone(&self.listeners);
        Ok(SensorSubscription::new(id, move || {
            let removed = match listeners.lock() {
                Ok(mut guard) => guard.remove(&id),
                Err(err) => err.into_inner().remove(&id),
            };
            if removed.is_some() {
                log::debug!("[HostFeed] Listener {} released", id);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collecting_sink() -> (ObservationSink, Arc<Mutex<Vec<u64>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let target = Arc::clone(&seen);
        let sink: ObservationSink = Arc::new(move |obs: SensorObservation| {
            target.lock().unwrap().push(obs.cumulative_steps);
        });
        (sink, seen)
    }

    #[test]
    fn test_push_reaches_active_listener() {
        let backend = HostFeedBackend::granted();
        let (sink, seen) = collecting_sink();
        let _sub = backend.subscribe(SensorDelay::Ui, sink).unwrap();

        assert_eq!(backend.push(SensorObservation::step_counter(0, 10)), 1);
        assert_eq!(backend.push(SensorObservation::step_counter(1, 12)), 1);
        assert_eq!(*seen.lock().unwrap(), vec![10, 12]);
    }

    #[test]
    fn test_released_subscription_receives_nothing() {
        let backend = HostFeedBackend::granted();
        let (sink, seen) = collecting_sink();
        let sub = backend.subscribe(SensorDelay::Ui, sink).unwrap();
        assert_eq!(backend.listener_count(), 1);

        sub.release();
        assert_eq!(backend.listener_count(), 0);
        assert_eq!(backend.push(SensorObservation::step_counter(0, 99)), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dropped_guard_unregisters_listener() {
        let backend = HostFeedBackend::granted();
        let (sink, _seen) = collecting_sink();
        {
            let _sub = backend.subscribe(SensorDelay::Normal, sink).unwrap();
            assert_eq!(backend.listener_count(), 1);
        }
        assert_eq!(backend.listener_count(), 0);
    }

    #[test]
    fn test_no_permission_drops_events() {
        let backend = HostFeedBackend::new();
        assert_eq!(backend.permission(), PermissionStatus::NotDetermined);
        let (sink, seen) = collecting_sink();
        let _sub = backend.subscribe(SensorDelay::Ui, sink).unwrap();

        assert_eq!(backend.push(SensorObservation::step_counter(0, 5)), 0);
        backend.set_permission(PermissionStatus::Denied);
        assert_eq!(backend.push(SensorObservation::step_counter(0, 6)), 0);
        assert!(seen.lock().unwrap().is_empty());

        backend.set_permission(PermissionStatus::Granted);
        assert_eq!(backend.push(SensorObservation::step_counter(0, 7)), 1);
        assert_eq!(*seen.lock().unwrap(), vec![7]);
    }

    #[test]
    fn test_unavailable_sensor_rejects_subscription() {
        let backend = HostFeedBackend::granted();
        backend.set_sensor_available(false);
        let (sink, _seen) = collecting_sink();
        let err = backend.subscribe(SensorDelay::Ui, sink).unwrap_err();
        assert_eq!(err, SensorError::SensorUnavailable);
        assert_eq!(backend.listener_count(), 0);
    }

    #[test]
    fn test_subscription_ids_are_unique() {
        let backend = HostFeedBackend::granted();
        let (sink_a, _) = collecting_sink();
        let (sink_b, _) = collecting_sink();
        let a = backend.subscribe(SensorDelay::Ui, sink_a).unwrap();
        let b = backend.subscribe(SensorDelay::Ui, sink_b).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(backend.listener_count(), 2);
    }
}
