use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::SensorError;
use crate::tracking::SensorObservation;

use super::{
    ObservationSink, SensorAvailability, SensorDelay, SensorSubscription, StepSensorBackend,
};

/// Desktop backend replaying recorded observations on a worker thread.
///
/// Each subscription replays the full recording from the start, pacing
/// deliveries by `interval`. Releasing the subscription stops the worker and
/// joins it, so nothing is delivered after release returns.
pub struct ReplayBackend {
    observations: Arc<Vec<SensorObservation>>,
    interval: Duration,
    next_id: AtomicU64,
    finished: Arc<AtomicBool>,
}

impl ReplayBackend {
    pub fn new(observations: Vec<SensorObservation>, interval: Duration) -> Self {
        Self {
            observations: Arc::new(observations),
            interval,
            next_id: AtomicU64::new(1),
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Whether the most recent replay worker has exited.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Block until the replay worker exits or `timeout` elapses.
    pub fn wait_until_finished(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_finished() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(2));
        }
        true
    }
}

impl StepSensorBackend for ReplayBackend {
    fn availability(&self) -> SensorAvailability {
        SensorAvailability::Available
    }

    fn subscribe(
        &self,
        _delay: SensorDelay,
        sink: ObservationSink,
    ) -> Result<SensorSubscription, SensorError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let observations = Arc::clone(&self.observations);
        let interval = self.interval;
        let finished = Arc::clone(&self.finished);
        finished.store(false, Ordering::SeqCst);

        let worker = thread::Builder::new()
            .name(format!("steppo-replay-{id}"))
            .spawn(move || {
                for (index, observation) in observations.iter().enumerate() {
                    let wait = if index == 0 { Duration::ZERO } else { interval };
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => sink(*observation),
                        _ => break,
                    }
                }
                finished.store(true, Ordering::SeqCst);
            })?;

        tracing::debug!(subscription_id = id, "replay worker started");

        Ok(SensorSubscription::new(id, move || {
            drop(stop_tx);
            if worker.thread().id() != thread::current().id() && worker.join().is_err() {
                tracing::warn!(subscription_id = id, "replay worker panicked");
            }
            tracing::debug!(subscription_id = id, "replay worker released");
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn readings(raws: &[u64]) -> Vec<SensorObservation> {
        raws.iter()
            .enumerate()
            .map(|(i, &raw)| SensorObservation::step_counter(i as u64, raw))
            .collect()
    }

    #[test]
    fn test_replays_all_observations_in_order() {
        let backend = ReplayBackend::new(readings(&[5, 6, 9]), Duration::ZERO);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let target = Arc::clone(&seen);
        let sink: ObservationSink = Arc::new(move |obs: SensorObservation| {
            target.lock().unwrap().push(obs.cumulative_steps);
        });

        let sub = backend.subscribe(SensorDelay::Ui, sink).unwrap();
        assert!(backend.wait_until_finished(Duration::from_secs(2)));
        sub.release();

        assert_eq!(*seen.lock().unwrap(), vec![5, 6, 9]);
    }

    #[test]
    fn test_release_stops_paced_replay() {
        let backend = ReplayBackend::new(readings(&[1, 2, 3, 4, 5]), Duration::from_secs(5));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let target = Arc::clone(&seen);
        let sink: ObservationSink = Arc::new(move |obs: SensorObservation| {
            target.lock().unwrap().push(obs.cumulative_steps);
        });

        let sub = backend.subscribe(SensorDelay::Ui, sink).unwrap();
        let started = Instant::now();
        while seen.lock().unwrap().is_empty() && started.elapsed() < Duration::from_secs(2) {
            thread::sleep(Duration::from_millis(1));
        }
        sub.release();

        assert!(backend.is_finished());
        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_release_survives_panicking_sink() {
        let backend = ReplayBackend::new(readings(&[1, 2]), Duration::ZERO);
        let sink: ObservationSink = Arc::new(|_obs: SensorObservation| {
            panic!("sink failure");
        });

        let sub = backend.subscribe(SensorDelay::Ui, sink).unwrap();
        // The worker panic is logged on join, not propagated
        sub.release();
    }

    #[test]
    fn test_empty_replay_finishes_immediately() {
        let backend = ReplayBackend::new(Vec::new(), Duration::ZERO);
        assert!(backend.is_empty());
        let sink: ObservationSink = Arc::new(|_obs: SensorObservation| {});
        let _sub = backend.subscribe(SensorDelay::Ui, sink).unwrap();
        assert!(backend.wait_until_finished(Duration::from_secs(1)));
    }
}
