use futures::Stream;
use tokio::runtime::Builder;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::config::AppConfig;
use crate::error::{log_tracking_error, TrackingError};
use crate::telemetry::{TelemetryEvent, TelemetrySnapshot};
use crate::tracking::SessionSnapshot;

use super::TrackerHandle;

/// Forward a broadcast receiver into an unbounded queue on a dedicated thread.
///
/// The host may call in without a Tokio runtime, so the forwarder brings its
/// own current-thread runtime. Lagged receivers skip ahead instead of closing.
fn forward_broadcast<T>(mut broadcast_rx: broadcast::Receiver<T>) -> mpsc::UnboundedReceiver<T>
where
    T: Clone + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        let rt = match Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(err) => {
                log_tracking_error(
                    &TrackingError::StreamFailure {
                        reason: err.to_string(),
                    },
                    "forward_broadcast",
                );
                return;
            }
        };
        rt.block_on(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(item) => {
                        if tx.send(item).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "stream subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    });

    rx
}

impl TrackerHandle {
    // ========================================================================
    // STREAM SUBSCRIPTIONS
    // ========================================================================

    /// Raw broadcast receiver for session snapshots.
    pub fn subscribe_snapshots(&self) -> Result<broadcast::Receiver<SessionSnapshot>, TrackingError> {
        self.shared
            .broadcasts
            .subscribe_snapshots()
            .ok_or(TrackingError::NotInitialized)
    }

    pub fn subscribe_snapshots_unbounded(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<SessionSnapshot>, TrackingError> {
        Ok(forward_broadcast(self.subscribe_snapshots()?))
    }

    pub fn subscribe_telemetry(&self) -> broadcast::Receiver<TelemetryEvent> {
        self.shared.telemetry.subscribe()
    }

    pub fn subscribe_telemetry_unbounded(&self) -> mpsc::UnboundedReceiver<TelemetryEvent> {
        forward_broadcast(self.shared.telemetry.subscribe())
    }

    pub fn telemetry_snapshot(&self) -> TelemetrySnapshot {
        self.shared.telemetry.snapshot()
    }

    // ========================================================================
    // ASYNC STREAM ADAPTERS
    // ========================================================================

    pub async fn snapshot_stream(
        &self,
    ) -> Result<impl Stream<Item = SessionSnapshot> + Unpin, TrackingError> {
        Ok(UnboundedReceiverStream::new(
            self.subscribe_snapshots_unbounded()?,
        ))
    }

    pub async fn telemetry_stream(&self) -> impl Stream<Item = TelemetryEvent> + Unpin {
        UnboundedReceiverStream::new(self.subscribe_telemetry_unbounded())
    }

    // ========================================================================
    // INTROSPECTION
    // ========================================================================

    /// Snapshot the current app configuration (tooling helper).
    pub fn config_snapshot(&self) -> AppConfig {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .unwrap_or_else(|err| err.into_inner().clone())
    }
}
