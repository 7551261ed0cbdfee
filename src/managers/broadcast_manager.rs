// BroadcastChannelManager: session snapshot channel management
// Single Responsibility: Broadcast channel lifecycle and subscription

use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::tracking::SessionSnapshot;

/// Manages the tokio broadcast channel carrying session snapshots
///
/// Every observable change of the tracking session is published here so the
/// renderer can redraw on change.
pub struct BroadcastChannelManager {
    snapshots: Arc<Mutex<Option<broadcast::Sender<SessionSnapshot>>>>,
}

impl BroadcastChannelManager {
    /// Create a new BroadcastChannelManager with the channel uninitialized
    pub fn new() -> Self {
        Self {
            snapshots: Arc::new(Mutex::new(None)),
        }
    }

    /// Initialize the snapshot broadcast channel
    ///
    /// # Notes
    /// - Calling again replaces the channel; existing receivers see it close
    /// - Old messages dropped if buffer fills (lagged subscribers)
    pub fn init_snapshots(&self, buffer: usize) -> broadcast::Sender<SessionSnapshot> {
        let (tx, _) = broadcast::channel(buffer.max(1));
        *self
            .snapshots
            .lock()
            .unwrap_or_else(|err| err.into_inner()) = Some(tx.clone());
        tx
    }

    /// Subscribe to session snapshots
    ///
    /// Returns None if init_snapshots() was not called yet
    pub fn subscribe_snapshots(&self) -> Option<broadcast::Receiver<SessionSnapshot>> {
        self.snapshots
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .as_ref()
            .map(|tx| tx.subscribe())
    }

    /// Current sender, if initialized
    pub fn snapshot_sender(&self) -> Option<broadcast::Sender<SessionSnapshot>> {
        self.snapshots
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }

    /// Publish a snapshot to all subscribers
    ///
    /// Returns the number of receivers reached (0 when nobody listens).
    pub fn publish_snapshot(&self, snapshot: SessionSnapshot) -> usize {
        match self.snapshot_sender() {
            Some(tx) => tx.send(snapshot).unwrap_or(0),
            None => 0,
        }
    }
}

impl Default for BroadcastChannelManager {
    fn default() -> Self {
        Self::new()
    }
}
