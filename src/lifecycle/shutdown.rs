//! Shutdown coordination.
//!
//! A trigger stops the listener from accepting new requests. Requests in
//! flight finish, and with them any blocking run. Detached runs are not
//! cancelled: the server waits for the run tracker to reach zero for at
//! most `shutdown.drain_secs`, then returns and abandons whatever is left.
//! A run cut off that way may leave its table, collection or queue behind.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// The signal task triggers it; the HTTP server and anything else long
/// running subscribe.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Wake every subscriber. Triggering twice is harmless.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Subscribers that have not dropped their receiver yet.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
