//! Change notifications for the presentation layer.

use tokio::sync::mpsc;

use super::state::ConnectionSnapshot;

/// Receives a snapshot whenever state, message or holdings status changes.
///
/// Called synchronously and in transition order. Implementations must return
/// quickly and must not call back into the controller.
pub trait ConnectionObserver: Send + Sync {
    fn on_change(&self, snapshot: &ConnectionSnapshot);
}

#[derive(Debug, Clone, Default)]
pub struct NoOpObserver;

impl ConnectionObserver for NoOpObserver {
    fn on_change(&self, _snapshot: &ConnectionSnapshot) {
        // No-op
    }
}

/// Forwards snapshots over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ConnectionSnapshot>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ConnectionSnapshot>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ConnectionObserver for ChannelObserver {
    fn on_change(&self, snapshot: &ConnectionSnapshot) {
        // Receiver gone means nobody is rendering any more
        let _ = self.tx.send(snapshot.clone());
    }
}
