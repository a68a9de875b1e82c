//! Asynchronous snapshot delivery.
//!
//! The scheduler publishes a [`Snapshot`] after every applied action. A
//! [`SnapshotPublisher`] hands each one to a background tokio task over an
//! unbounded channel, so a slow listener never holds up the battle. The
//! task calls the listener once per snapshot, in publication order.
//!
//! Two ways to stop the consumer:
//!
//! - [`SnapshotPublisher::finish`] closes the channel and waits until
//!   every snapshot published so far has been delivered.
//! - [`SnapshotPublisher::shutdown`] tells the consumer to exit at its next
//!   opportunity. Snapshots still in the channel are dropped.

use botarena_types::Snapshot;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Receives snapshots on the consumer task.
pub trait SnapshotListener: Send + 'static {
    /// Called once per published snapshot, in publication order.
    fn on_snapshot(&mut self, snapshot: Snapshot);
}

impl<F> SnapshotListener for F
where
    F: FnMut(Snapshot) + Send + 'static,
{
    fn on_snapshot(&mut self, snapshot: Snapshot) {
        self(snapshot);
    }
}

/// Where the scheduler sends snapshots.
///
/// Implemented by [`SnapshotPublisher`] for real runs, and by
/// `Vec<Snapshot>` and [`DiscardSnapshots`] for tests and headless runs.
pub trait SnapshotSink {
    /// Accept one snapshot. Must not block.
    fn publish(&mut self, snapshot: Snapshot);
}

impl SnapshotSink for Vec<Snapshot> {
    fn publish(&mut self, snapshot: Snapshot) {
        self.push(snapshot);
    }
}

/// A sink that drops every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSnapshots;

impl SnapshotSink for DiscardSnapshots {
    fn publish(&mut self, _snapshot: Snapshot) {}
}

/// Producer half of the snapshot pipeline.
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: mpsc::UnboundedSender<Snapshot>,
    cancel: oneshot::Sender<()>,
    task: JoinHandle<u64>,
}

impl SnapshotPublisher {
    /// Spawn the consumer task driving `listener`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<L: SnapshotListener>(mut listener: L) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Snapshot>();
        let (cancel, mut cancelled) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut delivered: u64 = 0;
            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancelled => {
                        debug!(delivered, "Snapshot consumer cancelled");
                        break;
                    }
                    next = rx.recv() => {
                        let Some(snapshot) = next else {
                            debug!(delivered, "Snapshot channel closed");
                            break;
                        };
                        listener.on_snapshot(snapshot);
                        delivered = delivered.saturating_add(1);
                    }
                }
            }
            delivered
        });

        debug!("Snapshot consumer spawned on background task");

        Self { tx, cancel, task }
    }

    /// Queue a snapshot for delivery. Never blocks. If the consumer has
    /// already exited the snapshot is dropped.
    pub fn publish(&self, snapshot: Snapshot) {
        if self.tx.send(snapshot).is_err() {
            debug!("Snapshot consumer gone, snapshot dropped");
        }
    }

    /// Whether the consumer has stopped receiving.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Close the channel and wait for every queued snapshot to be
    /// delivered. Returns the number of snapshots delivered.
    pub async fn finish(self) -> u64 {
        let Self { tx, cancel, task } = self;
        drop(tx);
        let delivered = join_consumer(task).await;
        drop(cancel);
        delivered
    }

    /// Tell the consumer to exit without draining the channel. Returns the
    /// number of snapshots delivered before it stopped.
    pub async fn shutdown(self) -> u64 {
        let Self { tx, cancel, task } = self;
        // The consumer may already be gone; nothing to cancel then.
        let _ = cancel.send(());
        drop(tx);
        join_consumer(task).await
    }
}

impl SnapshotSink for SnapshotPublisher {
    fn publish(&mut self, snapshot: Snapshot) {
        Self::publish(self, snapshot);
    }
}

async fn join_consumer(task: JoinHandle<u64>) -> u64 {
    match task.await {
        Ok(delivered) => delivered,
        Err(e) => {
            warn!(error = %e, "Snapshot consumer ended abnormally");
            0
        }
    }
}
