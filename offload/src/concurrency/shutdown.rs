//! Cooperative shutdown signal shared by the producer and every worker of a pipeline.
//!
//! The signal is a `watch` channel holding a boolean that only ever goes from `false` to
//! `true`. Workers never get interrupted by it; they observe it when the input queue is empty. A
//! dropped [`ShutdownTx`] counts as a shutdown request so orphaned workers do not spin forever.

use tokio::sync::watch;

/// Transmitter side of the shutdown channel, owned by the pipeline.
#[derive(Debug, Clone)]
pub struct ShutdownTx(watch::Sender<bool>);

impl ShutdownTx {
    /// Requests shutdown. Idempotent; the flag is never reset.
    pub fn shutdown(&self) {
        // `send_replace` succeeds even when no worker subscribed yet.
        self.0.send_replace(true);
    }

    /// Returns `true` once [`ShutdownTx::shutdown`] was called.
    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow()
    }

    /// Creates a new receiver for a worker.
    pub fn subscribe(&self) -> ShutdownRx {
        ShutdownRx(self.0.subscribe())
    }
}

/// Receiver side of the shutdown channel, held by each worker.
#[derive(Debug, Clone)]
pub struct ShutdownRx(watch::Receiver<bool>);

impl ShutdownRx {
    /// Returns `true` if shutdown was requested or the transmitter is gone.
    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow() || self.0.has_changed().is_err()
    }

    /// Resolves once shutdown is requested, immediately if it already was.
    ///
    /// Cancel safe, so it can be used as a `tokio::select!` branch.
    pub async fn requested(&mut self) {
        // An error means the transmitter was dropped, which is treated as shutdown.
        let _ = self.0.wait_for(|shutdown| *shutdown).await;
    }
}

/// Creates a new shutdown channel in the "running" state.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTx(tx), ShutdownRx(rx))
}
