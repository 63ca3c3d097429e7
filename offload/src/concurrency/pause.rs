use tokio::sync::watch;

/// Transmitter side of the pause/resume coordination channel.
///
/// [`PauseTx`] stops workers from picking new work items without touching the queues.
/// Items already being processed when the pipeline is paused complete normally.
#[derive(Debug, Clone)]
pub struct PauseTx(watch::Sender<bool>);

impl PauseTx {
    /// Requests workers to pause.
    pub fn pause(&self) {
        // Infallible send so pausing works before any worker subscribed.
        self.0.send_replace(true);
    }

    /// Requests workers to resume.
    pub fn resume(&self) {
        self.0.send_replace(false);
    }

    /// Returns `true` while paused.
    pub fn is_paused(&self) -> bool {
        *self.0.borrow()
    }

    /// Creates a new pause receiver subscription.
    pub fn subscribe(&self) -> PauseRx {
        PauseRx(self.0.subscribe())
    }
}

/// Receiver side of the pause/resume coordination channel.
#[derive(Debug, Clone)]
pub struct PauseRx(watch::Receiver<bool>);

impl PauseRx {
    /// Returns `true` while paused.
    pub fn is_paused(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once the channel is paused. Cancel safe.
    ///
    /// Never resolves after the transmitter is dropped.
    pub async fn paused(&mut self) {
        if self.0.wait_for(|paused| *paused).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Resolves once the channel is not paused. Cancel safe.
    ///
    /// A dropped transmitter counts as resumed.
    pub async fn resumed(&mut self) {
        let _ = self.0.wait_for(|paused| !*paused).await;
    }
}

/// Creates a new pause coordination channel in the "running" state.
pub fn create_pause_channel() -> (PauseTx, PauseRx) {
    let (tx, rx) = watch::channel(false);
    (PauseTx(tx), PauseRx(rx))
}
