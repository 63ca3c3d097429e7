use std::future::Future;

use tokio::task::JoinSet;
use tracing::{Instrument, debug, error};

use crate::error::{ErrorKind, OffloadResult};
use crate::offload_error;
use crate::workers::base::WorkerId;

/// Owns the tasks of every worker spawned by a pipeline.
///
/// [`WorkerPool`] only tracks task completion. Workers communicate exclusively through the
/// pipeline queues, so the pool never needs to reach into a running worker.
#[derive(Debug, Default)]
pub struct WorkerPool {
    join_set: JoinSet<WorkerId>,
}

impl WorkerPool {
    /// Creates a new empty worker pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a worker task into the pool.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(&mut self, worker_id: WorkerId, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let span = tracing::info_span!("worker", worker_id);
        self.join_set.spawn(
            async move {
                future.await;
                worker_id
            }
            .instrument(span.or_current()),
        );

        debug!(worker_id, "spawned worker in pool");
    }

    /// Number of worker tasks that have not been joined yet.
    pub fn len(&self) -> usize {
        self.join_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.join_set.is_empty()
    }

    /// Waits for every worker to stop.
    ///
    /// Workers only stop after shutdown was requested, so callers normally request shutdown
    /// first. Panicked workers are reported as [`ErrorKind::WorkerPanic`], aggregated into a
    /// single error when more than one worker failed.
    pub async fn wait_all(mut self) -> OffloadResult<()> {
        let mut errors = Vec::new();

        while let Some(result) = self.join_set.join_next().await {
            match result {
                Ok(worker_id) => {
                    debug!(worker_id, "worker completed");
                }
                Err(join_err) => {
                    if join_err.is_cancelled() {
                        debug!("worker task was cancelled");
                    } else {
                        error!(error = %join_err, "worker panicked");
                        errors.push(offload_error!(
                            ErrorKind::WorkerPanic,
                            "Worker panicked",
                            join_err
                        ));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }
}
