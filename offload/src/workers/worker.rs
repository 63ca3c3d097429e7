use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::concurrency::pause::PauseRx;
use crate::concurrency::queue::WorkQueue;
use crate::concurrency::shutdown::ShutdownRx;
use crate::error::{ErrorKind, OffloadResult};
use crate::failpoints::{WORKER_BEFORE_HANDLE, offload_fail_point};
use crate::offload_error;
use crate::pipeline::PipelineId;
use crate::stats::PipelineCounters;
use crate::types::{Action, ResultItem, WorkItem};
use crate::workers::activity::WorkerActivity;
use crate::workers::base::{HandlerResult, WorkHandler, WorkerId, WorkerState};

/// State shared by every worker of a pipeline and by the pipeline itself.
pub(crate) struct WorkerContext<H: WorkHandler> {
    pub(crate) handler: Arc<H>,
    pub(crate) input: Arc<WorkQueue<WorkItem<H::Action>>>,
    pub(crate) output: Arc<WorkQueue<HandlerResult<H>>>,
    pub(crate) activity: Arc<WorkerActivity>,
    pub(crate) counters: Arc<PipelineCounters>,
}

impl<H: WorkHandler> Clone for WorkerContext<H> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            input: self.input.clone(),
            output: self.output.clone(),
            activity: self.activity.clone(),
            counters: self.counters.clone(),
        }
    }
}

/// Timing knobs of the worker loop.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WorkerTimings {
    /// Upper bound of a single wait on the input queue.
    pub(crate) poll_interval: Duration,
    /// Deadline applied to items submitted without their own timeout.
    pub(crate) operation_timeout: Duration,
}

/// A background worker consuming work items until shutdown.
pub(crate) struct Worker<H: WorkHandler> {
    pipeline_id: PipelineId,
    worker_id: WorkerId,
    context: WorkerContext<H>,
    timings: WorkerTimings,
    shutdown_rx: ShutdownRx,
    pause_rx: PauseRx,
    state: WorkerState,
}

impl<H: WorkHandler> Worker<H> {
    pub(crate) fn new(
        pipeline_id: PipelineId,
        worker_id: WorkerId,
        context: WorkerContext<H>,
        timings: WorkerTimings,
        shutdown_rx: ShutdownRx,
        pause_rx: PauseRx,
    ) -> Self {
        Self {
            pipeline_id,
            worker_id,
            context,
            timings,
            shutdown_rx,
            pause_rx,
            state: WorkerState::Running,
        }
    }

    /// Runs the worker loop until shutdown is requested or the input queue is closed.
    ///
    /// Shutdown is only observed when a pop times out, so every item accepted before the
    /// request is processed and its result pushed before the worker stops. A paused worker
    /// stops as soon as shutdown is requested.
    pub(crate) async fn run(mut self) {
        let _live = self.context.activity.mark_live();

        info!(
            pipeline_id = self.pipeline_id,
            worker_id = self.worker_id,
            handler = H::name(),
            "worker started"
        );

        loop {
            if self.pause_rx.is_paused() {
                debug!(worker_id = self.worker_id, "worker paused");

                tokio::select! {
                    biased;

                    _ = self.shutdown_rx.requested() => {
                        debug!(worker_id = self.worker_id, "shutdown observed while paused");
                        break;
                    }
                    _ = self.pause_rx.resumed() => {
                        debug!(worker_id = self.worker_id, "worker resumed");
                        continue;
                    }
                }
            }

            let popped = tokio::select! {
                biased;

                _ = self.pause_rx.paused() => continue,
                popped = timeout(self.timings.poll_interval, self.context.input.pop()) => popped,
            };

            match popped {
                Err(_) if self.shutdown_rx.is_shutdown() => {
                    debug!(worker_id = self.worker_id, "input queue drained after shutdown");
                    break;
                }
                Err(_) => {
                    trace!(worker_id = self.worker_id, "no work item within poll interval");
                }
                Ok(None) => {
                    debug!(worker_id = self.worker_id, "input queue closed");
                    break;
                }
                Ok(Some(item)) => self.process(item).await,
            }
        }

        self.state = WorkerState::Stopped;

        info!(
            pipeline_id = self.pipeline_id,
            worker_id = self.worker_id,
            state = %self.state,
            "worker stopped"
        );
    }

    async fn process(&mut self, item: WorkItem<H::Action>) {
        // The item was counted as pending when it was submitted.
        let _pending = self.context.activity.adopt_pending();
        let _busy = self.context.activity.mark_busy();
        self.state = WorkerState::Processing;

        let item_id = item.id();
        let kind = item.action().kind();
        let deadline = item.timeout().unwrap_or(self.timings.operation_timeout);

        debug!(
            worker_id = self.worker_id,
            item_id,
            %kind,
            queued_for = ?item.queued_for(),
            "processing work item"
        );

        let started = Instant::now();
        let outcome = self.execute(item.into_action(), deadline).await;
        let elapsed = started.elapsed();

        if let Err(err) = &outcome {
            warn!(
                worker_id = self.worker_id,
                item_id,
                %kind,
                error_kind = %err.kind(),
                error = %err,
                "operation failed"
            );
        }

        self.context.counters.record_outcome(&outcome);

        let result = ResultItem::new(item_id, kind, outcome, elapsed);
        if self.context.output.push(result).is_err() {
            warn!(worker_id = self.worker_id, item_id, "output queue closed, result dropped");
        }

        self.state = WorkerState::Running;
    }

    async fn execute(&self, action: H::Action, deadline: Duration) -> OffloadResult<H::Output> {
        offload_fail_point(WORKER_BEFORE_HANDLE)?;

        match timeout(deadline, self.context.handler.handle(action)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(offload_error!(
                ErrorKind::OperationTimedOut,
                "Operation timed out",
                format!("the operation did not complete within {deadline:?}")
            )),
        }
    }
}
