use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use offload_config::shared::WorkerPoolConfig;
use tracing::{debug, error, info, trace};

use crate::bail;
use crate::concurrency::pause::{PauseTx, create_pause_channel};
use crate::concurrency::queue::WorkQueue;
use crate::concurrency::shutdown::{ShutdownTx, create_shutdown_channel};
use crate::error::{ErrorKind, OffloadResult};
use crate::stats::{PipelineCounters, PipelineStats};
use crate::types::{WorkItem, WorkItemId};
use crate::workers::activity::WorkerActivity;
use crate::workers::base::{HandlerResult, WorkHandler};
use crate::workers::pool::WorkerPool;
use crate::workers::worker::{Worker, WorkerContext, WorkerTimings};

#[derive(Debug)]
enum PipelineState {
    NotStarted,
    Started { pool: WorkerPool },
}

pub type PipelineId = u64;

/// A bounded pool of background workers fed through an input queue.
///
/// The owner submits actions without ever blocking, checks [`Pipeline::has_capacity`] to
/// throttle itself, and periodically collects results with [`Pipeline::drain`]. Every
/// accepted action produces exactly one result, including actions still queued when shutdown
/// is requested. Only a pipeline shut down while paused leaves queued actions unprocessed.
///
/// Items may be submitted before [`Pipeline::start`]; they wait in the input queue.
pub struct Pipeline<H: WorkHandler> {
    id: PipelineId,
    config: Arc<WorkerPoolConfig>,
    context: WorkerContext<H>,
    next_item_id: AtomicU64,
    state: PipelineState,
    shutdown_tx: ShutdownTx,
    pause_tx: PauseTx,
}

impl<H: WorkHandler> Pipeline<H> {
    /// Creates a pipeline running `handler` with the given pool configuration.
    ///
    /// Fails with [`ErrorKind::ConfigError`] if the configuration is invalid.
    pub fn new(id: PipelineId, config: WorkerPoolConfig, handler: H) -> OffloadResult<Self> {
        config.validate()?;

        // Receivers are created per worker through `subscribe`.
        let (shutdown_tx, _) = create_shutdown_channel();
        let (pause_tx, _) = create_pause_channel();

        let context = WorkerContext {
            handler: Arc::new(handler),
            input: Arc::new(WorkQueue::new()),
            output: Arc::new(WorkQueue::new()),
            activity: WorkerActivity::new(),
            counters: Arc::new(PipelineCounters::default()),
        };

        Ok(Self {
            id,
            config: Arc::new(config),
            context,
            next_item_id: AtomicU64::new(0),
            state: PipelineState::NotStarted,
            shutdown_tx,
            pause_tx,
        })
    }

    pub fn id(&self) -> PipelineId {
        self.id
    }

    pub fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// Returns the handler shared by the workers.
    pub fn handler(&self) -> &H {
        &self.context.handler
    }

    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Spawns the configured number of workers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) -> OffloadResult<()> {
        if self.shutdown_tx.is_shutdown() {
            bail!(
                ErrorKind::PipelineShutdown,
                "Pipeline was shut down",
                format!("pipeline {} cannot be started after shutdown", self.id)
            );
        }

        if let PipelineState::Started { .. } = self.state {
            bail!(
                ErrorKind::PipelineAlreadyStarted,
                "Pipeline was already started",
                format!("pipeline {} is already running", self.id)
            );
        }

        info!(
            pipeline_id = self.id,
            handler = H::name(),
            workers = self.config.workers,
            queue_threshold = self.config.queue_threshold,
            "starting pipeline"
        );

        let timings = WorkerTimings {
            poll_interval: self.config.poll_interval(),
            operation_timeout: self.config.operation_timeout(),
        };

        let mut pool = WorkerPool::new();
        for worker_id in 0..self.config.workers {
            let worker = Worker::new(
                self.id,
                worker_id,
                self.context.clone(),
                timings,
                self.shutdown_tx.subscribe(),
                self.pause_tx.subscribe(),
            );
            pool.spawn(worker_id, worker.run());
        }

        self.state = PipelineState::Started { pool };

        Ok(())
    }

    /// Enqueues an action using the configured operation timeout. Never blocks.
    ///
    /// Does not enforce the queue threshold: callers are expected to check
    /// [`Pipeline::has_capacity`] first. Fails with [`ErrorKind::PipelineShutdown`] once
    /// shutdown was requested.
    pub fn submit(&self, action: H::Action) -> OffloadResult<WorkItemId> {
        self.enqueue(action, None)
    }

    /// Same as [`Pipeline::submit`] with a deadline specific to this action.
    pub fn submit_with_timeout(
        &self,
        action: H::Action,
        timeout: Duration,
    ) -> OffloadResult<WorkItemId> {
        self.enqueue(action, Some(timeout))
    }

    /// Returns `true` when both queues hold fewer items than the configured threshold.
    ///
    /// Advisory only: several producers may observe capacity at the same time and overshoot
    /// the threshold together.
    pub fn has_capacity(&self) -> bool {
        let threshold = self.config.queue_threshold;
        let input_depth = self.context.input.len();
        let output_depth = self.context.output.len();

        let has_capacity = input_depth < threshold && output_depth < threshold;
        trace!(
            pipeline_id = self.id,
            input_depth, output_depth, threshold, has_capacity, "checked capacity"
        );

        has_capacity
    }

    /// Collects every result currently available without waiting.
    ///
    /// Results are returned in output queue order, which is completion order and not
    /// submission order.
    pub fn drain(&self) -> Vec<HandlerResult<H>> {
        let mut results = Vec::with_capacity(self.context.output.len());
        while let Some(result) = self.context.output.try_pop() {
            results.push(result);
        }

        if !results.is_empty() {
            debug!(pipeline_id = self.id, count = results.len(), "drained results");
        }

        results
    }

    /// Returns `true` when no worker is processing an item and the input queue is empty.
    ///
    /// Every submitted item counts until a worker pushed its result, including while it moves
    /// from the input queue to a worker. Results waiting in the output queue do not count as
    /// activity.
    pub fn is_idle(&self) -> bool {
        self.context.activity.pending_items() == 0
    }

    /// Stops workers from taking new items until [`Pipeline::resume`] is called.
    ///
    /// Items already being processed complete normally.
    pub fn pause(&self) {
        info!(pipeline_id = self.id, "pausing pipeline");
        self.pause_tx.pause();
    }

    pub fn resume(&self) {
        info!(pipeline_id = self.id, "resuming pipeline");
        self.pause_tx.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.pause_tx.is_paused()
    }

    /// Stops accepting work and lets workers stop once the input queue is drained. Never waits.
    ///
    /// Items submitted before the request are still processed. Paused workers stop right away
    /// and leave queued items unprocessed.
    pub fn request_shutdown(&self) {
        info!(
            pipeline_id = self.id,
            pending = self.context.input.len(),
            "shutdown requested"
        );

        self.shutdown_tx.shutdown();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown_tx.is_shutdown()
    }

    pub fn stats(&self) -> PipelineStats {
        let counters = &self.context.counters;

        PipelineStats {
            submitted: counters.submitted(),
            completed: counters.completed(),
            failed: counters.failed(),
            timed_out: counters.timed_out(),
            input_depth: self.context.input.len(),
            output_depth: self.context.output.len(),
            busy_workers: self.context.activity.busy_workers(),
            live_workers: self.context.activity.live_workers(),
        }
    }

    /// Waits for every worker to stop, then shuts the handler down.
    ///
    /// Workers only stop once shutdown was requested, through [`Pipeline::request_shutdown`]
    /// or a [`ShutdownTx`] obtained from [`Pipeline::shutdown_tx`]. Worker panics and a
    /// failing handler shutdown are aggregated into the returned error.
    pub async fn wait(self) -> OffloadResult<()> {
        let PipelineState::Started { pool } = self.state else {
            info!(pipeline_id = self.id, "pipeline was not started, nothing to wait for");

            return Ok(());
        };

        info!(pipeline_id = self.id, workers = pool.len(), "waiting for workers to complete");

        let mut errors = vec![];

        if let Err(err) = pool.wait_all().await {
            // We naively use the `kinds` as number of errors.
            let errors_number = err.kinds().len();
            errors.push(err);

            error!(pipeline_id = self.id, "{} workers panicked", errors_number);
        }

        if let Err(err) = self.context.handler.shutdown().await {
            error!(pipeline_id = self.id, error = %err, "handler shutdown failed");
            errors.push(err);
        }

        info!(
            pipeline_id = self.id,
            unprocessed = self.context.input.len(),
            undrained = self.context.output.len(),
            "pipeline stopped"
        );

        if !errors.is_empty() {
            return Err(errors.into());
        }

        Ok(())
    }

    pub async fn shutdown_and_wait(self) -> OffloadResult<()> {
        self.request_shutdown();
        self.wait().await
    }

    fn enqueue(&self, action: H::Action, timeout: Option<Duration>) -> OffloadResult<WorkItemId> {
        if self.shutdown_tx.is_shutdown() {
            bail!(
                ErrorKind::PipelineShutdown,
                "Pipeline was shut down",
                format!("pipeline {} no longer accepts work", self.id)
            );
        }

        let id = self.next_item_id.fetch_add(1, Ordering::Relaxed);
        let item = WorkItem::new(id, action, timeout);

        self.context.activity.record_pending();
        if self.context.input.push(item).is_err() {
            self.context.activity.cancel_pending();
            bail!(
                ErrorKind::PipelineShutdown,
                "Pipeline input queue is closed",
                format!("pipeline {} no longer accepts work", self.id)
            );
        }

        self.context.counters.record_submitted();
        trace!(pipeline_id = self.id, item_id = id, "submitted work item");

        Ok(id)
    }
}

impl<H: WorkHandler> fmt::Debug for Pipeline<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("id", &self.id)
            .field("handler", &H::name())
            .field("config", &self.config)
            .field("state", &self.state)
            .field("stats", &self.stats())
            .finish()
    }
}
