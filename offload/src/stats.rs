//! Counters describing the activity of a pipeline.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ErrorKind, OffloadResult};

/// Monotonic counters updated by the producer and the workers.
#[derive(Debug, Default)]
pub(crate) struct PipelineCounters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
}

impl PipelineCounters {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a result pushed to the output queue.
    pub(crate) fn record_outcome<O>(&self, outcome: &OffloadResult<O>) {
        self.completed.fetch_add(1, Ordering::Relaxed);

        if let Err(err) = outcome {
            self.failed.fetch_add(1, Ordering::Relaxed);
            if err.kind() == ErrorKind::OperationTimedOut {
                self.timed_out.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub(crate) fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub(crate) fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub(crate) fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub(crate) fn timed_out(&self) -> u64 {
        self.timed_out.load(Ordering::Relaxed)
    }
}

/// Point in time snapshot returned by [`crate::pipeline::Pipeline::stats`].
///
/// Fields are read one by one while workers keep running, so a snapshot taken under load may
/// be slightly inconsistent (e.g. an item counted in `completed` may still be `busy`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Work items accepted by `submit`.
    pub submitted: u64,
    /// Results pushed to the output queue, successful or not.
    pub completed: u64,
    /// Results carrying an error, timeouts included.
    pub failed: u64,
    /// Results carrying [`ErrorKind::OperationTimedOut`].
    pub timed_out: u64,
    /// Items waiting in the input queue.
    pub input_depth: usize,
    /// Results waiting to be drained.
    pub output_depth: usize,
    /// Workers currently processing an item.
    pub busy_workers: usize,
    /// Workers that have not stopped yet.
    pub live_workers: usize,
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "submitted={} completed={} failed={} timed_out={} input={} output={} busy={}/{}",
            self.submitted,
            self.completed,
            self.failed,
            self.timed_out,
            self.input_depth,
            self.output_depth,
            self.busy_workers,
            self.live_workers
        )
    }
}
