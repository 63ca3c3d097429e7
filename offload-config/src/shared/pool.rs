use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Worker pool configuration for a pipeline.
///
/// These are the only knobs of the pool itself: how many workers run, the advisory
/// backpressure threshold, how often idle workers wake up to look at the shutdown flag,
/// and the default deadline applied to every operation handed to a worker.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct WorkerPoolConfig {
    /// Number of background workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Queue depth at which the pipeline reports that it has no spare capacity.
    #[serde(default = "default_queue_threshold")]
    pub queue_threshold: usize,
    /// Maximum time, in milliseconds, a worker waits on an empty queue before re-checking the
    /// shutdown flag.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Default deadline, in milliseconds, for a single operation.
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

impl WorkerPoolConfig {
    /// Default number of workers.
    pub const DEFAULT_WORKERS: usize = 4;

    /// Default backpressure threshold.
    pub const DEFAULT_QUEUE_THRESHOLD: usize = 100;

    /// Default pop timeout: 100 milliseconds.
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

    /// Default operation deadline: 30 seconds.
    pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 30_000;

    /// Validates pool settings.
    ///
    /// Ensures every knob is non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.workers == 0 {
            return Err(ValidationError::WorkersZero);
        }

        if self.operation_timeout_ms == 0 {
            return Err(ValidationError::OperationTimeoutZero);
        }

        if self.queue_threshold == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "pool.queue_threshold".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        if self.poll_interval_ms == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "pool.poll_interval_ms".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Returns the pop timeout as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the default operation deadline as a [`Duration`].
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_threshold: default_queue_threshold(),
            poll_interval_ms: default_poll_interval_ms(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

fn default_workers() -> usize {
    WorkerPoolConfig::DEFAULT_WORKERS
}

fn default_queue_threshold() -> usize {
    WorkerPoolConfig::DEFAULT_QUEUE_THRESHOLD
}

fn default_poll_interval_ms() -> u64 {
    WorkerPoolConfig::DEFAULT_POLL_INTERVAL_MS
}

fn default_operation_timeout_ms() -> u64 {
    WorkerPoolConfig::DEFAULT_OPERATION_TIMEOUT_MS
}
