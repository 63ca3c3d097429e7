use std::time::Duration;

use offload_config::shared::WorkerPoolConfig;
use tokio::time::{Instant, sleep};

use crate::pipeline::{Pipeline, PipelineId};
use crate::test_utils::handler::RecordingHandler;
use crate::test_utils::notify::DEFAULT_NOTIFY_TIMEOUT;
use crate::workers::base::{HandlerResult, WorkHandler};

/// Interval between two checks of a pipeline while waiting in tests.
const CHECK_INTERVAL: Duration = Duration::from_millis(5);

/// Pool configuration with a short poll interval so shutdown is observed quickly.
pub fn test_pool_config(workers: usize, queue_threshold: usize) -> WorkerPoolConfig {
    WorkerPoolConfig {
        workers,
        queue_threshold,
        poll_interval_ms: 10,
        operation_timeout_ms: 5_000,
    }
}

/// Creates a non-started pipeline running a fresh [`RecordingHandler`].
///
/// Returns a clone of the handler so the test can observe and drive it.
pub fn create_recording_pipeline(
    id: PipelineId,
    config: WorkerPoolConfig,
) -> (Pipeline<RecordingHandler>, RecordingHandler) {
    let handler = RecordingHandler::new();
    let pipeline = Pipeline::new(id, config, handler.clone()).expect("valid test pool config");

    (pipeline, handler)
}

/// Drains `pipeline` until at least `count` results were collected.
///
/// # Panics
///
/// Panics if the results do not arrive within the default notification timeout.
pub async fn drain_until<H: WorkHandler>(
    pipeline: &Pipeline<H>,
    count: usize,
) -> Vec<HandlerResult<H>> {
    let deadline = Instant::now() + DEFAULT_NOTIFY_TIMEOUT;
    let mut results = Vec::with_capacity(count);

    loop {
        results.extend(pipeline.drain());
        if results.len() >= count {
            return results;
        }

        if Instant::now() >= deadline {
            panic!(
                "collected {} of {count} results within {DEFAULT_NOTIFY_TIMEOUT:?}",
                results.len()
            );
        }

        sleep(CHECK_INTERVAL).await;
    }
}

/// Waits until `pipeline` reports idle.
///
/// # Panics
///
/// Panics if the pipeline is still busy after the default notification timeout.
pub async fn wait_until_idle<H: WorkHandler>(pipeline: &Pipeline<H>) {
    let deadline = Instant::now() + DEFAULT_NOTIFY_TIMEOUT;

    while !pipeline.is_idle() {
        if Instant::now() >= deadline {
            panic!("pipeline still busy after {DEFAULT_NOTIFY_TIMEOUT:?}: {}", pipeline.stats());
        }

        sleep(CHECK_INTERVAL).await;
    }
}
