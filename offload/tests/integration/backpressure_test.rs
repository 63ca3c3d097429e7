use std::time::Duration;

use offload::test_utils::handler::TestAction;
use offload::test_utils::pipeline::{create_recording_pipeline, drain_until, test_pool_config};
use offload_telemetry::init_test_tracing;
use rand::random;
use tokio::time::{Instant, sleep};

#[tokio::test]
async fn capacity_is_lost_exactly_at_the_threshold() {
    init_test_tracing();
    let (pipeline, _handler) = create_recording_pipeline(random(), test_pool_config(2, 5));

    for payload in 0..4 {
        pipeline.submit(TestAction::Echo(payload)).unwrap();
    }
    assert!(pipeline.has_capacity(), "threshold - 1 queued items");

    pipeline.submit(TestAction::Echo(4)).unwrap();
    assert!(!pipeline.has_capacity(), "threshold queued items");

    // The gate is advisory; submit still accepts work.
    pipeline.submit(TestAction::Echo(5)).unwrap();
    assert!(!pipeline.has_capacity(), "threshold + 1 queued items");
    assert_eq!(pipeline.stats().input_depth, 6);
}

#[tokio::test]
async fn submit_never_enforces_the_threshold() {
    let (pipeline, _handler) = create_recording_pipeline(random(), test_pool_config(1, 10));

    for payload in 0..1_000 {
        pipeline.submit(TestAction::Echo(payload)).unwrap();
    }

    assert_eq!(pipeline.stats().submitted, 1_000);
    assert_eq!(pipeline.stats().input_depth, 1_000);
}

#[tokio::test(flavor = "multi_thread")]
async fn undrained_results_also_consume_capacity() {
    init_test_tracing();
    let (mut pipeline, _handler) = create_recording_pipeline(random(), test_pool_config(1, 3));

    for payload in 0..3 {
        pipeline.submit(TestAction::Echo(payload)).unwrap();
    }
    pipeline.start().unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while pipeline.stats().output_depth < 3 {
        assert!(Instant::now() < deadline, "results never reached the output queue");
        sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(pipeline.stats().input_depth, 0);
    assert!(!pipeline.has_capacity());

    let results = drain_until(&pipeline, 3).await;
    assert_eq!(results.len(), 3);
    assert!(pipeline.has_capacity());

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn producer_throttled_by_capacity_gets_every_result() {
    init_test_tracing();
    let (mut pipeline, _handler) = create_recording_pipeline(random(), test_pool_config(4, 8));
    pipeline.start().unwrap();

    let total = 500usize;
    let mut submitted = 0;
    let mut collected = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(30);

    // A control loop in the style of a crawler: submit while there is room, then drain.
    while collected.len() < total {
        assert!(Instant::now() < deadline, "pipeline stalled");

        while submitted < total && pipeline.has_capacity() {
            pipeline
                .submit(TestAction::Sleep {
                    payload: submitted as u32,
                    duration: Duration::from_millis(1),
                })
                .unwrap();
            submitted += 1;
        }

        collected.extend(pipeline.drain());
        sleep(Duration::from_millis(1)).await;
    }

    let mut payloads: Vec<u32> = collected
        .into_iter()
        .map(|result| result.into_outcome().unwrap())
        .collect();
    payloads.sort_unstable();
    assert_eq!(payloads, (0..total as u32).collect::<Vec<_>>());

    pipeline.shutdown_and_wait().await.unwrap();
}
