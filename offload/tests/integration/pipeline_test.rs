use std::collections::HashSet;
use std::time::Duration;

use offload::cache::handler::CacheActionKind;
use offload::error::ErrorKind;
use offload::pipeline::PipelineId;
use offload::test_utils::handler::{TestAction, TestActionKind};
use offload::test_utils::pipeline::{
    create_recording_pipeline, drain_until, test_pool_config, wait_until_idle,
};
use offload::transport::fetch::FetchActionKind;
use offload_telemetry::init_test_tracing;
use rand::random;
use tokio::time::{Instant, sleep};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_submitted_item_yields_exactly_one_result() {
    init_test_tracing();

    for workers in [1, 2, 4, 8] {
        let pipeline_id: PipelineId = random();
        let (mut pipeline, handler) =
            create_recording_pipeline(pipeline_id, test_pool_config(workers, 100));
        pipeline.start().unwrap();

        let total = 200u32;
        let mut submitted = HashSet::new();
        for payload in 0..total {
            submitted.insert(pipeline.submit(TestAction::Echo(payload)).unwrap());
        }

        let results = drain_until(&pipeline, total as usize).await;
        assert_eq!(results.len(), total as usize, "pool of {workers} workers");

        let ids: HashSet<_> = results.iter().map(|result| result.id()).collect();
        assert_eq!(ids, submitted);

        let mut payloads: Vec<u32> = results
            .into_iter()
            .map(|result| result.into_outcome().unwrap())
            .collect();
        payloads.sort_unstable();
        assert_eq!(payloads, (0..total).collect::<Vec<_>>());

        wait_until_idle(&pipeline).await;
        assert!(pipeline.drain().is_empty());

        let stats = pipeline.stats();
        assert_eq!(stats.submitted, u64::from(total));
        assert_eq!(stats.completed, u64::from(total));
        assert_eq!(stats.failed, 0);
        assert_eq!(handler.completed().await.len(), total as usize);

        pipeline.shutdown_and_wait().await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn drain_without_new_results_returns_nothing() {
    init_test_tracing();
    let (mut pipeline, _handler) = create_recording_pipeline(random(), test_pool_config(2, 10));

    assert!(pipeline.drain().is_empty());

    pipeline.submit(TestAction::Echo(1)).unwrap();
    pipeline.start().unwrap();

    let results = drain_until(&pipeline, 1).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind(), TestActionKind::Echo);

    assert!(pipeline.drain().is_empty());
    assert!(pipeline.drain().is_empty());

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn two_workers_with_threshold_five() {
    init_test_tracing();
    let (mut pipeline, _handler) = create_recording_pipeline(random(), test_pool_config(2, 5));

    for payload in 0..5 {
        pipeline.submit(TestAction::Echo(payload)).unwrap();
    }
    assert!(!pipeline.has_capacity());
    assert!(!pipeline.is_idle());

    pipeline.start().unwrap();

    let results = drain_until(&pipeline, 5).await;
    let mut payloads: Vec<u32> = results
        .into_iter()
        .map(|result| result.into_outcome().unwrap())
        .collect();
    payloads.sort_unstable();
    assert_eq!(payloads, vec![0, 1, 2, 3, 4]);

    wait_until_idle(&pipeline).await;
    assert!(pipeline.has_capacity());

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn idle_is_only_reported_once_every_result_was_pushed() {
    init_test_tracing();
    let (mut pipeline, _handler) = create_recording_pipeline(random(), test_pool_config(4, 100));
    pipeline.start().unwrap();

    for round in 0..20u32 {
        for payload in 0..10 {
            pipeline.submit(TestAction::Echo(round * 10 + payload)).unwrap();
        }

        // Items moving from the input queue to a worker must never look idle.
        let deadline = Instant::now() + Duration::from_secs(10);
        while !pipeline.is_idle() {
            assert!(Instant::now() < deadline, "pipeline never became idle");
            tokio::task::yield_now().await;
        }

        let stats = pipeline.stats();
        assert_eq!(stats.completed, stats.submitted, "round {round}");
        assert_eq!(stats.input_depth, 0);
    }

    let results = drain_until(&pipeline, 200).await;
    assert_eq!(results.len(), 200);

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_operation_does_not_stop_the_worker() {
    init_test_tracing();
    let (mut pipeline, handler) = create_recording_pipeline(random(), test_pool_config(1, 10));
    pipeline.start().unwrap();

    let failing_id = pipeline.submit(TestAction::Fail(1)).unwrap();
    pipeline.submit(TestAction::Echo(2)).unwrap();

    let results = drain_until(&pipeline, 2).await;

    let failed = results
        .iter()
        .find(|result| result.id() == failing_id)
        .unwrap();
    assert_eq!(failed.kind(), TestActionKind::Fail);
    assert_eq!(failed.error().unwrap().kind(), ErrorKind::NetworkError);
    assert_eq!(failed.error().unwrap().kind().abbr(), "network-error");

    let succeeded = results
        .iter()
        .find(|result| result.id() != failing_id)
        .unwrap();
    assert!(succeeded.is_ok());

    assert_eq!(handler.completed().await, vec![2]);
    assert_eq!(pipeline.stats().live_workers, 1);
    assert_eq!(pipeline.stats().failed, 1);

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_operation_times_out_into_an_error_result() {
    init_test_tracing();
    let (mut pipeline, _handler) = create_recording_pipeline(random(), test_pool_config(1, 10));
    pipeline.start().unwrap();

    let slow_id = pipeline
        .submit_with_timeout(
            TestAction::Sleep {
                payload: 1,
                duration: Duration::from_secs(30),
            },
            Duration::from_millis(20),
        )
        .unwrap();
    pipeline.submit(TestAction::Echo(2)).unwrap();

    let results = drain_until(&pipeline, 2).await;

    let slow = results.iter().find(|result| result.id() == slow_id).unwrap();
    assert_eq!(slow.error().unwrap().kind(), ErrorKind::OperationTimedOut);
    assert!(results.iter().any(|result| result.is_ok()));
    assert_eq!(pipeline.stats().timed_out, 1);

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn configured_operation_timeout_applies_by_default() {
    init_test_tracing();
    let mut config = test_pool_config(1, 10);
    config.operation_timeout_ms = 20;
    let (mut pipeline, handler) = create_recording_pipeline(random(), config);
    pipeline.start().unwrap();

    pipeline
        .submit(TestAction::Sleep {
            payload: 1,
            duration: Duration::from_secs(30),
        })
        .unwrap();

    let results = drain_until(&pipeline, 1).await;
    assert_eq!(
        results[0].error().unwrap().kind(),
        ErrorKind::OperationTimedOut
    );
    assert!(handler.completed().await.is_empty());

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_worker_is_reported_on_wait() {
    init_test_tracing();
    let (mut pipeline, _handler) = create_recording_pipeline(random(), test_pool_config(2, 10));
    pipeline.start().unwrap();

    pipeline.submit(TestAction::Panic).unwrap();
    for payload in 0..5 {
        pipeline.submit(TestAction::Echo(payload)).unwrap();
    }

    // The surviving worker handles everything else.
    let results = drain_until(&pipeline, 5).await;
    assert!(results.iter().all(|result| result.is_ok()));

    // The panicking worker may still be unwinding.
    let deadline = Instant::now() + Duration::from_secs(10);
    while pipeline.stats().live_workers != 1 {
        assert!(Instant::now() < deadline, "panicked worker never stopped");
        sleep(Duration::from_millis(5)).await;
    }

    let err = pipeline.shutdown_and_wait().await.unwrap_err();
    assert_eq!(err.kinds(), vec![ErrorKind::WorkerPanic]);
}

#[test]
fn unknown_action_tags_are_rejected() {
    for tag in ["bogus", "", "LOAD"] {
        assert_eq!(
            tag.parse::<TestActionKind>().unwrap_err().kind(),
            ErrorKind::UnknownAction
        );
        assert_eq!(
            tag.parse::<CacheActionKind>().unwrap_err().kind(),
            ErrorKind::UnknownAction
        );
        assert_eq!(
            tag.parse::<FetchActionKind>().unwrap_err().kind(),
            ErrorKind::UnknownAction
        );
    }

    assert_eq!("save".parse::<CacheActionKind>().unwrap(), CacheActionKind::Save);
    assert_eq!(TestActionKind::Block.to_string(), "block");
}
