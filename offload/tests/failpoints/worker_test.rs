use offload::cache::handler::{CacheAction, CacheHandler, CacheOutcome};
use offload::cache::memory::MemoryCacheStore;
use offload::cache::store::CacheStore;
use offload::error::ErrorKind;
use offload::failpoints::{CACHE_LOAD_BEFORE_READ, CACHE_SAVE_BEFORE_WRITE, WORKER_BEFORE_HANDLE};
use offload::pipeline::Pipeline;
use offload::test_utils::failpoints::ScopedFailScenario;
use offload::test_utils::handler::TestAction;
use offload::test_utils::pipeline::{create_recording_pipeline, drain_until, test_pool_config};
use offload::types::{Request, Response};
use offload_config::shared::CacheConfig;
use offload_telemetry::init_test_tracing;
use rand::random;

const URL: &str = "http://localhost/page";

#[tokio::test(flavor = "multi_thread")]
async fn injected_failures_become_error_results() {
    init_test_tracing();
    let scenario = ScopedFailScenario::setup(&[(WORKER_BEFORE_HANDLE, "return")]);

    let (mut pipeline, handler) = create_recording_pipeline(random(), test_pool_config(2, 10));
    pipeline.start().unwrap();

    for payload in 0..4 {
        pipeline.submit(TestAction::Echo(payload)).unwrap();
    }

    let results = drain_until(&pipeline, 4).await;
    for result in &results {
        let err = result.error().unwrap();
        assert_eq!(err.kind(), ErrorKind::InjectedFailure);
        assert_eq!(err.kind().abbr(), "injected-failure");
    }

    // The handler never ran.
    assert_eq!(handler.started(), 0);
    assert_eq!(pipeline.stats().failed, 4);

    pipeline.shutdown_and_wait().await.unwrap();
    scenario.teardown();
}

#[tokio::test(flavor = "multi_thread")]
async fn worker_recovers_once_the_fail_point_stops_firing() {
    init_test_tracing();
    let scenario = ScopedFailScenario::setup(&[(WORKER_BEFORE_HANDLE, "1*return(network)")]);

    let (mut pipeline, handler) = create_recording_pipeline(random(), test_pool_config(1, 10));
    pipeline.start().unwrap();

    let failing_id = pipeline.submit(TestAction::Echo(1)).unwrap();
    pipeline.submit(TestAction::Echo(2)).unwrap();

    let results = drain_until(&pipeline, 2).await;
    let failed = results
        .iter()
        .find(|result| result.id() == failing_id)
        .unwrap();
    assert_eq!(failed.error().unwrap().kind(), ErrorKind::NetworkError);
    assert_eq!(handler.completed().await, vec![2]);

    pipeline.shutdown_and_wait().await.unwrap();
    scenario.teardown();
}

#[tokio::test(flavor = "multi_thread")]
async fn cache_store_fail_points_map_to_cache_errors() {
    init_test_tracing();
    let scenario = ScopedFailScenario::setup(&[
        (CACHE_LOAD_BEFORE_READ, "return(cache_read)"),
        (CACHE_SAVE_BEFORE_WRITE, "return(cache_write)"),
    ]);

    let store = MemoryCacheStore::new();
    let handler = CacheHandler::new(store.clone(), &CacheConfig::default());
    let mut pipeline = Pipeline::new(random(), test_pool_config(1, 10), handler).unwrap();
    pipeline.start().unwrap();

    pipeline
        .submit(CacheAction::Save {
            request: Request::get(URL),
            response: Response::new(URL, 200),
        })
        .unwrap();
    let result = drain_until(&pipeline, 1).await.remove(0);
    assert_eq!(result.error().unwrap().kind(), ErrorKind::CacheWriteFailed);
    assert_eq!(store.size().await.unwrap(), 0);

    pipeline.submit(CacheAction::Load(Request::get(URL))).unwrap();
    let result = drain_until(&pipeline, 1).await.remove(0);
    assert_eq!(result.error().unwrap().kind(), ErrorKind::CacheReadFailed);

    // Requests that never reach the store are unaffected.
    let request = Request::get(URL).with_refresh_cache(true);
    pipeline.submit(CacheAction::Load(request)).unwrap();
    let outcome = drain_until(&pipeline, 1)
        .await
        .remove(0)
        .into_outcome()
        .unwrap();
    assert!(matches!(outcome, CacheOutcome::PassThrough(_)));

    pipeline.shutdown_and_wait().await.unwrap();
    scenario.teardown();
}
