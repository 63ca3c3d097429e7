use std::time::Duration;

use chrono::{TimeDelta, Utc};
use offload::cache::CachePipeline;
use offload::cache::handler::{CacheAction, CacheActionKind, CacheHandler, CacheOutcome};
use offload::cache::memory::MemoryCacheStore;
use offload::cache::store::CacheStore;
use offload::error::ErrorKind;
use offload::pipeline::Pipeline;
use offload::test_utils::pipeline::{drain_until, test_pool_config};
use offload::types::{Method, Request, Response};
use offload_config::shared::CacheConfig;
use offload_telemetry::init_test_tracing;
use rand::random;

const URL: &str = "http://localhost/page";

fn create_cache_pipeline(store: MemoryCacheStore, config: CacheConfig) -> CachePipeline<MemoryCacheStore> {
    let handler = CacheHandler::new(store, &config);
    let mut pipeline = Pipeline::new(random(), test_pool_config(2, 10), handler).unwrap();
    pipeline.start().unwrap();

    pipeline
}

async fn run_one(
    pipeline: &CachePipeline<MemoryCacheStore>,
    action: CacheAction,
) -> Result<CacheOutcome, offload::error::OffloadError> {
    let id = pipeline.submit(action).unwrap();
    let mut results = drain_until(pipeline, 1).await;
    assert_eq!(results.len(), 1);

    let result = results.remove(0);
    assert_eq!(result.id(), id);
    result.into_outcome()
}

#[tokio::test(flavor = "multi_thread")]
async fn miss_save_then_hit() {
    init_test_tracing();
    let store = MemoryCacheStore::new();
    let pipeline = create_cache_pipeline(store.clone(), CacheConfig::default());

    let outcome = run_one(&pipeline, CacheAction::Load(Request::get(URL)))
        .await
        .unwrap();
    assert_eq!(outcome, CacheOutcome::PassThrough(Request::get(URL)));

    let response = Response::new(URL, 200).with_body("<html>cached</html>");
    let outcome = run_one(
        &pipeline,
        CacheAction::Save {
            request: Request::get(URL),
            response: response.clone(),
        },
    )
    .await
    .unwrap();
    assert_eq!(outcome, CacheOutcome::Saved { key: URL.to_owned() });
    assert_eq!(store.size().await.unwrap(), 1);

    let outcome = run_one(&pipeline, CacheAction::Load(Request::get(URL)))
        .await
        .unwrap();
    let CacheOutcome::Hit {
        request,
        response: cached,
    } = outcome
    else {
        panic!("expected a cache hit, got {outcome:?}");
    };
    assert_eq!(request.url, URL);
    assert_eq!(cached.response, response);

    let counters = pipeline.handler().counters();
    assert_eq!(counters.hits(), 1);
    assert_eq!(counters.misses(), 1);
    assert_eq!(counters.saves(), 1);

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn non_cacheable_requests_pass_through() {
    init_test_tracing();
    let store = MemoryCacheStore::new();
    store.put(URL, Response::new(URL, 200)).await.unwrap();
    let pipeline = create_cache_pipeline(store, CacheConfig::default());

    let requests = [
        Request::get(URL).with_refresh_cache(true),
        Request::get(URL).with_disable_cache(true),
        Request::new(Method::Post, URL),
    ];
    for request in requests {
        let outcome = run_one(&pipeline, CacheAction::Load(request.clone()))
            .await
            .unwrap();
        assert_eq!(outcome, CacheOutcome::PassThrough(request));
    }

    assert_eq!(pipeline.handler().counters().hits(), 0);

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_entries_are_not_served() {
    init_test_tracing();
    let store = MemoryCacheStore::new();
    store
        .insert_at(URL, Response::new(URL, 200), Utc::now() - TimeDelta::seconds(30))
        .await
        .unwrap();
    let config = CacheConfig {
        default_max_age_ms: Some(10_000),
    };
    let pipeline = create_cache_pipeline(store, config);

    let outcome = run_one(&pipeline, CacheAction::Load(Request::get(URL)))
        .await
        .unwrap();
    assert!(matches!(outcome, CacheOutcome::PassThrough(_)));

    let request = Request::get(URL).with_cache_timeout(Duration::from_secs(60));
    let outcome = run_one(&pipeline, CacheAction::Load(request)).await.unwrap();
    assert!(matches!(outcome, CacheOutcome::Hit { .. }));

    let request = Request::get(URL).with_cache_timeout(Duration::ZERO);
    let outcome = run_one(&pipeline, CacheAction::Load(request)).await.unwrap();
    assert!(matches!(outcome, CacheOutcome::PassThrough(_)));

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_responses_are_not_saved() {
    init_test_tracing();
    let store = MemoryCacheStore::new();
    let pipeline = create_cache_pipeline(store.clone(), CacheConfig::default());

    let outcome = run_one(
        &pipeline,
        CacheAction::Save {
            request: Request::get(URL),
            response: Response::new(URL, 500),
        },
    )
    .await
    .unwrap();
    assert_eq!(outcome, CacheOutcome::SaveSkipped { key: URL.to_owned() });

    let outcome = run_one(
        &pipeline,
        CacheAction::Save {
            request: Request::get(URL),
            response: Response::new(URL, 404),
        },
    )
    .await
    .unwrap();
    assert_eq!(outcome, CacheOutcome::Saved { key: URL.to_owned() });
    assert_eq!(store.size().await.unwrap(), 1);

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn store_failures_become_error_results() {
    init_test_tracing();
    let store = MemoryCacheStore::new();
    store.close().await.unwrap();
    let pipeline = create_cache_pipeline(store, CacheConfig::default());

    let err = run_one(&pipeline, CacheAction::Load(Request::get(URL)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CacheReadFailed);

    let err = run_one(
        &pipeline,
        CacheAction::Save {
            request: Request::get(URL),
            response: Response::new(URL, 200),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CacheWriteFailed);

    // Workers are still serving requests that do not touch the store.
    let request = Request::get(URL).with_refresh_cache(true);
    let outcome = run_one(&pipeline, CacheAction::Load(request)).await.unwrap();
    assert!(matches!(outcome, CacheOutcome::PassThrough(_)));
    assert_eq!(pipeline.stats().live_workers, 2);

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_closes_the_store() {
    init_test_tracing();
    let store = MemoryCacheStore::new();
    let pipeline = create_cache_pipeline(store.clone(), CacheConfig::default());

    pipeline.submit(CacheAction::Load(Request::get(URL))).unwrap();
    let results = drain_until(&pipeline, 1).await;
    assert_eq!(results[0].kind(), CacheActionKind::Load);

    pipeline.shutdown_and_wait().await.unwrap();
    assert!(store.is_closed().await);
}
