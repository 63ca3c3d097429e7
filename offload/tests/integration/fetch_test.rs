use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use offload::cache::handler::{CacheAction, CacheHandler, CacheOutcome};
use offload::cache::memory::MemoryCacheStore;
use offload::error::ErrorKind;
use offload::pipeline::Pipeline;
use offload::test_utils::pipeline::{drain_until, test_pool_config};
use offload::transport::FetchPipeline;
use offload::transport::fetch::{FetchAction, FetchActionKind, FetchHandler};
use offload::types::Request;
use offload_config::shared::{CacheConfig, FetchConfig};
use offload_telemetry::init_test_tracing;
use rand::random;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves a numbered HTML page to every connection and returns the base URL with the counter
/// of served requests.
async fn spawn_http_server() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let served = Arc::new(AtomicUsize::new(0));

    tokio::spawn({
        let served = served.clone();
        async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let counter = served.fetch_add(1, Ordering::SeqCst) + 1;

                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(read) => request.extend_from_slice(&buf[..read]),
                        }
                    }

                    let body = format!("<span id=\"counter\">{counter}</span>");
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        }
    });

    (format!("http://{addr}"), served)
}

fn create_fetch_pipeline(workers: usize) -> FetchPipeline {
    let handler = FetchHandler::new(&FetchConfig::default()).unwrap();
    let mut pipeline = Pipeline::new(random(), test_pool_config(workers, 10), handler).unwrap();
    pipeline.start().unwrap();

    pipeline
}

#[tokio::test(flavor = "multi_thread")]
async fn network_error_yields_one_error_result_and_worker_survives() {
    init_test_tracing();
    let (base_url, served) = spawn_http_server().await;
    let pipeline = create_fetch_pipeline(1);

    let failing_id = pipeline
        .submit(FetchAction::Fetch(Request::get("http://127.0.0.1:1/")))
        .unwrap();
    pipeline
        .submit(FetchAction::Fetch(Request::get(format!("{base_url}/page"))))
        .unwrap();

    let results = drain_until(&pipeline, 2).await;
    assert_eq!(results.len(), 2);

    for result in results {
        assert_eq!(result.kind(), FetchActionKind::Fetch);

        if result.id() == failing_id {
            let err = result.error().unwrap();
            assert_eq!(err.kind(), ErrorKind::NetworkConnectFailed);
            assert_eq!(err.kind().abbr(), "couldnt-connect");
        } else {
            let response = result.into_outcome().unwrap();
            assert_eq!(response.status, 200);
            assert_eq!(response.header("content-type"), Some("text/html"));
        }
    }

    assert_eq!(served.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.stats().live_workers, 1);

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn cache_and_fetch_pipelines_serve_repeated_requests_from_cache() {
    init_test_tracing();
    let (base_url, served) = spawn_http_server().await;
    let url = format!("{base_url}/page");

    let store = MemoryCacheStore::new();
    let cache_handler = CacheHandler::new(store.clone(), &CacheConfig::default());
    let mut cache = Pipeline::new(random(), test_pool_config(1, 10), cache_handler).unwrap();
    cache.start().unwrap();
    let fetch = create_fetch_pipeline(2);

    let mut bodies = Vec::new();
    for _ in 0..3 {
        // Every request goes through the cache first and only reaches the network on a miss.
        cache.submit(CacheAction::Load(Request::get(&url))).unwrap();
        let outcome = drain_until(&cache, 1)
            .await
            .remove(0)
            .into_outcome()
            .unwrap();

        match outcome {
            CacheOutcome::Hit { response, .. } => bodies.push(response.response.body),
            CacheOutcome::PassThrough(request) => {
                fetch.submit(FetchAction::Fetch(request.clone())).unwrap();
                let response = drain_until(&fetch, 1)
                    .await
                    .remove(0)
                    .into_outcome()
                    .unwrap();
                bodies.push(response.body.clone());

                cache
                    .submit(CacheAction::Save { request, response })
                    .unwrap();
                let saved = drain_until(&cache, 1).await.remove(0).into_outcome().unwrap();
                assert!(matches!(saved, CacheOutcome::Saved { .. }));
            }
            other => panic!("unexpected load outcome {other:?}"),
        }
    }

    assert_eq!(served.load(Ordering::SeqCst), 1);
    assert!(bodies.iter().all(|body| body == "<span id=\"counter\">1</span>"));

    let refreshed = Request::get(&url).with_refresh_cache(true);
    cache.submit(CacheAction::Load(refreshed)).unwrap();
    let outcome = drain_until(&cache, 1).await.remove(0).into_outcome().unwrap();
    assert!(matches!(outcome, CacheOutcome::PassThrough(_)));

    cache.shutdown_and_wait().await.unwrap();
    fetch.shutdown_and_wait().await.unwrap();
    assert!(store.is_closed().await);
}
