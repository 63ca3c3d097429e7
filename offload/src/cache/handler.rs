use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use offload_config::shared::CacheConfig;
use tracing::debug;

use crate::cache::store::CacheStore;
use crate::cache::types::CachedResponse;
use crate::error::{ErrorKind, OffloadError, OffloadResult};
use crate::failpoints::{CACHE_LOAD_BEFORE_READ, CACHE_SAVE_BEFORE_WRITE, offload_fail_point};
use crate::offload_error;
use crate::types::{Action, Method, Request, Response};
use crate::workers::base::WorkHandler;

/// Tag of a [`CacheAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheActionKind {
    Load,
    Save,
}

impl CacheActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheActionKind::Load => "load",
            CacheActionKind::Save => "save",
        }
    }
}

impl fmt::Display for CacheActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheActionKind {
    type Err = OffloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "load" => Ok(CacheActionKind::Load),
            "save" => Ok(CacheActionKind::Save),
            other => Err(offload_error!(
                ErrorKind::UnknownAction,
                "Unknown cache action",
                format!("`{other}` is not one of `load`, `save`")
            )),
        }
    }
}

/// Work accepted by a [`CacheHandler`].
#[derive(Debug, Clone)]
pub enum CacheAction {
    /// Looks up a cached response for a request about to be sent.
    Load(Request),
    /// Stores the response received for a request.
    Save { request: Request, response: Response },
}

impl Action for CacheAction {
    type Kind = CacheActionKind;

    fn kind(&self) -> CacheActionKind {
        match self {
            CacheAction::Load(_) => CacheActionKind::Load,
            CacheAction::Save { .. } => CacheActionKind::Save,
        }
    }
}

/// Result of a successful cache operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    /// A cached response was found; it replaces the network request.
    Hit {
        request: Request,
        response: CachedResponse,
    },
    /// Nothing usable was cached or the request may not be served from cache. The request
    /// goes on to normal network processing.
    PassThrough(Request),
    /// The response was written to the store.
    Saved { key: String },
    /// The response was not eligible for caching.
    SaveSkipped { key: String },
}

/// Returns `true` if `request` may be answered from the cache.
///
/// Only plain `GET` requests that neither force a refresh nor disable the cache qualify.
pub fn is_loading_allowed(request: &Request) -> bool {
    !request.refresh_cache && !request.disable_cache && request.method == Method::Get
}

/// Returns `true` if `response` to `request` may be written to the cache.
///
/// Only `GET` requests with the cache enabled and a valid response status qualify.
pub fn is_saving_allowed(request: &Request, response: &Response) -> bool {
    request.method == Method::Get
        && !request.disable_cache
        && request.is_valid_status(response.status)
}

/// Activity counters of a [`CacheHandler`].
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    saves: AtomicU64,
    skipped_saves: AtomicU64,
}

impl CacheCounters {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Loads handed back for network processing, whatever the reason.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn saves(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }

    pub fn skipped_saves(&self) -> u64 {
        self.skipped_saves.load(Ordering::Relaxed)
    }

    fn increment(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Performs cache loads and saves against store `S`.
///
/// Store errors are returned unchanged and reach the producer as error results. The store is
/// closed when the owning pipeline stops.
#[derive(Debug)]
pub struct CacheHandler<S> {
    store: S,
    default_max_age: Option<Duration>,
    counters: CacheCounters,
}

impl<S> CacheHandler<S>
where
    S: CacheStore,
{
    pub fn new(store: S, config: &CacheConfig) -> Self {
        Self {
            store,
            default_max_age: config.default_max_age(),
            counters: CacheCounters::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn counters(&self) -> &CacheCounters {
        &self.counters
    }

    async fn load(&self, request: Request) -> OffloadResult<CacheOutcome> {
        if !is_loading_allowed(&request) {
            debug!(url = %request.url, method = %request.method, "cache lookup not allowed");
            CacheCounters::increment(&self.counters.misses);

            return Ok(CacheOutcome::PassThrough(request));
        }

        offload_fail_point(CACHE_LOAD_BEFORE_READ)?;

        let max_age = request.cache_timeout().or(self.default_max_age);
        let cached = self.store.get(request.cache_key(), max_age).await?;
        match cached {
            Some(response) => {
                debug!(url = %request.url, age = ?response.age(chrono::Utc::now()), "cache hit");
                CacheCounters::increment(&self.counters.hits);

                Ok(CacheOutcome::Hit { request, response })
            }
            None => {
                debug!(url = %request.url, "cache miss");
                CacheCounters::increment(&self.counters.misses);

                Ok(CacheOutcome::PassThrough(request))
            }
        }
    }

    async fn save(&self, request: Request, response: Response) -> OffloadResult<CacheOutcome> {
        let key = request.cache_key().to_owned();

        if !is_saving_allowed(&request, &response) {
            debug!(url = %request.url, status = response.status, "response not cacheable");
            CacheCounters::increment(&self.counters.skipped_saves);

            return Ok(CacheOutcome::SaveSkipped { key });
        }

        offload_fail_point(CACHE_SAVE_BEFORE_WRITE)?;

        self.store.put(&key, response).await?;
        CacheCounters::increment(&self.counters.saves);
        debug!(%key, "response cached");

        Ok(CacheOutcome::Saved { key })
    }
}

impl<S> WorkHandler for CacheHandler<S>
where
    S: CacheStore,
{
    type Action = CacheAction;
    type Output = CacheOutcome;

    fn name() -> &'static str {
        "cache"
    }

    async fn handle(&self, action: CacheAction) -> OffloadResult<CacheOutcome> {
        match action {
            CacheAction::Load(request) => self.load(request).await,
            CacheAction::Save { request, response } => self.save(request, response).await,
        }
    }

    async fn shutdown(&self) -> OffloadResult<()> {
        debug!("closing cache store");
        self.store.close().await
    }
}
