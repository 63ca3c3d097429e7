use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::bail;
use crate::cache::store::CacheStore;
use crate::cache::types::CachedResponse;
use crate::error::{ErrorKind, OffloadResult};
use crate::types::Response;

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, CachedResponse>,
    closed: bool,
}

/// In-memory cache store.
///
/// [`MemoryCacheStore`] keeps every response in a map guarded by an async mutex. Clones share
/// the same entries, which lets tests inspect a store handed to a pipeline. Entries are lost
/// when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `response` under `key` as if it was stored at `stored_at`.
    pub async fn insert_at(
        &self,
        key: &str,
        response: Response,
        stored_at: DateTime<Utc>,
    ) -> OffloadResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            bail!(
                ErrorKind::CacheWriteFailed,
                "Cache store is closed",
                format!("cannot store `{key}`")
            );
        }

        inner
            .entries
            .insert(key.to_owned(), CachedResponse::stored_at(response, stored_at));

        Ok(())
    }

    /// Returns `true` once [`CacheStore::close`] was called.
    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }
}

impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str, max_age: Option<Duration>) -> OffloadResult<Option<CachedResponse>> {
        let inner = self.inner.lock().await;
        if inner.closed {
            bail!(
                ErrorKind::CacheReadFailed,
                "Cache store is closed",
                format!("cannot read `{key}`")
            );
        }

        let now = Utc::now();
        let entry = inner
            .entries
            .get(key)
            .filter(|entry| entry.is_fresh(max_age, now))
            .cloned();

        Ok(entry)
    }

    async fn put(&self, key: &str, response: Response) -> OffloadResult<()> {
        self.insert_at(key, response, Utc::now()).await
    }

    async fn remove(&self, key: &str) -> OffloadResult<bool> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            bail!(
                ErrorKind::CacheWriteFailed,
                "Cache store is closed",
                format!("cannot remove `{key}`")
            );
        }

        Ok(inner.entries.remove(key).is_some())
    }

    async fn clear(&self) -> OffloadResult<()> {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();

        Ok(())
    }

    async fn size(&self) -> OffloadResult<usize> {
        let inner = self.inner.lock().await;

        Ok(inner.entries.len())
    }

    async fn close(&self) -> OffloadResult<()> {
        let mut inner = self.inner.lock().await;
        inner.closed = true;

        Ok(())
    }
}
