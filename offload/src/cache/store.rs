use std::future::Future;
use std::time::Duration;

use crate::cache::types::CachedResponse;
use crate::error::OffloadResult;
use crate::types::Response;

/// Storage backend for cached responses.
///
/// [`CacheStore`] implementations decide where responses live. They are shared by every
/// worker of a cache pipeline, so they must handle concurrent access.
pub trait CacheStore: Send + Sync + 'static {
    /// Returns the entry stored under `key` if it is younger than `max_age`.
    ///
    /// Expired entries are reported as missing but not removed.
    fn get(
        &self,
        key: &str,
        max_age: Option<Duration>,
    ) -> impl Future<Output = OffloadResult<Option<CachedResponse>>> + Send;

    /// Stores `response` under `key`, replacing any previous entry.
    fn put(&self, key: &str, response: Response) -> impl Future<Output = OffloadResult<()>> + Send;

    /// Removes the entry stored under `key`, returning whether one existed.
    fn remove(&self, key: &str) -> impl Future<Output = OffloadResult<bool>> + Send;

    /// Removes every entry.
    fn clear(&self) -> impl Future<Output = OffloadResult<()>> + Send;

    /// Number of stored entries, expired ones included.
    fn size(&self) -> impl Future<Output = OffloadResult<usize>> + Send;

    /// Releases the resources of the store.
    ///
    /// Called once when the owning pipeline stops.
    fn close(&self) -> impl Future<Output = OffloadResult<()>> + Send {
        async { Ok(()) }
    }
}
