use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::types::Response;

/// A response kept in a cache store together with the time it was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub response: Response,
    pub stored_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Wraps `response` as stored now.
    pub fn new(response: Response) -> Self {
        Self::stored_at(response, Utc::now())
    }

    pub fn stored_at(response: Response, stored_at: DateTime<Utc>) -> Self {
        Self {
            response,
            stored_at,
        }
    }

    /// Time elapsed between storing and `now`, zero if `now` is earlier.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.stored_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Returns `true` while the entry is younger than `max_age`.
    ///
    /// Without a maximum age entries never expire. A zero maximum age never matches.
    pub fn is_fresh(&self, max_age: Option<Duration>, now: DateTime<Utc>) -> bool {
        match max_age {
            Some(max_age) => self.age(now) < max_age,
            None => true,
        }
    }
}
