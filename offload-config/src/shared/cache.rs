use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cache pipeline configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Maximum age, in milliseconds, of a cached response that may still be served.
    ///
    /// Applies to requests that do not carry their own cache timeout. `None` means cached
    /// responses never expire.
    #[serde(default)]
    pub default_max_age_ms: Option<u64>,
}

impl CacheConfig {
    /// Returns the default maximum age as a [`Duration`], if any.
    pub fn default_max_age(&self) -> Option<Duration> {
        self.default_max_age_ms.map(Duration::from_millis)
    }
}
