use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// HTTP transport configuration used by fetch workers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct FetchConfig {
    /// Maximum time, in milliseconds, to establish a connection.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Maximum time, in milliseconds, for a whole request including the body.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Whether `3xx` responses are followed.
    #[serde(default = "default_follow_redirects")]
    pub follow_redirects: bool,
    /// Maximum number of redirects followed for one request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl FetchConfig {
    /// Default connect timeout: 3 seconds.
    pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3_000;

    /// Default request timeout: 15 seconds.
    pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

    /// Default redirect limit.
    pub const DEFAULT_MAX_REDIRECTS: usize = 10;

    /// Default user agent.
    pub const DEFAULT_USER_AGENT: &'static str = concat!("offload/", env!("CARGO_PKG_VERSION"));

    /// Validates transport settings.
    ///
    /// Ensures the request timeout is non-zero and not shorter than the connect timeout.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.request_timeout_ms == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "fetch.request_timeout_ms".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        if self.connect_timeout_ms > self.request_timeout_ms {
            return Err(ValidationError::InvalidFieldValue {
                field: "fetch.connect_timeout_ms".to_string(),
                constraint: "must be <= request_timeout_ms".to_string(),
            });
        }

        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            follow_redirects: default_follow_redirects(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_connect_timeout_ms() -> u64 {
    FetchConfig::DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_request_timeout_ms() -> u64 {
    FetchConfig::DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_follow_redirects() -> bool {
    true
}

fn default_max_redirects() -> usize {
    FetchConfig::DEFAULT_MAX_REDIRECTS
}

fn default_user_agent() -> String {
    FetchConfig::DEFAULT_USER_AGENT.to_string()
}
