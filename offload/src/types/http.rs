use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, OffloadError};
use crate::offload_error;

/// HTTP method of a [`Request`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = OffloadError;

    /// Parses a method name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(offload_error!(
                ErrorKind::InvalidRequest,
                "Unsupported HTTP method",
                format!("method `{other}` is not supported")
            )),
        }
    }
}

/// A request handed to the cache or fetch workers.
///
/// Besides the target, a request carries the per request cache policy: whether a cached
/// copy may be served, how old that copy may be, and which additional status codes make a
/// response worth caching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub url: String,
    #[serde(default)]
    pub method: Method,
    /// Skips the cache lookup and forces a network request.
    #[serde(default)]
    pub refresh_cache: bool,
    /// Disables both cache lookups and cache writes.
    #[serde(default)]
    pub disable_cache: bool,
    /// Maximum age, in milliseconds, of a cached response served for this request.
    #[serde(default)]
    pub cache_timeout_ms: Option<u64>,
    /// Status codes accepted in addition to the default valid range.
    #[serde(default)]
    pub valid_status: Vec<u16>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            refresh_cache: false,
            disable_cache: false,
            cache_timeout_ms: None,
            valid_status: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn with_refresh_cache(mut self, refresh_cache: bool) -> Self {
        self.refresh_cache = refresh_cache;
        self
    }

    pub fn with_disable_cache(mut self, disable_cache: bool) -> Self {
        self.disable_cache = disable_cache;
        self
    }

    /// Sets the maximum age of a cached response, saturating at `u64::MAX` milliseconds.
    pub fn with_cache_timeout(mut self, cache_timeout: Duration) -> Self {
        self.cache_timeout_ms = Some(u64::try_from(cache_timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_valid_status(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.valid_status.extend(statuses);
        self
    }

    pub fn cache_timeout(&self) -> Option<Duration> {
        self.cache_timeout_ms.map(Duration::from_millis)
    }

    /// Key under which responses to this request are cached.
    pub fn cache_key(&self) -> &str {
        &self.url
    }

    /// Returns `true` if a response with `status` counts as a successful network result.
    ///
    /// Valid statuses are everything below `400`, `404`, and the request's extra statuses.
    pub fn is_valid_status(&self, status: u16) -> bool {
        status < 400 || status == 404 || self.valid_status.contains(&status)
    }
}

/// A response received from the network or loaded from a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Final URL, after redirects.
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the first value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
