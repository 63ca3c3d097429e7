use std::fmt;
use std::str::FromStr;

use offload_config::shared::FetchConfig;
use reqwest::redirect;
use tracing::debug;

use crate::error::{ErrorKind, OffloadError, OffloadResult};
use crate::offload_error;
use crate::types::{Action, Method, Request, Response};
use crate::workers::base::WorkHandler;

/// Tag of a [`FetchAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchActionKind {
    Fetch,
}

impl fmt::Display for FetchActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchActionKind::Fetch => f.write_str("fetch"),
        }
    }
}

impl FromStr for FetchActionKind {
    type Err = OffloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fetch" => Ok(FetchActionKind::Fetch),
            other => Err(offload_error!(
                ErrorKind::UnknownAction,
                "Unknown fetch action",
                format!("`{other}` is not `fetch`")
            )),
        }
    }
}

/// Work accepted by a [`FetchHandler`].
#[derive(Debug, Clone)]
pub enum FetchAction {
    Fetch(Request),
}

impl Action for FetchAction {
    type Kind = FetchActionKind;

    fn kind(&self) -> FetchActionKind {
        match self {
            FetchAction::Fetch(_) => FetchActionKind::Fetch,
        }
    }
}

/// Performs HTTP requests with a shared [`reqwest::Client`].
///
/// Every response is returned, whatever its status; deciding whether a status is acceptable
/// is left to the producer (see [`Request::is_valid_status`]). Transport failures are
/// classified into the network [`ErrorKind`]s.
#[derive(Debug, Clone)]
pub struct FetchHandler {
    client: reqwest::Client,
}

impl FetchHandler {
    /// Builds the HTTP client described by `config`.
    pub fn new(config: &FetchConfig) -> OffloadResult<Self> {
        config.validate()?;

        let redirect_policy = if config.follow_redirects {
            redirect::Policy::limited(config.max_redirects)
        } else {
            redirect::Policy::none()
        };

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .redirect(redirect_policy)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|err| {
                offload_error!(
                    ErrorKind::ConfigError,
                    "HTTP client could not be built",
                    err,
                    source: err
                )
            })?;

        Ok(Self { client })
    }

    async fn fetch(&self, request: Request) -> OffloadResult<Response> {
        debug!(url = %request.url, method = %request.method, "sending request");

        let response = self
            .client
            .request(to_reqwest_method(request.method), &request.url)
            .send()
            .await?;

        let url = response.url().to_string();
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_owned(), value.to_owned()))
            })
            .collect();
        let body = response.bytes().await?;

        debug!(%url, status, bytes = body.len(), "received response");

        Ok(Response {
            url,
            status,
            headers,
            body,
        })
    }
}

impl WorkHandler for FetchHandler {
    type Action = FetchAction;
    type Output = Response;

    fn name() -> &'static str {
        "fetch"
    }

    async fn handle(&self, action: FetchAction) -> OffloadResult<Response> {
        match action {
            FetchAction::Fetch(request) => self.fetch(request).await,
        }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}
