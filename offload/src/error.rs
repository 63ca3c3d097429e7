//! Error types and result definitions for offload pipelines.
//!
//! [`OffloadError`] carries an [`ErrorKind`] for programmatic handling, a static description,
//! an optional dynamic detail, an optional source error and the callsite where it was built.
//! Errors coming from several workers are aggregated into a single value.

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::Location;
use std::sync::Arc;

use offload_config::shared::ValidationError;

/// Convenient result type for offload operations.
pub type OffloadResult<T> = Result<T, OffloadError>;

/// Payload stored for single [`OffloadError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
}

/// Main error type for offload operations.
#[derive(Debug, Clone)]
pub struct OffloadError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    Single(ErrorPayload),
    /// Multiple aggregated errors, mainly produced when several workers fail.
    Many {
        errors: Vec<OffloadError>,
        location: &'static Location<'static>,
    },
}

/// Categories of errors that can occur in a pipeline.
///
/// Operational kinds are recovered inside a worker and delivered to the producer as error
/// results. Protocol and lifecycle kinds are returned directly from pipeline methods.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Protocol Errors
    UnknownAction,
    WorkerPanic,

    // Operation Errors
    OperationFailed,
    OperationTimedOut,

    // Cache Errors
    CacheReadFailed,
    CacheWriteFailed,

    // Network Errors
    NetworkTimeout,
    NetworkConnectFailed,
    NetworkRedirectLimit,
    NetworkError,
    InvalidRequest,
    InvalidResponse,

    // Lifecycle Errors
    PipelineShutdown,
    PipelineAlreadyStarted,
    InvalidState,

    // Configuration Errors
    ConfigError,

    // Unknown / Uncategorized
    Unknown,

    // Error raised by a fail point in fault injection tests.
    #[cfg(feature = "failpoints")]
    InjectedFailure,
}

impl ErrorKind {
    /// Returns `true` for failures of the operation itself, which workers turn into error
    /// results instead of stopping.
    pub fn is_operational(&self) -> bool {
        match self {
            ErrorKind::OperationFailed
            | ErrorKind::OperationTimedOut
            | ErrorKind::CacheReadFailed
            | ErrorKind::CacheWriteFailed
            | ErrorKind::NetworkTimeout
            | ErrorKind::NetworkConnectFailed
            | ErrorKind::NetworkRedirectLimit
            | ErrorKind::NetworkError
            | ErrorKind::InvalidRequest
            | ErrorKind::InvalidResponse => true,
            #[cfg(feature = "failpoints")]
            ErrorKind::InjectedFailure => true,
            ErrorKind::UnknownAction
            | ErrorKind::WorkerPanic
            | ErrorKind::PipelineShutdown
            | ErrorKind::PipelineAlreadyStarted
            | ErrorKind::InvalidState
            | ErrorKind::ConfigError
            | ErrorKind::Unknown => false,
        }
    }

    /// Returns a short, stable tag suitable for logs and counters.
    pub fn abbr(&self) -> &'static str {
        match self {
            ErrorKind::UnknownAction => "unknown-action",
            ErrorKind::WorkerPanic => "worker-panic",
            ErrorKind::OperationFailed => "operation-failed",
            ErrorKind::OperationTimedOut => "operation-timedout",
            ErrorKind::CacheReadFailed => "cache-read-failed",
            ErrorKind::CacheWriteFailed => "cache-write-failed",
            ErrorKind::NetworkTimeout => "network-timedout",
            ErrorKind::NetworkConnectFailed => "couldnt-connect",
            ErrorKind::NetworkRedirectLimit => "too-many-redirects",
            ErrorKind::NetworkError => "network-error",
            ErrorKind::InvalidRequest => "invalid-request",
            ErrorKind::InvalidResponse => "invalid-response",
            ErrorKind::PipelineShutdown => "pipeline-shutdown",
            ErrorKind::PipelineAlreadyStarted => "pipeline-already-started",
            ErrorKind::InvalidState => "invalid-state",
            ErrorKind::ConfigError => "config-error",
            ErrorKind::Unknown => "unknown",
            #[cfg(feature = "failpoints")]
            ErrorKind::InjectedFailure => "injected-failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbr())
    }
}

impl OffloadError {
    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For aggregated errors, returns the kind of the first error or [`ErrorKind::Unknown`]
    /// if the aggregate is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error, flattened.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => {
                errors.iter().flat_map(|err| err.kinds()).collect()
            }
        }
    }

    /// Returns the static description of this error.
    ///
    /// Aggregated errors have no description of their own and return the first one.
    pub fn description(&self) -> &str {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.description.as_ref(),
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.description())
                .unwrap_or("aggregated errors"),
        }
    }

    /// Returns the dynamic detail, if any.
    ///
    /// For aggregated errors, returns the detail of the first error that has one.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the callsite where this error was created.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches an originating error and returns the modified instance.
    ///
    /// Has no effect on aggregated errors, which forward their first inner error as source.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }

        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
    ) -> Self {
        OffloadError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source: None,
                location: Location::caller(),
            }),
        }
    }
}

impl PartialEq for OffloadError {
    fn eq(&self, other: &OffloadError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (ErrorRepr::Many { errors: a, .. }, ErrorRepr::Many { errors: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Hash for OffloadError {
    /// Hashes only the kind and static description so repeated occurrences group together.
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.repr).hash(state);
        match &self.repr {
            ErrorRepr::Single(payload) => {
                payload.kind.hash(state);
                payload.description.hash(state);
            }
            ErrorRepr::Many { errors, .. } => {
                errors.len().hash(state);
                for error in errors {
                    error.hash(state);
                }
            }
        }
    }
}

impl fmt::Display for OffloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let location = payload.location;
                write!(
                    f,
                    "[{:?}] {} @ {}:{}",
                    payload.kind,
                    payload.description,
                    location.file(),
                    location.line()
                )?;

                if let Some(detail) = payload.detail.as_deref() {
                    for (index, line) in detail.lines().enumerate() {
                        if index == 0 {
                            write!(f, "\n  Detail: {line}")?;
                        } else {
                            write!(f, "\n          {line}")?;
                        }
                    }
                }

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                write!(
                    f,
                    "[Many] {} error(s) aggregated @ {}:{}",
                    errors.len(),
                    location.file(),
                    location.line()
                )?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = error.to_string();
                    for (line_index, line) in rendered.lines().enumerate() {
                        if line_index == 0 {
                            write!(f, "\n  {}. {line}", index + 1)?;
                        } else {
                            write!(f, "\n     {line}")?;
                        }
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for OffloadError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source.as_ref() as &(dyn error::Error + 'static)),
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

/// Creates an [`OffloadError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for OffloadError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> OffloadError {
        OffloadError::from_components(kind, Cow::Borrowed(desc), None)
    }
}

/// Creates an [`OffloadError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for OffloadError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> OffloadError {
        OffloadError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()))
    }
}

/// Aggregates several errors.
///
/// A vector with exactly one error yields that error unchanged.
impl<E> From<Vec<E>> for OffloadError
where
    E: Into<OffloadError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> OffloadError {
        let location = Location::caller();
        let mut errors: Vec<OffloadError> = errors.into_iter().map(Into::into).collect();

        if errors.len() == 1 {
            if let Some(error) = errors.pop() {
                return error;
            }
        }

        OffloadError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

/// Converts configuration validation failures into [`ErrorKind::ConfigError`].
impl From<ValidationError> for OffloadError {
    #[track_caller]
    fn from(err: ValidationError) -> OffloadError {
        let detail = err.to_string();
        OffloadError::from_components(
            ErrorKind::ConfigError,
            Cow::Borrowed("Invalid pipeline configuration"),
            Some(Cow::Owned(detail)),
        )
        .with_source(err)
    }
}

/// Converts [`reqwest::Error`] into the matching network [`ErrorKind`].
///
/// The failing URL, when known, is kept in the detail.
impl From<reqwest::Error> for OffloadError {
    #[track_caller]
    fn from(err: reqwest::Error) -> OffloadError {
        let (kind, description) = if err.is_timeout() {
            (ErrorKind::NetworkTimeout, "HTTP request timed out")
        } else if err.is_connect() {
            (ErrorKind::NetworkConnectFailed, "HTTP connection failed")
        } else if err.is_redirect() {
            (ErrorKind::NetworkRedirectLimit, "Too many HTTP redirects")
        } else if err.is_builder() {
            (ErrorKind::InvalidRequest, "HTTP request could not be built")
        } else if err.is_body() || err.is_decode() {
            (ErrorKind::InvalidResponse, "HTTP response body could not be read")
        } else {
            (ErrorKind::NetworkError, "HTTP request failed")
        };

        let detail = match err.url() {
            Some(url) => format!("{url}: {err}"),
            None => err.to_string(),
        };

        OffloadError::from_components(kind, Cow::Borrowed(description), Some(Cow::Owned(detail)))
            .with_source(err)
    }
}
