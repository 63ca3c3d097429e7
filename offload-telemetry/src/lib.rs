//! Tracing setup shared by binaries and tests built on top of offload pipelines.

use std::path::PathBuf;
use std::sync::Once;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable, multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Where log events are written.
#[derive(Debug, Clone, Default)]
pub enum LogTarget {
    /// Standard output.
    #[default]
    Stdout,
    /// Daily rolling files `{directory}/{app_name}.YYYY-MM-DD`.
    RollingFile { directory: PathBuf },
}

/// Errors returned by [`init_tracing`].
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to bridge `log` records into tracing: {0}")]
    LogBridge(#[from] tracing_log::log::SetLoggerError),

    #[error("failed to install the global tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Keeps the non-blocking writer alive; logs written after the guard is dropped are lost.
#[must_use = "dropping the guard stops the background log writer"]
#[derive(Debug)]
pub struct TracingGuard {
    _writer_guard: WorkerGuard,
}

/// Installs the global tracing subscriber for `app_name`.
///
/// The filter comes from `RUST_LOG` and defaults to `{app_name}=info,offload=info`. Records
/// emitted through the `log` crate are forwarded to tracing.
pub fn init_tracing(
    app_name: &str,
    format: LogFormat,
    target: LogTarget,
) -> Result<TracingGuard, TracingError> {
    tracing_log::LogTracer::init()?;

    let (writer, writer_guard) = match target {
        LogTarget::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogTarget::RollingFile { directory } => {
            tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, app_name))
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{app_name}=info,offload=info").into());

    let fmt_layer = match format {
        LogFormat::Pretty => fmt::layer().with_writer(writer).boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(TracingGuard {
        _writer_guard: writer_guard,
    })
}

static INIT_TEST_TRACING: Once = Once::new();

/// Installs a test subscriber once per process.
///
/// Output goes through the test writer so it is captured by the harness. Set `RUST_LOG`
/// to see events, e.g. `RUST_LOG=offload=debug`.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}
