use std::fmt;
use std::future::Future;

use crate::error::OffloadResult;
use crate::types::{Action, ResultItem};

/// Identifier of a worker inside its pipeline, from `0` to `workers - 1`.
pub type WorkerId = usize;

/// Lifecycle of a single worker.
///
/// A worker is [`WorkerState::Running`] while waiting for work,
/// [`WorkerState::Processing`] between a successful pop and the push of the matching
/// result, and [`WorkerState::Stopped`] once it observed shutdown or a closed input queue.
/// [`WorkerState::Stopped`] is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Processing,
    Stopped,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Running => f.write_str("running"),
            WorkerState::Processing => f.write_str("processing"),
            WorkerState::Stopped => f.write_str("stopped"),
        }
    }
}

/// Executes the operations offloaded to a pipeline.
///
/// [`WorkHandler`] is the seam where concrete I/O plugs into the worker pool: cache reads
/// and writes, network requests or anything else that would stall the producer's loop. One
/// handler instance is shared by every worker of a pipeline, so implementations must be
/// safe to call concurrently.
///
/// Returning an error from [`WorkHandler::handle`] reports a failed operation; the error is
/// delivered to the producer as a result and the worker moves on to the next item. A panic
/// terminates the calling worker and is reported by [`crate::pipeline::Pipeline::wait`].
pub trait WorkHandler: Send + Sync + 'static {
    /// Actions accepted by this handler.
    type Action: Action;
    /// Value produced by a successful operation.
    type Output: Send + 'static;

    /// Returns the name of the handler for logging.
    fn name() -> &'static str;

    /// Executes a single action.
    ///
    /// The future is always polled under the pipeline's operation timeout and is dropped
    /// when that timeout elapses.
    fn handle(
        &self,
        action: Self::Action,
    ) -> impl Future<Output = OffloadResult<Self::Output>> + Send;

    /// Releases resources held by the handler.
    ///
    /// Called once after every worker of the pipeline stopped.
    fn shutdown(&self) -> impl Future<Output = OffloadResult<()>> + Send {
        async { Ok(()) }
    }
}

/// Tag type of the actions accepted by `H`.
pub type HandlerKind<H> = <<H as WorkHandler>::Action as Action>::Kind;

/// Result item produced by workers running handler `H`.
pub type HandlerResult<H> = ResultItem<HandlerKind<H>, <H as WorkHandler>::Output>;
