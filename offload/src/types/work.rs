use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::error::{OffloadError, OffloadResult};

/// Identifier assigned to a work item when it is submitted.
///
/// Identifiers increase monotonically within a pipeline and are copied onto the matching
/// [`ResultItem`], which is the only way to correlate results with submissions since
/// results from different workers arrive in any order.
pub type WorkItemId = u64;

/// An operation that can be offloaded to a worker.
///
/// Implementors are closed enums: the variant is the action tag and its fields are the
/// payload, so a worker can never receive a payload of the wrong shape.
pub trait Action: fmt::Debug + Send + 'static {
    /// Tag identifying the action variant without its payload.
    ///
    /// Parsing a tag from a string must reject unknown names with
    /// [`crate::error::ErrorKind::UnknownAction`].
    type Kind: Copy
        + Eq
        + Hash
        + fmt::Debug
        + fmt::Display
        + FromStr<Err = OffloadError>
        + Send
        + Sync
        + 'static;

    /// Returns the tag of this action.
    fn kind(&self) -> Self::Kind;
}

/// A unit of work sitting in the input queue.
#[derive(Debug)]
pub struct WorkItem<A> {
    id: WorkItemId,
    action: A,
    timeout: Option<Duration>,
    submitted_at: Instant,
}

impl<A: Action> WorkItem<A> {
    pub(crate) fn new(id: WorkItemId, action: A, timeout: Option<Duration>) -> Self {
        Self {
            id,
            action,
            timeout,
            submitted_at: Instant::now(),
        }
    }

    pub fn id(&self) -> WorkItemId {
        self.id
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    /// Per item override of the pipeline operation timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Time spent since submission, including time waiting in the queue.
    pub fn queued_for(&self) -> Duration {
        self.submitted_at.elapsed()
    }

    pub fn into_action(self) -> A {
        self.action
    }
}

/// Outcome of exactly one processed [`WorkItem`].
///
/// An `Err` outcome reports an operation that failed or timed out; the worker that produced
/// it keeps running.
#[derive(Debug)]
pub struct ResultItem<K, O> {
    id: WorkItemId,
    kind: K,
    outcome: OffloadResult<O>,
    elapsed: Duration,
}

impl<K: Copy, O> ResultItem<K, O> {
    pub(crate) fn new(id: WorkItemId, kind: K, outcome: OffloadResult<O>, elapsed: Duration) -> Self {
        Self {
            id,
            kind,
            outcome,
            elapsed,
        }
    }

    /// Identifier of the work item this result belongs to.
    pub fn id(&self) -> WorkItemId {
        self.id
    }

    /// Tag of the action that produced this result.
    pub fn kind(&self) -> K {
        self.kind
    }

    pub fn outcome(&self) -> &OffloadResult<O> {
        &self.outcome
    }

    pub fn into_outcome(self) -> OffloadResult<O> {
        self.outcome
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Returns the error indicator of a failed operation.
    pub fn error(&self) -> Option<&OffloadError> {
        self.outcome.as_ref().err()
    }

    /// Time the handler spent on the operation.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
