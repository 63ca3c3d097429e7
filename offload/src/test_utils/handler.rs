use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, Notify, Semaphore};

use crate::error::{ErrorKind, OffloadError, OffloadResult};
use crate::offload_error;
use crate::test_utils::notify::TimedNotify;
use crate::types::Action;
use crate::workers::base::WorkHandler;

/// Tag of a [`TestAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestActionKind {
    Echo,
    Fail,
    Sleep,
    Block,
    Panic,
}

impl fmt::Display for TestActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestActionKind::Echo => "echo",
            TestActionKind::Fail => "fail",
            TestActionKind::Sleep => "sleep",
            TestActionKind::Block => "block",
            TestActionKind::Panic => "panic",
        };

        f.write_str(name)
    }
}

impl FromStr for TestActionKind {
    type Err = OffloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "echo" => Ok(TestActionKind::Echo),
            "fail" => Ok(TestActionKind::Fail),
            "sleep" => Ok(TestActionKind::Sleep),
            "block" => Ok(TestActionKind::Block),
            "panic" => Ok(TestActionKind::Panic),
            other => Err(offload_error!(
                ErrorKind::UnknownAction,
                "Unknown test action",
                format!("`{other}` is not a test action")
            )),
        }
    }
}

/// Scripted operations run by a [`RecordingHandler`].
#[derive(Debug, Clone)]
pub enum TestAction {
    /// Returns the payload.
    Echo(u32),
    /// Fails with a simulated network error.
    Fail(u32),
    /// Returns the payload after sleeping.
    Sleep { payload: u32, duration: Duration },
    /// Returns the payload once [`RecordingHandler::release`] grants a permit.
    Block(u32),
    /// Panics, killing the worker that runs it.
    Panic,
}

impl Action for TestAction {
    type Kind = TestActionKind;

    fn kind(&self) -> TestActionKind {
        match self {
            TestAction::Echo(_) => TestActionKind::Echo,
            TestAction::Fail(_) => TestActionKind::Fail,
            TestAction::Sleep { .. } => TestActionKind::Sleep,
            TestAction::Block(_) => TestActionKind::Block,
            TestAction::Panic => TestActionKind::Panic,
        }
    }
}

/// A [`WorkHandler`] that records every payload it completed.
///
/// Clones share their state, so a test can keep a clone while the pipeline owns another.
#[derive(Debug, Clone)]
pub struct RecordingHandler {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    completed: Mutex<Vec<u32>>,
    started: AtomicUsize,
    blocked: AtomicUsize,
    block_started: Arc<Notify>,
    gate: Semaphore,
    shutdown_calls: AtomicUsize,
}

impl RecordingHandler {
    pub fn new() -> Self {
        let inner = Inner {
            completed: Mutex::new(Vec::new()),
            started: AtomicUsize::new(0),
            blocked: AtomicUsize::new(0),
            block_started: Arc::new(Notify::new()),
            gate: Semaphore::new(0),
            shutdown_calls: AtomicUsize::new(0),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Payloads of successfully completed actions, in completion order.
    pub async fn completed(&self) -> Vec<u32> {
        self.inner.completed.lock().await.clone()
    }

    /// Number of actions a worker started, whatever their outcome.
    pub fn started(&self) -> usize {
        self.inner.started.load(Ordering::Acquire)
    }

    /// Lets `count` blocked actions complete.
    pub fn release(&self, count: usize) {
        self.inner.gate.add_permits(count);
    }

    /// Waits until at least `count` [`TestAction::Block`] actions started.
    ///
    /// # Panics
    ///
    /// Panics if they do not start within the default notification timeout.
    pub async fn wait_for_blocked(&self, count: usize) {
        let notify = TimedNotify::new(self.inner.block_started.clone());
        while self.inner.blocked.load(Ordering::Acquire) < count {
            notify.notified().await;
        }
    }

    /// Number of times [`WorkHandler::shutdown`] was called.
    pub fn shutdown_calls(&self) -> usize {
        self.inner.shutdown_calls.load(Ordering::Acquire)
    }

    async fn record(&self, payload: u32) -> u32 {
        self.inner.completed.lock().await.push(payload);
        payload
    }
}

impl WorkHandler for RecordingHandler {
    type Action = TestAction;
    type Output = u32;

    fn name() -> &'static str {
        "recording"
    }

    async fn handle(&self, action: TestAction) -> OffloadResult<u32> {
        self.inner.started.fetch_add(1, Ordering::AcqRel);

        match action {
            TestAction::Echo(payload) => Ok(self.record(payload).await),
            TestAction::Fail(payload) => Err(offload_error!(
                ErrorKind::NetworkError,
                "Simulated network failure",
                format!("payload {payload} failed on purpose")
            )),
            TestAction::Sleep { payload, duration } => {
                tokio::time::sleep(duration).await;
                Ok(self.record(payload).await)
            }
            TestAction::Block(payload) => {
                self.inner.blocked.fetch_add(1, Ordering::AcqRel);
                self.inner.block_started.notify_one();

                let permit = self.inner.gate.acquire().await.map_err(|_| {
                    offload_error!(ErrorKind::InvalidState, "Test gate was closed")
                })?;
                permit.forget();

                Ok(self.record(payload).await)
            }
            TestAction::Panic => panic!("test action panicked on purpose"),
        }
    }

    async fn shutdown(&self) -> OffloadResult<()> {
        self.inner.shutdown_calls.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

impl Default for RecordingHandler {
    fn default() -> Self {
        Self::new()
    }
}
