use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Tracks how many workers of a pipeline are alive and how many are processing an item.
///
/// It also counts pending items: submitted items whose result has not been pushed yet. An
/// item stays pending from submission until a worker pushed its result, with no gap while
/// it moves from the input queue to the worker.
///
/// Marks are held through guards, so a worker that panics in the middle of an operation
/// still clears them while its task unwinds.
#[derive(Debug, Default)]
pub struct WorkerActivity {
    live: AtomicUsize,
    busy: AtomicUsize,
    pending: AtomicUsize,
}

impl WorkerActivity {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Marks one worker as alive until the returned guard is dropped.
    pub fn mark_live(self: &Arc<Self>) -> ActivityGuard {
        ActivityGuard::new(self.clone(), ActivityMark::Live)
    }

    /// Marks one worker as processing an item until the returned guard is dropped.
    pub fn mark_busy(self: &Arc<Self>) -> ActivityGuard {
        ActivityGuard::new(self.clone(), ActivityMark::Busy)
    }

    /// Counts one submitted item as pending. Called before the item becomes visible to workers.
    pub fn record_pending(&self) {
        self.pending.fetch_add(1, Ordering::AcqRel);
    }

    /// Withdraws a pending mark for an item that never reached the input queue.
    pub fn cancel_pending(&self) {
        self.pending.fetch_sub(1, Ordering::AcqRel);
    }

    /// Takes over the pending mark of a popped item; it is cleared when the guard is dropped.
    pub fn adopt_pending(self: &Arc<Self>) -> ActivityGuard {
        ActivityGuard {
            activity: self.clone(),
            mark: ActivityMark::Pending,
        }
    }

    pub fn pending_items(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    pub fn busy_workers(&self) -> usize {
        self.busy.load(Ordering::Acquire)
    }

    fn counter(&self, mark: ActivityMark) -> &AtomicUsize {
        match mark {
            ActivityMark::Live => &self.live,
            ActivityMark::Busy => &self.busy,
            ActivityMark::Pending => &self.pending,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ActivityMark {
    Live,
    Busy,
    Pending,
}

/// Clears a [`WorkerActivity`] mark on drop.
#[must_use = "the mark is cleared as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ActivityGuard {
    activity: Arc<WorkerActivity>,
    mark: ActivityMark,
}

impl ActivityGuard {
    fn new(activity: Arc<WorkerActivity>, mark: ActivityMark) -> Self {
        activity.counter(mark).fetch_add(1, Ordering::AcqRel);

        Self { activity, mark }
    }
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.activity.counter(self.mark).fetch_sub(1, Ordering::AcqRel);
    }
}
