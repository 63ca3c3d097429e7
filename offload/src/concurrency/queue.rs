//! Unbounded multi-producer multi-consumer FIFO used for the input and output queues.
//!
//! Items live in a lock-free [`SegQueue`]; a counting [`Semaphore`] holds exactly one permit per
//! queued item so consumers can wait for work without polling. Every push stores the item
//! before releasing its permit and every pop consumes a permit before taking an item, so a
//! consumer holding a permit always finds an item.

use std::fmt;

use crossbeam_queue::SegQueue;
use tokio::sync::Semaphore;

pub struct WorkQueue<T> {
    items: SegQueue<T>,
    available: Semaphore,
}

impl<T> WorkQueue<T> {
    /// Creates an empty, open queue.
    pub fn new() -> Self {
        Self {
            items: SegQueue::new(),
            available: Semaphore::new(0),
        }
    }

    /// Appends an item. Never blocks.
    ///
    /// Returns the item back if the queue was closed.
    pub fn push(&self, item: T) -> Result<(), T> {
        if self.available.is_closed() {
            return Err(item);
        }

        self.items.push(item);
        self.available.add_permits(1);

        Ok(())
    }

    /// Waits for the next item.
    ///
    /// Returns `None` once the queue is closed. Cancel safe: dropping the future before it
    /// resolves never loses an item.
    pub async fn pop(&self) -> Option<T> {
        let permit = self.available.acquire().await.ok()?;
        permit.forget();

        self.items.pop()
    }

    /// Takes the next item if one is immediately available.
    pub fn try_pop(&self) -> Option<T> {
        let permit = self.available.try_acquire().ok()?;
        permit.forget();

        self.items.pop()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Closes the queue, waking every waiting consumer with `None`.
    ///
    /// Items still queued stay in memory until the queue is dropped and are never handed out.
    pub fn close(&self) {
        self.available.close();
    }

    pub fn is_closed(&self) -> bool {
        self.available.is_closed()
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for WorkQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkQueue")
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
