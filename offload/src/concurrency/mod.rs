//! Coordination primitives shared between a pipeline and its workers.
//!
//! # Coordination Patterns
//!
//! ## Work Transfer
//!
//! The [`queue`] module provides the unbounded FIFO used for both directions of a pipeline.
//! Producers never block on it; workers wait on it with a timeout so they can re-check the
//! shutdown flag between polls.
//!
//! ## Graceful Shutdown
//!
//! The [`shutdown`] module implements a watch based flag set once by the owner of the
//! pipeline. Workers check it when a pop times out, so they stop only after the input queue
//! ran dry and an operation in flight always runs to completion (or to its own timeout).
//!
//! ## Pausing
//!
//! The [`pause`] module lets the owner hold workers before their next pop without touching the
//! queues, so submitted items stay queued until the pipeline resumes.

pub mod pause;
pub mod queue;
pub mod shutdown;
