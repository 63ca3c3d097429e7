//! Utilities for testing offload pipelines.
//!
//! - `failpoints` - fail point configuration scoped to a test (with the `failpoints` feature)
//! - [`handler`] - a scriptable [`crate::workers::base::WorkHandler`] recording what it ran
//! - [`notify`] - async notification with a timeout so waiting tests fail instead of hanging
//! - [`pipeline`] - pipeline construction and result collection helpers
//!
//! Helpers panic on unexpected states; they are only meant for tests.

#[cfg(feature = "failpoints")]
pub mod failpoints;
pub mod handler;
pub mod notify;
pub mod pipeline;
