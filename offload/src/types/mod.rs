//! Common types exchanged between a pipeline, its producer and its workers.
//!
//! Includes the work and result items moved through the queues and the HTTP request and
//! response descriptions handled by the cache and fetch workers.

mod http;
mod work;

pub use http::*;
pub use work::*;
