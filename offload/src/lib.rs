//! Offloads blocking or slow I/O from a control loop onto a bounded pool of background workers.
//!
//! A [`pipeline::Pipeline`] owns an input queue of work items, an output queue of results and
//! a fixed set of workers executing a [`workers::base::WorkHandler`]. The owner submits work
//! without blocking, throttles itself with [`pipeline::Pipeline::has_capacity`] and collects
//! results with [`pipeline::Pipeline::drain`].
//!
//! Two handlers are provided: [`cache::handler::CacheHandler`] for cache loads and saves and
//! [`transport::fetch::FetchHandler`] for HTTP requests.

pub mod cache;
pub mod concurrency;
pub mod error;
pub mod failpoints;
mod macros;
pub mod pipeline;
pub mod stats;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transport;
pub mod types;
pub mod workers;
