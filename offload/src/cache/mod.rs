//! Cache lookups and writes offloaded from a crawler loop.
//!
//! The owner of a [`CachePipeline`] submits [`handler::CacheAction::Load`] before sending a
//! request to the network and [`handler::CacheAction::Save`] after a response arrived. A load
//! either produces a cached response or hands the request back for normal network processing.

pub mod handler;
pub mod memory;
pub mod store;
pub mod types;

use crate::pipeline::Pipeline;

/// A pipeline whose workers read and write cache store `S`.
pub type CachePipeline<S> = Pipeline<handler::CacheHandler<S>>;
