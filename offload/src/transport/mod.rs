//! Network requests offloaded to background workers.

pub mod fetch;

use crate::pipeline::Pipeline;

/// A pipeline whose workers perform HTTP requests.
pub type FetchPipeline = Pipeline<fetch::FetchHandler>;
