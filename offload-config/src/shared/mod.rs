//! Shared configuration types for offload pipelines.

mod base;
mod cache;
mod fetch;
mod pipeline;
mod pool;

pub use base::ValidationError;
pub use cache::CacheConfig;
pub use fetch::FetchConfig;
pub use pipeline::PipelineConfig;
pub use pool::WorkerPoolConfig;
