use serde::{Deserialize, Serialize};

use crate::shared::{CacheConfig, FetchConfig, ValidationError, WorkerPoolConfig};

/// Configuration for an offload pipeline.
///
/// Groups the pool settings with the settings of the built-in handlers. Handlers that are
/// not used by a pipeline simply ignore their section.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Worker pool settings.
    #[serde(default)]
    pub pool: WorkerPoolConfig,
    /// Cache handler settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Fetch handler settings.
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl PipelineConfig {
    /// Validates every section of the pipeline configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.pool.validate()?;
        self.fetch.validate()?;

        Ok(())
    }
}
