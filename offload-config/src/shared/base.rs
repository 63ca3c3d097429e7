use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The worker pool must have at least one worker.
    #[error("`pool.workers` cannot be zero")]
    WorkersZero,
    /// Every operation dispatched to a worker needs a bounded timeout.
    #[error("`pool.operation_timeout_ms` cannot be zero")]
    OperationTimeoutZero,
    /// A field holds a value outside of its allowed range.
    #[error("Invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
}
