//! Macros for offload error handling.
//!
//! Provides convenience macros for creating and returning [`crate::error::OffloadError`]
//! instances with reduced boilerplate.

/// Creates an [`crate::error::OffloadError`] from error kind and description.
///
/// Accepts an optional dynamic detail, rendered with [`ToString`], and a source error after
/// the detail.
#[macro_export]
macro_rules! offload_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::OffloadError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::OffloadError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::OffloadError::from(($kind, $desc, $detail.to_string())).with_source($source)
    };
}

/// Creates an [`crate::error::OffloadError`] with a detail and returns it from the current
/// function.
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::offload_error!($kind, $desc, $detail))
    };
}
