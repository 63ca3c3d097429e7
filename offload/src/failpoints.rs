use fail::fail_point;

use crate::error::OffloadResult;

pub const WORKER_BEFORE_HANDLE: &str = "worker.before_handle";
pub const CACHE_LOAD_BEFORE_READ: &str = "cache.load.before_read";
pub const CACHE_SAVE_BEFORE_WRITE: &str = "cache.save.before_write";

/// Evaluates the fail point `name`, returning an error when it is configured with `return`.
///
/// The optional parameter selects the error kind: `cache_read`, `cache_write`, `network` or,
/// by default, an injected failure.
pub fn offload_fail_point(name: &str) -> OffloadResult<()> {
    fail_point!(name, |parameter| {
        let kind = match parameter.as_deref() {
            Some("cache_read") => crate::error::ErrorKind::CacheReadFailed,
            Some("cache_write") => crate::error::ErrorKind::CacheWriteFailed,
            Some("network") => crate::error::ErrorKind::NetworkError,
            _ => crate::error::ErrorKind::InjectedFailure,
        };

        crate::bail!(
            kind,
            "An error occurred in a fail point",
            format!("The failpoint '{name}' returned an error")
        );
    });

    Ok(())
}
