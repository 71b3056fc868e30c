//! Sync engine error types.

use thiserror::Error;

use crate::api::ApiError;

/// Pass-fatal sync failures.
///
/// Item-level failures inside a pass are logged and retried on the next
/// pass; they never surface here.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to fetch remote items: {0}")]
    RemoteFetch(#[source] ApiError),

    #[error("Local store error: {0}")]
    Store(#[from] sqlx::Error),
}
