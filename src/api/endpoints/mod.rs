//! Endpoint handlers for the follow-up API.

pub mod followup;
pub mod health;

use crate::api::error::ApiError;

/// Run a synchronous engine call off the async executor. Engine reads hold
/// the SQLite connection lock for the whole query.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("Worker task failed: {e}")))?
}
