pub mod dashboard;
pub mod health;
pub mod patients;

use crate::api::error::ApiError;

/// Run store or pipeline work off the async executor.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("Task join error: {e}")))?
}
