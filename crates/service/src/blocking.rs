use crate::error::ServiceError;

/// Helper: run a blocking closure on the tokio blocking pool.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Task(format!("spawn_blocking join error: {e}")))?
}
