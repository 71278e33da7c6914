use shorty_core::StoreError;
use shorty_jobs::JobPoolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to connect to database: {0}")]
    Database(
        #[from]
        #[source]
        sqlx::Error,
    ),
    #[error("storage operation failed: {0}")]
    Storage(
        #[from]
        #[source]
        StoreError,
    ),
    #[error("background job rejected: {0}")]
    Jobs(
        #[from]
        #[source]
        JobPoolError,
    ),
    #[error("failed to install tracing subscriber: {0}")]
    Telemetry(String),
}
