use std::time::Duration;
use thiserror::Error;

/// Errors returned to the code submitting a job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobPoolError {
    /// The queue stayed full for the whole enqueue timeout. Callers should
    /// treat this as "try again later".
    #[error("failed to add job in time")]
    AddJobTimeout,
    #[error("job pool is closed")]
    Closed,
}

/// Why a job did not complete successfully.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("job failed: {0}")]
    Failed(String),
    #[error("job deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
    #[error("job panicked: {0}")]
    Panicked(String),
}
