//! Bounded background job pool.
//!
//! Request handlers hand slow, idempotent work (such as deleting a user's
//! URLs) to a [`JobPool`] instead of running it inline. Submission waits for
//! queue space at most for the configured enqueue timeout, and every job runs
//! under its own deadline.

pub mod error;
pub mod job;
pub mod pool;
pub mod tasks;

pub use error::{JobError, JobPoolError};
pub use job::{Job, JobResult};
pub use pool::{JobPool, PoolConfig};
pub use tokio_util::sync::CancellationToken;
