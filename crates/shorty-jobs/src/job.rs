use crate::error::JobError;
use futures_util::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

type JobFn = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, anyhow::Result<()>> + Send>;

/// A named, one-shot unit of background work.
pub struct Job {
    id: Uuid,
    name: String,
    work: JobFn,
}

impl Job {
    /// Wraps `work` into a job with a freshly generated id.
    ///
    /// The body receives a token that is cancelled once its deadline passes
    /// or the pool closes. Bodies should stop at the next await point when it
    /// fires; a body that ignores it is abandoned, not killed, so it must be
    /// safe to run again.
    pub fn new<F, Fut>(name: impl Into<String>, work: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            work: Box::new(move |cancel| work(cancel).boxed()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the body on its own task and waits for it at most `deadline`.
    ///
    /// The body's token is a child of `shutdown` and is cancelled when the
    /// deadline wins. The eventual outcome of a late body is discarded.
    pub(crate) async fn run(self, deadline: Duration, shutdown: &CancellationToken) -> JobResult {
        let Job { id, name, work } = self;

        debug!(job = %name, job_id = %id, "Starting job");
        let cancel = shutdown.child_token();
        let handle = tokio::spawn(work(cancel.clone()));

        let outcome = match tokio::time::timeout(deadline, handle).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(err))) => Err(JobError::Failed(format!("{err:#}"))),
            Ok(Err(join_err)) => Err(JobError::Panicked(join_err.to_string())),
            Err(_) => {
                cancel.cancel();
                warn!(job = %name, job_id = %id, ?deadline, "Deadline exceeded for job");
                Err(JobError::DeadlineExceeded(deadline))
            }
        };

        debug!(job = %name, job_id = %id, ok = outcome.is_ok(), "Finished job");
        JobResult { id, name, outcome }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Outcome of one job execution. Results are reported once and never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub id: Uuid,
    pub name: String,
    pub outcome: Result<(), JobError>,
}

impl JobResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}
