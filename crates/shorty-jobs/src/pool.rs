use crate::error::JobPoolError;
use crate::job::{Job, JobResult};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

/// Queue capacity per worker.
const QUEUE_BUFFER_MULTIPLIER: usize = 2;

#[derive(Debug, Clone, TypedBuilder)]
pub struct PoolConfig {
    #[builder(default = 1)]
    pub concurrency: usize,
    #[builder(default = Duration::from_secs(1))]
    pub job_timeout: Duration,
    #[builder(default = Duration::from_secs(2))]
    pub enqueue_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PoolConfig {
    fn queue_capacity(&self) -> usize {
        self.concurrency * QUEUE_BUFFER_MULTIPLIER
    }
}

enum Queue {
    Open(mpsc::Sender<Job>),
    /// No workers to drain the queue, so every enqueue waits out its timeout.
    Full,
    Closed,
}

/// Fixed-size pool of workers fed from a bounded queue.
///
/// Submission is fire-and-forget: a successful [`JobPool::add`] only means
/// the job was queued. Closing the pool drops jobs that have not started,
/// cancels the token handed to running bodies and stops waiting for them.
/// Outcomes are reported on the
/// results channel, which [`JobPool::new`] drains into the log.
pub struct JobPool {
    queue: Mutex<Queue>,
    config: PoolConfig,
    shutdown: CancellationToken,
}

impl JobPool {
    /// Starts the workers and a task that logs every job outcome.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: PoolConfig) -> Self {
        let (pool, mut results) = Self::new_with_results(config);

        tokio::spawn(async move {
            while let Some(result) = results.recv().await {
                match &result.outcome {
                    Ok(()) => info!(job = %result.name, job_id = %result.id, "Job completed"),
                    Err(err) => {
                        warn!(job = %result.name, job_id = %result.id, error = %err, "Job failed")
                    }
                }
            }
        });

        pool
    }

    /// Starts the workers and hands the results channel to the caller.
    ///
    /// Workers wait for room on the results channel, so the receiver must be
    /// drained for the pool to make progress.
    pub fn new_with_results(config: PoolConfig) -> (Self, mpsc::Receiver<JobResult>) {
        let shutdown = CancellationToken::new();
        let (results_tx, results_rx) = mpsc::channel(config.queue_capacity().max(1));

        let queue = if config.concurrency == 0 {
            warn!("Job pool started without workers, every job will time out");
            Queue::Full
        } else {
            let (tx, rx) = mpsc::channel(config.queue_capacity());
            let rx = Arc::new(tokio::sync::Mutex::new(rx));

            for worker_id in 0..config.concurrency {
                tokio::spawn(worker(
                    worker_id,
                    Arc::clone(&rx),
                    results_tx.clone(),
                    shutdown.clone(),
                    config.job_timeout,
                ));
            }
            Queue::Open(tx)
        };

        info!(
            concurrency = config.concurrency,
            job_timeout = ?config.job_timeout,
            enqueue_timeout = ?config.enqueue_timeout,
            "Job pool started"
        );

        let pool = Self {
            queue: Mutex::new(queue),
            config,
            shutdown,
        };
        (pool, results_rx)
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Queues `job`, waiting at most the enqueue timeout for space.
    pub async fn add(&self, job: Job) -> Result<(), JobPoolError> {
        let sender = match &*self.queue.lock() {
            Queue::Open(tx) => Some(tx.clone()),
            Queue::Full => None,
            Queue::Closed => return Err(JobPoolError::Closed),
        };

        let id = job.id();
        let name = job.name().to_string();
        let enqueue = async move {
            match sender {
                Some(tx) => tx.send(job).await.map_err(|_| JobPoolError::Closed),
                None => std::future::pending().await,
            }
        };

        match tokio::time::timeout(self.config.enqueue_timeout, enqueue).await {
            Ok(Ok(())) => {
                debug!(job = %name, job_id = %id, "Job added to queue");
                Ok(())
            }
            Ok(Err(err)) => {
                warn!(job = %name, job_id = %id, "Job pool closed while adding job");
                Err(err)
            }
            Err(_) => {
                warn!(
                    job = %name,
                    job_id = %id,
                    timeout = ?self.config.enqueue_timeout,
                    "Failed to add job in time"
                );
                Err(JobPoolError::AddJobTimeout)
            }
        }
    }

    /// Stops all workers. Later calls are no-ops.
    pub fn close(&self) {
        let previous = std::mem::replace(&mut *self.queue.lock(), Queue::Closed);
        if matches!(previous, Queue::Closed) {
            return;
        }

        self.shutdown.cancel();
        info!("Job pool closed");
    }
}

impl Drop for JobPool {
    fn drop(&mut self) {
        self.close();
    }
}

async fn worker(
    worker_id: usize,
    queue: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>,
    results: mpsc::Sender<JobResult>,
    shutdown: CancellationToken,
    job_timeout: Duration,
) {
    debug!(worker_id, "Worker started");

    loop {
        let job = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            job = async { queue.lock().await.recv().await } => match job {
                Some(job) => job,
                None => break,
            },
        };

        let result = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            result = job.run(job_timeout, &shutdown) => result,
        };

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            sent = results.send(result) => {
                if sent.is_err() {
                    debug!(worker_id, "Results receiver dropped");
                }
            }
        }
    }

    debug!(worker_id, "Worker stopped");
}
