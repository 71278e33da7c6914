use crate::config::{Config, GeneratorKind, StorageBackend};
use crate::error::AppError;
use shorty_core::{BatchItem, StoreError, UrlStore};
use shorty_generator::{Generator, HashGenerator, RandomGenerator};
use shorty_jobs::{tasks, JobPool};
use shorty_storage::{FileStore, MemoryStore, PostgresStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Fresh ids tried before a collision is reported to the caller.
const MAX_GENERATE_ATTEMPTS: usize = 3;

pub struct App {
    store: Arc<dyn UrlStore>,
    jobs: JobPool,
    generator: Box<dyn Generator>,
    database: Option<PgPool>,
}

impl App {
    /// Opens the configured backend and starts the job pool.
    pub async fn new(config: &Config) -> Result<Self, AppError> {
        let backend = config.storage_backend();
        info!(storage_backend = %backend, "Opening storage");

        let (store, database): (Arc<dyn UrlStore>, Option<PgPool>) = match backend {
            StorageBackend::Postgres { dsn } => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.database_max_connections)
                    .acquire_timeout(config.database_connect_timeout)
                    .connect(&dsn)
                    .await?;
                let store = PostgresStore::new(pool.clone(), config.database_query_timeout).await?;
                (Arc::new(store), Some(pool))
            }
            StorageBackend::File { path } => (Arc::new(FileStore::open(path).await?), None),
            StorageBackend::Memory => (Arc::new(MemoryStore::new()), None),
        };

        let generator: Box<dyn Generator> = match config.generator {
            GeneratorKind::Random => Box::new(RandomGenerator::default()),
            GeneratorKind::Hash => Box::new(HashGenerator::default()),
        };

        Ok(Self {
            store,
            jobs: JobPool::new(config.pool_config()),
            generator,
            database,
        })
    }

    pub fn store(&self) -> &Arc<dyn UrlStore> {
        &self.store
    }

    pub fn jobs(&self) -> &JobPool {
        &self.jobs
    }

    /// Stores `long_url` under a freshly generated id.
    ///
    /// A URL that already has a live record yields
    /// [`StoreError::UrlAlreadyExists`] carrying the existing id. Taken ids
    /// are regenerated a few times before the collision is returned.
    pub async fn shorten(&self, long_url: &str, owner_id: &str) -> Result<String, StoreError> {
        let mut attempt = 1;
        loop {
            let short_id = self.generator.generate(long_url);
            match self.store.set(&short_id, long_url, owner_id).await {
                Err(StoreError::ShortIdTaken(_)) if attempt < MAX_GENERATE_ATTEMPTS => {
                    debug!(%short_id, attempt, "Generated short id is taken, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Shortens several URLs at once, returning `long_url -> short_id`.
    pub async fn shorten_batch(
        &self,
        long_urls: &[String],
        owner_id: &str,
    ) -> Result<HashMap<String, String>, StoreError> {
        let items: Vec<BatchItem> = long_urls
            .iter()
            .map(|long_url| {
                BatchItem::new(self.generator.generate(long_url), long_url.as_str(), owner_id)
            })
            .collect();
        self.store.save_batch(&items).await
    }

    /// Queues a background soft-delete of `short_ids` owned by `owner_id`.
    pub async fn delete_urls(&self, owner_id: &str, short_ids: Vec<String>) -> Result<(), AppError> {
        let job = tasks::delete_user_urls(Arc::clone(&self.store), owner_id, short_ids);
        self.jobs.add(job).await?;
        Ok(())
    }

    /// Stops background work, then closes the store and the database pool.
    pub async fn close(self) -> Result<(), AppError> {
        self.jobs.close();

        let closed = self.store.close().await;
        if let Err(err) = &closed {
            error!(error = %err, "Failed to close storage, possible data loss");
        }

        if let Some(pool) = &self.database {
            pool.close().await;
        }

        info!("Shut down");
        closed.map_err(AppError::from)
    }
}
