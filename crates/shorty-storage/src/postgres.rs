use async_trait::async_trait;
use shorty_core::{BatchItem, Result, StoreError, UrlStore};
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{Connection, Executor, Row, Statement, Transaction};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

const SCHEMA: &str = include_str!("../ddl/postgres/urls.sql");

const INSERT_URL: &str = r#"
    INSERT INTO urls (short_id, original_url, user_id)
    VALUES ($1, $2, $3)
    ON CONFLICT DO NOTHING
    RETURNING id
"#;

const SELECT_LIVE_SHORT_ID: &str = r#"
    SELECT short_id
    FROM urls
    WHERE original_url = $1
      AND is_deleted = FALSE
    LIMIT 1
"#;

/// Postgres implementation of the store contract.
///
/// Dedup is enforced by the schema, not by this type: a unique index on
/// `short_id` and a unique partial index on `original_url` over live rows.
/// Inserts use `ON CONFLICT DO NOTHING`; a missing `RETURNING` row is the
/// conflict signal, resolved by looking up the live row for the URL. No
/// in-process lock is held, so concurrent writers race at the index.
///
/// Every call is bounded by the per-operation timeout given at construction.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresStore {
    /// Creates the store from an existing pool, creating the schema if needed.
    pub async fn new(pool: PgPool, timeout: Duration) -> Result<Self> {
        let store = Self { pool, timeout };
        store
            .with_timeout("migrate", async {
                sqlx::raw_sql(SCHEMA)
                    .execute(&store.pool)
                    .await
                    .map_err(map_sqlx_error)?;
                Ok(())
            })
            .await?;
        info!("Ensured urls schema");
        Ok(store)
    }

    /// Creates the store by opening a new connection pool.
    pub async fn connect(database_url: &str, timeout: Duration) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Self::new(pool, timeout).await
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn with_timeout<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(format!(
                "{operation} exceeded {:?}",
                self.timeout
            ))),
        }
    }
}

/// Resolves an insert that returned no row.
///
/// Returns the live short id holding `long_url`. If there is none, the
/// conflict came from `short_id` itself.
async fn existing_short_id<'e, E>(executor: E, short_id: &str, long_url: &str) -> Result<String>
where
    E: Executor<'e, Database = Postgres>,
{
    let existing: Option<Option<String>> = sqlx::query_scalar(SELECT_LIVE_SHORT_ID)
        .bind(long_url.to_owned())
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;

    match existing.flatten() {
        Some(existing) => Ok(existing),
        None => Err(StoreError::ShortIdTaken(short_id.to_owned())),
    }
}

async fn insert_batch(
    tx: &mut Transaction<'_, Postgres>,
    items: &[BatchItem],
) -> Result<HashMap<String, String>> {
    let statement = (&mut **tx)
        .prepare(INSERT_URL)
        .await
        .map_err(map_sqlx_error)?;

    let mut assigned = HashMap::with_capacity(items.len());
    for item in items {
        let inserted = statement
            .query()
            .bind(&item.short_id)
            .bind(&item.long_url)
            .bind(&item.owner_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        let short_id = match inserted {
            Some(_) => item.short_id.clone(),
            // Same transaction, so earlier rows of this batch are visible.
            None => existing_short_id(&mut **tx, &item.short_id, &item.long_url).await?,
        };
        assigned.entry(item.long_url.clone()).or_insert(short_id);
    }

    Ok(assigned)
}

fn is_constraint_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_check_violation() || db.is_unique_violation())
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    let message = err.to_string();

    if is_constraint_violation(&err) {
        return StoreError::Constraint(message);
    }

    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StoreError::InvalidData(message),
        _ => StoreError::Query(message),
    }
}

#[async_trait]
impl UrlStore for PostgresStore {
    async fn set(&self, short_id: &str, long_url: &str, owner_id: &str) -> Result<String> {
        self.with_timeout("set", async {
            let inserted: Option<i32> = sqlx::query_scalar(INSERT_URL)
                .bind(short_id)
                .bind(long_url)
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

            if inserted.is_some() {
                debug!(short_id, owner_id, "Stored url");
                return Ok(short_id.to_owned());
            }

            let existing = existing_short_id(&self.pool, short_id, long_url).await?;
            Err(StoreError::UrlAlreadyExists { short_id: existing })
        })
        .await
    }

    async fn get(&self, short_id: &str) -> Result<String> {
        self.with_timeout("get", async {
            let row = sqlx::query(
                r#"
                SELECT original_url, is_deleted
                FROM urls
                WHERE short_id = $1
                LIMIT 1
                "#,
            )
            .bind(short_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            let Some(row) = row else {
                return Err(StoreError::UrlNotFound(short_id.to_owned()));
            };

            let is_deleted: bool = row.try_get("is_deleted").map_err(map_sqlx_error)?;
            if is_deleted {
                return Err(StoreError::UrlIsDeleted(short_id.to_owned()));
            }

            row.try_get("original_url").map_err(map_sqlx_error)
        })
        .await
    }

    async fn urls_by_owner(&self, owner_id: &str) -> Result<HashMap<String, String>> {
        if owner_id.is_empty() {
            return Ok(HashMap::new());
        }

        self.with_timeout("urls_by_owner", async {
            let rows: Vec<(Option<String>, String)> = sqlx::query_as(
                r#"
                SELECT short_id, original_url
                FROM urls
                WHERE user_id = $1
                  AND is_deleted = FALSE
                "#,
            )
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            Ok(rows
                .into_iter()
                .filter_map(|(short_id, long_url)| short_id.map(|id| (id, long_url)))
                .collect())
        })
        .await
    }

    async fn delete_user_urls(&self, owner_id: &str, short_ids: &[String]) -> Result<()> {
        if owner_id.is_empty() || short_ids.is_empty() {
            return Ok(());
        }

        self.with_timeout("delete_user_urls", async {
            let result = sqlx::query(
                r#"
                UPDATE urls
                SET is_deleted = TRUE
                WHERE user_id = $1
                  AND short_id = ANY($2)
                  AND is_deleted = FALSE
                "#,
            )
            .bind(owner_id)
            .bind(short_ids)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            debug!(
                owner_id,
                requested = short_ids.len(),
                deleted = result.rows_affected(),
                "Deleted user urls"
            );
            Ok(())
        })
        .await
    }

    async fn save_batch(&self, items: &[BatchItem]) -> Result<HashMap<String, String>> {
        if items.is_empty() {
            return Ok(HashMap::new());
        }

        self.with_timeout("save_batch", async {
            let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

            match insert_batch(&mut tx, items).await {
                Ok(assigned) => {
                    tx.commit().await.map_err(map_sqlx_error)?;
                    debug!(items = items.len(), assigned = assigned.len(), "Saved url batch");
                    Ok(assigned)
                }
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(error = %rollback_err, "Failed to roll back url batch");
                    }
                    Err(err)
                }
            }
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.with_timeout("ping", async {
            let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
            conn.ping().await.map_err(|e| {
                warn!(error = %e, "Failed to ping database");
                map_sqlx_error(e)
            })
        })
        .await
    }

    async fn cleanup(&self) -> Result<()> {
        self.with_timeout("cleanup", async {
            sqlx::query("TRUNCATE TABLE urls")
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
            Ok(())
        })
        .await
    }

    /// The pool belongs to the application, which closes it after the store.
    async fn close(&self) -> Result<()> {
        debug!("Closing postgres store");
        Ok(())
    }
}
