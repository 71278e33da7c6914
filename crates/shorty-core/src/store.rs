use crate::error::Result;
use crate::model::BatchItem;
use async_trait::async_trait;
use std::collections::HashMap;

/// The storage contract shared by every backend.
///
/// Backends guarantee that at most one live record maps a given long URL.
/// Records are never physically removed: deletion flips a tombstone flag,
/// after which the long URL may be claimed again under a new short id.
///
/// The backend is picked once at startup and held as `Arc<dyn UrlStore>`.
/// Dropping a returned future abandons the call.
#[async_trait]
pub trait UrlStore: Send + Sync + 'static {
    /// Stores `long_url` under `short_id`.
    ///
    /// Returns the stored short id. If a live record already maps `long_url`,
    /// nothing is written and `Err(UrlAlreadyExists)` carries the existing id.
    /// Returns `Err(ShortIdTaken)` if `short_id` is used by another record.
    async fn set(&self, short_id: &str, long_url: &str, owner_id: &str) -> Result<String>;

    /// Resolves a short id.
    ///
    /// Returns `Err(UrlNotFound)` for unknown ids and `Err(UrlIsDeleted)` for
    /// soft-deleted ones.
    async fn get(&self, short_id: &str) -> Result<String>;

    /// Lists the live records of `owner_id` as `short_id -> long_url`.
    ///
    /// An empty `owner_id` yields an empty map.
    async fn urls_by_owner(&self, owner_id: &str) -> Result<HashMap<String, String>>;

    /// Soft-deletes every id in `short_ids` that belongs to `owner_id`.
    ///
    /// Unknown ids and ids owned by someone else are skipped without error.
    /// An empty `owner_id` is a no-op.
    async fn delete_user_urls(&self, owner_id: &str, short_ids: &[String]) -> Result<()>;

    /// Stores many items as one unit.
    ///
    /// Items are deduplicated against stored records and against earlier items
    /// of the same batch. The result maps each distinct long URL to the short
    /// id it resolves to after the call.
    async fn save_batch(&self, items: &[BatchItem]) -> Result<HashMap<String, String>>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<()>;

    /// Removes every record. Intended for tests only.
    async fn cleanup(&self) -> Result<()>;

    /// Releases backend resources, persisting state where the backend needs to.
    async fn close(&self) -> Result<()>;
}
