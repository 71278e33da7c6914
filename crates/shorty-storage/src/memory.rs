use crate::index::UrlIndex;
use async_trait::async_trait;
use parking_lot::RwLock;
use shorty_core::{BatchItem, Result, UrlRecord, UrlStore};
use std::collections::HashMap;
use tracing::debug;

/// In-memory implementation of the [`UrlStore`] trait.
///
/// Both lookup maps live in one [`UrlIndex`] behind a single reader/writer
/// lock: `get` and `urls_by_owner` share it, every mutation holds it
/// exclusively, so dedup checks and updates both maps under one guard.
#[derive(Debug, Default)]
pub struct MemoryStore {
    index: RwLock<UrlIndex>,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_index(index: UrlIndex) -> Self {
        Self {
            index: RwLock::new(index),
        }
    }

    pub(crate) fn index(&self) -> &RwLock<UrlIndex> {
        &self.index
    }

    /// Full record for `short_id`, tombstones included.
    pub fn record(&self, short_id: &str) -> Option<UrlRecord> {
        self.index.read().record(short_id).cloned()
    }

    /// Number of records held, deleted ones included.
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UrlStore for MemoryStore {
    async fn set(&self, short_id: &str, long_url: &str, owner_id: &str) -> Result<String> {
        let stored = self.index.write().insert(short_id, long_url, owner_id)?;
        debug!(short_id = %stored, owner_id, "Stored url");
        Ok(stored)
    }

    async fn get(&self, short_id: &str) -> Result<String> {
        self.index.read().get(short_id)
    }

    async fn urls_by_owner(&self, owner_id: &str) -> Result<HashMap<String, String>> {
        Ok(self.index.read().by_owner(owner_id))
    }

    async fn delete_user_urls(&self, owner_id: &str, short_ids: &[String]) -> Result<()> {
        let deleted = self.index.write().soft_delete(owner_id, short_ids);
        debug!(owner_id, requested = short_ids.len(), deleted, "Deleted user urls");
        Ok(())
    }

    async fn save_batch(&self, items: &[BatchItem]) -> Result<HashMap<String, String>> {
        let assigned = self.index.write().insert_batch(items)?;
        debug!(items = items.len(), assigned = assigned.len(), "Saved url batch");
        Ok(assigned)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn cleanup(&self) -> Result<()> {
        self.index.write().clear();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
