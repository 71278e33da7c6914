//! File-backed store.
//!
//! Behaves exactly like [`MemoryStore`] while running. The on-disk snapshot is
//! read once by [`FileStore::open`] and rewritten in full by
//! [`UrlStore::close`]; nothing is persisted in between, so a crash loses every
//! change since the last close. One process owns the file at a time.
//!
//! The snapshot is a single JSON object:
//!
//! ```json
//! {"abc123": {"LongURL": "https://go.dev/", "UserID": "u1", "IsDeleted": false}}
//! ```

use crate::index::{Entry, UrlIndex};
use crate::memory::MemoryStore;
use async_trait::async_trait;
use shorty_core::{BatchItem, Result, StoreError, UrlRecord, UrlStore};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    /// Opens the store, loading the snapshot at `path`.
    ///
    /// A missing or empty file yields an empty store. Malformed content is an
    /// error: the store refuses to start rather than drop data.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "Snapshot not found, starting with empty store");
                Vec::new()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to read snapshot");
                return Err(err.into());
            }
        };

        let index = if bytes.iter().all(u8::is_ascii_whitespace) {
            debug!(path = %path.display(), "Snapshot is empty");
            UrlIndex::new()
        } else {
            let entries: HashMap<String, Entry> = serde_json::from_slice(&bytes).map_err(|e| {
                StoreError::Serialization(format!("malformed snapshot {}: {e}", path.display()))
            })?;
            UrlIndex::from_entries(entries)?
        };

        info!(path = %path.display(), records = index.len(), "Loaded url snapshot");

        Ok(Self {
            path,
            inner: MemoryStore::from_index(index),
        })
    }

    /// Path of the backing snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full record for `short_id`, tombstones included.
    pub fn record(&self, short_id: &str) -> Option<UrlRecord> {
        self.inner.record(short_id)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Writes the full snapshot next to the target and renames it into place.
    async fn flush(&self) -> Result<()> {
        let bytes = {
            let index = self.inner.index().read();
            serde_json::to_vec(&index.snapshot())
                .map_err(|e| StoreError::Serialization(e.to_string()))?
        };

        let temp = self.temp_path();
        tokio::fs::write(&temp, &bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl UrlStore for FileStore {
    async fn set(&self, short_id: &str, long_url: &str, owner_id: &str) -> Result<String> {
        self.inner.set(short_id, long_url, owner_id).await
    }

    async fn get(&self, short_id: &str) -> Result<String> {
        self.inner.get(short_id).await
    }

    async fn urls_by_owner(&self, owner_id: &str) -> Result<HashMap<String, String>> {
        self.inner.urls_by_owner(owner_id).await
    }

    async fn delete_user_urls(&self, owner_id: &str, short_ids: &[String]) -> Result<()> {
        self.inner.delete_user_urls(owner_id, short_ids).await
    }

    async fn save_batch(&self, items: &[BatchItem]) -> Result<HashMap<String, String>> {
        self.inner.save_batch(items).await
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn cleanup(&self) -> Result<()> {
        self.inner.cleanup().await?;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Persists the full snapshot. A failure here means data loss and is
    /// returned to the caller.
    async fn close(&self) -> Result<()> {
        match self.flush().await {
            Ok(()) => {
                info!(path = %self.path.display(), records = self.inner.len(), "Flushed url snapshot");
                Ok(())
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Failed to flush url snapshot");
                Err(err)
            }
        }
    }
}
