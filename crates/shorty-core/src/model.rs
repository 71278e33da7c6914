use serde::{Deserialize, Serialize};

/// A stored URL mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    /// The short identifier, unique across every record ever stored.
    pub short_id: String,
    /// The original URL that was shortened.
    pub long_url: String,
    /// The owner of the record. Empty for anonymous links.
    pub owner_id: String,
    /// Soft-delete flag. Once set it is never cleared.
    pub is_deleted: bool,
}

impl UrlRecord {
    pub fn new(
        short_id: impl Into<String>,
        long_url: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            short_id: short_id.into(),
            long_url: long_url.into(),
            owner_id: owner_id.into(),
            is_deleted: false,
        }
    }

    /// Returns `true` if the record still resolves.
    pub fn is_live(&self) -> bool {
        !self.is_deleted
    }

    /// Returns `true` if the record belongs to `owner_id`.
    ///
    /// Anonymous records belong to nobody, so an empty `owner_id` never matches.
    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        !owner_id.is_empty() && self.owner_id == owner_id
    }
}

/// One entry of a [`save_batch`](crate::UrlStore::save_batch) call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub short_id: String,
    pub long_url: String,
    pub owner_id: String,
}

impl BatchItem {
    pub fn new(
        short_id: impl Into<String>,
        long_url: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            short_id: short_id.into(),
            long_url: long_url.into(),
            owner_id: owner_id.into(),
        }
    }
}
