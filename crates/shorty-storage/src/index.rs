use serde::{Deserialize, Serialize};
use shorty_core::{BatchItem, Result, StoreError, UrlRecord};
use std::collections::{HashMap, HashSet};

/// Snapshot form of a [`UrlRecord`], keyed by short id in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Entry {
    #[serde(rename = "LongURL")]
    pub long_url: String,
    #[serde(rename = "UserID", default)]
    pub owner_id: String,
    #[serde(rename = "IsDeleted", default)]
    pub is_deleted: bool,
}

impl Entry {
    fn into_record(self, short_id: String) -> UrlRecord {
        UrlRecord {
            short_id,
            long_url: self.long_url,
            owner_id: self.owner_id,
            is_deleted: self.is_deleted,
        }
    }
}

impl From<&UrlRecord> for Entry {
    fn from(record: &UrlRecord) -> Self {
        Self {
            long_url: record.long_url.clone(),
            owner_id: record.owner_id.clone(),
            is_deleted: record.is_deleted,
        }
    }
}

/// Records by short id plus the reverse `long_url -> short_id` map of live
/// records.
///
/// Both maps are only mutated through this type, so the reverse map always
/// holds exactly the live entries.
#[derive(Debug, Default)]
pub(crate) struct UrlIndex {
    records: HashMap<String, UrlRecord>,
    live: HashMap<String, String>,
}

impl UrlIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds an index from persisted entries.
    ///
    /// Fails if two live entries share a long URL.
    pub fn from_entries(entries: HashMap<String, Entry>) -> Result<Self> {
        let records: HashMap<String, UrlRecord> = entries
            .into_iter()
            .map(|(short_id, entry)| (short_id.clone(), entry.into_record(short_id)))
            .collect();

        let mut live = HashMap::with_capacity(records.len());
        for record in records.values().filter(|r| r.is_live()) {
            if let Some(other) = live.insert(record.long_url.clone(), record.short_id.clone()) {
                return Err(StoreError::InvalidData(format!(
                    "url {} is live under both {} and {}",
                    record.long_url, other, record.short_id
                )));
            }
        }
        Ok(Self { records, live })
    }

    /// Every record, live or deleted, in snapshot form.
    pub fn snapshot(&self) -> HashMap<&str, Entry> {
        self.records
            .iter()
            .map(|(short_id, record)| (short_id.as_str(), Entry::from(record)))
            .collect()
    }

    pub fn record(&self, short_id: &str) -> Option<&UrlRecord> {
        self.records.get(short_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn insert(&mut self, short_id: &str, long_url: &str, owner_id: &str) -> Result<String> {
        if let Some(existing) = self.live.get(long_url) {
            return Err(StoreError::UrlAlreadyExists {
                short_id: existing.clone(),
            });
        }
        if self.records.contains_key(short_id) {
            return Err(StoreError::ShortIdTaken(short_id.to_owned()));
        }

        self.records.insert(
            short_id.to_owned(),
            UrlRecord::new(short_id, long_url, owner_id),
        );
        self.live.insert(long_url.to_owned(), short_id.to_owned());
        Ok(short_id.to_owned())
    }

    /// Inserts a batch all-or-nothing.
    ///
    /// The whole batch is planned before anything is written, so a taken short
    /// id leaves the index untouched.
    pub fn insert_batch(&mut self, items: &[BatchItem]) -> Result<HashMap<String, String>> {
        let mut assigned: HashMap<String, String> = HashMap::with_capacity(items.len());
        let mut planned: Vec<&BatchItem> = Vec::new();
        let mut planned_ids: HashSet<&str> = HashSet::new();

        for item in items {
            if assigned.contains_key(&item.long_url) {
                continue;
            }
            if let Some(existing) = self.live.get(&item.long_url) {
                assigned.insert(item.long_url.clone(), existing.clone());
                continue;
            }
            if self.records.contains_key(&item.short_id)
                || !planned_ids.insert(item.short_id.as_str())
            {
                return Err(StoreError::ShortIdTaken(item.short_id.clone()));
            }
            assigned.insert(item.long_url.clone(), item.short_id.clone());
            planned.push(item);
        }

        for item in planned {
            self.records.insert(
                item.short_id.clone(),
                UrlRecord::new(
                    item.short_id.as_str(),
                    item.long_url.as_str(),
                    item.owner_id.as_str(),
                ),
            );
            self.live
                .insert(item.long_url.clone(), item.short_id.clone());
        }

        Ok(assigned)
    }

    pub fn get(&self, short_id: &str) -> Result<String> {
        match self.records.get(short_id) {
            None => Err(StoreError::UrlNotFound(short_id.to_owned())),
            Some(record) if !record.is_live() => {
                Err(StoreError::UrlIsDeleted(short_id.to_owned()))
            }
            Some(record) => Ok(record.long_url.clone()),
        }
    }

    pub fn by_owner(&self, owner_id: &str) -> HashMap<String, String> {
        self.records
            .values()
            .filter(|r| r.is_live() && r.is_owned_by(owner_id))
            .map(|r| (r.short_id.clone(), r.long_url.clone()))
            .collect()
    }

    /// Tombstones the ids owned by `owner_id` and frees their long URLs.
    ///
    /// Returns how many records were deleted by this call.
    pub fn soft_delete(&mut self, owner_id: &str, short_ids: &[String]) -> usize {
        let mut deleted = 0;
        for short_id in short_ids {
            let Some(record) = self.records.get_mut(short_id) else {
                continue;
            };
            if !record.is_live() || !record.is_owned_by(owner_id) {
                continue;
            }
            record.is_deleted = true;
            if self.live.get(&record.long_url) == Some(short_id) {
                self.live.remove(&record.long_url);
            }
            deleted += 1;
        }
        deleted
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.live.clear();
    }
}
