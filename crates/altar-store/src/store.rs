//! Capacity-bounded altar collection
//!
//! The whole collection lives under a single storage key as a JSON array,
//! newest `createdAt` first. Every write re-sorts and truncates to
//! `max_records`, so the oldest records are evicted first.

use crate::error::StoreError;
use crate::file::FileStorage;
use crate::storage::KeyValueStorage;
use altar_core::{AltarId, AltarRecord, StorageConfig};
use tracing::{debug, warn};

/// Default number of records retained
pub const DEFAULT_MAX_RECORDS: usize = 50;

/// Default storage key of the serialized collection
pub const DEFAULT_STORAGE_KEY: &str = "altar_app_altars";

/// Local persistence for altar records
#[derive(Debug, Clone)]
pub struct LocalStore<S> {
    storage: S,
    key: String,
    max_records: usize,
}

impl<S: KeyValueStorage> LocalStore<S> {
    /// Store over `storage` with the default key and capacity
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            key: DEFAULT_STORAGE_KEY.to_string(),
            max_records: DEFAULT_MAX_RECORDS,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    #[inline]
    #[must_use]
    pub fn max_records(&self) -> usize {
        self.max_records
    }

    #[inline]
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Upsert `record`, keep the newest `max_records`, and persist
    pub fn save(&self, record: AltarRecord) -> Result<(), StoreError> {
        let mut records = self.get_all()?;
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }

        sort_newest_first(&mut records);
        if records.len() > self.max_records {
            for evicted in records.drain(self.max_records..) {
                debug!(id = %evicted.id(), created_at = %evicted.created_at_iso(), "evicting oldest altar");
            }
        }

        self.write(&records)?;
        debug!(count = records.len(), key = %self.key, "altar collection saved");
        Ok(())
    }

    /// Record with `id`, or `None`
    pub fn get(&self, id: &AltarId) -> Result<Option<AltarRecord>, StoreError> {
        Ok(self.get_all()?.into_iter().find(|r| r.id() == id))
    }

    /// Every stored record, newest first
    pub fn get_all(&self) -> Result<Vec<AltarRecord>, StoreError> {
        let Some(raw) = self.storage.get(&self.key)? else {
            return Ok(Vec::new());
        };
        let mut records: Vec<AltarRecord> = serde_json::from_str(&raw).map_err(|e| {
            warn!(key = %self.key, error = %e, "stored altar collection is corrupt");
            StoreError::parse_error()
        })?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    /// Remove the record with `id`; absent ids are a no-op
    pub fn delete(&self, id: &AltarId) -> Result<(), StoreError> {
        let mut records = self.get_all()?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Ok(());
        }
        self.write(&records)?;
        debug!(%id, remaining = records.len(), "altar deleted");
        Ok(())
    }

    /// Remove the whole collection
    pub fn clear(&self) -> Result<(), StoreError> {
        self.storage.remove(&self.key)?;
        debug!(key = %self.key, "altar collection cleared");
        Ok(())
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.get_all()?.len())
    }

    fn write(&self, records: &[AltarRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string(records).map_err(|e| {
            warn!(error = %e, "failed to serialize altar collection");
            StoreError::unknown()
        })?;
        self.storage.set(&self.key, &json)?;
        Ok(())
    }
}

impl LocalStore<FileStorage> {
    /// File-backed store configured from `[storage]`
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        let storage = FileStorage::new(&config.dir).with_quota(config.quota_bytes);
        Self::new(storage)
            .with_key(config.key.clone())
            .with_max_records(config.max_records)
    }
}

// Equal timestamps keep no particular order.
fn sort_newest_first(records: &mut [AltarRecord]) {
    records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}
