//! In-memory record store for testing and embedding.

use super::{ImageRecord, ListingRef, OwnerId, RecordStore};
use crate::error::StoreError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory record store
///
/// Records are kept per owner in insertion order.
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<OwnerId, Vec<ImageRecord>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    fn poisoned() -> StoreError {
        StoreError::Corrupted {
            path: PathBuf::from("memory"),
        }
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn records_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<ImageRecord>, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.get(owner_id).cloned().unwrap_or_default())
    }

    fn insert(&self, record: ImageRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        let owned = records.entry(record.owner_id.clone()).or_default();

        if owned.iter().any(|r| r.content_hash == record.content_hash) {
            return Err(StoreError::DuplicateContent {
                owner_id: record.owner_id.to_string(),
                content_hash: record.content_hash.to_string(),
            });
        }

        owned.push(record);
        Ok(())
    }

    fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        for owned in records.values_mut() {
            if let Some(index) = owned.iter().position(|r| r.id == id) {
                owned.remove(index);
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn remove_listing(
        &self,
        owner_id: &OwnerId,
        listing_ref: &ListingRef,
    ) -> Result<usize, StoreError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        let Some(owned) = records.get_mut(owner_id) else {
            return Ok(0);
        };

        let before = owned.len();
        owned.retain(|r| &r.listing_ref != listing_ref);
        Ok(before - owned.len())
    }

    fn count(&self) -> Result<usize, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.values().map(Vec::len).sum())
    }
}
