//! Record store trait definition.

use super::{ImageRecord, ListingRef, OwnerId};
use crate::error::StoreError;
use uuid::Uuid;

/// Trait for image record backends
pub trait RecordStore: Send + Sync {
    /// All records belonging to one owner, oldest first
    fn records_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<ImageRecord>, StoreError>;

    /// Store a new record
    ///
    /// Fails with `DuplicateContent` if the owner already has a record with
    /// the same content hash.
    fn insert(&self, record: ImageRecord) -> Result<(), StoreError>;

    /// Remove a single record. Returns whether it existed.
    fn remove(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Remove every record of a deleted listing. Returns how many went.
    fn remove_listing(&self, owner_id: &OwnerId, listing_ref: &ListingRef)
        -> Result<usize, StoreError>;

    /// Total number of records across all owners
    fn count(&self) -> Result<usize, StoreError>;
}
