//! # Records Module
//!
//! The per-owner corpus duplicate checks run against.
//!
//! An `ImageRecord` is created once per accepted, non-duplicate upload and
//! never mutated. Persisting records is the caller's job; the guard only
//! reads the slice it is handed. The stores here are reference
//! implementations of that collaborator for the CLI and for tests.
//!
//! ## Backends
//! - `SqliteRecordStore` - Persistent storage using SQLite
//! - `InMemoryRecordStore` - For testing and embedding

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryRecordStore;
pub use sqlite::SqliteRecordStore;
pub use traits::RecordStore;

use crate::core::hasher::{ContentHash, PerceptualFingerprint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of the uploading user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Reference to the listing an image belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingRef(String);

impl ListingRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListingRef {
    fn from(reference: &str) -> Self {
        Self::new(reference)
    }
}

/// A previously accepted upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub listing_ref: ListingRef,
    pub content_hash: ContentHash,
    /// Absent for records written before fingerprinting existed
    pub perceptual_fingerprint: Option<PerceptualFingerprint>,
    pub created_at: DateTime<Utc>,
}

impl ImageRecord {
    /// Create a record for a freshly accepted upload
    pub fn new(
        owner_id: OwnerId,
        listing_ref: ListingRef,
        content_hash: ContentHash,
        perceptual_fingerprint: Option<PerceptualFingerprint>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            listing_ref,
            content_hash,
            perceptual_fingerprint,
            created_at: Utc::now(),
        }
    }
}
