//! # Duplicate Module
//!
//! Decides whether an upload repeats something the same owner already has.
//!
//! ## Lookup order
//! 1. **Exact** - content hash equals a prior record's hash (authoritative)
//! 2. **Similar** - perceptual fingerprint meets the similarity threshold
//!    against a prior record's fingerprint; first match in iteration order wins
//!
//! The fingerprint is only computed when the exact pass misses. Only records
//! owned by the requesting owner are considered. Hashing, decoding and
//! fingerprint length errors propagate: an unreadable upload is never
//! reported as "not a duplicate".

use crate::core::comparator::SimilarityComparator;
use crate::core::hasher::{ContentHash, ContentHasher, PerceptualFingerprint, PerceptualFingerprinter};
use crate::core::input::ImageBytes;
use crate::core::records::{ImageRecord, OwnerId};
use crate::error::GuardError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How an upload matched a prior record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateType {
    /// Byte-identical content
    Exact,
    /// Visually near-identical content
    Similar,
    /// No match
    None,
}

/// Result of one duplicate check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateVerdict {
    pub is_duplicate: bool,
    pub duplicate_type: DuplicateType,
    /// The prior record that triggered the match
    pub matched_record: Option<ImageRecord>,
    /// Similarity score for `Similar` matches
    pub similarity: Option<f64>,
    /// Hash of the checked upload
    pub content_hash: ContentHash,
    /// Fingerprint of the checked upload, absent when the exact pass matched
    pub fingerprint: Option<PerceptualFingerprint>,
}

impl DuplicateVerdict {
    fn exact(record: &ImageRecord, content_hash: ContentHash) -> Self {
        Self {
            is_duplicate: true,
            duplicate_type: DuplicateType::Exact,
            matched_record: Some(record.clone()),
            similarity: None,
            content_hash,
            fingerprint: None,
        }
    }

    fn similar(
        record: &ImageRecord,
        similarity: f64,
        content_hash: ContentHash,
        fingerprint: PerceptualFingerprint,
    ) -> Self {
        Self {
            is_duplicate: true,
            duplicate_type: DuplicateType::Similar,
            matched_record: Some(record.clone()),
            similarity: Some(similarity),
            content_hash,
            fingerprint: Some(fingerprint),
        }
    }

    fn unique(content_hash: ContentHash, fingerprint: PerceptualFingerprint) -> Self {
        Self {
            is_duplicate: false,
            duplicate_type: DuplicateType::None,
            matched_record: None,
            similarity: None,
            content_hash,
            fingerprint: Some(fingerprint),
        }
    }
}

/// Owner-scoped exact and near-duplicate detection
#[derive(Debug, Clone, Default)]
pub struct DuplicateDetectionService {
    hasher: ContentHasher,
    fingerprinter: PerceptualFingerprinter,
    comparator: SimilarityComparator,
}

impl DuplicateDetectionService {
    pub fn new(fingerprinter: PerceptualFingerprinter, comparator: SimilarityComparator) -> Self {
        Self {
            hasher: ContentHasher::new(),
            fingerprinter,
            comparator,
        }
    }

    pub fn fingerprinter(&self) -> &PerceptualFingerprinter {
        &self.fingerprinter
    }

    pub fn comparator(&self) -> &SimilarityComparator {
        &self.comparator
    }

    /// Check `image` against `owner`'s previously accepted records.
    ///
    /// Records belonging to other owners are ignored.
    pub fn check(
        &self,
        owner: &OwnerId,
        image: &ImageBytes,
        prior_records: &[ImageRecord],
    ) -> Result<DuplicateVerdict, GuardError> {
        let content_hash = self.hasher.hash(image)?;

        let foreign = prior_records.iter().filter(|r| &r.owner_id != owner).count();
        if foreign > 0 {
            warn!(
                owner = %owner,
                foreign,
                "Ignoring prior records that belong to other owners"
            );
        }
        let owned = || prior_records.iter().filter(move |r| &r.owner_id == owner);

        if let Some(record) = owned().find(|r| r.content_hash == content_hash) {
            debug!(owner = %owner, record = %record.id, "Exact duplicate");
            return Ok(DuplicateVerdict::exact(record, content_hash));
        }

        let fingerprint = self.fingerprinter.fingerprint(image)?;

        for record in owned() {
            let Some(stored) = &record.perceptual_fingerprint else {
                continue;
            };
            let comparison = self.comparator.compare(&fingerprint, stored)?;
            if comparison.is_near_duplicate {
                debug!(
                    owner = %owner,
                    record = %record.id,
                    similarity = comparison.similarity,
                    "Similar duplicate"
                );
                return Ok(DuplicateVerdict::similar(
                    record,
                    comparison.similarity,
                    content_hash,
                    fingerprint,
                ));
            }
        }

        Ok(DuplicateVerdict::unique(content_hash, fingerprint))
    }
}
