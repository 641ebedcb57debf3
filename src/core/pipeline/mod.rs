//! # Pipeline Module
//!
//! Runs uploads through both gates and hands back a decision the caller can
//! act on.
//!
//! ## Stages
//! 1. **Classify** - cheap heuristic check, rejections stop here
//! 2. **Check** - exact then similar lookup against the owner's records
//! 3. **Commit** - (sequential mode only) store accepted uploads before the
//!    next one is checked
//!
//! ## Parallelism
//! `evaluate_batch` uses rayon and compares every upload against the same
//! committed records, so two near-identical photos in one batch both pass.
//! `process_sequential` commits as it goes and catches those.

mod guard;

pub use guard::{BatchReport, UploadGuard, UploadGuardBuilder, UploadOutcome};

use crate::core::classifier::ClassificationVerdict;
use crate::core::duplicate::{DuplicateType, DuplicateVerdict};
use crate::core::hasher::{ContentHash, PerceptualFingerprint};
use crate::core::input::ImageBytes;
use crate::core::records::{ImageRecord, ListingRef, OwnerId};
use crate::error::GuardError;
use serde::Serialize;
use std::path::Path;

/// One incoming upload
#[derive(Debug, Clone)]
pub struct Upload {
    /// Original filename as supplied by the uploader
    pub file_name: String,
    pub image: ImageBytes,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, image: ImageBytes) -> Self {
        Self {
            file_name: file_name.into(),
            image,
        }
    }

    /// Read an upload from disk, keeping the file name
    pub fn from_path(path: &Path) -> Result<Self, GuardError> {
        let image = ImageBytes::from_path(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(file_name, image))
    }
}

/// What to do with an upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum UploadDecision {
    /// Rejected by the classifier
    NotVehicle(ClassificationVerdict),
    /// Repeats one of the owner's records
    Duplicate(DuplicateVerdict),
    /// Safe to store
    Accepted {
        classification: ClassificationVerdict,
        content_hash: ContentHash,
        fingerprint: Option<PerceptualFingerprint>,
    },
}

impl UploadDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Message to show the uploader. Each rejection kind reads differently
    /// so users know what to fix.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotVehicle(_) => "This doesn't look like a vehicle photo.",
            Self::Duplicate(verdict) => match verdict.duplicate_type {
                DuplicateType::Similar => "You've already uploaded a very similar photo.",
                _ => "You've already uploaded this photo.",
            },
            Self::Accepted { .. } => "Photo accepted.",
        }
    }

    /// Short label for logs and reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotVehicle(_) => "not-vehicle",
            Self::Duplicate(verdict) => match verdict.duplicate_type {
                DuplicateType::Exact => "exact-duplicate",
                _ => "similar-duplicate",
            },
            Self::Accepted { .. } => "accepted",
        }
    }

    /// The record to persist for an accepted upload
    pub fn into_record(self, owner_id: OwnerId, listing_ref: ListingRef) -> Option<ImageRecord> {
        match self {
            Self::Accepted {
                content_hash,
                fingerprint,
                ..
            } => Some(ImageRecord::new(owner_id, listing_ref, content_hash, fingerprint)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::ClassificationReason;
    use crate::core::records::test_support::record;

    fn hash() -> ContentHash {
        "ab".repeat(32).parse().unwrap()
    }

    fn accepted() -> UploadDecision {
        UploadDecision::Accepted {
            classification: ClassificationVerdict::accept(
                ClassificationReason::PassedStructuralChecks,
            ),
            content_hash: hash(),
            fingerprint: Some("1100".parse().unwrap()),
        }
    }

    fn duplicate(duplicate_type: DuplicateType) -> UploadDecision {
        UploadDecision::Duplicate(DuplicateVerdict {
            is_duplicate: true,
            duplicate_type,
            matched_record: Some(record("alice", 1, None)),
            similarity: None,
            content_hash: hash(),
            fingerprint: None,
        })
    }

    #[test]
    fn rejection_messages_are_distinct() {
        let not_vehicle = UploadDecision::NotVehicle(ClassificationVerdict::reject(
            ClassificationReason::RemoteRejected,
        ));

        let messages = [
            not_vehicle.user_message(),
            duplicate(DuplicateType::Exact).user_message(),
            accepted().user_message(),
        ];
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
        assert!(messages[0].contains("vehicle"));
        assert!(messages[1].contains("already uploaded"));
    }

    #[test]
    fn only_accepted_uploads_become_records() {
        let record = accepted()
            .into_record(OwnerId::from("alice"), ListingRef::from("l-9"))
            .unwrap();
        assert_eq!(record.owner_id.as_str(), "alice");
        assert_eq!(record.listing_ref.as_str(), "l-9");
        assert_eq!(record.content_hash, hash());
        assert_eq!(record.perceptual_fingerprint.unwrap().as_str(), "1100");

        assert!(duplicate(DuplicateType::Similar)
            .into_record(OwnerId::from("alice"), ListingRef::from("l-9"))
            .is_none());
    }

    #[test]
    fn labels() {
        assert_eq!(accepted().label(), "accepted");
        assert_eq!(duplicate(DuplicateType::Exact).label(), "exact-duplicate");
        assert_eq!(duplicate(DuplicateType::Similar).label(), "similar-duplicate");
    }

    #[test]
    fn upload_from_path_keeps_file_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Front_Car.JPG");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let upload = Upload::from_path(&path).unwrap();
        assert_eq!(upload.file_name, "Front_Car.JPG");
        assert_eq!(upload.image.mime_type(), "image/jpeg");
        assert_eq!(upload.image.len(), 3);
    }
}
