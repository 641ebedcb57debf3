//! # Core Module
//!
//! The upload-screening engine, free of any I/O beyond what callers hand it.
//!
//! ## Modules
//! - `input` - Upload payloads and fast decoding
//! - `classifier` - Heuristic vehicle-plausibility gate
//! - `hasher` - Content hash and perceptual fingerprint
//! - `comparator` - Fingerprint similarity and threshold
//! - `duplicate` - Owner-scoped exact and near-duplicate detection
//! - `records` - Prior upload records and reference stores
//! - `pipeline` - Classify, check and commit batches of uploads
//! - `config` - Calibration for all of the above

pub mod classifier;
pub mod comparator;
pub mod config;
pub mod duplicate;
pub mod hasher;
pub mod input;
pub mod pipeline;
pub mod records;

#[cfg(test)]
pub(crate) mod test_images;

// Re-export commonly used types
pub use classifier::{ClassificationReason, ClassificationVerdict, HeuristicImageClassifier};
pub use comparator::{SimilarityComparator, SimilarityThreshold};
pub use hasher::{ContentHash, ContentHasher, PerceptualFingerprint, PerceptualFingerprinter};
pub use input::ImageBytes;
pub use records::{ImageRecord, ListingRef, OwnerId, RecordStore};
