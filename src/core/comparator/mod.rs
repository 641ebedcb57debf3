//! # Comparator Module
//!
//! Scores how alike two perceptual fingerprints are.
//!
//! ## How It Works
//! 1. Refuse pairs of different lengths (different grid sizes)
//! 2. Count the positions where both bits agree
//! 3. Divide by the fingerprint length: 1.0 is identical, 0.0 is inverted
//! 4. Flag the pair as a near-duplicate when the score meets the threshold
//!
//! ## Reading Scores (64-bit fingerprints)
//! | Differing bits | Similarity | Verdict at 0.90 |
//! |----------------|------------|-----------------|
//! | 0              | 1.000      | near-duplicate  |
//! | 6              | 0.906      | near-duplicate  |
//! | 7              | 0.891      | distinct        |
//! | 32             | 0.500      | distinct        |

mod threshold;

pub use threshold::{SimilarityThreshold, DEFAULT_SIMILARITY_THRESHOLD};

use crate::core::hasher::PerceptualFingerprint;
use crate::error::CompareError;
use serde::{Deserialize, Serialize};

/// Outcome of comparing two fingerprints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Number of differing bits
    pub distance: usize,
    /// Normalized agreement in `[0.0, 1.0]`
    pub similarity: f64,
    /// Whether the similarity met the threshold
    pub is_near_duplicate: bool,
}

/// Number of positions where the two fingerprints differ
pub fn hamming_distance(
    a: &PerceptualFingerprint,
    b: &PerceptualFingerprint,
) -> Result<usize, CompareError> {
    ensure_same_length(a, b)?;
    Ok(a.bits().zip(b.bits()).filter(|(x, y)| x != y).count())
}

/// Fraction of positions where the two fingerprints agree
pub fn similarity(
    a: &PerceptualFingerprint,
    b: &PerceptualFingerprint,
) -> Result<f64, CompareError> {
    let distance = hamming_distance(a, b)?;
    let total = a.len();
    Ok((total - distance) as f64 / total as f64)
}

fn ensure_same_length(
    a: &PerceptualFingerprint,
    b: &PerceptualFingerprint,
) -> Result<(), CompareError> {
    if a.len() != b.len() {
        return Err(CompareError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}

/// Applies a similarity threshold to fingerprint pairs
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityComparator {
    threshold: SimilarityThreshold,
}

impl SimilarityComparator {
    pub fn new(threshold: SimilarityThreshold) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> SimilarityThreshold {
        self.threshold
    }

    /// Normalized Hamming agreement
    pub fn similarity(
        &self,
        a: &PerceptualFingerprint,
        b: &PerceptualFingerprint,
    ) -> Result<f64, CompareError> {
        similarity(a, b)
    }

    /// Score a pair and apply the threshold
    pub fn compare(
        &self,
        a: &PerceptualFingerprint,
        b: &PerceptualFingerprint,
    ) -> Result<Comparison, CompareError> {
        let distance = hamming_distance(a, b)?;
        let similarity = (a.len() - distance) as f64 / a.len() as f64;
        Ok(Comparison {
            distance,
            similarity,
            is_near_duplicate: self.threshold.is_met_by(similarity),
        })
    }

    /// Whether the pair is a near-duplicate
    pub fn is_near_duplicate(
        &self,
        a: &PerceptualFingerprint,
        b: &PerceptualFingerprint,
    ) -> Result<bool, CompareError> {
        Ok(self.compare(a, b)?.is_near_duplicate)
    }
}
