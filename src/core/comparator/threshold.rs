//! The near-duplicate decision threshold.

use crate::error::CompareError;
use serde::{Deserialize, Serialize};

/// Reference threshold: 90% of bits must agree
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.90;

/// Minimum Hamming agreement for a pair to count as a near-duplicate
///
/// Raising it reduces false duplicate flags but lets more aggressively
/// edited re-uploads through. Lowering it does the reverse. The value is a
/// calibration knob, tune it against a labelled corpus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SimilarityThreshold(f64);

impl SimilarityThreshold {
    /// Create a threshold in `[0.0, 1.0]`
    pub fn new(value: f64) -> Result<Self, CompareError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(CompareError::InvalidThreshold { value });
        }
        Ok(Self(value))
    }

    /// Conservative threshold (0.95): fewer false flags
    pub fn conservative() -> Self {
        Self(0.95)
    }

    /// Reference threshold (0.90)
    pub fn balanced() -> Self {
        Self(DEFAULT_SIMILARITY_THRESHOLD)
    }

    /// Permissive threshold (0.85): catches heavier edits
    pub fn permissive() -> Self {
        Self(0.85)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Whether a similarity score meets the threshold
    pub fn is_met_by(&self, similarity: f64) -> bool {
        similarity >= self.0
    }

    /// Human-readable description
    pub fn description(&self) -> String {
        format!(
            "Fingerprints agreeing on at least {:.0}% of bits are near-duplicates",
            self.0 * 100.0
        )
    }
}

impl Default for SimilarityThreshold {
    fn default() -> Self {
        Self::balanced()
    }
}

impl TryFrom<f64> for SimilarityThreshold {
    type Error = CompareError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SimilarityThreshold> for f64 {
    fn from(threshold: SimilarityThreshold) -> Self {
        threshold.0
    }
}
