//! # Hasher Module
//!
//! Computes the two keys every upload is checked under.
//!
//! ## Keys
//! - **ContentHash** - SHA-256 over the raw bytes, the exact-duplicate key
//! - **PerceptualFingerprint** - aHash over a small luminance grid, the
//!   near-duplicate key
//!
//! ## How the fingerprint works
//! 1. Box-filter the image down to an 8x8 grid (configurable)
//! 2. Average R, G and B per cell
//! 3. Set a bit for each cell brighter than the grid mean
//!
//! Changing the grid size changes the fingerprint length. Every stored
//! fingerprint must be recomputed when it changes, otherwise comparisons
//! fail with `LengthMismatch`.
//!
//! ## Example
//! ```rust,ignore
//! use vehicle_photo_guard::core::hasher::{FingerprintConfig, PerceptualFingerprinter};
//!
//! let fingerprinter = PerceptualFingerprinter::new(FingerprintConfig::new().grid_size(8));
//! let fingerprint = fingerprinter.fingerprint(&image)?;
//! ```

mod average;
mod content;
mod fingerprint;

pub use average::PerceptualFingerprinter;
pub use content::{ContentHash, ContentHasher, CONTENT_HASH_LEN};
pub use fingerprint::PerceptualFingerprint;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Reference grid edge length (8x8 = 64 bits)
pub const DEFAULT_GRID_SIZE: u32 = 8;

/// Largest accepted grid edge length (4096 bits)
pub const MAX_GRID_SIZE: u32 = 64;

/// Configuration builder for the fingerprinter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// Grid edge length
    pub grid_size: u32,
}

impl FingerprintConfig {
    /// Create a configuration with the reference grid size
    pub fn new() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
        }
    }

    /// Set the grid edge length
    ///
    /// - 8: 64 bits, the reference design
    /// - 16: 256 bits, finer structure, less tolerant of crops
    pub fn grid_size(mut self, size: u32) -> Self {
        self.grid_size = size;
        self
    }

    /// Number of bits fingerprints carry under this configuration
    pub fn bit_count(&self) -> usize {
        (self.grid_size as usize).pow(2)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 || self.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::Invalid {
                field: "grid_size",
                reason: format!("must be between 1 and {}", MAX_GRID_SIZE),
            });
        }
        Ok(())
    }

    /// Build the fingerprinter
    pub fn build(self) -> Result<PerceptualFingerprinter, ConfigError> {
        self.validate()?;
        Ok(PerceptualFingerprinter::new(self))
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self::new()
    }
}
