//! Average Hash (aHash) fingerprinting.
//!
//! aHash works by:
//! 1. Area-averaging the image down to grid_size x grid_size cells
//! 2. Taking each cell's brightness as the mean of its R, G and B channels
//! 3. Computing the mean brightness across all cells
//! 4. For each cell: if brighter than the mean, emit 1, else 0
//!
//! Only relative brightness structure is encoded, so recompression and
//! format conversion barely move the bits. Rotation, flips and heavy crops
//! do, and are accepted misses.

use super::{FingerprintConfig, PerceptualFingerprint, MAX_GRID_SIZE};
use crate::core::input::{FastDecoder, ImageBytes};
use crate::error::HashError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

/// Computes aHash fingerprints at a fixed grid size
#[derive(Debug, Clone, Default)]
pub struct PerceptualFingerprinter {
    config: FingerprintConfig,
}

impl PerceptualFingerprinter {
    pub fn new(config: FingerprintConfig) -> Self {
        Self { config }
    }

    /// Grid edge length; fingerprints carry `grid_size²` bits
    pub fn grid_size(&self) -> u32 {
        self.config.grid_size
    }

    /// Decode the payload and fingerprint it
    pub fn fingerprint(&self, image: &ImageBytes) -> Result<PerceptualFingerprint, HashError> {
        let decoded = FastDecoder::decode(image)?;
        self.fingerprint_image(&decoded)
    }

    /// Fingerprint an already-decoded image
    pub fn fingerprint_image(
        &self,
        image: &DynamicImage,
    ) -> Result<PerceptualFingerprint, HashError> {
        let grid = self.config.grid_size;
        if grid == 0 || grid > MAX_GRID_SIZE {
            return Err(HashError::InvalidInput {
                reason: format!("grid size {} outside 1..={}", grid, MAX_GRID_SIZE),
            });
        }

        let rgb = image.to_rgb8();
        if rgb.width() == 0 || rgb.height() == 0 {
            return Err(HashError::DecodeError {
                reason: "image has no pixels".to_string(),
            });
        }

        let cells = cell_brightness(&rgb, grid);
        let mean = cells.iter().sum::<f64>() / cells.len() as f64;

        PerceptualFingerprint::from_bits(cells.iter().map(|&cell| cell > mean))
    }
}

/// Mean channel brightness of each `grid × grid` cell, row-major.
///
/// Downscaling averages every source pixel into its cell. Images smaller
/// than the grid are upsampled with nearest-neighbour instead, reusing
/// pixels across cells.
fn cell_brightness(rgb: &RgbImage, grid: u32) -> Vec<f64> {
    let (width, height) = rgb.dimensions();
    let cells = if width >= grid && height >= grid {
        imageops::thumbnail(rgb, grid, grid)
    } else {
        imageops::resize(rgb, grid, grid, FilterType::Nearest)
    };

    cells
        .pixels()
        .map(|p| (f64::from(p[0]) + f64::from(p[1]) + f64::from(p[2])) / 3.0)
        .collect()
}
