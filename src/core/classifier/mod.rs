//! # Classifier Module
//!
//! Cheap structural checks that decide whether an upload plausibly shows a
//! vehicle before any hashing happens.
//!
//! ## Rules (first decisive rule wins)
//! 1. **Size floor** - tiny files are icons and screenshots
//! 2. **Filename signal** - a vehicle token in the name accepts outright
//! 3. **Aspect ratio** - extreme portrait/panorama shapes are documents
//! 4. **Colour variance** - near-uniform images are logos and blank scans
//! 5. **Remote fallback** - optional second opinion, fails closed
//!
//! The size floor runs before the filename signal, so a tiny file is
//! rejected even when honestly named.

mod detector;
mod remote;

pub use detector::{
    color_variance, ClassificationReason, ClassificationVerdict, HeuristicImageClassifier,
};
pub use remote::ImageClassifierDelegate;
#[cfg(feature = "remote")]
pub use remote::HttpClassifierDelegate;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reference size floor in bytes
pub const DEFAULT_MIN_BYTE_LEN: usize = 50_000;

/// Reference colour-variance floor over per-pixel `R+G+B`
pub const DEFAULT_COLOR_VARIANCE_FLOOR: f64 = 1000.0;

/// Filename tokens that mark an upload as vehicle-related
pub const DEFAULT_VEHICLE_TOKENS: &[&str] = &[
    "car", "auto", "vehicle", "truck", "suv", "sedan", "coupe", "pickup", "voiture", "coche",
    "wagen", "fahrzeug", "carro", "macchina", "samochod", "pojazd",
];

/// Tunable thresholds for the heuristic classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Files smaller than this are rejected
    pub min_byte_len: usize,
    /// Lowest accepted `width / height`
    pub min_aspect_ratio: f64,
    /// Highest accepted `width / height`
    pub max_aspect_ratio: f64,
    /// Images whose sampled colour variance falls below this are rejected
    pub color_variance_floor: f64,
    /// Sample every Nth pixel (raster order) for the variance check
    pub variance_sample_stride: usize,
    /// Lowercase filename tokens that short-circuit to accept
    pub vehicle_tokens: Vec<String>,
    /// Upper bound on the remote fallback call
    pub remote_timeout: Duration,
}

impl ClassifierConfig {
    pub fn new() -> Self {
        Self {
            min_byte_len: DEFAULT_MIN_BYTE_LEN,
            min_aspect_ratio: 0.5,
            max_aspect_ratio: 3.0,
            color_variance_floor: DEFAULT_COLOR_VARIANCE_FLOOR,
            variance_sample_stride: 10,
            vehicle_tokens: DEFAULT_VEHICLE_TOKENS.iter().map(|t| t.to_string()).collect(),
            remote_timeout: Duration::from_secs(5),
        }
    }

    pub fn min_byte_len(mut self, bytes: usize) -> Self {
        self.min_byte_len = bytes;
        self
    }

    pub fn aspect_ratio_range(mut self, min: f64, max: f64) -> Self {
        self.min_aspect_ratio = min;
        self.max_aspect_ratio = max;
        self
    }

    pub fn color_variance_floor(mut self, floor: f64) -> Self {
        self.color_variance_floor = floor;
        self
    }

    pub fn variance_sample_stride(mut self, stride: usize) -> Self {
        self.variance_sample_stride = stride;
        self
    }

    pub fn vehicle_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vehicle_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_aspect_ratio > 0.0 && self.min_aspect_ratio <= self.max_aspect_ratio) {
            return Err(ConfigError::Invalid {
                field: "aspect_ratio",
                reason: format!(
                    "need 0 < min <= max, got [{}, {}]",
                    self.min_aspect_ratio, self.max_aspect_ratio
                ),
            });
        }
        if !(self.color_variance_floor >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "color_variance_floor",
                reason: format!("must be non-negative, got {}", self.color_variance_floor),
            });
        }
        if self.variance_sample_stride == 0 {
            return Err(ConfigError::Invalid {
                field: "variance_sample_stride",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.remote_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "remote_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::new()
    }
}
