//! Guard-wide configuration.
//!
//! Every calibration knob lives here with its reference value as default.
//! Component configs are derived from it so one JSON file tunes the whole
//! guard.

use crate::core::classifier::{
    ClassifierConfig, DEFAULT_COLOR_VARIANCE_FLOOR, DEFAULT_MIN_BYTE_LEN, DEFAULT_VEHICLE_TOKENS,
};
use crate::core::comparator::{SimilarityThreshold, DEFAULT_SIMILARITY_THRESHOLD};
use crate::core::hasher::{FingerprintConfig, DEFAULT_GRID_SIZE};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Calibration for the classifier, fingerprinter and comparator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Fingerprint grid edge length
    pub grid_size: u32,
    /// Minimum Hamming agreement for a near-duplicate
    pub similarity_threshold: f64,
    /// Classifier size floor in bytes
    pub min_byte_len: usize,
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
    pub color_variance_floor: f64,
    pub variance_sample_stride: usize,
    pub vehicle_tokens: Vec<String>,
    /// Remote classifier endpoint, if any
    pub remote_url: Option<String>,
    pub remote_timeout_ms: u64,
}

impl GuardConfig {
    pub fn new() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_byte_len: DEFAULT_MIN_BYTE_LEN,
            min_aspect_ratio: 0.5,
            max_aspect_ratio: 3.0,
            color_variance_floor: DEFAULT_COLOR_VARIANCE_FLOOR,
            variance_sample_stride: 10,
            vehicle_tokens: DEFAULT_VEHICLE_TOKENS.iter().map(|t| t.to_string()).collect(),
            remote_url: None,
            remote_timeout_ms: 5_000,
        }
    }

    /// Load from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn grid_size(mut self, size: u32) -> Self {
        self.grid_size = size;
        self
    }

    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
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

    pub fn remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    pub fn remote_timeout_ms(mut self, millis: u64) -> Self {
        self.remote_timeout_ms = millis;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fingerprint_config().validate()?;
        self.threshold()?;
        self.classifier_config().validate()
    }

    pub fn fingerprint_config(&self) -> FingerprintConfig {
        FingerprintConfig::new().grid_size(self.grid_size)
    }

    pub fn threshold(&self) -> Result<SimilarityThreshold, ConfigError> {
        SimilarityThreshold::new(self.similarity_threshold).map_err(|e| ConfigError::Invalid {
            field: "similarity_threshold",
            reason: e.to_string(),
        })
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig::new()
            .min_byte_len(self.min_byte_len)
            .aspect_ratio_range(self.min_aspect_ratio, self.max_aspect_ratio)
            .color_variance_floor(self.color_variance_floor)
            .variance_sample_stride(self.variance_sample_stride)
            .vehicle_tokens(self.vehicle_tokens.iter().cloned())
            .remote_timeout(self.remote_timeout())
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_reference_values() {
        let config = GuardConfig::default();
        assert_eq!(config.grid_size, 8);
        assert_eq!(config.similarity_threshold, 0.90);
        assert_eq!(config.min_byte_len, 50_000);
        assert_eq!(config.color_variance_floor, 1000.0);
        assert_eq!(config.remote_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn derived_configs_follow_settings() {
        let config = GuardConfig::new()
            .grid_size(16)
            .similarity_threshold(0.95)
            .min_byte_len(1_000)
            .remote_timeout_ms(250);

        assert_eq!(config.fingerprint_config().bit_count(), 256);
        assert_eq!(config.threshold().unwrap().value(), 0.95);

        let classifier = config.classifier_config();
        assert_eq!(classifier.min_byte_len, 1_000);
        assert_eq!(classifier.remote_timeout, Duration::from_millis(250));
        assert_eq!(classifier.vehicle_tokens, config.vehicle_tokens);
    }

    #[test]
    fn invalid_values_name_the_field() {
        let cases = [
            (GuardConfig::new().grid_size(0), "grid_size"),
            (GuardConfig::new().grid_size(65_536), "grid_size"),
            (GuardConfig::new().similarity_threshold(1.5), "similarity_threshold"),
            (GuardConfig::new().aspect_ratio_range(2.0, 1.0), "aspect_ratio"),
            (GuardConfig::new().variance_sample_stride(0), "variance_sample_stride"),
            (GuardConfig::new().color_variance_floor(-1.0), "color_variance_floor"),
            (GuardConfig::new().remote_timeout_ms(0), "remote_timeout"),
        ];

        for (config, expected) in cases {
            match config.validate() {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected invalid {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("guard.json");
        fs::write(&path, r#"{"similarity_threshold": 0.85, "vehicle_tokens": ["kfz"]}"#).unwrap();

        let config = GuardConfig::from_json_file(&path).unwrap();
        assert_eq!(config.similarity_threshold, 0.85);
        assert_eq!(config.vehicle_tokens, vec!["kfz".to_string()]);
        assert_eq!(config.grid_size, 8);
        assert_eq!(config.min_byte_len, 50_000);
    }

    #[test]
    fn unreadable_and_malformed_files() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            GuardConfig::from_json_file(&missing),
            Err(ConfigError::Read { .. })
        ));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            GuardConfig::from_json_file(&broken),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn file_values_are_validated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("guard.json");
        fs::write(&path, r#"{"grid_size": 0}"#).unwrap();
        assert!(matches!(
            GuardConfig::from_json_file(&path),
            Err(ConfigError::Invalid { field: "grid_size", .. })
        ));
    }
}
