//! Vehicle-plausibility classification using structural heuristics.
//!
//! Combines byte size, filename tokens, aspect ratio and colour variance,
//! with an optional remote second opinion.

use super::remote::{ask_with_timeout, ImageClassifierDelegate};
use super::ClassifierConfig;
use crate::core::input::{FastDecoder, ImageBytes};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why the classifier decided the way it did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassificationReason {
    /// Payload is below the size floor
    TooSmall { byte_len: usize, min_byte_len: usize },
    /// Filename carries a vehicle token
    FilenameMatch { token: String },
    /// Dimensions or pixels could not be read
    Undecodable { reason: String },
    /// `width / height` is outside the accepted range
    AspectRatioOutOfRange { ratio: f64 },
    /// Sampled colour variance is below the floor
    LowColorVariance { variance: f64 },
    /// All local checks passed and no remote classifier is configured
    PassedStructuralChecks,
    /// Remote classifier said it is a vehicle
    RemoteConfirmed,
    /// Remote classifier said it is not a vehicle
    RemoteRejected,
    /// Remote classifier failed or timed out
    RemoteUnavailable { reason: String },
}

impl fmt::Display for ClassificationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooSmall {
                byte_len,
                min_byte_len,
            } => write!(f, "File is {} bytes, below the {} byte floor", byte_len, min_byte_len),
            Self::FilenameMatch { token } => write!(f, "Filename contains '{}'", token),
            Self::Undecodable { reason } => write!(f, "Image could not be read: {}", reason),
            Self::AspectRatioOutOfRange { ratio } => {
                write!(f, "Aspect ratio {:.2} is outside the accepted range", ratio)
            }
            Self::LowColorVariance { variance } => {
                write!(f, "Colour variance {:.1} is too low for a photograph", variance)
            }
            Self::PassedStructuralChecks => write!(f, "Passed structural checks"),
            Self::RemoteConfirmed => write!(f, "Remote classifier confirmed a vehicle"),
            Self::RemoteRejected => write!(f, "Remote classifier found no vehicle"),
            Self::RemoteUnavailable { reason } => {
                write!(f, "Remote classifier unavailable: {}", reason)
            }
        }
    }
}

/// Accept/reject decision for one upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    pub accepted: bool,
    pub reason: ClassificationReason,
}

impl ClassificationVerdict {
    pub fn accept(reason: ClassificationReason) -> Self {
        Self {
            accepted: true,
            reason,
        }
    }

    pub fn reject(reason: ClassificationReason) -> Self {
        Self {
            accepted: false,
            reason,
        }
    }
}

/// Heuristic gate run on every upload before hashing
#[derive(Clone, Default)]
pub struct HeuristicImageClassifier {
    config: ClassifierConfig,
    delegate: Option<Arc<dyn ImageClassifierDelegate>>,
}

impl fmt::Debug for HeuristicImageClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeuristicImageClassifier")
            .field("config", &self.config)
            .field("delegate", &self.delegate.as_ref().map(|d| d.name().to_string()))
            .finish()
    }
}

impl HeuristicImageClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            delegate: None,
        }
    }

    /// Consult `delegate` when every local check passes
    pub fn with_delegate(mut self, delegate: Arc<dyn ImageClassifierDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify one upload. Never fails: unreadable images are rejections.
    pub fn classify(&self, image: &ImageBytes, file_name: &str) -> ClassificationVerdict {
        let verdict = self.evaluate(image, file_name);
        debug!(
            file_name,
            byte_len = image.len(),
            accepted = verdict.accepted,
            reason = %verdict.reason,
            "Classified upload"
        );
        verdict
    }

    fn evaluate(&self, image: &ImageBytes, file_name: &str) -> ClassificationVerdict {
        if image.len() < self.config.min_byte_len {
            return ClassificationVerdict::reject(ClassificationReason::TooSmall {
                byte_len: image.len(),
                min_byte_len: self.config.min_byte_len,
            });
        }

        if let Some(token) = self.vehicle_token(file_name) {
            return ClassificationVerdict::accept(ClassificationReason::FilenameMatch {
                token: token.to_string(),
            });
        }

        let (width, height) = match FastDecoder::dimensions(image) {
            Ok(dimensions) => dimensions,
            Err(e) => return undecodable(e.to_string()),
        };
        if width == 0 || height == 0 {
            return undecodable(format!("degenerate dimensions {}x{}", width, height));
        }

        let ratio = width as f64 / height as f64;
        if ratio < self.config.min_aspect_ratio || ratio > self.config.max_aspect_ratio {
            return ClassificationVerdict::reject(ClassificationReason::AspectRatioOutOfRange {
                ratio,
            });
        }

        let decoded = match FastDecoder::decode(image) {
            Ok(decoded) => decoded,
            Err(e) => return undecodable(e.to_string()),
        };

        let variance = color_variance(&decoded, self.config.variance_sample_stride);
        if variance < self.config.color_variance_floor {
            return ClassificationVerdict::reject(ClassificationReason::LowColorVariance {
                variance,
            });
        }

        match &self.delegate {
            Some(delegate) => self.ask_delegate(delegate, image),
            None => ClassificationVerdict::accept(ClassificationReason::PassedStructuralChecks),
        }
    }

    fn vehicle_token(&self, file_name: &str) -> Option<&str> {
        let lower = file_name.to_lowercase();
        self.config
            .vehicle_tokens
            .iter()
            .find(|token| !token.is_empty() && lower.contains(&token.to_lowercase()))
            .map(String::as_str)
    }

    fn ask_delegate(
        &self,
        delegate: &Arc<dyn ImageClassifierDelegate>,
        image: &ImageBytes,
    ) -> ClassificationVerdict {
        match ask_with_timeout(delegate, image, self.config.remote_timeout) {
            Ok(true) => ClassificationVerdict::accept(ClassificationReason::RemoteConfirmed),
            Ok(false) => ClassificationVerdict::reject(ClassificationReason::RemoteRejected),
            Err(e) => {
                warn!(delegate = delegate.name(), error = %e, "Remote classifier failed, rejecting");
                ClassificationVerdict::reject(ClassificationReason::RemoteUnavailable {
                    reason: e.to_string(),
                })
            }
        }
    }
}

fn undecodable(reason: String) -> ClassificationVerdict {
    ClassificationVerdict::reject(ClassificationReason::Undecodable { reason })
}

/// Population variance of `R+G+B` over every `stride`-th pixel in raster order
pub fn color_variance(image: &DynamicImage, stride: usize) -> f64 {
    let rgb = image.to_rgb8();
    let samples: Vec<f64> = rgb
        .pixels()
        .step_by(stride.max(1))
        .map(|p| f64::from(p[0]) + f64::from(p[1]) + f64::from(p[2]))
        .collect();

    if samples.is_empty() {
        return 0.0;
    }

    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}
