//! # Error Module
//!
//! Typed errors for the upload guard.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Unreadable is not safe** - decode failures surface, they never read as "not a duplicate"
//! - **Loud configuration drift** - mismatched fingerprint sizes are errors, not skips
//! - **Fail closed** - remote classifier outages become rejections inside the classifier

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while hashing or fingerprinting image bytes
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Failed to decode image: {reason}")]
    DecodeError { reason: String },

    #[error("Invalid perceptual fingerprint: {reason}")]
    InvalidFingerprint { reason: String },

    #[error("Invalid content hash: {value}")]
    InvalidContentHash { value: String },
}

/// Errors raised while comparing fingerprints
#[derive(Error, Debug, PartialEq)]
pub enum CompareError {
    #[error(
        "Fingerprint length mismatch: {left} vs {right} bits. \
         Stored fingerprints were produced with a different grid size."
    )]
    LengthMismatch { left: usize, right: usize },

    #[error("Invalid similarity threshold: {value} (must be 0.0-1.0)")]
    InvalidThreshold { value: f64 },
}

/// Errors raised by the optional remote classifier
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Remote classifier unavailable: {reason}")]
    RemoteClassifierUnavailable { reason: String },
}

/// Errors raised by image record stores
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open record database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Record store corruption detected at {path}. Delete this file and try again.")]
    Corrupted { path: PathBuf },

    #[error("Owner {owner_id} already has a record for content {content_hash}")]
    DuplicateContent {
        owner_id: String,
        content_hash: String,
    },
}

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, GuardError>;
