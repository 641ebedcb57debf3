//! # Vehicle Photo Guard
//!
//! Screens photo uploads for vehicle listings before they reach storage.
//!
//! ## What it rejects
//! - **Off-topic images** - icons, documents and flat graphics, caught by
//!   cheap structural heuristics with an optional remote second opinion
//! - **Exact re-uploads** - byte-identical content the owner already has
//! - **Near re-uploads** - recompressed or re-encoded copies, caught by a
//!   perceptual fingerprint
//!
//! Duplicate checks are always scoped to one owner. Two sellers photographing
//! similar cars never collide.
//!
//! ## Architecture
//! - `core` - Classifier, hashers, comparator and the upload pipeline
//! - `events` - Batch progress reporting
//! - `error` - Typed error enums
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use crate::core::config::GuardConfig;
pub use crate::core::duplicate::{DuplicateDetectionService, DuplicateType, DuplicateVerdict};
pub use crate::core::pipeline::{Upload, UploadDecision, UploadGuard};
pub use error::{GuardError, Result};

/// Initialize tracing for the library
///
/// Reads the filter from `RUST_LOG` and writes to stderr. Called by the
/// application entry point; a second call is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
