//! # Input Module
//!
//! The raw upload payload and its decoding into a pixel grid.
//!
//! `ImageBytes` is owned by the calling request for the duration of one
//! check and is never retained by the guard. The payload sits behind an
//! `Arc` so the remote classifier worker can borrow it without copying.

mod decode;

pub use decode::{FastDecoder, ImageFormat};

use crate::error::{GuardError, HashError};
use std::path::Path;
use std::sync::Arc;

/// Raw image payload plus its declared MIME type
#[derive(Debug, Clone)]
pub struct ImageBytes {
    data: Arc<[u8]>,
    mime_type: String,
}

impl ImageBytes {
    /// Wrap an in-memory payload
    pub fn new(data: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            data: Arc::from(data.into()),
            mime_type: mime_type.into(),
        }
    }

    /// Read a payload from disk, inferring the MIME type from the extension
    pub fn from_path(path: &Path) -> Result<Self, GuardError> {
        let data = std::fs::read(path).map_err(|source| GuardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(data, ImageFormat::from_path(path).mime_type()))
    }

    /// The raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Declared MIME type
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Byte length of the payload
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reject empty payloads before any hashing work
    pub fn ensure_readable(&self) -> Result<(), HashError> {
        if self.is_empty() {
            return Err(HashError::InvalidInput {
                reason: "image payload is empty".to_string(),
            });
        }
        Ok(())
    }
}
