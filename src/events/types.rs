//! Event type definitions for batch progress reporting.

use crate::core::duplicate::DuplicateType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// All events emitted while guarding a batch of uploads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Batch-level events
    Batch(BatchEvent),
    /// Per-upload events
    Upload(UploadEvent),
}

/// Batch-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BatchEvent {
    /// Evaluation has started
    Started { total_uploads: usize },
    /// All uploads have been evaluated
    Completed { summary: BatchSummary },
}

/// Events for a single upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UploadEvent {
    /// The classifier rejected the upload
    Rejected { file_name: String, reason: String },
    /// The upload repeats a prior record
    Duplicate {
        file_name: String,
        duplicate_type: DuplicateType,
        matched_record: Uuid,
    },
    /// The upload passed both gates
    Accepted {
        file_name: String,
        content_hash: String,
    },
    /// An accepted upload was written to the record store
    Committed { file_name: String, record_id: Uuid },
    /// The upload could not be read
    Error { file_name: String, message: String },
    /// Progress update after each upload
    Progress(UploadProgress),
}

/// Progress information while evaluating a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadProgress {
    /// Uploads evaluated so far
    pub completed: usize,
    /// Uploads in the batch
    pub total: usize,
    /// Upload that was just evaluated
    pub current_file: String,
}

/// Summary of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub accepted: usize,
    pub not_vehicle: usize,
    pub duplicates: usize,
    pub errors: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}
