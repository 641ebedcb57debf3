//! Upload guard implementation.

use super::{Upload, UploadDecision};
use crate::core::classifier::{HeuristicImageClassifier, ImageClassifierDelegate};
use crate::core::comparator::SimilarityComparator;
use crate::core::config::GuardConfig;
use crate::core::duplicate::DuplicateDetectionService;
use crate::core::records::{ImageRecord, ListingRef, OwnerId, RecordStore};
use crate::error::{GuardError, StoreError};
use crate::events::{
    null_sender, BatchEvent, BatchSummary, Event, EventSender, UploadEvent, UploadProgress,
};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Result for one upload in a batch
#[derive(Debug)]
pub struct UploadOutcome {
    pub file_name: String,
    /// Decision, or the error that made the upload unreadable
    pub result: Result<UploadDecision, GuardError>,
    /// Record written for this upload (sequential mode only)
    pub committed: Option<ImageRecord>,
}

/// Outcomes in input order plus totals
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<UploadOutcome>,
    pub summary: BatchSummary,
}

impl BatchReport {
    /// Count an upload that could not even be loaded
    pub fn record_unreadable(&mut self, file_name: impl Into<String>, error: GuardError) {
        self.outcomes.push(UploadOutcome {
            file_name: file_name.into(),
            result: Err(error),
            committed: None,
        });
        self.summary.total += 1;
        self.summary.errors += 1;
    }
}

/// Builder for an [`UploadGuard`]
#[derive(Default)]
pub struct UploadGuardBuilder {
    config: GuardConfig,
    delegate: Option<Arc<dyn ImageClassifierDelegate>>,
}

impl UploadGuardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: GuardConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this remote classifier instead of one built from `remote_url`
    pub fn delegate(mut self, delegate: Arc<dyn ImageClassifierDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Validate the configuration and build the guard
    pub fn build(self) -> Result<UploadGuard, GuardError> {
        self.config.validate()?;

        let fingerprinter = self.config.fingerprint_config().build()?;
        let comparator = SimilarityComparator::new(self.config.threshold()?);
        let mut classifier = HeuristicImageClassifier::new(self.config.classifier_config());

        let delegate = match self.delegate {
            Some(delegate) => Some(delegate),
            None => remote_delegate(&self.config)?,
        };
        if let Some(delegate) = delegate {
            classifier = classifier.with_delegate(delegate);
        }

        Ok(UploadGuard {
            classifier,
            detector: DuplicateDetectionService::new(fingerprinter, comparator),
        })
    }
}

#[cfg(feature = "remote")]
fn remote_delegate(
    config: &GuardConfig,
) -> Result<Option<Arc<dyn ImageClassifierDelegate>>, GuardError> {
    use crate::core::classifier::HttpClassifierDelegate;

    match &config.remote_url {
        Some(url) => {
            let delegate: Arc<dyn ImageClassifierDelegate> = Arc::new(
                HttpClassifierDelegate::new(url.clone(), config.remote_timeout())?,
            );
            Ok(Some(delegate))
        }
        None => Ok(None),
    }
}

#[cfg(not(feature = "remote"))]
fn remote_delegate(
    config: &GuardConfig,
) -> Result<Option<Arc<dyn ImageClassifierDelegate>>, GuardError> {
    match &config.remote_url {
        Some(_) => Err(crate::error::ConfigError::Invalid {
            field: "remote_url",
            reason: "built without the `remote` feature".to_string(),
        }
        .into()),
        None => Ok(None),
    }
}

/// Classifier and duplicate detector wired from one configuration
#[derive(Debug, Clone, Default)]
pub struct UploadGuard {
    classifier: HeuristicImageClassifier,
    detector: DuplicateDetectionService,
}

impl UploadGuard {
    pub fn builder() -> UploadGuardBuilder {
        UploadGuardBuilder::new()
    }

    pub fn from_config(config: GuardConfig) -> Result<Self, GuardError> {
        Self::builder().config(config).build()
    }

    pub fn classifier(&self) -> &HeuristicImageClassifier {
        &self.classifier
    }

    pub fn detector(&self) -> &DuplicateDetectionService {
        &self.detector
    }

    /// Classify, then check for duplicates among `prior_records`
    pub fn evaluate(
        &self,
        owner: &OwnerId,
        upload: &Upload,
        prior_records: &[ImageRecord],
    ) -> Result<UploadDecision, GuardError> {
        let classification = self.classifier.classify(&upload.image, &upload.file_name);
        if !classification.accepted {
            return Ok(UploadDecision::NotVehicle(classification));
        }

        let verdict = self.detector.check(owner, &upload.image, prior_records)?;
        if verdict.is_duplicate {
            return Ok(UploadDecision::Duplicate(verdict));
        }

        Ok(UploadDecision::Accepted {
            classification,
            content_hash: verdict.content_hash,
            fingerprint: verdict.fingerprint,
        })
    }

    /// Evaluate independent uploads in parallel against the same records.
    ///
    /// Uploads are not compared with each other.
    pub fn evaluate_batch(
        &self,
        owner: &OwnerId,
        uploads: &[Upload],
        prior_records: &[ImageRecord],
        events: &EventSender,
    ) -> BatchReport {
        let start_time = Instant::now();
        let total = uploads.len();
        let completed = AtomicUsize::new(0);

        events.send(Event::Batch(BatchEvent::Started {
            total_uploads: total,
        }));

        let outcomes: Vec<UploadOutcome> = uploads
            .par_iter()
            .map(|upload| {
                let result = self.evaluate(owner, upload, prior_records);
                report(events, &upload.file_name, &result);
                progress(events, &completed, total, &upload.file_name);
                UploadOutcome {
                    file_name: upload.file_name.clone(),
                    result,
                    committed: None,
                }
            })
            .collect();

        finish(events, outcomes, start_time)
    }

    /// Evaluate uploads one by one, committing each accepted upload to
    /// `store` before checking the next.
    ///
    /// Unreadable uploads are reported in their outcome. Store failures
    /// abort the batch.
    pub fn process_sequential(
        &self,
        owner: &OwnerId,
        listing: &ListingRef,
        uploads: &[Upload],
        store: &dyn RecordStore,
        events: &EventSender,
    ) -> Result<BatchReport, GuardError> {
        let start_time = Instant::now();
        let total = uploads.len();
        let completed = AtomicUsize::new(0);
        let mut outcomes = Vec::with_capacity(total);

        events.send(Event::Batch(BatchEvent::Started {
            total_uploads: total,
        }));

        for upload in uploads {
            let prior = store.records_for_owner(owner)?;
            let mut result = self.evaluate(owner, upload, &prior);
            report(events, &upload.file_name, &result);

            let mut committed = None;
            if let Ok(decision) = &result {
                if let Some(record) = decision.clone().into_record(owner.clone(), listing.clone())
                {
                    match store.insert(record.clone()) {
                        Ok(()) => {
                            events.send(Event::Upload(UploadEvent::Committed {
                                file_name: upload.file_name.clone(),
                                record_id: record.id,
                            }));
                            committed = Some(record);
                        }
                        Err(e @ StoreError::DuplicateContent { .. }) => {
                            // Another writer stored the same content since we read
                            warn!(file_name = %upload.file_name, error = %e, "Commit raced");
                            result = Err(e.into());
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }

            progress(events, &completed, total, &upload.file_name);
            outcomes.push(UploadOutcome {
                file_name: upload.file_name.clone(),
                result,
                committed,
            });
        }

        Ok(finish(events, outcomes, start_time))
    }

    /// Sequential processing without event reporting
    pub fn process(
        &self,
        owner: &OwnerId,
        listing: &ListingRef,
        uploads: &[Upload],
        store: &dyn RecordStore,
    ) -> Result<BatchReport, GuardError> {
        self.process_sequential(owner, listing, uploads, store, &null_sender())
    }
}

fn report(events: &EventSender, file_name: &str, result: &Result<UploadDecision, GuardError>) {
    let file_name = file_name.to_string();
    let event = match result {
        Ok(UploadDecision::NotVehicle(verdict)) => UploadEvent::Rejected {
            file_name,
            reason: verdict.reason.to_string(),
        },
        Ok(UploadDecision::Duplicate(verdict)) => UploadEvent::Duplicate {
            file_name,
            duplicate_type: verdict.duplicate_type,
            matched_record: verdict
                .matched_record
                .as_ref()
                .map(|r| r.id)
                .unwrap_or_default(),
        },
        Ok(UploadDecision::Accepted { content_hash, .. }) => UploadEvent::Accepted {
            file_name,
            content_hash: content_hash.to_string(),
        },
        Err(e) => UploadEvent::Error {
            file_name,
            message: e.to_string(),
        },
    };
    events.send(Event::Upload(event));
}

fn progress(events: &EventSender, completed: &AtomicUsize, total: usize, file_name: &str) {
    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
    events.send(Event::Upload(UploadEvent::Progress(UploadProgress {
        completed: done,
        total,
        current_file: file_name.to_string(),
    })));
}

fn finish(events: &EventSender, outcomes: Vec<UploadOutcome>, start_time: Instant) -> BatchReport {
    let mut summary = BatchSummary {
        total: outcomes.len(),
        ..BatchSummary::default()
    };
    for outcome in &outcomes {
        match &outcome.result {
            Ok(UploadDecision::Accepted { .. }) => summary.accepted += 1,
            Ok(UploadDecision::NotVehicle(_)) => summary.not_vehicle += 1,
            Ok(UploadDecision::Duplicate(_)) => summary.duplicates += 1,
            Err(_) => summary.errors += 1,
        }
    }
    summary.duration_ms = start_time.elapsed().as_millis() as u64;

    info!(
        total = summary.total,
        accepted = summary.accepted,
        not_vehicle = summary.not_vehicle,
        duplicates = summary.duplicates,
        errors = summary.errors,
        "Batch evaluated"
    );
    events.send(Event::Batch(BatchEvent::Completed {
        summary: summary.clone(),
    }));

    BatchReport { outcomes, summary }
}
