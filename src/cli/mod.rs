//! # CLI Module
//!
//! Command-line front end for the upload guard.
//!
//! ## Usage
//! ```bash
//! # Check photos for one owner without storing anything
//! photo-guard check front.jpg rear.jpg --owner dealer-7
//!
//! # Check and record accepted photos for a listing
//! photo-guard check *.jpg --owner dealer-7 --listing audi-a4 --commit
//!
//! # Every image under a directory, JSON output
//! photo-guard scan ~/uploads --owner dealer-7 --output json
//!
//! # Inspect the keys of one photo, or compare two
//! photo-guard hash front.jpg
//! photo-guard compare front.jpg front.png
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::warn;
use vehicle_photo_guard::core::comparator::{SimilarityComparator, SimilarityThreshold};
use vehicle_photo_guard::core::config::GuardConfig;
use vehicle_photo_guard::core::duplicate::DuplicateType;
use vehicle_photo_guard::core::hasher::{ContentHasher, FingerprintConfig};
use vehicle_photo_guard::core::input::{ImageBytes, ImageFormat};
use vehicle_photo_guard::core::pipeline::{BatchReport, Upload, UploadDecision, UploadGuard};
use vehicle_photo_guard::core::records::{
    InMemoryRecordStore, ListingRef, OwnerId, RecordStore, SqliteRecordStore,
};
use vehicle_photo_guard::error::{CompareError, ConfigError, Result};
use vehicle_photo_guard::events::{BatchEvent, Event, EventChannel, UploadEvent};
use walkdir::WalkDir;

/// Vehicle Photo Guard - keep duplicate and off-topic photos out of listings
#[derive(Parser, Debug)]
#[command(name = "photo-guard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check photo files as uploads for one owner
    Check {
        /// Photo files, in upload order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        guard: GuardArgs,
    },
    /// Check every image under a directory
    Scan {
        /// Directory to walk
        dir: PathBuf,

        /// Include hidden files and directories
        #[arg(long)]
        include_hidden: bool,

        #[command(flatten)]
        guard: GuardArgs,
    },
    /// Print the content hash and perceptual fingerprint of a photo
    Hash {
        file: PathBuf,

        /// Fingerprint grid edge length
        #[arg(long, default_value = "8")]
        grid_size: u32,

        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
    /// Compare the perceptual fingerprints of two photos
    Compare {
        a: PathBuf,
        b: PathBuf,

        /// Similarity threshold (0.0-1.0)
        #[arg(short, long, default_value = "0.9")]
        threshold: f64,

        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Args, Debug)]
struct GuardArgs {
    /// Uploading owner
    #[arg(long)]
    owner: String,

    /// Listing the photos belong to
    #[arg(long, default_value = "default")]
    listing: String,

    /// Record database path
    #[arg(long)]
    db: Option<PathBuf>,

    /// Store accepted photos in the record database
    #[arg(long)]
    commit: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Similarity threshold override (0.0-1.0)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Remote classifier endpoint
    #[arg(long)]
    remote_url: Option<String>,

    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    vehicle_photo_guard::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { files, guard } => run_guard(files, &guard),
        Commands::Scan {
            dir,
            include_hidden,
            guard,
        } => {
            let files = find_images(&dir, include_hidden);
            run_guard(files, &guard)
        }
        Commands::Hash {
            file,
            grid_size,
            output,
        } => run_hash(&file, grid_size, output),
        Commands::Compare {
            a,
            b,
            threshold,
            output,
        } => run_compare(&a, &b, threshold, output),
    }
}

fn load_config(args: &GuardArgs) -> Result<GuardConfig> {
    let mut config = match &args.config {
        Some(path) => GuardConfig::from_json_file(path)?,
        None => GuardConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config = config.similarity_threshold(threshold);
    }
    if let Some(url) = &args.remote_url {
        config = config.remote_url(url.clone());
    }
    Ok(config)
}

fn find_images(dir: &Path, include_hidden: bool) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            include_hidden || e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.')
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| ImageFormat::from_path(p) != ImageFormat::Other)
        .collect();
    files.sort();
    files
}

fn run_guard(files: Vec<PathBuf>, args: &GuardArgs) -> Result<()> {
    let term = Term::stderr();
    let config = load_config(args)?;
    let guard = UploadGuard::from_config(config)?;

    let owner = OwnerId::new(args.owner.clone());
    let listing = ListingRef::new(args.listing.clone());

    if matches!(args.output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Vehicle Photo Guard").bold().cyan(),
            style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let mut uploads = Vec::with_capacity(files.len());
    let mut unreadable = Vec::new();
    for path in &files {
        match Upload::from_path(path) {
            Ok(upload) => uploads.push(upload),
            Err(e) => unreadable.push((path.display().to_string(), e)),
        }
    }

    let db_path = args.db.clone().unwrap_or_else(SqliteRecordStore::default_path);
    let database = SqliteRecordStore::open(&db_path)?;

    // Without --commit, accepted photos go to a scratch copy of the owner's
    // records so later files in the same run are still checked against them
    let scratch;
    let store: &dyn RecordStore = if args.commit {
        &database
    } else {
        scratch = InMemoryRecordStore::new();
        for record in database.records_for_owner(&owner)? {
            scratch.insert(record)?;
        }
        &scratch
    };

    let (sender, receiver) = EventChannel::new();

    let progress = if matches!(args.output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(uploads.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(pb) = &progress_clone else {
                continue;
            };
            match event {
                Event::Upload(UploadEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    pb.set_message(p.current_file);
                }
                Event::Batch(BatchEvent::Completed { .. }) => pb.finish_and_clear(),
                _ => {}
            }
        }
    });

    let report = guard.process_sequential(&owner, &listing, &uploads, store, &sender);

    drop(sender);
    event_thread.join().ok();
    let mut report = report?;
    for (file_name, error) in unreadable {
        report.record_unreadable(file_name, error);
    }

    match args.output {
        OutputFormat::Pretty => print_pretty_report(&term, &report, args.commit),
        OutputFormat::Json => print_json_report(&report)?,
    }

    Ok(())
}

fn print_pretty_report(term: &Term, report: &BatchReport, committed: bool) {
    for outcome in &report.outcomes {
        let line = match &outcome.result {
            Ok(decision @ UploadDecision::Accepted { classification, .. }) => format!(
                "{} {}  {} ({})",
                style("✓").green().bold(),
                outcome.file_name,
                decision.user_message(),
                style(&classification.reason).dim()
            ),
            Ok(decision @ UploadDecision::NotVehicle(verdict)) => format!(
                "{} {}  {} ({})",
                style("✗").red().bold(),
                outcome.file_name,
                decision.user_message(),
                style(&verdict.reason).dim()
            ),
            Ok(decision @ UploadDecision::Duplicate(verdict)) => {
                let detail = match (verdict.duplicate_type, verdict.similarity) {
                    (DuplicateType::Similar, Some(score)) => {
                        format!("{:.1}% similar", score * 100.0)
                    }
                    _ => "identical bytes".to_string(),
                };
                let listing = verdict
                    .matched_record
                    .as_ref()
                    .map(|r| r.listing_ref.to_string())
                    .unwrap_or_default();
                format!(
                    "{} {}  {} ({}, listing {})",
                    style("≡").yellow().bold(),
                    outcome.file_name,
                    decision.user_message(),
                    style(detail).dim(),
                    listing
                )
            }
            Err(e) => format!(
                "{} {}  {}",
                style("!").red().bold(),
                outcome.file_name,
                style(e).red()
            ),
        };
        term.write_line(&line).ok();
    }

    let summary = &report.summary;
    term.write_line("").ok();
    term.write_line(&format!(
        "  {} checked in {:.1}s: {} accepted, {} duplicates, {} not vehicle, {} unreadable",
        style(summary.total).cyan(),
        summary.duration_ms as f64 / 1000.0,
        style(summary.accepted).green(),
        style(summary.duplicates).yellow(),
        style(summary.not_vehicle).red(),
        style(summary.errors).red()
    ))
    .ok();

    if !committed && summary.accepted > 0 {
        term.write_line(&format!(
            "{}",
            style("Nothing was recorded. Re-run with --commit to store accepted photos.").dim()
        ))
        .ok();
    }
}

fn print_json_report(report: &BatchReport) -> Result<()> {
    let outcomes: Vec<_> = report
        .outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(decision) => serde_json::json!({
                "file": outcome.file_name,
                "decision": decision.label(),
                "message": decision.user_message(),
                "detail": decision,
                "record_id": outcome.committed.as_ref().map(|r| r.id.to_string()),
            }),
            Err(e) => serde_json::json!({
                "file": outcome.file_name,
                "decision": "error",
                "message": e.to_string(),
            }),
        })
        .collect();

    let output = serde_json::json!({
        "summary": report.summary,
        "uploads": outcomes,
    });
    print_json(&output)
}

fn run_hash(file: &Path, grid_size: u32, output: OutputFormat) -> Result<()> {
    let image = ImageBytes::from_path(file)?;
    let content_hash = ContentHasher::new().hash(&image)?;
    let fingerprint = FingerprintConfig::new()
        .grid_size(grid_size)
        .build()?
        .fingerprint(&image)?;

    match output {
        OutputFormat::Pretty => {
            println!("{}", style(file.display()).bold());
            println!("  content hash  {}", content_hash);
            println!("  fingerprint   {}", fingerprint.to_hex());
            println!("  bits          {}", style(&fingerprint).dim());
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "file": file,
            "content_hash": content_hash,
            "fingerprint": fingerprint,
            "fingerprint_hex": fingerprint.to_hex(),
        }))?,
    }
    Ok(())
}

fn run_compare(a: &Path, b: &Path, threshold: f64, output: OutputFormat) -> Result<()> {
    let threshold = SimilarityThreshold::new(threshold).map_err(|e: CompareError| {
        ConfigError::Invalid {
            field: "threshold",
            reason: e.to_string(),
        }
    })?;
    let fingerprinter = FingerprintConfig::new().build()?;
    let left = fingerprinter.fingerprint(&ImageBytes::from_path(a)?)?;
    let right = fingerprinter.fingerprint(&ImageBytes::from_path(b)?)?;
    let comparison = SimilarityComparator::new(threshold).compare(&left, &right)?;

    match output {
        OutputFormat::Pretty => {
            let verdict = if comparison.is_near_duplicate {
                style("near-duplicate").yellow().bold()
            } else {
                style("distinct").green().bold()
            };
            println!(
                "{:.1}% similar ({} of {} bits differ): {}",
                comparison.similarity * 100.0,
                comparison.distance,
                left.len(),
                verdict
            );
            println!("{}", style(threshold.description()).dim());
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "a": a,
            "b": b,
            "threshold": threshold,
            "comparison": comparison,
        }))?,
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
