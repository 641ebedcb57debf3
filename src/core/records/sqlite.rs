//! SQLite record store for persistent storage.

use super::{ImageRecord, ListingRef, OwnerId, RecordStore};
use crate::core::hasher::{ContentHash, PerceptualFingerprint};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// SQLite-backed record store
///
/// Uses WAL (Write-Ahead Logging) mode so lookups proceed while an insert
/// is being written. A unique index on `(owner_id, content_hash)` keeps one
/// record per distinct content per owner.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

/// Row as stored, before validation
struct RawRecord {
    id: String,
    owner_id: String,
    listing_ref: String,
    content_hash: String,
    fingerprint: Option<String>,
    created_at_ms: i64,
}

impl SqliteRecordStore {
    /// Open or create a record database at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| StoreError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::OpenFailed {
            path: PathBuf::from(":memory:"),
            reason: e.to_string(),
        })?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Default database location under the user's data directory
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("vehicle-photo-guard")
            .join("records.db")
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS image_records (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                listing_ref TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                perceptual_fingerprint TEXT,
                created_at INTEGER NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_owner_content
                ON image_records(owner_id, content_hash);",
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Corrupted {
            path: self.db_path.clone(),
        })
    }

    fn decode(&self, raw: RawRecord) -> Result<ImageRecord, StoreError> {
        let corrupted = || StoreError::Corrupted {
            path: self.db_path.clone(),
        };

        Ok(ImageRecord {
            id: Uuid::parse_str(&raw.id).map_err(|_| corrupted())?,
            owner_id: OwnerId::new(raw.owner_id),
            listing_ref: ListingRef::new(raw.listing_ref),
            content_hash: raw
                .content_hash
                .parse::<ContentHash>()
                .map_err(|_| corrupted())?,
            perceptual_fingerprint: raw
                .fingerprint
                .map(|bits| bits.parse::<PerceptualFingerprint>())
                .transpose()
                .map_err(|_| corrupted())?,
            created_at: DateTime::<Utc>::from_timestamp_millis(raw.created_at_ms)
                .ok_or_else(corrupted)?,
        })
    }
}

/// SQLite reports unique-index failures by column, e.g.
/// `UNIQUE constraint failed: image_records.owner_id, image_records.content_hash`
fn violates_owner_content(message: &str) -> bool {
    message.contains("image_records.content_hash")
}

impl RecordStore for SqliteRecordStore {
    fn records_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<ImageRecord>, StoreError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, owner_id, listing_ref, content_hash, perceptual_fingerprint, created_at
                 FROM image_records WHERE owner_id = ? ORDER BY created_at, rowid",
            )
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let rows: Vec<RawRecord> = stmt
            .query_map([owner_id.as_str()], |row| {
                Ok(RawRecord {
                    id: row.get(0)?,
                    owner_id: row.get(1)?,
                    listing_ref: row.get(2)?,
                    content_hash: row.get(3)?,
                    fingerprint: row.get(4)?,
                    created_at_ms: row.get(5)?,
                })
            })
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?
            .collect::<rusqlite::Result<Vec<RawRecord>>>()
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.into_iter().map(|raw| self.decode(raw)).collect()
    }

    fn insert(&self, record: ImageRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;

        let result = conn.execute(
            "INSERT INTO image_records
             (id, owner_id, listing_ref, content_hash, perceptual_fingerprint, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                record.id.to_string(),
                record.owner_id.as_str(),
                record.listing_ref.as_str(),
                record.content_hash.as_str(),
                record.perceptual_fingerprint.as_ref().map(|f| f.as_str()),
                record.created_at.timestamp_millis(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, Some(message)))
                if err.code == ErrorCode::ConstraintViolation
                    && violates_owner_content(&message) =>
            {
                Err(StoreError::DuplicateContent {
                    owner_id: record.owner_id.to_string(),
                    content_hash: record.content_hash.to_string(),
                })
            }
            Err(e) => Err(StoreError::QueryFailed(e.to_string())),
        }
    }

    fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM image_records WHERE id = ?", [id.to_string()])
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        Ok(removed > 0)
    }

    fn remove_listing(
        &self,
        owner_id: &OwnerId,
        listing_ref: &ListingRef,
    ) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM image_records WHERE owner_id = ? AND listing_ref = ?",
            params![owner_id.as_str(), listing_ref.as_str()],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))
    }

    fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM image_records", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n as usize)
        .map_err(|e| StoreError::QueryFailed(e.to_string()))
    }
}
