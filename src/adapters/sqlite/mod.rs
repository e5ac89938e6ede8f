//! SQLite adapter: Implementation of HistoryStore.
//!
//! Provides the append-only assessment log, keyed by subject.
//!
//! # Mutex Behavior
//!
//! The database connection is protected by `Mutex`, which serializes
//! appends and preserves chronological ordering. A poisoned mutex (from a
//! panic in another thread) will cause panic. This fail-fast behavior is
//! intentional for data integrity in healthcare applications.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use crate::domain::{HistoryRecord, RiskBand};
use crate::ports::HistoryStore;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// SQLite history store.
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    /// Create a new store with the given database path.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    ///
    /// # Errors
    /// Returns error if the database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS assessments (
                id TEXT PRIMARY KEY,
                subject_id TEXT NOT NULL,
                record TEXT NOT NULL,
                score REAL NOT NULL,
                band TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_assessments_subject_created
                ON assessments(subject_id, created_at DESC);
            ",
        )?;

        Ok(())
    }

}

/// Raw column values of one assessment row, parsed outside rusqlite's
/// error domain.
type RawRow = (String, String, String, f64, String, String);

fn parse_row(raw: RawRow) -> Result<HistoryRecord, StorageError> {
    let (id, subject_id, record_json, score, band, created_at) = raw;

    let record = serde_json::from_str(&record_json)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let band = RiskBand::parse(&band)
        .ok_or_else(|| StorageError::Serialization(format!("unknown risk band label: {band}")))?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| StorageError::Serialization(e.to_string()))?
        .with_timezone(&chrono::Utc);

    Ok(HistoryRecord {
        id,
        subject_id,
        record,
        score,
        band,
        created_at,
    })
}

impl HistoryStore for SqliteHistoryStore {
    type Error = StorageError;

    fn append(&self, record: &HistoryRecord) -> Result<(), Self::Error> {
        let record_json = serde_json::to_string(&record.record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let conn = self.conn.lock().expect("Lock failed");
        conn.execute(
            "INSERT INTO assessments (id, subject_id, record, score, band, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id,
                record.subject_id,
                record_json,
                record.score,
                record.band.as_str(),
                record.created_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!(
            "Appended assessment {} for subject {} (score={:.4})",
            record.id,
            record.subject_id,
            record.score
        );

        Ok(())
    }

    fn recent(&self, subject_id: &str, limit: usize) -> Result<Vec<HistoryRecord>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let mut stmt = conn.prepare(
            "SELECT id, subject_id, record, score, band, created_at
             FROM assessments
             WHERE subject_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![subject_id, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(parse_row(row?)?);
        }

        Ok(records)
    }

    fn count(&self, subject_id: &str) -> Result<usize, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM assessments WHERE subject_id = ?1",
            params![subject_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
