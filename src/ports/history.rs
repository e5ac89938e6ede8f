//! History port: Trait for the append-only assessment log.
//!
//! This trait abstracts the storage backend from the trend analyzer.
//! Records are keyed by subject and ordered by insertion time; nothing
//! outside the store mutates them after the append.

use crate::domain::HistoryRecord;

/// Trait for the append-only, subject-keyed assessment history.
///
/// Appends must be serialized by the implementation to preserve
/// chronological ordering; reads operate on a consistent snapshot and may
/// proceed concurrently with appends.
pub trait HistoryStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Append a record to the subject's history.
    ///
    /// # Errors
    /// Returns error if the storage operation fails.
    fn append(&self, record: &HistoryRecord) -> Result<(), Self::Error>;

    /// Load the most recent records for a subject, newest first.
    ///
    /// # Errors
    /// Returns error if the storage operation fails.
    fn recent(&self, subject_id: &str, limit: usize) -> Result<Vec<HistoryRecord>, Self::Error>;

    /// Total number of records stored for a subject.
    ///
    /// # Errors
    /// Returns error if the storage operation fails.
    fn count(&self, subject_id: &str) -> Result<usize, Self::Error>;
}
