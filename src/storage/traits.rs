//! Storage traits and error types
//!
//! This module defines the trait interface for snippet sinks and the
//! associated error type.

use crate::storage::SnippetRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for snippet storage backends
///
/// Stores are append-only: rows are inserted, never updated or deleted.
pub trait Storage {
    /// Creates the snippet table if it does not exist yet
    fn ensure_schema(&mut self) -> StorageResult<()>;

    /// Inserts every record of one file atomically
    ///
    /// # Arguments
    ///
    /// * `records` - All records derived from one source file
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of rows inserted
    /// * `Err(StorageError)` - Nothing from this batch was persisted
    fn insert_records(&mut self, records: &[SnippetRecord]) -> StorageResult<usize>;

    /// Counts all stored snippet rows
    fn count_snippets(&self) -> StorageResult<u64>;

    /// Counts distinct source URLs
    fn count_sources(&self) -> StorageResult<u64>;
}
