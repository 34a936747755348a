//! Storage module for persisting harvested snippets
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Turning extracted units into (title, code, source) rows
//! - Per-file transactional inserts

mod prompts;
mod records;
mod schema;
mod sqlite;
mod traits;

pub use prompts::{choose_prompt, DOCUMENTATION_PROMPTS};
pub use records::{build_records, wrap_code, SnippetRecord};
pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SnippetStore;
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;

/// Opens the snippet store at `path`, creating it if needed
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SnippetStore)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SnippetStore> {
    SnippetStore::new(path)
}
