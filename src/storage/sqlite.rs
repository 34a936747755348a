//! SQLite storage implementation
//!
//! This module provides the SQLite-backed snippet store.

use crate::extract::ExtractedUnit;
use crate::storage::records::{build_records, SnippetRecord};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use rand::Rng;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite snippet store
pub struct SnippetStore {
    conn: Connection,
}

impl SnippetStore {
    /// Opens (or creates) the store at `path`
    ///
    /// Missing parent directories are created.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SnippetStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to create the directory or open the database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        let mut store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Creates an in-memory store
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Persists everything one source file contributes, in one transaction
    ///
    /// # Arguments
    ///
    /// * `functions` - Documented functions found in the file
    /// * `classes` - Documented classes found in the file
    /// * `source` - Repository URL recorded on every row
    /// * `file_text` - Whole file text, stored when any class is documented
    /// * `rng` - Source of the instruction prefix choice
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Rows inserted (zero when nothing is documented)
    /// * `Err(StorageError)` - The file's rows were rolled back
    pub fn insert_file<R: Rng + ?Sized>(
        &mut self,
        functions: &[ExtractedUnit],
        classes: &[ExtractedUnit],
        source: &str,
        file_text: &str,
        rng: &mut R,
    ) -> StorageResult<usize> {
        let records = build_records(functions, classes, source, file_text, rng);
        if records.is_empty() {
            return Ok(0);
        }
        self.insert_records(&records)
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl Storage for SnippetStore {
    fn ensure_schema(&mut self) -> StorageResult<()> {
        initialize_schema(&self.conn)?;
        Ok(())
    }

    fn insert_records(&mut self, records: &[SnippetRecord]) -> StorageResult<usize> {
        // Dropping the transaction without commit rolls back every row.
        let tx = self.conn.transaction()?;

        {
            let mut stmt =
                tx.prepare_cached("INSERT INTO snippets (title, code, source) VALUES (?1, ?2, ?3)")?;

            for record in records {
                if record.title.trim().is_empty() {
                    return Err(StorageError::InvalidRecord(format!(
                        "empty title for record from {}",
                        record.source
                    )));
                }
                stmt.execute(params![record.title, record.code, record.source])?;
            }
        }

        tx.commit()?;
        Ok(records.len())
    }

    fn count_snippets(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM snippets")
    }

    fn count_sources(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(DISTINCT source) FROM snippets")
    }
}
