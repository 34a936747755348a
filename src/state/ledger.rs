//! Visited-repository ledger
//!
//! The ledger is a JSON array of repository ids. Every flush writes the full
//! set to a temporary file in the same directory and renames it over the
//! ledger, so readers see either the old or the new set, never a mix.

use crate::RepositoryId;
use std::collections::HashSet;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors raised while loading or flushing the ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed ledger {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize ledger: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to replace ledger: {0}")]
    Persist(#[from] tempfile::PersistError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Set of repositories already processed, backed by a file
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    visited: HashSet<RepositoryId>,
}

impl Ledger {
    /// Loads the ledger at `path`
    ///
    /// A missing or empty file yields an empty ledger.
    pub fn load(path: impl Into<PathBuf>) -> LedgerResult<Self> {
        let path = path.into();

        let visited = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => HashSet::new(),
            Ok(text) => {
                let ids: Vec<RepositoryId> =
                    serde_json::from_str(&text).map_err(|source| LedgerError::Malformed {
                        path: path.clone(),
                        source,
                    })?;
                ids.into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(source) => return Err(LedgerError::Io { path, source }),
        };

        tracing::debug!("Loaded {} visited repositories from {}", visited.len(), path.display());
        Ok(Self { path, visited })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: RepositoryId) -> bool {
        self.visited.contains(&id)
    }

    /// Adds `id`; returns false if it was already present
    pub fn record(&mut self, id: RepositoryId) -> bool {
        self.visited.insert(id)
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    /// Returns the visited ids in ascending order
    pub fn ids(&self) -> Vec<RepositoryId> {
        let mut ids: Vec<RepositoryId> = self.visited.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Writes the full set, replacing the previous file atomically
    pub fn flush(&self) -> LedgerResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let io_err = |source| LedgerError::Io {
            path: self.path.clone(),
            source,
        };

        std::fs::create_dir_all(&dir).map_err(io_err)?;
        let tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;

        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, &self.ids())?;
            writer.flush().map_err(io_err)?;
        }
        tmp.as_file().sync_all().map_err(io_err)?;

        tmp.persist(&self.path)?;
        Ok(())
    }
}
