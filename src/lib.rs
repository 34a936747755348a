//! Snippet-Harvest: a documentation/code pair harvester
//!
//! This crate searches a code-hosting platform for repositories matching a
//! query, walks their source trees, extracts documented functions and classes,
//! and persists normalized (documentation, code) pairs into SQLite.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod github;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Identity of a repository on the hosting platform
pub type RepositoryId = u64;

/// Main error type for Snippet-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API client error: {0}")]
    Client(#[from] github::ClientError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] state::LedgerError),

    #[error("Extractor setup error: {0}")]
    Extract(#[from] extract::ExtractError),

    #[error("Shared state lock poisoned")]
    LockPoisoned,

    #[error("Worker {index} panicked: {message}")]
    WorkerPanic { index: usize, message: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("No API credentials provided")]
    MissingCredentials,
}

/// Result type alias for Snippet-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{ExtractedUnit, SnippetExtractor, UnitKind};
pub use state::{Ledger, SharedState, WorkerState};
pub use storage::{SnippetRecord, SnippetStore};
