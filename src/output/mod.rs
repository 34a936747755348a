//! Output module for harvest reports
//!
//! This module handles:
//! - Loading snippet and ledger statistics
//! - Printing them for `--stats`

pub mod stats;

pub use stats::{load_statistics, print_statistics, SnippetStatistics};
