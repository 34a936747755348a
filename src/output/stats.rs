//! Statistics from the snippet database and ledger
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics.

use crate::state::Ledger;
use crate::storage::Storage;
use crate::Result;

/// Harvest statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetStatistics {
    /// Total number of stored rows
    pub total_snippets: u64,

    /// Number of distinct repositories with at least one row
    pub distinct_sources: u64,

    /// Number of repositories recorded in the ledger
    pub visited_repositories: u64,
}

impl SnippetStatistics {
    /// Share of visited repositories that produced at least one row
    pub fn yield_ratio(&self) -> f64 {
        if self.visited_repositories == 0 {
            0.0
        } else {
            self.distinct_sources as f64 / self.visited_repositories as f64
        }
    }

    pub fn average_per_source(&self) -> f64 {
        if self.distinct_sources == 0 {
            0.0
        } else {
            self.total_snippets as f64 / self.distinct_sources as f64
        }
    }
}

/// Loads statistics from storage and the ledger
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `ledger` - The visited-repository ledger
///
/// # Returns
///
/// * `Ok(SnippetStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage, ledger: &Ledger) -> Result<SnippetStatistics> {
    Ok(SnippetStatistics {
        total_snippets: storage.count_snippets()?,
        distinct_sources: storage.count_sources()?,
        visited_repositories: ledger.len() as u64,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &SnippetStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Snippet rows: {}", stats.total_snippets);
    println!("  Repositories with snippets: {}", stats.distinct_sources);
    println!("  Repositories visited: {}", stats.visited_repositories);
    println!();

    println!("Ratios:");
    println!("  Rows per repository: {:.1}", stats.average_per_source());
    println!(
        "  Repositories yielding snippets: {:.1}%",
        stats.yield_ratio() * 100.0
    );
}
