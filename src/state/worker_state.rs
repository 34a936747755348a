/// Worker state definitions for tracking crawl progress
///
/// A worker moves through these states once per repository and ends in
/// `Stopped`.
use std::fmt;

/// Represents the current state of a crawl worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Waiting on the next repository from the search stream
    FetchingRepoList,

    // ===== Per-repository States =====
    /// Listing the repository root
    FetchTree,

    /// Breadth-first expansion of subdirectories
    ExpandSubdirs,

    /// Filtering the listing down to source files
    CollectSourceFiles,

    /// Fetching, extracting, and persisting one file at a time
    ExtractAndStore,

    // ===== Terminal State =====
    Stopped,
}

impl WorkerState {
    /// Returns true if the worker will make no further calls
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns true while the worker is inside one repository
    pub fn is_per_repository(&self) -> bool {
        matches!(
            self,
            Self::FetchTree | Self::ExpandSubdirs | Self::CollectSourceFiles | Self::ExtractAndStore
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchingRepoList => "fetching_repo_list",
            Self::FetchTree => "fetch_tree",
            Self::ExpandSubdirs => "expand_subdirs",
            Self::CollectSourceFiles => "collect_source_files",
            Self::ExtractAndStore => "extract_and_store",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
