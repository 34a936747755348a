//! Crawl worker - one credential session's crawl loop
//!
//! A worker pulls repositories from its own search stream, claims each one
//! in the shared state, walks the repository tree breadth-first, and feeds
//! every selected source file through the extractor into the store.
//!
//! Safe points for cancellation are the top of the repository loop, the top
//! of the directory expansion loop, and the top of the file loop. In-flight
//! requests are never interrupted.

use crate::crawler::CancelFlag;
use crate::extract::{is_source_file, SnippetExtractor};
use crate::github::{Entry, GithubClient, Repository};
use crate::state::{SharedState, WorkerState};
use crate::{HarvestError, Result};
use rand::rngs::StdRng;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Why a worker stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The search stream ran dry
    SearchCompleted,
    /// The credential's quota is spent
    QuotaExhausted,
    /// The hosting API could not be reached
    Unavailable,
    /// The shared cancellation flag was set
    Cancelled,
    /// Any other error, caught at the worker boundary
    Failed,
}

impl WorkerExit {
    /// Classifies an error that ended the crawl loop
    pub fn from_error(error: &HarvestError) -> Self {
        match error {
            HarvestError::Client(e) if e.is_quota_exceeded() => Self::QuotaExhausted,
            HarvestError::Client(e) if e.is_unavailable() => Self::Unavailable,
            _ => Self::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchCompleted => "search completed",
            Self::QuotaExhausted => "quota exhausted",
            Self::Unavailable => "api unavailable",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum RepositoryOutcome {
    Completed { files: usize, snippets: usize },
    Cancelled,
}

/// Drives one session through search, tree walk, extraction, and storage
pub struct CrawlWorker {
    index: usize,
    client: GithubClient,
    shared: Arc<SharedState>,
    cancel: CancelFlag,
    query: String,
    extractor: SnippetExtractor,
    rng: StdRng,
    credential: String,
    state: WorkerState,
}

impl CrawlWorker {
    /// Creates a worker
    ///
    /// # Arguments
    ///
    /// * `index` - Position in the pool, used in logs
    /// * `client` - Session bound to the current credential
    /// * `shared` - Ledger and store shared with every other worker
    /// * `cancel` - Cooperative cancellation flag
    /// * `query` - Search filter passed verbatim to the search endpoint
    /// * `extractor` - This worker's own parser instance
    /// * `rng` - Source of instruction prefix choices
    /// * `credential` - Human-readable credential position, e.g. `2/3`
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: usize,
        client: GithubClient,
        shared: Arc<SharedState>,
        cancel: CancelFlag,
        query: impl Into<String>,
        extractor: SnippetExtractor,
        rng: StdRng,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            index,
            client,
            shared,
            cancel,
            query: query.into(),
            extractor,
            rng,
            credential: credential.into(),
            state: WorkerState::FetchingRepoList,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Runs until the search is exhausted, the quota runs out, the API
    /// becomes unreachable, or cancellation is requested
    pub async fn run(mut self) -> WorkerExit {
        tracing::info!(
            "[worker {}] Starting with credential {}",
            self.index,
            self.credential
        );

        let exit = match self.crawl().await {
            Ok(exit) => exit,
            Err(e) => {
                let exit = WorkerExit::from_error(&e);
                match exit {
                    WorkerExit::QuotaExhausted => {
                        tracing::warn!("[worker {}] {}", self.index, e)
                    }
                    _ => tracing::error!("[worker {}] Stopping: {}", self.index, e),
                }
                exit
            }
        };

        self.transition(WorkerState::Stopped);
        tracing::info!(
            "[worker {}] Stopped ({}) on credential {}",
            self.index,
            exit,
            self.credential
        );
        exit
    }

    async fn crawl(&mut self) -> Result<WorkerExit> {
        let mut search = self.client.search_repositories(&self.query);

        loop {
            if self.cancel.is_cancelled() {
                return Ok(WorkerExit::Cancelled);
            }

            self.transition(WorkerState::FetchingRepoList);
            let Some(repo) = search.next().await? else {
                return Ok(WorkerExit::SearchCompleted);
            };

            if !self.shared.try_claim(repo.id)? {
                tracing::debug!(
                    "[worker {}] Skipping {} (id {}): already visited or in progress",
                    self.index,
                    repo.full_name,
                    repo.id
                );
                continue;
            }

            tracing::info!(
                "[worker {}] credential {} | repository {} (id {})",
                self.index,
                self.credential,
                repo.full_name,
                repo.id
            );

            match self.process_repository(&repo).await {
                Ok(RepositoryOutcome::Completed { files, snippets }) => {
                    tracing::debug!(
                        "[worker {}] Finished {}: {} source files, {} snippets",
                        self.index,
                        repo.full_name,
                        files,
                        snippets
                    );
                    if let Err(e) = self.shared.complete_repository(repo.id) {
                        if matches!(e, HarvestError::LockPoisoned) {
                            return Err(e);
                        }
                        tracing::error!(
                            "[worker {}] Failed to flush ledger after {}: {}",
                            self.index,
                            repo.full_name,
                            e
                        );
                    }
                }
                Ok(RepositoryOutcome::Cancelled) => {
                    self.shared.release(repo.id)?;
                    return Ok(WorkerExit::Cancelled);
                }
                Err(e) => {
                    let _ = self.shared.release(repo.id);
                    return Err(e);
                }
            }
        }
    }

    async fn process_repository(&mut self, repo: &Repository) -> Result<RepositoryOutcome> {
        self.transition(WorkerState::FetchTree);
        let root = match self.client.list_tree(repo, "").await {
            Ok(entries) => entries,
            Err(e) if e.is_entry_scoped() => {
                tracing::warn!("[worker {}] Cannot list {}: {}", self.index, repo.full_name, e);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        self.transition(WorkerState::ExpandSubdirs);
        let Some(entries) = self.expand_subdirectories(repo, root).await? else {
            return Ok(RepositoryOutcome::Cancelled);
        };

        self.transition(WorkerState::CollectSourceFiles);
        let files: Vec<Entry> = entries
            .into_iter()
            .filter(|entry| entry.is_file() && is_source_file(&entry.path))
            .collect();

        self.transition(WorkerState::ExtractAndStore);
        let mut snippets = 0;
        for entry in &files {
            if self.cancel.is_cancelled() {
                return Ok(RepositoryOutcome::Cancelled);
            }
            snippets += self.extract_and_store(repo, entry).await?;
        }

        Ok(RepositoryOutcome::Completed {
            files: files.len(),
            snippets,
        })
    }

    /// Breadth-first walk from the root listing
    ///
    /// Returns every non-directory entry, or `None` when cancelled.
    async fn expand_subdirectories(
        &self,
        repo: &Repository,
        root: Vec<Entry>,
    ) -> Result<Option<Vec<Entry>>> {
        let mut queue: VecDeque<Entry> = root.into();
        let mut found = Vec::new();

        while let Some(entry) = queue.pop_front() {
            if !entry.is_dir() {
                found.push(entry);
                continue;
            }

            if entry.path.starts_with('.') {
                tracing::trace!("[worker {}] Skipping hidden {}", self.index, entry.path);
                continue;
            }

            if self.cancel.is_cancelled() {
                return Ok(None);
            }

            match self.client.list_tree(repo, &entry.path).await {
                Ok(children) => queue.extend(children),
                Err(e) if e.is_entry_scoped() => {
                    tracing::warn!(
                        "[worker {}] Cannot list {}/{}: {}",
                        self.index,
                        repo.full_name,
                        entry.path,
                        e
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Some(found))
    }

    async fn extract_and_store(&mut self, repo: &Repository, entry: &Entry) -> Result<usize> {
        let text = match self.client.fetch_file_content(repo, entry).await {
            Ok(text) => text,
            Err(e) if e.is_entry_scoped() => {
                tracing::warn!(
                    "[worker {}] Cannot fetch {}/{}: {}",
                    self.index,
                    repo.full_name,
                    entry.path,
                    e
                );
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let file = self.extractor.extract(&text);
        if file.is_empty() {
            tracing::trace!("[worker {}] Nothing documented in {}", self.index, entry.path);
            return Ok(0);
        }

        match self.shared.store_file(
            &file.functions,
            &file.classes,
            &repo.html_url,
            &text,
            &mut self.rng,
        ) {
            Ok(inserted) => Ok(inserted),
            Err(HarvestError::LockPoisoned) => Err(HarvestError::LockPoisoned),
            Err(e) => {
                tracing::error!(
                    "[worker {}] Dropped records of {}/{}: {}",
                    self.index,
                    repo.full_name,
                    entry.path,
                    e
                );
                Ok(0)
            }
        }
    }

    fn transition(&mut self, next: WorkerState) {
        if self.state != next {
            tracing::debug!("[worker {}] {} -> {}", self.index, self.state, next);
            self.state = next;
        }
    }
}
