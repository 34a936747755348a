//! Crawler coordinator - worker pool orchestration
//!
//! This module runs one process generation of the crawl:
//! - Spawning the configured number of workers on the current credential
//! - Polling worker liveness
//! - Turning Ctrl-C into cooperative cancellation with a grace period
//! - Deciding whether the pool ended in completion, rotation, or interrupt

use crate::config::Config;
use crate::crawler::rotation::CredentialQueue;
use crate::crawler::worker::{CrawlWorker, WorkerExit};
use crate::crawler::CancelFlag;
use crate::extract::SnippetExtractor;
use crate::github::GithubClient;
use crate::state::SharedState;
use crate::{HarvestError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How one generation of the worker pool ended
#[derive(Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every worker consumed the whole search
    Completed,
    /// The pool stopped on a spent credential and another one remains
    Rotate(CredentialQueue),
    /// The pool stopped on the last credential
    CredentialsExhausted,
    /// Cancellation was requested
    Interrupted,
}

/// Main crawl coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    shared: Arc<SharedState>,
    credentials: CredentialQueue,
    cancel: CancelFlag,
    listen_for_interrupt: bool,
}

impl Coordinator {
    /// Creates a coordinator for the current credential generation
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `shared` - Ledger and store shared by every worker
    /// * `credentials` - Remaining credentials; the front one is used now
    pub fn new(config: Config, shared: Arc<SharedState>, credentials: CredentialQueue) -> Self {
        Self {
            config: Arc::new(config),
            shared,
            credentials,
            cancel: CancelFlag::new(),
            listen_for_interrupt: true,
        }
    }

    /// Disables the Ctrl-C listener; cancellation then comes only from
    /// [`Coordinator::cancel_flag`]
    pub fn without_interrupt_handler(mut self) -> Self {
        self.listen_for_interrupt = false;
        self
    }

    /// Returns a handle that cancels every worker of this coordinator
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Runs the pool until every worker has stopped
    ///
    /// # Returns
    ///
    /// * `Ok(RunOutcome)` - How the pool ended
    /// * `Err(HarvestError)` - The pool could not be started
    pub async fn run(self) -> Result<RunOutcome> {
        let workers = self.spawn_workers()?;
        let grace = Duration::from_millis(self.config.crawler.shutdown_grace_ms);
        let poll = Duration::from_millis(self.config.crawler.poll_interval_ms.max(1));

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut listening = self.listen_for_interrupt;

        let mut ticker = tokio::time::interval(poll);
        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                result = &mut ctrl_c, if listening => {
                    listening = false;
                    match result {
                        Ok(()) => {
                            tracing::info!("Interrupt received, stopping workers");
                            self.cancel.cancel();
                        }
                        Err(e) => tracing::warn!("Cannot listen for interrupts: {}", e),
                    }
                }
                _ = ticker.tick() => {}
            }

            if workers.iter().all(|handle| handle.is_finished()) {
                break;
            }

            if self.cancel.is_cancelled() {
                let deadline = *deadline.get_or_insert_with(|| Instant::now() + grace);
                if Instant::now() >= deadline {
                    tracing::warn!("Grace period elapsed, aborting remaining workers");
                    for handle in &workers {
                        handle.abort();
                    }
                    break;
                }
            }
        }

        let exits = collect_exits(workers).await;
        let interrupted = self.cancel.is_cancelled();
        Ok(self.decide(&exits, interrupted))
    }

    fn spawn_workers(&self) -> Result<Vec<JoinHandle<WorkerExit>>> {
        let count = self.config.crawler.workers;
        let label = self.credentials.label();
        tracing::info!("Starting {} workers on credential {}", count, label);

        let mut handles = Vec::with_capacity(count);
        for index in 0..count {
            let client = GithubClient::new(
                &self.config.github,
                self.credentials.current(),
                self.config.search.per_page,
            )?;
            let extractor = SnippetExtractor::new(self.config.extract.wrap_width)?;

            let worker = CrawlWorker::new(
                index,
                client,
                Arc::clone(&self.shared),
                self.cancel.clone(),
                self.config.search.query.clone(),
                extractor,
                StdRng::from_entropy(),
                label.clone(),
            );
            handles.push(tokio::spawn(worker.run()));
        }

        Ok(handles)
    }

    fn decide(self, exits: &[WorkerExit], interrupted: bool) -> RunOutcome {
        match decide_outcome(exits, interrupted) {
            PoolEnd::Interrupted => RunOutcome::Interrupted,
            PoolEnd::Completed => {
                tracing::info!("Search exhausted, crawl complete");
                RunOutcome::Completed
            }
            PoolEnd::Rotate => {
                let spent = self.credentials.label();
                match self.credentials.rotate() {
                    Some(next) => {
                        tracing::info!("Credential {} spent, rotating to {}", spent, next.label());
                        RunOutcome::Rotate(next)
                    }
                    None => {
                        tracing::warn!("Credential {} spent and none remain", spent);
                        RunOutcome::CredentialsExhausted
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolEnd {
    Completed,
    Rotate,
    Interrupted,
}

/// Interrupt wins; otherwise the pool completed only if every worker
/// consumed the search, and anything else spends the credential
fn decide_outcome(exits: &[WorkerExit], interrupted: bool) -> PoolEnd {
    if interrupted {
        PoolEnd::Interrupted
    } else if !exits.is_empty() && exits.iter().all(|e| *e == WorkerExit::SearchCompleted) {
        PoolEnd::Completed
    } else {
        PoolEnd::Rotate
    }
}

async fn collect_exits(workers: Vec<JoinHandle<WorkerExit>>) -> Vec<WorkerExit> {
    let mut exits = Vec::with_capacity(workers.len());

    for (index, handle) in workers.into_iter().enumerate() {
        let exit = match handle.await {
            Ok(exit) => exit,
            Err(e) if e.is_cancelled() => WorkerExit::Cancelled,
            Err(e) => {
                let error = HarvestError::WorkerPanic {
                    index,
                    message: e.to_string(),
                };
                tracing::error!("{}", error);
                WorkerExit::Failed
            }
        };
        exits.push(exit);
    }

    tracing::debug!("Worker exits: {:?}", exits);
    exits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_never_rotates() {
        let exits = [WorkerExit::QuotaExhausted, WorkerExit::Cancelled];
        assert_eq!(decide_outcome(&exits, true), PoolEnd::Interrupted);
    }

    #[test]
    fn test_all_completed_is_completion() {
        let exits = [WorkerExit::SearchCompleted, WorkerExit::SearchCompleted];
        assert_eq!(decide_outcome(&exits, false), PoolEnd::Completed);
    }

    #[test]
    fn test_any_other_exit_rotates() {
        for other in [
            WorkerExit::QuotaExhausted,
            WorkerExit::Unavailable,
            WorkerExit::Failed,
        ] {
            let exits = [WorkerExit::SearchCompleted, other];
            assert_eq!(decide_outcome(&exits, false), PoolEnd::Rotate);
        }
    }

    #[test]
    fn test_empty_pool_rotates() {
        assert_eq!(decide_outcome(&[], false), PoolEnd::Rotate);
    }
}
