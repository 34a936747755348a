//! Crawler module for harvesting repositories
//!
//! This module contains the core crawling logic, including:
//! - The per-credential crawl worker and its state machine
//! - Worker pool coordination and shutdown
//! - Credential rotation by process restart

mod coordinator;
mod rotation;
mod worker;

pub use coordinator::{Coordinator, RunOutcome};
pub use rotation::{restart_process, CredentialQueue, RestartSettings, CREDENTIALS_ENV};
pub use worker::{CrawlWorker, WorkerExit};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cooperative cancellation flag
///
/// Workers check it at safe points; setting it never interrupts a request
/// already in flight.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
