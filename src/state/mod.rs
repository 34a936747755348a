//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `Ledger`: Persisted set of repositories already processed
//! - `SharedState`: Ledger, snippet store, and in-flight claims behind one lock
//! - `WorkerState`: Where a crawl worker is in its per-repository loop

mod ledger;
mod shared;
mod worker_state;

// Re-export main types
pub use ledger::{Ledger, LedgerError, LedgerResult};
pub use shared::SharedState;
pub use worker_state::WorkerState;
