//! Shared crawl state
//!
//! One object, built once and handed to every worker behind an `Arc`, holds
//! the ledger, the snippet store, and the set of repositories currently being
//! processed. A single mutex serializes all mutation. Callers never hold the
//! lock across a network call.

use crate::extract::ExtractedUnit;
use crate::state::ledger::Ledger;
use crate::storage::{SnippetStore, Storage};
use crate::{HarvestError, RepositoryId, Result};
use rand::Rng;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

struct Inner {
    ledger: Ledger,
    store: SnippetStore,
    in_flight: HashSet<RepositoryId>,
}

/// Ledger, store, and in-flight claims under one lock
pub struct SharedState {
    inner: Mutex<Inner>,
}

impl SharedState {
    pub fn new(ledger: Ledger, store: SnippetStore) -> Self {
        Self {
            inner: Mutex::new(Inner {
                ledger,
                store,
                in_flight: HashSet::new(),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| HarvestError::LockPoisoned)
    }

    /// Returns true if `id` was already recorded in the ledger
    pub fn is_visited(&self, id: RepositoryId) -> Result<bool> {
        Ok(self.lock()?.ledger.contains(id))
    }

    /// Claims `id` for the calling worker
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The caller owns the repository until it completes or releases it
    /// * `Ok(false)` - The repository is visited or another worker holds it
    pub fn try_claim(&self, id: RepositoryId) -> Result<bool> {
        let mut inner = self.lock()?;
        if inner.ledger.contains(id) {
            return Ok(false);
        }
        Ok(inner.in_flight.insert(id))
    }

    /// Gives up a claim without recording the repository
    pub fn release(&self, id: RepositoryId) -> Result<()> {
        self.lock()?.in_flight.remove(&id);
        Ok(())
    }

    /// Records `id` as visited and flushes the ledger, releasing the claim
    ///
    /// The id stays recorded in memory even if the flush fails, so this run
    /// will not revisit it; the next successful flush persists it.
    pub fn complete_repository(&self, id: RepositoryId) -> Result<()> {
        let mut inner = self.lock()?;
        inner.ledger.record(id);
        inner.in_flight.remove(&id);
        inner.ledger.flush()?;
        Ok(())
    }

    /// Persists every record one file contributes, in one transaction
    pub fn store_file<R: Rng + ?Sized>(
        &self,
        functions: &[ExtractedUnit],
        classes: &[ExtractedUnit],
        source: &str,
        file_text: &str,
        rng: &mut R,
    ) -> Result<usize> {
        let mut inner = self.lock()?;
        let inserted = inner
            .store
            .insert_file(functions, classes, source, file_text, rng)?;
        Ok(inserted)
    }

    pub fn visited_count(&self) -> Result<usize> {
        Ok(self.lock()?.ledger.len())
    }

    pub fn snippet_count(&self) -> Result<u64> {
        Ok(self.lock()?.store.count_snippets()?)
    }

    pub fn in_flight_count(&self) -> Result<usize> {
        Ok(self.lock()?.in_flight.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn shared(dir: &TempDir) -> SharedState {
        let ledger = Ledger::load(dir.path().join("ids.json")).unwrap();
        let store = SnippetStore::new_in_memory().unwrap();
        SharedState::new(ledger, store)
    }

    #[test]
    fn test_claim_and_release() {
        let dir = TempDir::new().unwrap();
        let state = shared(&dir);

        assert!(state.try_claim(1).unwrap());
        assert!(!state.try_claim(1).unwrap());

        state.release(1).unwrap();
        assert!(state.try_claim(1).unwrap());
    }

    #[test]
    fn test_completed_repository_cannot_be_claimed() {
        let dir = TempDir::new().unwrap();
        let state = shared(&dir);

        assert!(state.try_claim(9).unwrap());
        state.complete_repository(9).unwrap();

        assert!(state.is_visited(9).unwrap());
        assert!(!state.try_claim(9).unwrap());
        assert_eq!(state.in_flight_count().unwrap(), 0);

        let reloaded = Ledger::load(dir.path().join("ids.json")).unwrap();
        assert!(reloaded.contains(9));
    }

    #[test]
    fn test_concurrent_records_lose_nothing() {
        let dir = TempDir::new().unwrap();
        let state = Arc::new(shared(&dir));
        let workers: u64 = 8;
        let per_worker: u64 = 25;

        let handles: Vec<_> = (0..workers)
            .map(|w| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    for i in 0..per_worker {
                        let id = w * 1000 + i;
                        assert!(state.try_claim(id).unwrap());
                        state.complete_repository(id).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let expected = (workers * per_worker) as usize;
        assert_eq!(state.visited_count().unwrap(), expected);

        let reloaded = Ledger::load(dir.path().join("ids.json")).unwrap();
        assert_eq!(reloaded.len(), expected);
    }
}
