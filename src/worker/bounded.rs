//! Single-threaded search with a hard attempt ceiling.
//!
//! For environments where spawning threads is not an option. Runs in the
//! calling thread and gives up after `max_attempts` candidates.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::SearchError;
use crate::matcher::PatternSpec;
use crate::store::{persist_result, ResultStore};

use super::{CandidateSource, SearchResult, DEFAULT_BATCH_SIZE};

/// Bounded, single-threaded search.
pub struct BoundedSearch {
    max_attempts: u64,
    batch_size: u64,
    store: Option<Arc<dyn ResultStore>>,
}

impl BoundedSearch {
    pub fn new(max_attempts: u64) -> Self {
        Self {
            max_attempts,
            batch_size: DEFAULT_BATCH_SIZE,
            store: None,
        }
    }

    /// Persists the result to `store` before returning it.
    pub fn with_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn max_attempts(&self) -> u64 {
        self.max_attempts
    }

    pub fn run<G>(&self, spec: &PatternSpec, source: &mut G) -> Result<SearchResult, SearchError>
    where
        G: CandidateSource + ?Sized,
    {
        self.run_with_progress(spec, source, |_| {})
    }

    /// Runs the search, calling `on_progress` with the attempt count every
    /// `batch_size` attempts.
    pub fn run_with_progress<G, P>(
        &self,
        spec: &PatternSpec,
        source: &mut G,
        mut on_progress: P,
    ) -> Result<SearchResult, SearchError>
    where
        G: CandidateSource + ?Sized,
        P: FnMut(u64),
    {
        let start = Instant::now();
        info!(
            max_attempts = self.max_attempts,
            pattern = %spec,
            "starting bounded search"
        );

        for attempt in 1..=self.max_attempts {
            let candidate = source
                .next_candidate()
                .map_err(|source| SearchError::EntropyFailure {
                    worker_id: 0,
                    source,
                })?;

            if spec.matches(candidate.contract()).is_match() {
                let result = SearchResult::new(spec.clone(), candidate, attempt, start.elapsed(), 0);
                info!(
                    attempts = attempt,
                    contract = %result.contract(),
                    "bounded search found a match"
                );
                return persist_result(self.store.as_deref(), result);
            }

            if attempt % self.batch_size == 0 {
                on_progress(attempt);
            }
        }

        debug!(attempts = self.max_attempts, "bounded search exhausted");
        Err(SearchError::SearchExhausted {
            attempts: self.max_attempts,
        })
    }
}
