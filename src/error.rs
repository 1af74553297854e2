//! Error types surfaced by a search.

use thiserror::Error;

use crate::crypto::EntropyError;
use crate::matcher::PatternError;
use crate::store::PersistenceError;
use crate::worker::SearchResult;

/// Everything that can end a search without a (saved) result.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The pattern was rejected before any worker started.
    #[error("invalid pattern: {0}")]
    InvalidPatternSpec(#[from] PatternError),

    /// A worker could not obtain secure randomness; the whole search is
    /// aborted and partial progress discarded.
    #[error("worker {worker_id} could not obtain secure randomness: {source}")]
    EntropyFailure {
        worker_id: usize,
        #[source]
        source: EntropyError,
    },

    /// The bounded search hit its attempt ceiling without a match.
    #[error("no match after {attempts} attempts")]
    SearchExhausted { attempts: u64 },

    /// A match was found but could not be written to the store. The result
    /// is still valid and is carried here so it is not lost.
    #[error("match found but could not be saved: {source}")]
    Persistence {
        result: Box<SearchResult>,
        #[source]
        source: PersistenceError,
    },

    /// The search was stopped from outside (e.g. Ctrl-C).
    #[error("search interrupted after {attempts} attempts")]
    Interrupted { attempts: u64 },

    #[error("worker {worker_id} terminated unexpectedly")]
    WorkerPanicked { worker_id: usize },

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl SearchError {
    /// Short, stable name of the error class.
    pub fn class(&self) -> &'static str {
        match self {
            SearchError::InvalidPatternSpec(_) => "InvalidPatternSpec",
            SearchError::EntropyFailure { .. } => "EntropyFailure",
            SearchError::SearchExhausted { .. } => "SearchExhausted",
            SearchError::Persistence { .. } => "PersistenceFailure",
            SearchError::Interrupted { .. } => "Interrupted",
            SearchError::WorkerPanicked { .. } => "WorkerPanicked",
            SearchError::Spawn(_) => "SpawnFailure",
        }
    }

    /// The found result, when the only failure was saving it.
    pub fn unsaved_result(&self) -> Option<&SearchResult> {
        match self {
            SearchError::Persistence { result, .. } => Some(&**result),
            _ => None,
        }
    }
}
