//! Worker pool for parallel contract vanity search.
//!
//! This module provides:
//! - Candidate generation behind the [`CandidateSource`] seam
//! - Multi-threaded CPU workers reporting over a fan-in channel
//! - The [`Coordinator`], where the first match wins and cancels the rest
//! - A single-threaded [`BoundedSearch`] with a hard attempt ceiling

mod bounded;
mod cpu;
mod generator;
mod pool;

use std::fmt;
use std::time::Duration;

use zeroize::Zeroizing;

use crate::crypto::{Address, EntropyError};
use crate::matcher::PatternSpec;

pub use bounded::BoundedSearch;
pub use cpu::CpuWorker;
pub use generator::{Candidate, CandidateSource, SecureGenerator, DEPLOY_NONCE};
pub use pool::Coordinator;

/// Attempts a worker makes between progress messages.
pub const DEFAULT_BATCH_SIZE: u64 = 1000;

/// Lifecycle of a single worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Searching,
    Found,
    Cancelled,
    Failed,
}

/// Attempts made by a worker since its previous progress message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressMessage {
    pub worker_id: usize,
    pub attempts_since_last: u64,
}

/// Everything a worker sends to the coordinator.
#[derive(Debug)]
pub enum WorkerMessage {
    Progress(ProgressMessage),
    /// Terminal: a matching candidate. `attempts_since_last` covers the
    /// attempts not yet reported through progress, including the match.
    Found {
        worker_id: usize,
        candidate: Candidate,
        attempts_since_last: u64,
    },
    /// Terminal: the candidate source failed.
    Failed {
        worker_id: usize,
        error: EntropyError,
    },
}

/// Result of a successful search.
#[derive(Clone)]
pub struct SearchResult {
    pattern: PatternSpec,
    candidate: Candidate,
    total_attempts: u64,
    elapsed: Duration,
    worker_id: usize,
}

impl SearchResult {
    pub(crate) fn new(
        pattern: PatternSpec,
        candidate: Candidate,
        total_attempts: u64,
        elapsed: Duration,
        worker_id: usize,
    ) -> Self {
        Self {
            pattern,
            candidate,
            total_attempts,
            elapsed,
            worker_id,
        }
    }

    pub fn pattern(&self) -> &PatternSpec {
        &self.pattern
    }

    pub fn deployer(&self) -> &Address {
        self.candidate.deployer()
    }

    pub fn contract(&self) -> &Address {
        self.candidate.contract()
    }

    pub fn private_key_bytes(&self) -> &[u8; 32] {
        self.candidate.private_key_bytes()
    }

    /// Private key as 0x-prefixed hex.
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        self.candidate.private_key_hex()
    }

    /// Lower bound on candidates tried across all workers.
    pub fn total_attempts(&self) -> u64 {
        self.total_attempts
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// ID of the worker that found the match.
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Attempts per second over the whole search.
    pub fn attempts_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_attempts as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Debug for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchResult")
            .field("pattern", &self.pattern)
            .field("deployer", self.deployer())
            .field("contract", self.contract())
            .field("total_attempts", &self.total_attempts)
            .field("elapsed", &self.elapsed)
            .field("worker_id", &self.worker_id)
            .finish_non_exhaustive()
    }
}
