//! CPU-based worker for contract vanity search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use crate::matcher::PatternSpec;

use super::{CandidateSource, ProgressMessage, WorkerMessage, WorkerState};

/// A CPU worker that generates and tests candidates.
pub struct CpuWorker<G> {
    /// Worker ID
    id: usize,
    /// The pattern to match against
    pattern: PatternSpec,
    /// Where candidates come from
    source: G,
    /// Fan-in channel to the coordinator
    tx: Sender<WorkerMessage>,
    /// Shared cancellation flag
    stop_flag: Arc<AtomicBool>,
    /// Attempts between progress messages
    batch_size: u64,
    state: WorkerState,
}

impl<G: CandidateSource> CpuWorker<G> {
    /// Creates a new CPU worker.
    pub fn new(
        id: usize,
        pattern: PatternSpec,
        source: G,
        tx: Sender<WorkerMessage>,
        stop_flag: Arc<AtomicBool>,
        batch_size: u64,
    ) -> Self {
        Self {
            id,
            pattern,
            source,
            tx,
            stop_flag,
            batch_size: batch_size.max(1),
            state: WorkerState::Idle,
        }
    }

    /// Runs the worker loop and returns the state it stopped in.
    ///
    /// Generates candidates and tests them against the pattern until:
    /// - A match is found (`Found`, terminal message sent)
    /// - The candidate source fails (`Failed`, terminal message sent)
    /// - The stop flag is set or the coordinator hung up (`Cancelled`)
    pub fn run(&mut self) -> WorkerState {
        self.state = WorkerState::Searching;
        debug!(worker = self.id, "worker started");

        let mut attempts: u64 = 0;
        let mut since_last: u64 = 0;

        loop {
            if self.stop_flag.load(Ordering::Relaxed) {
                debug!(worker = self.id, attempts, "worker cancelled");
                return self.finish(WorkerState::Cancelled);
            }

            let candidate = match self.source.next_candidate() {
                Ok(candidate) => candidate,
                Err(error) => {
                    warn!(worker = self.id, %error, "candidate source failed");
                    let _ = self.tx.send(WorkerMessage::Failed {
                        worker_id: self.id,
                        error,
                    });
                    return self.finish(WorkerState::Failed);
                }
            };
            attempts += 1;
            since_last += 1;

            if self.pattern.matches(candidate.contract()).is_match() {
                info!(
                    worker = self.id,
                    attempts,
                    contract = %candidate.contract(),
                    "match found"
                );
                let _ = self.tx.send(WorkerMessage::Found {
                    worker_id: self.id,
                    candidate,
                    attempts_since_last: since_last,
                });
                return self.finish(WorkerState::Found);
            }

            if since_last == self.batch_size {
                let progress = ProgressMessage {
                    worker_id: self.id,
                    attempts_since_last: since_last,
                };
                if self.tx.send(WorkerMessage::Progress(progress)).is_err() {
                    return self.finish(WorkerState::Cancelled);
                }
                since_last = 0;
            }
        }
    }

    fn finish(&mut self, state: WorkerState) -> WorkerState {
        self.state = state;
        state
    }

    /// Returns the worker ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the current state.
    pub fn state(&self) -> WorkerState {
        self.state
    }
}
