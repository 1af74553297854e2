//! Multi-worker search coordination.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use tracing::{debug, info, warn};

use crate::error::SearchError;
use crate::matcher::PatternSpec;
use crate::store::{persist_result, ResultStore};

use super::cpu::CpuWorker;
use super::generator::{CandidateSource, SecureGenerator};
use super::{SearchResult, WorkerMessage, WorkerState, DEFAULT_BATCH_SIZE};

/// Default generator factory: one OS-entropy generator per worker.
pub type SecureFactory = fn(usize) -> SecureGenerator;

/// Fans a search out over one thread per worker; the first match wins.
///
/// Every worker searches the same pattern with its own generator. Workers
/// report progress and terminal messages over one bounded channel; the
/// coordinator is its only consumer.
pub struct Coordinator<F = SecureFactory> {
    /// Number of workers
    num_workers: usize,
    /// Attempts between progress messages
    batch_size: u64,
    /// Bound of the fan-in channel
    channel_capacity: usize,
    /// How often the interrupt flag and worker liveness are checked
    poll_interval: Duration,
    /// Builds the candidate source for a worker ID
    factory: F,
    store: Option<Arc<dyn ResultStore>>,
    /// Set from outside (e.g. Ctrl-C) to abandon the search
    interrupt: Arc<AtomicBool>,
}

impl Coordinator<SecureFactory> {
    /// Creates a coordinator with one worker per CPU core.
    pub fn new() -> Self {
        Self::with_workers(num_cpus::get())
    }

    /// Creates a coordinator with the specified number of workers.
    pub fn with_workers(num_workers: usize) -> Self {
        Self {
            num_workers: num_workers.max(1),
            batch_size: DEFAULT_BATCH_SIZE,
            channel_capacity: 100,
            poll_interval: Duration::from_millis(250),
            factory: SecureGenerator::for_worker,
            store: None,
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for Coordinator<SecureFactory> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, G> Coordinator<F>
where
    F: Fn(usize) -> G,
    G: CandidateSource + 'static,
{
    /// Replaces the candidate source factory.
    pub fn with_generator<F2, G2>(self, factory: F2) -> Coordinator<F2>
    where
        F2: Fn(usize) -> G2,
        G2: CandidateSource + 'static,
    {
        Coordinator {
            num_workers: self.num_workers,
            batch_size: self.batch_size,
            channel_capacity: self.channel_capacity,
            poll_interval: self.poll_interval,
            factory,
            store: self.store,
            interrupt: self.interrupt,
        }
    }

    /// Persists every result to `store` before returning it.
    pub fn with_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Returns the number of workers.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Returns a clone of the interrupt flag for external use (e.g., signal handlers).
    ///
    /// Setting it cancels the running (or next) search; it is cleared once
    /// that search has wound down.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupt.clone()
    }

    /// Runs a search until the first match.
    pub fn search(&self, spec: &PatternSpec) -> Result<SearchResult, SearchError> {
        self.search_with_progress(spec, |_| {})
    }

    /// Runs a search, calling `on_progress` with the running attempt total
    /// after every progress message. The total never decreases.
    pub fn search_with_progress<P>(
        &self,
        spec: &PatternSpec,
        mut on_progress: P,
    ) -> Result<SearchResult, SearchError>
    where
        P: FnMut(u64),
    {
        let (outcome, _states) = self.run(spec, &mut on_progress);
        persist_result(self.store.as_deref(), outcome?)
    }

    /// Spawns the workers, waits for the deciding message, then cancels and
    /// joins everyone. Returns the outcome and each worker's final state.
    fn run(
        &self,
        spec: &PatternSpec,
        on_progress: &mut dyn FnMut(u64),
    ) -> (Result<SearchResult, SearchError>, Vec<WorkerState>) {
        let start = Instant::now();
        let (tx, rx) = bounded(self.channel_capacity);
        let stop_flag = Arc::new(AtomicBool::new(false));

        info!(
            workers = self.num_workers,
            pattern = %spec,
            difficulty = spec.estimated_difficulty(),
            "starting search"
        );

        let mut handles = Vec::with_capacity(self.num_workers);
        let mut spawn_error = None;
        for id in 0..self.num_workers {
            let mut worker = CpuWorker::new(
                id,
                spec.clone(),
                (self.factory)(id),
                tx.clone(),
                stop_flag.clone(),
                self.batch_size,
            );
            let spawned = thread::Builder::new()
                .name(format!("vanity-worker-{}", id))
                .spawn(move || worker.run());
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    spawn_error = Some(e);
                    break;
                }
            }
        }

        // Drop our sender so the channel disconnects once every worker exits
        drop(tx);

        let outcome = match spawn_error {
            Some(e) => Err(SearchError::Spawn(e)),
            None => self.collect(spec, &rx, &handles, start, on_progress),
        };

        // Cancel everyone still searching and discard whatever is in flight
        stop_flag.store(true, Ordering::Relaxed);
        let late = rx.iter().count();
        if late > 0 {
            debug!(late, "discarded in-flight worker messages");
        }

        let states = handles
            .into_iter()
            .enumerate()
            .map(|(id, handle)| {
                handle.join().unwrap_or_else(|_| {
                    warn!(worker = id, "worker panicked");
                    WorkerState::Failed
                })
            })
            .collect();

        // Consumed: the next search starts fresh
        self.interrupt.store(false, Ordering::Relaxed);

        (outcome, states)
    }

    /// Consumes the fan-in channel until a terminal message, an interrupt,
    /// or a worker that died without reporting.
    fn collect(
        &self,
        spec: &PatternSpec,
        rx: &Receiver<WorkerMessage>,
        handles: &[JoinHandle<WorkerState>],
        start: Instant,
        on_progress: &mut dyn FnMut(u64),
    ) -> Result<SearchResult, SearchError> {
        let mut total_attempts: u64 = 0;

        loop {
            if self.interrupt.load(Ordering::Relaxed) {
                info!(total_attempts, "search interrupted");
                return Err(SearchError::Interrupted {
                    attempts: total_attempts,
                });
            }

            match rx.recv_timeout(self.poll_interval) {
                Ok(msg) => {
                    if let Some(done) =
                        Self::handle(spec, msg, &mut total_attempts, start, on_progress)
                    {
                        return done;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    let Some(dead) = handles.iter().position(JoinHandle::is_finished) else {
                        continue;
                    };
                    // A worker that exited may still have a terminal message queued
                    while let Ok(msg) = rx.try_recv() {
                        if let Some(done) =
                            Self::handle(spec, msg, &mut total_attempts, start, on_progress)
                        {
                            return done;
                        }
                    }
                    return Err(SearchError::WorkerPanicked { worker_id: dead });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    let dead = handles.iter().position(JoinHandle::is_finished).unwrap_or(0);
                    return Err(SearchError::WorkerPanicked { worker_id: dead });
                }
            }
        }
    }

    /// Applies one message; returns the outcome if it decides the search.
    fn handle(
        spec: &PatternSpec,
        msg: WorkerMessage,
        total_attempts: &mut u64,
        start: Instant,
        on_progress: &mut dyn FnMut(u64),
    ) -> Option<Result<SearchResult, SearchError>> {
        match msg {
            WorkerMessage::Progress(progress) => {
                *total_attempts = total_attempts.saturating_add(progress.attempts_since_last);
                on_progress(*total_attempts);
                None
            }
            WorkerMessage::Found {
                worker_id,
                candidate,
                attempts_since_last,
            } => {
                let total = total_attempts.saturating_add(attempts_since_last);
                let elapsed = start.elapsed();
                info!(
                    worker = worker_id,
                    total_attempts = total,
                    elapsed_ms = elapsed.as_millis() as u64,
                    deployer = %candidate.deployer(),
                    contract = %candidate.contract(),
                    "search complete"
                );
                Some(Ok(SearchResult::new(
                    spec.clone(),
                    candidate,
                    total,
                    elapsed,
                    worker_id,
                )))
            }
            WorkerMessage::Failed { worker_id, error } => {
                warn!(worker = worker_id, %error, "aborting search");
                Some(Err(SearchError::EntropyFailure {
                    worker_id,
                    source: error,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Address, EntropyError};
    use crate::store::MemoryStore;
    use crate::worker::Candidate;

    /// Worker `winner` matches on attempt `match_at`; everyone else never does.
    struct Rigged {
        id: usize,
        winner: usize,
        match_at: u64,
        produced: u64,
    }

    impl CandidateSource for Rigged {
        fn next_candidate(&mut self) -> Result<Candidate, EntropyError> {
            self.produced += 1;
            let contract = if self.id == self.winner && self.produced == self.match_at {
                [0xcc; 20]
            } else {
                [0x11; 20]
            };
            Ok(Candidate::from_parts(
                [self.id as u8 + 1; 32],
                Address::from_bytes([self.id as u8; 20]),
                Address::from_bytes(contract),
            ))
        }
    }

    struct Broken;

    impl CandidateSource for Broken {
        fn next_candidate(&mut self) -> Result<Candidate, EntropyError> {
            Err(rand::Error::new("getrandom failed").into())
        }
    }

    fn spec() -> PatternSpec {
        PatternSpec::builder().prefix("cccc").build().unwrap()
    }

    fn rigged(winner: usize, match_at: u64) -> impl Fn(usize) -> Rigged {
        move |id| Rigged {
            id,
            winner,
            match_at,
            produced: 0,
        }
    }

    #[test]
    fn test_single_winner_others_cancelled() {
        let coordinator = Coordinator::with_workers(4)
            .with_generator(rigged(2, 5_000))
            .with_batch_size(100)
            .with_poll_interval(Duration::from_millis(10));

        let mut progress = |_: u64| {};
        let (outcome, states) = coordinator.run(&spec(), &mut progress);
        let result = outcome.unwrap();

        assert_eq!(result.worker_id(), 2);
        assert_eq!(result.deployer(), &Address::from_bytes([2u8; 20]));
        assert!(result.total_attempts() >= 5_000);
        assert_eq!(states.len(), 4);
        for (id, state) in states.iter().enumerate() {
            if id == 2 {
                assert_eq!(*state, WorkerState::Found);
            } else {
                assert_eq!(*state, WorkerState::Cancelled);
            }
        }
    }

    #[test]
    fn test_entropy_failure_aborts_search() {
        let coordinator = Coordinator::with_workers(3)
            .with_generator(|id| -> Box<dyn CandidateSource> {
                if id == 1 {
                    Box::new(Broken)
                } else {
                    Box::new(rigged(usize::MAX, 0)(id))
                }
            })
            .with_poll_interval(Duration::from_millis(10));

        let mut progress = |_: u64| {};
        let (outcome, states) = coordinator.run(&spec(), &mut progress);
        assert!(matches!(
            outcome,
            Err(SearchError::EntropyFailure { worker_id: 1, .. })
        ));
        assert_eq!(states[1], WorkerState::Failed);
        assert_eq!(states[0], WorkerState::Cancelled);
        assert_eq!(states[2], WorkerState::Cancelled);
    }

    #[test]
    fn test_interrupt_cancels_workers() {
        let coordinator = Coordinator::with_workers(2)
            .with_generator(rigged(usize::MAX, 0))
            .with_poll_interval(Duration::from_millis(10));
        coordinator.interrupt_handle().store(true, Ordering::Relaxed);

        let mut progress = |_: u64| {};
        let (outcome, states) = coordinator.run(&spec(), &mut progress);
        assert!(matches!(outcome, Err(SearchError::Interrupted { .. })));
        assert!(states.iter().all(|s| *s == WorkerState::Cancelled));
    }

    #[test]
    fn test_interrupt_applies_to_one_search() {
        let coordinator = Coordinator::with_workers(2)
            .with_generator(rigged(1, 50))
            .with_poll_interval(Duration::from_millis(10));

        coordinator.interrupt_handle().store(true, Ordering::Relaxed);
        assert!(matches!(
            coordinator.search(&spec()),
            Err(SearchError::Interrupted { .. })
        ));
        assert!(!coordinator.interrupt_handle().load(Ordering::Relaxed));

        let result = coordinator.search(&spec()).unwrap();
        assert_eq!(result.worker_id(), 1);
    }

    #[test]
    fn test_progress_totals_are_monotonic() {
        let coordinator = Coordinator::with_workers(3)
            .with_generator(rigged(0, 20_000))
            .with_batch_size(250)
            .with_poll_interval(Duration::from_millis(10));

        let mut seen = Vec::new();
        let result = coordinator
            .search_with_progress(&spec(), |total| seen.push(total))
            .unwrap();

        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!(result.total_attempts() >= *seen.last().unwrap());
    }

    #[test]
    fn test_result_is_persisted() {
        let store = Arc::new(MemoryStore::new());
        let coordinator = Coordinator::with_workers(2)
            .with_generator(rigged(1, 3))
            .with_store(store.clone());

        let result = coordinator.search(&spec()).unwrap();
        let record = store.get("vanity_cccc_").unwrap().unwrap();
        assert_eq!(record.contract_address, result.contract().to_checksum());
        assert_eq!(record.private_key, result.private_key_hex().as_str());
    }

    #[test]
    fn test_zero_workers_means_one() {
        assert_eq!(Coordinator::with_workers(0).num_workers(), 1);
    }
}
