//! Contract Vanity Address Search CLI
//!
//! Usage:
//!   contract-vanity dead "" false              # contract address starting with "dead"
//!   contract-vanity "" beef false              # ending with "beef"
//!   contract-vanity "" "" false --zeros 6      # six leading zeros
//!   contract-vanity "" "" false -p "c0?fee"    # glob, '?' matches one character
//!
//! Exit codes: 0 success, 1 usage error, 2 search or persistence failure.

use std::process;
use std::time::{Duration, Instant};

use clap::{CommandFactory, Parser};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contract_vanity::{BoundedSearch, Config, Coordinator, SearchError, SearchResult, SecureGenerator};

const EXIT_USAGE: i32 = 1;
const EXIT_FAILURE: i32 = 2;

fn main() {
    process::exit(run());
}

fn run() -> i32 {
    let config = match Config::try_parse() {
        Ok(config) => config,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            return code;
        }
    };

    init_logging();

    let spec = match config.pattern_spec() {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("InvalidPatternSpec: {}", e);
            eprintln!("{}", Config::command().render_usage());
            return EXIT_USAGE;
        }
    };

    info!(
        pattern = %spec,
        difficulty = %spec.difficulty_description(),
        workers = config.worker_count(),
        "contract vanity search"
    );

    let store = config.result_store();
    let mut progress = progress_reporter(Duration::from_secs(config.report_interval.max(1)));

    let outcome = if config.single_thread {
        let mut search = BoundedSearch::new(config.max_attempts).with_batch_size(config.batch_size);
        if let Some(store) = store {
            search = search.with_store(store);
        }
        search.run_with_progress(&spec, &mut SecureGenerator::new(), &mut progress)
    } else {
        let mut coordinator = Coordinator::with_workers(config.worker_count())
            .with_batch_size(config.batch_size);
        if let Some(store) = store {
            coordinator = coordinator.with_store(store);
        }

        let interrupt = coordinator.interrupt_handle();
        if let Err(e) = ctrlc::set_handler(move || {
            interrupt.store(true, std::sync::atomic::Ordering::Relaxed);
        }) {
            warn!(error = %e, "could not install Ctrl-C handler");
        }

        coordinator.search_with_progress(&spec, &mut progress)
    };

    match outcome {
        Ok(result) => {
            print_result(&result);
            0
        }
        Err(SearchError::Persistence { result, source }) => {
            // Still print the key: it is valid, only saving it failed
            print_result(&result);
            eprintln!("PersistenceFailure: result was NOT saved: {}", source);
            EXIT_FAILURE
        }
        Err(e) => {
            eprintln!("{}: {}", e.class(), e);
            EXIT_FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Logs the running attempt total at most once per `interval`.
fn progress_reporter(interval: Duration) -> impl FnMut(u64) {
    let start = Instant::now();
    let mut last_report = start;

    move |attempts| {
        if last_report.elapsed() < interval {
            return;
        }
        last_report = Instant::now();
        let elapsed = start.elapsed();
        let rate = attempts as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
        info!(
            "[{:>4}s] Tried {} keys ({}/s)",
            elapsed.as_secs(),
            format_number(attempts),
            format_number(rate as u64)
        );
    }
}

fn print_result(result: &SearchResult) {
    println!("Deployer Address: {}", result.deployer());
    println!("Contract Address: {}", result.contract());
    println!("Private Key:      {}", result.private_key_hex().as_str());
    println!("Attempts:         {}", format_number(result.total_attempts()));
    println!("Time elapsed:     {:.2}s", result.elapsed().as_secs_f64());
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}
