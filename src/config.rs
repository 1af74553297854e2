//! Runtime configuration for the contract vanity search CLI.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::matcher::{PatternError, PatternSpec};
use crate::store::{JsonFileStore, ResultStore};

/// Search for a deployer key whose first contract address matches a pattern
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Hex prefix the contract address must start with (may be "")
    pub prefix: String,

    /// Hex suffix the contract address must end with (may be "")
    pub suffix: String,

    /// Case sensitive matching against the EIP-55 checksum address
    #[arg(value_parser = ["true", "false"])]
    pub case_sensitive: String,

    /// Require this many leading '0' characters
    #[arg(short = 'z', long)]
    pub zeros: Option<usize>,

    /// Glob anchored at the start of the address; '?' matches one character
    #[arg(short = 'p', long)]
    pub pattern: Option<String>,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Search in the calling thread only, giving up after --max-attempts
    #[arg(long, default_value = "false")]
    pub single_thread: bool,

    /// Attempt ceiling for --single-thread
    #[arg(long, default_value = "1000000")]
    pub max_attempts: u64,

    /// JSON file results are merged into
    #[arg(long, env = "VANITY_STORE", default_value = "vanity-addresses.json")]
    pub store: PathBuf,

    /// Do not persist the result
    #[arg(long, default_value = "false")]
    pub no_store: bool,

    /// Attempts each worker makes between progress messages
    #[arg(long, default_value = "1000")]
    pub batch_size: u64,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,
}

impl Config {
    /// Returns the number of workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive == "true"
    }

    /// Validates the pattern arguments and builds the `PatternSpec`
    pub fn pattern_spec(&self) -> Result<PatternSpec, PatternError> {
        let mut builder = PatternSpec::builder()
            .prefix(self.prefix.clone())
            .suffix(self.suffix.clone())
            .case_sensitive(self.is_case_sensitive());
        if let Some(zeros) = self.zeros {
            builder = builder.zero_count(zeros);
        }
        if let Some(ref pattern) = self.pattern {
            builder = builder.custom_pattern(pattern.clone());
        }
        builder.build()
    }

    /// Returns the configured store, unless persistence is disabled
    pub fn result_store(&self) -> Option<Arc<dyn ResultStore>> {
        if self.no_store {
            None
        } else {
            Some(Arc::new(JsonFileStore::new(self.store.clone())))
        }
    }
}
