//! Durable storage for found deployer keys.
//!
//! Every store follows the same merge-on-write contract: `upsert` replaces
//! the value under one key and leaves every other key exactly as it was.

mod file;
mod memory;

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use zeroize::Zeroize;

use crate::error::SearchError;
use crate::worker::SearchResult;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Tag written into every record to identify the producer.
pub const GENERATOR_TAG: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Errors raised while reading or writing a store.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("store {path} must hold a JSON object at the top level")]
    NotAnObject { path: PathBuf },

    #[error("timed out waiting for lock {path}")]
    Locked { path: PathBuf },

    #[error("record encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// A persisted search result.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    /// Human-readable pattern description
    pub pattern: String,
    /// 0x-prefixed hex private key of the deployer
    pub private_key: String,
    /// EIP-55 deployer address
    pub deployer_address: String,
    /// EIP-55 address of the deployer's first contract
    pub contract_address: String,
    pub description: String,
    /// Serialized as an ISO date (YYYY-MM-DD)
    pub created_at: NaiveDate,
    pub generator_tag: String,
}

impl ResultRecord {
    /// Builds the record for a search result.
    pub fn from_result(result: &SearchResult, created_at: NaiveDate) -> Self {
        Self {
            pattern: result.pattern().to_string(),
            private_key: result.private_key_hex().as_str().to_owned(),
            deployer_address: result.deployer().to_checksum(),
            contract_address: result.contract().to_checksum(),
            description: format!(
                "Deployer whose first contract (nonce 0) is {}",
                result.contract().to_checksum()
            ),
            created_at,
            generator_tag: GENERATOR_TAG.to_string(),
        }
    }
}

impl Drop for ResultRecord {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

impl fmt::Debug for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultRecord")
            .field("pattern", &self.pattern)
            .field("deployer_address", &self.deployer_address)
            .field("contract_address", &self.contract_address)
            .field("description", &self.description)
            .field("created_at", &self.created_at)
            .field("generator_tag", &self.generator_tag)
            .finish_non_exhaustive()
    }
}

/// A key-value store for result records with merge-on-write semantics.
pub trait ResultStore: Send + Sync {
    /// Inserts or replaces the record under `key`; all other keys survive.
    fn upsert(&self, key: &str, record: &ResultRecord) -> Result<(), PersistenceError>;

    /// Reads the record under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<ResultRecord>, PersistenceError>;
}

/// Writes `result` to `store` (when one is configured) and hands it back.
///
/// A write failure does not discard the result: it travels inside
/// [`SearchError::Persistence`].
pub(crate) fn persist_result(
    store: Option<&dyn ResultStore>,
    result: SearchResult,
) -> Result<SearchResult, SearchError> {
    let Some(store) = store else {
        return Ok(result);
    };

    let key = result.pattern().store_key();
    let record = ResultRecord::from_result(&result, chrono::Local::now().date_naive());
    match store.upsert(&key, &record) {
        Ok(()) => {
            info!(%key, contract = %result.contract(), "result saved");
            Ok(result)
        }
        Err(source) => {
            error!(%key, error = %source, "failed to save result");
            Err(SearchError::Persistence {
                result: Box::new(result),
                source,
            })
        }
    }
}
