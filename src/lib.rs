//! # contract_vanity
//!
//! Multi-core search for a deployer key whose first contract address
//! (CREATE at nonce 0) matches a vanity pattern.
//!
//! ## Architecture
//!
//! - `crypto`: Key generation, address and CREATE address derivation
//! - `matcher`: Vanity patterns and matching
//! - `worker`: Worker units, the coordinator and the bounded fallback
//! - `store`: Merge-on-write persistence of found keys
//! - `config`: Runtime configuration

pub mod config;
pub mod crypto;
pub mod error;
pub mod matcher;
pub mod store;
pub mod worker;

pub use config::Config;
pub use crypto::{create_address, Address, Keypair};
pub use error::SearchError;
pub use matcher::{MatchResult, PatternError, PatternSpec};
pub use store::{JsonFileStore, MemoryStore, PersistenceError, ResultRecord, ResultStore};
pub use worker::{
    BoundedSearch, Candidate, CandidateSource, Coordinator, SearchResult, SecureGenerator,
};
