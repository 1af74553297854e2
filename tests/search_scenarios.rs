//! End-to-end search behaviour with scripted candidate sources.

use std::sync::Arc;
use std::time::Duration;

use contract_vanity::crypto::EntropyError;
use contract_vanity::{
    create_address, Address, BoundedSearch, Candidate, CandidateSource, Coordinator,
    JsonFileStore, MemoryStore, PatternSpec, ResultStore, SearchError, SecureGenerator,
};

/// Yields `match_at`-th candidate with `hit` as contract, `miss` otherwise.
struct Script {
    produced: u64,
    match_at: u64,
    hit: Address,
    miss: Address,
}

impl Script {
    fn new(match_at: u64, hit: &str) -> Self {
        Self {
            produced: 0,
            match_at,
            hit: hit.parse().unwrap(),
            miss: "1111111111111111111111111111111111111111".parse().unwrap(),
        }
    }

    fn never() -> Self {
        Self::new(u64::MAX, "1111111111111111111111111111111111111111")
    }
}

impl CandidateSource for Script {
    fn next_candidate(&mut self) -> Result<Candidate, EntropyError> {
        self.produced += 1;
        let contract = if self.produced == self.match_at {
            self.hit
        } else {
            self.miss
        };
        Ok(Candidate::from_parts(
            [9u8; 32],
            Address::from_bytes([8u8; 20]),
            contract,
        ))
    }
}

#[test]
fn fifth_candidate_wins_with_exact_attempt_count() {
    let spec = PatternSpec::new_prefix_and_suffix("ab", "cd", false).unwrap();
    let coordinator = Coordinator::with_workers(1)
        .with_generator(|_| Script::new(5, "AB000000000000000000000000000000000000CD"))
        .with_poll_interval(Duration::from_millis(10));

    let result = coordinator.search(&spec).unwrap();
    assert_eq!(result.total_attempts(), 5);
    assert_eq!(result.contract().to_hex(), "ab000000000000000000000000000000000000cd");
    assert_eq!(result.pattern(), &spec);
}

#[test]
fn bounded_search_exhausts_at_ceiling() {
    let spec = PatternSpec::new_prefix_and_suffix("ab", "cd", false).unwrap();
    let err = BoundedSearch::new(1000)
        .run(&spec, &mut Script::never())
        .unwrap_err();
    match err {
        SearchError::SearchExhausted { attempts } => assert_eq!(attempts, 1000),
        other => panic!("expected SearchExhausted, got {:?}", other),
    }
}

#[test]
fn bounded_search_finds_and_saves() {
    let spec = PatternSpec::builder().zero_count(4).build().unwrap();
    let store = Arc::new(MemoryStore::new());
    let result = BoundedSearch::new(100)
        .with_store(store.clone())
        .run(
            &spec,
            &mut Script::new(42, "0000abcdef0000000000000000000000000000ff"),
        )
        .unwrap();

    assert_eq!(result.total_attempts(), 42);
    assert_eq!(store.keys(), vec!["vanity__".to_string()]);
}

#[test]
fn persistence_failure_still_returns_the_key() {
    let dir = tempfile::tempdir().unwrap();
    let not_a_dir = dir.path().join("plain-file");
    std::fs::write(&not_a_dir, b"x").unwrap();
    let store = Arc::new(JsonFileStore::new(not_a_dir.join("store.json")));

    let spec = PatternSpec::builder().prefix("ab").build().unwrap();
    let coordinator = Coordinator::with_workers(1)
        .with_generator(|_| Script::new(2, "ab00000000000000000000000000000000000000"))
        .with_store(store);

    let err = coordinator.search(&spec).unwrap_err();
    assert_eq!(err.class(), "PersistenceFailure");
    let result = err.unsaved_result().expect("result carried in the error");
    assert_eq!(result.contract().to_hex(), "ab00000000000000000000000000000000000000");
    assert_eq!(
        result.private_key_hex().as_str(),
        "0x0909090909090909090909090909090909090909090909090909090909090909"
    );
}

#[test]
fn real_search_finds_consistent_pair() {
    // One hex character: expected 16 attempts
    let spec = PatternSpec::builder().prefix("a").build().unwrap();
    let store = Arc::new(MemoryStore::new());
    let coordinator = Coordinator::with_workers(2).with_store(store.clone());

    let result = coordinator.search(&spec).unwrap();
    assert!(result.contract().to_hex().starts_with('a'));
    assert_eq!(create_address(result.deployer(), 0), *result.contract());

    let candidate = Candidate::from_secret_key(*result.private_key_bytes()).unwrap();
    assert_eq!(candidate.deployer(), result.deployer());
    assert_eq!(candidate.contract(), result.contract());

    let record = store.get("vanity_a_").unwrap().unwrap();
    assert_eq!(record.deployer_address, result.deployer().to_checksum());
}

#[test]
fn bounded_search_with_secure_generator() {
    let spec = PatternSpec::builder().custom_pattern("?a").build().unwrap();
    let result = BoundedSearch::new(100_000)
        .run(&spec, &mut SecureGenerator::new())
        .unwrap();
    assert_eq!(&result.contract().to_hex()[1..2], "a");
    assert!(result.total_attempts() >= 1);
}

#[test]
fn contract_derivation_is_deterministic() {
    let deployer: Address = "7e5f4552091a69125d5dfcb7b8c2659029395bdf".parse().unwrap();
    let expected: Address = "f2e246bb76df876cef8b38ae84130f4f55de395b".parse().unwrap();
    for _ in 0..16 {
        assert_eq!(create_address(&deployer, 0), expected);
    }
}
