//! Pattern matching for contract addresses.
//!
//! A [`PatternSpec`] combines any of:
//! - Prefix: Match at the start of the address
//! - Suffix: Match at the end of the address
//! - Leading zeros: Require a run of `0` characters at the start
//! - Custom pattern: Glob anchored at the start, `?` matches one character

mod pattern;

pub use pattern::{MatchResult, PatternError, PatternSpec, PatternSpecBuilder};
