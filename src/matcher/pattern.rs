//! Pattern matching implementation.

use std::fmt;

use crate::crypto::Address;

/// Number of hex characters in an address body.
const BODY_LEN: usize = 40;

/// Errors raised while building a [`PatternSpec`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("at least one of prefix, suffix, zero count or custom pattern is required")]
    Empty,

    #[error("{field} must contain only {allowed}, got {value:?}")]
    InvalidCharacters {
        field: &'static str,
        allowed: &'static str,
        value: String,
    },

    #[error("{field} cannot be longer than 40 characters (got {len})")]
    TooLong { field: &'static str, len: usize },

    #[error("combined prefix + suffix cannot be longer than 40 characters (got {0})")]
    PrefixSuffixTooLong(usize),
}

/// Result of a pattern match operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// Full match found
    Match,
    /// No match
    NoMatch,
}

impl MatchResult {
    #[inline]
    pub fn is_match(self) -> bool {
        matches!(self, MatchResult::Match)
    }
}

impl From<bool> for MatchResult {
    #[inline]
    fn from(matched: bool) -> Self {
        if matched {
            MatchResult::Match
        } else {
            MatchResult::NoMatch
        }
    }
}

/// Normalized matching criteria for a contract address.
///
/// Every criterion that is present must hold. Built through
/// [`PatternSpec::builder`], which rejects malformed input, so matching
/// itself cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSpec {
    prefix: Option<String>,
    suffix: Option<String>,
    zero_count: Option<usize>,
    custom_pattern: Option<String>,
    case_sensitive: bool,
}

/// Builder for [`PatternSpec`].
#[derive(Debug, Clone, Default)]
pub struct PatternSpecBuilder {
    prefix: Option<String>,
    suffix: Option<String>,
    zero_count: Option<usize>,
    custom_pattern: Option<String>,
    case_sensitive: bool,
}

impl PatternSpecBuilder {
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn zero_count(mut self, zeros: usize) -> Self {
        self.zero_count = Some(zeros);
        self
    }

    /// Glob over the address body: `?` matches any single hex character,
    /// everything else matches literally, anchored at the start.
    pub fn custom_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.custom_pattern = Some(pattern.into());
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Validates and normalizes the criteria.
    pub fn build(self) -> Result<PatternSpec, PatternError> {
        let case_sensitive = self.case_sensitive;
        let normalize = |s: String| if case_sensitive { s } else { s.to_lowercase() };

        let prefix = non_empty(self.prefix).map(normalize);
        let suffix = non_empty(self.suffix).map(normalize);
        let custom_pattern = non_empty(self.custom_pattern).map(normalize);
        let zero_count = self.zero_count.filter(|&n| n > 0);

        if let Some(ref prefix) = prefix {
            check_chars("prefix", prefix, false)?;
        }
        if let Some(ref suffix) = suffix {
            check_chars("suffix", suffix, false)?;
        }
        if let Some(ref pattern) = custom_pattern {
            check_chars("custom pattern", pattern, true)?;
        }
        if let Some(zeros) = zero_count {
            if zeros > BODY_LEN {
                return Err(PatternError::TooLong {
                    field: "zero count",
                    len: zeros,
                });
            }
        }

        let fixed_len = prefix.as_ref().map_or(0, String::len) + suffix.as_ref().map_or(0, String::len);
        if fixed_len > BODY_LEN {
            return Err(PatternError::PrefixSuffixTooLong(fixed_len));
        }

        if prefix.is_none() && suffix.is_none() && zero_count.is_none() && custom_pattern.is_none() {
            return Err(PatternError::Empty);
        }

        Ok(PatternSpec {
            prefix,
            suffix,
            zero_count,
            custom_pattern,
            case_sensitive,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn check_chars(field: &'static str, value: &str, allow_wildcard: bool) -> Result<(), PatternError> {
    let valid = value
        .bytes()
        .all(|c| c.is_ascii_hexdigit() || (allow_wildcard && c == b'?'));
    if !valid {
        return Err(PatternError::InvalidCharacters {
            field,
            allowed: if allow_wildcard {
                "hex characters (0-9, a-f) and '?'"
            } else {
                "hex characters (0-9, a-f)"
            },
            value: value.to_string(),
        });
    }
    if value.len() > BODY_LEN {
        return Err(PatternError::TooLong {
            field,
            len: value.len(),
        });
    }
    Ok(())
}

impl PatternSpec {
    /// Starts building a pattern.
    pub fn builder() -> PatternSpecBuilder {
        PatternSpecBuilder::default()
    }

    /// Convenience constructor for the common prefix/suffix search.
    pub fn new_prefix_and_suffix(
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        case_sensitive: bool,
    ) -> Result<Self, PatternError> {
        Self::builder()
            .prefix(prefix)
            .suffix(suffix)
            .case_sensitive(case_sensitive)
            .build()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    pub fn zero_count(&self) -> Option<usize> {
        self.zero_count
    }

    pub fn custom_pattern(&self) -> Option<&str> {
        self.custom_pattern.as_deref()
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Matches an address against this pattern.
    ///
    /// Case-insensitive specs compare against the lowercase body,
    /// case-sensitive ones against the EIP-55 checksum body.
    #[inline]
    pub fn matches(&self, address: &Address) -> MatchResult {
        let body = if self.case_sensitive {
            address.checksum_body_bytes()
        } else {
            address.hex_body()
        };
        self.matches_body(&body)
    }

    /// Matches an already rendered address body (hex, no 0x).
    #[inline]
    pub fn matches_body(&self, body: &[u8]) -> MatchResult {
        if let Some(ref prefix) = self.prefix {
            if !body.starts_with(prefix.as_bytes()) {
                return MatchResult::NoMatch;
            }
        }
        if let Some(ref suffix) = self.suffix {
            if !body.ends_with(suffix.as_bytes()) {
                return MatchResult::NoMatch;
            }
        }
        if let Some(zeros) = self.zero_count {
            if body.len() < zeros || !body[..zeros].iter().all(|&c| c == b'0') {
                return MatchResult::NoMatch;
            }
        }
        if let Some(ref pattern) = self.custom_pattern {
            let pattern = pattern.as_bytes();
            if body.len() < pattern.len() {
                return MatchResult::NoMatch;
            }
            let glob_ok = pattern
                .iter()
                .zip(body)
                .all(|(&p, &c)| p == b'?' || p == c);
            if !glob_ok {
                return MatchResult::NoMatch;
            }
        }
        MatchResult::Match
    }

    /// Key under which results for this pattern are persisted.
    pub fn store_key(&self) -> String {
        format!(
            "vanity_{}_{}",
            self.prefix.as_deref().unwrap_or(""),
            self.suffix.as_deref().unwrap_or("")
        )
    }

    /// Returns the estimated difficulty (number of attempts to find a match).
    ///
    /// Each constrained nibble position has 16 possible values, so the
    /// expected attempts are 16^n for n distinct constrained positions.
    /// `?` leaves a position free; overlapping rules count it once.
    pub fn estimated_difficulty(&self) -> u64 {
        let mut constrained = [false; BODY_LEN];

        if let Some(ref prefix) = self.prefix {
            constrained[..prefix.len()].iter_mut().for_each(|c| *c = true);
        }
        if let Some(ref suffix) = self.suffix {
            constrained[BODY_LEN - suffix.len()..]
                .iter_mut()
                .for_each(|c| *c = true);
        }
        if let Some(zeros) = self.zero_count {
            constrained[..zeros].iter_mut().for_each(|c| *c = true);
        }
        if let Some(ref pattern) = self.custom_pattern {
            for (i, c) in pattern.bytes().enumerate() {
                if c != b'?' {
                    constrained[i] = true;
                }
            }
        }

        let positions = constrained.iter().filter(|&&c| c).count();
        16u64.saturating_pow(positions as u32)
    }

    /// Returns a human-readable difficulty estimate.
    pub fn difficulty_description(&self) -> String {
        let diff = self.estimated_difficulty();
        match diff {
            0..=1_000 => "Very Easy (< 1 second)".into(),
            1_001..=100_000 => "Easy (seconds)".into(),
            100_001..=10_000_000 => "Medium (minutes)".into(),
            10_000_001..=1_000_000_000 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

impl fmt::Display for PatternSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(4);
        if let Some(ref prefix) = self.prefix {
            parts.push(format!("prefix={}", prefix));
        }
        if let Some(ref suffix) = self.suffix {
            parts.push(format!("suffix={}", suffix));
        }
        if let Some(zeros) = self.zero_count {
            parts.push(format!("zeros={}", zeros));
        }
        if let Some(ref pattern) = self.custom_pattern {
            parts.push(format!("pattern={}", pattern));
        }
        write!(
            f,
            "{} ({})",
            parts.join(" "),
            if self.case_sensitive {
                "case-sensitive"
            } else {
                "case-insensitive"
            }
        )
    }
}
