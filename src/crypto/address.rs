//! Ethereum address representation and utilities.

use std::fmt;
use std::str::FromStr;

use super::keccak256;

/// An Ethereum address (20 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

/// Error returned when parsing an address from hex.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("address must be 40 hex characters, got {0}")]
    Length(usize),

    #[error("address contains non-hex characters")]
    NotHex,
}

impl Address {
    /// Creates an address from raw bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns the address as raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns the address as a lowercase hex string (without 0x prefix).
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns the address with 0x prefix.
    pub fn to_hex_prefixed(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    /// Writes the lowercase hex body into a stack buffer.
    #[inline]
    pub fn hex_body(&self) -> [u8; 40] {
        let mut out = [0u8; 40];
        // 20 bytes always encode to exactly 40 characters
        let _ = hex::encode_to_slice(self.0, &mut out);
        out
    }

    /// Writes the EIP-55 mixed-case hex body into a stack buffer.
    #[inline]
    pub fn checksum_body_bytes(&self) -> [u8; 40] {
        let mut out = self.hex_body();
        let hash = keccak256(&out);

        for (i, c) in out.iter_mut().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.make_ascii_uppercase();
            }
        }
        out
    }

    /// Returns the EIP-55 mixed-case hex body, without the 0x prefix.
    pub fn checksum_body(&self) -> String {
        self.checksum_body_bytes().iter().map(|&b| b as char).collect()
    }

    /// Returns the address with checksum encoding (EIP-55).
    pub fn to_checksum(&self) -> String {
        format!("0x{}", self.checksum_body())
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    /// Parses 40 hex characters, with or without 0x, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if body.len() != 40 {
            return Err(AddressParseError::Length(body.len()));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(body, &mut bytes).map_err(|_| AddressParseError::NotHex)?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}
