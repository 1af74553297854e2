//! Cryptographic operations for deployer keys and contract addresses.
//!
//! This module provides:
//! - Secure random key generation using secp256k1
//! - Ethereum address derivation using Keccak-256
//! - CREATE contract address derivation (RLP of sender and nonce)

mod address;
mod create;
mod keypair;

use tiny_keccak::{Hasher, Keccak};

pub use address::{Address, AddressParseError};
pub use create::create_address;
pub use keypair::{EntropyError, KeyError, Keypair};
pub(crate) use keypair::encode_private_key;

/// Keccak-256 of arbitrary bytes (output 32 bytes).
#[inline]
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(input);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}
