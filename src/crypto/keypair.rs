//! Ethereum keypair generation.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::{PublicKey, Secp256k1, SecretKey, Signing};
use zeroize::Zeroizing;

use super::{keccak256, Address};

/// The secure random source could not produce bytes.
#[derive(Debug, thiserror::Error)]
#[error("secure random source failed: {0}")]
pub struct EntropyError(#[from] rand::Error);

/// Errors raised when importing an existing secret key.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("private key must be 64 hex characters")]
    Encoding,

    #[error("invalid secret key: {0}")]
    InvalidSecretKey(#[from] secp256k1::Error),
}

/// Represents an Ethereum keypair (private key + derived address).
///
/// The private key bytes are wiped when the keypair is dropped.
#[derive(Clone)]
pub struct Keypair {
    /// The private key bytes (32 bytes)
    secret_key: Zeroizing<[u8; 32]>,
    /// The derived Ethereum address
    address: Address,
}

impl Keypair {
    /// Generates a new random keypair from the operating system CSPRNG.
    pub fn generate() -> Result<Self, EntropyError> {
        let secp = Secp256k1::signing_only();
        Self::generate_with(&secp, &mut OsRng)
    }

    /// Generates a keypair using a caller-held context and random source.
    ///
    /// RNG failures are returned, never retried. A draw outside the valid
    /// scalar range is discarded and redrawn.
    #[inline]
    pub fn generate_with<C: Signing, R: RngCore>(
        secp: &Secp256k1<C>,
        rng: &mut R,
    ) -> Result<Self, EntropyError> {
        let mut secret = Zeroizing::new([0u8; 32]);
        loop {
            rng.try_fill_bytes(&mut secret[..])?;
            if let Ok(secret_key) = SecretKey::from_slice(&secret[..]) {
                let public_key = PublicKey::from_secret_key(secp, &secret_key);
                return Ok(Self {
                    secret_key: secret,
                    address: Self::derive_address(&public_key),
                });
            }
        }
    }

    /// Rebuilds a keypair from existing secret key bytes.
    pub fn from_secret_key(secret_bytes: [u8; 32]) -> Result<Self, KeyError> {
        let secp = Secp256k1::signing_only();
        let secret_key = SecretKey::from_slice(&secret_bytes)?;
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);

        Ok(Self {
            secret_key: Zeroizing::new(secret_bytes),
            address: Self::derive_address(&public_key),
        })
    }

    /// Rebuilds a keypair from a hex private key, with or without 0x.
    pub fn from_hex(private_key: &str) -> Result<Self, KeyError> {
        let body = private_key.strip_prefix("0x").unwrap_or(private_key);
        let mut bytes = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(body, &mut bytes[..]).map_err(|_| KeyError::Encoding)?;
        Self::from_secret_key(*bytes)
    }

    /// Derives an Ethereum address from a secp256k1 public key.
    ///
    /// Process:
    /// 1. Serialize the public key in uncompressed form (65 bytes)
    /// 2. Remove the first byte (0x04 prefix)
    /// 3. Hash the remaining 64 bytes with Keccak-256
    /// 4. Take the last 20 bytes of the hash
    #[inline]
    fn derive_address(public_key: &PublicKey) -> Address {
        let public_key_bytes = public_key.serialize_uncompressed();
        let hash = keccak256(&public_key_bytes[1..]);

        let mut address_bytes = [0u8; 20];
        address_bytes.copy_from_slice(&hash[12..]);
        Address::from_bytes(address_bytes)
    }

    /// Returns the private key as 0x-prefixed hex, the form `from_hex` reads back.
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        encode_private_key(&self.secret_key)
    }

    /// Returns the private key bytes.
    pub fn private_key_bytes(&self) -> &[u8; 32] {
        &self.secret_key
    }

    /// Returns a reference to the derived address.
    #[inline]
    pub fn address(&self) -> &Address {
        &self.address
    }
}

/// 0x-prefixed lowercase hex of a private key.
pub(crate) fn encode_private_key(secret: &[u8; 32]) -> Zeroizing<String> {
    let mut out = Zeroizing::new(String::with_capacity(66));
    out.push_str("0x");
    out.push_str(&Zeroizing::new(hex::encode(&secret[..])));
    out
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
