//! Candidate generation: random deployer key → CREATE contract address.

use std::fmt;

use rand::rngs::OsRng;
use secp256k1::{Secp256k1, SignOnly};
use zeroize::Zeroizing;

use crate::crypto::{
    create_address, encode_private_key, Address, EntropyError, KeyError, Keypair,
};

/// Nonce of the deployment transaction the contract address is derived for.
pub const DEPLOY_NONCE: u64 = 0;

/// A deployer key together with the address its first contract lands at.
#[derive(Clone)]
pub struct Candidate {
    private_key: Zeroizing<[u8; 32]>,
    deployer: Address,
    contract: Address,
}

impl Candidate {
    /// Builds a candidate from a keypair, deriving the contract address at
    /// nonce 0.
    #[inline]
    pub fn from_keypair(keypair: &Keypair) -> Self {
        let deployer = *keypair.address();
        Self {
            private_key: Zeroizing::new(*keypair.private_key_bytes()),
            deployer,
            contract: create_address(&deployer, DEPLOY_NONCE),
        }
    }

    /// Recomputes a candidate from stored key bytes.
    pub fn from_secret_key(secret: [u8; 32]) -> Result<Self, KeyError> {
        Keypair::from_secret_key(secret).map(|kp| Self::from_keypair(&kp))
    }

    /// Assembles a candidate from already derived parts.
    ///
    /// No derivation happens here; [`Candidate::is_consistent`] tells
    /// whether the parts agree.
    pub fn from_parts(private_key: [u8; 32], deployer: Address, contract: Address) -> Self {
        Self {
            private_key: Zeroizing::new(private_key),
            deployer,
            contract,
        }
    }

    pub fn deployer(&self) -> &Address {
        &self.deployer
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    pub fn private_key_bytes(&self) -> &[u8; 32] {
        &self.private_key
    }

    /// Private key as 0x-prefixed hex.
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        encode_private_key(&self.private_key)
    }

    /// True when the key derives `deployer` and `deployer` at nonce 0
    /// derives `contract`.
    pub fn is_consistent(&self) -> bool {
        match Keypair::from_secret_key(*self.private_key) {
            Ok(kp) => {
                *kp.address() == self.deployer
                    && create_address(&self.deployer, DEPLOY_NONCE) == self.contract
            }
            Err(_) => false,
        }
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("deployer", &self.deployer)
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

/// Source of candidates for a worker.
///
/// Errors are terminal for the worker that owns the source.
pub trait CandidateSource: Send {
    fn next_candidate(&mut self) -> Result<Candidate, EntropyError>;
}

impl<T: CandidateSource + ?Sized> CandidateSource for Box<T> {
    fn next_candidate(&mut self) -> Result<Candidate, EntropyError> {
        (**self).next_candidate()
    }
}

/// Production source: keys drawn from the operating system CSPRNG.
pub struct SecureGenerator {
    secp: Secp256k1<SignOnly>,
}

impl SecureGenerator {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::signing_only(),
        }
    }

    /// Factory signature used by the coordinator.
    pub fn for_worker(_worker_id: usize) -> Self {
        Self::new()
    }
}

impl Default for SecureGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateSource for SecureGenerator {
    #[inline]
    fn next_candidate(&mut self) -> Result<Candidate, EntropyError> {
        let keypair = Keypair::generate_with(&self.secp, &mut OsRng)?;
        Ok(Candidate::from_keypair(&keypair))
    }
}
