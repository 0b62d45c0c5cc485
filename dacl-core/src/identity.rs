//! # Identity Scheme
//!
//! Parsing and verification of manager identities and signatures. Both are
//! exchanged as Base58 text; the default scheme is Ed25519.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Verifier, VerifyingKey};
use thiserror::Error;

pub const PUBLIC_KEY_LENGTH: usize = 32;
pub const SIGNATURE_LENGTH: usize = 64;

/// Errors from decoding identity text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid base58: {0}")]
    Base58(String),

    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

/// Public-key cryptography used to authorize ACL changes.
pub trait IdentityScheme: Send + Sync {
    type PublicKey;
    type Signature;

    fn parse_public_key(&self, text: &str) -> Result<Self::PublicKey, IdentityError>;

    fn parse_signature(&self, text: &str) -> Result<Self::Signature, IdentityError>;

    fn verify(&self, key: &Self::PublicKey, message: &[u8], signature: &Self::Signature) -> bool;
}

fn decode_fixed<const N: usize>(text: &str) -> Result<[u8; N], IdentityError> {
    let bytes = bs58::decode(text)
        .into_vec()
        .map_err(|e| IdentityError::Base58(e.to_string()))?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| IdentityError::Length { expected: N, actual })
}

/// Raw 32-byte Ed25519 public key.
///
/// Any 32 bytes are accepted here; whether they form a usable curve point is
/// only decided at verification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_LENGTH]);

impl FromStr for PublicKey {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed(s).map(Self)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

/// Raw 64-byte Ed25519 signature
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_LENGTH]);

impl FromStr for Signature {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed(s).map(Self)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

/// Ed25519 keys and signatures in Base58 text
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Base58;

impl IdentityScheme for Ed25519Base58 {
    type PublicKey = PublicKey;
    type Signature = Signature;

    fn parse_public_key(&self, text: &str) -> Result<PublicKey, IdentityError> {
        text.parse()
    }

    fn parse_signature(&self, text: &str) -> Result<Signature, IdentityError> {
        text.parse()
    }

    fn verify(&self, key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&key.0) else {
            return false;
        };
        let signature = ed25519_dalek::Signature::from_bytes(&signature.0);
        verifying_key.verify(message, &signature).is_ok()
    }
}

/// Deterministic signers for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use ed25519_dalek::{Signer, SigningKey};

    use super::{PublicKey, Signature};

    /// Ed25519 signer built from a fixed seed
    pub struct TestSigner {
        signing_key: SigningKey,
    }

    impl TestSigner {
        pub fn from_seed(seed: u8) -> Self {
            Self {
                signing_key: SigningKey::from_bytes(&[seed; 32]),
            }
        }

        pub fn public_key(&self) -> PublicKey {
            PublicKey(self.signing_key.verifying_key().to_bytes())
        }

        /// Base58 identity, as listed in an ACL
        pub fn identity(&self) -> String {
            self.public_key().to_string()
        }

        pub fn sign(&self, message: &[u8]) -> Signature {
            Signature(self.signing_key.sign(message).to_bytes())
        }
    }
}
