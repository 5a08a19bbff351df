//! # Key Management
//!
//! Ed25519 keypairs for every signing party: payers and relays sign channel
//! wallets, intermediaries countersign them, the ledger signs receipts.
//! Wallets also get a fresh keypair per state so successive channel states
//! cannot be linked by key.
//!
//! Payment addresses are never raw public keys. An [`Address`] is the first
//! 20 bytes of SHA-256 over the public key.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use std::fmt;
use thiserror::Error;

use super::hash::{digest20, to_hex_string};
use crate::config::{ADDRESS_SIZE, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE, SIGNATURE_SIZE};

/// Errors raised while parsing key material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid public key bytes")]
    InvalidPublicKey,

    #[error("invalid secret key bytes")]
    InvalidSecretKey,

    #[error("invalid signature bytes: expected 64 bytes")]
    InvalidSignature,
}

/// An Ed25519 signing keypair.
pub struct PayKeypair {
    signing_key: SigningKey,
}

/// An Ed25519 public key in its 32-byte compressed form.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayPublicKey {
    bytes: [u8; PUBLIC_KEY_SIZE],
}

/// A detached Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PaySignature {
    bytes: [u8; SIGNATURE_SIZE],
}

/// A 20-byte payment address derived from a public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; ADDRESS_SIZE]);

// ---------------------------------------------------------------------------
// PayKeypair
// ---------------------------------------------------------------------------

impl PayKeypair {
    /// Generate a keypair from the operating system's CSPRNG.
    pub fn generate() -> Self {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a keypair from a caller-supplied RNG. Tests pass a seeded
    /// `StdRng` here to get reproducible keys.
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            signing_key: SigningKey::generate(rng),
        }
    }

    /// Rebuild a keypair from its 32-byte secret. In Ed25519 the secret key
    /// is the seed, so this is deterministic.
    pub fn from_secret_bytes(secret: &[u8; SECRET_KEY_SIZE]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    /// Parse a hex-encoded secret key.
    pub fn from_hex(text: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(text).map_err(|_| KeyError::InvalidSecretKey)?;
        let secret: [u8; SECRET_KEY_SIZE] =
            bytes.try_into().map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_secret_bytes(&secret))
    }

    pub fn public_key(&self) -> PayPublicKey {
        PayPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Payment address of this keypair's public key.
    pub fn address(&self) -> Address {
        self.public_key().address()
    }

    /// Sign `message`. Deterministic per RFC 8032.
    pub fn sign(&self, message: &[u8]) -> PaySignature {
        PaySignature {
            bytes: self.signing_key.sign(message).to_bytes(),
        }
    }

    /// Export the secret key. Never log this.
    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_SIZE] {
        self.signing_key.to_bytes()
    }
}

impl Clone for PayKeypair {
    fn clone(&self) -> Self {
        Self::from_secret_bytes(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for PayKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PayKeypair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// PayPublicKey
// ---------------------------------------------------------------------------

impl PayPublicKey {
    /// Wrap raw bytes without validating the curve point. Use
    /// [`try_from_slice`](Self::try_from_slice) for untrusted input.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Parse and validate a public key received from a peer.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; PUBLIC_KEY_SIZE] =
            slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.bytes
    }

    /// `true` iff `signature` is a valid signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &PaySignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(&signature.bytes);
        verifying_key.verify(message, &sig).is_ok()
    }

    /// First 20 bytes of SHA-256 over the key.
    pub fn address(&self) -> Address {
        Address(digest20(&self.bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Display for PayPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PayPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PayPublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// PaySignature
// ---------------------------------------------------------------------------

impl PaySignature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; SIGNATURE_SIZE] =
            slice.try_into().map_err(|_| KeyError::InvalidSignature)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Debug for PaySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        write!(f, "PaySignature({}...{})", &hex_str[..8], &hex_str[120..])
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

impl Address {
    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_hex_string(&self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", to_hex_string(&self.0))
    }
}
