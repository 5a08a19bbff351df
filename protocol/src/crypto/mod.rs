//! # Cryptographic Primitives
//!
//! Thin, typed wrappers over audited implementations:
//!
//! - **SHA-256** for hash chains, digests and addresses.
//! - **Ed25519** for signed tokens, wallet countersignatures and receipts.
//! - **BLAKE3** only to map bytes into the BN254 scalar field.
//!
//! [`pool::CryptoPool`] moves the expensive calls off the reactor thread.

pub mod hash;
pub mod keys;
pub mod pool;
pub mod signatures;

pub use hash::{
    digest20, digest20_concat, from_hex_string, hash_to_field, sha256, sha256_concat,
    to_hex_string,
};
pub use keys::{Address, KeyError, PayKeypair, PayPublicKey, PaySignature};
pub use pool::{CryptoCompletion, CryptoPool};
pub use signatures::{sign, verify, verify_raw};
