//! # Hashing Utilities
//!
//! SHA-256 is the protocol hash: hash chains, session digests, descriptor
//! digests and payment addresses all use it, so every peer must agree on it
//! bit for bit. BLAKE3 only appears in [`hash_to_field`], which maps bytes
//! into the BN254 scalar field for the wallet circuit and never touches the
//! wire.

use ark_bn254::Fr;
use ark_ff::PrimeField;
use sha2::{Digest, Sha256};

use crate::config::{DIGEST_LEN, HASH_SIZE};
use crate::error::{PaymentError, Result};

/// SHA-256 of `data`.
///
/// ```
/// use paycell_protocol::crypto::sha256;
///
/// assert_eq!(sha256(b"paycell").len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 over the concatenation of `parts`, without building the
/// concatenated buffer.
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Truncated SHA-256: the first [`DIGEST_LEN`] bytes.
///
/// Used wherever the protocol wants a short content digest (session
/// digests, descriptor equality, nanopayment parameters, addresses).
pub fn digest20(data: &[u8]) -> [u8; DIGEST_LEN] {
    truncate(&sha256(data))
}

/// Truncated SHA-256 over several parts.
pub fn digest20_concat(parts: &[&[u8]]) -> [u8; DIGEST_LEN] {
    truncate(&sha256_concat(parts))
}

fn truncate(hash: &[u8; HASH_SIZE]) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&hash[..DIGEST_LEN]);
    out
}

/// Map arbitrary bytes to a BN254 scalar: BLAKE3, then reduce mod r.
///
/// The reduction is slightly biased (256-bit digest into a 254-bit field),
/// which is irrelevant for binding public keys and signatures into the
/// circuit statement.
pub fn hash_to_field(data: &[u8]) -> Fr {
    let digest = blake3::hash(data);
    Fr::from_le_bytes_mod_order(digest.as_bytes())
}

/// Render bytes as `0x` followed by uppercase hex.
///
/// ```
/// use paycell_protocol::crypto::to_hex_string;
///
/// assert_eq!(to_hex_string(&[0x0a, 0xff]), "0x0AFF");
/// ```
pub fn to_hex_string(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode_upper(bytes))
}

/// Parse the output of [`to_hex_string`]. The `0x` prefix is optional and
/// either case is accepted.
pub fn from_hex_string(text: &str) -> Result<Vec<u8>> {
    let body = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    hex::decode(body).map_err(|e| PaymentError::InvalidHex(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_vector() {
        let hash = sha256(b"This is a test message that is longer than the size of a single hash");
        assert_eq!(
            hex::encode(hash),
            "44465f39bfa6bfac40cdf928e0e79354a411e498f955794e0c70dc314eefbd44"
        );
    }

    #[test]
    fn concat_equals_hash_of_joined_input() {
        let joined = sha256(b"helloworld");
        assert_eq!(sha256_concat(&[b"hello", b"world"]), joined);
        assert_eq!(digest20_concat(&[b"hello", b"world"]), digest20(b"helloworld"));
    }

    #[test]
    fn digest_is_hash_prefix() {
        let full = sha256(b"prefix");
        assert_eq!(&digest20(b"prefix")[..], &full[..DIGEST_LEN]);
    }

    #[test]
    fn hex_renders_uppercase_with_prefix() {
        assert_eq!(to_hex_string(&[]), "0x");
        assert_eq!(to_hex_string(&[0xde, 0xad, 0xbe, 0xef]), "0xDEADBEEF");
    }

    #[test]
    fn hex_parse_accepts_both_forms() {
        assert_eq!(from_hex_string("0xDEADBEEF").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(from_hex_string("deadbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(
            from_hex_string("0xABC"),
            Err(PaymentError::InvalidHex(_))
        ));
    }

    #[test]
    fn hash_to_field_is_deterministic() {
        assert_eq!(hash_to_field(b"key"), hash_to_field(b"key"));
        assert_ne!(hash_to_field(b"key"), hash_to_field(b"other key"));
    }
}
