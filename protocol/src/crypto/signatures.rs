//! # Digital Signatures
//!
//! Ed25519 signing and verification for signed tokens, wallet
//! countersignatures and ledger receipts. The raw-bytes variant exists for
//! the codec, which receives keys and signatures as untrusted wire bytes.

use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};

use super::keys::{PayKeypair, PayPublicKey, PaySignature};
use crate::config::{PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
use crate::error::{PaymentError, Result};

/// Sign `message` with `keypair`.
///
/// ```
/// use paycell_protocol::crypto::{sign, verify, PayKeypair};
///
/// let keypair = PayKeypair::generate();
/// let signature = sign(&keypair, b"open channel");
/// assert!(verify(&keypair.public_key(), b"open channel", &signature));
/// ```
pub fn sign(keypair: &PayKeypair, message: &[u8]) -> PaySignature {
    keypair.sign(message)
}

/// `true` iff `signature` verifies under `public_key`.
pub fn verify(public_key: &PayPublicKey, message: &[u8], signature: &PaySignature) -> bool {
    public_key.verify(message, signature)
}

/// Verify wire bytes: a 32-byte key and a 64-byte signature taken straight
/// off a message. Every failure collapses to [`PaymentError::SignatureInvalid`].
pub fn verify_raw(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
    let key_bytes: [u8; PUBLIC_KEY_SIZE] = public_key
        .try_into()
        .map_err(|_| PaymentError::SignatureInvalid)?;
    let sig_bytes: [u8; SIGNATURE_SIZE] = signature
        .try_into()
        .map_err(|_| PaymentError::SignatureInvalid)?;
    let verifying_key =
        VerifyingKey::from_bytes(&key_bytes).map_err(|_| PaymentError::SignatureInvalid)?;
    verifying_key
        .verify(message, &DalekSignature::from_bytes(&sig_bytes))
        .map_err(|_| PaymentError::SignatureInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_verification_accepts_valid_bytes() {
        let kp = PayKeypair::generate();
        let sig = sign(&kp, b"ledger transfer");
        assert!(verify_raw(kp.public_key().as_bytes(), b"ledger transfer", sig.as_bytes()).is_ok());
    }

    #[test]
    fn raw_verification_rejects_tampering() {
        let kp = PayKeypair::generate();
        let sig = sign(&kp, b"ledger transfer");
        let mut bad = *sig.as_bytes();
        bad[0] ^= 0x01;
        assert!(matches!(
            verify_raw(kp.public_key().as_bytes(), b"ledger transfer", &bad),
            Err(PaymentError::SignatureInvalid)
        ));
    }

    #[test]
    fn raw_verification_rejects_short_inputs() {
        let kp = PayKeypair::generate();
        let sig = sign(&kp, b"m");
        assert!(verify_raw(&[0u8; 31], b"m", sig.as_bytes()).is_err());
        assert!(verify_raw(kp.public_key().as_bytes(), b"m", &[0u8; 63]).is_err());
    }
}
