//! # Token Codec
//!
//! Byte-level packing of token messages:
//!
//! ```text
//! plain:     tag (1) ‖ payload ‖ session_digest (20)
//! signed:    plain ‖ public_key (32) ‖ signature (64)
//! extended:  plain ‖ intermediary_id (28) ‖ descriptor (17)
//! ```
//!
//! Every length is a function of the token type alone ([`size_of`]). The
//! tag check in [`unpack`] is mandatory: payloads are otherwise untyped
//! bytes, and a message of the wrong kind with the right length would parse.

use super::payloads::TokenPayload;
use super::types::TokenType;
use crate::config::{
    DESCRIPTOR_SIZE, DIGEST_LEN, INTERMEDIARY_ID_SIZE, PUBLIC_KEY_SIZE, SIGNATURE_ENVELOPE_SIZE,
    TYPE_TAG_SIZE,
};
use crate::crypto::keys::{PayKeypair, PayPublicKey};
use crate::crypto::signatures::verify_raw;
use crate::error::{PaymentError, Result};
use crate::party::{Descriptor, IntermediaryId, SessionDigest};

/// Extra bytes appended to an extended token.
pub const EXTENSION_SIZE: usize = INTERMEDIARY_ID_SIZE + DESCRIPTOR_SIZE;

/// Length of `tag ‖ payload ‖ digest` for `token_type`.
pub fn unsigned_size(token_type: TokenType) -> usize {
    TYPE_TAG_SIZE + token_type.spec().payload_size + DIGEST_LEN
}

/// Exact wire length of a complete `token_type` message, including the
/// signature envelope or the intermediary extension when the type has one.
pub fn size_of(token_type: TokenType) -> usize {
    let spec = token_type.spec();
    let mut size = unsigned_size(token_type);
    if spec.signed {
        size += SIGNATURE_ENVELOPE_SIZE;
    }
    if spec.extended {
        size += EXTENSION_SIZE;
    }
    size
}

/// Read the type tag of a message without checking anything else.
pub fn peek_type(bytes: &[u8]) -> Result<TokenType> {
    let tag = *bytes.first().ok_or(PaymentError::Malformed("empty message".into()))?;
    TokenType::from_tag(tag)
}

/// `tag ‖ payload ‖ digest`. The payload length must match the table.
pub fn pack(token_type: TokenType, payload: &[u8], digest: &SessionDigest) -> Result<Vec<u8>> {
    let expected = token_type.spec().payload_size;
    if payload.len() != expected {
        return Err(PaymentError::InvalidLength {
            token: token_type,
            expected,
            actual: payload.len(),
        });
    }
    let mut out = Vec::with_capacity(unsigned_size(token_type));
    out.push(token_type.tag());
    out.extend_from_slice(payload);
    out.extend_from_slice(digest);
    Ok(out)
}

/// Split a plain message into payload and session digest after checking
/// that its tag is `token_type` and its length is exact.
pub fn unpack(token_type: TokenType, bytes: &[u8]) -> Result<(&[u8], SessionDigest)> {
    let Some(&found) = bytes.first() else {
        return Err(PaymentError::InvalidLength {
            token: token_type,
            expected: unsigned_size(token_type),
            actual: 0,
        });
    };
    if found != token_type.tag() {
        return Err(PaymentError::TypeMismatch {
            expected: token_type,
            found,
        });
    }
    let expected = unsigned_size(token_type);
    if bytes.len() != expected {
        return Err(PaymentError::InvalidLength {
            token: token_type,
            expected,
            actual: bytes.len(),
        });
    }
    let digest_at = bytes.len() - DIGEST_LEN;
    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(&bytes[digest_at..]);
    Ok((&bytes[TYPE_TAG_SIZE..digest_at], digest))
}

/// Append `public_key ‖ signature(msg)`.
pub fn sign_and_pack(msg: &[u8], keypair: &PayKeypair) -> Vec<u8> {
    let signature = keypair.sign(msg);
    let mut out = Vec::with_capacity(msg.len() + SIGNATURE_ENVELOPE_SIZE);
    out.extend_from_slice(msg);
    out.extend_from_slice(keypair.public_key().as_bytes());
    out.extend_from_slice(signature.as_bytes());
    out
}

/// Strip and check the signature envelope. Returns the signed bytes and the
/// key that signed them.
pub fn verify_and_unpack(bytes: &[u8]) -> Result<(&[u8], PayPublicKey)> {
    if bytes.len() < SIGNATURE_ENVELOPE_SIZE {
        return Err(PaymentError::SignatureInvalid);
    }
    let key_at = bytes.len() - SIGNATURE_ENVELOPE_SIZE;
    let sig_at = key_at + PUBLIC_KEY_SIZE;
    let (msg, key, sig) = (&bytes[..key_at], &bytes[key_at..sig_at], &bytes[sig_at..]);
    verify_raw(key, msg, sig)?;
    let mut key_bytes = [0u8; PUBLIC_KEY_SIZE];
    key_bytes.copy_from_slice(key);
    Ok((msg, PayPublicKey::from_bytes(key_bytes)))
}

/// Append the intermediary announcement to an extended token.
pub fn extend(msg: &[u8], intermediary: &IntermediaryId, descriptor: &Descriptor) -> Vec<u8> {
    let mut out = Vec::with_capacity(msg.len() + EXTENSION_SIZE);
    out.extend_from_slice(msg);
    out.extend_from_slice(&intermediary.to_bytes());
    out.extend_from_slice(&descriptor.to_bytes());
    out
}

/// Split an extended message into the plain message and its announcement.
pub fn split_extended(bytes: &[u8]) -> Result<(&[u8], IntermediaryId, Descriptor)> {
    if bytes.len() < EXTENSION_SIZE {
        return Err(PaymentError::Malformed(format!(
            "extended message of {} bytes",
            bytes.len()
        )));
    }
    let id_at = bytes.len() - EXTENSION_SIZE;
    let desc_at = id_at + INTERMEDIARY_ID_SIZE;
    let intermediary = IntermediaryId::from_bytes(&bytes[id_at..desc_at])?;
    let descriptor = Descriptor::from_bytes(&bytes[desc_at..])?;
    Ok((&bytes[..id_at], intermediary, descriptor))
}

// ---------------------------------------------------------------------------
// Typed wrappers
// ---------------------------------------------------------------------------

/// Encode a typed payload as a plain message.
pub fn pack_token<P: TokenPayload>(payload: &P, digest: &SessionDigest) -> Result<Vec<u8>> {
    pack(P::TOKEN_TYPE, &payload.to_bytes(), digest)
}

/// Decode a plain message into its typed payload.
pub fn unpack_token<P: TokenPayload>(bytes: &[u8]) -> Result<(P, SessionDigest)> {
    let (payload, digest) = unpack(P::TOKEN_TYPE, bytes)?;
    Ok((P::from_bytes(payload)?, digest))
}

/// Encode and sign a payload of one of the signed token types.
pub fn pack_signed_token<P: TokenPayload>(
    payload: &P,
    digest: &SessionDigest,
    keypair: &PayKeypair,
) -> Result<Vec<u8>> {
    if !P::TOKEN_TYPE.spec().signed {
        return Err(PaymentError::Malformed(format!(
            "{} carries no signature envelope",
            P::TOKEN_TYPE
        )));
    }
    Ok(sign_and_pack(&pack_token(payload, digest)?, keypair))
}

/// Verify and decode a signed message.
pub fn unpack_signed_token<P: TokenPayload>(
    bytes: &[u8],
) -> Result<(P, SessionDigest, PayPublicKey)> {
    let expected = size_of(P::TOKEN_TYPE);
    if bytes.len() != expected {
        return Err(PaymentError::InvalidLength {
            token: P::TOKEN_TYPE,
            expected,
            actual: bytes.len(),
        });
    }
    let (msg, signer) = verify_and_unpack(bytes)?;
    let (payload, digest) = unpack_token(msg)?;
    Ok((payload, digest, signer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::Address;
    use crate::party::PartyRole;
    use crate::token::payloads::{MacAnyTrans, MacAutMint, NanCliPay1, NanEndClose3};
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    const DIGEST: SessionDigest = [0x5A; DIGEST_LEN];

    fn random_payload(rng: &mut StdRng, t: TokenType) -> Vec<u8> {
        let mut payload = vec![0u8; t.spec().payload_size];
        rng.fill_bytes(&mut payload);
        payload
    }

    #[test]
    fn pack_then_unpack_for_every_type() {
        let mut rng = StdRng::seed_from_u64(42);
        for t in TokenType::ALL {
            let payload = random_payload(&mut rng, t);
            let bytes = pack(t, &payload, &DIGEST).unwrap();
            assert_eq!(bytes.len(), unsigned_size(t), "{t}");
            let (body, digest) = unpack(t, &bytes).unwrap();
            assert_eq!(body, &payload[..], "{t}");
            assert_eq!(digest, DIGEST);
        }
    }

    #[test]
    fn unpack_with_wrong_type_is_a_mismatch() {
        let mut rng = StdRng::seed_from_u64(42);
        let payload = random_payload(&mut rng, TokenType::NanCliPay1);
        let bytes = pack(TokenType::NanCliPay1, &payload, &DIGEST).unwrap();
        for t in TokenType::ALL.into_iter().filter(|t| *t != TokenType::NanCliPay1) {
            match unpack(t, &bytes) {
                Err(PaymentError::TypeMismatch { expected, found }) => {
                    assert_eq!(expected, t);
                    assert_eq!(found, TokenType::NanCliPay1.tag());
                }
                other => panic!("{t}: expected TypeMismatch, got {other:?}"),
            }
        }
    }

    #[test]
    fn lengths_are_checked() {
        assert!(matches!(
            pack(TokenType::MacAutMint, &[0u8; 7], &DIGEST),
            Err(PaymentError::InvalidLength { expected: 8, actual: 7, .. })
        ));
        let mut bytes = pack(TokenType::MacAutMint, &[0u8; 8], &DIGEST).unwrap();
        bytes.push(0);
        assert!(matches!(
            unpack(TokenType::MacAutMint, &bytes),
            Err(PaymentError::InvalidLength { .. })
        ));
        assert!(matches!(
            unpack(TokenType::MacAutMint, &[]),
            Err(PaymentError::InvalidLength { actual: 0, .. })
        ));
    }

    #[test]
    fn size_of_accounts_for_envelope_and_extension() {
        assert_eq!(size_of(TokenType::MacAutMint), 1 + 8 + 20);
        assert_eq!(
            size_of(TokenType::MacAnyTrans),
            unsigned_size(TokenType::MacAnyTrans) + 96
        );
        assert_eq!(
            size_of(TokenType::NanCliEstab1),
            unsigned_size(TokenType::NanCliEstab1) + 28 + 17
        );
        assert_eq!(size_of(TokenType::NanEndClose3), 1 + 640 + 20);
    }

    #[test]
    fn signed_envelope_roundtrip() {
        let kp = PayKeypair::generate_with(&mut StdRng::seed_from_u64(42));
        let msg = pack(TokenType::ChnIntSetup, &[3u8; 48], &DIGEST).unwrap();
        let signed = sign_and_pack(&msg, &kp);
        assert_eq!(signed.len(), size_of(TokenType::ChnIntSetup));

        let (body, signer) = verify_and_unpack(&signed).unwrap();
        assert_eq!(body, &msg[..]);
        assert_eq!(signer, kp.public_key());
    }

    #[test]
    fn tampered_envelope_is_rejected() {
        let kp = PayKeypair::generate_with(&mut StdRng::seed_from_u64(42));
        let msg = pack(TokenType::ChnIntSetup, &[3u8; 48], &DIGEST).unwrap();
        let mut signed = sign_and_pack(&msg, &kp);
        signed[5] ^= 0x80;
        assert!(matches!(verify_and_unpack(&signed), Err(PaymentError::SignatureInvalid)));
        assert!(matches!(verify_and_unpack(&[0u8; 40]), Err(PaymentError::SignatureInvalid)));
    }

    #[test]
    fn typed_roundtrip() {
        let token = NanCliPay1 {
            preimage: [0xEE; 32],
            index: 17,
        };
        let bytes = pack_token(&token, &DIGEST).unwrap();
        assert_eq!(peek_type(&bytes).unwrap(), TokenType::NanCliPay1);
        let (decoded, digest) = unpack_token::<NanCliPay1>(&bytes).unwrap();
        assert_eq!(decoded, token);
        assert_eq!(digest, DIGEST);
        assert!(matches!(
            unpack_token::<MacAutMint>(&bytes),
            Err(PaymentError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn typed_signed_roundtrip() {
        let kp = PayKeypair::generate_with(&mut StdRng::seed_from_u64(42));
        let token = MacAnyTrans {
            from: kp.address(),
            to: Address([9u8; 20]),
            value: 1_000,
        };
        let bytes = pack_signed_token(&token, &DIGEST, &kp).unwrap();
        let (decoded, _, signer) = unpack_signed_token::<MacAnyTrans>(&bytes).unwrap();
        assert_eq!(decoded, token);
        assert_eq!(signer.address(), token.from);

        assert!(pack_signed_token(&MacAutMint { value: 1 }, &DIGEST, &kp).is_err());
    }

    #[test]
    fn extension_roundtrip() {
        let msg = pack(TokenType::NanCliEstab1, &[1u8; 84], &DIGEST).unwrap();
        let id = IntermediaryId::new([4u8; 20], 2);
        let desc = Descriptor::new(0, 7, PartyRole::Intermediary);
        let extended = extend(&msg, &id, &desc);
        assert_eq!(extended.len(), size_of(TokenType::NanCliEstab1));

        let (plain, got_id, got_desc) = split_extended(&extended).unwrap();
        assert_eq!(plain, &msg[..]);
        assert_eq!(got_id, id);
        assert_eq!(got_desc, desc);
    }

    #[test]
    fn largest_token_spans_several_frames() {
        assert!(size_of(TokenType::NanEndClose3) > crate::config::DIRECT_FRAME_PAYLOAD_MAX);
        assert_eq!(NanEndClose3::TOKEN_TYPE, TokenType::NanEndClose3);
    }
}
