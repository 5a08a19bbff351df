//! Ledger receipts.
//!
//! A receipt records one ledger transaction: the token type that caused it,
//! the value and the two addresses. The signature covers exactly
//! `tag (1) ‖ value (8, BE) ‖ from (20) ‖ to (20)`.

use crate::crypto::keys::{Address, PayKeypair, PayPublicKey, PaySignature};
use crate::error::{PaymentError, Result};
use crate::token::wire::{WireField, WireWriter};
use crate::token::TokenType;

/// Length of the signed receipt fields.
pub const RECEIPT_PAYLOAD_SIZE: usize = 1 + 8 + 20 + 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub token_type: TokenType,
    pub value: i64,
    pub from: Address,
    pub to: Address,
    pub signature: Option<PaySignature>,
}

impl Receipt {
    pub fn new(token_type: TokenType, value: i64, from: Address, to: Address) -> Self {
        Self {
            token_type,
            value,
            from,
            to,
            signature: None,
        }
    }

    /// Receipt between two keys, addressed by their payment addresses.
    pub fn between(token_type: TokenType, value: i64, from: &PayPublicKey, to: &PayPublicKey) -> Self {
        Self::new(token_type, value, from.address(), to.address())
    }

    /// The packed unsigned fields.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut w = WireWriter::with_capacity(RECEIPT_PAYLOAD_SIZE);
        self.token_type.tag().write(&mut w);
        self.value.write(&mut w);
        self.from.write(&mut w);
        self.to.write(&mut w);
        w.into_vec()
    }

    /// Sign in place, replacing any earlier signature.
    pub fn sign(&mut self, keypair: &PayKeypair) {
        self.signature = Some(keypair.sign(&self.signing_payload()));
    }

    /// Fails with [`PaymentError::SignatureInvalid`] if unsigned or if the
    /// signature does not verify under `public_key`.
    pub fn verify(&self, public_key: &PayPublicKey) -> Result<()> {
        let signature = self.signature.as_ref().ok_or(PaymentError::SignatureInvalid)?;
        if public_key.verify(&self.signing_payload(), signature) {
            Ok(())
        } else {
            Err(PaymentError::SignatureInvalid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn payload_layout() {
        let r = Receipt::new(TokenType::MacAnyTrans, 0x0102, Address([1; 20]), Address([2; 20]));
        let p = r.signing_payload();
        assert_eq!(p.len(), RECEIPT_PAYLOAD_SIZE);
        assert_eq!(p[0], TokenType::MacAnyTrans.tag());
        assert_eq!(&p[1..9], &[0, 0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(&p[9..29], &[1u8; 20]);
        assert_eq!(&p[29..], &[2u8; 20]);
    }

    #[test]
    fn sign_and_verify() {
        let mut rng = StdRng::seed_from_u64(42);
        let ledger = PayKeypair::generate_with(&mut rng);
        let payer = PayKeypair::generate_with(&mut rng);
        let relay = PayKeypair::generate_with(&mut rng);

        let mut r = Receipt::between(TokenType::MacAnyTrans, 25, &payer.public_key(), &relay.public_key());
        assert!(matches!(r.verify(&ledger.public_key()), Err(PaymentError::SignatureInvalid)));

        r.sign(&ledger);
        r.verify(&ledger.public_key()).unwrap();
        assert!(r.verify(&payer.public_key()).is_err());

        r.value = 26;
        assert!(r.verify(&ledger.public_key()).is_err());
    }
}
