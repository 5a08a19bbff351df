//! Typed token payloads.
//!
//! Each token type has one struct here whose fields, in declaration order,
//! are its wire layout. The declaring macro derives the width, encoder and
//! decoder from the field list, and the token table takes its payload sizes
//! from [`TokenPayload::SIZE`], so a layout change cannot drift away from
//! the table.

use super::types::TokenType;
use super::wire::{WireField, WireReader, WireWriter};
use crate::config::{COMMITMENT_SIZE, FIELD_SIZE, HASH_SIZE, PUBLIC_KEY_SIZE, SIGNATURE_SIZE, ZKP_SIZE};
use crate::crypto::hash::digest20;
use crate::crypto::keys::Address;
use crate::error::{PaymentError, Result};

pub type Hash = [u8; HASH_SIZE];
pub type PublicKeyBytes = [u8; PUBLIC_KEY_SIZE];
pub type SignatureBytes = [u8; SIGNATURE_SIZE];
pub type CommitmentBytes = [u8; COMMITMENT_SIZE];
pub type FieldBytes = [u8; FIELD_SIZE];
pub type ProofBytes = [u8; ZKP_SIZE];

/// A token payload with a fixed layout.
pub trait TokenPayload: WireField {
    const TOKEN_TYPE: TokenType;

    fn to_bytes(&self) -> Vec<u8> {
        let mut w = WireWriter::with_capacity(Self::SIZE);
        self.write(&mut w);
        w.into_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(PaymentError::InvalidLength {
                token: Self::TOKEN_TYPE,
                expected: Self::SIZE,
                actual: bytes.len(),
            });
        }
        Self::read(&mut WireReader::new(bytes))
    }
}

/// Declares a struct and its [`WireField`] impl from an ordered field list.
macro_rules! wire_record {
    (
        $(#[$meta:meta])*
        $name:ident { $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl WireField for $name {
            const SIZE: usize = 0 $( + <$ty as WireField>::SIZE )*;

            fn write(&self, w: &mut WireWriter) {
                $( self.$field.write(w); )*
            }

            fn read(r: &mut WireReader<'_>) -> Result<Self> {
                Ok(Self {
                    $( $field: <$ty as WireField>::read(r)?, )*
                })
            }
        }
    };
}

/// Declares token payloads. Each struct shares its name with its
/// [`TokenType`] variant.
macro_rules! token_payloads {
    ($(
        $(#[$meta:meta])*
        $name:ident { $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),* $(,)? }
    )*) => {
        $(
            wire_record! {
                $(#[$meta])*
                $name { $( $(#[$fmeta])* $field : $ty ),* }
            }

            impl TokenPayload for $name {
                const TOKEN_TYPE: TokenType = TokenType::$name;
            }
        )*
    };
}

// ---------------------------------------------------------------------------
// Shared sub-records
// ---------------------------------------------------------------------------

wire_record! {
    /// Public parameters of a nanopayment channel.
    NanPublic {
        value_from: i64,
        value_to: i64,
        num_payments: u32,
        /// Tail of the payer's ticket hash chain.
        hash_tail: Hash,
    }
}

impl NanPublic {
    /// 20-byte digest over the packed parameters, used to name a channel.
    pub fn digest(&self) -> [u8; 20] {
        let mut w = WireWriter::with_capacity(Self::SIZE);
        self.write(&mut w);
        digest20(&w.into_vec())
    }
}

wire_record! {
    /// The publishable part of a channel wallet.
    WalletPublic {
        wallet_public_key: PublicKeyBytes,
        commitment: CommitmentBytes,
        signature_commitment: FieldBytes,
        proof: ProofBytes,
        /// Counterparty signature over wallet key and commitment.
        signature: SignatureBytes,
    }
}

// ---------------------------------------------------------------------------
// Token payloads
// ---------------------------------------------------------------------------

token_payloads! {
    // -- channel establishment: end user <-> intermediary --
    ChnEndEstab1 {
        end_public_key: PublicKeyBytes,
        channel: Address,
        nonce: Hash,
    }
    ChnIntEstab2 {
        int_public_key: PublicKeyBytes,
        verified: bool,
    }
    ChnEndEstab3 {
        wallet: WalletPublic,
    }
    ChnIntEstab4 {
        wallet_signature: SignatureBytes,
    }

    // -- micropayment: payer -> relay through an intermediary --
    MicCliPay1 {
        value: i64,
        nonce: Hash,
    }
    MicRelPay2 {
        relay_wallet_public_key: PublicKeyBytes,
        channel: Address,
    }
    MicCliPay3 {
        value: i64,
        old_wallet_public_key: PublicKeyBytes,
        wallet: WalletPublic,
    }
    MicIntPay4 {
        payer_wallet_signature: SignatureBytes,
    }
    MicCliPay5 {
        int_signature: SignatureBytes,
        commitment: CommitmentBytes,
    }
    MicRelPay6 {
        value: i64,
        old_wallet_public_key: PublicKeyBytes,
        wallet: WalletPublic,
    }
    MicIntPay7 {
        relay_wallet_signature: SignatureBytes,
    }
    MicIntPay8 {
        success: bool,
    }

    // -- nanopayment setup: payer <-> intermediary --
    NanCliSetup1 {
        nan_public: NanPublic,
        wallet: WalletPublic,
    }
    NanIntSetup2 {
        challenge: Hash,
    }
    NanCliSetup3 {
        commitment: CommitmentBytes,
        proof: ProofBytes,
    }
    NanIntSetup4 {
        setup_signature: SignatureBytes,
    }
    NanCliSetup5 {
        revocation: Hash,
    }
    NanIntSetup6 {
        confirm_signature: SignatureBytes,
    }

    // -- direct nanopayments to the guard --
    NanCliDestab1 {
        nan_public: NanPublic,
        wallet: WalletPublic,
    }
    NanIntDestab2 {
        verified: bool,
    }
    NanCliDpay1 {
        preimage: Hash,
        index: u32,
    }
    NanIntDpay2 {
        success: bool,
    }

    // -- nanopayment establishment: payer -> relay -> intermediary --
    NanCliEstab1 {
        nan_public: NanPublic,
        channel_token: Hash,
    }
    NanRelEstab2 {
        nan_public: NanPublic,
        wallet: WalletPublic,
    }
    NanIntEstab3 {
        verified: bool,
    }
    NanRelEstab4 {
        refund_commitment: CommitmentBytes,
        proof: ProofBytes,
    }
    NanIntEstab5 {
        refund_signature: SignatureBytes,
    }
    NanRelEstab6 {
        verified: bool,
    }

    // -- nanopayment tickets --
    NanCliPay1 {
        /// Ticket: the next hash-chain preimage.
        preimage: Hash,
        /// Distance of `preimage` from the chain tail.
        index: u32,
    }
    NanRelPay2 {
        success: bool,
    }
    NanCliReqclose1 {
        last_index: u32,
    }
    NanRelReqclose2 {
        success: bool,
    }

    // -- nanopayment close: end user <-> intermediary --
    NanEndClose1 {
        nan_public: NanPublic,
        last_preimage: Hash,
        last_index: u32,
    }
    NanIntClose2 {
        verified: bool,
    }
    NanEndClose3 {
        old_wallet: WalletPublic,
        new_wallet: WalletPublic,
    }
    NanIntClose4 {
        refund_signature: SignatureBytes,
    }
    NanEndClose5 {
        revocation: Hash,
    }
    NanIntClose6 {
        close_signature: SignatureBytes,
    }
    NanEndClose7 {
        verified: bool,
    }
    NanIntClose8 {
        success: bool,
    }

    // -- ledger --
    MacAutMint {
        value: i64,
    }
    MacAnyTrans {
        from: Address,
        to: Address,
        value: i64,
    }
    ChnEndSetup {
        from: Address,
        channel: Address,
        value: i64,
        wallet_commitment: CommitmentBytes,
    }
    ChnIntSetup {
        from: Address,
        channel: Address,
        value: i64,
    }
    ChnIntReqclose {
        channel: Address,
    }
    ChnEndClose {
        channel: Address,
        old_wallet: WalletPublic,
        new_wallet: WalletPublic,
    }
    ChnIntClose {
        channel: Address,
        wallet: WalletPublic,
    }
    ChnEndCashout {
        channel: Address,
        value: i64,
    }
    ChnIntCashout {
        channel: Address,
        value: i64,
    }
    AnyLedConfirm {
        success: bool,
        reference: Hash,
    }
    MacLedData {
        fee: i64,
        tax: i64,
        close_window: u32,
        authority_public_key: PublicKeyBytes,
        ledger_public_key: PublicKeyBytes,
    }
    ChnLedData {
        channel: Address,
        end_balance: i64,
        int_balance: i64,
        state: u8,
    }
    MacLedQuery {
        address: Address,
    }
    ChnLedQuery {
        channel: Address,
    }
}
