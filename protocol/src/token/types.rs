//! # Token Types
//!
//! One static table, [`TOKEN_SPECS`], describes every token type: its
//! payload size, whether it carries a signature envelope, whether it carries
//! the extra intermediary announcement, the role on the other edge, who may
//! send it, who may receive it, and which transport command carries it.
//! The codec, the framing layer and the dispatcher all read this table and
//! nothing else.
//!
//! Naming follows `<family>_<sender>_<step>`:
//!
//! | family | meaning |
//! |--------|---------|
//! | `chn`  | channel establishment, setup, close, cashout |
//! | `mic`  | per-hop micropayment through an intermediary |
//! | `nan`  | nanopayment ticket channels |
//! | `mac`  | ledger-level transfers and minting |
//!
//! Senders: `cli` payer, `rel` relay, `int` intermediary, `end` payer or
//! relay, `aut` authority, `led` ledger, `any` anyone.

use std::fmt;

use super::payloads;
use super::wire::WireField;
use crate::error::{PaymentError, Result};
use crate::party::{ControllerKind, PartyRole};

/// Every token kind. The discriminant is the wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TokenType {
    ChnEndEstab1,
    ChnIntEstab2,
    ChnEndEstab3,
    ChnIntEstab4,

    MicCliPay1,
    MicRelPay2,
    MicCliPay3,
    MicIntPay4,
    MicCliPay5,
    MicRelPay6,
    MicIntPay7,
    MicIntPay8,

    NanCliSetup1,
    NanIntSetup2,
    NanCliSetup3,
    NanIntSetup4,
    NanCliSetup5,
    NanIntSetup6,

    NanCliDestab1,
    NanIntDestab2,
    NanCliDpay1,
    NanIntDpay2,

    NanCliEstab1,
    NanRelEstab2,
    NanIntEstab3,
    NanRelEstab4,
    NanIntEstab5,
    NanRelEstab6,

    NanCliPay1,
    NanRelPay2,
    NanCliReqclose1,
    NanRelReqclose2,

    NanEndClose1,
    NanIntClose2,
    NanEndClose3,
    NanIntClose4,
    NanEndClose5,
    NanIntClose6,
    NanEndClose7,
    NanIntClose8,

    MacAutMint,
    MacAnyTrans,
    ChnEndSetup,
    ChnIntSetup,
    ChnIntReqclose,
    ChnEndClose,
    ChnIntClose,
    ChnEndCashout,
    ChnIntCashout,

    AnyLedConfirm,
    MacLedData,
    ChnLedData,
    MacLedQuery,
    ChnLedQuery,
}

/// Number of token types.
pub const TOKEN_TYPE_COUNT: usize = 54;

/// How a token leaves the local node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportCommand {
    /// Unlayered payment cell straight to the adjacent relay.
    Direct,
    /// Relay cell through the circuit's layered encryption.
    Layered,
}

/// Static description of one token type.
#[derive(Debug, Clone, Copy)]
pub struct TokenSpec {
    pub token_type: TokenType,
    /// Stable human-readable name.
    pub name: &'static str,
    /// Payload bytes between the type tag and the session digest.
    pub payload_size: usize,
    /// Carries `public_key ‖ signature` after the session digest.
    pub signed: bool,
    /// Carries `intermediary_id ‖ descriptor` after the session digest.
    pub extended: bool,
    /// Role expected on the other edge of the message.
    pub opposite: PartyRole,
    /// Local roles allowed to originate the token.
    pub senders: &'static [PartyRole],
    /// Local roles whose controller accepts the token.
    pub receivers: &'static [PartyRole],
    pub transport: TransportCommand,
}

impl TokenSpec {
    const fn new(
        token_type: TokenType,
        name: &'static str,
        payload_size: usize,
        opposite: PartyRole,
        senders: &'static [PartyRole],
        receivers: &'static [PartyRole],
    ) -> Self {
        Self {
            token_type,
            name,
            payload_size,
            signed: false,
            extended: false,
            opposite,
            senders,
            receivers,
            transport: TransportCommand::Layered,
        }
    }

    const fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    const fn extended(mut self) -> Self {
        self.extended = true;
        self
    }

    const fn direct(mut self) -> Self {
        self.transport = TransportCommand::Direct;
        self
    }

    pub fn may_send(&self, role: PartyRole) -> bool {
        self.senders.contains(&role)
    }

    pub fn may_receive(&self, role: PartyRole) -> bool {
        self.receivers.contains(&role)
    }
}

// ---------------------------------------------------------------------------
// Role sets
// ---------------------------------------------------------------------------

use PartyRole::{Authority, EndUser, Intermediary, Ledger, Payer, Relay, Unknown};

const PAYER: &[PartyRole] = &[Payer];
const RELAY: &[PartyRole] = &[Relay];
const INTERMEDIARY: &[PartyRole] = &[Intermediary];
const LEDGER: &[PartyRole] = &[Ledger];
/// Tokens an end user sends: payers from clients, relays in server mode.
const END_USERS: &[PartyRole] = &[Payer, Relay];
/// Intermediary tokens, or a relay speaking for its intermediary.
const INTERMEDIARY_SIDE: &[PartyRole] = &[Intermediary, Relay];
/// Direct-payment guards answering a payer.
const GUARDS: &[PartyRole] = &[Relay, Intermediary];
const EVERYONE: &[PartyRole] = &[Ledger, Intermediary, Relay, Payer];
/// Receivable but never sent by this layer.
const NOBODY: &[PartyRole] = &[];

macro_rules! payload_size {
    ($name:ident) => {
        <payloads::$name as WireField>::SIZE
    };
}

use TokenSpec as S;
use TokenType as T;

const SPECS: [TokenSpec; TOKEN_TYPE_COUNT] = [
    S::new(T::ChnEndEstab1, "chn_end_estab1", payload_size!(ChnEndEstab1), EndUser, END_USERS, INTERMEDIARY),
    S::new(T::ChnIntEstab2, "chn_int_estab2", payload_size!(ChnIntEstab2), Intermediary, INTERMEDIARY_SIDE, END_USERS),
    S::new(T::ChnEndEstab3, "chn_end_estab3", payload_size!(ChnEndEstab3), EndUser, END_USERS, INTERMEDIARY),
    S::new(T::ChnIntEstab4, "chn_int_estab4", payload_size!(ChnIntEstab4), Intermediary, INTERMEDIARY_SIDE, END_USERS),

    S::new(T::MicCliPay1, "mic_cli_pay1", payload_size!(MicCliPay1), Payer, PAYER, RELAY),
    S::new(T::MicRelPay2, "mic_rel_pay2", payload_size!(MicRelPay2), Relay, RELAY, PAYER),
    S::new(T::MicCliPay3, "mic_cli_pay3", payload_size!(MicCliPay3), Payer, PAYER, INTERMEDIARY),
    S::new(T::MicIntPay4, "mic_int_pay4", payload_size!(MicIntPay4), Intermediary, INTERMEDIARY_SIDE, PAYER),
    S::new(T::MicCliPay5, "mic_cli_pay5", payload_size!(MicCliPay5), Payer, PAYER, RELAY),
    S::new(T::MicRelPay6, "mic_rel_pay6", payload_size!(MicRelPay6), Relay, RELAY, INTERMEDIARY),
    S::new(T::MicIntPay7, "mic_int_pay7", payload_size!(MicIntPay7), Intermediary, INTERMEDIARY_SIDE, RELAY),
    S::new(T::MicIntPay8, "mic_int_pay8", payload_size!(MicIntPay8), Intermediary, INTERMEDIARY_SIDE, PAYER),

    S::new(T::NanCliSetup1, "nan_cli_setup1", payload_size!(NanCliSetup1), Payer, PAYER, INTERMEDIARY),
    S::new(T::NanIntSetup2, "nan_int_setup2", payload_size!(NanIntSetup2), Intermediary, INTERMEDIARY_SIDE, PAYER),
    S::new(T::NanCliSetup3, "nan_cli_setup3", payload_size!(NanCliSetup3), Payer, PAYER, INTERMEDIARY),
    S::new(T::NanIntSetup4, "nan_int_setup4", payload_size!(NanIntSetup4), Intermediary, INTERMEDIARY_SIDE, PAYER),
    S::new(T::NanCliSetup5, "nan_cli_setup5", payload_size!(NanCliSetup5), Payer, PAYER, INTERMEDIARY),
    S::new(T::NanIntSetup6, "nan_int_setup6", payload_size!(NanIntSetup6), Intermediary, INTERMEDIARY_SIDE, PAYER),

    S::new(T::NanCliDestab1, "nan_cli_destab1", payload_size!(NanCliDestab1), Payer, PAYER, GUARDS).direct(),
    S::new(T::NanIntDestab2, "nan_int_destab2", payload_size!(NanIntDestab2), Intermediary, GUARDS, PAYER).direct(),
    S::new(T::NanCliDpay1, "nan_cli_dpay1", payload_size!(NanCliDpay1), Payer, PAYER, GUARDS).direct(),
    S::new(T::NanIntDpay2, "nan_int_dpay2", payload_size!(NanIntDpay2), Intermediary, GUARDS, PAYER).direct(),

    S::new(T::NanCliEstab1, "nan_cli_estab1", payload_size!(NanCliEstab1), Payer, PAYER, RELAY).extended(),
    S::new(T::NanRelEstab2, "nan_rel_estab2", payload_size!(NanRelEstab2), Relay, RELAY, INTERMEDIARY),
    S::new(T::NanIntEstab3, "nan_int_estab3", payload_size!(NanIntEstab3), Intermediary, INTERMEDIARY_SIDE, RELAY),
    S::new(T::NanRelEstab4, "nan_rel_estab4", payload_size!(NanRelEstab4), Relay, RELAY, INTERMEDIARY),
    S::new(T::NanIntEstab5, "nan_int_estab5", payload_size!(NanIntEstab5), Intermediary, INTERMEDIARY_SIDE, RELAY),
    S::new(T::NanRelEstab6, "nan_rel_estab6", payload_size!(NanRelEstab6), Relay, RELAY, PAYER),

    S::new(T::NanCliPay1, "nan_cli_pay1", payload_size!(NanCliPay1), Payer, PAYER, RELAY),
    S::new(T::NanRelPay2, "nan_rel_pay2", payload_size!(NanRelPay2), Relay, RELAY, PAYER),
    S::new(T::NanCliReqclose1, "nan_cli_reqclose1", payload_size!(NanCliReqclose1), Payer, PAYER, RELAY),
    S::new(T::NanRelReqclose2, "nan_rel_reqclose2", payload_size!(NanRelReqclose2), Relay, RELAY, PAYER),

    S::new(T::NanEndClose1, "nan_end_close1", payload_size!(NanEndClose1), EndUser, END_USERS, INTERMEDIARY),
    S::new(T::NanIntClose2, "nan_int_close2", payload_size!(NanIntClose2), Intermediary, INTERMEDIARY_SIDE, END_USERS),
    S::new(T::NanEndClose3, "nan_end_close3", payload_size!(NanEndClose3), EndUser, END_USERS, INTERMEDIARY),
    S::new(T::NanIntClose4, "nan_int_close4", payload_size!(NanIntClose4), Intermediary, INTERMEDIARY_SIDE, END_USERS),
    S::new(T::NanEndClose5, "nan_end_close5", payload_size!(NanEndClose5), EndUser, END_USERS, INTERMEDIARY),
    S::new(T::NanIntClose6, "nan_int_close6", payload_size!(NanIntClose6), Intermediary, INTERMEDIARY_SIDE, END_USERS),
    S::new(T::NanEndClose7, "nan_end_close7", payload_size!(NanEndClose7), EndUser, END_USERS, INTERMEDIARY),
    S::new(T::NanIntClose8, "nan_int_close8", payload_size!(NanIntClose8), Intermediary, INTERMEDIARY_SIDE, END_USERS),

    S::new(T::MacAutMint, "mac_aut_mint", payload_size!(MacAutMint), Authority, LEDGER, LEDGER),
    S::new(T::MacAnyTrans, "mac_any_trans", payload_size!(MacAnyTrans), Unknown, EVERYONE, LEDGER).signed(),
    S::new(T::ChnEndSetup, "chn_end_setup", payload_size!(ChnEndSetup), EndUser, END_USERS, LEDGER).signed(),
    S::new(T::ChnIntSetup, "chn_int_setup", payload_size!(ChnIntSetup), Intermediary, INTERMEDIARY_SIDE, LEDGER).signed(),
    S::new(T::ChnIntReqclose, "chn_int_reqclose", payload_size!(ChnIntReqclose), Intermediary, INTERMEDIARY_SIDE, LEDGER),
    S::new(T::ChnEndClose, "chn_end_close", payload_size!(ChnEndClose), EndUser, END_USERS, LEDGER),
    S::new(T::ChnIntClose, "chn_int_close", payload_size!(ChnIntClose), Intermediary, INTERMEDIARY_SIDE, LEDGER),
    S::new(T::ChnEndCashout, "chn_end_cashout", payload_size!(ChnEndCashout), EndUser, END_USERS, LEDGER),
    S::new(T::ChnIntCashout, "chn_int_cashout", payload_size!(ChnIntCashout), Intermediary, INTERMEDIARY_SIDE, LEDGER),

    S::new(T::AnyLedConfirm, "any_led_confirm", payload_size!(AnyLedConfirm), Unknown, EVERYONE, EVERYONE),
    S::new(T::MacLedData, "mac_led_data", payload_size!(MacLedData), Unknown, EVERYONE, EVERYONE),
    S::new(T::ChnLedData, "chn_led_data", payload_size!(ChnLedData), Unknown, EVERYONE, EVERYONE),
    S::new(T::MacLedQuery, "mac_led_query", payload_size!(MacLedQuery), Unknown, NOBODY, EVERYONE),
    S::new(T::ChnLedQuery, "chn_led_query", payload_size!(ChnLedQuery), Unknown, EVERYONE, EVERYONE),
];

/// The token table, indexed by wire tag.
pub static TOKEN_SPECS: [TokenSpec; TOKEN_TYPE_COUNT] = SPECS;

impl TokenType {
    /// Every token type in tag order.
    pub const ALL: [TokenType; TOKEN_TYPE_COUNT] = {
        let mut all = [TokenType::ChnEndEstab1; TOKEN_TYPE_COUNT];
        let mut i = 0;
        while i < TOKEN_TYPE_COUNT {
            all[i] = SPECS[i].token_type;
            i += 1;
        }
        all
    };

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        Self::ALL
            .get(tag as usize)
            .copied()
            .ok_or(PaymentError::UnknownTokenType(tag))
    }

    pub fn spec(self) -> &'static TokenSpec {
        &TOKEN_SPECS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Role expected on the other edge of this token.
    pub fn opposite(self) -> PartyRole {
        self.spec().opposite
    }

    /// The local controller that receives this token when running as
    /// `role`, or `None` if the pair is not in the table.
    pub fn receiver(self, role: PartyRole) -> Option<ControllerKind> {
        if self.spec().may_receive(role) {
            role.controller()
        } else {
            None
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
