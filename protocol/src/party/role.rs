//! Party roles, local controllers, and lifecycle signals.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PaymentError, Result};

/// Role a party plays in the payment protocol.
///
/// `EndUser` stands for "payer or relay" on tokens that either may send
/// (channel setup and close). `Unknown` is what a fresh connection gets
/// when the first token does not reveal the peer's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    Payer,
    Relay,
    Intermediary,
    EndUser,
    Authority,
    Ledger,
    Unknown,
}

impl PartyRole {
    pub const ALL: [PartyRole; 7] = [
        PartyRole::Payer,
        PartyRole::Relay,
        PartyRole::Intermediary,
        PartyRole::EndUser,
        PartyRole::Authority,
        PartyRole::Ledger,
        PartyRole::Unknown,
    ];

    /// Wire byte.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(byte: u8) -> Result<Self> {
        Self::ALL
            .get(byte as usize)
            .copied()
            .ok_or_else(|| PaymentError::Malformed(format!("party role byte {byte}")))
    }

    pub fn name(self) -> &'static str {
        match self {
            PartyRole::Payer => "payer",
            PartyRole::Relay => "relay",
            PartyRole::Intermediary => "intermediary",
            PartyRole::EndUser => "end_user",
            PartyRole::Authority => "authority",
            PartyRole::Ledger => "ledger",
            PartyRole::Unknown => "unknown",
        }
    }

    /// The controller a process running as this role hosts, if any.
    /// Authorities run inside a ledger process; end users are either
    /// payers or relays.
    pub fn controller(self) -> Option<ControllerKind> {
        match self {
            PartyRole::Payer => Some(ControllerKind::Payer),
            PartyRole::Relay => Some(ControllerKind::Relay),
            PartyRole::Intermediary => Some(ControllerKind::Intermediary),
            PartyRole::Ledger => Some(ControllerKind::Ledger),
            PartyRole::EndUser | PartyRole::Authority | PartyRole::Unknown => None,
        }
    }
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The local sub-protocol controllers a token can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerKind {
    Payer,
    Relay,
    Intermediary,
    Ledger,
}

impl ControllerKind {
    /// The role a process must run as to host this controller.
    pub fn role(self) -> PartyRole {
        match self {
            ControllerKind::Payer => PartyRole::Payer,
            ControllerKind::Relay => PartyRole::Relay,
            ControllerKind::Intermediary => PartyRole::Intermediary,
            ControllerKind::Ledger => PartyRole::Ledger,
        }
    }
}

/// Lifecycle signals controllers exchange with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    PaymentSuccess,
    PaymentFailure,
    CloseSuccess,
    CloseFailure,
    PaymentInitialized,
    PaymentReceived,
    IntermediaryIdle,
}

impl Signal {
    pub const ALL: [Signal; 7] = [
        Signal::PaymentSuccess,
        Signal::PaymentFailure,
        Signal::CloseSuccess,
        Signal::CloseFailure,
        Signal::PaymentInitialized,
        Signal::PaymentReceived,
        Signal::IntermediaryIdle,
    ];

    pub fn describe(self) -> &'static str {
        match self {
            Signal::PaymentSuccess => "last payment completed successfully",
            Signal::PaymentFailure => "last payment failed",
            Signal::CloseSuccess => "channel closed successfully",
            Signal::CloseFailure => "channel close failed",
            Signal::PaymentInitialized => "a payer initialized a payment",
            Signal::PaymentReceived => "a payment was received",
            Signal::IntermediaryIdle => "no active nanopayment channel left with an intermediary",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}
