//! Error types for the payment layer.
//!
//! Every fallible operation in the crate returns a [`PaymentError`]. Most
//! variants are local: one malformed message is rejected, logged, and the
//! controller decides what happens to the channel. Framing violations are
//! the exception, see [`PaymentError::is_fatal`].

use thiserror::Error;

use crate::party::PartyRole;
use crate::token::TokenType;

/// Errors raised by the codec, framing, dispatch and crypto engines.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The leading type tag does not match the type the caller asserted.
    #[error("token type mismatch: expected {expected}, found tag {found}")]
    TypeMismatch {
        /// The type the caller asked to unpack.
        expected: TokenType,
        /// The raw tag found on the wire.
        found: u8,
    },

    /// A type tag that names no known token.
    #[error("unknown token type tag {0}")]
    UnknownTokenType(u8),

    /// A byte string whose length disagrees with the token's declared size.
    #[error("invalid length for {token}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// The token being packed or parsed.
        token: TokenType,
        /// The declared size.
        expected: usize,
        /// What we actually got.
        actual: usize,
    },

    /// A fixed-width field held a value outside its domain.
    #[error("malformed {0}")]
    Malformed(String),

    /// Signature envelope did not verify.
    #[error("signature verification failed")]
    SignatureInvalid,

    /// Hash chains must contain at least one element.
    #[error("invalid hash chain size {0}")]
    InvalidSize(usize),

    /// A claimed preimage is not the stated distance from the tail.
    #[error("hash chain verification failed")]
    ChainVerificationFailed,

    /// The local role has no controller for this token type.
    #[error("token {token} cannot be routed to a {role} controller")]
    UnroutableToken {
        /// Local role.
        role: PartyRole,
        /// Received token type.
        token: TokenType,
    },

    /// The local role is never allowed to originate this token type.
    #[error("a {role} may not send {token}")]
    UnsupportedSenderRole {
        /// Local role.
        role: PartyRole,
        /// Token the controller tried to send.
        token: TokenType,
    },

    /// Only extended tokens can announce a second descriptor.
    #[error("{0} does not carry a second descriptor")]
    NotMultiDescriptor(TokenType),

    /// No route or intermediary identity is bound to this descriptor.
    #[error("unknown descriptor {0}")]
    UnknownDescriptor(String),

    /// A layered frame arrived for a hop the circuit does not contain.
    #[error("circuit {circuit} has no hop {hop}")]
    UnknownHop {
        /// Circuit handle.
        circuit: u64,
        /// Hop identity the transport reported.
        hop: u64,
    },

    /// The wallet engine could not produce a complete new wallet.
    #[error("wallet transition failed: {0}")]
    WalletTransitionError(String),

    /// Received frames disagree with the declared token size or ordering.
    #[error("framing invariant violated: {0}")]
    FramingInvariantViolation(String),

    /// The transport refused a frame.
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid layer configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The crypto worker pool failed to run a job.
    #[error("worker pool error: {0}")]
    WorkerPool(String),

    /// Malformed hex input.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl PaymentError {
    /// Fatal errors leave the reassembly state untrustworthy; the circuit
    /// must be torn down.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PaymentError::FramingInvariantViolation(_))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_framing_violations_are_fatal() {
        assert!(PaymentError::FramingInvariantViolation("x".into()).is_fatal());
        assert!(!PaymentError::SignatureInvalid.is_fatal());
        assert!(!PaymentError::InvalidSize(0).is_fatal());
    }

    #[test]
    fn messages_name_the_token() {
        let err = PaymentError::UnsupportedSenderRole {
            role: PartyRole::Relay,
            token: TokenType::MacAutMint,
        };
        assert_eq!(err.to_string(), "a relay may not send mac_aut_mint");
    }
}
