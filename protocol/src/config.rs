//! # Layer Configuration & Constants
//!
//! Every wire size used by the codec and the framing layer lives here. The
//! token table derives payload sizes from these, so changing one changes the
//! wire format for every peer. Treat them as frozen once two nodes talk.

use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};
use crate::party::PartyRole;

// ---------------------------------------------------------------------------
// Wire Message Layout
// ---------------------------------------------------------------------------

/// Every message starts with a one-byte type tag.
pub const TYPE_TAG_SIZE: usize = 1;

/// Session digest appended to every message, binding it to a party pair.
pub const DIGEST_LEN: usize = 20;

// ---------------------------------------------------------------------------
// Cryptographic Sizes
// ---------------------------------------------------------------------------

/// SHA-256 output.
pub const HASH_SIZE: usize = 32;

/// Ed25519 public key.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Ed25519 secret key.
pub const SECRET_KEY_SIZE: usize = 32;

/// Ed25519 signature.
pub const SIGNATURE_SIZE: usize = 64;

/// Payment address: truncated hash of a public key.
pub const ADDRESS_SIZE: usize = 20;

/// Compressed BN254 G1 point plus the matching Fr scalar.
pub const COMMITMENT_SIZE: usize = 64;

/// One compressed Fr element.
pub const FIELD_SIZE: usize = 32;

/// Compressed Groth16 proof over BN254 (A in G1, B in G2, C in G1).
pub const ZKP_SIZE: usize = 128;

/// Extra bytes carried by the signed token subset: `public_key ‖ signature`.
pub const SIGNATURE_ENVELOPE_SIZE: usize = PUBLIC_KEY_SIZE + SIGNATURE_SIZE;

// ---------------------------------------------------------------------------
// Party Identifiers
// ---------------------------------------------------------------------------

/// Descriptor on the wire: two u64 words plus a role byte.
pub const DESCRIPTOR_SIZE: usize = 8 + 8 + 1;

/// Length of an intermediary's identity fingerprint.
pub const INTERMEDIARY_IDENTITY_SIZE: usize = 20;

/// Intermediary identifier on the wire: fingerprint plus sequence number.
pub const INTERMEDIARY_ID_SIZE: usize = INTERMEDIARY_IDENTITY_SIZE + 8;

/// Random cookie intermediaries hand out to payers.
pub const INTERMEDIARY_COOKIE_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

/// Frame header: `type_tag (1) ‖ frame_length (2, big-endian)`.
pub const FRAME_HEADER_SIZE: usize = 3;

/// Usable bytes in a direct (unlayered) cell after the frame header.
pub const DIRECT_FRAME_PAYLOAD_MAX: usize = 509 - FRAME_HEADER_SIZE;

/// Usable bytes in a layered relay cell after relay and frame headers.
pub const RELAY_FRAME_PAYLOAD_MAX: usize = 509 - 11 - FRAME_HEADER_SIZE;

// ---------------------------------------------------------------------------
// Protocol Limits
// ---------------------------------------------------------------------------

/// Most nanopayments a single channel may carry before it must close.
pub const LIMIT_PAYMENT_WINDOW: u32 = 1000;

/// Default bound on concurrently running crypto jobs.
pub const DEFAULT_CRYPTO_WORKERS: usize = 4;

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

/// Per-process settings for the payment layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    /// Role this process plays in the payment protocol.
    pub role: PartyRole,
    /// Largest frame payload on direct cells.
    pub direct_frame_payload_max: usize,
    /// Largest frame payload on layered relay cells.
    pub relay_frame_payload_max: usize,
    /// Bound on concurrently running crypto jobs.
    pub crypto_workers: usize,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            role: PartyRole::Payer,
            direct_frame_payload_max: DIRECT_FRAME_PAYLOAD_MAX,
            relay_frame_payload_max: RELAY_FRAME_PAYLOAD_MAX,
            crypto_workers: DEFAULT_CRYPTO_WORKERS,
        }
    }
}

impl LayerConfig {
    /// Default configuration for the given role.
    pub fn for_role(role: PartyRole) -> Self {
        Self {
            role,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration document. Missing fields
    /// fall back to their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| PaymentError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the settings describe a usable layer.
    pub fn validate(&self) -> Result<()> {
        if self.role.controller().is_none() {
            return Err(PaymentError::Config(format!(
                "role {} cannot run a payment controller",
                self.role
            )));
        }
        for (name, max) in [
            ("direct_frame_payload_max", self.direct_frame_payload_max),
            ("relay_frame_payload_max", self.relay_frame_payload_max),
        ] {
            // frame_length travels as a u16
            if max == 0 || max > u16::MAX as usize {
                return Err(PaymentError::Config(format!(
                    "{name} must be within 1..={}, got {max}",
                    u16::MAX
                )));
            }
        }
        if self.crypto_workers == 0 {
            return Err(PaymentError::Config(
                "crypto_workers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
