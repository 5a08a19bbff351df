//! Descriptors and intermediary identifiers.
//!
//! A [`Descriptor`] is a value: it is created once by the
//! [`ProcessContext`](super::ProcessContext) and never mutated. Equality
//! and hashing go through a 20-byte content digest of `id ‖ role`; ordering
//! is `(role, id_high, id_low)` so descriptors can key sorted maps.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::role::PartyRole;
use crate::config::{DESCRIPTOR_SIZE, DIGEST_LEN, INTERMEDIARY_IDENTITY_SIZE, INTERMEDIARY_ID_SIZE};
use crate::crypto::hash::{digest20, digest20_concat, to_hex_string};
use crate::error::{PaymentError, Result};

/// 20-byte digest binding a message to one session.
pub type SessionDigest = [u8; DIGEST_LEN];

/// Identifies a remote payment endpoint.
#[derive(Clone, Copy)]
pub struct Descriptor {
    id_high: u64,
    id_low: u64,
    role: PartyRole,
}

impl Descriptor {
    pub fn new(id_high: u64, id_low: u64, role: PartyRole) -> Self {
        Self {
            id_high,
            id_low,
            role,
        }
    }

    pub fn role(&self) -> PartyRole {
        self.role
    }

    /// `(id_high, id_low)`.
    pub fn id(&self) -> (u64, u64) {
        (self.id_high, self.id_low)
    }

    /// Content digest over the wire encoding.
    pub fn digest(&self) -> [u8; DIGEST_LEN] {
        digest20(&self.to_bytes())
    }

    /// `id_high (8, BE) ‖ id_low (8, BE) ‖ role (1)`.
    pub fn to_bytes(&self) -> [u8; DESCRIPTOR_SIZE] {
        let mut out = [0u8; DESCRIPTOR_SIZE];
        out[..8].copy_from_slice(&self.id_high.to_be_bytes());
        out[8..16].copy_from_slice(&self.id_low.to_be_bytes());
        out[16] = self.role.as_u8();
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != DESCRIPTOR_SIZE {
            return Err(PaymentError::Malformed(format!(
                "descriptor of {} bytes",
                bytes.len()
            )));
        }
        let mut high = [0u8; 8];
        let mut low = [0u8; 8];
        high.copy_from_slice(&bytes[..8]);
        low.copy_from_slice(&bytes[8..16]);
        Ok(Self {
            id_high: u64::from_be_bytes(high),
            id_low: u64::from_be_bytes(low),
            role: PartyRole::from_u8(bytes[16])?,
        })
    }
}

impl PartialEq for Descriptor {
    fn eq(&self, other: &Self) -> bool {
        self.digest() == other.digest()
    }
}

impl Eq for Descriptor {}

impl Hash for Descriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digest().hash(state);
    }
}

impl Ord for Descriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.role, self.id_high, self.id_low).cmp(&(other.role, other.id_high, other.id_low))
    }
}

impl PartialOrd for Descriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:016X}{:016X}", self.role, self.id_high, self.id_low)
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Descriptor({self})")
    }
}

/// Session digest for a pair of endpoints. Symmetric: both sides compute
/// the same digest whichever of them is `a`.
pub fn session_digest(a: &Descriptor, b: &Descriptor) -> SessionDigest {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    digest20_concat(&[&first.to_bytes(), &second.to_bytes()])
}

/// Long-lived identity of an intermediary, announced to relays when a
/// payer introduces one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntermediaryId {
    /// Relay identity fingerprint.
    pub identity: [u8; INTERMEDIARY_IDENTITY_SIZE],
    /// Distinguishes successive channels with the same intermediary.
    pub sequence: u64,
}

impl IntermediaryId {
    pub fn new(identity: [u8; INTERMEDIARY_IDENTITY_SIZE], sequence: u64) -> Self {
        Self { identity, sequence }
    }

    pub fn to_bytes(&self) -> [u8; INTERMEDIARY_ID_SIZE] {
        let mut out = [0u8; INTERMEDIARY_ID_SIZE];
        out[..INTERMEDIARY_IDENTITY_SIZE].copy_from_slice(&self.identity);
        out[INTERMEDIARY_IDENTITY_SIZE..].copy_from_slice(&self.sequence.to_be_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != INTERMEDIARY_ID_SIZE {
            return Err(PaymentError::Malformed(format!(
                "intermediary id of {} bytes",
                bytes.len()
            )));
        }
        let mut identity = [0u8; INTERMEDIARY_IDENTITY_SIZE];
        identity.copy_from_slice(&bytes[..INTERMEDIARY_IDENTITY_SIZE]);
        let mut sequence = [0u8; 8];
        sequence.copy_from_slice(&bytes[INTERMEDIARY_IDENTITY_SIZE..]);
        Ok(Self {
            identity,
            sequence: u64::from_be_bytes(sequence),
        })
    }
}

impl fmt::Display for IntermediaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", to_hex_string(&self.identity), self.sequence)
    }
}
