//! Inbound reassembly.
//!
//! Each circuit has one slot for direct traffic and one slot per hop on its
//! layered path. A slot holds at most one partially received message. A
//! message whose declared size fits in one frame never touches a slot.
//!
//! Any disagreement between received frames and the token table is a
//! framing violation: the slot is cleared and the error is fatal for the
//! circuit.

use std::collections::HashMap;

use bytes::{Bytes, BytesMut};
use tracing::{debug, error};

use super::frame::{CircuitId, Frame, HopId};
use crate::config::LayerConfig;
use crate::error::{PaymentError, Result};
use crate::token::{size_of, TokenType};

/// A complete token message popped from a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledMessage {
    pub circuit: CircuitId,
    /// `None` for direct traffic.
    pub hop: Option<HopId>,
    pub token_type: TokenType,
    pub bytes: Bytes,
}

#[derive(Debug)]
struct Pending {
    token_type: TokenType,
    buf: BytesMut,
}

#[derive(Debug, Default)]
struct CircuitSlots {
    direct: Option<Pending>,
    /// Layered path, in transport order. Looked up by hop identity.
    path: Vec<(HopId, Option<Pending>)>,
}

/// Per-circuit, per-hop reassembly buffers.
#[derive(Debug)]
pub struct Reassembler {
    direct_max: usize,
    relay_max: usize,
    circuits: HashMap<CircuitId, CircuitSlots>,
}

impl Reassembler {
    pub fn new(config: &LayerConfig) -> Self {
        Self {
            direct_max: config.direct_frame_payload_max,
            relay_max: config.relay_frame_payload_max,
            circuits: HashMap::new(),
        }
    }

    /// Record that the transport extended `circuit` by `hop`.
    pub fn extend_path(&mut self, circuit: CircuitId, hop: HopId) {
        let slots = self.circuits.entry(circuit).or_default();
        if !slots.path.iter().any(|(h, _)| *h == hop) {
            slots.path.push((hop, None));
        }
    }

    /// Feed one frame. Returns the message it completes, if any.
    pub fn receive(
        &mut self,
        circuit: CircuitId,
        hop: Option<HopId>,
        frame: Frame,
    ) -> Result<Option<AssembledMessage>> {
        let max = if hop.is_some() { self.relay_max } else { self.direct_max };
        let slot = self.slot(circuit, hop)?;
        let result = accept(slot, frame, max);
        match result {
            Ok(Some((token_type, bytes))) => {
                debug!(%circuit, ?hop, token = %token_type, len = bytes.len(), "message reassembled");
                Ok(Some(AssembledMessage {
                    circuit,
                    hop,
                    token_type,
                    bytes,
                }))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                error!(%circuit, ?hop, error = %e, "framing violation, slot cleared");
                Err(e)
            }
        }
    }

    /// `true` while a message is partially received on this slot.
    pub fn is_pending(&self, circuit: CircuitId, hop: Option<HopId>) -> bool {
        let Some(slots) = self.circuits.get(&circuit) else {
            return false;
        };
        match hop {
            None => slots.direct.is_some(),
            Some(hop) => slots
                .path
                .iter()
                .any(|(h, pending)| *h == hop && pending.is_some()),
        }
    }

    /// Number of partially received messages across all circuits.
    pub fn pending_count(&self) -> usize {
        self.circuits
            .values()
            .map(|s| {
                usize::from(s.direct.is_some())
                    + s.path.iter().filter(|(_, p)| p.is_some()).count()
            })
            .sum()
    }

    /// Drop every buffer of `circuit`. No completion is reported for
    /// discarded partial messages.
    pub fn discard_circuit(&mut self, circuit: CircuitId) -> bool {
        self.circuits.remove(&circuit).is_some()
    }

    fn slot(&mut self, circuit: CircuitId, hop: Option<HopId>) -> Result<&mut Option<Pending>> {
        let unknown_hop = |hop: HopId| PaymentError::UnknownHop {
            circuit: circuit.0,
            hop: hop.0,
        };
        match hop {
            None => Ok(&mut self.circuits.entry(circuit).or_default().direct),
            Some(hop) => self
                .circuits
                .get_mut(&circuit)
                .and_then(|slots| slots.path.iter_mut().find(|(h, _)| *h == hop))
                .map(|(_, pending)| pending)
                .ok_or_else(|| unknown_hop(hop)),
        }
    }
}

fn violation(msg: String) -> PaymentError {
    PaymentError::FramingInvariantViolation(msg)
}

/// Apply one frame to one slot. The slot is empty after any error.
fn accept(slot: &mut Option<Pending>, frame: Frame, max: usize) -> Result<Option<(TokenType, Bytes)>> {
    let size = size_of(frame.token_type);
    let len = frame.body.len();

    let Some(mut pending) = slot.take() else {
        if size <= max {
            if len != size {
                return Err(violation(format!(
                    "single-frame {} carried {len} bytes, expected {size}",
                    frame.token_type
                )));
            }
            return Ok(Some((frame.token_type, frame.body)));
        }
        if len != max {
            return Err(violation(format!(
                "first frame of {} carried {len} bytes, expected {max}",
                frame.token_type
            )));
        }
        let mut buf = BytesMut::with_capacity(size);
        buf.extend_from_slice(&frame.body);
        *slot = Some(Pending {
            token_type: frame.token_type,
            buf,
        });
        return Ok(None);
    };

    if pending.token_type != frame.token_type {
        return Err(violation(format!(
            "{} frame interleaved with pending {}",
            frame.token_type, pending.token_type
        )));
    }
    let remaining = size - pending.buf.len();
    if len > remaining {
        return Err(violation(format!(
            "{} frame of {len} bytes overruns the {remaining} bytes left",
            frame.token_type
        )));
    }
    if len < remaining && len != max {
        return Err(violation(format!(
            "non-final {} frame carried {len} bytes, expected {max}",
            frame.token_type
        )));
    }
    pending.buf.extend_from_slice(&frame.body);
    if pending.buf.len() == size {
        return Ok(Some((pending.token_type, pending.buf.freeze())));
    }
    *slot = Some(pending);
    Ok(None)
}
