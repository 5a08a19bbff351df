//! Frame encoding and fragmentation.
//!
//! ```text
//! frame = type_tag (1) ‖ frame_length (2, BE) ‖ body (frame_length)
//! ```
//!
//! A frame rides inside one transport cell; whatever follows the body in
//! the cell is padding and is ignored. Frames carry no sequence numbers:
//! the transport delivers them in order.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::config::FRAME_HEADER_SIZE;
use crate::error::{PaymentError, Result};
use crate::token::TokenType;

/// Transport handle of a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CircuitId(pub u64);

/// Identity of one hop on a layered circuit, as the transport tracks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HopId(pub u64);

impl fmt::Display for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "circ#{}", self.0)
    }
}

impl fmt::Display for HopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hop#{}", self.0)
    }
}

/// One fragment of a token message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub token_type: TokenType,
    pub body: Bytes,
}

impl Frame {
    /// Header plus body.
    pub fn encode(&self) -> Result<Bytes> {
        let length = u16::try_from(self.body.len()).map_err(|_| {
            PaymentError::FramingInvariantViolation(format!(
                "frame body of {} bytes exceeds the length field",
                self.body.len()
            ))
        })?;
        let mut out = BytesMut::with_capacity(FRAME_HEADER_SIZE + self.body.len());
        out.put_u8(self.token_type.tag());
        out.put_u16(length);
        out.put_slice(&self.body);
        Ok(out.freeze())
    }

    /// Parse a frame from the front of a cell payload.
    pub fn decode(cell: &[u8]) -> Result<Self> {
        if cell.len() < FRAME_HEADER_SIZE {
            return Err(PaymentError::FramingInvariantViolation(format!(
                "cell of {} bytes has no frame header",
                cell.len()
            )));
        }
        let token_type = TokenType::from_tag(cell[0])?;
        let length = u16::from_be_bytes([cell[1], cell[2]]) as usize;
        let body = &cell[FRAME_HEADER_SIZE..];
        if length > body.len() {
            return Err(PaymentError::FramingInvariantViolation(format!(
                "{token_type} frame claims {length} bytes, cell holds {}",
                body.len()
            )));
        }
        Ok(Self {
            token_type,
            body: Bytes::copy_from_slice(&body[..length]),
        })
    }
}

/// Split `message` into `ceil(len / max)` frames. Every frame but the last
/// carries exactly `max` bytes.
pub fn fragment(token_type: TokenType, message: &[u8], max: usize) -> Result<Vec<Frame>> {
    if max == 0 {
        return Err(PaymentError::Config("frame payload max must be positive".into()));
    }
    Ok(message
        .chunks(max)
        .map(|chunk| Frame {
            token_type,
            body: Bytes::copy_from_slice(chunk),
        })
        .collect())
}
