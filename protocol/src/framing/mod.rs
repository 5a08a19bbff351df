//! # Framing & Reassembly
//!
//! Bridges one logical token message and the fixed-size cells of the
//! transport. Outbound, [`send_message`] fragments a packed message,
//! enqueues every frame and then tells the transport data is pending.
//! Inbound, [`Reassembler`] buffers fragments per circuit and hop until
//! the declared size is reached.

pub mod frame;
pub mod queue;
pub mod reassembly;

use tracing::debug;

pub use frame::{fragment, CircuitId, Frame, HopId};
pub use queue::{FrameQueue, QueuedFrame};
pub use reassembly::{AssembledMessage, Reassembler};

use crate::error::Result;
use crate::token::{TokenType, TransportCommand};

/// The host transport, as seen from the payment layer.
pub trait FrameTransport {
    /// Queue one encoded frame. `hop` names the layer for layered traffic.
    fn enqueue_frame(
        &mut self,
        circuit: CircuitId,
        command: TransportCommand,
        hop: Option<HopId>,
        frame: bytes::Bytes,
    ) -> Result<()>;

    /// Signal that frames are waiting on `circuit`.
    fn notify_pending(&mut self, circuit: CircuitId);
}

/// Fragment `message` and hand every frame to `transport`. Returns the
/// number of frames queued.
pub fn send_message<T: FrameTransport + ?Sized>(
    transport: &mut T,
    circuit: CircuitId,
    command: TransportCommand,
    hop: Option<HopId>,
    token_type: TokenType,
    message: &[u8],
    max: usize,
) -> Result<usize> {
    let frames = fragment(token_type, message, max)?;
    let count = frames.len();
    for frame in frames {
        transport.enqueue_frame(circuit, command, hop, frame.encode()?)?;
    }
    transport.notify_pending(circuit);
    debug!(%circuit, token = %token_type, frames = count, "message queued");
    Ok(count)
}
