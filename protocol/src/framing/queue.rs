//! In-memory transport.
//!
//! [`FrameQueue`] records outbound frames instead of writing cells. Hosts
//! that own both ends of a circuit (simulations, tests) drain it and feed
//! the frames into the peer's dispatcher.

use std::collections::VecDeque;

use bytes::Bytes;

use super::frame::{CircuitId, HopId};
use super::FrameTransport;
use crate::error::Result;
use crate::token::TransportCommand;

/// One frame as the transport received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedFrame {
    pub circuit: CircuitId,
    pub command: TransportCommand,
    pub hop: Option<HopId>,
    pub frame: Bytes,
}

#[derive(Debug, Default)]
pub struct FrameQueue {
    frames: VecDeque<QueuedFrame>,
    notifications: usize,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued frame, oldest first.
    pub fn drain(&mut self) -> Vec<QueuedFrame> {
        self.frames.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// How many times the layer signalled pending data.
    pub fn notifications(&self) -> usize {
        self.notifications
    }
}

impl FrameTransport for FrameQueue {
    fn enqueue_frame(
        &mut self,
        circuit: CircuitId,
        command: TransportCommand,
        hop: Option<HopId>,
        frame: Bytes,
    ) -> Result<()> {
        self.frames.push_back(QueuedFrame {
            circuit,
            command,
            hop,
            frame,
        });
        Ok(())
    }

    fn notify_pending(&mut self, _circuit: CircuitId) {
        self.notifications += 1;
    }
}
