//! The dispatcher: one per process, owned by the reactor.
//!
//! Outbound, a controller names a descriptor and hands over a packed
//! message; the dispatcher checks the sender table, picks the transport
//! command and frame size, and fragments. Inbound, the transport hands over
//! one cell at a time; complete messages are routed to the local
//! controller together with the descriptor of the endpoint that sent them.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, warn};

use super::registry::{PartyRegistry, Route};
use super::router::{classify, route, sender_command};
use crate::error::{PaymentError, Result};
use crate::framing::{send_message, AssembledMessage, CircuitId, Frame, FrameTransport, HopId, Reassembler};
use crate::party::{ControllerKind, Descriptor, IntermediaryId, PartyRole, ProcessContext, Signal};
use crate::token::{extend, size_of, split_extended, unsigned_size, TokenType, TransportCommand};

/// A complete message on its way to a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// The endpoint that sent it.
    pub descriptor: Descriptor,
    pub token_type: TokenType,
    /// Packed message. For extended tokens the announcement is stripped
    /// and carried in `announced`.
    pub message: Bytes,
    pub announced: Option<(IntermediaryId, Descriptor)>,
}

/// A sub-protocol controller (payer, relay, intermediary or ledger).
pub trait Controller {
    fn handle_message(&mut self, message: InboundMessage) -> Result<()>;

    fn handle_signal(&mut self, signal: Signal, descriptor: &Descriptor) -> Result<()>;
}

/// Routes messages between the transport and the local controller.
pub struct Dispatcher<T, C> {
    ctx: Arc<ProcessContext>,
    kind: ControllerKind,
    transport: T,
    controller: C,
    registry: PartyRegistry,
    reassembler: Reassembler,
}

impl<T: FrameTransport, C: Controller> Dispatcher<T, C> {
    pub fn new(ctx: Arc<ProcessContext>, transport: T, controller: C) -> Result<Self> {
        let role = ctx.role();
        let kind = role
            .controller()
            .ok_or_else(|| PaymentError::Config(format!("role {role} hosts no controller")))?;
        let reassembler = Reassembler::new(ctx.config());
        Ok(Self {
            ctx,
            kind,
            transport,
            controller,
            registry: PartyRegistry::new(),
            reassembler,
        })
    }

    pub fn role(&self) -> PartyRole {
        self.ctx.role()
    }

    pub fn controller_kind(&self) -> ControllerKind {
        self.kind
    }

    pub fn context(&self) -> &Arc<ProcessContext> {
        &self.ctx
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    pub fn registry(&self) -> &PartyRegistry {
        &self.registry
    }

    pub fn pending_reassemblies(&self) -> usize {
        self.reassembler.pending_count()
    }

    // -- setup --------------------------------------------------------------

    /// Allocate a descriptor for an endpoint reached over `route`.
    pub fn connect(&mut self, role: PartyRole, route: Route) -> Descriptor {
        let descriptor = self.ctx.next_descriptor(role);
        self.bind(descriptor, route);
        descriptor
    }

    pub fn bind(&mut self, descriptor: Descriptor, route: Route) {
        debug!(%descriptor, circuit = %route.circuit, hop = ?route.hop, "descriptor bound");
        self.registry.bind(descriptor, route);
    }

    pub fn bind_intermediary(&mut self, descriptor: Descriptor, id: IntermediaryId) {
        self.registry.bind_intermediary(descriptor, id);
    }

    /// The transport added `hop` to `circuit`'s layered path.
    pub fn extend_path(&mut self, circuit: CircuitId, hop: HopId) {
        self.reassembler.extend_path(circuit, hop);
    }

    // -- outbound -----------------------------------------------------------

    /// Send a complete packed message to `descriptor`. Returns the number
    /// of frames queued.
    pub fn send(&mut self, descriptor: &Descriptor, token_type: TokenType, message: &[u8]) -> Result<usize> {
        let command = sender_command(self.role(), token_type)?;
        let route = self
            .registry
            .route_of(descriptor)
            .ok_or_else(|| PaymentError::UnknownDescriptor(descriptor.to_string()))?;
        let expected = size_of(token_type);
        if message.len() != expected {
            return Err(PaymentError::InvalidLength {
                token: token_type,
                expected,
                actual: message.len(),
            });
        }

        let hop = match command {
            TransportCommand::Direct => None,
            TransportCommand::Layered => route.hop,
        };
        // same choice the receiving reassembler makes
        let config = self.ctx.config();
        let max = if hop.is_some() {
            config.relay_frame_payload_max
        } else {
            config.direct_frame_payload_max
        };
        send_message(&mut self.transport, route.circuit, command, hop, token_type, message, max)
    }

    /// Send a plain extended token to `descriptor` announcing the
    /// intermediary behind `announced`. Payers only.
    pub fn send_with_second_descriptor(
        &mut self,
        descriptor: &Descriptor,
        announced: &Descriptor,
        token_type: TokenType,
        message: &[u8],
    ) -> Result<usize> {
        let role = self.role();
        if role != PartyRole::Payer {
            error!(%role, token = %token_type, "second-descriptor send from non-payer");
            return Err(PaymentError::UnsupportedSenderRole {
                role,
                token: token_type,
            });
        }
        if !token_type.spec().extended {
            return Err(PaymentError::NotMultiDescriptor(token_type));
        }
        let expected = unsigned_size(token_type);
        if message.len() != expected {
            return Err(PaymentError::InvalidLength {
                token: token_type,
                expected,
                actual: message.len(),
            });
        }
        let id = self
            .registry
            .intermediary_id(announced)
            .ok_or_else(|| PaymentError::UnknownDescriptor(announced.to_string()))?;
        let extended = extend(message, &id, announced);
        self.send(descriptor, token_type, &extended)
    }

    /// Forward a lifecycle signal to the local controller.
    pub fn signal_event(&mut self, signal: Signal, descriptor: &Descriptor) -> Result<()> {
        debug!(controller = ?self.kind, %descriptor, ?signal, "signal");
        self.controller.handle_signal(signal, descriptor)
    }

    // -- inbound ------------------------------------------------------------

    /// One cell of layered traffic from `hop` on `circuit`.
    pub fn deliver_layered(&mut self, circuit: CircuitId, hop: HopId, cell: &[u8]) -> Result<()> {
        self.deliver(circuit, Some(hop), cell)
    }

    /// One cell of direct traffic on `circuit`.
    pub fn deliver_direct(&mut self, circuit: CircuitId, cell: &[u8]) -> Result<()> {
        self.deliver(circuit, None, cell)
    }

    /// Drop all reassembly state and bindings of `circuit`. Returns the
    /// descriptors that were bound to it.
    pub fn teardown(&mut self, circuit: CircuitId) -> Vec<Descriptor> {
        let had_buffers = self.reassembler.discard_circuit(circuit);
        let dropped = self.registry.unbind_circuit(circuit);
        debug!(%circuit, had_buffers, dropped = dropped.len(), "circuit torn down");
        dropped
    }

    fn deliver(&mut self, circuit: CircuitId, hop: Option<HopId>, cell: &[u8]) -> Result<()> {
        let received = Frame::decode(cell).and_then(|frame| self.reassembler.receive(circuit, hop, frame));
        match received {
            Ok(Some(assembled)) => self.dispatch(assembled),
            Ok(None) => Ok(()),
            Err(e) => {
                if e.is_fatal() {
                    error!(%circuit, error = %e, "fatal framing error, tearing circuit down");
                    self.teardown(circuit);
                }
                Err(e)
            }
        }
    }

    fn dispatch(&mut self, assembled: AssembledMessage) -> Result<()> {
        let AssembledMessage {
            circuit,
            hop,
            token_type,
            bytes,
        } = assembled;
        route(self.role(), token_type)?;

        let at = Route { circuit, hop };
        let descriptor = match self.registry.descriptor_at(at) {
            Some(descriptor) => descriptor,
            None => {
                let descriptor = self.ctx.next_descriptor(classify(token_type));
                debug!(%descriptor, %circuit, ?hop, token = %token_type, "first contact");
                self.registry.bind(descriptor, at);
                descriptor
            }
        };

        let (message, announced) = if token_type.spec().extended {
            let (plain, id, second) = split_extended(&bytes)?;
            let plain_len = plain.len();
            (bytes.slice(..plain_len), Some((id, second)))
        } else {
            (bytes, None)
        };

        let inbound = InboundMessage {
            descriptor,
            token_type,
            message,
            announced,
        };
        self.controller.handle_message(inbound).map_err(|e| {
            warn!(%descriptor, token = %token_type, error = %e, "message rejected");
            e
        })
    }
}
