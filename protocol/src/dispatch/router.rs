//! Role-based classification and routing, read off the token table.

use tracing::error;

use crate::error::{PaymentError, Result};
use crate::party::{ControllerKind, PartyRole};
use crate::token::{TokenType, TransportCommand};

/// Role expected on the other end of `token_type`. Used to name a peer on
/// first contact, before any handshake.
pub fn classify(token_type: TokenType) -> PartyRole {
    token_type.opposite()
}

/// The local controller that receives `token_type` when running as `role`.
pub fn route(role: PartyRole, token_type: TokenType) -> Result<ControllerKind> {
    token_type.receiver(role).ok_or_else(|| {
        error!(%role, token = %token_type, "no controller for received token");
        PaymentError::UnroutableToken {
            role,
            token: token_type,
        }
    })
}

/// Transport command for sending `token_type` as `role`.
pub fn sender_command(role: PartyRole, token_type: TokenType) -> Result<TransportCommand> {
    let spec = token_type.spec();
    if spec.may_send(role) {
        Ok(spec.transport)
    } else {
        error!(%role, token = %token_type, "local role may not originate token");
        Err(PaymentError::UnsupportedSenderRole {
            role,
            token: token_type,
        })
    }
}
