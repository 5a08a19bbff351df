//! # Parties
//!
//! Who is on the other end of a payment message. Every remote endpoint is
//! named by a [`Descriptor`] (session id plus [`PartyRole`]); every token
//! type declares which roles may send and receive it (see
//! [`crate::token::TokenSpec`]).
//!
//! ```text
//! role.rs       PartyRole, ControllerKind, Signal
//! descriptor.rs Descriptor, IntermediaryId, session digests
//! context.rs    ProcessContext (fresh descriptors, local config)
//! ```

pub mod context;
pub mod descriptor;
pub mod role;

pub use context::ProcessContext;
pub use descriptor::{session_digest, Descriptor, IntermediaryId, SessionDigest};
pub use role::{ControllerKind, PartyRole, Signal};
