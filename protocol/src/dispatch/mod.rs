//! # Dispatch
//!
//! Role-aware routing between controllers and the framing layer.
//!
//! - [`router`]: table-driven `classify`, `route` and sender checks.
//! - [`registry`]: descriptor to circuit/hop bindings, both directions.
//! - [`dispatcher`]: the per-process [`Dispatcher`] and the [`Controller`]
//!   seam.

pub mod dispatcher;
pub mod registry;
pub mod router;

pub use dispatcher::{Controller, Dispatcher, InboundMessage};
pub use registry::{PartyRegistry, Route};
pub use router::{classify, route, sender_command};
