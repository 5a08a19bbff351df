// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # paycell: payment transport and dispatch
//!
//! The layer that carries micropayment protocol messages over anonymity
//! circuits. Controllers build typed token payloads; this crate packs them,
//! fragments them into transport frames, reassembles them on the far side
//! and routes each complete message to the controller that handles it.
//!
//! ## Modules
//!
//! - **token**: token table, typed payloads and the byte-level codec.
//! - **framing**: frames, fragmentation and per-hop reassembly.
//! - **dispatch**: routing, descriptor registry and the dispatcher.
//! - **party**: roles, descriptors and the process context.
//! - **hashchain**: nanopayment ticket chains.
//! - **wallet** / **zkp**: committed wallet states and the Groth16
//!   transition proof.
//! - **receipt**: signed payment receipts.
//! - **crypto**: hashing, Ed25519 keys and the bounded crypto pool.
//! - **config**: wire constants and [`config::LayerConfig`].
//!
//! ## Ground rules
//!
//! 1. Every length on the wire is a function of the token type.
//! 2. Framing violations are fatal for the circuit; everything else is
//!    rejected per message.
//! 3. Expensive crypto runs on the pool, never on the reactor.

pub mod config;
pub mod crypto;
pub mod dispatch;
pub mod error;
pub mod framing;
pub mod hashchain;
pub mod party;
pub mod receipt;
pub mod token;
pub mod wallet;
pub mod zkp;

pub use error::{PaymentError, Result};
