//! # Zero-Knowledge Proof Module
//!
//! Wallet transitions are proved with Groth16 over BN254. A new wallet
//! commits to its key and balance; the proof shows the commitment opens and
//! that the prover holds the signature of the wallet it descends from,
//! without revealing any of them.
//!
//! ```text
//! commitment.rs   two-form commitments over BN254 (point and scalar)
//! circuit.rs      R1CS statement (WalletTransitionCircuit)
//! prover.rs       Groth16 setup and proving (TransitionProver, TransitionProof)
//! verifier.rs     Groth16 verification (TransitionVerifier)
//! ```
//!
//! Everything here returns `anyhow::Result`; the wallet engine maps errors
//! into [`PaymentError::WalletTransitionError`](crate::error::PaymentError)
//! at its boundary.

pub mod circuit;
pub mod commitment;
pub mod prover;
pub mod verifier;

pub use circuit::{TransitionPublic, TransitionWitness, WalletTransitionCircuit};
pub use commitment::{CommitParams, Commitment};
pub use prover::{TransitionProof, TransitionProver};
pub use verifier::TransitionVerifier;
