//! # CLI Interface
//!
//! Command-line structure for `paycell-node`, via `clap` derive.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Operator tool for the paycell payment layer.
///
/// Generates payment keys and ticket chains, and runs an in-process
/// payer/relay simulation of the layer.
#[derive(Parser, Debug)]
#[command(
    name = "paycell-node",
    about = "paycell payment layer operator tool",
    version,
    propagate_version = true
)]
pub struct PaycellNodeCli {
    /// Log output format.
    #[arg(long, global = true, value_enum, env = "PAYCELL_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate an Ed25519 payment keypair and print its address.
    Keygen,
    /// Build a nanopayment hash chain and print its tail and head.
    Chain(ChainArgs),
    /// Run a payer and a relay back to back over in-memory frame queues.
    Simulate(SimulateArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Parser, Debug)]
pub struct ChainArgs {
    /// Number of links, including the seed.
    #[arg(long, short = 'n')]
    pub size: usize,

    /// Hex seed (32 bytes). Random when omitted.
    #[arg(long)]
    pub seed: Option<String>,
}

#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Number of nanopayment tickets to send.
    #[arg(long, short = 'p', default_value_t = 10)]
    pub payments: u32,

    /// JSON layer configuration. Frame sizes and worker bound are taken
    /// from it; roles are set per simulated party.
    #[arg(long, short = 'c', env = "PAYCELL_CONFIG")]
    pub config: Option<PathBuf>,
}
