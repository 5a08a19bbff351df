// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # paycell Node
//!
//! Entry point for the `paycell-node` binary. Parses CLI arguments,
//! initializes logging and runs one of:
//!
//! - `keygen`   generate a payment keypair
//! - `chain`    build a nanopayment hash chain
//! - `simulate` run a payer/relay loopback through the whole layer
//! - `version`  print build version information

mod cli;
mod logging;
mod simulate;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::OsRng;
use rand::RngCore;

use paycell_protocol::config::{LayerConfig, HASH_SIZE};
use paycell_protocol::crypto::{from_hex_string, to_hex_string, PayKeypair};
use paycell_protocol::hashchain::HashChain;

use cli::{Commands, PaycellNodeCli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = PaycellNodeCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);

    match cli.command {
        Commands::Keygen => keygen(),
        Commands::Chain(args) => chain(args),
        Commands::Simulate(args) => run_simulation(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn keygen() -> Result<()> {
    let keypair = PayKeypair::generate();
    let public_key = keypair.public_key();
    tracing::info!(address = %to_hex_string(public_key.address().as_bytes()), "payment keypair generated");

    println!("Public key : {}", public_key.to_hex());
    println!("Address    : {}", to_hex_string(public_key.address().as_bytes()));
    println!("Secret key : {}", hex::encode(keypair.secret_key_bytes()));
    Ok(())
}

fn chain(args: cli::ChainArgs) -> Result<()> {
    let seed = match args.seed {
        Some(text) => {
            let bytes = from_hex_string(&text)?;
            <[u8; HASH_SIZE]>::try_from(bytes.as_slice())
                .map_err(|_| anyhow::anyhow!("seed must be {HASH_SIZE} bytes, got {}", bytes.len()))?
        }
        None => {
            let mut seed = [0u8; HASH_SIZE];
            OsRng.fill_bytes(&mut seed);
            seed
        }
    };
    let chain = HashChain::build(args.size, seed)?;
    tracing::info!(size = chain.len(), "hash chain built");

    println!("Size : {}", chain.len());
    println!("Tail : {}", to_hex_string(chain.tail()));
    println!("Head : {}", to_hex_string(chain.head()));
    Ok(())
}

async fn run_simulation(args: cli::SimulateArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            LayerConfig::from_json(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => LayerConfig::default(),
    };
    tracing::info!(
        payments = args.payments,
        direct_max = config.direct_frame_payload_max,
        relay_max = config.relay_frame_payload_max,
        "starting simulation"
    );

    let report = simulate::run(args.payments, config).await?;

    println!("Tickets accepted : {}", report.accepted);
    println!("Tickets refused  : {}", report.refused);
    println!("Frames exchanged : {}", report.frames);
    println!("External balance : {}", report.external_balance);
    println!("Internal balance : {}", report.internal_balance);
    Ok(())
}

fn print_version() {
    println!("paycell-node {}", env!("CARGO_PKG_VERSION"));
    println!("rustc        {}", option_env!("RUSTC_VERSION").unwrap_or("unknown"));
}
