//! # Loopback Simulation
//!
//! A payer and a relay dispatcher joined by in-memory frame queues. The
//! payer opens a nanopayment channel announcing an intermediary, streams
//! tickets, and the relay checks each against the chain tail. Afterwards
//! the channel value moves into a wallet transition on the crypto pool.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info, warn};

use paycell_protocol::config::{LayerConfig, LIMIT_PAYMENT_WINDOW};
use paycell_protocol::crypto::{sha256, CryptoPool, PayKeypair};
use paycell_protocol::dispatch::{Controller, Dispatcher, InboundMessage, Route};
use paycell_protocol::framing::{CircuitId, FrameQueue, HopId};
use paycell_protocol::hashchain::{self, HashChain};
use paycell_protocol::party::{Descriptor, IntermediaryId, PartyRole, ProcessContext, Signal};
use paycell_protocol::token::payloads::{self, Hash};
use paycell_protocol::token::{pack_token, unpack_token, NanPublic, TokenType};
use paycell_protocol::wallet::{self, Wallet};
use paycell_protocol::zkp::TransitionProver;
use paycell_protocol::PaymentError;

const TICKET_VALUE: i64 = 10;

const PAYER_SIDE: (CircuitId, HopId) = (CircuitId(1), HopId(3));
const RELAY_SIDE: (CircuitId, HopId) = (CircuitId(7), HopId(0));

/// What the simulation observed.
#[derive(Debug, Default)]
pub struct Report {
    pub accepted: u32,
    pub refused: u32,
    pub frames: usize,
    pub external_balance: i64,
    pub internal_balance: i64,
}

struct Channel {
    tail: Hash,
    next: u32,
}

#[derive(Default)]
struct RelayDesk {
    channels: HashMap<Descriptor, Channel>,
    outbox: Vec<(Descriptor, TokenType, Vec<u8>)>,
}

impl Controller for RelayDesk {
    fn handle_message(&mut self, m: InboundMessage) -> paycell_protocol::Result<()> {
        match m.token_type {
            TokenType::NanCliEstab1 => {
                let (estab, digest) = unpack_token::<payloads::NanCliEstab1>(&m.message)?;
                if let Some((id, _)) = m.announced {
                    debug!(intermediary = %id, "payer announced intermediary");
                }
                self.channels.insert(
                    m.descriptor,
                    Channel {
                        tail: estab.nan_public.hash_tail,
                        next: 1,
                    },
                );
                let reply = pack_token(&payloads::NanRelEstab6 { verified: true }, &digest)?;
                self.outbox.push((m.descriptor, TokenType::NanRelEstab6, reply));
            }
            TokenType::NanCliPay1 => {
                let (ticket, digest) = unpack_token::<payloads::NanCliPay1>(&m.message)?;
                let channel = self
                    .channels
                    .get_mut(&m.descriptor)
                    .ok_or_else(|| PaymentError::UnknownDescriptor(m.descriptor.to_string()))?;
                let success = ticket.index == channel.next
                    && hashchain::check(&channel.tail, &ticket.preimage, ticket.index as usize).is_ok();
                if success {
                    channel.next += 1;
                } else {
                    warn!(index = ticket.index, "ticket refused");
                }
                let reply = pack_token(&payloads::NanRelPay2 { success }, &digest)?;
                self.outbox.push((m.descriptor, TokenType::NanRelPay2, reply));
            }
            other => {
                return Err(PaymentError::Malformed(format!("relay desk got {other}")));
            }
        }
        Ok(())
    }

    fn handle_signal(&mut self, _signal: Signal, _descriptor: &Descriptor) -> paycell_protocol::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct PayerDesk {
    established: bool,
    accepted: u32,
    refused: u32,
}

impl Controller for PayerDesk {
    fn handle_message(&mut self, m: InboundMessage) -> paycell_protocol::Result<()> {
        match m.token_type {
            TokenType::NanRelEstab6 => {
                self.established = unpack_token::<payloads::NanRelEstab6>(&m.message)?.0.verified;
            }
            TokenType::NanRelPay2 => {
                if unpack_token::<payloads::NanRelPay2>(&m.message)?.0.success {
                    self.accepted += 1;
                } else {
                    self.refused += 1;
                }
            }
            other => {
                return Err(PaymentError::Malformed(format!("payer desk got {other}")));
            }
        }
        Ok(())
    }

    fn handle_signal(&mut self, signal: Signal, descriptor: &Descriptor) -> paycell_protocol::Result<()> {
        info!(%descriptor, "{signal}");
        Ok(())
    }
}

struct Link {
    payer: Dispatcher<FrameQueue, PayerDesk>,
    relay: Dispatcher<FrameQueue, RelayDesk>,
    frames: usize,
}

impl Link {
    fn pump(&mut self) -> Result<()> {
        loop {
            let up = self.payer.transport_mut().drain();
            let down = self.relay.transport_mut().drain();
            if up.is_empty() && down.is_empty() {
                return Ok(());
            }
            self.frames += up.len() + down.len();
            for f in up {
                match f.hop {
                    Some(_) => self.relay.deliver_layered(RELAY_SIDE.0, RELAY_SIDE.1, &f.frame)?,
                    None => self.relay.deliver_direct(RELAY_SIDE.0, &f.frame)?,
                }
            }
            for f in down {
                match f.hop {
                    Some(_) => self.payer.deliver_layered(PAYER_SIDE.0, PAYER_SIDE.1, &f.frame)?,
                    None => self.payer.deliver_direct(PAYER_SIDE.0, &f.frame)?,
                }
            }
            for (to, token_type, msg) in std::mem::take(&mut self.relay.controller_mut().outbox) {
                self.relay.send(&to, token_type, &msg)?;
            }
        }
    }
}

fn context(base: &LayerConfig, role: PartyRole) -> Result<Arc<ProcessContext>> {
    let config = LayerConfig {
        role,
        ..base.clone()
    };
    Ok(Arc::new(ProcessContext::new(config)?))
}

pub async fn run(payments: u32, base: LayerConfig) -> Result<Report> {
    if payments == 0 || payments > LIMIT_PAYMENT_WINDOW {
        bail!("payments must be within 1..={LIMIT_PAYMENT_WINDOW}, got {payments}");
    }

    let mut payer = Dispatcher::new(context(&base, PartyRole::Payer)?, FrameQueue::new(), PayerDesk::default())?;
    let mut relay = Dispatcher::new(context(&base, PartyRole::Relay)?, FrameQueue::new(), RelayDesk::default())?;
    payer.extend_path(PAYER_SIDE.0, PAYER_SIDE.1);
    relay.extend_path(RELAY_SIDE.0, RELAY_SIDE.1);

    let relay_desc = payer.connect(PartyRole::Relay, Route::layered(PAYER_SIDE.0, PAYER_SIDE.1));
    let intermediary_desc = payer.connect(PartyRole::Intermediary, Route::layered(CircuitId(2), HopId(3)));
    let mut identity = [0u8; 20];
    OsRng.fill_bytes(&mut identity);
    payer.bind_intermediary(intermediary_desc, IntermediaryId::new(identity, 1));

    let mut link = Link {
        payer,
        relay,
        frames: 0,
    };

    // -- channel establishment --
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    let chain = HashChain::build(payments as usize + 1, seed)?;
    let nan_public = NanPublic {
        value_from: TICKET_VALUE,
        value_to: TICKET_VALUE,
        num_payments: payments,
        hash_tail: *chain.tail(),
    };
    let digest = nan_public.digest();
    let estab = payloads::NanCliEstab1 {
        nan_public,
        channel_token: sha256(&seed),
    };
    link.payer.send_with_second_descriptor(
        &relay_desc,
        &intermediary_desc,
        TokenType::NanCliEstab1,
        &pack_token(&estab, &digest)?,
    )?;
    link.pump()?;
    if !link.payer.controller().established {
        bail!("relay did not confirm the nanopayment channel");
    }
    info!(payments, "nanopayment channel established");

    // -- tickets --
    link.payer.signal_event(Signal::PaymentInitialized, &relay_desc)?;
    for k in 1..=payments {
        let preimage = *chain
            .preimage(k as usize)
            .context("chain shorter than the payment window")?;
        let ticket = payloads::NanCliPay1 { preimage, index: k };
        link.payer
            .send(&relay_desc, TokenType::NanCliPay1, &pack_token(&ticket, &digest)?)?;
        link.pump()?;
    }
    let signal = if link.payer.controller().refused == 0 {
        Signal::PaymentSuccess
    } else {
        Signal::PaymentFailure
    };
    link.payer.signal_event(signal, &relay_desc)?;

    // -- wallet transition on the pool --
    let pool = CryptoPool::new(base.crypto_workers);
    let (prover, verifier) = pool
        .run(|| {
            TransitionProver::setup(&mut OsRng)
                .map_err(|e| PaymentError::WalletTransitionError(format!("{e:#}")))
        })
        .await?;
    let prover = Arc::new(prover);
    let intermediary_keys = PayKeypair::generate();
    let earned = i64::from(link.payer.controller().accepted) * TICKET_VALUE;
    let budget = i64::from(payments) * TICKET_VALUE;

    let old = Wallet::open(prover.commit_params(), 0, budget, intermediary_keys.public_key(), &mut OsRng)
        .countersign(&intermediary_keys)?;
    let new = wallet::transition_in_pool(&pool, Arc::clone(&prover), earned, old.clone())
        .await?
        .countersign(&intermediary_keys)?;
    wallet::verify_transition(
        &verifier,
        &intermediary_keys.public_key(),
        earned,
        old.public_key().as_bytes(),
        &new.public_part()?,
    )?;
    info!(
        external = new.external_balance(),
        internal = new.internal_balance(),
        "wallet transition verified"
    );

    Ok(Report {
        accepted: link.payer.controller().accepted,
        refused: link.payer.controller().refused,
        frames: link.frames,
        external_balance: new.external_balance(),
        internal_balance: new.internal_balance(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_ticket_is_accepted() {
        let report = run(3, LayerConfig::default()).await.unwrap();
        assert_eq!(report.accepted, 3);
        assert_eq!(report.refused, 0);
        // estab + reply, then a ticket and a reply per payment
        assert_eq!(report.frames, 2 + 2 * 3);
        assert_eq!(report.external_balance, 30);
        assert_eq!(report.internal_balance, 0);
    }

    #[tokio::test]
    async fn payment_window_is_enforced() {
        assert!(run(0, LayerConfig::default()).await.is_err());
        assert!(run(LIMIT_PAYMENT_WINDOW + 1, LayerConfig::default()).await.is_err());
    }
}
