//! Process-scoped state shared by every component of the layer.
//!
//! One [`ProcessContext`] is built at startup and handed (behind an `Arc`)
//! to each component that needs the local role, the layer configuration,
//! or fresh descriptors. Descriptor ids come from a 128-bit counter seeded
//! randomly so ids from different runs do not collide.

use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

use super::descriptor::Descriptor;
use super::role::PartyRole;
use crate::config::LayerConfig;
use crate::error::Result;

/// Local role, configuration, and the descriptor counter.
#[derive(Debug)]
pub struct ProcessContext {
    config: LayerConfig,
    // (id_high, id_low)
    counter: Mutex<(u64, u64)>,
}

impl ProcessContext {
    /// Validate `config` and seed the descriptor counter from the OS RNG.
    pub fn new(config: LayerConfig) -> Result<Self> {
        let mut rng = OsRng;
        Self::with_seed(config, rng.next_u64(), rng.next_u64())
    }

    /// Build a context with a chosen counter seed. Tests use this for
    /// predictable ids.
    pub fn with_seed(config: LayerConfig, id_high: u64, id_low: u64) -> Result<Self> {
        config.validate()?;
        debug!(role = %config.role, "payment context initialized");
        Ok(Self {
            config,
            counter: Mutex::new((id_high, id_low)),
        })
    }

    /// Role this process runs as.
    pub fn role(&self) -> PartyRole {
        self.config.role
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    /// Allocate a descriptor for a new remote endpoint. The low word
    /// increments and carries into the high word; the whole counter wraps.
    pub fn next_descriptor(&self, role: PartyRole) -> Descriptor {
        let mut counter = self.counter.lock();
        let (high, low) = *counter;
        let low_next = low.wrapping_add(1);
        let high_next = if low_next == 0 {
            high.wrapping_add(1)
        } else {
            high
        };
        *counter = (high_next, low_next);
        Descriptor::new(high, low, role)
    }
}
