//! # Hash Chains
//!
//! Nanopayment tickets. The payer picks a random head, hashes it down to a
//! tail and publishes only the tail. Each ticket reveals the next preimage
//! towards the head; the relay checks it against the tail alone.
//!
//! ```text
//! chain[n-1] = seed (head)
//! chain[i]   = H(chain[i+1])
//! chain[0]   = tail
//! ```
//!
//! Indexing convention: `k` is the distance from the tail. `chain[k]`
//! reaches the tail after exactly `k` hash applications, so the ticket for
//! the k-th payment is `preimage(k)` and verifies with `verify(tail, p, k)`.

use crate::crypto::hash::sha256;
use crate::error::{PaymentError, Result};
use crate::token::payloads::Hash;

/// An immutable hash chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashChain {
    links: Vec<Hash>,
}

impl HashChain {
    /// Build a chain of `size` links ending in `seed`.
    pub fn build(size: usize, seed: Hash) -> Result<Self> {
        if size < 1 {
            return Err(PaymentError::InvalidSize(size));
        }
        let mut links = vec![[0u8; 32]; size];
        links[size - 1] = seed;
        for i in (0..size - 1).rev() {
            links[i] = sha256(&links[i + 1]);
        }
        Ok(Self { links })
    }

    /// The published end, `chain[0]`.
    pub fn tail(&self) -> &Hash {
        &self.links[0]
    }

    /// The secret seed, `chain[len-1]`.
    pub fn head(&self) -> &Hash {
        &self.links[self.links.len() - 1]
    }

    /// `chain[k]`, the preimage `k` hashes away from the tail.
    pub fn preimage(&self, k: usize) -> Option<&Hash> {
        self.links.get(k)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Always false; a chain has at least one link.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// `true` iff hashing `preimage` exactly `k` times yields `tail`.
pub fn verify(tail: &Hash, preimage: &Hash, k: usize) -> bool {
    let mut current = *preimage;
    for _ in 0..k {
        current = sha256(&current);
    }
    current == *tail
}

/// [`verify`] as a `Result`.
pub fn check(tail: &Hash, preimage: &Hash, k: usize) -> Result<()> {
    if verify(tail, preimage, k) {
        Ok(())
    } else {
        Err(PaymentError::ChainVerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    fn seed(rng: &mut StdRng) -> Hash {
        let mut out = [0u8; 32];
        rng.fill_bytes(&mut out);
        out
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(HashChain::build(0, [0u8; 32]), Err(PaymentError::InvalidSize(0))));
    }

    #[test]
    fn head_is_seed_and_tail_verifies() {
        let mut rng = StdRng::seed_from_u64(42);
        for size in [1usize, 2, 7, 100] {
            let s = seed(&mut rng);
            let chain = HashChain::build(size, s).unwrap();
            assert_eq!(chain.len(), size);
            assert_eq!(chain.head(), &s);
            assert!(verify(chain.tail(), &s, size - 1), "size {size}");
        }
    }

    #[test]
    fn single_link_chain_is_its_own_tail() {
        let chain = HashChain::build(1, [9u8; 32]).unwrap();
        assert_eq!(chain.tail(), chain.head());
        assert!(verify(chain.tail(), &[9u8; 32], 0));
    }

    #[test]
    fn every_link_verifies_at_its_index() {
        let mut rng = StdRng::seed_from_u64(42);
        let chain = HashChain::build(20, seed(&mut rng)).unwrap();
        for k in 0..chain.len() {
            let p = chain.preimage(k).unwrap();
            assert!(verify(chain.tail(), p, k));
            assert!(!verify(chain.tail(), p, k + 1));
        }
        assert!(chain.preimage(20).is_none());
    }

    #[test]
    fn flipped_byte_fails() {
        let mut rng = StdRng::seed_from_u64(42);
        let chain = HashChain::build(10, seed(&mut rng)).unwrap();
        let mut bad = *chain.preimage(4).unwrap();
        bad[17] ^= 0x01;
        assert!(!verify(chain.tail(), &bad, 4));
        assert!(matches!(check(chain.tail(), &bad, 4), Err(PaymentError::ChainVerificationFailed)));
        assert!(check(chain.tail(), chain.preimage(4).unwrap(), 4).is_ok());
    }
}
