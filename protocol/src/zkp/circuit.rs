//! # Wallet Transition Circuit
//!
//! The statement proved when a wallet is derived from a signed ancestor:
//!
//! ```text
//! "I know (k, v, r, σ, t) such that:
//!     1. k * g_key + v * g_value + r * h = c      (new wallet commitment)
//!     2. σ * g_sig + t * h_sig = s                (ancestor signature commitment)"
//! ```
//!
//! with `k` the new wallet key, `v` the new balance, `r` the commitment
//! blinding, `σ` the ancestor's counterparty signature and `t` a separate
//! signature blinding, all mapped into Fr. `σ` is known to the counterparty,
//! so `t` must never equal `r`: whoever knows `σ` can open `s` for its
//! blinding. The counterparty key, the value delta and the ancestor wallet
//! key are public inputs as well; a product gate over them binds the proof
//! to the payment it was made for.
//!
//! ## Public inputs (in order)
//!
//! | index | value |
//! |-------|-------|
//! | 0     | counterparty public key (hashed to Fr) |
//! | 1     | value delta (signed, in Fr) |
//! | 2     | ancestor wallet public key (hashed to Fr) |
//! | 3     | commitment scalar `c` |
//! | 4     | signature commitment `s` |

use ark_bn254::Fr;
use ark_r1cs_std::{alloc::AllocVar, eq::EqGadget, fields::fp::FpVar, R1CSVar};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use super::commitment::{balance_to_field, CommitParams};

/// Values the verifier sees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionPublic {
    pub counterparty_key: Fr,
    pub delta: i64,
    pub old_wallet_key: Fr,
    pub commitment: Fr,
    pub signature_commitment: Fr,
}

impl TransitionPublic {
    /// Input vector in allocation order.
    pub fn inputs(&self) -> Vec<Fr> {
        vec![
            self.counterparty_key,
            balance_to_field(self.delta),
            self.old_wallet_key,
            self.commitment,
            self.signature_commitment,
        ]
    }
}

/// Values only the prover knows.
#[derive(Clone, Debug)]
pub struct TransitionWitness {
    pub wallet_key: Fr,
    pub balance: i64,
    pub blinding: Fr,
    pub old_signature: Fr,
    /// Blinding of the signature commitment, independent of `blinding`.
    pub signature_blinding: Fr,
}

/// R1CS circuit for one wallet transition. `None` slots mean key
/// generation mode.
#[derive(Clone)]
pub struct WalletTransitionCircuit {
    g_key: Fr,
    g_value: Fr,
    h: Fr,
    g_sig: Fr,
    h_sig: Fr,

    public: Option<TransitionPublic>,
    witness: Option<TransitionWitness>,
}

impl WalletTransitionCircuit {
    pub fn new(params: &CommitParams, public: TransitionPublic, witness: TransitionWitness) -> Self {
        Self {
            public: Some(public),
            witness: Some(witness),
            ..Self::blank(params)
        }
    }

    pub fn blank(params: &CommitParams) -> Self {
        Self {
            g_key: params.g_key_scalar,
            g_value: params.g_value_scalar,
            h: params.h_scalar,
            g_sig: params.g_sig_scalar,
            h_sig: params.h_sig_scalar,
            public: None,
            witness: None,
        }
    }
}

impl ConstraintSynthesizer<Fr> for WalletTransitionCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let public = self.public.map(|p| p.inputs());
        let counterparty_var = FpVar::<Fr>::new_input(ark_relations::ns!(cs, "counterparty_key"), || {
            public_input(&public, 0)
        })?;
        let delta_var =
            FpVar::<Fr>::new_input(ark_relations::ns!(cs, "delta"), || public_input(&public, 1))?;
        let old_wallet_var = FpVar::<Fr>::new_input(ark_relations::ns!(cs, "old_wallet_key"), || {
            public_input(&public, 2)
        })?;
        let commitment_var =
            FpVar::<Fr>::new_input(ark_relations::ns!(cs, "commitment"), || public_input(&public, 3))?;
        let sig_commitment_var =
            FpVar::<Fr>::new_input(ark_relations::ns!(cs, "signature_commitment"), || {
                public_input(&public, 4)
            })?;

        let witness = self.witness.as_ref();
        let wallet_key_var = FpVar::<Fr>::new_witness(ark_relations::ns!(cs, "wallet_key"), || {
            witness
                .map(|w| w.wallet_key)
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
        let balance_var = FpVar::<Fr>::new_witness(ark_relations::ns!(cs, "balance"), || {
            witness
                .map(|w| balance_to_field(w.balance))
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
        let blinding_var = FpVar::<Fr>::new_witness(ark_relations::ns!(cs, "blinding"), || {
            witness
                .map(|w| w.blinding)
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
        let old_sig_var = FpVar::<Fr>::new_witness(ark_relations::ns!(cs, "old_signature"), || {
            witness
                .map(|w| w.old_signature)
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
        let sig_blinding_var =
            FpVar::<Fr>::new_witness(ark_relations::ns!(cs, "signature_blinding"), || {
                witness
                    .map(|w| w.signature_blinding)
                    .ok_or(SynthesisError::AssignmentMissing)
            })?;

        let g_key = FpVar::<Fr>::new_constant(ark_relations::ns!(cs, "g_key"), self.g_key)?;
        let g_value = FpVar::<Fr>::new_constant(ark_relations::ns!(cs, "g_value"), self.g_value)?;
        let h = FpVar::<Fr>::new_constant(ark_relations::ns!(cs, "h"), self.h)?;
        let g_sig = FpVar::<Fr>::new_constant(ark_relations::ns!(cs, "g_sig"), self.g_sig)?;
        let h_sig = FpVar::<Fr>::new_constant(ark_relations::ns!(cs, "h_sig"), self.h_sig)?;

        // 1. new wallet commitment
        let computed = &wallet_key_var * &g_key + &balance_var * &g_value + &blinding_var * &h;
        computed.enforce_equal(&commitment_var)?;

        // 2. ancestor signature commitment
        let computed_sig = &old_sig_var * &g_sig + &sig_blinding_var * &h_sig;
        computed_sig.enforce_equal(&sig_commitment_var)?;

        // 3. payment binding: the three payment inputs must appear in a
        // constraint or the verifying key ignores them
        let product = &(&counterparty_var + &delta_var) * &old_wallet_var;
        let binding = FpVar::<Fr>::new_witness(ark_relations::ns!(cs, "payment_binding"), || {
            product.value()
        })?;
        product.enforce_equal(&binding)?;

        Ok(())
    }
}

fn public_input(inputs: &Option<Vec<Fr>>, index: usize) -> Result<Fr, SynthesisError> {
    inputs
        .as_ref()
        .and_then(|v| v.get(index).copied())
        .ok_or(SynthesisError::AssignmentMissing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zkp::commitment::{commit, commit_signature};
    use ark_ff::UniformRand;
    use ark_relations::r1cs::ConstraintSystem;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn statement(rng: &mut StdRng, params: &CommitParams) -> (TransitionPublic, TransitionWitness) {
        let witness = TransitionWitness {
            wallet_key: Fr::rand(rng),
            balance: 130,
            blinding: Fr::rand(rng),
            old_signature: Fr::rand(rng),
            signature_blinding: Fr::rand(rng),
        };
        let public = TransitionPublic {
            counterparty_key: Fr::rand(rng),
            delta: 30,
            old_wallet_key: Fr::rand(rng),
            commitment: commit(params, witness.wallet_key, witness.balance, witness.blinding).scalar,
            signature_commitment: commit_signature(
                params,
                witness.old_signature,
                witness.signature_blinding,
            ),
        };
        (public, witness)
    }

    fn satisfied(params: &CommitParams, public: TransitionPublic, witness: TransitionWitness) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        WalletTransitionCircuit::new(params, public, witness)
            .generate_constraints(cs.clone())
            .unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn honest_witness_satisfies() {
        let mut rng = StdRng::seed_from_u64(42);
        let params = CommitParams::setup(&mut rng);
        let (public, witness) = statement(&mut rng, &params);
        assert!(satisfied(&params, public, witness));
    }

    #[test]
    fn wrong_balance_fails() {
        let mut rng = StdRng::seed_from_u64(42);
        let params = CommitParams::setup(&mut rng);
        let (public, mut witness) = statement(&mut rng, &params);
        witness.balance += 1;
        assert!(!satisfied(&params, public, witness));
    }

    #[test]
    fn wrong_ancestor_signature_fails() {
        let mut rng = StdRng::seed_from_u64(42);
        let params = CommitParams::setup(&mut rng);
        let (public, mut witness) = statement(&mut rng, &params);
        witness.old_signature += Fr::from(1u64);
        assert!(!satisfied(&params, public, witness));
    }

    #[test]
    fn signature_blinding_is_its_own_witness() {
        let mut rng = StdRng::seed_from_u64(42);
        let params = CommitParams::setup(&mut rng);
        let (public, mut witness) = statement(&mut rng, &params);
        witness.signature_blinding = witness.blinding;
        assert!(!satisfied(&params, public, witness));
    }

    #[test]
    fn public_inputs_are_five_in_order() {
        let mut rng = StdRng::seed_from_u64(42);
        let params = CommitParams::setup(&mut rng);
        let (public, witness) = statement(&mut rng, &params);
        let inputs = public.inputs();
        assert_eq!(inputs.len(), 5);
        assert_eq!(inputs[1], Fr::from(30u64));
        assert_eq!(inputs[3], public.commitment);

        let cs = ConstraintSystem::<Fr>::new_ref();
        WalletTransitionCircuit::new(&params, public, witness)
            .generate_constraints(cs.clone())
            .unwrap();
        // the constant-one input plus five
        assert_eq!(cs.num_instance_variables(), 6);
    }

    #[test]
    fn negative_delta_is_expressible() {
        let mut rng = StdRng::seed_from_u64(42);
        let params = CommitParams::setup(&mut rng);
        let (mut public, witness) = statement(&mut rng, &params);
        public.delta = -30;
        assert!(satisfied(&params, public, witness));
    }
}
