//! # Groth16 Proof Verification
//!
//! Intermediaries check every wallet a payer or relay presents; the ledger
//! checks the wallets submitted at channel close. Verification is three
//! pairings and a five-term multi-scalar multiplication, independent of
//! circuit size.

use anyhow::{Context, Result};
use ark_bn254::Bn254;
use ark_groth16::{Groth16, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;

use super::circuit::TransitionPublic;
use super::commitment::CommitParams;
use super::prover::TransitionProof;

/// Verification key for the wallet transition circuit.
pub struct TransitionVerifier {
    vk: VerifyingKey<Bn254>,
    params: CommitParams,
}

impl TransitionVerifier {
    pub(crate) fn from_vk(vk: VerifyingKey<Bn254>, params: CommitParams) -> Self {
        Self { vk, params }
    }

    pub fn commit_params(&self) -> &CommitParams {
        &self.params
    }

    /// `Ok(false)` for a well-formed proof of a different statement; `Err`
    /// only if the proof or key cannot be processed.
    pub fn verify(&self, proof: &TransitionProof, public: &TransitionPublic) -> Result<bool> {
        let ark_proof = proof.to_ark_proof()?;
        Groth16::<Bn254>::verify(&self.vk, &public.inputs(), &ark_proof)
            .context("Groth16 verification algorithm failed")
    }

    pub fn vk_to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.vk
            .serialize_compressed(&mut buf)
            .context("verification key serialization failed")?;
        Ok(buf)
    }

    pub fn vk_from_bytes(data: &[u8], params: CommitParams) -> Result<Self> {
        let vk = VerifyingKey::<Bn254>::deserialize_compressed(data)
            .context("failed to deserialize verification key")?;
        Ok(Self { vk, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zkp::circuit::TransitionWitness;
    use crate::zkp::commitment::{commit, commit_signature};
    use crate::zkp::prover::TransitionProver;
    use ark_bn254::Fr;
    use ark_ff::UniformRand;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn proved(rng: &mut StdRng) -> (TransitionProver, TransitionVerifier, TransitionPublic, TransitionProof) {
        let (prover, verifier) = TransitionProver::setup(rng).unwrap();
        let params = prover.commit_params();
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
        let proof = prover.prove(public.clone(), witness, rng).unwrap();
        (prover, verifier, public, proof)
    }

    #[test]
    fn valid_proof_verifies() {
        let mut rng = StdRng::seed_from_u64(42);
        let (_, verifier, public, proof) = proved(&mut rng);
        assert!(verifier.verify(&proof, &public).unwrap());
    }

    #[test]
    fn any_changed_public_input_fails() {
        let mut rng = StdRng::seed_from_u64(42);
        let (_, verifier, public, proof) = proved(&mut rng);

        let mut other = public.clone();
        other.delta = 31;
        assert!(!verifier.verify(&proof, &other).unwrap());

        let mut other = public.clone();
        other.counterparty_key += Fr::from(1u64);
        assert!(!verifier.verify(&proof, &other).unwrap());

        let mut other = public.clone();
        other.old_wallet_key += Fr::from(1u64);
        assert!(!verifier.verify(&proof, &other).unwrap());

        let mut other = public;
        other.signature_commitment += Fr::from(1u64);
        assert!(!verifier.verify(&proof, &other).unwrap());
    }

    #[test]
    fn vk_serialization_round_trip() {
        let mut rng = StdRng::seed_from_u64(42);
        let (prover, verifier, public, proof) = proved(&mut rng);
        let bytes = verifier.vk_to_bytes().unwrap();
        let restored =
            TransitionVerifier::vk_from_bytes(&bytes, prover.commit_params().clone()).unwrap();
        assert!(restored.verify(&proof, &public).unwrap());
    }
}
