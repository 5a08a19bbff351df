//! # Wallet Commitments over BN254
//!
//! A wallet commits to its public key and balance under one blinding value:
//!
//! ```text
//! C = k * G_key + v * G_value + r * H            (BN254/G1)
//! c = k * g_key + v * g_value + r * h   mod p    (Fr)
//! ```
//!
//! `k` is the wallet public key mapped into Fr, `v` the balance and `r` the
//! blinding. Both forms use the same witness. The point travels on the wire
//! for auditability; the scalar is what the transition circuit constrains,
//! since checking the point inside an R1CS over Fr would need non-native
//! field arithmetic.
//!
//! A second scalar commitment hides the previous wallet's signature under
//! its own blinding: `s = sig * g_sig + t * h_sig`. It ties the proof to a
//! signed ancestor. The signer knows `sig` and can solve for `t`, so `t`
//! must be drawn independently of `r`.

use anyhow::{Context, Result};
use ark_bn254::{Fr, G1Affine, G1Projective};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::UniformRand;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::Rng;
use std::ops::Mul;

use crate::config::{COMMITMENT_SIZE, FIELD_SIZE};

/// Map a signed balance into Fr. Negative values become their additive
/// inverse.
pub fn balance_to_field(value: i64) -> Fr {
    if value >= 0 {
        Fr::from(value as u64)
    } else {
        -Fr::from(value.unsigned_abs())
    }
}

/// Generators for both commitment forms.
///
/// Generated once per deployment alongside the proving key; nobody may
/// know the discrete-log relations between them.
#[derive(Clone, Debug, CanonicalSerialize, CanonicalDeserialize)]
pub struct CommitParams {
    pub g_key: G1Affine,
    pub g_value: G1Affine,
    pub h: G1Affine,

    pub g_key_scalar: Fr,
    pub g_value_scalar: Fr,
    pub h_scalar: Fr,

    /// Signature-commitment generators.
    pub g_sig_scalar: Fr,
    pub h_sig_scalar: Fr,
}

/// A wallet commitment in point and scalar form.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Commitment {
    pub point: G1Affine,
    pub scalar: Fr,
}

impl CommitParams {
    pub fn setup<R: Rng>(rng: &mut R) -> Self {
        let g_key = G1Projective::rand(rng).into_affine();
        let g_value = G1Projective::rand(rng).into_affine();
        let h = G1Projective::rand(rng).into_affine();
        debug_assert!(!g_key.is_zero() && !g_value.is_zero() && !h.is_zero());

        Self {
            g_key,
            g_value,
            h,
            g_key_scalar: Fr::rand(rng),
            g_value_scalar: Fr::rand(rng),
            h_scalar: Fr::rand(rng),
            g_sig_scalar: Fr::rand(rng),
            h_sig_scalar: Fr::rand(rng),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.serialize_compressed(&mut buf)
            .context("commit params serialization failed")?;
        Ok(buf)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::deserialize_compressed(data).context("invalid commit params bytes")
    }
}

/// Commit to `(wallet_key, balance)` under `blinding`.
pub fn commit(params: &CommitParams, wallet_key: Fr, balance: i64, blinding: Fr) -> Commitment {
    let v = balance_to_field(balance);
    let point =
        (params.g_key.mul(wallet_key) + params.g_value.mul(v) + params.h.mul(blinding)).into_affine();
    let scalar =
        wallet_key * params.g_key_scalar + v * params.g_value_scalar + blinding * params.h_scalar;
    Commitment { point, scalar }
}

/// Commit to a previous wallet signature (as a field element).
pub fn commit_signature(params: &CommitParams, signature: Fr, blinding: Fr) -> Fr {
    signature * params.g_sig_scalar + blinding * params.h_sig_scalar
}

/// Check an opening. Reveals the witness; audits and tests only.
pub fn verify_commitment(
    params: &CommitParams,
    commitment: &Commitment,
    wallet_key: Fr,
    balance: i64,
    blinding: Fr,
) -> bool {
    commit(params, wallet_key, balance, blinding) == *commitment
}

impl Commitment {
    /// Compressed point (32) followed by the scalar (32).
    pub fn to_bytes(&self) -> Result<[u8; COMMITMENT_SIZE]> {
        let mut buf = Vec::with_capacity(COMMITMENT_SIZE);
        self.serialize_compressed(&mut buf)
            .context("commitment serialization failed")?;
        buf.as_slice()
            .try_into()
            .context("commitment serialized to an unexpected width")
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::deserialize_compressed(data).context("invalid commitment bytes")
    }
}

/// Fixed-width encoding of a scalar.
pub fn field_to_bytes(value: &Fr) -> Result<[u8; FIELD_SIZE]> {
    let mut buf = Vec::with_capacity(FIELD_SIZE);
    value
        .serialize_compressed(&mut buf)
        .context("field serialization failed")?;
    buf.as_slice()
        .try_into()
        .context("field element serialized to an unexpected width")
}

pub fn field_from_bytes(data: &[u8]) -> Result<Fr> {
    Fr::deserialize_compressed(data).context("invalid field element bytes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn setup() -> (CommitParams, StdRng) {
        let mut rng = StdRng::seed_from_u64(42);
        (CommitParams::setup(&mut rng), rng)
    }

    #[test]
    fn commitment_is_deterministic() {
        let (params, mut rng) = setup();
        let k = Fr::rand(&mut rng);
        let r = Fr::rand(&mut rng);
        assert_eq!(commit(&params, k, 100, r), commit(&params, k, 100, r));
    }

    #[test]
    fn each_input_changes_the_commitment() {
        let (params, mut rng) = setup();
        let k = Fr::rand(&mut rng);
        let r = Fr::rand(&mut rng);
        let base = commit(&params, k, 100, r);
        assert_ne!(base, commit(&params, k, 101, r));
        assert_ne!(base, commit(&params, k + Fr::from(1u64), 100, r));
        assert_ne!(base, commit(&params, k, 100, r + Fr::from(1u64)));
    }

    #[test]
    fn opening_checks_every_witness() {
        let (params, mut rng) = setup();
        let k = Fr::rand(&mut rng);
        let r = Fr::rand(&mut rng);
        let c = commit(&params, k, -5, r);
        assert!(verify_commitment(&params, &c, k, -5, r));
        assert!(!verify_commitment(&params, &c, k, 5, r));
        assert!(!verify_commitment(&params, &c, Fr::rand(&mut rng), -5, r));
    }

    #[test]
    fn negative_balances_map_to_inverses() {
        assert_eq!(balance_to_field(-7) + balance_to_field(7), Fr::from(0u64));
        assert_eq!(balance_to_field(i64::MIN), -Fr::from(1u64 << 63));
    }

    #[test]
    fn wire_widths_are_fixed() {
        let (params, mut rng) = setup();
        let c = commit(&params, Fr::rand(&mut rng), 1, Fr::rand(&mut rng));
        let bytes = c.to_bytes().unwrap();
        assert_eq!(Commitment::from_bytes(&bytes).unwrap(), c);

        let f = Fr::rand(&mut rng);
        assert_eq!(field_from_bytes(&field_to_bytes(&f).unwrap()).unwrap(), f);
    }

    #[test]
    fn params_serialization_round_trip() {
        let (params, _) = setup();
        let restored = CommitParams::from_bytes(&params.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.g_key, params.g_key);
        assert_eq!(restored.h_sig_scalar, params.h_sig_scalar);
    }
}
