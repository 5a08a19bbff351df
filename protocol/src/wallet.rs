//! # Channel Wallets
//!
//! A [`Wallet`] is one endpoint's state in a micropayment channel at one
//! point in time. Wallets are values: a payment produces a new wallet via
//! [`transition`] and leaves the old one untouched, since the old wallet is
//! the evidence a channel close needs.
//!
//! ## Lifecycle
//!
//! ```text
//! open ──countersign──▶ signed ──transition(delta)──▶ unsigned ──countersign──▶ signed ...
//! ```
//!
//! Each wallet gets a fresh keypair and two independent blindings, one for
//! the balance commitment and one for the signature commitment. The
//! counterparty (the
//! intermediary) signs `wallet_public_key ‖ commitment`; that signature is
//! the hidden witness the next transition proves knowledge of.
//!
//! Balances are signed and unclamped. A negative balance is for the
//! calling controller to reject; this engine only refuses to overflow.

use std::sync::Arc;

use ark_bn254::Fr;
use ark_ff::UniformRand;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::debug;

use crate::config::ZKP_SIZE;
use crate::crypto::hash::hash_to_field;
use crate::crypto::keys::{PayKeypair, PayPublicKey, PaySignature};
use crate::crypto::pool::CryptoPool;
use crate::crypto::signatures::verify_raw;
use crate::error::{PaymentError, Result};
use crate::token::payloads::{PublicKeyBytes, WalletPublic};
use crate::zkp::commitment::{commit, commit_signature, field_from_bytes, field_to_bytes};
use crate::zkp::{
    CommitParams, Commitment, TransitionProof, TransitionProver, TransitionPublic,
    TransitionVerifier, TransitionWitness,
};

fn transition_error(e: impl std::fmt::Display) -> PaymentError {
    PaymentError::WalletTransitionError(e.to_string())
}

/// One endpoint's committed channel state.
#[derive(Debug, Clone)]
pub struct Wallet {
    external_balance: i64,
    internal_balance: i64,
    keypair: PayKeypair,
    counterparty: PayPublicKey,
    blinding: Fr,
    signature_blinding: Fr,
    commitment: Commitment,
    signature_commitment: Fr,
    /// `None` for a genesis wallet.
    proof: Option<TransitionProof>,
    /// Counterparty signature, once countersigned.
    signature: Option<PaySignature>,
}

impl Wallet {
    /// Genesis wallet for a new channel. Carries no proof; its signature
    /// commitment hides the zero signature.
    pub fn open<R: RngCore + CryptoRng>(
        params: &CommitParams,
        external_balance: i64,
        internal_balance: i64,
        counterparty: PayPublicKey,
        rng: &mut R,
    ) -> Self {
        let keypair = PayKeypair::generate_with(rng);
        let blinding = Fr::rand(rng);
        let signature_blinding = Fr::rand(rng);
        let wallet_key = hash_to_field(keypair.public_key().as_bytes());
        Self {
            external_balance,
            internal_balance,
            counterparty,
            commitment: commit(params, wallet_key, external_balance, blinding),
            signature_commitment: commit_signature(params, Fr::from(0u64), signature_blinding),
            keypair,
            blinding,
            signature_blinding,
            proof: None,
            signature: None,
        }
    }

    pub fn external_balance(&self) -> i64 {
        self.external_balance
    }

    pub fn internal_balance(&self) -> i64 {
        self.internal_balance
    }

    pub fn public_key(&self) -> PayPublicKey {
        self.keypair.public_key()
    }

    /// Wallet keypair, used to sign channel-close messages.
    pub fn keypair(&self) -> &PayKeypair {
        &self.keypair
    }

    pub fn counterparty(&self) -> &PayPublicKey {
        &self.counterparty
    }

    pub fn blinding(&self) -> Fr {
        self.blinding
    }

    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }

    pub fn signature_commitment(&self) -> Fr {
        self.signature_commitment
    }

    pub fn proof(&self) -> Option<&TransitionProof> {
        self.proof.as_ref()
    }

    pub fn signature(&self) -> Option<&PaySignature> {
        self.signature.as_ref()
    }

    /// The wallet key as the circuit sees it.
    pub fn wallet_key_field(&self) -> Fr {
        hash_to_field(self.keypair.public_key().as_bytes())
    }

    /// `wallet_public_key ‖ commitment`, the bytes the counterparty signs.
    pub fn signed_message(&self) -> Result<Vec<u8>> {
        let commitment = self.commitment.to_bytes().map_err(transition_error)?;
        Ok(wallet_message(self.keypair.public_key().as_bytes(), &commitment))
    }

    /// A copy of this wallet carrying `counterparty`'s signature.
    pub fn countersign(&self, counterparty: &PayKeypair) -> Result<Self> {
        if counterparty.public_key() != self.counterparty {
            return Err(PaymentError::WalletTransitionError(
                "countersigning key is not the wallet's counterparty".into(),
            ));
        }
        let signature = counterparty.sign(&self.signed_message()?);
        Ok(Self {
            signature: Some(signature),
            ..self.clone()
        })
    }

    /// `true` iff the wallet carries a valid counterparty signature.
    pub fn verify_signature(&self) -> bool {
        match (&self.signature, self.signed_message()) {
            (Some(sig), Ok(msg)) => self.counterparty.verify(&msg, sig),
            _ => false,
        }
    }

    /// `true` iff the commitment opens to this wallet's key, external
    /// balance and blinding.
    pub fn decommits(&self, params: &CommitParams) -> bool {
        crate::zkp::commitment::verify_commitment(
            params,
            &self.commitment,
            self.wallet_key_field(),
            self.external_balance,
            self.blinding,
        )
    }

    /// The part that goes on the wire. Only signed wallets are published;
    /// a genesis wallet sends an all-zero proof.
    pub fn public_part(&self) -> Result<WalletPublic> {
        let signature = self
            .signature
            .as_ref()
            .ok_or_else(|| PaymentError::WalletTransitionError("wallet is not countersigned".into()))?;
        Ok(WalletPublic {
            wallet_public_key: *self.keypair.public_key().as_bytes(),
            commitment: self.commitment.to_bytes().map_err(transition_error)?,
            signature_commitment: field_to_bytes(&self.signature_commitment)
                .map_err(transition_error)?,
            proof: self
                .proof
                .as_ref()
                .map(TransitionProof::to_bytes)
                .unwrap_or([0u8; ZKP_SIZE]),
            signature: *signature.as_bytes(),
        })
    }
}

fn wallet_message(wallet_public_key: &PublicKeyBytes, commitment: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(wallet_public_key.len() + commitment.len());
    msg.extend_from_slice(wallet_public_key);
    msg.extend_from_slice(commitment);
    msg
}

/// Derive the wallet that results from paying `delta` out of `old`.
///
/// `external_balance` grows by `delta`, `internal_balance` shrinks by it.
/// All or nothing: any failure leaves no wallet behind.
pub fn transition<R: RngCore + CryptoRng>(
    prover: &TransitionProver,
    delta: i64,
    old: &Wallet,
    rng: &mut R,
) -> Result<Wallet> {
    let old_signature = old.signature.as_ref().ok_or_else(|| {
        PaymentError::WalletTransitionError("ancestor wallet is not countersigned".into())
    })?;
    let external_balance = old
        .external_balance
        .checked_add(delta)
        .ok_or_else(|| PaymentError::WalletTransitionError("external balance overflow".into()))?;
    let internal_balance = old
        .internal_balance
        .checked_sub(delta)
        .ok_or_else(|| PaymentError::WalletTransitionError("internal balance overflow".into()))?;

    let params = prover.commit_params();
    let keypair = PayKeypair::generate_with(rng);
    let blinding = Fr::rand(rng);
    let signature_blinding = Fr::rand(rng);
    let wallet_key = hash_to_field(keypair.public_key().as_bytes());
    let old_sig_field = hash_to_field(old_signature.as_bytes());

    let commitment = commit(params, wallet_key, external_balance, blinding);
    let signature_commitment = commit_signature(params, old_sig_field, signature_blinding);

    let public = TransitionPublic {
        counterparty_key: hash_to_field(old.counterparty.as_bytes()),
        delta,
        old_wallet_key: old.wallet_key_field(),
        commitment: commitment.scalar,
        signature_commitment,
    };
    let witness = TransitionWitness {
        wallet_key,
        balance: external_balance,
        blinding,
        old_signature: old_sig_field,
        signature_blinding,
    };
    let proof = prover
        .prove(public, witness, rng)
        .map_err(|e| PaymentError::WalletTransitionError(format!("{e:#}")))?;

    debug!(delta, external_balance, internal_balance, "wallet transitioned");

    Ok(Wallet {
        external_balance,
        internal_balance,
        keypair,
        counterparty: old.counterparty,
        blinding,
        signature_blinding,
        commitment,
        signature_commitment,
        proof: Some(proof),
        signature: None,
    })
}

/// [`transition`] on the crypto pool, with OS randomness.
pub async fn transition_in_pool(
    pool: &CryptoPool,
    prover: Arc<TransitionProver>,
    delta: i64,
    old: Wallet,
) -> Result<Wallet> {
    pool.run(move || transition(&prover, delta, &old, &mut OsRng))
        .await
}

/// Check a published wallet's transition proof against the payment it
/// claims: paying `delta` out of the wallet keyed `old_wallet_public_key`
/// in a channel with `counterparty`.
pub fn verify_transition(
    verifier: &TransitionVerifier,
    counterparty: &PayPublicKey,
    delta: i64,
    old_wallet_public_key: &PublicKeyBytes,
    wallet: &WalletPublic,
) -> Result<()> {
    let commitment = Commitment::from_bytes(&wallet.commitment).map_err(transition_error)?;
    let signature_commitment =
        field_from_bytes(&wallet.signature_commitment).map_err(transition_error)?;
    let proof = TransitionProof::from_bytes(&wallet.proof).map_err(transition_error)?;
    let public = TransitionPublic {
        counterparty_key: hash_to_field(counterparty.as_bytes()),
        delta,
        old_wallet_key: hash_to_field(old_wallet_public_key),
        commitment: commitment.scalar,
        signature_commitment,
    };
    match verifier.verify(&proof, &public) {
        Ok(true) => Ok(()),
        Ok(false) => Err(PaymentError::WalletTransitionError("transition proof rejected".into())),
        Err(e) => Err(PaymentError::WalletTransitionError(format!("{e:#}"))),
    }
}

/// Check the counterparty signature on a published wallet.
pub fn verify_wallet_signature(counterparty: &PayPublicKey, wallet: &WalletPublic) -> Result<()> {
    let msg = wallet_message(&wallet.wallet_public_key, &wallet.commitment);
    verify_raw(counterparty.as_bytes(), &msg, &wallet.signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zkp::commitment::{balance_to_field, verify_commitment};
    use ark_ff::Field;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        rng: StdRng,
        prover: TransitionProver,
        verifier: TransitionVerifier,
        intermediary: PayKeypair,
    }

    fn fixture() -> Fixture {
        let mut rng = StdRng::seed_from_u64(42);
        let (prover, verifier) = TransitionProver::setup(&mut rng).unwrap();
        let intermediary = PayKeypair::generate_with(&mut rng);
        Fixture {
            rng,
            prover,
            verifier,
            intermediary,
        }
    }

    fn signed_genesis(f: &mut Fixture, external: i64, internal: i64) -> Wallet {
        Wallet::open(
            f.prover.commit_params(),
            external,
            internal,
            f.intermediary.public_key(),
            &mut f.rng,
        )
        .countersign(&f.intermediary)
        .unwrap()
    }

    #[test]
    fn transition_moves_delta_between_balances() {
        let mut f = fixture();
        let old = signed_genesis(&mut f, 100, 100);
        let new = transition(&f.prover, 30, &old, &mut f.rng).unwrap();

        assert_eq!(new.external_balance(), 130);
        assert_eq!(new.internal_balance(), 70);
        assert_ne!(new.public_key(), old.public_key());
        assert!(new.decommits(f.prover.commit_params()));
        assert!(verify_commitment(
            f.prover.commit_params(),
            new.commitment(),
            new.wallet_key_field(),
            130,
            new.blinding()
        ));
        assert!(new.signature().is_none());

        // the ancestor is untouched
        assert_eq!(old.external_balance(), 100);
        assert!(old.verify_signature());
    }

    #[test]
    fn published_wallet_verifies_against_its_payment() {
        let mut f = fixture();
        let old = signed_genesis(&mut f, 0, 50);
        let new = transition(&f.prover, 5, &old, &mut f.rng)
            .unwrap()
            .countersign(&f.intermediary)
            .unwrap();
        let public = new.public_part().unwrap();
        let old_key = *old.public_key().as_bytes();

        let counterparty = f.intermediary.public_key();
        verify_transition(&f.verifier, &counterparty, 5, &old_key, &public).unwrap();
        verify_wallet_signature(&counterparty, &public).unwrap();

        assert!(verify_transition(&f.verifier, &counterparty, 6, &old_key, &public).is_err());
        assert!(verify_transition(&f.verifier, &counterparty, 5, &[1u8; 32], &public).is_err());
    }

    #[test]
    fn tampered_commitment_breaks_the_proof() {
        let mut f = fixture();
        let old = signed_genesis(&mut f, 0, 50);
        let new = transition(&f.prover, 5, &old, &mut f.rng)
            .unwrap()
            .countersign(&f.intermediary)
            .unwrap();
        let mut public = new.public_part().unwrap();

        // a commitment to a different hidden balance
        let forged = commit(
            f.prover.commit_params(),
            new.wallet_key_field(),
            new.external_balance() + 1,
            new.blinding(),
        );
        public.commitment = forged.to_bytes().unwrap();
        let counterparty = f.intermediary.public_key();
        assert!(verify_transition(&f.verifier, &counterparty, 5, old.public_key().as_bytes(), &public)
            .is_err());
    }

    #[test]
    fn unsigned_ancestor_is_refused() {
        let mut f = fixture();
        let unsigned = Wallet::open(
            f.prover.commit_params(),
            0,
            10,
            f.intermediary.public_key(),
            &mut f.rng,
        );
        assert!(matches!(
            transition(&f.prover, 1, &unsigned, &mut f.rng),
            Err(PaymentError::WalletTransitionError(_))
        ));
        assert!(unsigned.public_part().is_err());
    }

    #[test]
    fn overflow_is_an_error_but_negative_is_not() {
        let mut f = fixture();
        let old = signed_genesis(&mut f, i64::MAX, 0);
        assert!(transition(&f.prover, 1, &old, &mut f.rng).is_err());

        let old = signed_genesis(&mut f, 0, 10);
        let overdrawn = transition(&f.prover, 25, &old, &mut f.rng).unwrap();
        assert_eq!(overdrawn.internal_balance(), -15);
    }

    #[test]
    fn only_the_counterparty_can_countersign() {
        let mut f = fixture();
        let stranger = PayKeypair::generate_with(&mut f.rng);
        let wallet = Wallet::open(
            f.prover.commit_params(),
            0,
            10,
            f.intermediary.public_key(),
            &mut f.rng,
        );
        assert!(wallet.countersign(&stranger).is_err());
        assert!(!wallet.verify_signature());
    }

    /// Solve the published signature commitment for its blinding, assume the
    /// balance commitment shares it, and open the balance from there.
    fn balance_if_blindings_were_shared(
        params: &CommitParams,
        public: &WalletPublic,
        ancestor_signature: Fr,
    ) -> Fr {
        let s = field_from_bytes(&public.signature_commitment).unwrap();
        let c = Commitment::from_bytes(&public.commitment).unwrap().scalar;
        let k = hash_to_field(&public.wallet_public_key);
        let r = (s - ancestor_signature * params.g_sig_scalar) * params.h_sig_scalar.inverse().unwrap();
        (c - k * params.g_key_scalar - r * params.h_scalar) * params.g_value_scalar.inverse().unwrap()
    }

    #[test]
    fn published_fields_do_not_open_the_balance() {
        let mut f = fixture();
        let params = f.prover.commit_params().clone();

        let genesis = signed_genesis(&mut f, 4351, 0);
        assert_ne!(genesis.blinding(), genesis.signature_blinding);
        let public = genesis.public_part().unwrap();
        assert_ne!(
            balance_if_blindings_were_shared(&params, &public, Fr::from(0u64)),
            balance_to_field(4351)
        );

        let next = transition(&f.prover, 9, &genesis, &mut f.rng)
            .unwrap()
            .countersign(&f.intermediary)
            .unwrap();
        // the counterparty signed the ancestor, so it knows this value
        let ancestor_signature = hash_to_field(genesis.signature().unwrap().as_bytes());
        assert_ne!(
            balance_if_blindings_were_shared(&params, &next.public_part().unwrap(), ancestor_signature),
            balance_to_field(4360)
        );
        // the proof still verifies with the blindings kept apart
        verify_transition(
            &f.verifier,
            &f.intermediary.public_key(),
            9,
            genesis.public_key().as_bytes(),
            &next.public_part().unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn wallets_with_different_balances_resist_the_same_opening() {
        let mut f = fixture();
        let poor = signed_genesis(&mut f, 1, 0);
        let rich = signed_genesis(&mut f, 1_000_000, 0);
        let params = f.prover.commit_params().clone();

        for wallet in [&poor, &rich] {
            let public = wallet.public_part().unwrap();
            let guess = balance_if_blindings_were_shared(&params, &public, Fr::from(0u64));
            assert_ne!(guess, balance_to_field(wallet.external_balance()));
        }
    }

    #[tokio::test]
    async fn transition_runs_on_the_pool() {
        let mut f = fixture();
        let old = signed_genesis(&mut f, 100, 100);
        let pool = CryptoPool::new(2);
        let prover = Arc::new(f.prover);
        let new = transition_in_pool(&pool, prover, 30, old).await.unwrap();
        assert_eq!(new.internal_balance(), 70);
    }
}
