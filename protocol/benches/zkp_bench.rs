// Wallet-transition benchmarks.
//
// Groth16 setup, Pedersen commitment, one full wallet transition (fresh
// keys plus proof) and transition verification over BN254.

use criterion::{criterion_group, criterion_main, Criterion};

use ark_bn254::Fr;
use ark_ff::UniformRand;
use rand::rngs::StdRng;
use rand::SeedableRng;

use paycell_protocol::crypto::PayKeypair;
use paycell_protocol::wallet::{self, Wallet};
use paycell_protocol::zkp::commitment;
use paycell_protocol::zkp::TransitionProver;

fn bench_groth16_setup(c: &mut Criterion) {
    c.bench_function("zkp/groth16_setup", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(42);
            TransitionProver::setup(&mut rng).unwrap()
        });
    });
}

fn bench_pedersen_commit(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let (prover, _) = TransitionProver::setup(&mut rng).unwrap();
    let key = Fr::rand(&mut rng);
    let blinding = Fr::rand(&mut rng);

    c.bench_function("zkp/pedersen_commit", |b| {
        b.iter(|| commitment::commit(prover.commit_params(), key, 1_000_000, blinding));
    });
}

fn bench_wallet_transition(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let (prover, _) = TransitionProver::setup(&mut rng).unwrap();
    let intermediary = PayKeypair::generate_with(&mut rng);
    let old = Wallet::open(prover.commit_params(), 0, 10_000, intermediary.public_key(), &mut rng)
        .countersign(&intermediary)
        .unwrap();

    c.bench_function("zkp/wallet_transition", |b| {
        b.iter(|| wallet::transition(&prover, 5, &old, &mut rng).unwrap());
    });
}

fn bench_transition_verify(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let (prover, verifier) = TransitionProver::setup(&mut rng).unwrap();
    let intermediary = PayKeypair::generate_with(&mut rng);
    let old = Wallet::open(prover.commit_params(), 0, 10_000, intermediary.public_key(), &mut rng)
        .countersign(&intermediary)
        .unwrap();
    let new = wallet::transition(&prover, 5, &old, &mut rng)
        .unwrap()
        .countersign(&intermediary)
        .unwrap();
    let public = new.public_part().unwrap();
    let old_key = *old.public_key().as_bytes();
    let counterparty = intermediary.public_key();

    c.bench_function("zkp/transition_verify", |b| {
        b.iter(|| wallet::verify_transition(&verifier, &counterparty, 5, &old_key, &public).unwrap());
    });
}

criterion_group!(
    benches,
    bench_groth16_setup,
    bench_pedersen_commit,
    bench_wallet_transition,
    bench_transition_verify,
);
criterion_main!(benches);
