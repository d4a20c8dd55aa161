use criterion::{black_box, criterion_group, criterion_main, Criterion};

use clt_engine::primes::next_prime;
use clt_engine::{encode, is_zero, CltState, CrtTree, EncodingRng};
use num_bigint::BigUint;

/// Benchmark CRT reconstruction over a 64-leaf tree of 60-bit primes.
fn bench_crt_combine(c: &mut Criterion) {
    let rng = EncodingRng::from_seed([1u8; 32]);
    let moduli: Vec<BigUint> = (0..64)
        .map(|_| next_prime(&rng.random_bits(60), &rng))
        .collect();
    let tree = CrtTree::build(&moduli).expect("distinct 60-bit primes");
    let residues: Vec<BigUint> = moduli.iter().map(|m| rng.random_below(m)).collect();

    c.bench_function("crt combine 64 x 60-bit", |bencher| {
        bencher.iter(|| tree.combine(black_box(&residues)).unwrap())
    });
}

/// Benchmark encoding at small parameters (lambda=8, kappa=2).
fn bench_encode(c: &mut Criterion) {
    let state = CltState::generate(2, 8, 2, &[1, 1]).expect("state generation");
    let inputs = [BigUint::from(1u32)];

    c.bench_function("encode lambda=8", |bencher| {
        bencher.iter(|| encode(&state, black_box(&inputs), &[1, 1]).unwrap())
    });
}

/// Benchmark the zero test against a fresh top-level encoding.
fn bench_zero_test(c: &mut Criterion) {
    let state = CltState::generate(2, 8, 2, &[1, 1]).expect("state generation");
    let pp = state.public_params();
    let value = encode(&state, &[BigUint::from(0u32)], &[1, 1]).unwrap();

    c.bench_function("zero test lambda=8", |bencher| {
        bencher.iter(|| is_zero(&pp, black_box(&value)))
    });
}

criterion_group!(benches, bench_crt_combine, bench_encode, bench_zero_test);
criterion_main!(benches);
