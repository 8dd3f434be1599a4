//! Benchmarks for HD derivation and pool key signing.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use neo_mixer_crypto::{hardened, mixer_derivation_path, ExtendedKey};

fn bench_master_key(c: &mut Criterion) {
    let seed = [0x5au8; 32];
    c.bench_function("master_from_seed", |b| {
        b.iter(|| black_box(ExtendedKey::from_seed(black_box(&seed)).unwrap()))
    });
}

fn bench_derive_child(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive_child");
    let master = ExtendedKey::from_seed(&[0x5au8; 32]).unwrap();
    let public = master.neuter();

    group.bench_function("private_normal", |b| {
        b.iter(|| black_box(master.derive_child(black_box(7)).unwrap()))
    });
    group.bench_function("private_hardened", |b| {
        b.iter(|| black_box(master.derive_child(black_box(hardened(7))).unwrap()))
    });
    group.bench_function("public_normal", |b| {
        b.iter(|| black_box(public.derive_child(black_box(7)).unwrap()))
    });

    group.finish();
}

fn bench_mixer_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixer_path");
    let master = ExtendedKey::from_seed(&[0x5au8; 32]).unwrap();

    for index in [1u32, 1_000, 1_000_000] {
        let path = mixer_derivation_path(index).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(index), &path, |b, path| {
            b.iter(|| black_box(master.derive_path(path).unwrap()))
        });
    }

    let key = master.derive_path(mixer_derivation_path(1).unwrap()).unwrap();
    let message = b"Hello, Neo blockchain! This is a test message for signing.";
    group.bench_function("sign", |b| {
        b.iter(|| black_box(key.sign(black_box(message)).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_master_key, bench_derive_child, bench_mixer_path);
criterion_main!(benches);
