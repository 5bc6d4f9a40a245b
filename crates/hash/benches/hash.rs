// Copyright 2024-2025 Irreducible Inc.

use ark_bn254::Fr;
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use digest::Digest;
use placeholder_hash::{hash_scalars, PseudoCompressionFunction, Sha256Compression};
use rand::{thread_rng, RngCore};
use sha2::Sha256;

fn bench_sha256_compression(c: &mut Criterion) {
	let mut group = c.benchmark_group("SHA-256");

	let compression = Sha256Compression::default();
	let left = Sha256::digest(b"left");
	let right = Sha256::digest(b"right");

	group.throughput(Throughput::Bytes(64));
	group.bench_function("compress", |bench| {
		bench.iter(|| compression.compress([left, right]))
	});

	let mut rng = thread_rng();
	const N: usize = 1 << 16;
	let mut data = vec![0u8; N];
	rng.fill_bytes(&mut data);
	group.throughput(Throughput::Bytes(N as u64));
	group.bench_function("digest", |bench| bench.iter(|| Sha256::digest(&data)));

	group.finish()
}

fn bench_hash_scalars(c: &mut Criterion) {
	let mut group = c.benchmark_group("hash_scalars");

	// A leaf of a batch with 64 polynomials and cosets of size 4.
	const N: usize = 256;
	let scalars = (0..N as u64).map(Fr::from).collect::<Vec<_>>();

	group.throughput(Throughput::Bytes((N * 32) as u64));
	group.bench_function("Sha256", |bench| {
		bench.iter(|| hash_scalars::<Fr, Sha256>(scalars.iter()))
	});

	group.finish()
}

criterion_group!(hash, bench_sha256_compression, bench_hash_scalars);
criterion_main!(hash);
