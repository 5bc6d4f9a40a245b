// Copyright 2025 Irreducible Inc.

use std::iter::repeat_with;

use ark_bn254::Fr;
use ark_ff::UniformRand;
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use placeholder_core::merkle_tree::{BinaryMerkleTreeProver, MerkleTreeProver};
use placeholder_hash::Sha256Compression;
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;
use sha2::Sha256;

const LOG_TREE_SIZE: usize = 16;
const NUM_LEAVES: usize = 1 << LOG_TREE_SIZE;
const ELEMS_IN_LEAF: usize = 8;

fn bench_binary_merkle_tree(c: &mut Criterion) {
	let merkle_prover =
		BinaryMerkleTreeProver::<Fr, Sha256, _>::new(Sha256Compression::default());
	let mut rng = StdRng::seed_from_u64(0);
	let data = repeat_with(|| Fr::rand(&mut rng))
		.take(NUM_LEAVES * ELEMS_IN_LEAF)
		.collect::<Vec<_>>();
	let mut group = c.benchmark_group("merkle_tree");
	group.throughput(Throughput::Bytes((NUM_LEAVES * ELEMS_IN_LEAF * 32) as u64));
	group.sample_size(10);
	group.bench_function(
		format!("{LOG_TREE_SIZE} log tree size {ELEMS_IN_LEAF}xFr leaf"),
		|b| {
			b.iter(|| {
				merkle_prover.commit_iterated(
					data.par_chunks(ELEMS_IN_LEAF).map(|leaf| leaf.iter().copied()),
					LOG_TREE_SIZE,
				)
			});
		},
	);
	group.finish()
}

criterion_main!(binary_merkle_tree);
criterion_group!(binary_merkle_tree, bench_binary_merkle_tree);
