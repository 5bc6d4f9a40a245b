// Copyright 2024-2025 Irreducible Inc.

use std::array;

use ark_serialize::CanonicalSerialize;
use digest::{core_api::BlockSizeUser, Digest, Output};
use placeholder_hash::{hash_scalars, PseudoCompressionFunction};
use placeholder_utils::bail;
use rayon::prelude::*;
use tracing::instrument;

use super::errors::Error;

/// A binary Merkle tree that commits batches of vectors.
///
/// The vector entries at each index in a batch are hashed together into leaf digests. Then a
/// Merkle tree is constructed over the leaf digests. The implementation requires that the vector
/// lengths are all equal to each other and a power of two.
#[derive(Debug, Clone)]
pub struct BinaryMerkleTree<D> {
	/// Base-2 logarithm of the number of leaves
	pub log_len: usize,
	/// The inner nodes, arranged as a flattened array of layers with the root at the end
	pub inner_nodes: Vec<D>,
}

#[instrument("BinaryMerkleTree::build", skip_all, level = "debug")]
pub fn build_from_iterator<F, H, C, ParIter>(
	compression: &C,
	iterated_chunks: ParIter,
	log_len: usize,
) -> Result<BinaryMerkleTree<Output<H>>, Error>
where
	F: CanonicalSerialize,
	H: Digest + BlockSizeUser,
	C: PseudoCompressionFunction<Output<H>, 2> + Sync,
	ParIter: IndexedParallelIterator<Item: IntoIterator<Item = F>>,
{
	if iterated_chunks.len() != 1 << log_len {
		bail!(Error::IncorrectVectorLen {
			expected: 1 << log_len,
		});
	}

	let leaves = iterated_chunks
		.map(|chunk| hash_scalars::<F, H>(chunk))
		.collect();
	Ok(internal_build(compression, leaves, log_len))
}

fn internal_build<D, C>(compression: &C, leaves: Vec<D>, log_len: usize) -> BinaryMerkleTree<D>
where
	D: Clone + Send + Sync,
	C: PseudoCompressionFunction<D, 2> + Sync,
{
	let total_length = (1 << (log_len + 1)) - 1;
	let mut inner_nodes = leaves;
	inner_nodes.reserve_exact(total_length - inner_nodes.len());

	let mut layer_start = 0;
	for i in 1..(log_len + 1) {
		let prev_len = 1 << (log_len + 1 - i);
		let next_layer = compress_layer(
			compression,
			&inner_nodes[layer_start..layer_start + prev_len],
		);
		layer_start += prev_len;
		inner_nodes.extend(next_layer);
	}

	BinaryMerkleTree {
		log_len,
		inner_nodes,
	}
}

impl<D: Clone> BinaryMerkleTree<D> {
	pub fn root(&self) -> D {
		self.inner_nodes
			.last()
			.expect("MerkleTree inner nodes can't be empty")
			.clone()
	}

	/// Get a Merkle branch for the given index
	///
	/// Throws if the index is out of range
	pub fn branch(&self, index: usize) -> Result<Vec<D>, Error> {
		if index >= 1 << self.log_len {
			return Err(Error::IndexOutOfRange {
				max: (1 << self.log_len) - 1,
			});
		}

		let branch = (0..self.log_len)
			.map(|j| {
				let node_index = (((1 << j) - 1) << (self.log_len + 1 - j)) | (index >> j) ^ 1;
				self.inner_nodes[node_index].clone()
			})
			.collect();

		Ok(branch)
	}
}

#[tracing::instrument("MerkleTree::compress_layer", skip_all, level = "trace")]
fn compress_layer<D, C>(compression: &C, prev_layer: &[D]) -> Vec<D>
where
	D: Clone + Send + Sync,
	C: PseudoCompressionFunction<D, 2> + Sync,
{
	prev_layer
		.par_chunks_exact(2)
		.map(|prev_pair| compression.compress(array::from_fn(|i| prev_pair[i].clone())))
		.collect()
}
