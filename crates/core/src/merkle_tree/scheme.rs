// Copyright 2024 Irreducible Inc.

use std::marker::PhantomData;

use ark_serialize::CanonicalSerialize;
use digest::{core_api::BlockSizeUser, Digest, Output};
use getset::Getters;
use placeholder_hash::{hash_scalars, PseudoCompressionFunction};
use placeholder_utils::bail;

use super::{
	errors::{Error, VerificationError},
	merkle_tree_vcs::{MerkleProof, MerkleTreeScheme},
};

#[derive(Debug, Clone, Getters)]
pub struct BinaryMerkleTreeScheme<T, H, C> {
	#[getset(get = "pub")]
	compression: C,
	// This makes it so that `BinaryMerkleTreeScheme` remains Send + Sync
	// See https://doc.rust-lang.org/nomicon/phantom-data.html#table-of-phantomdata-patterns
	_phantom: PhantomData<fn() -> (T, H)>,
}

impl<T, H, C> BinaryMerkleTreeScheme<T, H, C> {
	pub fn new(compression: C) -> Self {
		BinaryMerkleTreeScheme {
			compression,
			_phantom: PhantomData,
		}
	}
}

impl<F, H, C> MerkleTreeScheme<F> for BinaryMerkleTreeScheme<F, H, C>
where
	F: CanonicalSerialize,
	H: Digest + BlockSizeUser,
	C: PseudoCompressionFunction<Output<H>, 2> + Sync,
{
	type Digest = Output<H>;

	fn verify_opening(
		&self,
		index: usize,
		values: &[F],
		tree_depth: usize,
		root: &Self::Digest,
		proof: &MerkleProof<Self::Digest>,
	) -> Result<(), Error> {
		if proof.len() != tree_depth {
			bail!(VerificationError::IncorrectProofShape {
				expected: tree_depth,
				actual: proof.len(),
			});
		}

		if index >= 1 << tree_depth {
			bail!(Error::IndexOutOfRange {
				max: (1 << tree_depth) - 1,
			});
		}

		let leaf_digest = hash_scalars::<F, H>(values);

		let mut index = index;
		let computed_root = proof.iter().fold(leaf_digest, |node, branch_node| {
			let next_node = if index & 1 == 0 {
				self.compression.compress([node, branch_node.clone()])
			} else {
				self.compression.compress([branch_node.clone(), node])
			};
			index >>= 1;
			next_node
		});

		if computed_root == *root {
			Ok(())
		} else {
			bail!(VerificationError::InvalidProof)
		}
	}
}
