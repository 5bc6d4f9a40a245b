// Copyright 2024 Irreducible Inc.

use ark_serialize::CanonicalSerialize;
use digest::{core_api::BlockSizeUser, Digest, Output};
use getset::Getters;
use placeholder_hash::PseudoCompressionFunction;
use rayon::iter::IndexedParallelIterator;
use tracing::instrument;

use super::{
	binary_merkle_tree::{build_from_iterator, BinaryMerkleTree},
	errors::Error,
	merkle_tree_vcs::{Commitment, MerkleProof, MerkleTreeProver},
	scheme::BinaryMerkleTreeScheme,
};

#[derive(Debug, Clone, Getters)]
pub struct BinaryMerkleTreeProver<T, H, C> {
	#[getset(get = "pub")]
	scheme: BinaryMerkleTreeScheme<T, H, C>,
}

impl<T, H, C> BinaryMerkleTreeProver<T, H, C> {
	pub fn new(compression: C) -> Self {
		Self {
			scheme: BinaryMerkleTreeScheme::new(compression),
		}
	}
}

impl<F, H, C> MerkleTreeProver<F> for BinaryMerkleTreeProver<F, H, C>
where
	F: CanonicalSerialize + Sync,
	H: Digest + BlockSizeUser,
	C: PseudoCompressionFunction<Output<H>, 2> + Sync,
{
	type Scheme = BinaryMerkleTreeScheme<F, H, C>;
	type Committed = BinaryMerkleTree<Output<H>>;

	fn scheme(&self) -> &Self::Scheme {
		&self.scheme
	}

	#[instrument(skip_all, level = "debug")]
	fn commit_iterated<ParIter>(
		&self,
		iterated_chunks: ParIter,
		log_len: usize,
	) -> Result<(Commitment<Output<H>>, Self::Committed), Error>
	where
		ParIter: IndexedParallelIterator<Item: IntoIterator<Item = F>>,
	{
		let tree = build_from_iterator::<F, H, C, _>(
			self.scheme.compression(),
			iterated_chunks,
			log_len,
		)?;

		let commitment = Commitment {
			root: tree.root(),
			depth: tree.log_len,
		};

		Ok((commitment, tree))
	}

	fn prove_opening(
		&self,
		committed: &Self::Committed,
		index: usize,
	) -> Result<MerkleProof<Output<H>>, Error> {
		committed.branch(index)
	}
}
