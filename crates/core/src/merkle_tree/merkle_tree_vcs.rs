// Copyright 2024 Irreducible Inc.

use std::fmt::Debug;

use placeholder_utils::{DeserializeBytes, SerializeBytes};
use rayon::iter::IndexedParallelIterator;

use super::errors::Error;

/// A Merkle tree commitment.
///
/// This struct includes the depth of the tree to guard against attacks that exploit the
/// indistinguishability of leaf digests from inner node digests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commitment<Digest> {
	/// The root digest of the Merkle tree.
	pub root: Digest,
	/// The depth of the Merkle tree.
	pub depth: usize,
}

/// An authentication path, ordered from the leaf level up to the children of the root.
pub type MerkleProof<Digest> = Vec<Digest>;

/// The digest type of the scheme behind a [`MerkleTreeProver`].
pub type ProverDigest<T, P> =
	<<P as MerkleTreeProver<T>>::Scheme as MerkleTreeScheme<T>>::Digest;

/// A Merkle tree scheme.
pub trait MerkleTreeScheme<T> {
	type Digest: Clone
		+ PartialEq
		+ Eq
		+ Debug
		+ Send
		+ Sync
		+ SerializeBytes
		+ DeserializeBytes;

	/// Verify an opening proof for the leaf holding `values` at the given index.
	fn verify_opening(
		&self,
		index: usize,
		values: &[T],
		tree_depth: usize,
		root: &Self::Digest,
		proof: &MerkleProof<Self::Digest>,
	) -> Result<(), Error>;
}

/// A Merkle tree prover for a particular scheme.
///
/// This is separate from [`MerkleTreeScheme`] so that it may be implemented using a
/// hardware-accelerated backend.
pub trait MerkleTreeProver<T> {
	type Scheme: MerkleTreeScheme<T>;
	/// Data generated during commitment required to generate opening proofs.
	type Committed: Debug + Send + Sync;

	/// Returns the Merkle tree scheme used by the prover.
	fn scheme(&self) -> &Self::Scheme;

	/// Commit `2^log_len` leaves whose values are produced by a parallel iterator.
	#[allow(clippy::type_complexity)]
	fn commit_iterated<ParIter>(
		&self,
		iterated_chunks: ParIter,
		log_len: usize,
	) -> Result<(Commitment<<Self::Scheme as MerkleTreeScheme<T>>::Digest>, Self::Committed), Error>
	where
		ParIter: IndexedParallelIterator<Item: IntoIterator<Item = T>>;

	/// Generate an opening proof for the leaf at the given index.
	fn prove_opening(
		&self,
		committed: &Self::Committed,
		index: usize,
	) -> Result<MerkleProof<<Self::Scheme as MerkleTreeScheme<T>>::Digest>, Error>;
}
