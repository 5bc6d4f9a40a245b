// Copyright 2024 Irreducible Inc.

use std::collections::BTreeMap;

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use bytes::{Buf, BufMut};
use placeholder_utils::{
	serialization::read_length_prefix, DeserializeBytes, SerializationError, SerializeBytes,
};

use crate::poly_commit::lpc::{BatchId, LpcProof};

/// A Placeholder proof: the roots of the batches committed while proving and one opening proof
/// for all of them.
///
/// The wire format is the number of commitments, the `(batch, root)` pairs in ascending batch
/// order, then the opening proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderProof<F, Digest> {
	pub commitments: BTreeMap<BatchId, Digest>,
	pub lpc_proof: LpcProof<F, Digest>,
}

impl<F, Digest> SerializeBytes for PlaceholderProof<F, Digest>
where
	F: CanonicalSerialize,
	Digest: SerializeBytes,
{
	fn serialize(&self, mut write_buf: impl BufMut) -> Result<(), SerializationError> {
		self.commitments.len().serialize(&mut write_buf)?;
		for (batch, root) in &self.commitments {
			batch.serialize(&mut write_buf)?;
			root.serialize(&mut write_buf)?;
		}
		self.lpc_proof.serialize(write_buf)
	}
}

impl<F, Digest> DeserializeBytes for PlaceholderProof<F, Digest>
where
	F: CanonicalDeserialize,
	Digest: DeserializeBytes,
{
	fn deserialize(mut read_buf: impl Buf) -> Result<Self, SerializationError> {
		let n_commitments = read_length_prefix(&mut read_buf)?;
		let mut commitments = BTreeMap::new();
		for _ in 0..n_commitments {
			let batch = usize::deserialize(&mut read_buf)?;
			let root = Digest::deserialize(&mut read_buf)?;
			commitments.insert(batch, root);
		}
		let lpc_proof = LpcProof::deserialize(read_buf)?;
		Ok(Self {
			commitments,
			lpc_proof,
		})
	}
}
