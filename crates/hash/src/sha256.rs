// Copyright 2023-2025 Irreducible Inc.

use bytemuck::{bytes_of_mut, must_cast};
use digest::{core_api::Block, Digest};
use sha2::{compress256, digest::Output, Sha256};

use crate::{CompressionFunction, PseudoCompressionFunction};

/// A two-to-one compression function for SHA-256 digests.
///
/// The two children are packed into a single 64-byte block and run through one SHA-256
/// compression round, starting from a domain-separated initial state instead of the standard IV.
#[derive(Debug, Clone)]
pub struct Sha256Compression {
	initial_state: [u32; 8],
}

impl Default for Sha256Compression {
	fn default() -> Self {
		let initial_state_bytes = Sha256::digest(b"PLACEHOLDER SHA-256 COMPRESS");
		let mut initial_state = [0u32; 8];
		bytes_of_mut(&mut initial_state).copy_from_slice(&initial_state_bytes);
		Self { initial_state }
	}
}

impl PseudoCompressionFunction<Output<Sha256>, 2> for Sha256Compression {
	fn compress(&self, input: [Output<Sha256>; 2]) -> Output<Sha256> {
		let mut ret = self.initial_state;
		let mut block = <Block<Sha256>>::default();
		block.as_mut_slice()[..32].copy_from_slice(input[0].as_slice());
		block.as_mut_slice()[32..].copy_from_slice(input[1].as_slice());
		compress256(&mut ret, &[block]);
		must_cast::<[u32; 8], [u8; 32]>(ret).into()
	}
}

impl CompressionFunction<Output<Sha256>, 2> for Sha256Compression {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_compression_is_order_sensitive() {
		let compression = Sha256Compression::default();
		let left = Sha256::digest(b"left");
		let right = Sha256::digest(b"right");

		let lr = compression.compress([left, right]);
		let rl = compression.compress([right, left]);
		assert_ne!(lr, rl);
		assert_eq!(lr, compression.compress([left, right]));
	}

	#[test]
	fn test_compression_differs_from_plain_hash() {
		let compression = Sha256Compression::default();
		let left = Sha256::digest(b"left");
		let right = Sha256::digest(b"right");

		let mut concatenated = left.to_vec();
		concatenated.extend_from_slice(&right);
		assert_ne!(compression.compress([left, right]), Sha256::digest(&concatenated));
	}
}
