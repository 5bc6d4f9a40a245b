// Copyright 2024 Irreducible Inc.

use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::instrument;

use super::Transcript;
use crate::fiat_shamir::Challenger;

/// Number of candidate nonces checked in parallel before the next block is scheduled.
const NONCE_BLOCK: u64 = 1 << 14;

/// Length of the transcript state that seeds the proof-of-work hash.
const SEED_BYTES: usize = 32;

impl<C: Challenger> Transcript<C> {
	/// Finds a proof-of-work nonce for the current transcript state and observes it.
	///
	/// The nonce is the smallest `u64` such that `SHA-256(seed ‖ nonce_le)` starts with at least
	/// `bits` zero bits, where `seed` is drawn from the transcript.
	#[instrument(skip(self), level = "debug")]
	pub fn grind(&mut self, bits: usize) -> u64 {
		let seed = self.challenge_bytes(SEED_BYTES);
		let nonce = find_nonce(&seed, bits);
		self.observe(&nonce);
		nonce
	}

	/// Checks a proof-of-work nonce against the current transcript state and observes it.
	///
	/// The transcript advances exactly as in [`Self::grind`] whether or not the nonce is valid.
	pub fn check_grinding(&mut self, bits: usize, nonce: u64) -> bool {
		let seed = self.challenge_bytes(SEED_BYTES);
		let valid = leading_zero_bits(&seed, nonce) >= bits;
		self.observe(&nonce);
		valid
	}
}

fn find_nonce(seed: &[u8], bits: usize) -> u64 {
	(0..)
		.find_map(|block: u64| {
			let start = block * NONCE_BLOCK;
			(start..start + NONCE_BLOCK)
				.into_par_iter()
				.find_first(|&nonce| leading_zero_bits(seed, nonce) >= bits)
		})
		.expect("nonce space is searched until a match is found")
}

fn leading_zero_bits(seed: &[u8], nonce: u64) -> usize {
	let mut hasher = Sha256::new();
	hasher.update(seed);
	hasher.update(nonce.to_le_bytes());
	let digest = hasher.finalize();

	let mut zeros = 0;
	for byte in digest {
		zeros += byte.leading_zeros() as usize;
		if byte != 0 {
			break;
		}
	}
	zeros
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_grinding_round_trip() {
		let mut prover = Transcript::new();
		prover.observe_label("grinding");
		let mut verifier = prover.clone();

		let nonce = prover.grind(8);
		assert!(verifier.check_grinding(8, nonce));
		assert_eq!(prover.challenge_log(), verifier.challenge_log());

		let a: u64 = prover.challenge_bytes(8)[0].into();
		let b: u64 = verifier.challenge_bytes(8)[0].into();
		assert_eq!(a, b);
	}

	#[test]
	fn test_invalid_nonce_is_rejected() {
		let mut prover = Transcript::new();
		let mut verifier = prover.clone();

		let nonce = prover.grind(12);
		let seed = verifier.clone().challenge_bytes(SEED_BYTES);
		let wrong = (0..)
			.map(|offset| nonce.wrapping_add(offset + 1))
			.find(|&candidate| leading_zero_bits(&seed, candidate) < 12)
			.unwrap();
		assert!(!verifier.check_grinding(12, wrong));
	}

	#[test]
	fn test_zero_bits_accepts_first_nonce() {
		let mut transcript = Transcript::new();
		assert_eq!(transcript.grind(0), 0);
	}
}
