// Copyright 2024 Irreducible Inc.

//! The Fiat–Shamir transcript shared by the prover and the verifier.
//!
//! Both parties run the same sequence of observations and samplings over a [`Transcript`]. The
//! prover observes the messages it sends, the verifier observes the messages it reads from the
//! proof, and as long as the two sequences agree every sampled challenge agrees as well. Proof
//! messages themselves travel in explicit proof structures, the transcript only carries the
//! Fiat–Shamir state.

mod grinding;

use ark_ff::PrimeField;
use ark_serialize::CanonicalSerialize;
use bytes::{Buf, BufMut};
use placeholder_utils::{serialization::serialize_canonical, SerializeBytes};
use sha2::Sha256;

use crate::fiat_shamir::{CanSample, CanSampleBits, Challenger, HasherChallenger};

/// Number of pseudo-random bytes reduced into one field element.
///
/// Twice the width of the scalar fields in use, which keeps the modular bias negligible.
const SAMPLE_BYTES: usize = 64;

/// A Fiat–Shamir transcript over some [`Challenger`].
///
/// Cloning a transcript forks it: the clone continues from the same state independently.
///
/// The transcript keeps a log of every sampled challenge in canonical byte form, which lets tests
/// compare the challenge sequences of a prover and a verifier.
#[derive(Debug, Clone, Default)]
pub struct Transcript<C = HasherChallenger<Sha256>> {
	challenger: C,
	challenge_log: Vec<Vec<u8>>,
}

impl Transcript {
	pub fn new() -> Self {
		Self::default()
	}
}

impl<C: Challenger> Transcript<C> {
	pub fn with_challenger(challenger: C) -> Self {
		Self {
			challenger,
			challenge_log: Vec::new(),
		}
	}

	/// The sampled challenges, in sampling order.
	pub fn challenge_log(&self) -> &[Vec<u8>] {
		&self.challenge_log
	}

	pub fn observe_bytes(&mut self, bytes: &[u8]) {
		self.challenger.observer().put_slice(bytes);
	}

	/// Observes a domain separation label.
	pub fn observe_label(&mut self, label: &str) {
		self.observe_bytes(label.as_bytes());
	}

	/// Observes a value in its byte serialization, such as a digest or an integer.
	pub fn observe<T: SerializeBytes>(&mut self, value: &T) {
		value
			.serialize(self.challenger.observer())
			.expect("challenger has infinite capacity");
	}

	/// Observes a field element in its canonical encoding.
	pub fn observe_scalar<F: CanonicalSerialize>(&mut self, value: &F) {
		serialize_canonical(value, self.challenger.observer())
			.expect("challenger has infinite capacity");
	}

	pub fn observe_scalars<F: CanonicalSerialize>(&mut self, values: &[F]) {
		for value in values {
			self.observe_scalar(value);
		}
	}

	/// Samples `n` raw challenge bytes.
	pub fn challenge_bytes(&mut self, n: usize) -> Vec<u8> {
		let mut bytes = vec![0u8; n];
		self.challenger.sampler().copy_to_slice(&mut bytes);
		self.challenge_log.push(bytes.clone());
		bytes
	}
}

impl<F, C> CanSample<F> for Transcript<C>
where
	F: PrimeField,
	C: Challenger,
{
	fn sample(&mut self) -> F {
		let mut bytes = [0u8; SAMPLE_BYTES];
		self.challenger.sampler().copy_to_slice(&mut bytes);
		let value = F::from_le_bytes_mod_order(&bytes);

		let mut encoded = Vec::with_capacity(value.compressed_size());
		serialize_canonical(&value, &mut encoded).expect("vector grows on demand");
		self.challenge_log.push(encoded);
		value
	}
}

impl<C: Challenger> CanSampleBits<usize> for Transcript<C> {
	fn sample_bits(&mut self, bits: usize) -> usize {
		let bits = bits.min(usize::BITS as usize);
		let value = self.challenger.sampler().get_u64_le() as usize;
		let value = match 1usize.checked_shl(bits as u32) {
			Some(bound) => value & (bound - 1),
			None => value,
		};
		self.challenge_log.push((value as u64).to_le_bytes().to_vec());
		value
	}
}

#[cfg(test)]
mod tests {
	use ark_bn254::Fr;

	use super::*;

	#[test]
	fn test_same_observations_give_same_challenges() {
		let mut prover = Transcript::new();
		let mut verifier = Transcript::new();

		for transcript in [&mut prover, &mut verifier] {
			transcript.observe_label("test");
			transcript.observe_scalar(&Fr::from(42u64));
			transcript.observe(&7u64);
		}

		let a: Fr = prover.sample();
		let b: Fr = verifier.sample();
		assert_eq!(a, b);
		assert_eq!(prover.sample_bits(10), verifier.sample_bits(10));
		assert_eq!(prover.challenge_bytes(5), verifier.challenge_bytes(5));
		assert_eq!(prover.challenge_log(), verifier.challenge_log());
		assert_eq!(prover.challenge_log().len(), 3);
	}

	#[test]
	fn test_different_observations_diverge() {
		let mut lhs = Transcript::new();
		let mut rhs = Transcript::new();
		lhs.observe_scalar(&Fr::from(1u64));
		rhs.observe_scalar(&Fr::from(2u64));

		let a: Fr = lhs.sample();
		let b: Fr = rhs.sample();
		assert_ne!(a, b);
	}

	#[test]
	fn test_sample_bits_range() {
		let mut transcript = Transcript::new();
		for bits in 0..20 {
			assert!(transcript.sample_bits(bits) < 1 << bits);
		}
		// no mask once all bits are requested
		transcript.sample_bits(usize::BITS as usize);
	}

	#[test]
	fn test_fork_continues_from_same_state() {
		let mut transcript = Transcript::new();
		transcript.observe_bytes(b"prefix");
		let mut fork = transcript.clone();

		let a: Fr = transcript.sample();
		let b: Fr = fork.sample();
		assert_eq!(a, b);
	}
}
