// Copyright 2024-2025 Irreducible Inc.

use ark_ff::{FftField, Field};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use bytes::{Buf, BufMut};
use getset::{CopyGetters, Getters};
use placeholder_math::{EvaluationDomain, EvaluationDomainSet};
use placeholder_utils::{
	bail,
	rayon::parallel_chunk_len,
	serialization::{deserialize_canonical_vec, serialize_canonical_slice},
	DeserializeBytes, SerializationError, SerializeBytes,
};
use rand::Rng;
use rayon::prelude::*;

use crate::{
	fiat_shamir::{CanSampleBits, Challenger},
	merkle_tree::MerkleProof,
	protocols::fri::Error,
	transcript::Transcript,
};

/// Upper bound on the proof-of-work difficulty, the bit length of a SHA-256 digest.
pub const MAX_GRINDING_BITS: usize = 256;

/// Parameters of the FRI low-degree test.
///
/// The committed codeword lives on D0 of size `2^(degree_log + expansion_log)` and is claimed to
/// have degree below `2^degree_log`. Round `i` folds its oracle `step_list[i]` times, so after all
/// rounds the prover sends a polynomial of degree below `2^(degree_log - Σ step_list)` in the
/// clear.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct FRIParams<F: FftField> {
	/// Base-2 logarithm of the degree bound.
	#[getset(get_copy = "pub")]
	degree_log: usize,
	/// Base-2 logarithm of the blowup factor ρ.
	#[getset(get_copy = "pub")]
	expansion_log: usize,
	step_list: Vec<usize>,
	/// The number of queries.
	#[getset(get_copy = "pub")]
	lambda: usize,
	/// Leading zero bits required from the proof-of-work hash.
	#[getset(get_copy = "pub")]
	grinding_bits: usize,
	/// D0 and every domain reached by a binary fold.
	#[getset(get = "pub")]
	domains: EvaluationDomainSet<F>,
}

impl<F: FftField> FRIParams<F> {
	pub fn new(
		degree_log: usize,
		expansion_log: usize,
		step_list: Vec<usize>,
		lambda: usize,
		grinding_bits: usize,
	) -> Result<Self, Error> {
		if step_list.is_empty() {
			bail!(Error::EmptyStepList);
		}
		if let Some(index) = step_list.iter().position(|&step| step == 0) {
			bail!(Error::FoldStepIsZero { index });
		}
		let total = step_list.iter().sum::<usize>();
		if total > degree_log {
			bail!(Error::InvalidStepList { total, degree_log });
		}
		if grinding_bits > MAX_GRINDING_BITS {
			bail!(Error::GrindingBitsTooLarge {
				bits: grinding_bits,
				max: MAX_GRINDING_BITS,
			});
		}

		let domains = EvaluationDomainSet::new(degree_log, expansion_log, total)?;
		Ok(Self {
			degree_log,
			expansion_log,
			step_list,
			lambda,
			grinding_bits,
			domains,
		})
	}

	/// Folds down to a constant final polynomial with steps of `max_step`, the last step taking
	/// the remainder.
	pub fn with_uniform_steps(
		degree_log: usize,
		expansion_log: usize,
		max_step: usize,
		lambda: usize,
		grinding_bits: usize,
	) -> Result<Self, Error> {
		if max_step == 0 {
			bail!(Error::FoldStepIsZero { index: 0 });
		}
		let mut step_list = vec![max_step; degree_log / max_step];
		if degree_log % max_step != 0 {
			step_list.push(degree_log % max_step);
		}
		Self::new(degree_log, expansion_log, step_list, lambda, grinding_bits)
	}

	/// Folds down to a constant final polynomial with steps drawn uniformly from `1..=max_step`.
	pub fn with_random_steps(
		degree_log: usize,
		expansion_log: usize,
		max_step: usize,
		lambda: usize,
		grinding_bits: usize,
		mut rng: impl Rng,
	) -> Result<Self, Error> {
		if max_step == 0 {
			bail!(Error::FoldStepIsZero { index: 0 });
		}
		let mut step_list = Vec::new();
		let mut remaining = degree_log;
		while remaining > 0 {
			let step = rng.gen_range(1..=max_step.min(remaining));
			step_list.push(step);
			remaining -= step;
		}
		Self::new(degree_log, expansion_log, step_list, lambda, grinding_bits)
	}

	/// The number of binary folds in each round.
	pub fn step_list(&self) -> &[usize] {
		&self.step_list
	}

	/// The number of committed oracles.
	pub fn n_rounds(&self) -> usize {
		self.step_list.len()
	}

	pub fn total_steps(&self) -> usize {
		self.step_list.iter().sum()
	}

	/// Base-2 logarithm of the number of coefficients of the final polynomial.
	pub fn final_degree_log(&self) -> usize {
		self.degree_log - self.total_steps()
	}

	/// Base-2 logarithm of |D0|, which is also the number of bits of a query index.
	pub fn log_len(&self) -> usize {
		self.degree_log + self.expansion_log
	}

	/// The domain of the oracle committed in the given round.
	pub fn round_domain(&self, round: usize) -> &EvaluationDomain<F> {
		let halvings = self.step_list[..round].iter().sum::<usize>();
		&self.domains.domains()[halvings]
	}

	/// The domain of the final polynomial.
	pub fn final_domain(&self) -> &EvaluationDomain<F> {
		&self.domains.domains()[self.total_steps()]
	}

	/// Base-2 logarithm of the number of leaves of the oracle committed in the given round.
	pub fn round_log_n_cosets(&self, round: usize) -> usize {
		self.round_domain(round).log_size() - self.step_list[round]
	}
}

/// Samples the query indices into D0.
pub fn sample_query_indices<F: FftField, C: Challenger>(
	params: &FRIParams<F>,
	transcript: &mut Transcript<C>,
) -> Vec<usize> {
	(0..params.lambda())
		.map(|_| transcript.sample_bits(params.log_len()))
		.collect()
}

/// Returns the values of a coset leaf: `codeword[index + k · n_cosets]` for `k < 2^step`.
pub fn coset_values<F: Copy>(codeword: &[F], index: usize, log_n_cosets: usize, step: usize) -> Vec<F> {
	(0..1 << step)
		.map(|k| codeword[index + (k << log_n_cosets)])
		.collect()
}

/// Folds a whole codeword once per challenge.
///
/// One binary fold maps the values of g on a domain of size N to the values of
/// `g'(x²) = (g(x) + g(-x)) / 2 + α · (g(x) - g(-x)) / (2x)` on the domain of size N / 2, where
/// `-x` sits at index `i + N / 2` when `x` sits at index `i`.
pub fn fold_codeword<F: FftField>(
	codeword: &[F],
	domain: &EvaluationDomain<F>,
	challenges: &[F],
) -> Vec<F> {
	let two_inv = two_inv::<F>();
	let mut generator_inv = domain.generator_inv();
	let mut folded = codeword.to_vec();

	for &challenge in challenges {
		let half = folded.len() / 2;
		let x_invs = powers(generator_inv, half);
		let (lo, hi) = folded.split_at(half);
		folded = (lo, hi, x_invs)
			.into_par_iter()
			.map(|(&a, &b, x_inv)| (a + b) * two_inv + challenge * (a - b) * two_inv * x_inv)
			.collect();
		generator_inv.square_in_place();
	}
	folded
}

/// Folds the values of a single coset leaf, as opened at `index` of a domain of the given size.
///
/// `values[k]` is the value at `ω^(index + k · n_cosets)`. The result is the value of the folded
/// oracle at `index` of the domain after `values.len().ilog2()` binary folds.
pub fn fold_coset<F: FftField>(
	values: &[F],
	index: usize,
	domain: &EvaluationDomain<F>,
	challenges: &[F],
) -> F {
	debug_assert_eq!(values.len(), 1 << challenges.len());

	let two_inv = two_inv::<F>();
	let n_cosets = domain.size() >> challenges.len();
	let mut generator_inv = domain.generator_inv();
	let mut values = values.to_vec();

	for &challenge in challenges {
		let half = values.len() / 2;
		let step_inv = generator_inv.pow([n_cosets as u64]);
		let mut x_inv = generator_inv.pow([index as u64]);
		for t in 0..half {
			let (a, b) = (values[t], values[t + half]);
			values[t] = (a + b) * two_inv + challenge * (a - b) * two_inv * x_inv;
			x_inv *= step_inv;
		}
		values.truncate(half);
		generator_inv.square_in_place();
	}
	values[0]
}

fn two_inv<F: Field>() -> F {
	F::from(2u64)
		.inverse()
		.expect("evaluation domains only exist in odd characteristic")
}

/// Returns `[1, base, base², ..., base^(n-1)]`, computed in parallel chunks.
pub fn powers<F: Field>(base: F, n: usize) -> Vec<F> {
	let chunk_len = parallel_chunk_len(n, 1 << 10);
	let mut result = vec![F::zero(); n];
	result
		.par_chunks_mut(chunk_len)
		.enumerate()
		.for_each(|(chunk_index, chunk)| {
			let mut value = base.pow([(chunk_index * chunk_len) as u64]);
			for entry in chunk {
				*entry = value;
				value *= base;
			}
		});
	result
}

/// The values and the authentication path of one opened coset leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRoundProof<F, Digest> {
	/// The values of the coset, in leaf order.
	pub values: Vec<F>,
	/// The Merkle authentication path of the leaf.
	pub vcs_proof: MerkleProof<Digest>,
}

/// The openings of one query, one per round.
pub type QueryProof<F, Digest> = Vec<QueryRoundProof<F, Digest>>;

/// A non-interactive FRI proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FRIProof<F, Digest> {
	/// The Merkle roots of the round oracles, starting with the input codeword.
	pub round_commitments: Vec<Digest>,
	/// The coefficients of the final polynomial.
	pub final_polynomial: Vec<F>,
	pub query_proofs: Vec<QueryProof<F, Digest>>,
	/// The proof-of-work nonce.
	pub nonce: u64,
}

impl<F, Digest> SerializeBytes for QueryRoundProof<F, Digest>
where
	F: CanonicalSerialize,
	Digest: SerializeBytes,
{
	fn serialize(&self, mut write_buf: impl BufMut) -> Result<(), SerializationError> {
		serialize_canonical_slice(&self.values, &mut write_buf)?;
		self.vcs_proof.serialize(&mut write_buf)
	}
}

impl<F, Digest> DeserializeBytes for QueryRoundProof<F, Digest>
where
	F: CanonicalDeserialize,
	Digest: DeserializeBytes,
{
	fn deserialize(mut read_buf: impl Buf) -> Result<Self, SerializationError> {
		let values = deserialize_canonical_vec(&mut read_buf)?;
		let vcs_proof = Vec::deserialize(&mut read_buf)?;
		Ok(Self { values, vcs_proof })
	}
}

impl<F, Digest> SerializeBytes for FRIProof<F, Digest>
where
	F: CanonicalSerialize,
	Digest: SerializeBytes,
{
	fn serialize(&self, mut write_buf: impl BufMut) -> Result<(), SerializationError> {
		self.round_commitments.serialize(&mut write_buf)?;
		serialize_canonical_slice(&self.final_polynomial, &mut write_buf)?;
		self.query_proofs.serialize(&mut write_buf)?;
		self.nonce.serialize(&mut write_buf)
	}
}

impl<F, Digest> DeserializeBytes for FRIProof<F, Digest>
where
	F: CanonicalDeserialize,
	Digest: DeserializeBytes,
{
	fn deserialize(mut read_buf: impl Buf) -> Result<Self, SerializationError> {
		Ok(Self {
			round_commitments: Vec::deserialize(&mut read_buf)?,
			final_polynomial: deserialize_canonical_vec(&mut read_buf)?,
			query_proofs: Vec::deserialize(&mut read_buf)?,
			nonce: u64::deserialize(&mut read_buf)?,
		})
	}
}

#[cfg(test)]
mod tests {
	use ark_bn254::Fr;
	use ark_ff::{UniformRand, Zero};
	use assert_matches::assert_matches;
	use rand::{rngs::StdRng, SeedableRng};

	use super::*;

	#[test]
	fn test_step_list_validation() {
		assert_matches!(
			FRIParams::<Fr>::new(4, 1, vec![], 1, 0),
			Err(Error::EmptyStepList)
		);
		assert_matches!(
			FRIParams::<Fr>::new(4, 1, vec![1, 0, 1], 1, 0),
			Err(Error::FoldStepIsZero { index: 1 })
		);
		assert_matches!(
			FRIParams::<Fr>::new(4, 1, vec![3, 2], 1, 0),
			Err(Error::InvalidStepList {
				total: 5,
				degree_log: 4
			})
		);
		assert_matches!(
			FRIParams::<Fr>::new(4, 1, vec![2, 2], 1, 257),
			Err(Error::GrindingBitsTooLarge { bits: 257, max: 256 })
		);
		assert_matches!(
			FRIParams::<Fr>::with_uniform_steps(4, 1, 2, 1, 300),
			Err(Error::GrindingBitsTooLarge { bits: 300, .. })
		);
		assert!(FRIParams::<Fr>::new(4, 1, vec![2, 2], 1, MAX_GRINDING_BITS).is_ok());

		let params = FRIParams::<Fr>::new(6, 2, vec![2, 3], 1, 0).unwrap();
		assert_eq!(params.final_degree_log(), 1);
		assert_eq!(params.round_domain(1).log_size(), 6);
		assert_eq!(params.round_log_n_cosets(1), 3);
		assert_eq!(params.final_domain().log_size(), 3);
	}

	#[test]
	fn test_generated_step_lists() {
		let params = FRIParams::<Fr>::with_uniform_steps(11, 1, 3, 1, 0).unwrap();
		assert_eq!(params.step_list(), &[3, 3, 3, 2]);
		assert_eq!(params.final_degree_log(), 0);

		let mut rng = StdRng::seed_from_u64(0);
		for _ in 0..10 {
			let params = FRIParams::<Fr>::with_random_steps(9, 2, 4, 1, 0, &mut rng).unwrap();
			assert_eq!(params.total_steps(), 9);
			assert!(params.step_list().iter().all(|&step| (1..=4).contains(&step)));
		}
	}

	#[test]
	fn test_coset_fold_matches_codeword_fold() {
		let mut rng = StdRng::seed_from_u64(0);
		let domain = EvaluationDomain::<Fr>::new(6).unwrap();
		let codeword = (0..64).map(|_| Fr::rand(&mut rng)).collect::<Vec<_>>();
		let challenges = (0..3).map(|_| Fr::rand(&mut rng)).collect::<Vec<_>>();

		let folded = fold_codeword(&codeword, &domain, &challenges);
		assert_eq!(folded.len(), 8);
		for index in 0..8 {
			let values = coset_values(&codeword, index, 3, 3);
			assert_eq!(fold_coset(&values, index, &domain, &challenges), folded[index]);
		}
	}

	#[test]
	fn test_fold_halves_degree() {
		let mut rng = StdRng::seed_from_u64(0);
		let domain = EvaluationDomain::<Fr>::new(5).unwrap();
		let coeffs = (0..8).map(|_| Fr::rand(&mut rng)).collect::<Vec<_>>();
		let codeword = domain.fft(&coeffs).unwrap();

		let challenge = Fr::rand(&mut rng);
		let folded = fold_codeword(&codeword, &domain, &[challenge]);
		let folded_coeffs = domain.halve().unwrap().ifft(&folded).unwrap();

		for i in 0..4 {
			assert_eq!(folded_coeffs[i], coeffs[2 * i] + challenge * coeffs[2 * i + 1]);
		}
		assert!(folded_coeffs[4..].iter().all(|coeff| coeff.is_zero()));
	}

	#[test]
	fn test_powers() {
		let base = Fr::from(3u64);
		let values = powers(base, 3000);
		assert_eq!(values[0], Fr::from(1u64));
		assert_eq!(values[2999], base.pow([2999u64]));
	}
}
