// Copyright 2024 Irreducible Inc.

use ark_ff::{FftField, PrimeField};
use placeholder_math::evaluate_univariate;
use placeholder_utils::bail;
use tracing::instrument;

use super::{
	common::{fold_coset, sample_query_indices, FRIParams, FRIProof, QueryProof},
	error::{Error, VerificationError},
};
use crate::{
	fiat_shamir::{CanSample, Challenger},
	merkle_tree::MerkleTreeScheme,
	transcript::Transcript,
};

/// A verifier for the FRI query phase.
///
/// The verifier is instantiated after replaying the commit phase and is used to test consistency
/// of the round oracles with each other and with the final polynomial.
#[derive(Debug)]
pub struct FRIVerifier<'a, F, VCS>
where
	F: FftField,
	VCS: MerkleTreeScheme<F>,
{
	params: &'a FRIParams<F>,
	vcs: &'a VCS,
	/// Received commitments to the round oracles.
	round_commitments: &'a [VCS::Digest],
	/// The folding challenges of each round.
	challenges: Vec<Vec<F>>,
	final_polynomial: &'a [F],
}

impl<'a, F, VCS> FRIVerifier<'a, F, VCS>
where
	F: FftField + PrimeField,
	VCS: MerkleTreeScheme<F>,
{
	/// Replays the commit phase on the transcript and samples the query indices.
	pub fn verify_commit_phase<C: Challenger>(
		params: &'a FRIParams<F>,
		vcs: &'a VCS,
		round_commitments: &'a [VCS::Digest],
		final_polynomial: &'a [F],
		nonce: u64,
		transcript: &mut Transcript<C>,
	) -> Result<(Self, Vec<usize>), Error> {
		if round_commitments.len() != params.n_rounds() {
			bail!(VerificationError::IncorrectRoundCount {
				expected: params.n_rounds(),
			});
		}

		let challenges = round_commitments
			.iter()
			.zip(params.step_list())
			.map(|(root, &step)| {
				transcript.observe(root);
				transcript.sample_vec(step)
			})
			.collect();

		if final_polynomial.len() > 1 << params.final_degree_log() {
			bail!(VerificationError::IncorrectDegree);
		}
		transcript.observe_scalars(final_polynomial);

		if !transcript.check_grinding(params.grinding_bits(), nonce) {
			bail!(VerificationError::InvalidNonce);
		}
		let query_indices = sample_query_indices(params, transcript);

		let verifier = Self {
			params,
			vcs,
			round_commitments,
			challenges,
			final_polynomial,
		};
		Ok((verifier, query_indices))
	}

	/// Number of committed rounds.
	pub fn n_rounds(&self) -> usize {
		self.params.n_rounds()
	}

	/// Verifies a FRI challenge query.
	///
	/// ## Arguments
	///
	/// * `index` - an index into D0
	/// * `proof` - the openings of each round oracle
	/// * `initial_values` - the expected values of the first opened coset, if the caller knows
	///   them from other commitments
	pub fn verify_query(
		&self,
		mut index: usize,
		proof: &QueryProof<F, VCS::Digest>,
		initial_values: Option<&[F]>,
	) -> Result<(), Error> {
		if proof.len() != self.n_rounds() {
			bail!(VerificationError::IncorrectQueryProofLength {
				expected: self.n_rounds(),
			});
		}

		let mut folded_value = None;
		for (round, round_proof) in proof.iter().enumerate() {
			let step = self.params.step_list()[round];
			let domain = self.params.round_domain(round);
			let log_n_cosets = domain.log_size() - step;
			let coset_index = index & ((1 << log_n_cosets) - 1);

			if round_proof.values.len() != 1 << step {
				bail!(VerificationError::IncorrectQueryProofValuesLength {
					round,
					coset_size: 1 << step,
				});
			}

			match (folded_value, initial_values) {
				(Some(folded_value), _) => {
					if round_proof.values[index >> log_n_cosets] != folded_value {
						bail!(VerificationError::IncorrectFold {
							query_round: round,
							index,
						});
					}
				}
				(None, Some(initial_values)) => {
					if initial_values != round_proof.values.as_slice() {
						bail!(VerificationError::IncorrectInitialValue { index });
					}
				}
				(None, None) => {}
			}

			self.vcs
				.verify_opening(
					coset_index,
					&round_proof.values,
					log_n_cosets,
					&self.round_commitments[round],
					&round_proof.vcs_proof,
				)
				.map_err(|_| VerificationError::InvalidOpening {
					round,
					index: coset_index,
				})?;

			folded_value = Some(fold_coset(
				&round_proof.values,
				coset_index,
				domain,
				&self.challenges[round],
			));
			index = coset_index;
		}

		let x = self.params.final_domain().element(index);
		if folded_value != Some(evaluate_univariate(self.final_polynomial, x)) {
			bail!(VerificationError::IncorrectFold {
				query_round: self.n_rounds(),
				index,
			});
		}
		Ok(())
	}
}

/// Runs the whole FRI verifier and returns the query indices.
#[instrument(skip_all, name = "fri::verify", level = "debug")]
pub fn verify<F, VCS, C>(
	params: &FRIParams<F>,
	vcs: &VCS,
	proof: &FRIProof<F, VCS::Digest>,
	transcript: &mut Transcript<C>,
) -> Result<Vec<usize>, Error>
where
	F: FftField + PrimeField,
	VCS: MerkleTreeScheme<F>,
	C: Challenger,
{
	let (verifier, query_indices) = FRIVerifier::verify_commit_phase(
		params,
		vcs,
		&proof.round_commitments,
		&proof.final_polynomial,
		proof.nonce,
		transcript,
	)?;

	if proof.query_proofs.len() != query_indices.len() {
		bail!(VerificationError::IncorrectQueryCount {
			expected: query_indices.len(),
		});
	}
	for (&index, query_proof) in query_indices.iter().zip(&proof.query_proofs) {
		verifier.verify_query(index, query_proof, None)?;
	}
	Ok(query_indices)
}
