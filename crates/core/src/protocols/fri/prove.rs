// Copyright 2024 Irreducible Inc.

use std::mem;

use ark_ff::{FftField, PrimeField};
use placeholder_utils::bail;
use rayon::prelude::*;
use tracing::instrument;

use super::{
	common::{coset_values, fold_codeword, sample_query_indices, FRIParams, FRIProof, QueryProof},
	error::Error,
};
use crate::{
	fiat_shamir::{CanSample, Challenger},
	merkle_tree::{MerkleTreeProver, ProverDigest},
	protocols::fri::QueryRoundProof,
	transcript::Transcript,
};

/// A stateful prover for the FRI fold phase.
#[derive(Debug)]
pub struct FRIFolder<'a, F, MerkleProver>
where
	F: FftField,
	MerkleProver: MerkleTreeProver<F>,
{
	params: &'a FRIParams<F>,
	merkle_prover: &'a MerkleProver,
	/// The oracle to be committed in the next round.
	codeword: Vec<F>,
	round_committed: Vec<(Vec<F>, MerkleProver::Committed)>,
	curr_round: usize,
}

impl<'a, F, MerkleProver> FRIFolder<'a, F, MerkleProver>
where
	F: FftField + PrimeField,
	MerkleProver: MerkleTreeProver<F>,
{
	/// Constructs a new folder for a codeword on D0.
	pub fn new(
		params: &'a FRIParams<F>,
		merkle_prover: &'a MerkleProver,
		codeword: Vec<F>,
	) -> Result<Self, Error> {
		let expected = 1 << params.log_len();
		if codeword.len() != expected {
			bail!(Error::IncorrectCodewordLength {
				expected,
				actual: codeword.len(),
			});
		}

		Ok(Self {
			params,
			merkle_prover,
			codeword,
			round_committed: Vec::with_capacity(params.n_rounds()),
			curr_round: 0,
		})
	}

	/// Number of committed rounds.
	pub fn n_rounds(&self) -> usize {
		self.params.n_rounds()
	}

	/// Number of times `execute_fold_round` has been called.
	pub fn curr_round(&self) -> usize {
		self.curr_round
	}

	/// Commits the current oracle, observes the root and folds with the challenges drawn after it.
	#[instrument(skip_all, fields(round = self.curr_round), level = "debug")]
	pub fn execute_fold_round<C: Challenger>(
		&mut self,
		transcript: &mut Transcript<C>,
	) -> Result<ProverDigest<F, MerkleProver>, Error> {
		if self.curr_round >= self.n_rounds() {
			bail!(Error::TooManyFoldExecutions {
				max_folds: self.n_rounds(),
			});
		}

		let step = self.params.step_list()[self.curr_round];
		let domain = self.params.round_domain(self.curr_round);
		let log_n_cosets = domain.log_size() - step;

		let codeword = mem::take(&mut self.codeword);
		let codeword_ref = &codeword;
		let (commitment, committed) = self.merkle_prover.commit_iterated(
			(0..1 << log_n_cosets)
				.into_par_iter()
				.map(|index| (0..1 << step).map(move |k| codeword_ref[index + (k << log_n_cosets)])),
			log_n_cosets,
		)?;

		transcript.observe(&commitment.root);
		let challenges: Vec<F> = transcript.sample_vec(step);

		self.codeword = fold_codeword(&codeword, domain, &challenges);
		self.round_committed.push((codeword, committed));
		self.curr_round += 1;
		Ok(commitment.root)
	}

	/// Finishes the FRI folding process and sends the final polynomial.
	///
	/// This returns the coefficients of the final polynomial and a query prover instance.
	pub fn finish<C: Challenger>(
		self,
		transcript: &mut Transcript<C>,
	) -> Result<(Vec<F>, FRIQueryProver<'a, F, MerkleProver>), Error> {
		if self.curr_round != self.n_rounds() {
			bail!(Error::EarlyProverFinish);
		}

		let mut final_polynomial = self.params.final_domain().ifft(&self.codeword)?;
		final_polynomial.truncate(1 << self.params.final_degree_log());
		transcript.observe_scalars(&final_polynomial);

		let query_prover = FRIQueryProver {
			params: self.params,
			merkle_prover: self.merkle_prover,
			round_committed: self.round_committed,
		};
		Ok((final_polynomial, query_prover))
	}
}

/// A prover for the FRI query phase.
#[derive(Debug)]
pub struct FRIQueryProver<'a, F, MerkleProver>
where
	F: FftField,
	MerkleProver: MerkleTreeProver<F>,
{
	params: &'a FRIParams<F>,
	merkle_prover: &'a MerkleProver,
	round_committed: Vec<(Vec<F>, MerkleProver::Committed)>,
}

impl<F, MerkleProver> FRIQueryProver<'_, F, MerkleProver>
where
	F: FftField,
	MerkleProver: MerkleTreeProver<F>,
{
	/// Proves a FRI challenge query.
	///
	/// ## Arguments
	///
	/// * `index` - an index into D0
	pub fn prove_query(
		&self,
		mut index: usize,
	) -> Result<QueryProof<F, ProverDigest<F, MerkleProver>>, Error> {
		let mut round_proofs = Vec::with_capacity(self.round_committed.len());
		for (round, (codeword, committed)) in self.round_committed.iter().enumerate() {
			let step = self.params.step_list()[round];
			let log_n_cosets = self.params.round_log_n_cosets(round);
			let coset_index = index & ((1 << log_n_cosets) - 1);

			round_proofs.push(QueryRoundProof {
				values: coset_values(codeword, coset_index, log_n_cosets, step),
				vcs_proof: self.merkle_prover.prove_opening(committed, coset_index)?,
			});
			index = coset_index;
		}
		Ok(round_proofs)
	}
}

/// Runs the whole FRI prover on a codeword on D0.
///
/// Returns the proof together with the sampled query indices, which callers opening further
/// commitments at the same positions need.
#[instrument(skip_all, name = "fri::prove", level = "debug")]
#[allow(clippy::type_complexity)]
pub fn prove<F, MerkleProver, C>(
	params: &FRIParams<F>,
	merkle_prover: &MerkleProver,
	codeword: Vec<F>,
	transcript: &mut Transcript<C>,
) -> Result<(FRIProof<F, ProverDigest<F, MerkleProver>>, Vec<usize>), Error>
where
	F: FftField + PrimeField,
	MerkleProver: MerkleTreeProver<F>,
	C: Challenger,
{
	let mut folder = FRIFolder::new(params, merkle_prover, codeword)?;
	let round_commitments = (0..params.n_rounds())
		.map(|_| folder.execute_fold_round(transcript))
		.collect::<Result<Vec<_>, _>>()?;
	let (final_polynomial, query_prover) = folder.finish(transcript)?;

	let nonce = transcript.grind(params.grinding_bits());
	let query_indices = sample_query_indices(params, transcript);
	let query_proofs = query_indices
		.iter()
		.map(|&index| query_prover.prove_query(index))
		.collect::<Result<Vec<_>, _>>()?;

	let proof = FRIProof {
		round_commitments,
		final_polynomial,
		query_proofs,
		nonce,
	};
	Ok((proof, query_indices))
}
