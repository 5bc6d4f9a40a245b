// Copyright 2024 Irreducible Inc.

use std::{collections::BTreeMap, sync::Arc};

use ark_ff::{FftField, PrimeField};
use getset::CopyGetters;
use placeholder_math::Polynomial;
use placeholder_utils::bail;
use rayon::prelude::*;
use tracing::instrument;

use super::{
	common::{
		combine_openings, count_opening_terms, observe_evaluations, BatchId, BatchPoints,
		CommittedBatch, InitialProof, LpcFixedData, LpcProof,
	},
	error::Error,
};
use crate::{
	fiat_shamir::{CanSample, Challenger},
	merkle_tree::{MerkleTreeProver, ProverDigest},
	protocols::fri::{self, FRIParams},
	transcript::Transcript,
};

/// The prover side of the list polynomial commitment.
///
/// Batches are committed one at a time as the surrounding protocol produces them; evaluation
/// points are attached per polynomial. [`LpcProver::prove`] then opens everything at once with a
/// single FRI proof for the θ-combined quotient.
#[derive(CopyGetters)]
pub struct LpcProver<'a, F, MerkleProver>
where
	F: FftField,
	MerkleProver: MerkleTreeProver<F>,
{
	#[getset(get_copy = "pub")]
	params: &'a FRIParams<F>,
	#[getset(get_copy = "pub")]
	merkle_prover: &'a MerkleProver,
	batches: BTreeMap<BatchId, Arc<CommittedBatch<F, MerkleProver>>>,
	points: BatchPoints<F>,
	fixed: Option<Arc<LpcFixedData<F>>>,
}

impl<'a, F, MerkleProver> LpcProver<'a, F, MerkleProver>
where
	F: FftField + PrimeField,
	MerkleProver: MerkleTreeProver<F>,
{
	pub fn new(params: &'a FRIParams<F>, merkle_prover: &'a MerkleProver) -> Self {
		Self {
			params,
			merkle_prover,
			batches: BTreeMap::new(),
			points: BTreeMap::new(),
			fixed: None,
		}
	}

	/// Commits a batch and returns its root.
	///
	/// The caller observes the root in the transcript at the point where the surrounding protocol
	/// sends it.
	pub fn commit_batch(
		&mut self,
		batch: BatchId,
		polys: Vec<Polynomial<F>>,
	) -> Result<ProverDigest<F, MerkleProver>, Error> {
		if self.batches.contains_key(&batch) {
			bail!(Error::DuplicateBatch { batch });
		}
		let committed = CommittedBatch::commit(self.params, self.merkle_prover, batch, polys)?;
		let root = committed.root().clone();
		self.add_committed_batch(batch, Arc::new(committed))?;
		Ok(root)
	}

	/// Registers a batch committed ahead of time, such as a fixed batch from preprocessing.
	pub fn add_committed_batch(
		&mut self,
		batch: BatchId,
		committed: Arc<CommittedBatch<F, MerkleProver>>,
	) -> Result<(), Error> {
		if self.batches.contains_key(&batch) {
			bail!(Error::DuplicateBatch { batch });
		}
		self.points.insert(batch, vec![Vec::new(); committed.len()]);
		self.batches.insert(batch, committed);
		Ok(())
	}

	/// Sets the η evaluations of the fixed batches, which are opened with every proof.
	pub fn set_fixed_data(&mut self, fixed: Arc<LpcFixedData<F>>) {
		self.fixed = Some(fixed);
	}

	pub fn batch(&self, batch: BatchId) -> Option<&Arc<CommittedBatch<F, MerkleProver>>> {
		self.batches.get(&batch)
	}

	/// Requests the evaluation of one polynomial of a batch at a point.
	pub fn append_eval_point(&mut self, batch: BatchId, poly: usize, point: F) -> Result<(), Error> {
		let poly_points = self
			.points
			.get_mut(&batch)
			.ok_or(Error::UnknownBatch { batch })?;
		poly_points
			.get_mut(poly)
			.ok_or(Error::PolynomialIndexOutOfRange { batch, index: poly })?
			.push(point);
		Ok(())
	}

	/// Requests the evaluation of every polynomial of a batch at a point.
	pub fn append_eval_point_to_batch(&mut self, batch: BatchId, point: F) -> Result<(), Error> {
		let poly_points = self
			.points
			.get_mut(&batch)
			.ok_or(Error::UnknownBatch { batch })?;
		for points in poly_points {
			points.push(point);
		}
		Ok(())
	}

	/// The batch roots in ascending batch order.
	pub fn roots(&self) -> impl Iterator<Item = (BatchId, &ProverDigest<F, MerkleProver>)> {
		self.batches
			.iter()
			.map(|(&batch, committed)| (batch, committed.root()))
	}

	pub fn points(&self) -> &BatchPoints<F> {
		&self.points
	}

	/// The number of θ powers the openings of this prover consume.
	pub fn n_opening_terms(&self) -> usize {
		count_opening_terms(&self.points, self.fixed.as_deref())
	}

	/// Evaluates every polynomial at its requested points.
	#[instrument(skip_all, level = "debug")]
	pub fn evaluate(&self) -> BatchPoints<F> {
		self.points
			.iter()
			.map(|(batch, poly_points)| {
				let evals = self.batches[batch]
					.polys()
					.par_iter()
					.zip(poly_points)
					.map(|(poly, points)| points.iter().map(|&point| poly.evaluate(point)).collect())
					.collect();
				(*batch, evals)
			})
			.collect()
	}

	/// Builds the combined quotient
	/// `Q(x) = Σ_ζ Σ_(batch, poly) θ^k · (p(x) - p(ζ)) / (x - ζ)` in coefficient form.
	#[instrument(skip_all, level = "debug")]
	pub fn combined_quotient(
		&self,
		evaluations: &BatchPoints<F>,
		theta: F,
		starting_power: u64,
	) -> Result<Polynomial<F>, Error> {
		let groups = combine_openings(
			&self.points,
			evaluations,
			self.fixed.as_deref(),
			theta,
			starting_power,
		)?;
		let max_len = self
			.batches
			.values()
			.flat_map(|batch| batch.polys())
			.map(Polynomial::len)
			.max()
			.unwrap_or(0)
			.max(1);

		let batches = &self.batches;
		groups
			.par_iter()
			.map(|group| {
				let mut numerator = vec![F::zero(); max_len];
				for term in &group.terms {
					let poly = batches
						.get(&term.batch)
						.ok_or(Error::UnknownBatch { batch: term.batch })?
						.polys()
						.get(term.poly)
						.ok_or(Error::PolynomialIndexOutOfRange {
							batch: term.batch,
							index: term.poly,
						})?;
					for (acc, coeff) in numerator.iter_mut().zip(poly.coefficients()) {
						*acc += term.weight * coeff;
					}
				}
				numerator[0] -= group.claimed;
				Ok(Polynomial::new(numerator).divide_by_linear(group.point))
			})
			.try_reduce(Polynomial::zero, |lhs, rhs| Ok(&lhs + &rhs))
	}

	/// Opens every batch tree at the cosets of the given query indices.
	pub fn prove_initial(
		&self,
		query_indices: &[usize],
	) -> Result<Vec<Vec<InitialProof<F, ProverDigest<F, MerkleProver>>>>, Error> {
		let step = self.params.step_list()[0];
		let log_n_cosets = self.params.round_log_n_cosets(0);
		query_indices
			.iter()
			.map(|&index| {
				let coset_index = index & ((1 << log_n_cosets) - 1);
				self.batches
					.values()
					.map(|batch| {
						batch.prove_opening(self.merkle_prover, coset_index, log_n_cosets, step)
					})
					.collect()
			})
			.collect()
	}

	/// Opens every batch at its requested points.
	///
	/// The batch roots must already be observed by the transcript.
	#[instrument(skip_all, name = "lpc::prove", level = "debug")]
	pub fn prove<C: Challenger>(
		&self,
		transcript: &mut Transcript<C>,
	) -> Result<LpcProof<F, ProverDigest<F, MerkleProver>>, Error> {
		let evaluations = self.evaluate();
		observe_evaluations(transcript, &evaluations);
		let theta: F = transcript.sample();

		let quotient = self.combined_quotient(&evaluations, theta, 0)?;
		let codeword = quotient.evaluate_on(self.params.domains().base())?;
		let (fri_proof, query_indices) =
			fri::prove(self.params, self.merkle_prover, codeword, transcript)?;
		let initial_proofs = self.prove_initial(&query_indices)?;

		Ok(LpcProof {
			evaluations,
			fri_proof,
			initial_proofs,
		})
	}
}
