// Copyright 2024 Irreducible Inc.

use std::{collections::BTreeMap, sync::Arc};

use ark_ff::{FftField, PrimeField};
use placeholder_math::batch_invert;
use placeholder_utils::bail;
use tracing::instrument;

use super::{
	common::{
		combine_openings, count_opening_terms, observe_evaluations, BatchId, BatchPoints,
		InitialProof, LpcFixedData, LpcProof, PointGroup,
	},
	error::{Error, VerificationError},
};
use crate::{
	fiat_shamir::{CanSample, Challenger},
	merkle_tree::MerkleTreeScheme,
	protocols::fri::{self, FRIParams, FRIVerifier},
	transcript::Transcript,
};

/// The verifier side of the list polynomial commitment.
///
/// Mirrors [`super::LpcProver`]: batches are registered with their roots and sizes, and the same
/// evaluation points are requested in the same order.
#[derive(Debug)]
pub struct LpcVerifier<'a, F, VCS>
where
	F: FftField,
	VCS: MerkleTreeScheme<F>,
{
	params: &'a FRIParams<F>,
	vcs: &'a VCS,
	roots: BTreeMap<BatchId, VCS::Digest>,
	points: BatchPoints<F>,
	fixed: Option<Arc<LpcFixedData<F>>>,
}

impl<'a, F, VCS> LpcVerifier<'a, F, VCS>
where
	F: FftField + PrimeField,
	VCS: MerkleTreeScheme<F>,
{
	pub fn new(params: &'a FRIParams<F>, vcs: &'a VCS) -> Self {
		Self {
			params,
			vcs,
			roots: BTreeMap::new(),
			points: BTreeMap::new(),
			fixed: None,
		}
	}

	pub fn params(&self) -> &'a FRIParams<F> {
		self.params
	}

	/// Registers the root of a batch of `n_polys` polynomials.
	pub fn add_batch(
		&mut self,
		batch: BatchId,
		root: VCS::Digest,
		n_polys: usize,
	) -> Result<(), Error> {
		if self.roots.contains_key(&batch) {
			bail!(Error::DuplicateBatch { batch });
		}
		self.roots.insert(batch, root);
		self.points.insert(batch, vec![Vec::new(); n_polys]);
		Ok(())
	}

	pub fn set_fixed_data(&mut self, fixed: Arc<LpcFixedData<F>>) {
		self.fixed = Some(fixed);
	}

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
	pub fn roots(&self) -> &BTreeMap<BatchId, VCS::Digest> {
		&self.roots
	}

	pub fn points(&self) -> &BatchPoints<F> {
		&self.points
	}

	pub fn n_opening_terms(&self) -> usize {
		count_opening_terms(&self.points, self.fixed.as_deref())
	}

	/// Checks the claimed evaluations against the requested points and assigns the θ powers.
	pub fn combine(
		&self,
		evaluations: &BatchPoints<F>,
		theta: F,
		starting_power: u64,
	) -> Result<Vec<PointGroup<F>>, Error> {
		if let Some(fixed) = &self.fixed {
			for (&batch, evals) in &fixed.evals {
				let n_polys = self
					.points
					.get(&batch)
					.ok_or(Error::UnknownBatch { batch })?
					.len();
				if evals.len() > n_polys {
					bail!(Error::PolynomialIndexOutOfRange {
						batch,
						index: n_polys,
					});
				}
			}
		}
		Ok(combine_openings(
			&self.points,
			evaluations,
			self.fixed.as_deref(),
			theta,
			starting_power,
		)?)
	}

	/// Verifies the batch openings of one query and returns the combined quotient on the opened
	/// coset of D0.
	pub fn reconstruct_quotient(
		&self,
		query: usize,
		index: usize,
		proofs: &[InitialProof<F, VCS::Digest>],
		groups: &[PointGroup<F>],
	) -> Result<Vec<F>, Error> {
		let coset_size = 1 << self.params.step_list()[0];
		let log_n_cosets = self.params.round_log_n_cosets(0);
		let coset_index = index & ((1 << log_n_cosets) - 1);

		if proofs.len() != self.roots.len() {
			bail!(VerificationError::IncorrectBatchCount {
				query,
				expected: self.roots.len(),
			});
		}

		let mut opened = BTreeMap::new();
		for ((&batch, root), proof) in self.roots.iter().zip(proofs) {
			if proof.values.len() != self.points[&batch].len() * coset_size {
				bail!(VerificationError::IncorrectInitialProofShape { query, batch });
			}
			self.vcs
				.verify_opening(coset_index, &proof.values, log_n_cosets, root, &proof.vcs_proof)
				.map_err(|_| VerificationError::InvalidInitialOpening { query, batch })?;
			opened.insert(batch, proof.values.as_slice());
		}

		if groups.is_empty() {
			return Ok(vec![F::zero(); coset_size]);
		}

		let domain = self.params.domains().base();
		let mut denominators = (0..coset_size)
			.flat_map(|k| {
				let x = domain.element(coset_index + (k << log_n_cosets));
				groups.iter().map(move |group| x - group.point)
			})
			.collect::<Vec<_>>();
		batch_invert(&mut denominators).map_err(|_| VerificationError::EvaluationPointInDomain)?;

		let values = denominators
			.chunks(groups.len())
			.enumerate()
			.map(|(k, inverses)| {
				groups
					.iter()
					.zip(inverses)
					.map(|(group, &inverse)| {
						let weighted = group
							.terms
							.iter()
							.map(|term| term.weight * opened[&term.batch][term.poly * coset_size + k])
							.sum::<F>();
						(weighted - group.claimed) * inverse
					})
					.sum()
			})
			.collect();
		Ok(values)
	}

	/// Verifies an opening proof.
	///
	/// The batch roots must already be observed by the transcript.
	#[instrument(skip_all, name = "lpc::verify", level = "debug")]
	pub fn verify<C: Challenger>(
		&self,
		proof: &LpcProof<F, VCS::Digest>,
		transcript: &mut Transcript<C>,
	) -> Result<(), Error> {
		observe_evaluations(transcript, &proof.evaluations);
		let theta: F = transcript.sample();
		let groups = self.combine(&proof.evaluations, theta, 0)?;

		let fri_proof = &proof.fri_proof;
		let (fri_verifier, query_indices) = FRIVerifier::verify_commit_phase(
			self.params,
			self.vcs,
			&fri_proof.round_commitments,
			&fri_proof.final_polynomial,
			fri_proof.nonce,
			transcript,
		)?;

		if fri_proof.query_proofs.len() != query_indices.len() {
			bail!(fri::Error::from(fri::VerificationError::IncorrectQueryCount {
				expected: query_indices.len(),
			}));
		}
		if proof.initial_proofs.len() != query_indices.len() {
			bail!(VerificationError::IncorrectInitialProofCount {
				expected: query_indices.len(),
			});
		}

		for (query, (&index, (query_proof, initial_proofs))) in query_indices
			.iter()
			.zip(fri_proof.query_proofs.iter().zip(&proof.initial_proofs))
			.enumerate()
		{
			let quotient = self.reconstruct_quotient(query, index, initial_proofs, &groups)?;
			fri_verifier.verify_query(index, query_proof, Some(&quotient))?;
		}
		Ok(())
	}
}
