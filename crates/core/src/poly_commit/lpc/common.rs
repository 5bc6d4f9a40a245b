// Copyright 2024-2025 Irreducible Inc.

use std::{collections::BTreeMap, sync::Arc};

use ark_ff::{FftField, Field, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use bytes::{Buf, BufMut};
use placeholder_math::Polynomial;
use placeholder_utils::{
	bail,
	serialization::{deserialize_canonical_vec, read_length_prefix, serialize_canonical_slice},
	DeserializeBytes, SerializationError, SerializeBytes,
};
use rayon::prelude::*;
use tracing::instrument;

use super::error::{Error, VerificationError};
use crate::{
	fiat_shamir::{CanSample, Challenger},
	merkle_tree::{MerkleTreeProver, ProverDigest},
	protocols::fri::{coset_values, FRIParams, FRIProof, QueryRoundProof},
	transcript::Transcript,
};

/// Identifies a batch of polynomials committed under one Merkle root.
///
/// Batches are always enumerated in ascending identifier order.
pub type BatchId = usize;

/// Per batch, per polynomial, a list of field elements: the requested evaluation points, or the
/// claimed evaluations at those points.
pub type BatchPoints<F> = BTreeMap<BatchId, Vec<Vec<F>>>;

/// The opening of one batch tree at a query, with every polynomial's coset values in turn.
pub type InitialProof<F, Digest> = QueryRoundProof<F, Digest>;

/// Evaluations of the fixed batches at the setup point η.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LpcFixedData<F> {
	pub eta: F,
	/// Per fixed batch, the evaluation of each polynomial at η.
	pub evals: BTreeMap<BatchId, Vec<F>>,
}

/// A batch of polynomials with their evaluations on D0 and the Merkle tree over them.
///
/// Leaf `j` of the tree holds, for every polynomial in order, the coset of D0 that the first FRI
/// round folds into position `j`.
#[derive(Debug)]
pub struct CommittedBatch<F, MerkleProver>
where
	F: FftField,
	MerkleProver: MerkleTreeProver<F>,
{
	polys: Vec<Polynomial<F>>,
	evals: Vec<Vec<F>>,
	committed: MerkleProver::Committed,
	root: ProverDigest<F, MerkleProver>,
}

impl<F, MerkleProver> CommittedBatch<F, MerkleProver>
where
	F: FftField,
	MerkleProver: MerkleTreeProver<F>,
{
	#[instrument(skip_all, fields(n_polys = polys.len()), level = "debug")]
	pub fn commit(
		params: &FRIParams<F>,
		merkle_prover: &MerkleProver,
		batch: BatchId,
		polys: Vec<Polynomial<F>>,
	) -> Result<Self, Error> {
		if polys.is_empty() {
			bail!(Error::EmptyBatch { batch });
		}

		let domain = params.domains().base();
		let evals = polys
			.par_iter()
			.map(|poly| poly.evaluate_on(domain))
			.collect::<Result<Vec<_>, _>>()?;

		let step = params.step_list()[0];
		let log_n_cosets = params.round_log_n_cosets(0);
		let evals_ref = &evals;
		let (commitment, committed) = merkle_prover.commit_iterated(
			(0..1 << log_n_cosets).into_par_iter().map(|index| {
				evals_ref.iter().flat_map(move |poly_evals| {
					(0..1 << step).map(move |k| poly_evals[index + (k << log_n_cosets)])
				})
			}),
			log_n_cosets,
		)?;

		Ok(Self {
			polys,
			evals,
			committed,
			root: commitment.root,
		})
	}

	pub fn polys(&self) -> &[Polynomial<F>] {
		&self.polys
	}

	/// The evaluations of each polynomial on D0.
	pub fn evals(&self) -> &[Vec<F>] {
		&self.evals
	}

	pub fn root(&self) -> &ProverDigest<F, MerkleProver> {
		&self.root
	}

	pub fn len(&self) -> usize {
		self.polys.len()
	}

	pub fn is_empty(&self) -> bool {
		self.polys.is_empty()
	}

	pub(super) fn prove_opening(
		&self,
		merkle_prover: &MerkleProver,
		coset_index: usize,
		log_n_cosets: usize,
		step: usize,
	) -> Result<InitialProof<F, ProverDigest<F, MerkleProver>>, Error> {
		let values = self
			.evals
			.iter()
			.flat_map(|poly_evals| coset_values(poly_evals, coset_index, log_n_cosets, step))
			.collect();
		let vcs_proof = merkle_prover.prove_opening(&self.committed, coset_index)?;
		Ok(InitialProof { values, vcs_proof })
	}
}

/// Absorbs the structure of the fixed batches, draws η and evaluates every fixed polynomial at it.
pub fn setup_fixed_batches<F, MerkleProver, C>(
	batches: &BTreeMap<BatchId, Arc<CommittedBatch<F, MerkleProver>>>,
	transcript: &mut Transcript<C>,
) -> LpcFixedData<F>
where
	F: FftField + PrimeField,
	MerkleProver: MerkleTreeProver<F>,
	C: Challenger,
{
	transcript.observe_label("lpc setup");
	for (&batch, committed) in batches {
		transcript.observe(&batch);
		transcript.observe(&committed.len());
		transcript.observe(committed.root());
	}
	let eta: F = transcript.sample();

	let evals = batches
		.iter()
		.map(|(&batch, committed)| {
			let values = committed
				.polys()
				.iter()
				.map(|poly| poly.evaluate(eta))
				.collect();
			(batch, values)
		})
		.collect();
	LpcFixedData { eta, evals }
}

/// One polynomial in the combined quotient, weighted by its power of θ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightedTerm<F> {
	pub batch: BatchId,
	pub poly: usize,
	pub weight: F,
}

/// The terms of the combined quotient that share the denominator `x - point`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointGroup<F> {
	pub point: F,
	pub terms: Vec<WeightedTerm<F>>,
	/// The weighted sum of the claimed evaluations of all terms.
	pub claimed: F,
}

/// The number of θ powers that the openings consume.
pub fn count_opening_terms<F>(points: &BatchPoints<F>, fixed: Option<&LpcFixedData<F>>) -> usize {
	let requested = points
		.values()
		.flatten()
		.map(|poly_points| poly_points.len())
		.sum::<usize>();
	let at_eta = fixed.map_or(0, |fixed| fixed.evals.values().map(Vec::len).sum());
	requested + at_eta
}

/// Groups every (batch, polynomial, point) triple by point and assigns the θ powers.
///
/// Powers are handed out in a fixed order: for each distinct point in order of first appearance,
/// for each batch in ascending order, for each polynomial requested at that point, one power. The
/// fixed batches at η follow in the same batch and polynomial order. The first power is
/// `θ^starting_power`.
pub fn combine_openings<F: Field>(
	points: &BatchPoints<F>,
	evaluations: &BatchPoints<F>,
	fixed: Option<&LpcFixedData<F>>,
	theta: F,
	starting_power: u64,
) -> Result<Vec<PointGroup<F>>, VerificationError> {
	if points.len() != evaluations.len() {
		let batch = points
			.keys()
			.find(|batch| !evaluations.contains_key(batch))
			.or_else(|| evaluations.keys().find(|batch| !points.contains_key(batch)))
			.copied()
			.unwrap_or_default();
		return Err(VerificationError::IncorrectEvaluationsShape { batch });
	}
	for (&batch, poly_points) in points {
		let shape_matches = evaluations.get(&batch).is_some_and(|poly_evals| {
			poly_evals.len() == poly_points.len()
				&& poly_evals
					.iter()
					.zip(poly_points)
					.all(|(evals, points)| evals.len() == points.len())
		});
		if !shape_matches {
			return Err(VerificationError::IncorrectEvaluationsShape { batch });
		}
	}

	let mut distinct_points = Vec::new();
	for point in points.values().flatten().flatten() {
		if !distinct_points.contains(point) {
			distinct_points.push(*point);
		}
	}

	let mut weight = theta.pow([starting_power]);
	let mut next_weight = || {
		let current = weight;
		weight *= theta;
		current
	};

	let mut groups = Vec::with_capacity(distinct_points.len() + 1);
	for point in distinct_points {
		let mut group = PointGroup {
			point,
			terms: Vec::new(),
			claimed: F::zero(),
		};
		for (&batch, poly_points) in points {
			for (poly, requested) in poly_points.iter().enumerate() {
				for (i, _) in requested.iter().enumerate().filter(|(_, p)| **p == point) {
					let weight = next_weight();
					group.claimed += weight * evaluations[&batch][poly][i];
					group.terms.push(WeightedTerm {
						batch,
						poly,
						weight,
					});
				}
			}
		}
		groups.push(group);
	}

	if let Some(fixed) = fixed {
		let mut group = PointGroup {
			point: fixed.eta,
			terms: Vec::new(),
			claimed: F::zero(),
		};
		for (&batch, evals) in &fixed.evals {
			for (poly, &eval) in evals.iter().enumerate() {
				let weight = next_weight();
				group.claimed += weight * eval;
				group.terms.push(WeightedTerm {
					batch,
					poly,
					weight,
				});
			}
		}
		if !group.terms.is_empty() {
			groups.push(group);
		}
	}

	Ok(groups)
}

/// Absorbs claimed evaluations in batch, polynomial and point order.
pub fn observe_evaluations<F: CanonicalSerialize, C: Challenger>(
	transcript: &mut Transcript<C>,
	evaluations: &BatchPoints<F>,
) {
	for poly_evals in evaluations.values() {
		for evals in poly_evals {
			transcript.observe_scalars(evals);
		}
	}
}

pub(crate) fn serialize_batch_points<F: CanonicalSerialize>(
	points: &BatchPoints<F>,
	mut write_buf: impl BufMut,
) -> Result<(), SerializationError> {
	points.len().serialize(&mut write_buf)?;
	for (batch, poly_values) in points {
		batch.serialize(&mut write_buf)?;
		poly_values.len().serialize(&mut write_buf)?;
		for values in poly_values {
			serialize_canonical_slice(values, &mut write_buf)?;
		}
	}
	Ok(())
}

pub(crate) fn deserialize_batch_points<F: CanonicalDeserialize>(
	mut read_buf: impl Buf,
) -> Result<BatchPoints<F>, SerializationError> {
	let n_batches = read_length_prefix(&mut read_buf)?;
	let mut points = BTreeMap::new();
	for _ in 0..n_batches {
		let batch = usize::deserialize(&mut read_buf)?;
		let n_polys = read_length_prefix(&mut read_buf)?;
		let poly_values = (0..n_polys)
			.map(|_| deserialize_canonical_vec(&mut read_buf))
			.collect::<Result<Vec<_>, _>>()?;
		points.insert(batch, poly_values);
	}
	Ok(points)
}

/// An LPC opening proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LpcProof<F, Digest> {
	/// Claimed evaluations, per batch, per polynomial, per requested point.
	pub evaluations: BatchPoints<F>,
	/// The FRI proof for the combined quotient.
	pub fri_proof: FRIProof<F, Digest>,
	/// Per query, the opening of every batch tree in ascending batch order.
	pub initial_proofs: Vec<Vec<InitialProof<F, Digest>>>,
}

/// Writes the FRI commit phase, then per query the batch openings followed by the round
/// openings, then the nonce.
pub(crate) fn serialize_openings<F, Digest>(
	fri_proof: &FRIProof<F, Digest>,
	initial_proofs: &[Vec<InitialProof<F, Digest>>],
	mut write_buf: impl BufMut,
) -> Result<(), SerializationError>
where
	F: CanonicalSerialize,
	Digest: SerializeBytes,
{
	fri_proof.round_commitments.serialize(&mut write_buf)?;
	serialize_canonical_slice(&fri_proof.final_polynomial, &mut write_buf)?;
	fri_proof.query_proofs.len().serialize(&mut write_buf)?;
	for (query, query_proof) in fri_proof.query_proofs.iter().enumerate() {
		match initial_proofs.get(query) {
			Some(initial) => initial.serialize(&mut write_buf)?,
			None => 0usize.serialize(&mut write_buf)?,
		}
		query_proof.serialize(&mut write_buf)?;
	}
	fri_proof.nonce.serialize(&mut write_buf)
}

#[allow(clippy::type_complexity)]
pub(crate) fn deserialize_openings<F, Digest>(
	mut read_buf: impl Buf,
) -> Result<(FRIProof<F, Digest>, Vec<Vec<InitialProof<F, Digest>>>), SerializationError>
where
	F: CanonicalDeserialize,
	Digest: DeserializeBytes,
{
	let round_commitments = Vec::deserialize(&mut read_buf)?;
	let final_polynomial = deserialize_canonical_vec(&mut read_buf)?;
	let n_queries = read_length_prefix(&mut read_buf)?;
	let mut initial_proofs = Vec::with_capacity(n_queries);
	let mut query_proofs = Vec::with_capacity(n_queries);
	for _ in 0..n_queries {
		initial_proofs.push(Vec::deserialize(&mut read_buf)?);
		query_proofs.push(Vec::deserialize(&mut read_buf)?);
	}
	let nonce = u64::deserialize(&mut read_buf)?;

	let fri_proof = FRIProof {
		round_commitments,
		final_polynomial,
		query_proofs,
		nonce,
	};
	Ok((fri_proof, initial_proofs))
}

impl<F, Digest> SerializeBytes for LpcProof<F, Digest>
where
	F: CanonicalSerialize,
	Digest: SerializeBytes,
{
	fn serialize(&self, mut write_buf: impl BufMut) -> Result<(), SerializationError> {
		serialize_batch_points(&self.evaluations, &mut write_buf)?;
		serialize_openings(&self.fri_proof, &self.initial_proofs, &mut write_buf)
	}
}

impl<F, Digest> DeserializeBytes for LpcProof<F, Digest>
where
	F: CanonicalDeserialize,
	Digest: DeserializeBytes,
{
	fn deserialize(mut read_buf: impl Buf) -> Result<Self, SerializationError> {
		let evaluations = deserialize_batch_points(&mut read_buf)?;
		let (fri_proof, initial_proofs) = deserialize_openings(&mut read_buf)?;
		Ok(Self {
			evaluations,
			fri_proof,
			initial_proofs,
		})
	}
}
