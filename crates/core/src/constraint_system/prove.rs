// Copyright 2024 Irreducible Inc.

use std::collections::BTreeMap;

use ark_ff::{FftField, PrimeField};
use placeholder_math::{
	dag::{ColumnOracle, DagEvaluator, DagExpressionBuilder, ShiftedColumn},
	EvaluationDomain, Polynomial,
};
use placeholder_utils::SerializeBytes;
use rand::Rng;
use tracing::{debug, instrument, warn};

use super::{
	preprocess::lift_columns,
	rotate_point, Assignment, ColumnKind, CommonData, Error, OracleVar, PlaceholderProof,
	PreprocessedData, Variable, FIXED_VALUES_BATCH, LOOKUP_BATCH, PERMUTATION_BATCH,
	QUOTIENT_BATCH, VARIABLE_VALUES_BATCH,
};
use crate::{
	fiat_shamir::{CanSample, Challenger},
	merkle_tree::{MerkleTreeProver, ProverDigest},
	poly_commit::lpc::{BatchId, LpcProver},
	protocols::{
		gates::combine_values,
		lookup::{
			compressed_inputs, compressed_rows, compressed_values, compute_counts, helper_values,
			lookup_constraints, running_sum_values, table_helper_values, LookupChallenges,
		},
		permutation::{
			grand_product_values, identity_values, permutation_constraints, sigma_values,
		},
	},
	transcript::Transcript,
};

/// Reads committed polynomials on the extended domain.
///
/// A rotation by `r` rows of the table is a shift by `r·N/n` points of the extended domain.
struct ExtendedOracle<'a, F: FftField, Digest> {
	common: &'a CommonData<F, Digest>,
	batches: BTreeMap<BatchId, &'a [Vec<F>]>,
	first_row: &'a [F],
	ratio: usize,
}

impl<F, Digest> ColumnOracle<F, OracleVar> for ExtendedOracle<'_, F, Digest>
where
	F: PrimeField,
	Digest: SerializeBytes + Sync,
{
	fn column(&self, var: &OracleVar) -> ShiftedColumn<'_, F> {
		let values = match self.common.locate(var.oracle) {
			Some((batch, index)) => self.batches[&batch][index].as_slice(),
			None => self.first_row,
		};
		let shift = (i64::from(var.rotation) * self.ratio as i64).rem_euclid(values.len() as i64);
		ShiftedColumn::with_shift(values, shift as usize)
	}
}

impl<F, Digest> ColumnOracle<F, Variable> for ExtendedOracle<'_, F, Digest>
where
	F: PrimeField,
	Digest: SerializeBytes + Sync,
{
	fn column(&self, var: &Variable) -> ShiftedColumn<'_, F> {
		ColumnOracle::<F, OracleVar>::column(self, &OracleVar::from(*var))
	}
}

/// Compressed lookup values and counts, kept between the count and helper commitments.
struct LookupRound<F> {
	challenges: LookupChallenges<F>,
	inputs: Vec<Vec<F>>,
	table: Vec<Vec<F>>,
	counts: Vec<Vec<F>>,
}

/// Commits batches, keeping their roots and their values on the extended domain.
struct Committer<'a, F, MerkleProver>
where
	F: FftField,
	MerkleProver: MerkleTreeProver<F>,
{
	lpc: LpcProver<'a, F, MerkleProver>,
	extended_domain: &'a EvaluationDomain<F>,
	roots: BTreeMap<BatchId, ProverDigest<F, MerkleProver>>,
	extended: BTreeMap<BatchId, Vec<Vec<F>>>,
}

impl<F, MerkleProver> Committer<'_, F, MerkleProver>
where
	F: PrimeField,
	MerkleProver: MerkleTreeProver<F>,
{
	fn commit_polys<C: Challenger>(
		&mut self,
		transcript: &mut Transcript<C>,
		batch: BatchId,
		polys: Vec<Polynomial<F>>,
	) -> Result<(), Error> {
		let root = self.lpc.commit_batch(batch, polys)?;
		transcript.observe(&root);
		self.roots.insert(batch, root);
		Ok(())
	}

	/// Interpolates and commits the columns of a batch, skipping empty batches.
	fn commit_columns<C: Challenger>(
		&mut self,
		transcript: &mut Transcript<C>,
		batch: BatchId,
		values: &[Vec<F>],
	) -> Result<(), Error> {
		if values.is_empty() {
			return Ok(());
		}
		let (polys, extended) = lift_columns(values, self.extended_domain.size())?;
		self.extended.insert(batch, extended);
		self.commit_polys(transcript, batch, polys)
	}
}

/// Proves that an assignment satisfies the preprocessed constraint system.
///
/// The witness rows from `usable_rows` on are overwritten with random values before committing.
/// The transcript must be fresh or forked identically to the verifier's.
pub fn prove<F, MerkleProver, C>(
	preprocessed: &PreprocessedData<F, MerkleProver>,
	assignment: &Assignment<F>,
	merkle_prover: &MerkleProver,
	transcript: &mut Transcript<C>,
	rng: impl Rng,
) -> Result<PlaceholderProof<F, ProverDigest<F, MerkleProver>>, Error>
where
	F: PrimeField,
	MerkleProver: MerkleTreeProver<F>,
	C: Challenger,
{
	prove_impl(preprocessed, assignment, merkle_prover, transcript, rng, |_| {})
}

/// [`prove`] with a hook that may alter the lookup counts before they are committed.
#[cfg(test)]
pub(super) fn prove_with_counts_hook<F, MerkleProver, C>(
	preprocessed: &PreprocessedData<F, MerkleProver>,
	assignment: &Assignment<F>,
	merkle_prover: &MerkleProver,
	transcript: &mut Transcript<C>,
	rng: impl Rng,
	counts_hook: impl FnOnce(&mut [Vec<F>]),
) -> Result<PlaceholderProof<F, ProverDigest<F, MerkleProver>>, Error>
where
	F: PrimeField,
	MerkleProver: MerkleTreeProver<F>,
	C: Challenger,
{
	prove_impl(preprocessed, assignment, merkle_prover, transcript, rng, counts_hook)
}

#[instrument("constraint_system::prove", skip_all, level = "debug")]
fn prove_impl<F, MerkleProver, C>(
	preprocessed: &PreprocessedData<F, MerkleProver>,
	assignment: &Assignment<F>,
	merkle_prover: &MerkleProver,
	transcript: &mut Transcript<C>,
	mut rng: impl Rng,
	counts_hook: impl FnOnce(&mut [Vec<F>]),
) -> Result<PlaceholderProof<F, ProverDigest<F, MerkleProver>>, Error>
where
	F: PrimeField,
	MerkleProver: MerkleTreeProver<F>,
	C: Challenger,
{
	let common = preprocessed.common_data.as_ref();
	let cs = &common.constraint_system;
	let table = cs.table;
	let (n_rows, usable_rows) = (table.rows_amount, table.usable_rows);
	let layout = common.layout;
	let basic_domain = &common.basic_domain;
	let extended_domain = &preprocessed.extended_domain;

	assignment.check_shape(&table)?;
	let mut assignment = assignment.clone();
	assignment.blind_witness(usable_rows, &mut rng);

	let mut lpc = LpcProver::new(&common.fri_params, merkle_prover);
	lpc.add_committed_batch(FIXED_VALUES_BATCH, preprocessed.fixed_batch.clone())?;
	lpc.set_fixed_data(common.fixed_data.clone());
	let mut committer = Committer {
		lpc,
		extended_domain,
		roots: BTreeMap::new(),
		extended: BTreeMap::new(),
	};

	common.observe(transcript);

	// Witness and public input columns
	let variable_values = assignment
		.columns(ColumnKind::Witness)
		.iter()
		.chain(assignment.columns(ColumnKind::PublicInput))
		.cloned()
		.collect::<Vec<_>>();
	committer.commit_columns(transcript, VARIABLE_VALUES_BATCH, &variable_values)?;

	// Lookup counts
	let lookup_round = if layout.has_lookups() {
		let theta = transcript.sample();
		let inputs = compressed_rows(&compressed_inputs(cs, theta), n_rows, &assignment)?;
		let table = compressed_rows(&compressed_values(cs, theta), n_rows, &assignment)?;
		let mut counts = compute_counts(&inputs, &table, usable_rows);
		counts_hook(&mut counts);
		committer.commit_columns(transcript, LOOKUP_BATCH, &counts)?;
		let alpha = transcript.sample();
		Some(LookupRound {
			challenges: LookupChallenges {
				theta,
				alpha,
				helper_batching: F::zero(),
				table_batching: F::zero(),
			},
			inputs,
			table,
			counts,
		})
	} else {
		None
	};

	// Grand products and lookup helpers
	let beta = transcript.sample();
	let gamma = transcript.sample();
	let mut permutation_values = Vec::with_capacity(layout.len());
	if layout.chunks > 0 {
		let identities = identity_values(basic_domain, common.permuted_columns.len());
		let sigmas = sigma_values(&identities, &common.permuted_columns, &cs.copy_constraints);
		let columns = common
			.permuted_columns
			.iter()
			.map(|&column| assignment.column(column))
			.collect::<Vec<_>>();
		permutation_values.extend(grand_product_values(
			&columns,
			&identities,
			&sigmas,
			beta,
			gamma,
			usable_rows,
			common.max_degree,
			&mut rng,
		)?);
	}
	if let Some(round) = &lookup_round {
		let alpha = round.challenges.alpha;
		let helpers = helper_values(&round.inputs, alpha)?;
		let table_helpers = table_helper_values(&round.table, &round.counts, alpha)?;
		let running_sum =
			running_sum_values(&helpers, &table_helpers, n_rows, usable_rows, &mut rng);
		permutation_values.extend(helpers);
		permutation_values.extend(table_helpers);
		permutation_values.push(running_sum);
	}
	committer.commit_columns(transcript, PERMUTATION_BATCH, &permutation_values)?;

	// Quotient
	let gate_batching: F = transcript.sample();
	let helper_batching = transcript.sample();
	let table_batching = transcript.sample();
	let constraint_batching = transcript.sample();

	let mut constraints = permutation_constraints(
		&common.permuted_columns,
		&layout,
		common.max_degree,
		beta,
		gamma,
	);
	if let Some(round) = &lookup_round {
		let challenges = LookupChallenges {
			helper_batching,
			table_batching,
			..round.challenges
		};
		constraints.extend(lookup_constraints(cs, &layout, &challenges));
	}

	let mut batches = BTreeMap::<BatchId, &[Vec<F>]>::new();
	batches.insert(FIXED_VALUES_BATCH, preprocessed.fixed_extended.as_slice());
	for (&batch, values) in &committer.extended {
		batches.insert(batch, values.as_slice());
	}
	let oracle = ExtendedOracle {
		common,
		batches,
		first_row: &preprocessed.first_row_extended,
		ratio: extended_domain.size() / n_rows,
	};

	let extended_size = extended_domain.size();
	let mut constraint_values = Vec::with_capacity(constraints.len() + 1);
	let n_gate_roots = common.dag.roots().len();
	if n_gate_roots > 0 {
		let roots = (0..n_gate_roots).collect::<Vec<_>>();
		let gate_values = DagEvaluator::new(&common.dag, &roots)?.evaluate(extended_size, &oracle)?;
		if let Some(combined) = combine_values(&gate_values, gate_batching)? {
			constraint_values.push(combined.into_values());
		}
	}
	if !constraints.is_empty() {
		let mut builder = DagExpressionBuilder::new();
		let roots = constraints
			.iter()
			.map(|constraint| builder.add_expression(constraint))
			.collect::<Vec<_>>();
		let dag = builder.build();
		let values = DagEvaluator::new(&dag, &roots)?.evaluate(extended_size, &oracle)?;
		constraint_values.extend(values);
	}
	debug!(
		constraints = constraint_values.len(),
		extended_size, "evaluated quotient constraints"
	);

	let numerator = combine_values(&constraint_values, constraint_batching)?
		.map_or_else(Polynomial::zero, |combined| combined.coefficients());
	let (quotient, remainder) = numerator.div_rem_vanishing(n_rows);
	if !remainder.is_zero() {
		warn!("the constraints do not vanish on the table, the proof will be rejected");
	}
	let chunks = quotient.split(n_rows, common.quotient_chunks())?;
	committer.commit_polys(transcript, QUOTIENT_BATCH, chunks)?;

	// Openings
	let Committer { mut lpc, roots, .. } = committer;
	let xi: F = transcript.sample();
	for (batch, polys) in common.opening_rotations() {
		for (poly, rotations) in polys.iter().enumerate() {
			for &rotation in rotations {
				let point = rotate_point(basic_domain, xi, rotation);
				lpc.append_eval_point(batch, poly, point)?;
			}
		}
	}
	let lpc_proof = lpc.prove(transcript)?;

	Ok(PlaceholderProof {
		commitments: roots,
		lpc_proof,
	})
}
