// Copyright 2024 Irreducible Inc.

use std::collections::{hash_map::Entry, BTreeMap, HashMap};

use ark_ff::PrimeField;
use placeholder_math::dag::DagNode;
use placeholder_utils::{bail, ensure, SerializeBytes};
use tracing::instrument;

use super::{
	error::{Error, VerificationError},
	rotate_point, Column, CommonData, ConstraintExpr, Oracle, OracleVar, PlaceholderProof,
	FIXED_VALUES_BATCH, LOOKUP_BATCH, PERMUTATION_BATCH, QUOTIENT_BATCH, VARIABLE_VALUES_BATCH,
};
use crate::{
	fiat_shamir::{CanSample, Challenger},
	merkle_tree::MerkleTreeScheme,
	poly_commit::lpc::{BatchId, BatchPoints, LpcVerifier},
	protocols::{
		gates::combine_evaluations,
		lookup::{lookup_constraints, LookupChallenges},
		permutation::permutation_constraints,
	},
	transcript::Transcript,
};

/// Reads claimed evaluations out of the opening proof.
struct Openings<'a, F: PrimeField, Digest> {
	common: &'a CommonData<F, Digest>,
	rotations: BTreeMap<BatchId, Vec<Vec<i32>>>,
	evaluations: &'a BatchPoints<F>,
	xi: F,
}

impl<F, Digest> Openings<'_, F, Digest>
where
	F: PrimeField,
	Digest: SerializeBytes,
{
	fn value(&self, var: OracleVar) -> Result<F, VerificationError> {
		let Some((batch, poly)) = self.common.locate(var.oracle) else {
			let point = rotate_point(&self.common.basic_domain, self.xi, var.rotation);
			return Ok(self.common.basic_domain.lagrange_first_at(point));
		};
		let point = self
			.rotations
			.get(&batch)
			.and_then(|polys| polys.get(poly))
			.and_then(|rotations| rotations.iter().position(|&r| r == var.rotation));
		point
			.and_then(|point| {
				self.evaluations
					.get(&batch)
					.and_then(|polys| polys.get(poly))
					.and_then(|values| values.get(point))
			})
			.copied()
			.ok_or(VerificationError::MissingEvaluation {
				batch,
				poly,
				point: point.unwrap_or(usize::MAX),
			})
	}

	/// The quotient chunks at the evaluation point, lowest chunk first.
	fn quotient_chunks(&self) -> Result<Vec<F>, VerificationError> {
		(0..self.common.quotient_chunks())
			.map(|poly| {
				self.evaluations
					.get(&QUOTIENT_BATCH)
					.and_then(|polys| polys.get(poly))
					.and_then(|values| values.first())
					.copied()
					.ok_or(VerificationError::MissingEvaluation {
						batch: QUOTIENT_BATCH,
						poly,
						point: 0,
					})
			})
			.collect()
	}

	/// The values of every variable of the expressions.
	fn collect<'e>(
		&self,
		expressions: impl IntoIterator<Item = &'e ConstraintExpr<F>>,
		values: &mut HashMap<OracleVar, F>,
	) -> Result<(), VerificationError>
	where
		F: 'e,
	{
		for expr in expressions {
			for var in expr.variables() {
				if let Entry::Vacant(entry) = values.entry(var) {
					entry.insert(self.value(var)?);
				}
			}
		}
		Ok(())
	}
}

/// Verifies a proof against the common data and the public input.
///
/// Each public input column holds at most `usable_rows` values; missing rows are zero.
#[instrument("constraint_system::verify", skip_all, level = "debug")]
pub fn verify<F, VCS, C>(
	common: &CommonData<F, VCS::Digest>,
	proof: &PlaceholderProof<F, VCS::Digest>,
	public_input: &[Vec<F>],
	vcs: &VCS,
	transcript: &mut Transcript<C>,
) -> Result<(), Error>
where
	F: PrimeField,
	VCS: MerkleTreeScheme<F>,
	C: Challenger,
{
	let cs = &common.constraint_system;
	let table = cs.table;
	let layout = common.layout;
	let basic_domain = &common.basic_domain;

	ensure!(
		public_input.len() == table.public_input_columns,
		VerificationError::IncorrectPublicInputCount {
			expected: table.public_input_columns,
		}
	);
	for (column, values) in public_input.iter().enumerate() {
		ensure!(
			values.len() <= table.usable_rows,
			VerificationError::PublicInputTooLong {
				column,
				max: table.usable_rows,
			}
		);
	}

	let rotations = common.opening_rotations();
	for &batch in rotations.keys().filter(|&&batch| batch != FIXED_VALUES_BATCH) {
		ensure!(
			proof.commitments.contains_key(&batch),
			VerificationError::MissingCommitment { batch }
		);
	}
	for &batch in proof.commitments.keys() {
		ensure!(
			batch != FIXED_VALUES_BATCH && rotations.contains_key(&batch),
			VerificationError::UnexpectedCommitment { batch }
		);
	}

	let mut lpc = LpcVerifier::new(&common.fri_params, vcs);
	lpc.add_batch(
		FIXED_VALUES_BATCH,
		common.fixed_root.clone(),
		rotations[&FIXED_VALUES_BATCH].len(),
	)?;
	lpc.set_fixed_data(common.fixed_data.clone());
	let receive = |lpc: &mut LpcVerifier<'_, F, VCS>,
	               transcript: &mut Transcript<C>,
	               batch: BatchId|
	 -> Result<(), Error> {
		if let Some(root) = proof.commitments.get(&batch) {
			lpc.add_batch(batch, root.clone(), rotations[&batch].len())?;
			transcript.observe(root);
		}
		Ok(())
	};

	common.observe(transcript);
	receive(&mut lpc, transcript, VARIABLE_VALUES_BATCH)?;

	let lookup_challenges = if layout.has_lookups() {
		let theta = transcript.sample();
		receive(&mut lpc, transcript, LOOKUP_BATCH)?;
		let alpha = transcript.sample();
		Some((theta, alpha))
	} else {
		None
	};

	let beta = transcript.sample();
	let gamma = transcript.sample();
	receive(&mut lpc, transcript, PERMUTATION_BATCH)?;

	let gate_batching: F = transcript.sample();
	let helper_batching = transcript.sample();
	let table_batching = transcript.sample();
	let constraint_batching = transcript.sample();
	receive(&mut lpc, transcript, QUOTIENT_BATCH)?;

	let xi: F = transcript.sample();
	let n_rows = table.rows_amount as u64;
	let xi_n = xi.pow([n_rows]);
	if xi_n.is_one() {
		bail!(VerificationError::EvaluationPointInDomain);
	}
	for (&batch, polys) in &rotations {
		for (poly, poly_rotations) in polys.iter().enumerate() {
			for &rotation in poly_rotations {
				lpc.append_eval_point(batch, poly, rotate_point(basic_domain, xi, rotation))?;
			}
		}
	}

	let mut constraints = permutation_constraints(
		&common.permuted_columns,
		&layout,
		common.max_degree,
		beta,
		gamma,
	);
	if let Some((theta, alpha)) = lookup_challenges {
		let challenges = LookupChallenges {
			theta,
			alpha,
			helper_batching,
			table_batching,
		};
		constraints.extend(lookup_constraints(cs, &layout, &challenges));
	}

	let openings = Openings {
		common,
		rotations,
		evaluations: &proof.lpc_proof.evaluations,
		xi,
	};
	let mut values = HashMap::new();
	openings.collect(&constraints, &mut values)?;
	for node in common.dag.nodes() {
		if let DagNode::Variable(var) = node {
			let var = OracleVar::from(*var);
			if let Entry::Vacant(entry) = values.entry(var) {
				entry.insert(openings.value(var)?);
			}
		}
	}

	// Every variable of the constraints and the gate DAG was read above.
	let value_of = |var: &OracleVar| values[var];
	let mut evaluations = Vec::with_capacity(constraints.len() + 1);
	if !common.dag.roots().is_empty() {
		let gate_values = common
			.dag
			.evaluate_at(|var| value_of(&OracleVar::from(*var)));
		evaluations.push(combine_evaluations(&gate_values, gate_batching));
	}
	evaluations.extend(
		constraints
			.iter()
			.map(|constraint| constraint.evaluate(&value_of)),
	);
	let combined = combine_evaluations(&evaluations, constraint_batching);

	let chunks = openings.quotient_chunks()?;
	let quotient_at_xi = chunks
		.iter()
		.rev()
		.fold(F::zero(), |acc, value| acc * xi_n + value);
	ensure!(combined == (xi_n - F::one()) * quotient_at_xi, VerificationError::QuotientMismatch);

	for (column, values) in public_input.iter().enumerate() {
		let expected = basic_domain.evaluate_barycentric(values, xi)?;
		let claimed =
			openings.value(OracleVar::new(Oracle::Column(Column::public_input(column)), 0))?;
		ensure!(expected == claimed, VerificationError::PublicInputMismatch { column });
	}

	lpc.verify(&proof.lpc_proof, transcript)?;
	Ok(())
}
