// Copyright 2024 Irreducible Inc.

use std::{collections::BTreeMap, ops::Range, sync::Arc};

use ark_ff::{FftField, PrimeField};
use placeholder_math::{Error as MathError, EvaluationDomain, Polynomial, PolynomialDfs};
use placeholder_utils::checked_arithmetics::log2_ceil_usize;
use rayon::prelude::*;
use tracing::{debug, instrument};

use super::{
	Assignment, ColumnKind, CommonData, ConstraintSystem, Error, PermutationLayout,
	PlaceholderParams, FIXED_VALUES_BATCH,
};
use crate::{
	merkle_tree::{MerkleTreeProver, ProverDigest},
	poly_commit::lpc::{setup_fixed_batches, CommittedBatch},
	protocols::{
		gates::gate_dag,
		permutation::{identity_values, n_chunks, sigma_values},
	},
	transcript::Transcript,
};

/// Everything the prover reuses across proofs of one constraint system.
///
/// Read-only once built; share it between proving sessions behind an [`Arc`].
#[derive(Debug)]
pub struct PreprocessedData<F, MerkleProver>
where
	F: FftField,
	MerkleProver: MerkleTreeProver<F>,
{
	pub common_data: Arc<CommonData<F, ProverDigest<F, MerkleProver>>>,
	pub fixed_batch: Arc<CommittedBatch<F, MerkleProver>>,
	/// The domain the quotient constraints are evaluated on, of size `rows_amount` times the
	/// maximal degree rounded up to a power of two.
	pub extended_domain: EvaluationDomain<F>,
	/// The fixed polynomials on the extended domain, in batch order.
	pub fixed_extended: Arc<Vec<Vec<F>>>,
	/// The first Lagrange polynomial on the extended domain.
	pub first_row_extended: Arc<Vec<F>>,
}

fn indicator<F: FftField>(n_rows: usize, rows: Range<usize>) -> Vec<F> {
	(0..n_rows)
		.map(|row| {
			if rows.contains(&row) {
				F::one()
			} else {
				F::zero()
			}
		})
		.collect()
}

/// Interpolates table columns and evaluates them on a domain of `extended_size` points.
pub(super) fn lift_columns<F: FftField>(
	columns: &[Vec<F>],
	extended_size: usize,
) -> Result<(Vec<Polynomial<F>>, Vec<Vec<F>>), Error> {
	let lifted = columns
		.par_iter()
		.map(|values| {
			let poly = PolynomialDfs::from_values(values.clone())?.coefficients();
			let extended = PolynomialDfs::from_coefficients(&poly, extended_size)?;
			Ok((poly, extended.into_values()))
		})
		.collect::<Result<Vec<_>, MathError>>()?;
	Ok(lifted.into_iter().unzip())
}

/// Commits the fixed part of a constraint system and derives the data both parties share.
///
/// Only the constant and selector columns of `fixed_assignment` are read. The fixed batch holds,
/// in order, the constant columns, the selector columns, the last-row selector, the blinding-row
/// selector, then the identity and permutation polynomials of the copy-constrained columns.
///
/// Preprocessing is deterministic: the same inputs yield the same common data and root.
#[instrument("constraint_system::preprocess", skip_all, level = "debug")]
pub fn preprocess<F, MerkleProver>(
	constraint_system: &ConstraintSystem<F>,
	fixed_assignment: &Assignment<F>,
	params: &PlaceholderParams,
	merkle_prover: &MerkleProver,
) -> Result<PreprocessedData<F, MerkleProver>, Error>
where
	F: PrimeField,
	MerkleProver: MerkleTreeProver<F>,
{
	constraint_system.check()?;
	let table = constraint_system.table;
	fixed_assignment.check_shape(&table)?;

	let (n_rows, usable_rows) = (table.rows_amount, table.usable_rows);
	for (selector, values) in fixed_assignment
		.columns(ColumnKind::Selector)
		.iter()
		.enumerate()
	{
		if let Some(offset) = values[usable_rows..].iter().position(|value| !value.is_zero()) {
			return Err(Error::SelectorOutsideUsableRows {
				selector,
				row: usable_rows + offset,
			});
		}
	}

	let basic_domain = EvaluationDomain::with_size(n_rows)?;
	let fri_params = params.fri_params::<F>(table.log_rows())?;
	let max_degree = constraint_system.max_degree();
	let extended_domain = EvaluationDomain::with_size(n_rows << log2_ceil_usize(max_degree))?;
	let permuted_columns = constraint_system.permuted_columns();

	let mut fixed_values = Vec::new();
	fixed_values.extend_from_slice(fixed_assignment.columns(ColumnKind::Constant));
	fixed_values.extend_from_slice(fixed_assignment.columns(ColumnKind::Selector));
	fixed_values.push(indicator(n_rows, usable_rows..usable_rows + 1));
	fixed_values.push(indicator(n_rows, usable_rows + 1..n_rows));
	let identities = identity_values(&basic_domain, permuted_columns.len());
	let sigmas = sigma_values(&identities, &permuted_columns, &constraint_system.copy_constraints);
	fixed_values.extend(identities);
	fixed_values.extend(sigmas);

	let (fixed_polys, fixed_extended) = lift_columns(&fixed_values, extended_domain.size())?;
	let first_row_extended =
		PolynomialDfs::from_values(indicator(n_rows, 0..1))?.resized(extended_domain.size())?;

	let fixed_batch = Arc::new(CommittedBatch::commit(
		&fri_params,
		merkle_prover,
		FIXED_VALUES_BATCH,
		fixed_polys,
	)?);
	let fixed_data = setup_fixed_batches(
		&BTreeMap::from([(FIXED_VALUES_BATCH, fixed_batch.clone())]),
		&mut Transcript::new(),
	);

	let n_lookup_constraints = constraint_system.n_lookup_constraints();
	let layout = PermutationLayout {
		chunks: if permuted_columns.is_empty() {
			0
		} else {
			n_chunks(permuted_columns.len(), max_degree)
		},
		lookup_inputs: n_lookup_constraints,
		table_options: if n_lookup_constraints > 0 {
			constraint_system.n_table_options()
		} else {
			0
		},
	};
	debug!(
		max_degree,
		extended_size = extended_domain.size(),
		fixed_polys = fixed_batch.len(),
		permutation_chunks = layout.chunks,
		"preprocessed constraint system"
	);

	let common_data = CommonData {
		constraint_system: constraint_system.clone(),
		params: params.clone(),
		fri_params,
		basic_domain,
		max_degree,
		permuted_columns,
		layout,
		rotations: constraint_system.rotations(),
		dag: gate_dag(constraint_system),
		fixed_root: fixed_batch.root().clone(),
		fixed_data: Arc::new(fixed_data),
	};

	Ok(PreprocessedData {
		common_data: Arc::new(common_data),
		fixed_batch,
		extended_domain,
		fixed_extended: Arc::new(fixed_extended),
		first_row_extended: Arc::new(first_row_extended.into_values()),
	})
}
