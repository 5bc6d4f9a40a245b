// Copyright 2024 Irreducible Inc.

use std::collections::HashMap;

use ark_ff::{FftField, Field, UniformRand};
use placeholder_math::{
	dag::{ColumnOracle, DagEvaluator, DagExpressionBuilder},
	Error as MathError, PolynomialDfs,
};
use rand::Rng;
use tracing::{instrument, warn};

use crate::constraint_system::{Expression, Variable};

/// Evaluates compressed lookup expressions on every row of the table.
pub fn compressed_rows<F: Field>(
	expressions: &[Expression<F>],
	rows_amount: usize,
	oracle: &impl ColumnOracle<F, Variable>,
) -> Result<Vec<Vec<F>>, MathError> {
	if expressions.is_empty() {
		return Ok(Vec::new());
	}
	let mut builder = DagExpressionBuilder::new();
	let roots = expressions
		.iter()
		.map(|expr| builder.add_expression(expr))
		.collect::<Vec<_>>();
	let dag = builder.build();
	DagEvaluator::new(&dag, &roots)?.evaluate(rows_amount, oracle)
}

/// How many times each usable table row is looked up, per table option.
///
/// Every input value on a usable row is attributed to its first occurrence among the table
/// values, scanning options in order and rows in order. Values missing from the table are logged
/// and left uncounted, which makes the proof fail.
#[instrument(skip_all, fields(inputs = inputs.len(), options = table.len()), level = "debug")]
pub fn compute_counts<F: Field>(
	inputs: &[Vec<F>],
	table: &[Vec<F>],
	usable_rows: usize,
) -> Vec<Vec<F>> {
	let mut first_occurrence = HashMap::<F, (usize, usize)>::new();
	for (option, values) in table.iter().enumerate() {
		for (row, value) in values.iter().take(usable_rows).enumerate() {
			first_occurrence.entry(*value).or_insert((option, row));
		}
	}

	let mut counts = table
		.iter()
		.map(|values| vec![0u64; values.len()])
		.collect::<Vec<_>>();
	for (input, values) in inputs.iter().enumerate() {
		for (row, value) in values.iter().take(usable_rows).enumerate() {
			match first_occurrence.get(value) {
				Some(&(option, table_row)) => counts[option][table_row] += 1,
				None => warn!(input, row, "lookup input is not in the table"),
			}
		}
	}

	counts
		.into_iter()
		.map(|column| column.into_iter().map(F::from).collect())
		.collect()
}

/// The helpers `H_i = -1 / (α - ℓ_i)` on every row.
///
/// ## Throws
///
/// * [`MathError::DivisionByZero`] if α equals some compressed input
pub fn helper_values<F: FftField>(inputs: &[Vec<F>], alpha: F) -> Result<Vec<Vec<F>>, MathError> {
	inputs
		.iter()
		.map(|values| {
			let shifted = &PolynomialDfs::from_values(values.clone())? + (-alpha);
			Ok(shifted.element_wise_inverse()?.into_values())
		})
		.collect()
}

/// The table helpers `G_j = m_j / (α - v_j)` on every row.
///
/// ## Throws
///
/// * [`MathError::DivisionByZero`] if α equals some compressed table value
pub fn table_helper_values<F: FftField>(
	table: &[Vec<F>],
	counts: &[Vec<F>],
	alpha: F,
) -> Result<Vec<Vec<F>>, MathError> {
	table
		.iter()
		.zip(counts)
		.map(|(values, counts)| {
			let shifted = &PolynomialDfs::from_values(values.clone())? + (-alpha);
			let counts = PolynomialDfs::from_values(counts.clone())?;
			let ratio = shifted.element_wise_inverse()?.mul_pointwise(&counts)?;
			Ok((-&ratio).into_values())
		})
		.collect()
}

/// The running sum U with `U(0) = 0` and `U(r + 1) = U(r) + Σ H(r) + Σ G(r)` up to row
/// `usable_rows`. Later rows get random values.
pub fn running_sum_values<F: Field>(
	helpers: &[Vec<F>],
	table_helpers: &[Vec<F>],
	rows_amount: usize,
	usable_rows: usize,
	mut rng: impl Rng,
) -> Vec<F> {
	let mut values = Vec::with_capacity(rows_amount);
	let mut acc = F::zero();
	values.push(acc);
	for row in 0..usable_rows {
		acc += helpers
			.iter()
			.chain(table_helpers)
			.map(|column| column[row])
			.sum::<F>();
		values.push(acc);
	}
	values.resize_with(rows_amount, || F::rand(&mut rng));
	values
}
