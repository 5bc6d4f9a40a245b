// Copyright 2024 Irreducible Inc.

//! The gate argument: every gate constraint times its selector must vanish on the usable rows.
//!
//! All selected constraints share one deduplicated DAG built at setup. The prover evaluates it on
//! the extended domain, the verifier at the evaluation point, and both combine the results with
//! powers of a challenge.

use ark_ff::{FftField, Field};
use placeholder_math::{
	dag::{DagExpression, DagExpressionBuilder},
	Error as MathError, PolynomialDfs,
};
use tracing::instrument;

use crate::constraint_system::{ConstraintSystem, Expression, Variable};

/// `selector·constraint` for every constraint of every gate, gates in order.
pub fn gate_expressions<F: Field>(cs: &ConstraintSystem<F>) -> Vec<Expression<F>> {
	cs.gates
		.iter()
		.flat_map(|gate| {
			gate.constraints
				.iter()
				.map(|constraint| Variable::selector(gate.selector).expr() * constraint.clone())
		})
		.collect()
}

/// The DAG of the selected gate constraints, with one root per constraint.
#[instrument(skip_all, level = "debug")]
pub fn gate_dag<F: Field>(cs: &ConstraintSystem<F>) -> DagExpression<F, Variable> {
	let mut builder = DagExpressionBuilder::new();
	for expr in gate_expressions(cs) {
		builder.add_expression(&expr);
	}
	builder.build()
}

/// `Σ θ^i·values_i` on the domain the values live on, or `None` without values.
///
/// ## Throws
///
/// * [`MathError::NonPowerOfTwoSize`] if the value vectors are not evaluations on a subgroup
pub fn combine_values<F: FftField>(
	values: &[Vec<F>],
	theta: F,
) -> Result<Option<PolynomialDfs<F>>, MathError> {
	values.iter().rev().try_fold(None, |acc, column| {
		let column = PolynomialDfs::from_values(column.clone())?;
		Ok(Some(match acc {
			Some(acc) => &(&acc * theta) + &column,
			None => column,
		}))
	})
}

/// `Σ θ^i·values_i` for the gate values at a single point.
pub fn combine_evaluations<F: Field>(values: &[F], theta: F) -> F {
	values
		.iter()
		.rev()
		.fold(F::zero(), |acc, value| acc * theta + value)
}

#[cfg(test)]
mod tests {
	use ark_bn254::Fr;
	use ark_ff::{Field, UniformRand};
	use assert_matches::assert_matches;
	use placeholder_math::dag::DagEvaluator;
	use rand::{rngs::StdRng, SeedableRng};

	use super::*;
	use crate::constraint_system::{Assignment, Column, Gate, TableDescription};

	const ROWS: usize = 8;

	/// `w0 * w1 - w2` and `w0@1 - w2` under selector 0: a running product over the first rows.
	fn fixture() -> (ConstraintSystem<Fr>, Assignment<Fr>) {
		let table = TableDescription {
			witness_columns: 3,
			public_input_columns: 0,
			constant_columns: 0,
			selector_columns: 1,
			rows_amount: ROWS,
			usable_rows: 6,
		};
		let (a, b, c) = (
			Variable::witness(0).expr::<Fr>(),
			Variable::witness(1).expr(),
			Variable::witness(2).expr(),
		);
		let next = Column::witness(0).rotated(1).expr();
		let cs = ConstraintSystem::new(table)
			.with_gate(Gate::new(0, vec![a * b - c.clone(), next - c]));

		let mut assignment = Assignment::new(&table);
		let mut acc = Fr::from(2u64);
		for row in 0..4 {
			let factor = Fr::from(row as u64 + 3);
			assignment.set(Column::witness(0).cell(row), acc);
			assignment.set(Column::witness(1).cell(row), factor);
			assignment.set(Column::witness(2).cell(row), acc * factor);
			assignment.set(Column::selector(0).cell(row), Fr::ONE);
			acc *= factor;
		}
		assignment.set(Column::witness(0).cell(4), acc);
		(cs, assignment)
	}

	#[test]
	fn test_selected_constraints_vanish_on_the_table() {
		let (cs, assignment) = fixture();
		let dag = gate_dag(&cs);
		assert_eq!(dag.roots().len(), 2);

		let evaluator = DagEvaluator::new(&dag, &[0, 1]).unwrap();
		let values = evaluator.evaluate(ROWS, &assignment).unwrap();
		for (root, expr) in gate_expressions(&cs).iter().enumerate() {
			for row in 0..ROWS {
				let expected = expr.evaluate(&|var: &Variable| assignment.value(*var, row));
				assert_eq!(values[root][row], expected);
			}
		}
		assert!(values.iter().flatten().all(|value| *value == Fr::ZERO));
	}

	#[test]
	fn test_broken_row_is_detected() {
		let (cs, mut assignment) = fixture();
		assignment.set(Column::witness(2).cell(2), Fr::from(1000u64));
		let dag = gate_dag(&cs);
		let values = DagEvaluator::new(&dag, &[0, 1])
			.unwrap()
			.evaluate(ROWS, &assignment)
			.unwrap();
		assert_ne!(values[0][2], Fr::ZERO);
		assert_ne!(values[1][2], Fr::ZERO);
	}

	#[test]
	fn test_combination_matches_pointwise() {
		let mut rng = StdRng::seed_from_u64(0);
		let values = (0..3)
			.map(|_| (0..ROWS).map(|_| Fr::rand(&mut rng)).collect::<Vec<_>>())
			.collect::<Vec<_>>();
		let theta = Fr::rand(&mut rng);

		let combined = combine_values(&values, theta).unwrap().unwrap();
		assert_eq!(combined.size(), ROWS);
		for row in 0..ROWS {
			let point = values.iter().map(|column| column[row]).collect::<Vec<_>>();
			let expected = point[0] + theta * point[1] + theta.square() * point[2];
			assert_eq!(combined.values()[row], expected);
			assert_eq!(combine_evaluations(&point, theta), expected);
		}
		assert!(combine_values::<Fr>(&[], theta).unwrap().is_none());
		assert_matches!(
			combine_values(&[vec![Fr::ONE; 6]], theta),
			Err(MathError::NonPowerOfTwoSize { size: 6 })
		);
	}
}
