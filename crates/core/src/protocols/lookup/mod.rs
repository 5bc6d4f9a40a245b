// Copyright 2024 Irreducible Inc.

//! The logarithmic derivative lookup argument.
//!
//! Every lookup constraint and every table option is compressed into a single column with a
//! challenge θ:
//!
//! ```text
//! ℓ_i = sel_i · ((t_i + 1) + Σ_k θ^{k+1}·e_{i,k})
//! v_j = tag_j · ((t_j + 1) + Σ_k θ^{k+1}·c_{j,k})
//! ```
//!
//! where `t` is the table identifier. The prover commits the count `m_j` of each table row, then
//! for a challenge α shows that
//!
//! ```text
//! Σ_rows Σ_i 1 / (α - ℓ_i) = Σ_rows Σ_j m_j / (α - v_j)
//! ```
//!
//! through the helpers `H_i = -1 / (α - ℓ_i)`, `G_j = m_j / (α - v_j)` and the running sum U of
//! `Σ H + Σ G` over the usable rows, which starts and ends at zero. Rows where a lookup selector
//! is off compress to zero and are matched by an untagged usable row of the table.

mod prove;

use ark_ff::{FftField, Field};
use placeholder_math::ArithExpr;
pub use prove::*;

use crate::constraint_system::{
	Column, ConstraintExpr, ConstraintSystem, Expression, Oracle, OracleVar, PermutationLayout,
	Variable,
};

/// `Σ_k θ^{k+1}·values_k + (table_id + 1)`, the tuple compression before the selector.
fn compress<F: Field>(
	table_id: usize,
	values: impl IntoIterator<Item = Expression<F>>,
	theta: F,
) -> Expression<F> {
	let mut power = F::one();
	let mut acc = ArithExpr::Const(F::from((table_id + 1) as u64));
	for value in values {
		power *= theta;
		acc = acc + ArithExpr::Const(power) * value;
	}
	acc
}

/// The compressed input ℓ of a lookup constraint under its gate selector.
pub fn compressed_input<F: Field>(
	selector: usize,
	table_id: usize,
	inputs: &[Expression<F>],
	theta: F,
) -> Expression<F> {
	Variable::selector(selector).expr() * compress(table_id, inputs.iter().cloned(), theta)
}

/// The compressed value v of a table option under the table tag.
pub fn compressed_value<F: Field>(
	table_id: usize,
	tag: usize,
	option: &[Column],
	theta: F,
) -> Expression<F> {
	let columns = option.iter().map(|&column| Variable::from(column).expr());
	Variable::selector(tag).expr() * compress(table_id, columns, theta)
}

/// The compressed inputs of every lookup constraint, gates in order.
pub fn compressed_inputs<F: Field>(cs: &ConstraintSystem<F>, theta: F) -> Vec<Expression<F>> {
	cs.lookup_constraints()
		.map(|(selector, constraint)| {
			compressed_input(selector, constraint.table_id, &constraint.inputs, theta)
		})
		.collect()
}

/// The compressed values of every table option, tables in order.
pub fn compressed_values<F: Field>(cs: &ConstraintSystem<F>, theta: F) -> Vec<Expression<F>> {
	cs.table_options()
		.map(|(table_id, tag, option)| compressed_value(table_id, tag, option, theta))
		.collect()
}

/// Challenges of the lookup argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupChallenges<F> {
	/// Compresses tuples into single values.
	pub theta: F,
	/// The point of the logarithmic derivative.
	pub alpha: F,
	/// Combines the helper constraints.
	pub helper_batching: F,
	/// Combines the table helper constraints.
	pub table_batching: F,
}

/// The zero-check constraints of the lookup argument.
///
/// In order: `L0·U`, `q_last·U`, the masked step `mask·(U(ωx) - U - Σ H - Σ G)`, the batched
/// helper definitions `Σ h^{i+1}·(H_i·(α - ℓ_i) + 1)` and the batched table helper definitions
/// `Σ g^{j+1}·(G_j·(α - v_j) - m_j)`. Empty without lookup constraints.
pub fn lookup_constraints<F: FftField>(
	cs: &ConstraintSystem<F>,
	layout: &PermutationLayout,
	challenges: &LookupChallenges<F>,
) -> Vec<ConstraintExpr<F>> {
	if !layout.has_lookups() {
		return Vec::new();
	}
	let LookupChallenges {
		theta,
		alpha,
		helper_batching,
		table_batching,
	} = *challenges;

	let running_sum = Oracle::Permutation(layout.running_sum());
	let u = OracleVar::expr(running_sum);
	let alpha = ArithExpr::Const(alpha);
	let helper = |i: usize| OracleVar::expr(Oracle::Permutation(layout.helper(i)));
	let table_helper = |j: usize| OracleVar::expr(Oracle::Permutation(layout.table_helper(j)));
	let mask = ConstraintExpr::<F>::one()
		- OracleVar::expr(Oracle::LastRow)
		- OracleVar::expr(Oracle::BlindRows);

	let step = (0..layout.lookup_inputs)
		.map(helper)
		.chain((0..layout.table_options).map(table_helper))
		.fold(OracleVar::rotated_expr(running_sum, 1) - u.clone(), |acc, term| acc - term);

	let mut power = F::one();
	let helpers = compressed_inputs(cs, theta)
		.into_iter()
		.enumerate()
		.map(|(i, input)| {
			power *= helper_batching;
			let input = input.map_vars(&OracleVar::from);
			ArithExpr::Const(power) * (helper(i) * (alpha.clone() - input) + ConstraintExpr::one())
		})
		.sum::<ConstraintExpr<F>>();

	let mut power = F::one();
	let table_helpers = compressed_values(cs, theta)
		.into_iter()
		.enumerate()
		.map(|(j, value)| {
			power *= table_batching;
			let value = value.map_vars(&OracleVar::from);
			ArithExpr::Const(power)
				* (table_helper(j) * (alpha.clone() - value) - OracleVar::expr(Oracle::Count(j)))
		})
		.sum::<ConstraintExpr<F>>();

	vec![
		OracleVar::expr(Oracle::FirstRow) * u.clone(),
		OracleVar::expr(Oracle::LastRow) * u,
		mask * step,
		helpers,
		table_helpers,
	]
}
