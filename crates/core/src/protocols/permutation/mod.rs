// Copyright 2024 Irreducible Inc.

//! The permutation argument for copy constraints.
//!
//! Every cell `(j, i)` of a copy-constrained column gets the identity value `δ^j·ω^i`, where δ is
//! the multiplicative generator of the field, so that distinct columns land in distinct cosets
//! of the row subgroup. The permutation σ maps every cell to the identity of the next cell of its
//! copy class. For challenges β and γ the grand product Z with `Z(1) = 1` and
//!
//! ```text
//! Z(ω^{i+1}) · Π_j (f_j + β·σ_j + γ)(ω^i) = Z(ω^i) · Π_j (f_j + β·id_j + γ)(ω^i)
//! ```
//!
//! on the usable rows returns to one exactly when every class holds a single value. When there
//! are more columns than the constraint degree allows, the products are split into chunks and
//! the running product after each chunk is committed as well.

mod prove;
mod setup;
#[cfg(test)]
mod tests;

use ark_ff::FftField;
use placeholder_math::ArithExpr;
pub use prove::*;
pub use setup::*;

use crate::constraint_system::{Column, ConstraintExpr, Oracle, OracleVar, PermutationLayout};

/// The number of columns per chunk for a maximal constraint degree.
pub const fn chunk_size(max_degree: usize) -> usize {
	max_degree - 2
}

/// The number of chunks the grand product of `n_columns` columns is split into.
pub const fn n_chunks(n_columns: usize, max_degree: usize) -> usize {
	n_columns.div_ceil(chunk_size(max_degree))
}

/// `f_j + β·s_j + γ` for the setup polynomial `s_j`.
fn column_factor<F: FftField>(
	column: Column,
	setup: Oracle,
	beta: F,
	gamma: F,
) -> ConstraintExpr<F> {
	OracleVar::expr(Oracle::Column(column))
		+ ArithExpr::Const(beta) * OracleVar::expr(setup)
		+ ArithExpr::Const(gamma)
}

/// The zero-check constraints of the permutation argument.
///
/// In order: `L0·(Z - 1)`, then for every chunk `k` the masked link
/// `mask·(P_{k+1}·V'_k - P_k·V_k)` with `P_0 = Z` and `P_K = Z(ωx)`, then `q_last·(Z - 1)`.
/// The mask `1 - q_last - q_blind` is one exactly on the usable rows.
pub fn permutation_constraints<F: FftField>(
	permuted_columns: &[Column],
	layout: &PermutationLayout,
	max_degree: usize,
	beta: F,
	gamma: F,
) -> Vec<ConstraintExpr<F>> {
	if layout.chunks == 0 {
		return Vec::new();
	}

	let one = ConstraintExpr::<F>::one();
	let grand_product = Oracle::Permutation(layout.grand_product());
	let z = OracleVar::expr(grand_product);
	let mask = one.clone()
		- OracleVar::expr(Oracle::LastRow)
		- OracleVar::expr(Oracle::BlindRows);

	let mut constraints = Vec::with_capacity(layout.chunks + 2);
	constraints.push(OracleVar::expr(Oracle::FirstRow) * (z.clone() - one.clone()));

	let indexed = permuted_columns.iter().copied().enumerate().collect::<Vec<_>>();
	for (k, chunk) in indexed.chunks(chunk_size(max_degree)).enumerate() {
		let numerator = chunk
			.iter()
			.map(|&(j, column)| column_factor(column, Oracle::Identity(j), beta, gamma))
			.product::<ConstraintExpr<F>>();
		let denominator = chunk
			.iter()
			.map(|&(j, column)| column_factor(column, Oracle::Sigma(j), beta, gamma))
			.product::<ConstraintExpr<F>>();

		let current = if k == 0 {
			z.clone()
		} else {
			OracleVar::expr(Oracle::Permutation(layout.chunk_product(k)))
		};
		let next = if k + 1 == layout.chunks {
			OracleVar::rotated_expr(grand_product, 1)
		} else {
			OracleVar::expr(Oracle::Permutation(layout.chunk_product(k + 1)))
		};
		constraints.push(mask.clone() * (next * denominator - current * numerator));
	}

	constraints.push(OracleVar::expr(Oracle::LastRow) * (z - one));
	constraints
}
