// Copyright 2024 Irreducible Inc.

use ark_ff::{Field, UniformRand};
use itertools::izip;
use placeholder_math::{batch_invert, Error as MathError};
use rand::Rng;
use rayon::prelude::*;
use tracing::instrument;

use super::chunk_size;

/// Values of the grand product Z followed by the chunk products `P_1..P_{K-1}` on every row.
///
/// `columns`, `identities` and `sigmas` hold the row values of the permuted columns and their
/// setup polynomials. Rows after `usable_rows` are not constrained and get random values.
///
/// ## Throws
///
/// * [`MathError::DivisionByZero`] if some `f_j + β·σ_j + γ` vanishes on a usable row
#[allow(clippy::too_many_arguments)]
#[instrument(skip_all, fields(columns = columns.len()), level = "debug")]
pub fn grand_product_values<F: Field>(
	columns: &[&[F]],
	identities: &[Vec<F>],
	sigmas: &[Vec<F>],
	beta: F,
	gamma: F,
	usable_rows: usize,
	max_degree: usize,
	mut rng: impl Rng,
) -> Result<Vec<Vec<F>>, MathError> {
	let n_rows = columns.first().map_or(0, |column| column.len());
	let chunk = chunk_size(max_degree);
	let n_chunks = columns.len().div_ceil(chunk);

	// Per usable row, per chunk: the identity side and the permuted side.
	let factors = (0..usable_rows)
		.into_par_iter()
		.map(|row| {
			let mut numerators = Vec::with_capacity(n_chunks);
			let mut denominators = Vec::with_capacity(n_chunks);
			for start in (0..columns.len()).step_by(chunk) {
				let end = (start + chunk).min(columns.len());
				let (mut num, mut den) = (F::one(), F::one());
				for (column, identity, sigma) in
					izip!(&columns[start..end], &identities[start..end], &sigmas[start..end])
				{
					let value = column[row] + gamma;
					num *= value + beta * identity[row];
					den *= value + beta * sigma[row];
				}
				numerators.push(num);
				denominators.push(den);
			}
			(numerators, denominators)
		})
		.collect::<Vec<_>>();

	let mut inverses = factors
		.iter()
		.flat_map(|(_, denominators)| denominators.iter().copied())
		.collect::<Vec<_>>();
	batch_invert(&mut inverses).map_err(|err| match err {
		MathError::DivisionByZero { index } => MathError::DivisionByZero {
			index: index / n_chunks.max(1),
		},
		err => err,
	})?;

	let mut products = vec![vec![F::zero(); n_rows]; n_chunks];
	let mut acc = F::one();
	for (row, (numerators, _)) in factors.iter().enumerate() {
		products[0][row] = acc;
		for (k, numerator) in numerators.iter().enumerate() {
			acc *= *numerator * inverses[row * n_chunks + k];
			if k + 1 < n_chunks {
				products[k + 1][row] = acc;
			}
		}
	}
	if n_chunks > 0 && usable_rows < n_rows {
		products[0][usable_rows] = acc;
	}

	for (k, values) in products.iter_mut().enumerate() {
		let first_free = if k == 0 { usable_rows + 1 } else { usable_rows };
		for value in values.iter_mut().skip(first_free) {
			*value = F::rand(&mut rng);
		}
	}
	Ok(products)
}
