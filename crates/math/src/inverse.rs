// Copyright 2024 Irreducible Inc.

use ark_ff::Field;
use placeholder_utils::rayon::parallel_chunk_len;
use rayon::prelude::*;

use crate::Error;

const MIN_CHUNK_LEN: usize = 1 << 10;

/// Inverts every element of `values` in place with Montgomery's trick.
///
/// One field inversion and 3(n - 1) multiplications. Fails on the first zero entry, leaving
/// `values` untouched.
pub fn batch_invert<F: Field>(values: &mut [F]) -> Result<(), Error> {
	if let Some(index) = values.iter().position(|value| value.is_zero()) {
		return Err(Error::DivisionByZero { index });
	}
	invert_nonzero(values);
	Ok(())
}

/// Parallel version of [`batch_invert`]: each chunk pays for one field inversion.
pub fn par_batch_invert<F: Field>(values: &mut [F]) -> Result<(), Error> {
	if let Some(index) = values.par_iter().position_first(|value| value.is_zero()) {
		return Err(Error::DivisionByZero { index });
	}
	let chunk_len = parallel_chunk_len(values.len(), MIN_CHUNK_LEN);
	values.par_chunks_mut(chunk_len).for_each(invert_nonzero);
	Ok(())
}

fn invert_nonzero<F: Field>(values: &mut [F]) {
	if values.is_empty() {
		return;
	}

	// prefix[i] = values[0] * ... * values[i - 1]
	let mut prefix = Vec::with_capacity(values.len());
	let mut acc = F::one();
	for value in values.iter() {
		prefix.push(acc);
		acc *= value;
	}

	let mut inv = acc
		.inverse()
		.expect("all values were checked to be non-zero");
	for (value, prefix) in values.iter_mut().zip(prefix).rev() {
		let next_inv = inv * *value;
		*value = inv * prefix;
		inv = next_inv;
	}
}

#[cfg(test)]
mod tests {
	use ark_bn254::Fr;
	use ark_ff::{One, UniformRand, Zero};
	use assert_matches::assert_matches;
	use rand::{rngs::StdRng, SeedableRng};

	use super::*;

	#[test]
	fn test_batch_invert_matches_single_inversions() {
		let mut rng = StdRng::seed_from_u64(0);
		let values = (0..37).map(|_| Fr::rand(&mut rng)).collect::<Vec<_>>();

		let mut inverted = values.clone();
		batch_invert(&mut inverted).unwrap();
		for (value, inv) in values.iter().zip(&inverted) {
			assert_eq!(*value * inv, Fr::one());
		}
	}

	#[test]
	fn test_par_batch_invert_large() {
		let mut rng = StdRng::seed_from_u64(0);
		let values = (0..5000).map(|_| Fr::rand(&mut rng)).collect::<Vec<_>>();

		let mut inverted = values.clone();
		par_batch_invert(&mut inverted).unwrap();
		assert!(values
			.iter()
			.zip(&inverted)
			.all(|(value, inv)| *value * inv == Fr::one()));
	}

	#[test]
	fn test_batch_invert_reports_first_zero() {
		let mut values = vec![Fr::from(3u64), Fr::from(5u64), Fr::zero(), Fr::zero()];
		let original = values.clone();
		assert_matches!(batch_invert(&mut values), Err(Error::DivisionByZero { index: 2 }));
		assert_eq!(values, original);
		assert_matches!(par_batch_invert(&mut values), Err(Error::DivisionByZero { index: 2 }));
	}

	#[test]
	fn test_batch_invert_empty() {
		let mut values: Vec<Fr> = Vec::new();
		batch_invert(&mut values).unwrap();
		assert!(values.is_empty());
	}
}
