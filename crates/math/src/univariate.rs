// Copyright 2023-2024 Irreducible Inc.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use ark_ff::{FftField, Field};
use itertools::{EitherOrBoth, Itertools};
use placeholder_utils::bail;
use rand::Rng;
use rayon::prelude::*;

use crate::{EvaluationDomain, Error};

/// A univariate polynomial in coefficient form, lowest degree first.
///
/// The coefficient vector may carry trailing zeros; [`Polynomial::degree`] ignores them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Polynomial<F> {
	coeffs: Vec<F>,
}

impl<F: Field> Polynomial<F> {
	pub fn new(coeffs: Vec<F>) -> Self {
		Self { coeffs }
	}

	pub fn zero() -> Self {
		Self { coeffs: Vec::new() }
	}

	pub fn constant(value: F) -> Self {
		Self {
			coeffs: vec![value],
		}
	}

	/// Samples a polynomial with `degree + 1` uniformly random coefficients.
	pub fn random(degree: usize, mut rng: impl Rng) -> Self {
		Self {
			coeffs: (0..=degree).map(|_| F::rand(&mut rng)).collect(),
		}
	}

	pub fn coefficients(&self) -> &[F] {
		&self.coeffs
	}

	pub fn into_coefficients(self) -> Vec<F> {
		self.coeffs
	}

	/// The length of the coefficient vector, including trailing zeros.
	pub fn len(&self) -> usize {
		self.coeffs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.coeffs.is_empty()
	}

	pub fn is_zero(&self) -> bool {
		self.coeffs.iter().all(|coeff| coeff.is_zero())
	}

	/// The degree of the polynomial, with the zero polynomial having degree 0.
	pub fn degree(&self) -> usize {
		self.coeffs
			.iter()
			.rposition(|coeff| !coeff.is_zero())
			.unwrap_or(0)
	}

	/// Drops trailing zero coefficients.
	pub fn truncate(&mut self) {
		let len = self
			.coeffs
			.iter()
			.rposition(|coeff| !coeff.is_zero())
			.map_or(0, |pos| pos + 1);
		self.coeffs.truncate(len);
	}

	pub fn evaluate(&self, x: F) -> F {
		evaluate_univariate(&self.coeffs, x)
	}

	/// Returns p(c·x): coefficient i is scaled by c^i.
	pub fn scale_argument(&self, c: F) -> Self {
		let mut power = F::one();
		let coeffs = self
			.coeffs
			.iter()
			.map(|coeff| {
				let scaled = *coeff * power;
				power *= c;
				scaled
			})
			.collect();
		Self { coeffs }
	}

	/// Synthetic division by (x - ζ). The remainder p(ζ) is discarded.
	pub fn divide_by_linear(&self, zeta: F) -> Self {
		if self.coeffs.len() <= 1 {
			return Self::zero();
		}

		let mut quotient = vec![F::zero(); self.coeffs.len() - 1];
		let mut carry = F::zero();
		for (i, coeff) in self.coeffs.iter().enumerate().skip(1).rev() {
			carry = *coeff + carry * zeta;
			quotient[i - 1] = carry;
		}
		Self { coeffs: quotient }
	}

	/// Divides by x^n - 1, returning the quotient and the remainder of degree < n.
	pub fn div_rem_vanishing(&self, n: usize) -> (Self, Self) {
		if self.coeffs.len() <= n {
			return (Self::zero(), self.clone());
		}

		// For p = q·(x^n - 1) + r: q_i = p_{i+n} + q_{i+n}, scanned from the top.
		let mut quotient = vec![F::zero(); self.coeffs.len() - n];
		for i in (0..quotient.len()).rev() {
			let carry = quotient.get(i + n).copied().unwrap_or_default();
			quotient[i] = self.coeffs[i + n] + carry;
		}
		let remainder = (0..n)
			.map(|i| self.coeffs[i] + quotient.get(i).copied().unwrap_or_default())
			.collect();
		(Self { coeffs: quotient }, Self { coeffs: remainder })
	}

	/// Exact division by x^n - 1.
	///
	/// ## Throws
	///
	/// * [`Error::NonZeroRemainder`] if x^n - 1 does not divide the polynomial
	pub fn divide_by_vanishing(&self, n: usize) -> Result<Self, Error> {
		let (quotient, remainder) = self.div_rem_vanishing(n);
		if !remainder.is_zero() {
			bail!(Error::NonZeroRemainder { size: n });
		}
		Ok(quotient)
	}

	/// Splits the coefficients into `count` polynomials of `chunk_len` coefficients each, so that
	/// p(x) = Σ_i chunk_i(x)·x^{chunk_len·i}.
	///
	/// ## Throws
	///
	/// * [`Error::IncorrectArgumentLength`] if the degree does not fit into the chunks
	pub fn split(&self, chunk_len: usize, count: usize) -> Result<Vec<Self>, Error> {
		let mut coeffs = self.coeffs.clone();
		if coeffs.len() > chunk_len * count {
			if coeffs[chunk_len * count..].iter().any(|coeff| !coeff.is_zero()) {
				bail!(Error::IncorrectArgumentLength {
					arg: "chunks".to_string(),
					expected: chunk_len * count,
				});
			}
			coeffs.truncate(chunk_len * count);
		}
		coeffs.resize(chunk_len * count, F::zero());
		Ok(coeffs
			.chunks(chunk_len)
			.map(|chunk| Self::new(chunk.to_vec()))
			.collect())
	}
}

impl<F: FftField> Polynomial<F> {
	/// Evaluates the polynomial on every point of the domain.
	pub fn evaluate_on(&self, domain: &EvaluationDomain<F>) -> Result<Vec<F>, Error> {
		let mut coeffs = self.coeffs.as_slice();
		if coeffs.len() > domain.size() {
			let degree = self.degree();
			if degree >= domain.size() {
				bail!(Error::ResizeBelowDegree {
					size: domain.size(),
					degree,
				});
			}
			coeffs = &coeffs[..domain.size()];
		}
		domain.fft(coeffs)
	}
}

/// Evaluate a univariate polynomial specified by its monomial coefficients.
pub fn evaluate_univariate<F: Field>(coeffs: &[F], x: F) -> F {
	// Evaluate using Horner's method
	let mut rev_coeffs = coeffs.iter().copied().rev();
	let last_coeff = rev_coeffs.next().unwrap_or(F::zero());
	rev_coeffs.fold(last_coeff, |eval, coeff| eval * x + coeff)
}

fn add_coeffs<F: Field>(lhs: &[F], rhs: &[F], rhs_sign: F) -> Vec<F> {
	lhs.iter()
		.zip_longest(rhs)
		.map(|pair| match pair {
			EitherOrBoth::Both(a, b) => *a + rhs_sign * b,
			EitherOrBoth::Left(a) => *a,
			EitherOrBoth::Right(b) => rhs_sign * b,
		})
		.collect()
}

impl<F: Field> Add<&Polynomial<F>> for &Polynomial<F> {
	type Output = Polynomial<F>;

	fn add(self, rhs: &Polynomial<F>) -> Polynomial<F> {
		Polynomial::new(add_coeffs(&self.coeffs, &rhs.coeffs, F::one()))
	}
}

impl<F: Field> Sub<&Polynomial<F>> for &Polynomial<F> {
	type Output = Polynomial<F>;

	fn sub(self, rhs: &Polynomial<F>) -> Polynomial<F> {
		Polynomial::new(add_coeffs(&self.coeffs, &rhs.coeffs, -F::one()))
	}
}

impl<F: Field> AddAssign<&Polynomial<F>> for Polynomial<F> {
	fn add_assign(&mut self, rhs: &Polynomial<F>) {
		if self.coeffs.len() < rhs.coeffs.len() {
			self.coeffs.resize(rhs.coeffs.len(), F::zero());
		}
		for (lhs, rhs) in self.coeffs.iter_mut().zip(&rhs.coeffs) {
			*lhs += rhs;
		}
	}
}

impl<F: Field> SubAssign<&Polynomial<F>> for Polynomial<F> {
	fn sub_assign(&mut self, rhs: &Polynomial<F>) {
		if self.coeffs.len() < rhs.coeffs.len() {
			self.coeffs.resize(rhs.coeffs.len(), F::zero());
		}
		for (lhs, rhs) in self.coeffs.iter_mut().zip(&rhs.coeffs) {
			*lhs -= rhs;
		}
	}
}

impl<F: Field> Mul<&Polynomial<F>> for &Polynomial<F> {
	type Output = Polynomial<F>;

	fn mul(self, rhs: &Polynomial<F>) -> Polynomial<F> {
		if self.coeffs.is_empty() || rhs.coeffs.is_empty() {
			return Polynomial::zero();
		}

		let len = self.coeffs.len() + rhs.coeffs.len() - 1;
		let coeffs = (0..len)
			.into_par_iter()
			.map(|k| {
				let start = k.saturating_sub(rhs.coeffs.len() - 1);
				let end = k.min(self.coeffs.len() - 1);
				(start..=end)
					.map(|i| self.coeffs[i] * rhs.coeffs[k - i])
					.sum::<F>()
			})
			.collect();
		Polynomial::new(coeffs)
	}
}

impl<F: Field> Mul<F> for &Polynomial<F> {
	type Output = Polynomial<F>;

	fn mul(self, rhs: F) -> Polynomial<F> {
		Polynomial::new(self.coeffs.iter().map(|coeff| *coeff * rhs).collect())
	}
}

impl<F: Field> Neg for &Polynomial<F> {
	type Output = Polynomial<F>;

	fn neg(self) -> Polynomial<F> {
		Polynomial::new(self.coeffs.iter().map(|coeff| -*coeff).collect())
	}
}

/// Adds a constant to the polynomial.
impl<F: Field> Add<F> for &Polynomial<F> {
	type Output = Polynomial<F>;

	fn add(self, rhs: F) -> Polynomial<F> {
		let mut result = self.clone();
		match result.coeffs.first_mut() {
			Some(first) => *first += rhs,
			None => result.coeffs.push(rhs),
		}
		result
	}
}

#[cfg(test)]
mod tests {
	use ark_bn254::Fr;
	use ark_ff::{One, UniformRand, Zero};
	use assert_matches::assert_matches;
	use proptest::prelude::*;
	use rand::{rngs::StdRng, SeedableRng};

	use super::*;

	fn evaluate_univariate_naive<F: Field>(coeffs: &[F], x: F) -> F {
		coeffs
			.iter()
			.enumerate()
			.map(|(i, &coeff)| coeff * x.pow([i as u64]))
			.sum()
	}

	fn poly(coeffs: &[u64]) -> Polynomial<Fr> {
		Polynomial::new(coeffs.iter().map(|&c| Fr::from(c)).collect())
	}

	#[test]
	fn test_evaluate_univariate() {
		let mut rng = StdRng::seed_from_u64(0);
		let coeffs = (0..6).map(|_| Fr::rand(&mut rng)).collect::<Vec<_>>();
		let x = Fr::rand(&mut rng);
		assert_eq!(evaluate_univariate(&coeffs, x), evaluate_univariate_naive(&coeffs, x));
	}

	#[test]
	fn test_evaluate_univariate_no_coeffs() {
		let mut rng = StdRng::seed_from_u64(0);
		let x = Fr::rand(&mut rng);
		assert_eq!(evaluate_univariate(&[], x), Fr::zero());
	}

	#[test]
	fn test_degree_ignores_trailing_zeros() {
		assert_eq!(poly(&[1, 2, 0, 0]).degree(), 1);
		assert_eq!(poly(&[]).degree(), 0);
		assert_eq!(poly(&[0, 0]).degree(), 0);
		assert!(poly(&[0, 0]).is_zero());

		let mut p = poly(&[1, 2, 0, 0]);
		p.truncate();
		assert_eq!(p.len(), 2);
	}

	#[test]
	fn test_divide_by_linear() {
		let mut rng = StdRng::seed_from_u64(0);
		let p = Polynomial::<Fr>::random(9, &mut rng);
		let zeta = Fr::rand(&mut rng);

		// (p(x) - p(ζ)) / (x - ζ) times (x - ζ) gives back p(x) - p(ζ)
		let numerator = &p + (-p.evaluate(zeta));
		let quotient = numerator.divide_by_linear(zeta);
		let linear = Polynomial::new(vec![-zeta, Fr::one()]);
		assert_eq!(&(&quotient * &linear) - &numerator, Polynomial::new(vec![Fr::zero(); 10]));
	}

	#[test]
	fn test_divide_by_vanishing() {
		let mut rng = StdRng::seed_from_u64(0);
		let q = Polynomial::<Fr>::random(11, &mut rng);
		let vanishing = {
			let mut coeffs = vec![Fr::zero(); 9];
			coeffs[0] = -Fr::one();
			coeffs[8] = Fr::one();
			Polynomial::new(coeffs)
		};
		let p = &q * &vanishing;
		assert_eq!(p.divide_by_vanishing(8).unwrap(), q);

		let shifted = &p + Fr::one();
		assert_matches!(shifted.divide_by_vanishing(8), Err(Error::NonZeroRemainder { size: 8 }));

		let (quotient, remainder) = shifted.div_rem_vanishing(8);
		assert_eq!(quotient, q);
		assert_eq!(remainder, poly(&[1, 0, 0, 0, 0, 0, 0, 0]));
	}

	#[test]
	fn test_split_recombines() {
		let mut rng = StdRng::seed_from_u64(0);
		let p = Polynomial::<Fr>::random(10, &mut rng);
		let chunks = p.split(4, 3).unwrap();
		assert_eq!(chunks.len(), 3);

		let x = Fr::rand(&mut rng);
		let x4 = x.pow([4u64]);
		let recombined = chunks
			.iter()
			.rev()
			.fold(Fr::zero(), |acc, chunk| acc * x4 + chunk.evaluate(x));
		assert_eq!(recombined, p.evaluate(x));

		assert_matches!(p.split(4, 2), Err(Error::IncorrectArgumentLength { .. }));
	}

	#[test]
	fn test_scale_argument() {
		let mut rng = StdRng::seed_from_u64(0);
		let p = Polynomial::<Fr>::random(7, &mut rng);
		let c = Fr::rand(&mut rng);
		let x = Fr::rand(&mut rng);
		assert_eq!(p.scale_argument(c).evaluate(x), p.evaluate(c * x));
	}

	#[test]
	fn test_evaluate_on_domain() {
		let domain = EvaluationDomain::<Fr>::new(3).unwrap();
		let p = poly(&[3, 1, 4, 1, 5]);
		let values = p.evaluate_on(&domain).unwrap();
		for (i, value) in values.iter().enumerate() {
			assert_eq!(*value, p.evaluate(domain.element(i)));
		}

		let too_long = Polynomial::<Fr>::random(8, StdRng::seed_from_u64(1));
		assert_matches!(too_long.evaluate_on(&domain), Err(Error::ResizeBelowDegree { .. }));
	}

	proptest! {
		#[test]
		fn test_mul_is_evaluation_homomorphic(
			a in prop::collection::vec(any::<u64>(), 0..12),
			b in prop::collection::vec(any::<u64>(), 0..12),
			x in any::<u64>(),
		) {
			let a = poly(&a);
			let b = poly(&b);
			let x = Fr::from(x);
			prop_assert_eq!((&a * &b).evaluate(x), a.evaluate(x) * b.evaluate(x));
			prop_assert_eq!((&a + &b).evaluate(x), a.evaluate(x) + b.evaluate(x));
			prop_assert_eq!((&a - &b).evaluate(x), a.evaluate(x) - b.evaluate(x));
		}
	}
}
