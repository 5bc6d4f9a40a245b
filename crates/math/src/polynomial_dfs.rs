// Copyright 2024 Irreducible Inc.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use ark_ff::FftField;
use placeholder_utils::bail;
use rayon::prelude::*;

use crate::{inverse::par_batch_invert, EvaluationDomain, Error, Polynomial};

/// A univariate polynomial stored by its values on a power-of-two subgroup.
///
/// `values[i]` is the value at ω^i, where ω generates the subgroup of order `values.len()`.
/// The polynomial also records its degree bound, which must stay below the domain size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolynomialDfs<F: FftField> {
	degree: usize,
	values: Vec<F>,
	domain: EvaluationDomain<F>,
}

impl<F: FftField> PolynomialDfs<F> {
	/// Wraps evaluations on the subgroup of order `values.len()`.
	///
	/// ## Throws
	///
	/// * [`Error::NonPowerOfTwoSize`] if the length is not a power of two
	/// * [`Error::ResizeBelowDegree`] if `degree >= values.len()`
	pub fn new(degree: usize, values: Vec<F>) -> Result<Self, Error> {
		let domain = EvaluationDomain::with_size(values.len())?;
		if degree >= values.len() {
			bail!(Error::ResizeBelowDegree {
				size: values.len(),
				degree,
			});
		}
		Ok(Self {
			degree,
			values,
			domain,
		})
	}

	/// The polynomial with the given values on the domain, of full degree bound `size - 1`.
	pub fn from_values(values: Vec<F>) -> Result<Self, Error> {
		let degree = values.len().saturating_sub(1);
		Self::new(degree, values)
	}

	pub fn constant(value: F, size: usize) -> Result<Self, Error> {
		Self::new(0, vec![value; size])
	}

	/// Evaluates a coefficient form polynomial on the subgroup of order `size`.
	pub fn from_coefficients(poly: &Polynomial<F>, size: usize) -> Result<Self, Error> {
		let domain = EvaluationDomain::with_size(size)?;
		let values = poly.evaluate_on(&domain)?;
		Ok(Self {
			degree: poly.degree(),
			values,
			domain,
		})
	}

	pub fn size(&self) -> usize {
		self.values.len()
	}

	pub fn degree(&self) -> usize {
		self.degree
	}

	pub fn domain(&self) -> &EvaluationDomain<F> {
		&self.domain
	}

	pub fn values(&self) -> &[F] {
		&self.values
	}

	pub fn into_values(self) -> Vec<F> {
		self.values
	}

	/// Interpolates the coefficients, truncated to `degree + 1`.
	pub fn coefficients(&self) -> Polynomial<F> {
		let mut coeffs = self.interpolate();
		coeffs.truncate(self.degree + 1);
		Polynomial::new(coeffs)
	}

	fn interpolate(&self) -> Vec<F> {
		self.domain
			.ifft(&self.values)
			.expect("values length equals the domain size")
	}

	/// Re-evaluates the polynomial on a domain of `new_size` points by iFFT, zero extension, FFT.
	///
	/// ## Throws
	///
	/// * [`Error::NonPowerOfTwoSize`] if `new_size` is not a power of two
	/// * [`Error::ResizeBelowDegree`] if `new_size` does not exceed the degree bound
	pub fn resize(&mut self, new_size: usize) -> Result<(), Error> {
		if new_size == self.size() {
			return Ok(());
		}
		let domain = EvaluationDomain::with_size(new_size)?;
		if new_size <= self.degree {
			bail!(Error::ResizeBelowDegree {
				size: new_size,
				degree: self.degree,
			});
		}
		self.values = self.lift(&domain);
		self.domain = domain;
		Ok(())
	}

	/// Consuming version of [`Self::resize`].
	pub fn resized(mut self, new_size: usize) -> Result<Self, Error> {
		self.resize(new_size)?;
		Ok(self)
	}

	// The caller guarantees the degree fits into `domain`.
	fn lift(&self, domain: &EvaluationDomain<F>) -> Vec<F> {
		if domain.size() == self.size() {
			return self.values.clone();
		}
		let mut coeffs = self.interpolate();
		coeffs.truncate(domain.size().min(coeffs.len()));
		domain
			.fft(&coeffs)
			.expect("coefficients were truncated to the domain size")
	}

	/// Returns q(x) = p(ω^k x), a rotation of the evaluation vector.
	pub fn shift(&self, k: i64) -> Self {
		let n = self.size() as i64;
		let rotation = k.rem_euclid(n) as usize;
		let mut values = self.values.clone();
		values.rotate_left(rotation);
		Self {
			degree: self.degree,
			values,
			domain: self.domain,
		}
	}

	/// Evaluates the polynomial at an arbitrary point with the barycentric formula.
	pub fn evaluate(&self, x: F) -> F {
		self.domain
			.evaluate_barycentric(&self.values, x)
			.expect("values length equals the domain size")
	}

	/// Replaces every value by its inverse.
	///
	/// The result is an arbitrary polynomial of degree below the domain size.
	///
	/// ## Throws
	///
	/// * [`Error::DivisionByZero`] naming the first point where the polynomial vanishes
	pub fn element_wise_inverse(&self) -> Result<Self, Error> {
		let mut values = self.values.clone();
		par_batch_invert(&mut values)?;
		Ok(Self {
			degree: self.size() - 1,
			values,
			domain: self.domain,
		})
	}

	/// Multiplies two polynomials, resizing both onto a domain that fits the product degree.
	///
	/// ## Throws
	///
	/// * [`Error::DomainSizeTooLarge`] if the product needs a domain beyond the field two-adicity
	pub fn try_mul(&self, rhs: &Self) -> Result<Self, Error> {
		let degree = self.degree + rhs.degree;
		let size = self.size().max(rhs.size()).max((degree + 1).next_power_of_two());
		let domain = EvaluationDomain::with_size(size)?;
		let lhs_values = self.lift(&domain);
		let rhs_values = rhs.lift(&domain);
		let values = lhs_values
			.into_par_iter()
			.zip(rhs_values)
			.map(|(a, b)| a * b)
			.collect();
		Ok(Self {
			degree,
			values,
			domain,
		})
	}

	/// Pointwise product on the current domain, keeping the full degree bound of the domain.
	///
	/// Used for products whose true degree exceeds the domain, where only the values matter.
	pub fn mul_pointwise(&self, rhs: &Self) -> Result<Self, Error> {
		if self.size() != rhs.size() {
			bail!(Error::DomainSizeMismatch {
				lhs: self.size(),
				rhs: rhs.size(),
			});
		}
		let values = self
			.values
			.par_iter()
			.zip(&rhs.values)
			.map(|(a, b)| *a * b)
			.collect();
		Ok(Self {
			degree: (self.degree + rhs.degree).min(self.size() - 1),
			values,
			domain: self.domain,
		})
	}

	fn zip_with(&self, rhs: &Self, op: impl Fn(F, F) -> F + Sync) -> Self {
		let (domain, lhs_values, rhs_values) = if self.size() >= rhs.size() {
			(self.domain, self.values.clone(), rhs.lift(&self.domain))
		} else {
			(rhs.domain, self.lift(&rhs.domain), rhs.values.clone())
		};
		let values = lhs_values
			.into_par_iter()
			.zip(rhs_values)
			.map(|(a, b)| op(a, b))
			.collect();
		Self {
			degree: self.degree.max(rhs.degree),
			values,
			domain,
		}
	}
}

impl<F: FftField> Add<&PolynomialDfs<F>> for &PolynomialDfs<F> {
	type Output = PolynomialDfs<F>;

	fn add(self, rhs: &PolynomialDfs<F>) -> PolynomialDfs<F> {
		self.zip_with(rhs, |a, b| a + b)
	}
}

impl<F: FftField> Sub<&PolynomialDfs<F>> for &PolynomialDfs<F> {
	type Output = PolynomialDfs<F>;

	fn sub(self, rhs: &PolynomialDfs<F>) -> PolynomialDfs<F> {
		self.zip_with(rhs, |a, b| a - b)
	}
}

impl<F: FftField> AddAssign<&PolynomialDfs<F>> for PolynomialDfs<F> {
	fn add_assign(&mut self, rhs: &PolynomialDfs<F>) {
		*self = &*self + rhs;
	}
}

impl<F: FftField> SubAssign<&PolynomialDfs<F>> for PolynomialDfs<F> {
	fn sub_assign(&mut self, rhs: &PolynomialDfs<F>) {
		*self = &*self - rhs;
	}
}

impl<F: FftField> Mul<F> for &PolynomialDfs<F> {
	type Output = PolynomialDfs<F>;

	fn mul(self, rhs: F) -> PolynomialDfs<F> {
		PolynomialDfs {
			degree: self.degree,
			values: self.values.par_iter().map(|value| *value * rhs).collect(),
			domain: self.domain,
		}
	}
}

/// Adds a constant to every value.
impl<F: FftField> Add<F> for &PolynomialDfs<F> {
	type Output = PolynomialDfs<F>;

	fn add(self, rhs: F) -> PolynomialDfs<F> {
		PolynomialDfs {
			degree: self.degree,
			values: self.values.par_iter().map(|value| *value + rhs).collect(),
			domain: self.domain,
		}
	}
}

impl<F: FftField> Neg for &PolynomialDfs<F> {
	type Output = PolynomialDfs<F>;

	fn neg(self) -> PolynomialDfs<F> {
		PolynomialDfs {
			degree: self.degree,
			values: self.values.par_iter().map(|value| -*value).collect(),
			domain: self.domain,
		}
	}
}

#[cfg(test)]
mod tests {
	use ark_bn254::Fr;
	use ark_ff::{Field, One, UniformRand, Zero};
	use assert_matches::assert_matches;
	use proptest::prelude::*;
	use rand::{rngs::StdRng, SeedableRng};

	use super::*;

	fn random_dfs(degree: usize, size: usize, seed: u64) -> (Polynomial<Fr>, PolynomialDfs<Fr>) {
		let poly = Polynomial::random(degree, StdRng::seed_from_u64(seed));
		let dfs = PolynomialDfs::from_coefficients(&poly, size).unwrap();
		(poly, dfs)
	}

	#[test]
	fn test_new_validates_size_and_degree() {
		assert_matches!(
			PolynomialDfs::new(1, vec![Fr::one(); 6]),
			Err(Error::NonPowerOfTwoSize { size: 6 })
		);
		assert_matches!(
			PolynomialDfs::new(8, vec![Fr::one(); 8]),
			Err(Error::ResizeBelowDegree { size: 8, degree: 8 })
		);
	}

	#[test]
	fn test_coefficients_round_trip() {
		let (poly, dfs) = random_dfs(5, 8, 0);
		assert_eq!(dfs.coefficients(), poly);
	}

	#[test]
	fn test_resize_preserves_polynomial() {
		let mut rng = StdRng::seed_from_u64(1);
		let (poly, mut dfs) = random_dfs(6, 8, 0);
		dfs.resize(32).unwrap();
		assert_eq!(dfs.size(), 32);
		let x = Fr::rand(&mut rng);
		assert_eq!(dfs.evaluate(x), poly.evaluate(x));

		dfs.resize(8).unwrap();
		assert_eq!(dfs.evaluate(x), poly.evaluate(x));

		assert_matches!(dfs.resize(4), Err(Error::ResizeBelowDegree { size: 4, degree: 6 }));
		assert_matches!(dfs.resize(12), Err(Error::NonPowerOfTwoSize { size: 12 }));
	}

	#[test]
	fn test_shift_rotates_argument() {
		let mut rng = StdRng::seed_from_u64(1);
		let (poly, dfs) = random_dfs(7, 16, 0);
		let omega = dfs.domain().generator();
		let x = Fr::rand(&mut rng);

		assert_eq!(dfs.shift(3).evaluate(x), poly.evaluate(omega.pow([3u64]) * x));
		assert_eq!(dfs.shift(-1).evaluate(x), poly.evaluate(dfs.domain().generator_inv() * x));
		assert_eq!(dfs.shift(16), dfs);
	}

	#[test]
	fn test_element_wise_inverse() {
		let (_, dfs) = random_dfs(3, 8, 0);
		let inverse = dfs.element_wise_inverse().unwrap();
		assert!(dfs
			.values()
			.iter()
			.zip(inverse.values())
			.all(|(a, b)| *a * b == Fr::one()));

		let mut values = vec![Fr::one(); 8];
		values[5] = Fr::zero();
		let dfs = PolynomialDfs::from_values(values).unwrap();
		assert_matches!(dfs.element_wise_inverse(), Err(Error::DivisionByZero { index: 5 }));
	}

	#[test]
	fn test_mul_resizes_to_product_degree() {
		let mut rng = StdRng::seed_from_u64(2);
		let (a, a_dfs) = random_dfs(5, 8, 0);
		let (b, b_dfs) = random_dfs(6, 8, 1);

		let product = a_dfs.try_mul(&b_dfs).unwrap();
		assert_eq!(product.size(), 16);
		assert_eq!(product.degree(), 11);
		assert_eq!(product.coefficients(), &a * &b);

		let x = Fr::rand(&mut rng);
		assert_eq!(product.evaluate(x), a.evaluate(x) * b.evaluate(x));
	}

	#[test]
	fn test_add_mixed_sizes() {
		let mut rng = StdRng::seed_from_u64(2);
		let (a, a_dfs) = random_dfs(3, 4, 0);
		let (b, b_dfs) = random_dfs(9, 16, 1);

		let sum = &a_dfs + &b_dfs;
		assert_eq!(sum.size(), 16);
		let x = Fr::rand(&mut rng);
		assert_eq!(sum.evaluate(x), a.evaluate(x) + b.evaluate(x));

		let mut diff = b_dfs.clone();
		diff -= &a_dfs;
		assert_eq!(diff.evaluate(x), b.evaluate(x) - a.evaluate(x));
	}

	proptest! {
		#[test]
		fn test_evaluate_matches_coefficients(seed in any::<u64>(), log_size in 0usize..6) {
			let size = 1 << log_size;
			let (poly, dfs) = random_dfs(size - 1, size, seed);
			let x = Fr::rand(&mut StdRng::seed_from_u64(seed ^ 1));
			prop_assert_eq!(dfs.evaluate(x), poly.evaluate(x));
			prop_assert_eq!(dfs.evaluate(dfs.domain().element(0)), dfs.values()[0]);
		}
	}
}
