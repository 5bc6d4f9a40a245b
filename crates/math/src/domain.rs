// Copyright 2024 Irreducible Inc.

use ark_ff::FftField;
use ark_poly::{EvaluationDomain as _, Radix2EvaluationDomain};
use placeholder_utils::{bail, checked_arithmetics::log2_strict_usize};

use crate::{inverse::batch_invert, Error};

/// A multiplicative subgroup of order 2^k together with its generator ω.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationDomain<F: FftField> {
	inner: Radix2EvaluationDomain<F>,
}

impl<F: FftField> EvaluationDomain<F> {
	/// Creates the subgroup of order `2^log_size`.
	pub fn new(log_size: usize) -> Result<Self, Error> {
		if log_size > F::TWO_ADICITY as usize {
			bail!(Error::DomainSizeTooLarge {
				log_size,
				two_adicity: F::TWO_ADICITY,
			});
		}
		let inner = Radix2EvaluationDomain::new(1 << log_size).ok_or(Error::DomainSizeTooLarge {
			log_size,
			two_adicity: F::TWO_ADICITY,
		})?;
		Ok(Self { inner })
	}

	/// Creates the subgroup of order `size`, which must be a power of two.
	pub fn with_size(size: usize) -> Result<Self, Error> {
		let log_size = log2_strict_usize(size).ok_or(Error::NonPowerOfTwoSize { size })?;
		Self::new(log_size)
	}

	pub fn size(&self) -> usize {
		self.inner.size as usize
	}

	pub fn log_size(&self) -> usize {
		self.inner.log_size_of_group as usize
	}

	/// The generator ω.
	pub fn generator(&self) -> F {
		self.inner.group_gen
	}

	pub fn generator_inv(&self) -> F {
		self.inner.group_gen_inv
	}

	/// The inverse of the domain size as a field element.
	pub fn size_inv(&self) -> F {
		self.inner.size_inv
	}

	/// Returns ω^index.
	pub fn element(&self, index: usize) -> F {
		self.inner.element(index)
	}

	/// All domain elements in index order.
	pub fn elements(&self) -> Vec<F> {
		self.inner.elements().collect()
	}

	/// Evaluates the coefficients on the domain. Shorter inputs are zero-padded.
	///
	/// ## Throws
	///
	/// * [`Error::ResizeBelowDegree`] if there are more coefficients than domain points
	pub fn fft(&self, coeffs: &[F]) -> Result<Vec<F>, Error> {
		if coeffs.len() > self.size() {
			bail!(Error::ResizeBelowDegree {
				size: self.size(),
				degree: coeffs.len() - 1,
			});
		}
		Ok(self.inner.fft(coeffs))
	}

	/// Interpolates the coefficients of the polynomial with the given values on the domain.
	pub fn ifft(&self, values: &[F]) -> Result<Vec<F>, Error> {
		if values.len() != self.size() {
			bail!(Error::DomainSizeMismatch {
				lhs: self.size(),
				rhs: values.len(),
			});
		}
		Ok(self.inner.ifft(values))
	}

	/// Returns x^n - 1.
	pub fn vanishing_at(&self, x: F) -> F {
		x.pow([self.size() as u64]) - F::one()
	}

	/// Evaluates the first Lagrange basis polynomial L0(x) = (x^n - 1) / (n (x - 1)).
	pub fn lagrange_first_at(&self, x: F) -> F {
		if x.is_one() {
			return F::one();
		}
		let denominator = (x - F::one()) * F::from(self.size() as u64);
		// x - 1 is non-zero here
		self.vanishing_at(x) * denominator.inverse().unwrap_or_default()
	}

	/// Evaluates at `x` the polynomial of degree < n taking `values[i]` at ω^i.
	///
	/// Missing trailing values are treated as zero. Uses the barycentric formula
	/// p(x) = (x^n - 1) / n · Σ v_i ω^i / (x - ω^i), in O(n) with one field inversion. When `x`
	/// lies in the domain the stored value is returned.
	pub fn evaluate_barycentric(&self, values: &[F], x: F) -> Result<F, Error> {
		if values.len() > self.size() {
			bail!(Error::IncorrectArgumentLength {
				arg: "values".to_string(),
				expected: self.size(),
			});
		}

		let vanishing = self.vanishing_at(x);
		if vanishing.is_zero() {
			let mut point = F::one();
			for value in values {
				if point == x {
					return Ok(*value);
				}
				point *= self.generator();
			}
			return Ok(F::zero());
		}

		let mut points = Vec::with_capacity(values.len());
		let mut denominators = Vec::with_capacity(values.len());
		let mut point = F::one();
		for _ in 0..values.len() {
			points.push(point);
			denominators.push(x - point);
			point *= self.generator();
		}
		batch_invert(&mut denominators)?;

		let sum = values
			.iter()
			.zip(points)
			.zip(denominators)
			.map(|((value, point), inv)| *value * point * inv)
			.sum::<F>();
		Ok(sum * vanishing * self.size_inv())
	}

	/// Returns the domain of half the size, generated by ω².
	pub fn halve(&self) -> Result<Self, Error> {
		if self.log_size() == 0 {
			bail!(Error::TooManyHalvings {
				log_size: 0,
				halvings: 1,
			});
		}
		let halved = Self::new(self.log_size() - 1)?;
		debug_assert_eq!(halved.generator(), self.generator().square());
		Ok(halved)
	}
}

/// The nested FRI domains D0 ⊃ D1 ⊃ ... ⊃ Dr with |D_{i+1}| = |D_i| / 2 and D_{i+1} = {x² : x ∈ D_i}.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationDomainSet<F: FftField> {
	domains: Vec<EvaluationDomain<F>>,
}

impl<F: FftField> EvaluationDomainSet<F> {
	/// Builds D0 of size 2^(degree_log + expansion_log) and its `rounds` halvings.
	pub fn new(degree_log: usize, expansion_log: usize, rounds: usize) -> Result<Self, Error> {
		if rounds > degree_log {
			bail!(Error::TooManyHalvings {
				log_size: degree_log,
				halvings: rounds,
			});
		}

		let mut domains = Vec::with_capacity(rounds + 1);
		let mut domain = EvaluationDomain::new(degree_log + expansion_log)?;
		domains.push(domain);
		for _ in 0..rounds {
			domain = domain.halve()?;
			domains.push(domain);
		}
		Ok(Self { domains })
	}

	/// The largest domain D0.
	pub fn base(&self) -> &EvaluationDomain<F> {
		&self.domains[0]
	}

	pub fn get(&self, index: usize) -> Option<&EvaluationDomain<F>> {
		self.domains.get(index)
	}

	pub fn domains(&self) -> &[EvaluationDomain<F>] {
		&self.domains
	}

	/// The number of domains, r + 1.
	pub fn len(&self) -> usize {
		self.domains.len()
	}

	pub fn is_empty(&self) -> bool {
		self.domains.is_empty()
	}
}
