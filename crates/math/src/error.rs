// Copyright 2024 Irreducible Inc.

/// Errors of the polynomial kernel and the evaluation domains.
///
/// `DomainSizeTooLarge`, `NonPowerOfTwoSize`, `ResizeBelowDegree`, `DomainSizeMismatch` and
/// `TooManyHalvings` are domain errors: an operation was requested outside the parameters the
/// polynomial or domain was built with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("argument {arg} does not have expected length {expected}")]
	IncorrectArgumentLength { arg: String, expected: usize },
	#[error("attempted to invert zero at index {index}")]
	DivisionByZero { index: usize },
	#[error("a domain of size 2^{log_size} exceeds the field two-adicity {two_adicity}")]
	DomainSizeTooLarge { log_size: usize, two_adicity: u32 },
	#[error("size {size} is not a power of two")]
	NonPowerOfTwoSize { size: usize },
	#[error("cannot represent a polynomial of degree {degree} on a domain of size {size}")]
	ResizeBelowDegree { size: usize, degree: usize },
	#[error("domain sizes {lhs} and {rhs} do not match")]
	DomainSizeMismatch { lhs: usize, rhs: usize },
	#[error("cannot halve a domain of size 2^{log_size} {halvings} times")]
	TooManyHalvings { log_size: usize, halvings: usize },
	#[error("division by x^{size} - 1 leaves a non-zero remainder")]
	NonZeroRemainder { size: usize },
}

impl Error {
	/// Whether the error reports an operation outside the domain parameters.
	pub const fn is_domain_error(&self) -> bool {
		matches!(
			self,
			Self::DomainSizeTooLarge { .. }
				| Self::NonPowerOfTwoSize { .. }
				| Self::ResizeBelowDegree { .. }
				| Self::DomainSizeMismatch { .. }
				| Self::TooManyHalvings { .. }
		)
	}
}
