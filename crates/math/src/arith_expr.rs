// Copyright 2024-2025 Irreducible Inc.

use std::{
	collections::BTreeSet,
	fmt::{self, Display},
	iter::{Product, Sum},
	ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign},
};

use ark_ff::Field;

/// Arithmetic expressions that can be evaluated symbolically.
///
/// Arithmetic expressions are trees, where the leaves are either constants or variables, and the
/// non-leaf nodes are arithmetic operations, such as addition, multiplication, etc. They are
/// specific representations of multivariate polynomials over the variables of type `V`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArithExpr<F: Field, V> {
	Const(F),
	Var(V),
	Add(Box<ArithExpr<F, V>>, Box<ArithExpr<F, V>>),
	Mul(Box<ArithExpr<F, V>>, Box<ArithExpr<F, V>>),
	Neg(Box<ArithExpr<F, V>>),
	Pow(Box<ArithExpr<F, V>>, u64),
}

impl<F: Field, V: Display> Display for ArithExpr<F, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Const(v) => write!(f, "{v}"),
			Self::Var(var) => write!(f, "{var}"),
			Self::Add(x, y) => write!(f, "({} + {})", &**x, &**y),
			Self::Mul(x, y) => write!(f, "({} * {})", &**x, &**y),
			Self::Neg(x) => write!(f, "-{}", &**x),
			Self::Pow(x, p) => write!(f, "({})^{p}", &**x),
		}
	}
}

impl<F: Field, V> ArithExpr<F, V> {
	/// The total degree of the polynomial the expression represents.
	pub fn degree(&self) -> usize {
		match self {
			Self::Const(_) => 0,
			Self::Var(_) => 1,
			Self::Add(left, right) => left.degree().max(right.degree()),
			Self::Mul(left, right) => left.degree() + right.degree(),
			Self::Neg(inner) => inner.degree(),
			Self::Pow(base, exp) => base.degree() * *exp as usize,
		}
	}

	pub fn pow(self, exp: u64) -> Self {
		Self::Pow(Box::new(self), exp)
	}

	pub fn zero() -> Self {
		Self::Const(F::zero())
	}

	pub fn one() -> Self {
		Self::Const(F::one())
	}

	/// Whether expression is a composite node, and not a leaf.
	pub const fn is_composite(&self) -> bool {
		match self {
			Self::Const(_) | Self::Var(_) => false,
			Self::Add(_, _) | Self::Mul(_, _) | Self::Neg(_) | Self::Pow(_, _) => true,
		}
	}

	/// Returns `Some(F)` if the expression is a constant.
	pub const fn constant(&self) -> Option<F> {
		match self {
			Self::Const(value) => Some(*value),
			_ => None,
		}
	}

	/// Creates a new expression with every variable replaced by `f(variable)`.
	pub fn map_vars<W>(self, f: &impl Fn(V) -> W) -> ArithExpr<F, W> {
		match self {
			Self::Const(value) => ArithExpr::Const(value),
			Self::Var(var) => ArithExpr::Var(f(var)),
			Self::Add(left, right) => {
				ArithExpr::Add(Box::new(left.map_vars(f)), Box::new(right.map_vars(f)))
			}
			Self::Mul(left, right) => {
				ArithExpr::Mul(Box::new(left.map_vars(f)), Box::new(right.map_vars(f)))
			}
			Self::Neg(inner) => ArithExpr::Neg(Box::new(inner.map_vars(f))),
			Self::Pow(base, exp) => ArithExpr::Pow(Box::new(base.map_vars(f)), exp),
		}
	}

	/// Evaluates the expression, reading variables through `value_of`.
	pub fn evaluate(&self, value_of: &impl Fn(&V) -> F) -> F {
		match self {
			Self::Const(val) => *val,
			Self::Var(var) => value_of(var),
			Self::Add(left, right) => left.evaluate(value_of) + right.evaluate(value_of),
			Self::Mul(left, right) => left.evaluate(value_of) * right.evaluate(value_of),
			Self::Neg(inner) => -inner.evaluate(value_of),
			Self::Pow(base, exp) => base.evaluate(value_of).pow([*exp]),
		}
	}

	/// Calls `f` on every variable occurrence, left to right.
	pub fn visit_vars<'a>(&'a self, f: &mut impl FnMut(&'a V)) {
		match self {
			Self::Const(_) => (),
			Self::Var(var) => f(var),
			Self::Add(left, right) | Self::Mul(left, right) => {
				left.visit_vars(f);
				right.visit_vars(f);
			}
			Self::Neg(inner) | Self::Pow(inner, _) => inner.visit_vars(f),
		}
	}
}

impl<F: Field, V: Clone + PartialEq> ArithExpr<F, V> {
	/// Creates a new optimized expression.
	///
	/// Recursively rewrites the expression for better evaluation performance. Performs constant
	/// folding, as well as leverages simple rewriting rules around additive/multiplicative
	/// identities and double negation.
	pub fn optimize(&self) -> Self {
		match self {
			Self::Const(_) | Self::Var(_) => self.clone(),
			Self::Add(left, right) => {
				let left = left.optimize();
				let right = right.optimize();
				match (left, right) {
					// constant folding
					(Self::Const(left), Self::Const(right)) => Self::Const(left + right),
					// 0 + a = a + 0 = a
					(Self::Const(left), right) if left.is_zero() => right,
					(left, Self::Const(right)) if right.is_zero() => left,
					// fallback
					(left, right) => Self::Add(Box::new(left), Box::new(right)),
				}
			}
			Self::Mul(left, right) => {
				let left = left.optimize();
				let right = right.optimize();
				match (left, right) {
					// constant folding
					(Self::Const(left), Self::Const(right)) => Self::Const(left * right),
					// 0 * a = a * 0 = 0
					(Self::Const(value), _) | (_, Self::Const(value)) if value.is_zero() => {
						Self::zero()
					}
					// 1 * a = a * 1 = a
					(Self::Const(left), right) if left.is_one() => right,
					(left, Self::Const(right)) if right.is_one() => left,
					// fallback
					(left, right) => Self::Mul(Box::new(left), Box::new(right)),
				}
			}
			Self::Neg(inner) => match inner.optimize() {
				Self::Const(value) => Self::Const(-value),
				Self::Neg(inner) => *inner,
				inner => Self::Neg(Box::new(inner)),
			},
			Self::Pow(id, exp) => {
				let id = id.optimize();
				match id {
					_ if *exp == 0 => Self::one(),
					id if *exp == 1 => id,
					Self::Const(value) => Self::Const(value.pow([*exp])),
					Self::Pow(id_inner, exp_inner) => Self::Pow(id_inner, *exp * exp_inner),
					id => Self::Pow(Box::new(id), *exp),
				}
			}
		}
	}
}

impl<F: Field, V: Clone + Ord> ArithExpr<F, V> {
	/// The distinct variables of the expression in ascending order.
	pub fn variables(&self) -> BTreeSet<V> {
		let mut vars = BTreeSet::new();
		self.visit_vars(&mut |var| {
			vars.insert(var.clone());
		});
		vars
	}
}

impl<F: Field, V> Default for ArithExpr<F, V> {
	fn default() -> Self {
		Self::zero()
	}
}

impl<F: Field, V> From<F> for ArithExpr<F, V> {
	fn from(value: F) -> Self {
		Self::Const(value)
	}
}

impl<F: Field, V> Add for ArithExpr<F, V> {
	type Output = Self;

	fn add(self, rhs: Self) -> Self {
		Self::Add(Box::new(self), Box::new(rhs))
	}
}

impl<F: Field, V> AddAssign for ArithExpr<F, V> {
	fn add_assign(&mut self, rhs: Self) {
		*self = std::mem::take(self) + rhs;
	}
}

impl<F: Field, V> Sub for ArithExpr<F, V> {
	type Output = Self;

	fn sub(self, rhs: Self) -> Self {
		Self::Add(Box::new(self), Box::new(Self::Neg(Box::new(rhs))))
	}
}

impl<F: Field, V> SubAssign for ArithExpr<F, V> {
	fn sub_assign(&mut self, rhs: Self) {
		*self = std::mem::take(self) - rhs;
	}
}

impl<F: Field, V> Mul for ArithExpr<F, V> {
	type Output = Self;

	fn mul(self, rhs: Self) -> Self {
		Self::Mul(Box::new(self), Box::new(rhs))
	}
}

impl<F: Field, V> MulAssign for ArithExpr<F, V> {
	fn mul_assign(&mut self, rhs: Self) {
		*self = std::mem::take(self) * rhs;
	}
}

impl<F: Field, V> Neg for ArithExpr<F, V> {
	type Output = Self;

	fn neg(self) -> Self {
		Self::Neg(Box::new(self))
	}
}

impl<F: Field, V> Sum for ArithExpr<F, V> {
	fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
		iter.reduce(|acc, item| acc + item).unwrap_or(Self::zero())
	}
}

impl<F: Field, V> Product for ArithExpr<F, V> {
	fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
		iter.reduce(|acc, item| acc * item).unwrap_or(Self::one())
	}
}

#[cfg(test)]
mod tests {
	use ark_bn254::Fr;
	use ark_ff::{One, Zero};

	use super::*;

	type Expr = ArithExpr<Fr, usize>;

	fn var(index: usize) -> Expr {
		ArithExpr::Var(index)
	}

	#[test]
	fn test_degree_with_pow() {
		let expr = Expr::Const(Fr::from(6u64)).pow(7);
		assert_eq!(expr.degree(), 0);

		let expr = var(0).pow(7);
		assert_eq!(expr.degree(), 7);

		let expr = (var(0) * var(1)).pow(7);
		assert_eq!(expr.degree(), 14);

		let expr = -(var(0) * var(1)) + var(2);
		assert_eq!(expr.degree(), 2);
	}

	#[test]
	fn test_evaluate_with_sub_and_neg() {
		let expr = (var(0) - var(1)) * var(2) + (-var(0)).pow(3);
		let values = [Fr::from(7u64), Fr::from(3u64), Fr::from(5u64)];
		let value = expr.evaluate(&|index: &usize| values[*index]);
		assert_eq!(value, Fr::from(20u64) - Fr::from(343u64));
	}

	#[test]
	fn test_optimize_identity_handling() {
		let zero = Expr::zero();
		let one = Expr::one();

		assert_eq!((zero.clone() * var(0)).optimize(), zero);
		assert_eq!((var(0) * zero.clone()).optimize(), zero);

		assert_eq!((var(0) * one.clone()).optimize(), var(0));
		assert_eq!((one * var(0)).optimize(), var(0));

		assert_eq!((var(0) + zero.clone()).optimize(), var(0));
		assert_eq!((zero + var(0)).optimize(), var(0));

		assert_eq!((-(-var(0))).optimize(), var(0));
		assert_eq!(var(3).pow(1).optimize(), var(3));
		assert_eq!(var(3).pow(0).optimize(), Expr::one());
	}

	#[test]
	fn test_optimize_constant_folding() {
		let expr = (Expr::Const(Fr::from(2u64)) + Expr::Const(Fr::from(3u64))).pow(2)
			- Expr::Const(Fr::from(25u64));
		assert_eq!(expr.optimize().constant(), Some(Fr::zero()));
	}

	#[test]
	fn test_map_vars_and_variables() {
		let expr = (var(4) + var(1)) * var(4).pow(2);
		assert_eq!(expr.variables().into_iter().collect::<Vec<_>>(), vec![1, 4]);

		let mapped = expr.map_vars(&|index| index * 10);
		assert_eq!(mapped, (var(40) + var(10)) * var(40).pow(2));
	}

	#[test]
	fn test_sum_and_product_of_empty() {
		assert_eq!(std::iter::empty::<Expr>().sum::<Expr>(), Expr::zero());
		assert_eq!(std::iter::empty::<Expr>().product::<Expr>(), Expr::one());
		assert_eq!(Expr::one().constant(), Some(Fr::one()));
	}

	#[test]
	fn test_display() {
		let expr = (var(0) - var(1)) * Expr::Const(Fr::from(2u64));
		assert_eq!(expr.to_string(), "((0 + -1) * 2)");
	}
}
