// Copyright 2024 Irreducible Inc.

//! Shared, deduplicated form of a set of expressions.
//!
//! Thousands of constraint expressions share column variables and small sub-expressions. The
//! builder hash-conses them into one node array, flattens nested sums and products and extracts
//! operand pairs common to several nodes. The evaluator then computes every node once per row.

mod builder;
mod evaluator;

pub use builder::DagExpressionBuilder;
pub use evaluator::{ColumnOracle, DagEvaluator, ShiftedColumn};

use ark_ff::Field;

/// A node of a [`DagExpression`]. Operands are indices of earlier nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DagNode<F, V> {
	Constant(F),
	Variable(V),
	/// Sum of the operands, sorted ascending.
	Add(Vec<usize>),
	/// Product of the operands, sorted ascending.
	Mul(Vec<usize>),
	Neg(usize),
}

impl<F, V> DagNode<F, V> {
	pub fn operands(&self) -> &[usize] {
		match self {
			Self::Constant(_) | Self::Variable(_) => &[],
			Self::Add(operands) | Self::Mul(operands) => operands,
			Self::Neg(operand) => std::slice::from_ref(operand),
		}
	}

	/// A product of one node with itself.
	fn is_square(&self) -> bool {
		matches!(self, Self::Mul(operands) if operands.len() == 2 && operands[0] == operands[1])
	}

	const fn kind(&self) -> NodeKind {
		match self {
			Self::Constant(_) => NodeKind::Constant,
			Self::Variable(_) => NodeKind::Variable,
			Self::Add(_) => NodeKind::Add,
			Self::Mul(_) => NodeKind::Mul,
			Self::Neg(_) => NodeKind::Neg,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum NodeKind {
	Constant,
	Variable,
	Add,
	Mul,
	Neg,
}

/// A built expression DAG.
///
/// Nodes are in topological order: every operand index is smaller than the index of the node
/// using it. No two nodes are structurally equal, operand lists of sums and products are sorted
/// and every node is reachable from a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DagExpression<F, V> {
	nodes: Vec<DagNode<F, V>>,
	roots: Vec<usize>,
}

impl<F: Field, V> DagExpression<F, V> {
	pub fn nodes(&self) -> &[DagNode<F, V>] {
		&self.nodes
	}

	/// Node indices of the expressions, in the order they were added to the builder.
	pub fn roots(&self) -> &[usize] {
		&self.roots
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Evaluates every root at a single point, reading variables through `value_of`.
	pub fn evaluate_at(&self, value_of: impl Fn(&V) -> F) -> Vec<F> {
		let mut values: Vec<F> = Vec::with_capacity(self.nodes.len());
		for node in &self.nodes {
			let value = match node {
				DagNode::Constant(value) => *value,
				DagNode::Variable(var) => value_of(var),
				DagNode::Add(operands) => operands.iter().map(|&i| values[i]).sum(),
				DagNode::Mul(operands) => operands.iter().map(|&i| values[i]).product(),
				DagNode::Neg(operand) => -values[*operand],
			};
			values.push(value);
		}
		self.roots.iter().map(|&root| values[root]).collect()
	}
}
