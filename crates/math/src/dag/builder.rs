// Copyright 2024 Irreducible Inc.

use std::{
	collections::{HashMap, HashSet},
	hash::Hash,
	mem,
};

use ark_ff::Field;
use tracing::instrument;

use super::{DagExpression, DagNode, NodeKind};
use crate::ArithExpr;

/// Share of the most frequent operand pairs extracted in one pass of duplicate removal.
const TOP_PAIRS_PERCENT: usize = 5;

/// Builds a [`DagExpression`] from a list of root expressions.
#[derive(Debug, Clone)]
pub struct DagExpressionBuilder<F, V> {
	nodes: Vec<DagNode<F, V>>,
	index: HashMap<DagNode<F, V>, usize>,
	roots: Vec<usize>,
}

impl<F, V> Default for DagExpressionBuilder<F, V> {
	fn default() -> Self {
		Self {
			nodes: Vec::new(),
			index: HashMap::new(),
			roots: Vec::new(),
		}
	}
}

impl<F, V> DagExpressionBuilder<F, V>
where
	F: Field,
	V: Clone + Eq + Hash,
{
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers an expression as a new root and returns its root position.
	pub fn add_expression(&mut self, expr: &ArithExpr<F, V>) -> usize {
		let node = self.register_expr(expr);
		self.roots.push(node);
		self.roots.len() - 1
	}

	/// Returns the index of a structurally equal node, inserting the node if there is none.
	///
	/// Operands of sums and products are sorted first so that commutative equivalents collide.
	pub fn register_node(&mut self, mut node: DagNode<F, V>) -> usize {
		if let DagNode::Add(operands) | DagNode::Mul(operands) = &mut node {
			operands.sort_unstable();
		}
		if let Some(&index) = self.index.get(&node) {
			return index;
		}
		let index = self.nodes.len();
		self.nodes.push(node.clone());
		self.index.insert(node, index);
		index
	}

	fn register_expr(&mut self, expr: &ArithExpr<F, V>) -> usize {
		match expr {
			ArithExpr::Const(value) => self.register_node(DagNode::Constant(*value)),
			ArithExpr::Var(var) => self.register_node(DagNode::Variable(var.clone())),
			ArithExpr::Add(left, right) => {
				let left = self.register_expr(left);
				let right = self.register_expr(right);
				self.register_node(DagNode::Add(vec![left, right]))
			}
			ArithExpr::Mul(left, right) => {
				let left = self.register_expr(left);
				let right = self.register_expr(right);
				self.register_node(DagNode::Mul(vec![left, right]))
			}
			ArithExpr::Neg(inner) => {
				let inner = self.register_expr(inner);
				self.register_node(DagNode::Neg(inner))
			}
			ArithExpr::Pow(base, exp) => {
				let base = self.register_expr(base);
				self.register_pow(base, *exp)
			}
		}
	}

	/// Expands `base^exp` by square-and-multiply.
	fn register_pow(&mut self, base: usize, exp: u64) -> usize {
		if exp == 0 {
			return self.register_node(DagNode::Constant(F::one()));
		}

		let mut result = None;
		let mut square = base;
		let mut exp = exp;
		loop {
			if exp & 1 == 1 {
				result = Some(match result {
					None => square,
					Some(acc) => self.register_node(DagNode::Mul(vec![acc, square])),
				});
			}
			exp >>= 1;
			if exp == 0 {
				break;
			}
			square = self.register_node(DagNode::Mul(vec![square, square]));
		}
		result.unwrap_or(base)
	}

	/// Canonicalizes the registered expressions.
	#[instrument(skip_all, level = "debug", fields(roots = self.roots.len()))]
	pub fn build(mut self) -> DagExpression<F, V> {
		self.merge_children(false);
		self.remove_unreachable_nodes();
		self.remove_duplicates();
		self.merge_children(true);
		self.remove_unreachable_nodes();

		tracing::debug!(nodes = self.nodes.len(), "built expression DAG");
		DagExpression {
			nodes: self.nodes,
			roots: self.roots,
		}
	}

	/// Inlines the operands of sum (product) children into their sum (product) parents.
	///
	/// With `single_parent_only`, only children referenced exactly once, roots included, are
	/// inlined. Squares are never inlined, so the chains of [`Self::register_pow`] keep their
	/// logarithmic length. Leaves the index map stale.
	fn merge_children(&mut self, single_parent_only: bool) {
		let parent_counts = single_parent_only.then(|| self.parent_counts());

		// Operands precede their users, so every child is already merged when its parent is
		// visited.
		for i in 0..self.nodes.len() {
			let kind = self.nodes[i].kind();
			if !matches!(kind, NodeKind::Add | NodeKind::Mul) {
				continue;
			}

			let operands = self.nodes[i].operands().to_vec();
			let mut merged = Vec::with_capacity(operands.len());
			for operand in operands {
				let inline = self.nodes[operand].kind() == kind
					&& !self.nodes[operand].is_square()
					&& parent_counts
						.as_ref()
						.map_or(true, |counts| counts[operand] == 1);
				if inline {
					merged.extend_from_slice(self.nodes[operand].operands());
				} else {
					merged.push(operand);
				}
			}
			merged.sort_unstable();

			match &mut self.nodes[i] {
				DagNode::Add(operands) | DagNode::Mul(operands) => *operands = merged,
				_ => unreachable!("kind was checked above"),
			}
		}
	}

	fn parent_counts(&self) -> Vec<usize> {
		let mut counts = vec![0; self.nodes.len()];
		for node in &self.nodes {
			for &operand in node.operands() {
				counts[operand] += 1;
			}
		}
		for &root in &self.roots {
			counts[root] += 1;
		}
		counts
	}

	/// Re-registers the nodes reachable from the roots in post order.
	///
	/// This drops unreachable nodes, merges structurally equal ones, restores the topological order
	/// and rebuilds the index map.
	fn remove_unreachable_nodes(&mut self) {
		let old_nodes = mem::take(&mut self.nodes);
		self.index.clear();

		let mut remap: Vec<Option<usize>> = vec![None; old_nodes.len()];
		let mut stack = Vec::new();
		let roots = mem::take(&mut self.roots);
		for &root in &roots {
			stack.push((root, false));
			while let Some((old, expanded)) = stack.pop() {
				if remap[old].is_some() {
					continue;
				}
				if !expanded {
					stack.push((old, true));
					for &operand in old_nodes[old].operands() {
						if remap[operand].is_none() {
							stack.push((operand, false));
						}
					}
					continue;
				}

				let new_node = match &old_nodes[old] {
					DagNode::Constant(value) => DagNode::Constant(*value),
					DagNode::Variable(var) => DagNode::Variable(var.clone()),
					DagNode::Add(operands) => DagNode::Add(remap_operands(operands, &remap)),
					DagNode::Mul(operands) => DagNode::Mul(remap_operands(operands, &remap)),
					DagNode::Neg(operand) => DagNode::Neg(remapped(&remap, *operand)),
				};
				remap[old] = Some(self.register_node(new_node));
			}
		}

		self.roots = roots
			.into_iter()
			.map(|root| remapped(&remap, root))
			.collect();
	}

	/// Extracts operand pairs shared by several sums (products) into new shared nodes.
	///
	/// Each pass counts, per operator kind, the nodes with more than two operands that contain
	/// each pair. Pairs occurring in at least two nodes and ranking in the top percentile of counts
	/// are extracted, most frequent first. Passes repeat until no pair qualifies.
	fn remove_duplicates(&mut self) {
		loop {
			let pairs = self.frequent_pairs();
			if pairs.is_empty() {
				break;
			}

			for (kind, a, b) in pairs {
				let pair = if kind == NodeKind::Add {
					DagNode::Add(vec![a, b])
				} else {
					DagNode::Mul(vec![a, b])
				};
				let shared = self.nodes.len();
				let mut used = false;

				for i in 0..shared {
					if self.nodes[i].kind() != kind || self.nodes[i].operands().len() <= 2 {
						continue;
					}
					if let DagNode::Add(operands) | DagNode::Mul(operands) = &mut self.nodes[i] {
						if let Some(rest) = remove_pair(operands, a, b) {
							*operands = rest;
							operands.push(shared);
							operands.sort_unstable();
							used = true;
						}
					}
				}

				if used {
					self.nodes.push(pair);
				}
			}

			// The shared nodes were appended after their users.
			self.remove_unreachable_nodes();
		}
	}

	fn frequent_pairs(&self) -> Vec<(NodeKind, usize, usize)> {
		let mut counts = HashMap::<(NodeKind, usize, usize), usize>::new();
		for node in &self.nodes {
			let operands = node.operands();
			if !matches!(node.kind(), NodeKind::Add | NodeKind::Mul) || operands.len() <= 2 {
				continue;
			}
			let mut seen = HashSet::new();
			for i in 0..operands.len() {
				for j in i + 1..operands.len() {
					let key = (node.kind(), operands[i], operands[j]);
					if seen.insert(key) {
						*counts.entry(key).or_default() += 1;
					}
				}
			}
		}

		let mut pairs = counts
			.into_iter()
			.filter(|&(_, count)| count >= 2)
			.collect::<Vec<_>>();
		if pairs.is_empty() {
			return Vec::new();
		}

		// Most frequent first, ties broken by the pair itself for a deterministic build.
		pairs.sort_unstable_by(|(lhs, lhs_count), (rhs, rhs_count)| {
			rhs_count.cmp(lhs_count).then(lhs.cmp(rhs))
		});
		let threshold = pairs[pairs.len() * TOP_PAIRS_PERCENT / 100].1;
		pairs
			.into_iter()
			.take_while(|&(_, count)| count >= threshold)
			.map(|(pair, _)| pair)
			.collect()
	}
}

fn remap_operands(operands: &[usize], remap: &[Option<usize>]) -> Vec<usize> {
	operands
		.iter()
		.map(|&operand| remapped(remap, operand))
		.collect()
}

fn remapped(remap: &[Option<usize>], index: usize) -> usize {
	remap[index].expect("operands are registered before their users")
}

/// Removes one occurrence of `a` and one of `b` from a sorted operand list, if both are present.
fn remove_pair(operands: &[usize], a: usize, b: usize) -> Option<Vec<usize>> {
	let pos_a = operands.iter().position(|&x| x == a)?;
	let pos_b = operands
		.iter()
		.enumerate()
		.position(|(pos, &x)| x == b && pos != pos_a)?;
	Some(
		operands
			.iter()
			.enumerate()
			.filter(|&(pos, _)| pos != pos_a && pos != pos_b)
			.map(|(_, &x)| x)
			.collect(),
	)
}
