// Copyright 2024 Irreducible Inc.

use std::mem;

use ark_ff::Field;
use placeholder_utils::{bail, rayon::parallel_chunk_len};
use rayon::prelude::*;
use tracing::instrument;

use super::{DagExpression, DagNode};
use crate::Error;

const MIN_CHUNK_LEN: usize = 1 << 8;

/// A column of values read with a cyclic offset: row `i` is `values[(i + shift) % values.len()]`.
#[derive(Debug, Clone, Copy)]
pub struct ShiftedColumn<'a, F> {
	pub values: &'a [F],
	pub shift: usize,
}

impl<'a, F> ShiftedColumn<'a, F> {
	pub fn new(values: &'a [F]) -> Self {
		Self { values, shift: 0 }
	}

	pub fn with_shift(values: &'a [F], shift: usize) -> Self {
		Self { values, shift }
	}
}

/// Answers the values of a variable on the evaluation domain.
pub trait ColumnOracle<F, V>: Sync {
	fn column(&self, var: &V) -> ShiftedColumn<'_, F>;
}

#[derive(Debug, Clone)]
enum Instruction<F> {
	Constant { dst: usize, value: F },
	Variable { dst: usize, var: usize },
	Add { dst: usize, srcs: Vec<usize> },
	Mul { dst: usize, srcs: Vec<usize> },
	Neg { dst: usize, src: usize },
}

/// Evaluates selected roots of a [`DagExpression`] over a whole domain.
///
/// Nodes run in topological order and each node value lives in a slot. A slot is released as soon
/// as the last node using it has run, so the working set stays close to the width of the DAG
/// rather than its size. Rows are split into chunks processed in parallel, each chunk running the
/// whole schedule.
#[derive(Debug)]
pub struct DagEvaluator<'a, F, V> {
	dag: &'a DagExpression<F, V>,
	instructions: Vec<Instruction<F>>,
	/// Variable nodes, in the order of the `var` index of the instructions.
	variables: Vec<usize>,
	/// Slot holding each requested root.
	root_slots: Vec<usize>,
	n_slots: usize,
}

impl<'a, F, V> DagEvaluator<'a, F, V>
where
	F: Field,
	V: Sync,
{
	/// Schedules the evaluation of the roots at the given root positions.
	pub fn new(dag: &'a DagExpression<F, V>, roots: &[usize]) -> Result<Self, Error> {
		let nodes = dag.nodes();
		let mut root_nodes = Vec::with_capacity(roots.len());
		for &root in roots {
			let Some(&node) = dag.roots().get(root) else {
				bail!(Error::IncorrectArgumentLength {
					arg: "roots".to_string(),
					expected: dag.roots().len(),
				});
			};
			root_nodes.push(node);
		}

		// Only the nodes feeding a requested root are scheduled.
		let mut needed = vec![false; nodes.len()];
		for &node in &root_nodes {
			needed[node] = true;
		}
		for i in (0..nodes.len()).rev() {
			if needed[i] {
				for &operand in nodes[i].operands() {
					needed[operand] = true;
				}
			}
		}

		let mut last_use = vec![None; nodes.len()];
		for (i, node) in nodes.iter().enumerate().filter(|(i, _)| needed[*i]) {
			for &operand in node.operands() {
				last_use[operand] = Some(i);
			}
		}
		let mut is_root = vec![false; nodes.len()];
		for &node in &root_nodes {
			is_root[node] = true;
		}

		let mut slot_of = vec![usize::MAX; nodes.len()];
		let mut free_slots = Vec::new();
		let mut n_slots = 0;
		let mut instructions = Vec::new();
		let mut variables = Vec::new();

		for (i, node) in nodes.iter().enumerate() {
			if !needed[i] {
				continue;
			}

			// The destination is allocated before the operands are released, so it never aliases
			// one of them.
			let dst = free_slots.pop().unwrap_or_else(|| {
				n_slots += 1;
				n_slots - 1
			});
			slot_of[i] = dst;

			let instruction = match node {
				DagNode::Constant(value) => Instruction::Constant { dst, value: *value },
				DagNode::Variable(_) => {
					variables.push(i);
					Instruction::Variable {
						dst,
						var: variables.len() - 1,
					}
				}
				DagNode::Add(operands) => Instruction::Add {
					dst,
					srcs: operands.iter().map(|&operand| slot_of[operand]).collect(),
				},
				DagNode::Mul(operands) => Instruction::Mul {
					dst,
					srcs: operands.iter().map(|&operand| slot_of[operand]).collect(),
				},
				DagNode::Neg(operand) => Instruction::Neg {
					dst,
					src: slot_of[*operand],
				},
			};
			instructions.push(instruction);

			let mut released = node.operands().to_vec();
			released.dedup();
			for operand in released {
				if last_use[operand] == Some(i) && !is_root[operand] {
					free_slots.push(slot_of[operand]);
				}
			}
		}

		let root_slots = root_nodes.iter().map(|&node| slot_of[node]).collect();
		Ok(Self {
			dag,
			instructions,
			variables,
			root_slots,
			n_slots,
		})
	}

	/// The number of value slots a chunk needs.
	pub fn n_slots(&self) -> usize {
		self.n_slots
	}

	/// Evaluates the scheduled roots on every row of a domain of `domain_size` points.
	///
	/// ## Throws
	///
	/// * [`Error::IncorrectArgumentLength`] if a column of the oracle is not `domain_size` long
	#[instrument(
		skip_all,
		level = "debug",
		fields(domain_size = domain_size, nodes = self.instructions.len())
	)]
	pub fn evaluate(
		&self,
		domain_size: usize,
		oracle: &impl ColumnOracle<F, V>,
	) -> Result<Vec<Vec<F>>, Error> {
		let columns = self
			.variables
			.iter()
			.map(|&node| match &self.dag.nodes()[node] {
				DagNode::Variable(var) => oracle.column(var),
				_ => unreachable!("only variable nodes are recorded"),
			})
			.collect::<Vec<_>>();
		for column in &columns {
			if column.values.len() != domain_size {
				bail!(Error::IncorrectArgumentLength {
					arg: "column".to_string(),
					expected: domain_size,
				});
			}
		}

		let chunk_len = parallel_chunk_len(domain_size, MIN_CHUNK_LEN);
		let n_chunks = domain_size.div_ceil(chunk_len);
		let chunk_results = (0..n_chunks)
			.into_par_iter()
			.map(|chunk| {
				let start = chunk * chunk_len;
				let len = chunk_len.min(domain_size - start);
				self.evaluate_chunk(&columns, start, len)
			})
			.collect::<Vec<_>>();

		let mut results = vec![Vec::with_capacity(domain_size); self.root_slots.len()];
		for chunk_result in chunk_results {
			for (result, values) in results.iter_mut().zip(chunk_result) {
				result.extend(values);
			}
		}
		Ok(results)
	}

	fn evaluate_chunk(
		&self,
		columns: &[ShiftedColumn<F>],
		start: usize,
		len: usize,
	) -> Vec<Vec<F>> {
		let mut slots = vec![Vec::new(); self.n_slots];

		for instruction in &self.instructions {
			match instruction {
				Instruction::Constant { dst, value } => {
					slots[*dst] = vec![*value; len];
				}
				Instruction::Variable { dst, var } => {
					let column = &columns[*var];
					let n = column.values.len();
					let mut values = mem::take(&mut slots[*dst]);
					values.clear();
					values.extend(
						(start..start + len).map(|row| column.values[(row + column.shift) % n]),
					);
					slots[*dst] = values;
				}
				Instruction::Add { dst, srcs } => {
					let mut values = mem::take(&mut slots[*dst]);
					values.clear();
					match srcs.split_first() {
						Some((&first, rest)) => {
							values.extend_from_slice(&slots[first]);
							for &src in rest {
								for (acc, value) in values.iter_mut().zip(&slots[src]) {
									*acc += value;
								}
							}
						}
						None => values.resize(len, F::zero()),
					}
					slots[*dst] = values;
				}
				Instruction::Mul { dst, srcs } => {
					let mut values = mem::take(&mut slots[*dst]);
					values.clear();
					match srcs.split_first() {
						Some((&first, rest)) => {
							values.extend_from_slice(&slots[first]);
							for &src in rest {
								for (acc, value) in values.iter_mut().zip(&slots[src]) {
									*acc *= value;
								}
							}
						}
						None => values.resize(len, F::one()),
					}
					slots[*dst] = values;
				}
				Instruction::Neg { dst, src } => {
					let mut values = mem::take(&mut slots[*dst]);
					values.clear();
					values.extend(slots[*src].iter().map(|value| -*value));
					slots[*dst] = values;
				}
			}
		}

		self.root_slots
			.iter()
			.map(|&slot| slots[slot].clone())
			.collect()
	}
}
