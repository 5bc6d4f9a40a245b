// Copyright 2024 Irreducible Inc.

use std::collections::BTreeMap;

use ark_ff::FftField;
use placeholder_math::EvaluationDomain;

use crate::constraint_system::{Cell, Column};

/// The identity values `δ^j·ω^i` of every row `i` of every permuted column `j`.
pub fn identity_values<F: FftField>(domain: &EvaluationDomain<F>, n_columns: usize) -> Vec<Vec<F>> {
	let rows = domain.elements();
	let mut coset_shift = F::one();
	(0..n_columns)
		.map(|_| {
			let values = rows.iter().map(|row| coset_shift * row).collect();
			coset_shift *= F::GENERATOR;
			values
		})
		.collect()
}

/// Merges copy classes that share a cell and drops repeated cells.
///
/// The result is sorted: cells ascending within a class, classes by their first cell.
pub fn merge_copy_classes(classes: &[Vec<Cell>]) -> Vec<Vec<Cell>> {
	let mut ids = BTreeMap::<Cell, usize>::new();
	let mut parent = Vec::new();
	for class in classes {
		let mut first = None;
		for &cell in class {
			let id = *ids.entry(cell).or_insert_with(|| {
				parent.push(parent.len());
				parent.len() - 1
			});
			match first {
				None => first = Some(id),
				Some(root) => union(&mut parent, root, id),
			}
		}
	}

	let mut merged = BTreeMap::<usize, Vec<Cell>>::new();
	for (&cell, &id) in &ids {
		let root = find(&mut parent, id);
		merged.entry(root).or_default().push(cell);
	}
	let mut merged = merged.into_values().collect::<Vec<_>>();
	merged.sort_unstable_by_key(|class| class[0]);
	merged
}

fn find(parent: &mut [usize], mut id: usize) -> usize {
	while parent[id] != id {
		parent[id] = parent[parent[id]];
		id = parent[id];
	}
	id
}

fn union(parent: &mut [usize], a: usize, b: usize) {
	let (a, b) = (find(parent, a), find(parent, b));
	if a != b {
		parent[a.max(b)] = a.min(b);
	}
}

/// The permutation values: every cell of a copy class takes the identity of the next cell of the
/// class, cyclically. Cells outside every class keep their identity.
///
/// `permuted_columns` lists the columns in the order of `identities`.
pub fn sigma_values<F: FftField>(
	identities: &[Vec<F>],
	permuted_columns: &[Column],
	copy_classes: &[Vec<Cell>],
) -> Vec<Vec<F>> {
	let position = permuted_columns
		.iter()
		.enumerate()
		.map(|(j, &column)| (column, j))
		.collect::<BTreeMap<_, _>>();

	let mut sigmas = identities.to_vec();
	for class in merge_copy_classes(copy_classes) {
		for (k, cell) in class.iter().enumerate() {
			let next = class[(k + 1) % class.len()];
			let (Some(&from), Some(&to)) = (position.get(&cell.column), position.get(&next.column))
			else {
				continue;
			};
			sigmas[from][cell.row] = identities[to][next.row];
		}
	}
	sigmas
}
