// Copyright 2024-2025 Irreducible Inc.

//! Direct checks of an assignment against a constraint system, without proving.
//!
//! A proof for an assignment that passes validation is accepted by the verifier.

use std::collections::HashSet;

use ark_ff::Field;
use placeholder_utils::bail;
use tracing::instrument;

use super::{error::Error, Assignment, Column, ConstraintSystem, Variable};

/// Checks gates, copy constraints and lookups on the usable rows and reports the first failure.
#[instrument("constraint_system::validate_witness", skip_all, level = "debug")]
pub fn validate_witness<F: Field>(
	constraint_system: &ConstraintSystem<F>,
	assignment: &Assignment<F>,
) -> Result<(), Error> {
	constraint_system.check()?;
	let table = constraint_system.table;
	assignment.check_shape(&table)?;

	validate_gates(constraint_system, assignment)?;
	validate_copy_constraints(constraint_system, assignment)?;
	validate_lookups(constraint_system, assignment)
}

fn is_selected<F: Field>(assignment: &Assignment<F>, selector: usize, row: usize) -> bool {
	!assignment.column(Column::selector(selector))[row].is_zero()
}

fn validate_gates<F: Field>(cs: &ConstraintSystem<F>, assignment: &Assignment<F>) -> Result<(), Error> {
	for (gate_index, gate) in cs.gates.iter().enumerate() {
		for row in 0..cs.table.usable_rows {
			if !is_selected(assignment, gate.selector, row) {
				continue;
			}
			for (constraint_index, constraint) in gate.constraints.iter().enumerate() {
				let value = constraint.evaluate(&|var: &Variable| assignment.value(*var, row));
				if !value.is_zero() {
					bail!(Error::GateNotSatisfied {
						gate: gate_index,
						constraint: constraint_index,
						row,
					});
				}
			}
		}
	}
	Ok(())
}

fn validate_copy_constraints<F: Field>(
	cs: &ConstraintSystem<F>,
	assignment: &Assignment<F>,
) -> Result<(), Error> {
	for class in &cs.copy_constraints {
		let Some((&first, rest)) = class.split_first() else {
			continue;
		};
		let expected = assignment.get(first);
		if let Some(&cell) = rest.iter().find(|&&cell| assignment.get(cell) != expected) {
			bail!(Error::CopyConstraintNotSatisfied {
				lhs: first,
				rhs: cell,
			});
		}
	}
	Ok(())
}

/// Every selected lookup input must be a row of its table.
///
/// Rows where a lookup gate is off compress to zero, which only the untagged rows of a table
/// option provide, so those rows need at least one untagged usable row.
fn validate_lookups<F: Field>(
	cs: &ConstraintSystem<F>,
	assignment: &Assignment<F>,
) -> Result<(), Error> {
	let usable_rows = cs.table.usable_rows;
	let mut tables = vec![HashSet::<Vec<F>>::new(); cs.lookup_tables.len()];
	let mut has_untagged_row = false;
	for (table_id, tag, option) in cs.table_options() {
		for row in 0..usable_rows {
			if is_selected(assignment, tag, row) {
				let entry = option
					.iter()
					.map(|&column| assignment.column(column)[row])
					.collect();
				tables[table_id].insert(entry);
			} else {
				has_untagged_row = true;
			}
		}
	}

	for (gate_index, gate) in cs.lookup_gates.iter().enumerate() {
		for row in 0..usable_rows {
			let selected = is_selected(assignment, gate.selector, row);
			for (constraint_index, constraint) in gate.constraints.iter().enumerate() {
				let satisfied = if selected {
					let input = constraint
						.inputs
						.iter()
						.map(|expr| expr.evaluate(&|var: &Variable| assignment.value(*var, row)))
						.collect::<Vec<_>>();
					tables[constraint.table_id].contains(&input)
				} else {
					has_untagged_row
				};
				if !satisfied {
					bail!(Error::LookupNotSatisfied {
						gate: gate_index,
						constraint: constraint_index,
						row,
					});
				}
			}
		}
	}
	Ok(())
}
