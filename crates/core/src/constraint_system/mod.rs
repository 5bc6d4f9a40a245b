// Copyright 2024-2025 Irreducible Inc.

//! PLONK constraint systems and the Placeholder proof system over them.
//!
//! A [`ConstraintSystem`] describes a table of witness, public input, constant and selector
//! columns together with the gates, copy constraints and lookups that a satisfying
//! [`Assignment`] must respect. [`preprocess`] commits the fixed part of the table once,
//! [`prove`] produces a [`PlaceholderProof`] for a full assignment and [`verify`] checks it
//! against the common data and the public input.

pub mod assignment;
mod common;
pub mod error;
mod preprocess;
mod proof;
mod prove;
pub mod validate;
mod verify;

use std::{
	collections::{BTreeMap, BTreeSet},
	fmt::{self, Display},
};

pub use assignment::Assignment;
use ark_ff::Field;
pub use common::*;
pub use error::{Error, VerificationError};
use placeholder_math::ArithExpr;
use placeholder_utils::{bail, ensure};
pub use preprocess::{preprocess, PreprocessedData};
pub use proof::PlaceholderProof;
pub use prove::prove;
pub use verify::verify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnKind {
	Witness,
	PublicInput,
	Constant,
	Selector,
}

/// A column of the assignment table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Column {
	pub kind: ColumnKind,
	pub index: usize,
}

impl Column {
	pub const fn new(kind: ColumnKind, index: usize) -> Self {
		Self { kind, index }
	}

	pub const fn witness(index: usize) -> Self {
		Self::new(ColumnKind::Witness, index)
	}

	pub const fn public_input(index: usize) -> Self {
		Self::new(ColumnKind::PublicInput, index)
	}

	pub const fn constant(index: usize) -> Self {
		Self::new(ColumnKind::Constant, index)
	}

	pub const fn selector(index: usize) -> Self {
		Self::new(ColumnKind::Selector, index)
	}

	/// The column read `rotation` rows below the current one.
	pub const fn rotated(self, rotation: i32) -> Variable {
		Variable {
			kind: self.kind,
			index: self.index,
			rotation,
		}
	}

	pub const fn cell(self, row: usize) -> Cell {
		Cell { column: self, row }
	}
}

/// A column read at a row offset, the leaf of every constraint expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
	pub kind: ColumnKind,
	pub index: usize,
	pub rotation: i32,
}

impl Variable {
	pub const fn new(kind: ColumnKind, index: usize, rotation: i32) -> Self {
		Self {
			kind,
			index,
			rotation,
		}
	}

	pub const fn witness(index: usize) -> Self {
		Column::witness(index).rotated(0)
	}

	pub const fn public_input(index: usize) -> Self {
		Column::public_input(index).rotated(0)
	}

	pub const fn constant(index: usize) -> Self {
		Column::constant(index).rotated(0)
	}

	pub const fn selector(index: usize) -> Self {
		Column::selector(index).rotated(0)
	}

	pub const fn column(&self) -> Column {
		Column::new(self.kind, self.index)
	}

	pub fn expr<F: Field>(self) -> Expression<F> {
		ArithExpr::Var(self)
	}
}

impl From<Column> for Variable {
	fn from(column: Column) -> Self {
		column.rotated(0)
	}
}

impl Display for Variable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let prefix = match self.kind {
			ColumnKind::Witness => "w",
			ColumnKind::PublicInput => "pi",
			ColumnKind::Constant => "c",
			ColumnKind::Selector => "s",
		};
		write!(f, "{prefix}{}", self.index)?;
		if self.rotation != 0 {
			write!(f, "@{}", self.rotation)?;
		}
		Ok(())
	}
}

pub type Expression<F> = ArithExpr<F, Variable>;

/// Polynomial constraints enforced on every row where the selector is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate<F: Field> {
	pub selector: usize,
	pub constraints: Vec<Expression<F>>,
}

impl<F: Field> Gate<F> {
	pub fn new(selector: usize, constraints: Vec<Expression<F>>) -> Self {
		Self {
			selector,
			constraints,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
	pub column: Column,
	pub row: usize,
}

/// A tuple of expressions whose values must appear in a lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConstraint<F: Field> {
	pub table_id: usize,
	pub inputs: Vec<Expression<F>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupGate<F: Field> {
	pub selector: usize,
	pub constraints: Vec<LookupConstraint<F>>,
}

/// A lookup table stored in the rows where the `tag` selector is set.
///
/// Each option is a list of columns of the table arity. Options share the tag and multiplex
/// disjoint sub-tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTable {
	pub tag: usize,
	pub options: Vec<Vec<Column>>,
}

/// The shape of the assignment table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDescription {
	pub witness_columns: usize,
	pub public_input_columns: usize,
	pub constant_columns: usize,
	pub selector_columns: usize,
	/// The number of rows n, a power of two.
	pub rows_amount: usize,
	/// Rows `0..usable_rows` carry values, row `usable_rows` holds the last-row selector.
	pub usable_rows: usize,
}

impl TableDescription {
	pub const fn columns(&self, kind: ColumnKind) -> usize {
		match kind {
			ColumnKind::Witness => self.witness_columns,
			ColumnKind::PublicInput => self.public_input_columns,
			ColumnKind::Constant => self.constant_columns,
			ColumnKind::Selector => self.selector_columns,
		}
	}

	pub const fn contains(&self, column: Column) -> bool {
		column.index < self.columns(column.kind)
	}

	/// Base-2 logarithm of the row count.
	pub const fn log_rows(&self) -> usize {
		self.rows_amount.trailing_zeros() as usize
	}
}

/// A PLONK constraint system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSystem<F: Field> {
	pub table: TableDescription,
	pub gates: Vec<Gate<F>>,
	/// Equivalence classes of cells that must hold equal values.
	pub copy_constraints: Vec<Vec<Cell>>,
	pub lookup_gates: Vec<LookupGate<F>>,
	pub lookup_tables: Vec<LookupTable>,
}

impl<F: Field> ConstraintSystem<F> {
	pub fn new(table: TableDescription) -> Self {
		Self {
			table,
			gates: Vec::new(),
			copy_constraints: Vec::new(),
			lookup_gates: Vec::new(),
			lookup_tables: Vec::new(),
		}
	}

	pub fn with_gate(mut self, gate: Gate<F>) -> Self {
		self.gates.push(gate);
		self
	}

	pub fn with_copy_constraint(mut self, class: Vec<Cell>) -> Self {
		self.copy_constraints.push(class);
		self
	}

	pub fn with_lookup_gate(mut self, gate: LookupGate<F>) -> Self {
		self.lookup_gates.push(gate);
		self
	}

	pub fn with_lookup_table(mut self, table: LookupTable) -> Self {
		self.lookup_tables.push(table);
		self
	}

	/// Checks that the table shape is valid and every reference is in range.
	pub fn check(&self) -> Result<(), Error> {
		let table = &self.table;
		ensure!(
			table.rows_amount.is_power_of_two()
				&& table.rows_amount >= 2
				&& table.usable_rows < table.rows_amount,
			Error::InvalidTableDescription {
				rows_amount: table.rows_amount,
				usable_rows: table.usable_rows,
			}
		);

		let check_column = |column: Column| -> Result<(), Error> {
			ensure!(table.contains(column), Error::ColumnOutOfRange { column });
			Ok(())
		};
		let check_expr = |expr: &Expression<F>| -> Result<(), Error> {
			expr.variables()
				.into_iter()
				.try_for_each(|var| check_column(var.column()))
		};

		for gate in &self.gates {
			check_column(Column::selector(gate.selector))?;
			gate.constraints.iter().try_for_each(check_expr)?;
		}
		for class in &self.copy_constraints {
			for cell in class {
				check_column(cell.column)?;
				ensure!(cell.row < table.usable_rows, Error::CellOutOfRange { cell: *cell });
			}
		}
		for (table_id, lookup_table) in self.lookup_tables.iter().enumerate() {
			check_column(Column::selector(lookup_table.tag))?;
			let Some(arity) = lookup_table.options.first().map(Vec::len) else {
				bail!(Error::EmptyLookupTable { table_id });
			};
			for option in &lookup_table.options {
				ensure!(
					option.len() == arity,
					Error::LookupArityMismatch {
						table_id,
						expected: arity,
						actual: option.len(),
					}
				);
				option.iter().copied().try_for_each(check_column)?;
			}
		}
		for gate in &self.lookup_gates {
			check_column(Column::selector(gate.selector))?;
			for constraint in &gate.constraints {
				let table_id = constraint.table_id;
				let Some(lookup_table) = self.lookup_tables.get(table_id) else {
					bail!(Error::UnknownLookupTable { table_id });
				};
				let arity = lookup_table.options[0].len();
				ensure!(
					constraint.inputs.len() == arity,
					Error::LookupArityMismatch {
						table_id,
						expected: arity,
						actual: constraint.inputs.len(),
					}
				);
				constraint.inputs.iter().try_for_each(check_expr)?;
			}
		}
		Ok(())
	}

	/// The degree of the gate argument, selector included.
	pub fn gate_degree(&self) -> usize {
		self.gates
			.iter()
			.flat_map(|gate| &gate.constraints)
			.map(|constraint| constraint.degree() + 1)
			.max()
			.unwrap_or(0)
	}

	pub fn lookup_constraints(&self) -> impl Iterator<Item = (usize, &LookupConstraint<F>)> + '_ {
		self.lookup_gates.iter().flat_map(|gate| {
			gate.constraints
				.iter()
				.map(move |constraint| (gate.selector, constraint))
		})
	}

	pub fn n_lookup_constraints(&self) -> usize {
		self.lookup_gates
			.iter()
			.map(|gate| gate.constraints.len())
			.sum()
	}

	/// Every table option as `(table_id, tag, columns)`, tables in order, then options in order.
	pub fn table_options(&self) -> impl Iterator<Item = (usize, usize, &[Column])> + '_ {
		self.lookup_tables
			.iter()
			.enumerate()
			.flat_map(|(table_id, table)| {
				table
					.options
					.iter()
					.map(move |option| (table_id, table.tag, option.as_slice()))
			})
	}

	pub fn n_table_options(&self) -> usize {
		self.lookup_tables
			.iter()
			.map(|table| table.options.len())
			.sum()
	}

	/// The degree of the lookup argument constraints, zero without lookups.
	///
	/// The helper constraint `H·(α - ℓ) + 1` multiplies a helper with the selector and the
	/// compressed input, the table constraint `G·(α - v) - m` has degree three.
	pub fn lookup_degree(&self) -> usize {
		if self.n_lookup_constraints() == 0 {
			return 0;
		}
		let input_degree = self
			.lookup_constraints()
			.flat_map(|(_, constraint)| &constraint.inputs)
			.map(ArithExpr::degree)
			.max()
			.unwrap_or(0);
		(input_degree + 2).max(3)
	}

	/// The maximal degree over all quotient constraints, at least three.
	pub fn max_degree(&self) -> usize {
		self.gate_degree().max(self.lookup_degree()).max(3)
	}

	/// The distinct copy-constrained columns in ascending order.
	pub fn permuted_columns(&self) -> Vec<Column> {
		self.copy_constraints
			.iter()
			.flatten()
			.map(|cell| cell.column)
			.collect::<BTreeSet<_>>()
			.into_iter()
			.collect()
	}

	/// Every column of the table with the sorted rotations it is read at, zero included.
	pub fn rotations(&self) -> BTreeMap<Column, Vec<i32>> {
		let mut rotations = BTreeMap::<Column, BTreeSet<i32>>::new();
		for kind in [
			ColumnKind::Witness,
			ColumnKind::PublicInput,
			ColumnKind::Constant,
			ColumnKind::Selector,
		] {
			for index in 0..self.table.columns(kind) {
				rotations.entry(Column::new(kind, index)).or_default().insert(0);
			}
		}

		let expressions = self
			.gates
			.iter()
			.flat_map(|gate| &gate.constraints)
			.chain(
				self.lookup_constraints()
					.flat_map(|(_, constraint)| &constraint.inputs),
			);
		for expr in expressions {
			expr.visit_vars(&mut |var| {
				rotations
					.entry(var.column())
					.or_default()
					.insert(var.rotation);
			});
		}

		rotations
			.into_iter()
			.map(|(column, set)| (column, set.into_iter().collect()))
			.collect()
	}
}
