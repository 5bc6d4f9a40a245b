// Copyright 2024 Irreducible Inc.

use ark_ff::{Field, UniformRand};
use placeholder_math::dag::{ColumnOracle, ShiftedColumn};
use placeholder_utils::ensure;
use rand::Rng;

use super::{Cell, Column, ColumnKind, Error, TableDescription, Variable};

/// The values of every column of a table, one vector of `rows_amount` values per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment<F> {
	witness: Vec<Vec<F>>,
	public_input: Vec<Vec<F>>,
	constant: Vec<Vec<F>>,
	selector: Vec<Vec<F>>,
}

impl<F: Field> Assignment<F> {
	/// An all-zero assignment of the given shape.
	pub fn new(table: &TableDescription) -> Self {
		let columns = |count: usize| vec![vec![F::zero(); table.rows_amount]; count];
		Self {
			witness: columns(table.witness_columns),
			public_input: columns(table.public_input_columns),
			constant: columns(table.constant_columns),
			selector: columns(table.selector_columns),
		}
	}

	pub fn columns(&self, kind: ColumnKind) -> &[Vec<F>] {
		match kind {
			ColumnKind::Witness => &self.witness,
			ColumnKind::PublicInput => &self.public_input,
			ColumnKind::Constant => &self.constant,
			ColumnKind::Selector => &self.selector,
		}
	}

	fn columns_mut(&mut self, kind: ColumnKind) -> &mut Vec<Vec<F>> {
		match kind {
			ColumnKind::Witness => &mut self.witness,
			ColumnKind::PublicInput => &mut self.public_input,
			ColumnKind::Constant => &mut self.constant,
			ColumnKind::Selector => &mut self.selector,
		}
	}

	/// ## Panics
	///
	/// If the column is not part of the assignment.
	pub fn column(&self, column: Column) -> &[F] {
		&self.columns(column.kind)[column.index]
	}

	pub fn column_mut(&mut self, column: Column) -> &mut [F] {
		&mut self.columns_mut(column.kind)[column.index]
	}

	pub fn get(&self, cell: Cell) -> F {
		self.column(cell.column)[cell.row]
	}

	pub fn set(&mut self, cell: Cell, value: F) {
		self.column_mut(cell.column)[cell.row] = value;
	}

	/// Fills the column from row 0 on.
	pub fn fill(&mut self, column: Column, values: impl IntoIterator<Item = F>) {
		for (slot, value) in self.column_mut(column).iter_mut().zip(values) {
			*slot = value;
		}
	}

	/// The value of a variable on a row, with the rotation wrapping around the table.
	pub fn value(&self, var: Variable, row: usize) -> F {
		let values = self.column(var.column());
		let n = values.len() as i64;
		let row = (row as i64 + i64::from(var.rotation)).rem_euclid(n) as usize;
		values[row]
	}

	pub fn public_input(&self) -> &[Vec<F>] {
		&self.public_input
	}

	/// Overwrites the witness rows from `usable_rows` on with uniform random values.
	pub fn blind_witness(&mut self, usable_rows: usize, mut rng: impl Rng) {
		for column in &mut self.witness {
			for value in column.iter_mut().skip(usable_rows) {
				*value = F::rand(&mut rng);
			}
		}
	}

	/// Checks the column counts and lengths against a table description.
	pub fn check_shape(&self, table: &TableDescription) -> Result<(), Error> {
		for (kind, name) in [
			(ColumnKind::Witness, "witness"),
			(ColumnKind::PublicInput, "public input"),
			(ColumnKind::Constant, "constant"),
			(ColumnKind::Selector, "selector"),
		] {
			let columns = self.columns(kind);
			ensure!(
				columns.len() == table.columns(kind),
				Error::AssignmentColumnCount {
					kind: name,
					expected: table.columns(kind),
					actual: columns.len(),
				}
			);
			for (index, values) in columns.iter().enumerate() {
				ensure!(
					values.len() == table.rows_amount,
					Error::AssignmentShapeMismatch {
						column: Column::new(kind, index),
						expected: table.rows_amount,
						actual: values.len(),
					}
				);
			}
		}
		Ok(())
	}
}

/// Reads the variables of an expression on the rows of the table.
impl<F: Field> ColumnOracle<F, Variable> for Assignment<F> {
	fn column(&self, var: &Variable) -> ShiftedColumn<'_, F> {
		let values = Assignment::column(self, var.column());
		let shift = i64::from(var.rotation).rem_euclid(values.len() as i64) as usize;
		ShiftedColumn::with_shift(values, shift)
	}
}

#[cfg(test)]
mod tests {
	use ark_bn254::Fr;
	use assert_matches::assert_matches;
	use rand::{rngs::StdRng, SeedableRng};

	use super::*;

	fn table() -> TableDescription {
		TableDescription {
			witness_columns: 2,
			public_input_columns: 1,
			constant_columns: 1,
			selector_columns: 1,
			rows_amount: 8,
			usable_rows: 6,
		}
	}

	#[test]
	fn test_rotated_values_wrap_around() {
		let mut assignment = Assignment::<Fr>::new(&table());
		assignment.fill(Column::witness(1), (0..8u64).map(Fr::from));

		let column = Column::witness(1);
		assert_eq!(assignment.value(column.rotated(1), 7), Fr::from(0u64));
		assert_eq!(assignment.value(column.rotated(-1), 0), Fr::from(7u64));
		assert_eq!(assignment.value(column.rotated(2), 3), Fr::from(5u64));
	}

	#[test]
	fn test_blinding_touches_only_padding_rows() {
		let mut assignment = Assignment::<Fr>::new(&table());
		assignment.fill(Column::witness(0), (1..=8u64).map(Fr::from));
		assignment.blind_witness(6, StdRng::seed_from_u64(0));

		let column = assignment.column(Column::witness(0));
		assert_eq!(column[..6], (1..=6u64).map(Fr::from).collect::<Vec<_>>());
		assert_ne!(column[6], Fr::from(7u64));
		assert!(assignment
			.column(Column::public_input(0))
			.iter()
			.all(|value| *value == Fr::from(0u64)));
	}

	#[test]
	fn test_shape_check() {
		let assignment = Assignment::<Fr>::new(&table());
		assignment.check_shape(&table()).unwrap();

		let mut wider = table();
		wider.witness_columns = 3;
		assert_matches!(
			assignment.check_shape(&wider),
			Err(Error::AssignmentColumnCount {
				expected: 3,
				actual: 2,
				..
			})
		);

		let mut longer = table();
		longer.rows_amount = 16;
		assert_matches!(
			assignment.check_shape(&longer),
			Err(Error::AssignmentShapeMismatch { expected: 16, .. })
		);
	}
}
