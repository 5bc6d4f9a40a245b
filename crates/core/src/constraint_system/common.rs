// Copyright 2024 Irreducible Inc.

use std::{collections::BTreeMap, sync::Arc};

use ark_ff::{FftField, PrimeField};
use placeholder_math::{dag::DagExpression, ArithExpr, EvaluationDomain};
use placeholder_utils::SerializeBytes;

use super::{Column, ColumnKind, ConstraintSystem, Error, Variable};
use crate::{
	fiat_shamir::Challenger,
	poly_commit::lpc::{BatchId, LpcFixedData},
	protocols::fri::FRIParams,
	transcript::Transcript,
};

/// Constants, selectors, the special selectors and the permutation setup.
pub const FIXED_VALUES_BATCH: BatchId = 0;
/// Witness and public input columns.
pub const VARIABLE_VALUES_BATCH: BatchId = 1;
/// Grand products of the permutation argument and the lookup helpers.
pub const PERMUTATION_BATCH: BatchId = 2;
/// Chunks of the quotient polynomial.
pub const QUOTIENT_BATCH: BatchId = 3;
/// Lookup counts.
pub const LOOKUP_BATCH: BatchId = 4;

/// Protocol parameters shared by the prover and the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderParams {
	/// Base-2 logarithm of the FRI blowup factor.
	pub expansion_log: usize,
	/// The largest number of binary folds per FRI round.
	pub max_step: usize,
	pub lambda: usize,
	pub grinding_bits: usize,
}

impl PlaceholderParams {
	/// FRI parameters for committing polynomials over a table of `2^degree_log` rows.
	pub fn fri_params<F: FftField>(&self, degree_log: usize) -> Result<FRIParams<F>, Error> {
		Ok(FRIParams::with_uniform_steps(
			degree_log,
			self.expansion_log,
			self.max_step,
			self.lambda,
			self.grinding_bits,
		)?)
	}
}

/// A polynomial read by the quotient constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Oracle {
	Column(Column),
	/// The selector of row `usable_rows`.
	LastRow,
	/// The selector of the rows after `usable_rows`.
	BlindRows,
	/// The first Lagrange polynomial, known to both parties and never committed.
	FirstRow,
	Identity(usize),
	Sigma(usize),
	/// A polynomial of the permutation batch, by position.
	Permutation(usize),
	/// The count polynomial of a table option.
	Count(usize),
}

/// An [`Oracle`] read at a row offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OracleVar {
	pub oracle: Oracle,
	pub rotation: i32,
}

impl OracleVar {
	pub const fn new(oracle: Oracle, rotation: i32) -> Self {
		Self { oracle, rotation }
	}

	pub fn expr<F: FftField>(oracle: Oracle) -> ConstraintExpr<F> {
		ArithExpr::Var(Self::new(oracle, 0))
	}

	pub fn rotated_expr<F: FftField>(oracle: Oracle, rotation: i32) -> ConstraintExpr<F> {
		ArithExpr::Var(Self::new(oracle, rotation))
	}
}

impl From<Variable> for OracleVar {
	fn from(var: Variable) -> Self {
		Self::new(Oracle::Column(var.column()), var.rotation)
	}
}

/// A quotient constraint over committed polynomials.
pub type ConstraintExpr<F> = ArithExpr<F, OracleVar>;

/// The positions of the polynomials in the permutation batch.
///
/// The batch holds the grand product Z and its chunk products, then the lookup helpers `H_i`
/// (one per lookup constraint), `G_j` (one per table option) and the running sum U.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermutationLayout {
	/// The number of column chunks of the grand product, zero without copy constraints.
	pub chunks: usize,
	pub lookup_inputs: usize,
	pub table_options: usize,
}

impl PermutationLayout {
	/// The grand product Z.
	pub const fn grand_product(&self) -> usize {
		0
	}

	/// The running product after chunk `k`, for `1 <= k < chunks`.
	pub const fn chunk_product(&self, k: usize) -> usize {
		k
	}

	pub const fn helper(&self, i: usize) -> usize {
		self.chunks + i
	}

	pub const fn table_helper(&self, j: usize) -> usize {
		self.chunks + self.lookup_inputs + j
	}

	pub const fn running_sum(&self) -> usize {
		self.chunks + self.lookup_inputs + self.table_options
	}

	pub const fn has_lookups(&self) -> bool {
		self.lookup_inputs > 0
	}

	pub const fn len(&self) -> usize {
		if self.has_lookups() {
			self.running_sum() + 1
		} else {
			self.chunks
		}
	}

	pub const fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// The data shared by the prover and the verifier of one constraint system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonData<F: FftField, Digest> {
	pub constraint_system: ConstraintSystem<F>,
	pub params: PlaceholderParams,
	pub fri_params: FRIParams<F>,
	/// The subgroup of order `rows_amount`.
	pub basic_domain: EvaluationDomain<F>,
	pub max_degree: usize,
	pub permuted_columns: Vec<Column>,
	pub layout: PermutationLayout,
	/// Rotations of each column in ascending order.
	pub rotations: BTreeMap<Column, Vec<i32>>,
	/// The gate constraints, each multiplied by its selector.
	pub dag: DagExpression<F, Variable>,
	pub fixed_root: Digest,
	pub fixed_data: Arc<LpcFixedData<F>>,
}

impl<F, Digest> CommonData<F, Digest>
where
	F: PrimeField,
	Digest: SerializeBytes,
{
	pub fn rows_amount(&self) -> usize {
		self.constraint_system.table.rows_amount
	}

	pub fn usable_rows(&self) -> usize {
		self.constraint_system.table.usable_rows
	}

	/// The number of quotient chunks, each of `rows_amount` coefficients.
	pub fn quotient_chunks(&self) -> usize {
		self.max_degree - 1
	}

	pub fn n_gate_constraints(&self) -> usize {
		self.constraint_system
			.gates
			.iter()
			.map(|gate| gate.constraints.len())
			.sum()
	}

	/// Absorbs everything both parties agree on before the first message.
	pub fn observe<C: Challenger>(&self, transcript: &mut Transcript<C>) {
		let table = &self.constraint_system.table;
		transcript.observe_label("placeholder");
		for value in [
			table.witness_columns,
			table.public_input_columns,
			table.constant_columns,
			table.selector_columns,
			table.rows_amount,
			table.usable_rows,
			self.max_degree,
			self.params.expansion_log,
			self.params.lambda,
			self.params.grinding_bits,
		] {
			transcript.observe(&value);
		}
		transcript.observe(&self.fri_params.step_list().to_vec());

		for gate in &self.constraint_system.gates {
			transcript.observe(&gate.selector);
			for constraint in &gate.constraints {
				transcript.observe_label(&constraint.to_string());
			}
		}
		for (selector, constraint) in self.constraint_system.lookup_constraints() {
			transcript.observe(&selector);
			transcript.observe(&constraint.table_id);
			for input in &constraint.inputs {
				transcript.observe_label(&input.to_string());
			}
		}
		for table in &self.constraint_system.lookup_tables {
			transcript.observe(&table.tag);
			transcript.observe(&table.options.len());
			for option in &table.options {
				transcript.observe(&option.len());
				for &column in option {
					observe_column(transcript, column);
				}
			}
		}
		for class in &self.constraint_system.copy_constraints {
			transcript.observe(&class.len());
			for cell in class {
				observe_column(transcript, cell.column);
				transcript.observe(&cell.row);
			}
		}

		transcript.observe(&self.fixed_root);
		transcript.observe_scalar(&self.fixed_data.eta);
		for evals in self.fixed_data.evals.values() {
			transcript.observe_scalars(evals);
		}
	}

	/// The rotations at which each polynomial of each batch is opened.
	///
	/// Batches without polynomials are left out.
	pub fn opening_rotations(&self) -> BTreeMap<BatchId, Vec<Vec<i32>>> {
		let column_rotations = |kind: ColumnKind| {
			(0..self.constraint_system.table.columns(kind))
				.map(|index| self.rotations[&Column::new(kind, index)].clone())
				.collect::<Vec<_>>()
		};

		let mut fixed = column_rotations(ColumnKind::Constant);
		fixed.extend(column_rotations(ColumnKind::Selector));
		fixed.extend([vec![0], vec![0]]);
		fixed.extend(vec![vec![0]; 2 * self.permuted_columns.len()]);

		let mut variable = column_rotations(ColumnKind::Witness);
		variable.extend(column_rotations(ColumnKind::PublicInput));

		let layout = self.layout;
		let mut permutation = vec![vec![0]; layout.len()];
		if layout.chunks > 0 {
			permutation[layout.grand_product()] = vec![0, 1];
		}
		if layout.has_lookups() {
			permutation[layout.running_sum()] = vec![0, 1];
		}

		let lookup = if layout.has_lookups() {
			vec![vec![0]; layout.table_options]
		} else {
			Vec::new()
		};

		[
			(FIXED_VALUES_BATCH, fixed),
			(VARIABLE_VALUES_BATCH, variable),
			(PERMUTATION_BATCH, permutation),
			(QUOTIENT_BATCH, vec![vec![0]; self.quotient_chunks()]),
			(LOOKUP_BATCH, lookup),
		]
		.into_iter()
		.filter(|(_, polys)| !polys.is_empty())
		.collect()
	}

	/// The batch and position of a committed polynomial, `None` for [`Oracle::FirstRow`].
	pub fn locate(&self, oracle: Oracle) -> Option<(BatchId, usize)> {
		let table = &self.constraint_system.table;
		let n_permuted = self.permuted_columns.len();
		let special = table.constant_columns + table.selector_columns;
		let location = match oracle {
			Oracle::Column(column) => match column.kind {
				ColumnKind::Witness => (VARIABLE_VALUES_BATCH, column.index),
				ColumnKind::PublicInput => {
					(VARIABLE_VALUES_BATCH, table.witness_columns + column.index)
				}
				ColumnKind::Constant => (FIXED_VALUES_BATCH, column.index),
				ColumnKind::Selector => {
					(FIXED_VALUES_BATCH, table.constant_columns + column.index)
				}
			},
			Oracle::LastRow => (FIXED_VALUES_BATCH, special),
			Oracle::BlindRows => (FIXED_VALUES_BATCH, special + 1),
			Oracle::Identity(i) => (FIXED_VALUES_BATCH, special + 2 + i),
			Oracle::Sigma(i) => (FIXED_VALUES_BATCH, special + 2 + n_permuted + i),
			Oracle::Permutation(i) => (PERMUTATION_BATCH, i),
			Oracle::Count(j) => (LOOKUP_BATCH, j),
			Oracle::FirstRow => return None,
		};
		Some(location)
	}
}

fn observe_column<C: Challenger>(transcript: &mut Transcript<C>, column: Column) {
	transcript.observe(&(column.kind as usize));
	transcript.observe(&column.index);
}

/// The point `x·ω^rotation` for the generator ω of `domain`.
pub fn rotate_point<F: FftField>(domain: &EvaluationDomain<F>, x: F, rotation: i32) -> F {
	let base = if rotation >= 0 {
		domain.generator()
	} else {
		domain.generator_inv()
	};
	x * base.pow([u64::from(rotation.unsigned_abs())])
}
