// Copyright 2024 Irreducible Inc.

use placeholder_math::Error as MathError;
use placeholder_utils::SerializationError;

use super::{Cell, Column};
use crate::{merkle_tree, poly_commit::lpc, protocols::fri};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("a table of {rows_amount} rows with {usable_rows} usable rows is not valid")]
	InvalidTableDescription {
		rows_amount: usize,
		usable_rows: usize,
	},

	#[error("column {column:?} is not part of the table")]
	ColumnOutOfRange { column: Column },

	#[error("copy constrained cell {cell:?} is not in a usable row")]
	CellOutOfRange { cell: Cell },

	#[error("lookup table {table_id} does not exist")]
	UnknownLookupTable { table_id: usize },

	#[error("lookup table {table_id} has no options")]
	EmptyLookupTable { table_id: usize },

	#[error("lookup table {table_id} has arity {expected}, got {actual}")]
	LookupArityMismatch {
		table_id: usize,
		expected: usize,
		actual: usize,
	},

	#[error("selector {selector} is set on row {row}, after the usable rows")]
	SelectorOutsideUsableRows { selector: usize, row: usize },

	#[error("column {column:?} of the assignment has {actual} rows, expected {expected}")]
	AssignmentShapeMismatch {
		column: Column,
		expected: usize,
		actual: usize,
	},

	#[error("assignment has {actual} columns of kind {kind}, expected {expected}")]
	AssignmentColumnCount {
		kind: &'static str,
		expected: usize,
		actual: usize,
	},

	#[error("constraint {constraint} of gate {gate} does not hold on row {row}")]
	GateNotSatisfied {
		gate: usize,
		constraint: usize,
		row: usize,
	},

	#[error("cells {lhs:?} and {rhs:?} are copy constrained but differ")]
	CopyConstraintNotSatisfied { lhs: Cell, rhs: Cell },

	#[error("lookup constraint {constraint} of gate {gate} fails on row {row}")]
	LookupNotSatisfied {
		gate: usize,
		constraint: usize,
		row: usize,
	},

	#[error("{name}: expected {expected}, got {actual}")]
	ParameterMismatch {
		name: &'static str,
		expected: usize,
		actual: usize,
	},

	#[error("FRI error: {0}")]
	Fri(#[from] fri::Error),

	#[error("LPC error: {0}")]
	Lpc(#[from] lpc::Error),

	#[error("vector commit error: {0}")]
	VectorCommit(#[from] merkle_tree::Error),

	#[error("math error: {0}")]
	Math(#[from] MathError),

	#[error("serialization error: {0}")]
	Serialization(#[from] SerializationError),

	#[error("invalid proof: {0}")]
	InvalidProof(#[from] VerificationError),
}

impl Error {
	/// Whether the error means a proof was rejected, as opposed to malformed inputs.
	pub fn is_invalid_proof(&self) -> bool {
		match self {
			Self::InvalidProof(_) => true,
			Self::Lpc(err) => err.is_invalid_proof(),
			Self::Fri(err) => err.is_invalid_proof(),
			_ => false,
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
	#[error("the proof is missing the commitment of batch {batch}")]
	MissingCommitment { batch: usize },

	#[error("the proof carries an unexpected commitment for batch {batch}")]
	UnexpectedCommitment { batch: usize },

	#[error("expected {expected} public input columns")]
	IncorrectPublicInputCount { expected: usize },

	#[error("public input column {column} has more than {max} values")]
	PublicInputTooLong { column: usize, max: usize },

	#[error("public input column {column} does not match its opening")]
	PublicInputMismatch { column: usize },

	#[error("no evaluation of polynomial {poly} of batch {batch} at point {point}")]
	MissingEvaluation {
		batch: usize,
		poly: usize,
		point: usize,
	},

	#[error("the quotient identity does not hold at the evaluation point")]
	QuotientMismatch,

	#[error("the evaluation point lies in the table domain")]
	EvaluationPointInDomain,
}
