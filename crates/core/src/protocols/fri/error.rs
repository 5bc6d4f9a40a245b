// Copyright 2024 Irreducible Inc.

use placeholder_math::Error as MathError;

use crate::merkle_tree;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("the fold step list is empty")]
	EmptyStepList,
	#[error("fold step at index {index} in the step list is zero")]
	FoldStepIsZero { index: usize },
	#[error("fold steps total {total}, which exceeds the degree bound exponent {degree_log}")]
	InvalidStepList { total: usize, degree_log: usize },
	#[error("{bits} grinding bits exceed the {max} bits of the proof-of-work digest")]
	GrindingBitsTooLarge { bits: usize, max: usize },
	#[error("the codeword has length {actual}, expected {expected}")]
	IncorrectCodewordLength { expected: usize, actual: usize },
	#[error("attempted to fold more than maximum of {max_folds} times")]
	TooManyFoldExecutions { max_folds: usize },
	#[error("attempted to finish prover before executing all fold rounds")]
	EarlyProverFinish,
	#[error("math error: {0}")]
	Math(#[from] MathError),
	#[error("vector commit error: {0}")]
	VectorCommit(#[from] merkle_tree::Error),
	#[error("verification error: {0}")]
	Verification(#[from] VerificationError),
}

impl Error {
	/// Whether the error means that a proof was rejected, as opposed to a misuse of the API.
	pub fn is_invalid_proof(&self) -> bool {
		matches!(self, Self::Verification(_))
	}
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
	#[error("incorrect codeword folding in query round {query_round} at index {index}")]
	IncorrectFold { query_round: usize, index: usize },
	#[error("the opened values at index {index} do not match the committed input")]
	IncorrectInitialValue { index: usize },
	#[error("the size of the query proof is incorrect, expected {expected}")]
	IncorrectQueryProofLength { expected: usize },
	#[error("the number of values in round {round} of the query proof is incorrect, expected {coset_size}")]
	IncorrectQueryProofValuesLength { round: usize, coset_size: usize },
	#[error("the number of query proofs is incorrect, expected {expected}")]
	IncorrectQueryCount { expected: usize },
	#[error("the number of round commitments is incorrect, expected {expected}")]
	IncorrectRoundCount { expected: usize },
	#[error("the final polynomial exceeds the degree bound")]
	IncorrectDegree,
	#[error("the proof-of-work nonce is invalid")]
	InvalidNonce,
	#[error("invalid Merkle opening in round {round} at index {index}")]
	InvalidOpening { round: usize, index: usize },
}
