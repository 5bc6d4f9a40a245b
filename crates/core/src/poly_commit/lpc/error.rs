// Copyright 2024 Irreducible Inc.

use placeholder_math::Error as MathError;

use super::BatchId;
use crate::{merkle_tree, protocols::fri};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("batch {batch} is not registered")]
	UnknownBatch { batch: BatchId },
	#[error("batch {batch} is already registered")]
	DuplicateBatch { batch: BatchId },
	#[error("batch {batch} has no polynomials")]
	EmptyBatch { batch: BatchId },
	#[error("batch {batch} has no polynomial at index {index}")]
	PolynomialIndexOutOfRange { batch: BatchId, index: usize },
	#[error("fixed batches require setup data")]
	MissingFixedData,
	#[error("the FRI parameters of participant {participant} differ from the coordinator's")]
	ParameterMismatch { participant: usize },
	#[error("expected one starting power per participant, {expected} in total")]
	IncorrectStartingPowerCount { expected: usize },
	#[error("FRI error: {0}")]
	Fri(#[from] fri::Error),
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
		match self {
			Self::Verification(_) => true,
			Self::Fri(err) => err.is_invalid_proof(),
			_ => false,
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
	#[error("the claimed evaluations of batch {batch} do not match the requested points")]
	IncorrectEvaluationsShape { batch: BatchId },
	#[error("the proof covers the wrong number of provers, expected {expected}")]
	IncorrectProverCount { expected: usize },
	#[error("the number of initial proofs is incorrect, expected {expected}")]
	IncorrectInitialProofCount { expected: usize },
	#[error("query {query} opens the wrong number of batches, expected {expected}")]
	IncorrectBatchCount { query: usize, expected: usize },
	#[error("the initial opening of batch {batch} in query {query} has the wrong shape")]
	IncorrectInitialProofShape { query: usize, batch: BatchId },
	#[error("invalid Merkle opening of batch {batch} in query {query}")]
	InvalidInitialOpening { query: usize, batch: BatchId },
	#[error("an evaluation point lies in the commitment domain")]
	EvaluationPointInDomain,
}
