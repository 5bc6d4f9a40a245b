// Copyright 2024 Irreducible Inc.

//! The list polynomial commitment (LPC) scheme.
//!
//! Polynomials are committed in batches, each batch under one Merkle tree over the evaluations on
//! the FRI domain D0. Every polynomial may be opened at its own list of points. The prover proves
//! all openings at once by running FRI on the θ-combined quotient
//!
//! ```text
//! Q(x) = Σ_ζ Σ_(batch, poly) θ^k · (p(x) - p(ζ)) / (x - ζ)
//! ```
//!
//! which is a polynomial of low degree exactly when every claimed evaluation is correct. For each
//! FRI query, the prover opens all batch trees at the queried coset, which lets the verifier
//! recompute Q there.
//!
//! Batches marked as fixed are committed during setup and are additionally opened at a setup
//! point η whose evaluations are part of the preprocessed data.

mod aggregated;
mod common;
mod error;
mod prove;
#[cfg(test)]
mod tests;
mod verify;

pub use aggregated::*;
pub use common::{
	combine_openings, count_opening_terms, observe_evaluations, setup_fixed_batches, BatchId,
	BatchPoints, CommittedBatch, InitialProof, LpcFixedData, LpcProof, PointGroup, WeightedTerm,
};
pub(crate) use common::{
	deserialize_batch_points, deserialize_openings, serialize_batch_points, serialize_openings,
};
pub use error::*;
pub use prove::*;
pub use verify::*;
