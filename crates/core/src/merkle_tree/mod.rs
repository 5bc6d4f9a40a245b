// Copyright 2024 Irreducible Inc.

//! Binary Merkle trees committing to rows of field elements.
//!
//! A leaf is the hash of the canonical encodings of all values committed at one position; inner
//! nodes are produced by a two-to-one compression function. The prover side keeps the whole tree
//! and produces authentication paths, the verifier side checks a path against a root.

mod binary_merkle_tree;
mod errors;
#[allow(clippy::module_inception)]
mod merkle_tree_vcs;
mod prover;
mod scheme;

pub use binary_merkle_tree::*;
pub use errors::*;
pub use merkle_tree_vcs::*;
pub use prover::BinaryMerkleTreeProver;
pub use scheme::BinaryMerkleTreeScheme;
