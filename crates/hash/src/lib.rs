// Copyright 2024 Irreducible Inc.

//! Hashing primitives used by the commitment layer: byte-oriented digests of serializable values
//! and field elements, and two-to-one compression functions for Merkle tree inner nodes.

mod compression;
mod serialization;
mod sha256;

pub use compression::*;
pub use serialization::*;
pub use sha256::*;
