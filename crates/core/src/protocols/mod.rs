// Copyright 2023-2024 Irreducible Inc.

//! The interactive arguments composed by the Placeholder proof system.
//!
//! Each argument contributes polynomials to commit and constraints that must vanish on the usable
//! rows of the table. All arguments are public-coin and made non-interactive with the
//! Fiat-Shamir transformation, so the prover side draws its challenges from the same transcript
//! the verifier replays.
//!
//! * [`fri`] proves that a committed codeword is close to a polynomial of low degree
//! * [`gates`] enforces the selected gate constraints
//! * [`permutation`] enforces copy constraints with a grand product
//! * [`lookup`] enforces lookups with logarithmic derivatives

pub mod fri;
pub mod gates;
pub mod lookup;
pub mod permutation;
