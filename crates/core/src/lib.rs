// Copyright 2023-2024 Irreducible Inc.

//! The Placeholder proof system: a PLONK-style argument over prime fields with a FRI-based list
//! polynomial commitment.
//!
//! The crate is organized bottom-up. [`merkle_tree`] commits vectors of field elements,
//! [`protocols::fri`] proves proximity to low-degree polynomials on top of it and
//! [`poly_commit::lpc`] opens batches of committed polynomials at arbitrary points with a single
//! FRI proof. [`protocols`] holds the gate, permutation and lookup arguments, and
//! [`constraint_system`] composes everything into [`constraint_system::prove`] and
//! [`constraint_system::verify`].

pub mod constraint_system;
pub mod fiat_shamir;
pub mod merkle_tree;
pub mod poly_commit;
pub mod protocols;
pub mod transcript;
