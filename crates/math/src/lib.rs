// Copyright 2024-2025 Irreducible Inc.

//! Mathematical primitives of the Placeholder prover, built atop the arkworks prime fields.
//!
//! This crate provides:
//!
//! * Power-of-two evaluation domains and the nested FRI domain sets
//! * Univariate polynomials in coefficient and evaluation (DFS) form
//! * Batch inversion
//! * Arithmetic expressions, their deduplicated DAG form and a parallel DAG evaluator

mod arith_expr;
pub mod dag;
mod domain;
mod error;
mod inverse;
mod polynomial_dfs;
mod univariate;

pub use arith_expr::*;
pub use domain::*;
pub use error::*;
pub use inverse::*;
pub use polynomial_dfs::*;
pub use univariate::*;
