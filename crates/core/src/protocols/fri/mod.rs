// Copyright 2024 Irreducible Inc.

//! Implementation of the Fast Reed–Solomon IOPP (FRI) over prime fields.
//!
//! FRI is an IOP of Proximity for Reed–Solomon codes, introduced in [BBHR17]. The verifier starts
//! with oracle access to a purported codeword of a polynomial of degree below `2^degree_log`,
//! evaluated on the multiplicative subgroup D0 of size `2^(degree_log + expansion_log)`.
//!
//! The protocol runs in rounds. In each round the prover commits to its current oracle, where
//! every Merkle leaf holds a whole coset of `2^step` points that fold into a single point, and
//! then folds the oracle `step` times with fresh challenges. One binary fold maps g to
//! `g_even + α · g_odd` on the squared domain. After the last round the prover sends the
//! remaining low-degree polynomial in the clear, solves a proof-of-work puzzle, and answers the
//! sampled queries by opening one coset per round.
//!
//! [BBHR17]: <https://eccc.weizmann.ac.il/report/2017/134/>

mod common;
mod error;
mod prove;
mod verify;

pub use common::{
	coset_values, fold_codeword, fold_coset, powers, sample_query_indices, FRIParams, FRIProof,
	QueryProof, QueryRoundProof, MAX_GRINDING_BITS,
};
pub use error::*;
pub use prove::*;
pub use verify::*;
