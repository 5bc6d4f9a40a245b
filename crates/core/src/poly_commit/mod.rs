// Copyright 2023-2024 Irreducible Inc.

pub mod lpc;

pub use lpc::{LpcProof, LpcProver, LpcVerifier};
