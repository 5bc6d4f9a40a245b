// Copyright 2024 Irreducible Inc.

pub mod checked_arithmetics;
pub mod error_utils;
pub mod rayon;
pub mod serialization;
pub mod tracing;

pub use serialization::{DeserializeBytes, Error as SerializationError, SerializeBytes};
