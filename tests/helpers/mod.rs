//! Shared helpers for integration tests
//!
//! - [`assertions`] - Tolerance comparisons for scalars, vectors, matrices
//! - [`models`] - Reference Kalman recursion and test model factories

#![allow(dead_code)]

pub mod assertions;
pub mod models;
