// crates/amdados-core/src/linalg/mod.rs

//! Dense linear algebra kernels used by the model-matrix builder and the
//! Kalman filter.
//!
//! This is deliberately a small, hand-rolled dense solver rather than a
//! dependency on `nalgebra`/`ndarray`: the shapes here are fixed at
//! `(Sx+2)(Sy+2)` square (a few hundred rows at most for realistic
//! subdomain sizes), and named `Init`/`Solve`/`BatchSolve` entry points
//! with factorization reuse across calls suit that scale directly.

mod cholesky;
mod lu;
mod matrix;
mod vector;

pub use cholesky::Cholesky;
pub use lu::Lu;
pub use matrix::Matrix;
pub use vector::{add, negate, norm, norm_diff, scale, sub};
