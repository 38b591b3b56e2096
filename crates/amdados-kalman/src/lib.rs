// crates/amdados-kalman/src/lib.rs

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod filter;

pub use filter::{KalmanState, propagate_state_inverse, solve_filter};
