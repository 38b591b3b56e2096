// crates/amdados-core/src/lib.rs

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod config;
pub mod error;
pub mod linalg;

// ---- Re-exports for workspace compatibility ----
pub use config::*;
pub use error::*;
pub use linalg::*;
