// crates/amdados-grid/src/lib.rs

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod cell;
pub mod context;
pub mod model_matrix;
pub mod schwarz;

pub use cell::{Resolution, Side, SubdomainCell};
pub use context::{SubdomainContext, SubdomainIdx};
pub use model_matrix::build_model_matrix;
pub use schwarz::{clamp_non_negative, clamp_outer_dirichlet, schwarz_update, BoundaryRecord, SchwarzVariant};
