// crates/amdados-io/src/lib.rs

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod config;
pub mod observations;
pub mod result_stream;
pub mod sensors;

pub use config::load_config;
pub use observations::{ObservationTable, load_observations};
pub use result_stream::ResultStream;
pub use sensors::load_sensors;
