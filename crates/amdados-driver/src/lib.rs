// crates/amdados-driver/src/lib.rs

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod profile;
pub mod run;
pub mod runner;
pub mod schedule;

pub use profile::AverageProfile;
pub use run::{RunInputs, run_simulation};
pub use runner::{GridRunner, RayonRunner, SequentialRunner};
pub use schedule::{is_snapshot_tick, Schedule};
