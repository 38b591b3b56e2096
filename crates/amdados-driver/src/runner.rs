// crates/amdados-driver/src/runner.rs

//! Pluggable "for each subdomain at logical time t" primitive. The
//! default is `rayon`'s work-stealing thread pool; a sequential runner
//! is kept for tests that need deterministic per-subdomain ordering.

use rayon::prelude::*;

/// Parallel-for over subdomain slot indices `0..n`, with an implicit
/// barrier after every call: the method does not return until every
/// slot's closure has run.
///
/// The body is taken as a trait object rather than a generic parameter
/// so this trait stays object-safe: the driver dispatches through
/// `&dyn GridRunner` to keep `run_simulation` agnostic to the concrete
/// runner.
pub trait GridRunner {
    fn for_each_subdomain(&self, n: usize, f: &(dyn Fn(usize) + Sync + Send));
}

/// Work-stealing runner backed by the global `rayon` thread pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct RayonRunner;

impl GridRunner for RayonRunner {
    fn for_each_subdomain(&self, n: usize, f: &(dyn Fn(usize) + Sync + Send)) {
        (0..n).into_par_iter().for_each(f);
    }
}

/// Strictly ordered runner, useful in tests that assert on the order
/// snapshot records are produced in, or that want to avoid spinning up
/// a thread pool at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialRunner;

impl GridRunner for SequentialRunner {
    fn for_each_subdomain(&self, n: usize, f: &(dyn Fn(usize) + Sync + Send)) {
        for i in 0..n {
            f(i);
        }
    }
}
