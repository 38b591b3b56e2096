// crates/amdados-core/src/error.rs

//! The single error type shared by every crate in the workspace.
//!
//! All variants here are, per the engine's contract, fatal at the point
//! they surface: the time loop does not retry a failed subdomain, it
//! propagates the error up to the driver and exits non-zero.

use thiserror::Error;

/// Fatal error kinds produced by the AMDADOS engine.
#[derive(Debug, Error)]
pub enum AmdadosError {
    /// Hard-coded `Sx`/`Sy` disagree with the configuration file.
    #[error("configuration mismatch: {0}")]
    ConfigMismatch(String),

    /// Malformed or out-of-range input (sensor coordinate, measurement
    /// table shape, negative physical parameter, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// LU or Cholesky factorization hit a pivot magnitude below the
    /// singularity threshold.
    #[error("factorization failed: {0}")]
    Factorization(String),

    /// A derived time step was non-positive.
    #[error("stability violation: derived dt <= 0 ({0})")]
    Stability(String),

    /// Input file missing, unreadable, or result-stream write failure.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, AmdadosError>;
