// crates/amdados-core/src/linalg/vector.rs

//! Free functions over plain `&[f64]` slices, used for state vectors that
//! don't warrant a newtype wrapper.

use crate::error::AmdadosError;

fn check_same_len(a: &[f64], b: &[f64]) -> Result<(), AmdadosError> {
    if a.len() != b.len() {
        return Err(AmdadosError::InvalidInput(format!(
            "vector length mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

/// Element-wise `a + b`.
pub fn add(a: &[f64], b: &[f64]) -> Result<Vec<f64>, AmdadosError> {
    check_same_len(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x + y).collect())
}

/// Element-wise `a - b`.
pub fn sub(a: &[f64], b: &[f64]) -> Result<Vec<f64>, AmdadosError> {
    check_same_len(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x - y).collect())
}

/// Element-wise scale by a scalar.
#[must_use]
pub fn scale(a: &[f64], s: f64) -> Vec<f64> {
    a.iter().map(|x| x * s).collect()
}

/// Element-wise negation.
#[must_use]
pub fn negate(a: &[f64]) -> Vec<f64> {
    scale(a, -1.0)
}

/// Euclidean (L2) norm.
#[must_use]
pub fn norm(a: &[f64]) -> f64 {
    a.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Euclidean norm of `a - b`, without allocating the difference.
pub fn norm_diff(a: &[f64], b: &[f64]) -> Result<f64, AmdadosError> {
    check_same_len(a, b)?;
    let sum_sq: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    Ok(sum_sq.sqrt())
}
