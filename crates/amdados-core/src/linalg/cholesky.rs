// crates/amdados-core/src/linalg/cholesky.rs

//! Cholesky factorization of a symmetric positive-definite matrix, used by
//! the Kalman filter's innovation-covariance solve where the matrix is
//! guaranteed symmetric by construction.

use crate::error::AmdadosError;
use crate::linalg::matrix::Matrix;

/// Minimum diagonal pivot magnitude accepted during factorization; below
/// this the matrix is treated as numerically singular.
const PIVOT_EPS: f64 = 1e-300;

/// Lower-triangular factor `L` such that `A = L . Lᵀ`.
#[derive(Clone, Debug)]
pub struct Cholesky {
    n: usize,
    l: Matrix,
}

impl Cholesky {
    /// Factorize `a` in place. `a` must be square and (numerically)
    /// symmetric positive-definite; only the lower triangle is read.
    pub fn new(a: &Matrix) -> Result<Self, AmdadosError> {
        if a.rows() != a.cols() {
            return Err(AmdadosError::InvalidInput(
                "Cholesky requires a square matrix".to_string(),
            ));
        }
        let n = a.rows();
        let mut l = Matrix::zeros(n, n);

        for i in 0..n {
            for j in 0..=i {
                let mut sum = a.get(i, j);
                for k in 0..j {
                    sum -= l.get(i, k) * l.get(j, k);
                }
                if i == j {
                    if sum <= PIVOT_EPS {
                        return Err(AmdadosError::Factorization(format!(
                            "non-positive-definite pivot at row {i}: {sum}"
                        )));
                    }
                    l.set(i, j, sum.sqrt());
                } else {
                    l.set(i, j, sum / l.get(j, j));
                }
            }
        }

        Ok(Self { n, l })
    }

    /// Solve `A x = b` for a single right-hand side, reusing the stored
    /// factorization.
    pub fn solve(&self, b: &[f64]) -> Result<Vec<f64>, AmdadosError> {
        if b.len() != self.n {
            return Err(AmdadosError::InvalidInput(format!(
                "rhs length {} does not match factorization size {}",
                b.len(),
                self.n
            )));
        }

        // Forward: L y = b.
        let mut y = vec![0.0; self.n];
        for i in 0..self.n {
            let mut sum = b[i];
            for k in 0..i {
                sum -= self.l.get(i, k) * y[k];
            }
            y[i] = sum / self.l.get(i, i);
        }

        // Back: Lᵀ x = y.
        let mut x = vec![0.0; self.n];
        for i in (0..self.n).rev() {
            let mut sum = y[i];
            for k in (i + 1)..self.n {
                sum -= self.l.get(k, i) * x[k];
            }
            x[i] = sum / self.l.get(i, i);
        }

        Ok(x)
    }

    /// Solve `A X = B` for a batch of right-hand-side columns, reusing
    /// the factorization across all of them.
    pub fn solve_batch(&self, b: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, AmdadosError> {
        b.iter().map(|col| self.solve(col)).collect()
    }

    /// Size of the factored matrix.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spd_matrix() -> Matrix {
        // [[4, 2], [2, 3]] is SPD.
        Matrix::from_row_major(2, 2, vec![4.0, 2.0, 2.0, 3.0]).unwrap()
    }

    #[test]
    fn solve_recovers_known_solution() {
        let a = spd_matrix();
        let x_expected = [1.0, 2.0];
        let b = a.matvec(&x_expected).unwrap();
        let chol = Cholesky::new(&a).unwrap();
        let x = chol.solve(&b).unwrap();
        for (got, want) in x.iter().zip(x_expected.iter()) {
            assert!((got - want).abs() < 1e-10);
        }
    }

    #[test]
    fn non_positive_definite_matrix_is_rejected() {
        let a = Matrix::from_row_major(2, 2, vec![1.0, 2.0, 2.0, 1.0]).unwrap();
        assert!(Cholesky::new(&a).is_err());
    }

    #[test]
    fn batch_solve_matches_individual_solves() {
        let a = spd_matrix();
        let chol = Cholesky::new(&a).unwrap();
        let b1 = vec![1.0, 0.0];
        let b2 = vec![0.0, 1.0];
        let batch = chol.solve_batch(&[b1.clone(), b2.clone()]).unwrap();
        assert_eq!(batch[0], chol.solve(&b1).unwrap());
        assert_eq!(batch[1], chol.solve(&b2).unwrap());
    }
}
