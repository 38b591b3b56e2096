// crates/amdados-core/src/linalg/lu.rs

//! LU factorization with partial pivoting, used for the (generally
//! non-symmetric) implicit-Euler model matrix `B`.

use crate::error::AmdadosError;
use crate::linalg::matrix::Matrix;

/// Minimum pivot magnitude accepted during factorization.
const PIVOT_EPS: f64 = 1e-300;

/// In-place LU factorization of a square matrix with partial (row)
/// pivoting: `P . A = L . U`, with `L` unit lower-triangular and `U`
/// upper-triangular both packed into a single dense buffer.
#[derive(Clone, Debug)]
pub struct Lu {
    n: usize,
    lu: Matrix,
    /// `perm[i]` is the original row now occupying row `i`.
    perm: Vec<usize>,
}

impl Lu {
    /// Factorize `a`. `a` must be square.
    pub fn new(a: &Matrix) -> Result<Self, AmdadosError> {
        if a.rows() != a.cols() {
            return Err(AmdadosError::InvalidInput(
                "LU requires a square matrix".to_string(),
            ));
        }
        let n = a.rows();
        let mut lu = a.clone();
        let mut perm: Vec<usize> = (0..n).collect();

        for k in 0..n {
            // Partial pivot: largest magnitude in column k, rows >= k.
            let mut pivot_row = k;
            let mut pivot_val = lu.get(k, k).abs();
            for i in (k + 1)..n {
                let v = lu.get(i, k).abs();
                if v > pivot_val {
                    pivot_val = v;
                    pivot_row = i;
                }
            }

            if pivot_val <= PIVOT_EPS {
                return Err(AmdadosError::Factorization(format!(
                    "singular matrix at column {k}: pivot magnitude {pivot_val}"
                )));
            }

            if pivot_row != k {
                for j in 0..n {
                    let a_kj = lu.get(k, j);
                    let a_pj = lu.get(pivot_row, j);
                    lu.set(k, j, a_pj);
                    lu.set(pivot_row, j, a_kj);
                }
                perm.swap(k, pivot_row);
            }

            let pivot = lu.get(k, k);
            for i in (k + 1)..n {
                let factor = lu.get(i, k) / pivot;
                lu.set(i, k, factor);
                if factor == 0.0 {
                    continue;
                }
                for j in (k + 1)..n {
                    let updated = lu.get(i, j) - factor * lu.get(k, j);
                    lu.set(i, j, updated);
                }
            }
        }

        Ok(Self { n, lu, perm })
    }

    /// Solve `A x = b` for a single right-hand side.
    pub fn solve(&self, b: &[f64]) -> Result<Vec<f64>, AmdadosError> {
        if b.len() != self.n {
            return Err(AmdadosError::InvalidInput(format!(
                "rhs length {} does not match factorization size {}",
                b.len(),
                self.n
            )));
        }

        let pb: Vec<f64> = self.perm.iter().map(|&p| b[p]).collect();

        // Forward: L y = Pb, L unit lower-triangular.
        let mut y = vec![0.0; self.n];
        for i in 0..self.n {
            let mut sum = pb[i];
            for k in 0..i {
                sum -= self.lu.get(i, k) * y[k];
            }
            y[i] = sum;
        }

        // Back: U x = y.
        let mut x = vec![0.0; self.n];
        for i in (0..self.n).rev() {
            let mut sum = y[i];
            for k in (i + 1)..self.n {
                sum -= self.lu.get(i, k) * x[k];
            }
            x[i] = sum / self.lu.get(i, i);
        }

        Ok(x)
    }

    /// Solve `A X = B` for a batch of right-hand-side columns.
    pub fn solve_batch(&self, b: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, AmdadosError> {
        b.iter().map(|col| self.solve(col)).collect()
    }

    /// Solve `A X = Bᵀ` and return the result transposed back, i.e.
    /// `(A^-1 . Bᵀ)ᵀ`: each row of `b` is treated as one right-hand side
    /// and the corresponding solution is returned as the matching row of
    /// the output.
    pub fn solve_batch_tr(&self, b: &Matrix) -> Result<Matrix, AmdadosError> {
        let mut rows = Vec::with_capacity(b.rows());
        for r in 0..b.rows() {
            let rhs: Vec<f64> = (0..b.cols()).map(|c| b.get(r, c)).collect();
            rows.push(self.solve(&rhs)?);
        }
        let cols = self.n;
        let mut out = Matrix::zeros(b.rows(), cols);
        for (r, row) in rows.into_iter().enumerate() {
            for (c, v) in row.into_iter().enumerate() {
                out.set(r, c, v);
            }
        }
        Ok(out)
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

    #[test]
    fn solve_recovers_known_solution() {
        let a = Matrix::from_row_major(3, 3, vec![2.0, 1.0, 1.0, 4.0, 3.0, 3.0, 8.0, 7.0, 9.0])
            .unwrap();
        let x_expected = [1.0, -2.0, 3.0];
        let b = a.matvec(&x_expected).unwrap();
        let lu = Lu::new(&a).unwrap();
        let x = lu.solve(&b).unwrap();
        for (got, want) in x.iter().zip(x_expected.iter()) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn requires_pivoting_still_solves() {
        // Zero in the (0,0) position forces a row swap.
        let a = Matrix::from_row_major(2, 2, vec![0.0, 1.0, 1.0, 1.0]).unwrap();
        let x_expected = [2.0, 3.0];
        let b = a.matvec(&x_expected).unwrap();
        let lu = Lu::new(&a).unwrap();
        let x = lu.solve(&b).unwrap();
        for (got, want) in x.iter().zip(x_expected.iter()) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let a = Matrix::from_row_major(2, 2, vec![1.0, 2.0, 2.0, 4.0]).unwrap();
        assert!(Lu::new(&a).is_err());
    }

    #[test]
    fn batch_solve_matches_individual_solves() {
        let a = Matrix::from_row_major(2, 2, vec![3.0, 1.0, 1.0, 2.0]).unwrap();
        let lu = Lu::new(&a).unwrap();
        let b1 = vec![1.0, 0.0];
        let b2 = vec![0.0, 1.0];
        let batch = lu.solve_batch(&[b1.clone(), b2.clone()]).unwrap();
        assert_eq!(batch[0], lu.solve(&b1).unwrap());
        assert_eq!(batch[1], lu.solve(&b2).unwrap());
    }
}
