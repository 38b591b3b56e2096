// crates/amdados-core/src/linalg/matrix.rs

//! Dense row-major matrix of `f64` with explicit row/column counts.

use crate::error::AmdadosError;

/// Dense row-major matrix. `data[r * cols + c]` is element `(r, c)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Construct a zero matrix of the given shape.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Construct the `n x n` identity matrix.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    /// Construct from explicit row-major data; errors if the length does
    /// not match `rows * cols`.
    pub fn from_row_major(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, AmdadosError> {
        if data.len() != rows * cols {
            return Err(AmdadosError::InvalidInput(format!(
                "matrix data length {} does not match {}x{}",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    #[must_use]
    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, v: f64) {
        self.data[r * self.cols + c] = v;
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    fn check_dims_for_mul(&self, rhs: &Self) -> Result<(), AmdadosError> {
        if self.cols != rhs.rows {
            return Err(AmdadosError::InvalidInput(format!(
                "matmul shape mismatch: {}x{} * {}x{}",
                self.rows, self.cols, rhs.rows, rhs.cols
            )));
        }
        Ok(())
    }

    /// `C <- A . B`. The result is a freshly allocated matrix, disjoint
    /// from both operands.
    pub fn matmul(&self, rhs: &Self) -> Result<Self, AmdadosError> {
        self.check_dims_for_mul(rhs)?;
        let mut out = Self::zeros(self.rows, rhs.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a_ik = self.get(i, k);
                if a_ik == 0.0 {
                    continue;
                }
                for j in 0..rhs.cols {
                    let prev = out.get(i, j);
                    out.set(i, j, prev + a_ik * rhs.get(k, j));
                }
            }
        }
        Ok(out)
    }

    /// `C <- A . Bᵀ` without physically transposing `B`.
    pub fn matmul_tr(&self, rhs: &Self) -> Result<Self, AmdadosError> {
        if self.cols != rhs.cols {
            return Err(AmdadosError::InvalidInput(format!(
                "matmul_tr shape mismatch: {}x{} * ({}x{})^T",
                self.rows, self.cols, rhs.rows, rhs.cols
            )));
        }
        let mut out = Self::zeros(self.rows, rhs.rows);
        for i in 0..self.rows {
            for j in 0..rhs.rows {
                let mut acc = 0.0;
                for k in 0..self.cols {
                    acc += self.get(i, k) * rhs.get(j, k);
                }
                out.set(i, j, acc);
            }
        }
        Ok(out)
    }

    /// `y <- A . x`.
    pub fn matvec(&self, x: &[f64]) -> Result<Vec<f64>, AmdadosError> {
        if x.len() != self.cols {
            return Err(AmdadosError::InvalidInput(format!(
                "matvec shape mismatch: {}x{} * vec[{}]",
                self.rows,
                self.cols,
                x.len()
            )));
        }
        let mut y = vec![0.0; self.rows];
        for i in 0..self.rows {
            let mut acc = 0.0;
            for k in 0..self.cols {
                acc += self.get(i, k) * x[k];
            }
            y[i] = acc;
        }
        Ok(y)
    }

    /// Element-wise `self + rhs`.
    pub fn add(&self, rhs: &Self) -> Result<Self, AmdadosError> {
        self.check_same_shape(rhs)?;
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(a, b)| a + b)
            .collect();
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// Element-wise `self - rhs`.
    pub fn sub(&self, rhs: &Self) -> Result<Self, AmdadosError> {
        self.check_same_shape(rhs)?;
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(a, b)| a - b)
            .collect();
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// Element-wise scale by a scalar.
    #[must_use]
    pub fn scale(&self, s: f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|v| v * s).collect(),
        }
    }

    /// Element-wise negation.
    #[must_use]
    pub fn negate(&self) -> Self {
        self.scale(-1.0)
    }

    /// Transpose (allocates a new matrix).
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut out = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.set(j, i, self.get(i, j));
            }
        }
        out
    }

    /// `A <- (A + Aᵀ) / 2`. Corrects round-off asymmetry in covariance
    /// matrices. Requires a square matrix.
    pub fn symmetrize(&mut self) -> Result<(), AmdadosError> {
        if self.rows != self.cols {
            return Err(AmdadosError::InvalidInput(
                "symmetrize requires a square matrix".to_string(),
            ));
        }
        for i in 0..self.rows {
            for j in (i + 1)..self.cols {
                let avg = 0.5 * (self.get(i, j) + self.get(j, i));
                self.set(i, j, avg);
                self.set(j, i, avg);
            }
        }
        Ok(())
    }

    /// Frobenius norm.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Frobenius norm of `self - other`.
    pub fn norm_diff(&self, other: &Self) -> Result<f64, AmdadosError> {
        self.check_same_shape(other)?;
        let sum_sq: f64 = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        Ok(sum_sq.sqrt())
    }

    fn check_same_shape(&self, other: &Self) -> Result<(), AmdadosError> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(AmdadosError::InvalidInput(format!(
                "shape mismatch: {}x{} vs {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        Ok(())
    }

    /// Extract column `j` as an owned vector.
    #[must_use]
    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.rows).map(|i| self.get(i, j)).collect()
    }

    /// Build a matrix from a sequence of equal-length columns.
    pub fn from_columns(rows: usize, columns: &[Vec<f64>]) -> Result<Self, AmdadosError> {
        let cols = columns.len();
        let mut out = Self::zeros(rows, cols);
        for (j, col) in columns.iter().enumerate() {
            if col.len() != rows {
                return Err(AmdadosError::InvalidInput(format!(
                    "column {j} has length {}, expected {rows}",
                    col.len()
                )));
            }
            for (i, &v) in col.iter().enumerate() {
                out.set(i, j, v);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matmul_identity_is_noop() {
        let a = Matrix::from_row_major(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let i = Matrix::identity(2);
        let c = a.matmul(&i).unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn matmul_tr_matches_explicit_transpose() {
        let a = Matrix::from_row_major(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b = Matrix::from_row_major(2, 3, vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]).unwrap();
        let via_tr = a.matmul_tr(&b).unwrap();
        let via_explicit = a.matmul(&b.transpose()).unwrap();
        assert_eq!(via_tr, via_explicit);
    }

    #[test]
    fn symmetrize_fixes_round_off() {
        let mut a = Matrix::from_row_major(2, 2, vec![1.0, 2.0001, 1.9999, 3.0]).unwrap();
        a.symmetrize().unwrap();
        assert!((a.get(0, 1) - a.get(1, 0)).abs() < 1e-12);
    }

    #[test]
    fn norm_diff_of_equal_matrices_is_zero() {
        let a = Matrix::identity(3);
        assert_eq!(a.norm_diff(&a).unwrap(), 0.0);
    }
}
