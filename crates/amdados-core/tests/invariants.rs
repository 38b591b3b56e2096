//! Round-trip invariants for the dense linear algebra kernels.
//!
//! Both factorizations are expected to recover the right-hand side to
//! near machine precision on well-conditioned random inputs; these
//! properties hold regardless of which specific matrix triggered them,
//! so they're a natural fit for `proptest` rather than fixed examples.

use amdados_core::linalg::{Cholesky, Lu, Matrix};
use proptest::prelude::*;

/// Build a random diagonally dominant (hence non-singular) square matrix
/// from a flat list of entries, so `Lu::new` never rejects it.
fn diagonally_dominant(n: usize, raw: &[f64]) -> Matrix {
    let mut m = Matrix::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            m.set(i, j, raw[i * n + j]);
        }
    }
    for i in 0..n {
        let off_diag_sum: f64 = (0..n).filter(|&j| j != i).map(|j| m.get(i, j).abs()).sum();
        m.set(i, i, off_diag_sum + (n as f64) + 1.0);
    }
    m
}

/// Build a random SPD matrix as `R . Rᵀ + n . I`, which is SPD for any
/// real `R` since the added diagonal keeps it strictly positive even if
/// `R` is rank-deficient.
fn random_spd(n: usize, raw: &[f64]) -> Matrix {
    let r = Matrix::from_row_major(n, n, raw.to_vec()).unwrap();
    let mut s = r.matmul_tr(&r).unwrap();
    for i in 0..n {
        s.set(i, i, s.get(i, i) + n as f64);
    }
    s
}

prop_compose! {
    fn arb_square_entries(n: usize)(raw in prop::collection::vec(-10.0f64..10.0, n * n)) -> Vec<f64> { raw }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    /// LU round-trip: `‖A·LU_solve(A,b) − b‖ / ‖b‖ ≤ 1e-9` for random
    /// non-singular `A` and `b`.
    #[test]
    fn lu_round_trip(
        n in 1usize..=8,
        raw in arb_square_entries(8),
        b_raw in prop::collection::vec(-10.0f64..10.0, 8),
    ) {
        let a = diagonally_dominant(n, &raw[..n * n]);
        let b = &b_raw[..n];

        let lu = Lu::new(&a).unwrap();
        let x = lu.solve(b).unwrap();
        let recovered = a.matvec(&x).unwrap();

        let b_norm: f64 = b.iter().map(|v| v * v).sum::<f64>().sqrt().max(1e-12);
        let err: f64 = recovered
            .iter()
            .zip(b.iter())
            .map(|(r, v)| (r - v) * (r - v))
            .sum::<f64>()
            .sqrt();
        prop_assert!(err / b_norm <= 1e-9, "relative residual {} too large", err / b_norm);
    }

    /// Cholesky round-trip: `‖S·chol_solve(S,b) − b‖ / ‖b‖ ≤ 1e-9` for
    /// random SPD `S` and `b`.
    #[test]
    fn cholesky_round_trip(
        n in 1usize..=8,
        raw in arb_square_entries(8),
        b_raw in prop::collection::vec(-10.0f64..10.0, 8),
    ) {
        let s = random_spd(n, &raw[..n * n]);
        let b = &b_raw[..n];

        let chol = Cholesky::new(&s).unwrap();
        let x = chol.solve(b).unwrap();
        let recovered = s.matvec(&x).unwrap();

        let b_norm: f64 = b.iter().map(|v| v * v).sum::<f64>().sqrt().max(1e-12);
        let err: f64 = recovered
            .iter()
            .zip(b.iter())
            .map(|(r, v)| (r - v) * (r - v))
            .sum::<f64>()
            .sqrt();
        prop_assert!(err / b_norm <= 1e-9, "relative residual {} too large", err / b_norm);
    }
}
