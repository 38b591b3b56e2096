// crates/amdados-kalman/src/filter.rs

//! Per-subdomain Kalman filter: prior propagation through the inverse
//! model matrix and posterior correction from local sensor observations.
//!
//! State and covariance algebra use `nalgebra`'s dense types; the model
//! matrix itself is solved through `amdados_core::linalg::Lu`, since the
//! stencil's `B` operator is shared with the sensor-less direct-solve
//! branch and is built and factored there.

use amdados_core::error::AmdadosError;
use amdados_core::linalg::Lu;
use nalgebra::{DMatrix, DVector};

/// Mutable Kalman state owned by one subdomain context: estimate `x`,
/// process covariance `P`, process noise `Q`, observation operator `H`,
/// observation noise `R`, and the current observation vector `z`.
///
/// `n` is the extended state dimension `(Sx+2)(Sy+2)`; `m` is the sensor
/// count for this subdomain (may be zero, in which case this subdomain
/// never takes the Kalman branch).
#[derive(Clone, Debug)]
pub struct KalmanState {
    pub x: DVector<f64>,
    pub p: DMatrix<f64>,
    pub q: DMatrix<f64>,
    pub h: DMatrix<f64>,
    pub r: DMatrix<f64>,
    pub z: DVector<f64>,
}

impl KalmanState {
    /// Allocate a zeroed state for an extended dimension `n` and sensor
    /// count `m`, with process covariance initialized to `ini_var * I`.
    #[must_use]
    pub fn new(n: usize, m: usize, ini_var: f64) -> Self {
        Self {
            x: DVector::zeros(n),
            p: DMatrix::identity(n, n) * ini_var,
            q: DMatrix::zeros(n, n),
            h: DMatrix::zeros(m, n),
            r: DMatrix::zeros(m, m),
            z: DVector::zeros(m),
        }
    }

    #[must_use]
    pub fn state_dim(&self) -> usize {
        self.x.nrows()
    }

    #[must_use]
    pub fn obs_dim(&self) -> usize {
        self.z.nrows()
    }
}

/// Apply `B⁻¹` to every column of a dense matrix via the model matrix's
/// LU factorization, without requiring `Lu` to know about `nalgebra`.
fn apply_inverse(lu: &Lu, m: &DMatrix<f64>) -> Result<DMatrix<f64>, AmdadosError> {
    let n = m.nrows();
    let mut out = DMatrix::zeros(n, m.ncols());
    for j in 0..m.ncols() {
        let col: Vec<f64> = m.column(j).iter().copied().collect();
        let solved = lu.solve(&col)?;
        for (i, v) in solved.into_iter().enumerate() {
            out[(i, j)] = v;
        }
    }
    Ok(out)
}

/// `PropagateStateInverse`: advance the prior estimate and covariance
/// through the inverse model operator `A = B⁻¹`.
///
/// 1. `x ← B⁻¹·x` (one LU solve).
/// 2. `P ← A·P·Aᵀ` via two right-solves: `tmp ← B⁻¹·P`, then
///    `P ← (B⁻¹·tmpᵀ)ᵀ`.
/// 3. `P ← P + Q`, then symmetrized.
pub fn propagate_state_inverse(state: &mut KalmanState, model_lu: &Lu) -> Result<(), AmdadosError> {
    let x_vec: Vec<f64> = state.x.iter().copied().collect();
    let x_new = model_lu.solve(&x_vec)?;
    state.x = DVector::from_vec(x_new);

    let tmp = apply_inverse(model_lu, &state.p)?;
    let tmp_t = tmp.transpose();
    let step2 = apply_inverse(model_lu, &tmp_t)?;
    let mut p_new = step2.transpose();

    p_new += &state.q;
    symmetrize(&mut p_new);
    state.p = p_new;

    Ok(())
}

/// `SolveFilter`: posterior correction from the current observation
/// vector `z`. No-op contract when `m == 0` is enforced by the caller
/// (a subdomain with no sensors never invokes this).
///
/// 1. `y ← z − H·x`.
/// 2. `S ← H·P·Hᵀ + R`, symmetrized.
/// 3. Cholesky-factor `S`; premultiply `S⁻¹·y` by `P·Hᵀ`.
/// 4. `x ← x + P·Hᵀ·S⁻¹·y`.
/// 5. `P ← P − P·Hᵀ·S⁻¹·H·P`, symmetrized.
pub fn solve_filter(state: &mut KalmanState) -> Result<(), AmdadosError> {
    let innovation = &state.z - &state.h * &state.x;

    let h_t = state.h.transpose();
    let p_ht = &state.p * &h_t;
    let mut s = &state.h * &p_ht + &state.r;
    symmetrize(&mut s);

    let chol = nalgebra::linalg::Cholesky::new(s).ok_or_else(|| {
        AmdadosError::Factorization("Kalman innovation covariance S is not SPD".to_string())
    })?;

    let ky = chol.solve(&innovation);
    state.x += &p_ht * &ky;

    let kh = chol.solve(&(&state.h * &state.p));
    let correction = &p_ht * &kh;
    let mut p_new = &state.p - &correction;
    symmetrize(&mut p_new);
    state.p = p_new;

    Ok(())
}

/// `A ← (A + Aᵀ) / 2`, used to correct round-off asymmetry in the
/// covariance matrices after every propagation and correction step.
fn symmetrize(m: &mut DMatrix<f64>) {
    let n = m.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let avg = 0.5 * (m[(i, j)] + m[(j, i)]);
            m[(i, j)] = avg;
            m[(j, i)] = avg;
        }
    }
}
