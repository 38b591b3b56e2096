// crates/amdados-grid/src/context.rs

//! Per-subdomain context: everything one lattice slot owns for the
//! lifetime of a simulation run.

use amdados_core::error::AmdadosError;
use amdados_core::linalg::{Lu, Matrix};
use amdados_kalman::KalmanState;
use nalgebra::DMatrix;

use crate::cell::{Resolution, Side, SubdomainCell};
use crate::model_matrix::{build_model_matrix, flat_index};
use crate::schwarz::BoundaryRecord;

/// Position of a subdomain on the `(Nx_sub, Ny_sub)` lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubdomainIdx {
    pub ix: usize,
    pub iy: usize,
}

/// Per-subdomain context owned exclusively by one lattice slot.
pub struct SubdomainContext {
    pub idx: SubdomainIdx,
    pub sx: usize,
    pub sy: usize,
    pub cell: SubdomainCell,
    /// `(Sx+2) x (Sy+2)` working matrix, halo included.
    pub field: Matrix,
    /// LU factorization of the current step's model matrix `B`.
    pub model_lu: Option<Lu>,
    /// `None` for subdomains with no sensors: those never take the
    /// Kalman branch.
    pub kalman: Option<KalmanState>,
    pub sensors: Vec<(usize, usize)>,
    pub nt: usize,
    pub nsub_iter: usize,
    pub flow: (f64, f64),
    pub boundary: BoundaryRecord,
}

impl SubdomainContext {
    /// Allocate a fresh context. `ini_var` seeds the Kalman process
    /// covariance's diagonal magnitude and `ini_covar_radius` its
    /// spatial correlation length (see [`initial_covariance`]) for
    /// subdomains that have at least one sensor; subdomains without
    /// sensors get `kalman = None` and always take the direct-solve
    /// branch.
    #[must_use]
    pub fn new(
        idx: SubdomainIdx,
        sx: usize,
        sy: usize,
        nt: usize,
        nsub_iter: usize,
        sensors: Vec<(usize, usize)>,
        ini_var: f64,
        ini_covar_radius: f64,
    ) -> Self {
        let n = (sx + 2) * (sy + 2);
        let kalman = if sensors.is_empty() {
            None
        } else {
            let m = sensors.len();
            let mut state = KalmanState::new(n, m, ini_var);
            state.p = initial_covariance(sx, sy, ini_var, ini_covar_radius);
            state.h = assemble_observation_operator(&sensors, sx, sy);
            Some(state)
        };

        let active = if sensors.is_empty() { Resolution::Coarse } else { Resolution::Fine };

        Self {
            idx,
            sx,
            sy,
            cell: SubdomainCell::new(sx, sy, active),
            field: Matrix::zeros(sx + 2, sy + 2),
            model_lu: None,
            kalman,
            sensors,
            nt,
            nsub_iter,
            flow: (0.0, 0.0),
            boundary: BoundaryRecord::default(),
        }
    }

    #[must_use]
    pub fn has_sensors(&self) -> bool {
        self.kalman.is_some()
    }

    /// Whether `side` lies on the outer face of a `(nx_sub, ny_sub)`
    /// lattice for this subdomain's position.
    #[must_use]
    pub fn is_outer(&self, side: Side, nx_sub: usize, ny_sub: usize) -> bool {
        match side {
            Side::Up => self.idx.ix == 0,
            Side::Down => self.idx.ix + 1 == nx_sub,
            Side::Left => self.idx.iy == 0,
            Side::Right => self.idx.iy + 1 == ny_sub,
        }
    }

    /// Rebuild the model matrix `B` for the given flow/step and
    /// re-factor it, replacing the stored LU scratch.
    pub fn rebuild_model_matrix(
        &mut self,
        dx: f64,
        dy: f64,
        d: f64,
        dt: f64,
    ) -> Result<(), AmdadosError> {
        let (vx, vy) = self.flow;
        let b = build_model_matrix(self.sx, self.sy, dx, dy, d, dt, vx, vy);
        self.model_lu = Some(Lu::new(&b)?);
        Ok(())
    }

    /// Copy the extended working field into a flat row-major vector
    /// (inner index `y`), matching the model matrix's unrolling.
    #[must_use]
    pub fn flatten_field(&self) -> Vec<f64> {
        self.field.as_slice().to_vec()
    }

    /// Overwrite the extended working field from a flat row-major
    /// vector produced the same way as `flatten_field`.
    pub fn unflatten_into_field(&mut self, values: &[f64]) -> Result<(), AmdadosError> {
        if values.len() != self.field.as_slice().len() {
            return Err(AmdadosError::InvalidInput(format!(
                "field vector length {} does not match extended shape",
                values.len()
            )));
        }
        self.field.as_mut_slice().copy_from_slice(values);
        Ok(())
    }

    /// Direct-solve branch: `field ← B⁻¹·field`, one LU solve over the
    /// flattened extended field.
    pub fn direct_solve(&mut self) -> Result<(), AmdadosError> {
        let lu = self
            .model_lu
            .as_ref()
            .ok_or_else(|| AmdadosError::InvalidInput("model matrix not built".to_string()))?;
        let rhs = self.flatten_field();
        let solved = lu.solve(&rhs)?;
        self.unflatten_into_field(&solved)
    }

    /// Kalman prior step: propagate `x`/`P` through the current `B`,
    /// then copy `x` back into the extended working field.
    pub fn propagate_prior(&mut self) -> Result<(), AmdadosError> {
        let lu = self
            .model_lu
            .as_ref()
            .ok_or_else(|| AmdadosError::InvalidInput("model matrix not built".to_string()))?;
        let kalman = self
            .kalman
            .as_mut()
            .ok_or_else(|| AmdadosError::InvalidInput("subdomain has no sensors".to_string()))?;
        amdados_kalman::propagate_state_inverse(kalman, lu)?;
        let x: Vec<f64> = kalman.x.iter().copied().collect();
        self.unflatten_into_field(&x)
    }

    /// Kalman posterior step: fold `z` into `x`/`P`, then copy `x` back
    /// into the extended working field.
    pub fn correct_posterior(&mut self) -> Result<(), AmdadosError> {
        let kalman = self
            .kalman
            .as_mut()
            .ok_or_else(|| AmdadosError::InvalidInput("subdomain has no sensors".to_string()))?;
        let field_vec = self.field.as_slice().to_vec();
        kalman.x = nalgebra::DVector::from_vec(field_vec);
        amdados_kalman::solve_filter(kalman)?;
        let x: Vec<f64> = kalman.x.iter().copied().collect();
        self.unflatten_into_field(&x)
    }

    /// This subdomain's interior border strip facing `side`, used by a
    /// neighbor's Schwarz update on the opposite side. Always read at
    /// fine resolution regardless of this subdomain's active layer, so
    /// a sensor-less (`Coarse`-active) neighbor still hands out
    /// full-resolution border data.
    #[must_use]
    pub fn interior_border(&self, side: Side) -> Vec<f64> {
        self.cell.fine_boundary(side)
    }

    /// Copy the extended field's interior (excluding halo) into the
    /// fine cell layer, unconditionally of which layer is active: the
    /// fine layer is the single source of truth for the working field,
    /// and the coarse layer is subsequently re-derived from it via
    /// `coarsen`.
    pub fn sync_cell_from_field(&mut self) {
        for x in 0..self.sx {
            for y in 0..self.sy {
                let v = self.field.get(x + 1, y + 1);
                self.cell.set_fine(x, y, v);
            }
        }
    }

    /// Copy the active cell layer back into the extended field's
    /// interior, leaving the halo untouched.
    pub fn sync_field_from_cell(&mut self) {
        for x in 0..self.sx {
            for y in 0..self.sy {
                let v = self.cell.get(x, y);
                self.field.set(x + 1, y + 1, v);
            }
        }
    }
}

/// Assemble the observation operator `H`: row `k` has a single `1` at
/// the flat index of the `k`-th sensor within the extended-subdomain
/// indexing, i.e. `(x+1, y+1)`.
#[must_use]
pub fn assemble_observation_operator(sensors: &[(usize, usize)], sx: usize, sy: usize) -> DMatrix<f64> {
    let sy_ext = sy + 2;
    let n = (sx + 2) * sy_ext;
    let m = sensors.len();
    let mut h = DMatrix::zeros(m, n);
    for (k, &(x, y)) in sensors.iter().enumerate() {
        let col = flat_index(x + 1, y + 1, sy_ext);
        h[(k, col)] = 1.0;
    }
    h
}

/// Initial process covariance over the extended `(Sx+2)x(Sy+2)` state:
/// a Gaussian-correlated prior, `P[i,j] = ini_var * exp(-d(i,j)^2 /
/// (2*radius^2))`, where `d` is Euclidean distance between grid points
/// `i` and `j` in the extended-subdomain indexing. A non-positive
/// radius collapses this to the uncorrelated `ini_var * I` diagonal.
#[must_use]
pub fn initial_covariance(sx: usize, sy: usize, ini_var: f64, radius: f64) -> DMatrix<f64> {
    let sy_ext = sy + 2;
    let sx_ext = sx + 2;
    let n = sx_ext * sy_ext;
    let mut p = DMatrix::zeros(n, n);

    if radius <= 0.0 {
        for i in 0..n {
            p[(i, i)] = ini_var;
        }
        return p;
    }

    let coord = |i: usize| -> (f64, f64) { ((i / sy_ext) as f64, (i % sy_ext) as f64) };
    let denom = 2.0 * radius * radius;
    for i in 0..n {
        let (xi, yi) = coord(i);
        for j in 0..n {
            let (xj, yj) = coord(j);
            let d2 = (xi - xj) * (xi - xj) + (yi - yj) * (yi - yj);
            p[(i, j)] = ini_var * (-d2 / denom).exp();
        }
    }
    p
}
