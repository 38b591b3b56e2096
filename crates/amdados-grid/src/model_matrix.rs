// crates/amdados-grid/src/model_matrix.rs

//! Builds the inverse implicit-Euler operator `B` over the extended
//! `(Sx+2)×(Sy+2)` subdomain, unrolled row-major with the inner index
//! varying over `y`.

use amdados_core::linalg::Matrix;

/// Flat index of extended-subdomain point `(x, y)` given the extended
/// column count `sy + 2` (inner index is `y`).
#[inline]
#[must_use]
pub const fn flat_index(x: usize, y: usize, sy_ext: usize) -> usize {
    x * sy_ext + y
}

/// Build the dense implicit-Euler operator `B` for a subdomain of
/// interior shape `(sx, sy)`, spatial steps `(dx, dy)`, diffusion
/// coefficient `d`, effective time step `dt`, and current flow `(vx,
/// vy)`.
///
/// Halo rows (`x == 0`, `x == sx+1`, `y == 0`, `y == sy+1`) are identity
/// rows: the model matrix passes border values through unchanged, since
/// the halo is filled by the Schwarz exchange, not by the PDE operator.
/// Interior rows carry the five-point advection-diffusion stencil.
#[must_use]
pub fn build_model_matrix(sx: usize, sy: usize, dx: f64, dy: f64, d: f64, dt: f64, vx: f64, vy: f64) -> Matrix {
    let sx_ext = sx + 2;
    let sy_ext = sy + 2;
    let n = sx_ext * sy_ext;

    let rho_x = d * dt / (dx * dx);
    let rho_y = d * dt / (dy * dy);
    let alpha_x = vx * dt / (2.0 * dx);
    let alpha_y = vy * dt / (2.0 * dy);

    let mut b = Matrix::zeros(n, n);

    for x in 0..sx_ext {
        for y in 0..sy_ext {
            let i = flat_index(x, y, sy_ext);
            let is_halo = x == 0 || x == sx_ext - 1 || y == 0 || y == sy_ext - 1;

            if is_halo {
                b.set(i, i, 1.0);
                continue;
            }

            b.set(i, i, 1.0 + 2.0 * (rho_x + rho_y));
            b.set(i, flat_index(x - 1, y, sy_ext), -alpha_x - rho_x);
            b.set(i, flat_index(x + 1, y, sy_ext), alpha_x - rho_x);
            b.set(i, flat_index(x, y - 1, sy_ext), -alpha_y - rho_y);
            b.set(i, flat_index(x, y + 1, sy_ext), alpha_y - rho_y);
        }
    }

    b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halo_rows_are_identity() {
        let b = build_model_matrix(4, 4, 1.0, 1.0, 1.0, 0.01, 0.0, 0.0);
        let sy_ext = 6;
        let i = flat_index(0, 2, sy_ext);
        for j in 0..b.cols() {
            let expected = if j == i { 1.0 } else { 0.0 };
            assert!((b.get(i, j) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn interior_row_diagonal_dominance_holds() {
        let b = build_model_matrix(6, 6, 0.5, 0.5, 1.0, 0.05, 0.3, -0.2);
        let sy_ext = 8;
        let i = flat_index(3, 3, sy_ext);
        let diag = b.get(i, i).abs();
        let off_sum: f64 = (0..b.cols())
            .filter(|&j| j != i)
            .map(|j| b.get(i, j).abs())
            .sum();
        assert!(diag >= off_sum);
    }

    #[test]
    fn zero_flow_gives_symmetric_diffusion_stencil() {
        let b = build_model_matrix(4, 4, 1.0, 1.0, 1.0, 0.01, 0.0, 0.0);
        let sy_ext = 6;
        let i = flat_index(2, 2, sy_ext);
        let left = b.get(i, flat_index(1, 2, sy_ext));
        let right = b.get(i, flat_index(3, 2, sy_ext));
        assert!((left - right).abs() < 1e-12);
    }
}
