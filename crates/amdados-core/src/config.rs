// crates/amdados-core/src/config.rs

//! Simulation configuration and the startup-time derivation of spatial and
//! temporal step sizes.
//!
//! Parsing the key-value configuration file itself lives in `amdados-io`
//! (it is an I/O boundary concern); this module owns the validated,
//! strongly-typed value and the formulas that turn it into `dx`, `dy`,
//! `dt`, and `Nt`.

use crate::error::AmdadosError;

/// Small epsilon guarding the flow-speed and diffusion terms in the `dt`
/// stability bound against division by zero when `D` or the flow speed
/// is zero.
const STABILITY_EPS: f64 = 1e-10;

/// Validated simulation configuration, as read from the key-value config
/// file plus the compile-time subdomain shape.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    pub diffusion_coef: f64,
    pub num_subdomains_x: usize,
    pub num_subdomains_y: usize,
    pub subdomain_x: usize,
    pub subdomain_y: usize,
    pub domain_size_x: f64,
    pub domain_size_y: f64,
    pub integration_period: f64,
    pub integration_nsteps: usize,
    pub flow_model_max_vx: f64,
    pub flow_model_max_vy: f64,
    pub model_ini_var: f64,
    pub model_ini_covar_radius: f64,
    pub model_noise_q: f64,
    pub model_noise_r: f64,
    pub schwarz_num_iters: usize,
    pub write_num_fields: usize,
    pub output_dir: String,
}

/// Quantities derived from `SimulationConfig` at startup: spatial steps,
/// the stability-bounded time step, and the resulting step count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DerivedQuantities {
    pub dx: f64,
    pub dy: f64,
    pub dt: f64,
    pub nt: usize,
}

impl SimulationConfig {
    /// Validate that the compile-time subdomain shape matches the
    /// configured one. The shape is a const generic / compile-time
    /// parameter on the caller's side; this just checks agreement.
    pub fn check_subdomain_shape(&self, sx: usize, sy: usize) -> Result<(), AmdadosError> {
        if self.subdomain_x != sx || self.subdomain_y != sy {
            return Err(AmdadosError::ConfigMismatch(format!(
                "configured subdomain shape {}x{} does not match compiled shape {}x{}",
                self.subdomain_x, self.subdomain_y, sx, sy
            )));
        }
        Ok(())
    }

    /// Derive `dx`, `dy`, `dt`, `Nt` from this configuration.
    ///
    /// `dt` is the minimum of three bounds: the nominal step implied by
    /// `integration_period / integration_nsteps`, the diffusive CFL
    /// bound, and the advective CFL bound. A non-positive result is a
    /// `StabilityViolation`: it means the configuration describes a grid
    /// too coarse, or too fast-flowing, to integrate at all.
    pub fn derive(&self) -> Result<DerivedQuantities, AmdadosError> {
        if self.diffusion_coef < 0.0 {
            return Err(AmdadosError::InvalidInput(format!(
                "diffusion_coef must be >= 0, got {}",
                self.diffusion_coef
            )));
        }

        let nx_sub = self.num_subdomains_x;
        let ny_sub = self.num_subdomains_y;
        let sx = self.subdomain_x;
        let sy = self.subdomain_y;

        let dx = self.domain_size_x / ((nx_sub * sx - 1) as f64);
        let dy = self.domain_size_y / ((ny_sub * sy - 1) as f64);

        let nominal = self.integration_period / (self.integration_nsteps as f64);
        let diffusive = (dx * dx).min(dy * dy) / (2.0 * self.diffusion_coef + STABILITY_EPS);
        let advective = 1.0
            / (self.flow_model_max_vx.abs() / dx
                + self.flow_model_max_vy.abs() / dy
                + STABILITY_EPS);

        let dt = nominal.min(diffusive).min(advective);
        if dt <= 0.0 {
            return Err(AmdadosError::Stability(format!("{dt}")));
        }

        let nt = (self.integration_period / dt).ceil() as usize;

        Ok(DerivedQuantities { dx, dy, dt, nt })
    }
}

/// vx(t) = -max_vx * sin(0.1 * t/Nt - pi); vy(t) = -max_vy * sin(0.2 * t/Nt - pi).
///
/// Frozen for reproducibility: do not add phase or amplitude parameters.
#[must_use]
pub fn flow_velocity(max_vx: f64, max_vy: f64, t: usize, nt: usize) -> (f64, f64) {
    let frac = (t as f64) / (nt as f64);
    let vx = -max_vx * (0.1 * frac - std::f64::consts::PI).sin();
    let vy = -max_vy * (0.2 * frac - std::f64::consts::PI).sin();
    (vx, vy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> SimulationConfig {
        SimulationConfig {
            diffusion_coef: 1.0,
            num_subdomains_x: 2,
            num_subdomains_y: 2,
            subdomain_x: 16,
            subdomain_y: 16,
            domain_size_x: 31.0,
            domain_size_y: 31.0,
            integration_period: 10.0,
            integration_nsteps: 1000,
            flow_model_max_vx: 1.0,
            flow_model_max_vy: 0.0,
            model_ini_var: 1.0,
            model_ini_covar_radius: 2.0,
            model_noise_q: 1e-4,
            model_noise_r: 1e-2,
            schwarz_num_iters: 3,
            write_num_fields: 11,
            output_dir: "out".to_string(),
        }
    }

    #[test]
    fn derive_rejects_subdomain_mismatch() {
        let cfg = base_config();
        assert!(cfg.check_subdomain_shape(8, 8).is_err());
        assert!(cfg.check_subdomain_shape(16, 16).is_ok());
    }

    #[test]
    fn derive_produces_positive_dt_and_nt() {
        let cfg = base_config();
        let derived = cfg.derive().unwrap();
        assert!(derived.dt > 0.0);
        assert!(derived.nt >= 1);
        assert!((derived.dx - 31.0 / 31.0).abs() < 1e-9);
    }

    #[test]
    fn derive_rejects_negative_diffusion() {
        let mut cfg = base_config();
        cfg.diffusion_coef = -1.0;
        assert!(cfg.derive().is_err());
    }

    #[test]
    fn flow_velocity_is_frozen_formula() {
        let (vx, vy) = flow_velocity(2.0, 3.0, 0, 100);
        let expected_vx = -2.0 * (0.0 - std::f64::consts::PI).sin();
        let expected_vy = -3.0 * (0.0 - std::f64::consts::PI).sin();
        assert!((vx - expected_vx).abs() < 1e-12);
        assert!((vy - expected_vy).abs() < 1e-12);
    }
}
