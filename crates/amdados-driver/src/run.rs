// crates/amdados-driver/src/run.rs

//! The outer time loop: per-tick flow computation, parallel
//! per-subdomain dispatch between the Kalman and direct-solve branches,
//! and snapshot emission.

use std::sync::Mutex;

use amdados_core::config::{flow_velocity, DerivedQuantities, SimulationConfig};
use amdados_core::error::AmdadosError;
use amdados_grid::{
    clamp_non_negative, clamp_outer_dirichlet, schwarz_update, Resolution, SchwarzVariant, Side,
    SubdomainContext, SubdomainIdx,
};
use amdados_io::observations::ObservationTable;
use amdados_io::result_stream::ResultStream;
use nalgebra::{DMatrix, DVector};
use tracing::info;

use crate::profile::AverageProfile;
use crate::runner::GridRunner;
use crate::schedule::Schedule;

/// Everything `run_simulation` needs that isn't recomputed internally:
/// validated configuration, its derived quantities, the lattice shape,
/// per-subdomain sensor lists, an optional pre-loaded observation
/// table (absent only in tests that exercise the direct-solve branch
/// alone), the Schwarz variant, and the output sink.
pub struct RunInputs<'a> {
    pub config: &'a SimulationConfig,
    pub derived: DerivedQuantities,
    pub nx_sub: usize,
    pub ny_sub: usize,
    pub sx: usize,
    pub sy: usize,
    pub sensors: Vec<Vec<(usize, usize)>>,
    pub observations: Option<ObservationTable>,
    pub schwarz_variant: SchwarzVariant,
    pub result_stream: &'a ResultStream,
}

fn subdomain_index(ix: usize, iy: usize, ny_sub: usize) -> usize {
    ix * ny_sub + iy
}

/// Borrow a subdomain's Kalman state, failing fast if called on a
/// sensor-less subdomain (a programming error: only the Kalman branch
/// ever calls this).
fn kalman_state_mut(ctx: &mut SubdomainContext) -> Result<&mut amdados_kalman::KalmanState, AmdadosError> {
    ctx.kalman
        .as_mut()
        .ok_or_else(|| AmdadosError::InvalidInput("subdomain has no sensors".to_string()))
}

fn neighbor_index(ix: usize, iy: usize, side: Side, nx_sub: usize, ny_sub: usize) -> Option<usize> {
    let (nix, niy) = match side {
        Side::Up => (ix.checked_sub(1)?, iy),
        Side::Down => (ix + 1, iy),
        Side::Left => (ix, iy.checked_sub(1)?),
        Side::Right => (ix, iy + 1),
    };
    if nix >= nx_sub || niy >= ny_sub {
        return None;
    }
    Some(subdomain_index(nix, niy, ny_sub))
}

/// Run the full simulation: `Nt * Nsub_iter` logical ticks over every
/// subdomain, snapshot emission at the selected `t_step` values,
/// returning the accumulated Schwarz diagnostic profile.
pub fn run_simulation(inputs: &RunInputs<'_>, runner: &dyn GridRunner) -> Result<AverageProfile, AmdadosError> {
    let RunInputs {
        config,
        derived,
        nx_sub,
        ny_sub,
        sx,
        sy,
        sensors,
        observations,
        schwarz_variant,
        result_stream,
    } = inputs;

    let n_sub = nx_sub * ny_sub;
    let schedule = Schedule::new(derived.nt, config.schwarz_num_iters, config.write_num_fields);

    let mut contexts: Vec<Mutex<SubdomainContext>> = Vec::with_capacity(n_sub);
    for ix in 0..*nx_sub {
        for iy in 0..*ny_sub {
            let idx = SubdomainIdx { ix, iy };
            let sensor_list = sensors[subdomain_index(ix, iy, *ny_sub)].clone();
            let ctx = SubdomainContext::new(
                idx,
                *sx,
                *sy,
                derived.nt,
                config.schwarz_num_iters,
                sensor_list,
                config.model_ini_var,
                config.model_ini_covar_radius,
            );
            contexts.push(Mutex::new(ctx));
        }
    }

    let profile = Mutex::new(AverageProfile::new());
    let error_slot: Mutex<Option<AmdadosError>> = Mutex::new(None);

    for t in 0..schedule.total_ticks() {
        let (t_step, sub) = schedule.decompose(t);
        let (vx, vy) = flow_velocity(config.flow_model_max_vx, config.flow_model_max_vy, t_step, derived.nt);

        // Snapshot every subdomain's interior border strips from the
        // state at the start of this tick, before any mutation, so
        // neighbor reads never observe a partially updated neighbor.
        let borders: Vec<[Vec<f64>; 4]> = (0..n_sub)
            .map(|i| {
                let ctx = contexts[i].lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                Side::all().map(|side| ctx.interior_border(side))
            })
            .collect();

        let tick_body = |i: usize| {
            let ix = i / ny_sub;
            let iy = i % ny_sub;
            let mut ctx = contexts[i].lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            ctx.flow = (vx, vy);

            let outcome = run_one_subdomain(
                &mut ctx,
                ix,
                iy,
                *nx_sub,
                *ny_sub,
                derived,
                config,
                sub,
                t_step,
                *schwarz_variant,
                observations.as_ref(),
                i,
                &borders,
            );

            match outcome {
                Ok(Some(record)) => profile.lock().unwrap_or_else(std::sync::PoisonError::into_inner).record(t, &record),
                Ok(None) => {}
                Err(e) => {
                    let mut slot = error_slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                }
            }
        };
        runner.for_each_subdomain(n_sub, &tick_body);

        if let Some(e) = error_slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner).take() {
            return Err(e);
        }

        if schedule.is_snapshot(t_step, sub) {
            emit_snapshot(&contexts, *nx_sub, *ny_sub, *sx, *sy, t_step, result_stream)?;
        }
    }

    result_stream.flush()?;
    let final_profile = profile.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner);
    info!(
        mean_rel_diff = final_profile.mean(),
        max_rel_diff = final_profile.max(),
        max_at_step = final_profile.max_at_step(),
        samples = final_profile.samples(),
        "simulation complete"
    );
    Ok(final_profile)
}

#[allow(clippy::too_many_arguments)]
fn run_one_subdomain(
    ctx: &mut SubdomainContext,
    ix: usize,
    iy: usize,
    nx_sub: usize,
    ny_sub: usize,
    derived: &DerivedQuantities,
    config: &SimulationConfig,
    sub: usize,
    t_step: usize,
    schwarz_variant: SchwarzVariant,
    observations: Option<&ObservationTable>,
    flat_idx: usize,
    borders: &[[Vec<f64>; 4]],
) -> Result<Option<amdados_grid::BoundaryRecord>, AmdadosError> {
    let is_outer = |side: Side| ctx.is_outer(side, nx_sub, ny_sub);

    if ctx.has_sensors() {
        if sub == 0 {
            ctx.rebuild_model_matrix(derived.dx, derived.dy, config.diffusion_coef, derived.dt)?;

            if let Some(table) = observations {
                let z = table.per_subdomain[flat_idx][t_step].clone();
                kalman_state_mut(ctx)?.z = DVector::from_vec(z);
            }

            let kalman = kalman_state_mut(ctx)?;
            let n = kalman.state_dim();
            let m = kalman.obs_dim();
            kalman.q = DMatrix::identity(n, n) * config.model_noise_q;
            kalman.r = DMatrix::identity(m, m) * config.model_noise_r;

            ctx.propagate_prior()?;
        }

        ctx.correct_posterior()?;
        clamp_outer_dirichlet(&mut ctx.field, is_outer);
        clamp_non_negative(&mut ctx.field);
        ctx.sync_cell_from_field();
        ctx.cell.coarsen(|v| v);
        ctx.cell.set_active_layer(Resolution::Fine);

        Ok(None)
    } else {
        let dt_sub = derived.dt / (config.schwarz_num_iters as f64);
        ctx.rebuild_model_matrix(derived.dx, derived.dy, config.diffusion_coef, dt_sub)?;
        ctx.direct_solve()?;

        let neighbor_strip = |side: Side| -> Vec<f64> {
            neighbor_index(ix, iy, side, nx_sub, ny_sub)
                .map(|n_idx| borders[n_idx][side.opposite().index()].clone())
                .unwrap_or_default()
        };
        let record = schwarz_update(&mut ctx.field, ctx.flow, schwarz_variant, is_outer, neighbor_strip);
        ctx.boundary = record;

        clamp_outer_dirichlet(&mut ctx.field, is_outer);
        clamp_non_negative(&mut ctx.field);
        ctx.sync_cell_from_field();
        ctx.cell.coarsen(|v| v);
        ctx.cell.set_active_layer(Resolution::Coarse);

        Ok(Some(record))
    }
}

fn emit_snapshot(
    contexts: &[Mutex<SubdomainContext>],
    nx_sub: usize,
    ny_sub: usize,
    sx: usize,
    sy: usize,
    t_step: usize,
    result_stream: &ResultStream,
) -> Result<(), AmdadosError> {
    for ix in 0..nx_sub {
        for iy in 0..ny_sub {
            let i = subdomain_index(ix, iy, ny_sub);
            let ctx = contexts[i].lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let mut records = Vec::with_capacity(sx * sy);
            ctx.cell.for_all_fine_nodes(|x, y, value| {
                let gx = ix * sx + x;
                let gy = iy * sy + y;
                records.push((t_step, gx, gy, value));
            });
            result_stream.append_many(&records)?;
        }
    }
    Ok(())
}
