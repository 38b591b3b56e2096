// crates/amdados-io/src/observations.rs

//! Loader for the synthetic observation file
//! (`analytic_Nx<..>_Ny<..>_Nt<..>.txt`) and the per-subdomain
//! measurement table it is distilled into.

use amdados_core::error::AmdadosError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::sensors::subdomain_flat_index;

/// Per-subdomain measurement table: `per_subdomain[sub_idx][t_step]` is
/// the observation vector `z` for that subdomain at that time step, in
/// the same sensor order as the sensor list it was built from.
#[derive(Clone, Debug)]
pub struct ObservationTable {
    pub nt: usize,
    pub physical_time: Vec<f64>,
    pub per_subdomain: Vec<Vec<Vec<f64>>>,
}

struct Tokens<'a> {
    iter: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self { iter: text.split_whitespace() }
    }

    fn next_token(&mut self) -> Result<&'a str, AmdadosError> {
        self.iter
            .next()
            .ok_or_else(|| AmdadosError::InvalidInput("observation file ended unexpectedly".to_string()))
    }

    fn next_usize(&mut self) -> Result<usize, AmdadosError> {
        self.next_token()?
            .parse::<usize>()
            .map_err(|e| AmdadosError::InvalidInput(format!("observation file: {e}")))
    }

    fn next_f64(&mut self) -> Result<f64, AmdadosError> {
        self.next_token()?
            .parse::<f64>()
            .map_err(|e| AmdadosError::InvalidInput(format!("observation file: {e}")))
    }
}

/// Load the observation file and distill it into `nt_expected`
/// per-subdomain measurement tables, one row per time step and one
/// column per sensor (in sensor-list order).
///
/// Verifies the global triple count and the `(global_x outer, global_y
/// inner)` ordering contract; any deviation is `InvalidInput`.
pub fn load_observations(
    path: &Path,
    nx_sub: usize,
    ny_sub: usize,
    sx: usize,
    sy: usize,
    sensors: &[Vec<(usize, usize)>],
    nt_expected: usize,
) -> Result<ObservationTable, AmdadosError> {
    let text = fs::read_to_string(path)?;
    let mut tokens = Tokens::new(&text);

    let global_x = nx_sub * sx;
    let global_y = ny_sub * sy;

    // Per-subdomain lookup from local sensor coordinate to its column
    // index in the measurement table.
    let lookups: Vec<HashMap<(usize, usize), usize>> = sensors
        .iter()
        .map(|list| {
            list.iter()
                .enumerate()
                .map(|(k, &(x, y))| ((x, y), k))
                .collect()
        })
        .collect();

    let mut physical_time = Vec::with_capacity(nt_expected);
    let mut per_subdomain: Vec<Vec<Vec<f64>>> = sensors
        .iter()
        .map(|list| vec![vec![0.0; list.len()]; nt_expected])
        .collect();

    for t_step in 0..nt_expected {
        let t_idx = tokens.next_usize()?;
        if t_idx != t_step {
            return Err(AmdadosError::InvalidInput(format!(
                "observation file: expected time index {t_step}, found {t_idx}"
            )));
        }
        let t_phys = tokens.next_f64()?;
        physical_time.push(t_phys);

        for x in 0..global_x {
            for y in 0..global_y {
                let gx = tokens.next_usize()?;
                let gy = tokens.next_usize()?;
                let value = tokens.next_f64()?;

                if gx != x || gy != y {
                    return Err(AmdadosError::InvalidInput(format!(
                        "observation file: expected point ({x}, {y}) at t={t_step}, found ({gx}, {gy})"
                    )));
                }

                let ix = x / sx;
                let local_x = x % sx;
                let iy = y / sy;
                let local_y = y % sy;
                let sub_idx = subdomain_flat_index(ix, iy, ny_sub);

                if let Some(&k) = lookups[sub_idx].get(&(local_x, local_y)) {
                    per_subdomain[sub_idx][t_step][k] = value;
                }
            }
        }
    }

    Ok(ObservationTable { nt: nt_expected, physical_time, per_subdomain })
}
