// crates/amdados-io/src/sensors.rs

//! Loader for the per-simulation sensor coordinate file
//! (`sensors_Nx<Sx>_Ny<Sy>.txt`): whitespace-separated records
//! `(subdomain_ix, subdomain_iy, local_x, local_y)`.

use amdados_core::error::AmdadosError;
use std::fs;
use std::path::Path;

/// Flat row-major index of subdomain `(ix, iy)` on an `(Nx_sub, Ny_sub)`
/// lattice, `ix` outer, `iy` inner. Shared with the driver's lattice
/// indexing so sensor lists line up with the subdomain grid.
#[must_use]
pub const fn subdomain_flat_index(ix: usize, iy: usize, ny_sub: usize) -> usize {
    ix * ny_sub + iy
}

/// Load the sensor file into one ordered coordinate list per subdomain.
/// The returned vector has length `nx_sub * ny_sub`; subdomains with no
/// sensors get an empty list. Coordinates are validated to lie within
/// `[0, Sx) x [0, Sy)`.
pub fn load_sensors(
    path: &Path,
    nx_sub: usize,
    ny_sub: usize,
    sx: usize,
    sy: usize,
) -> Result<Vec<Vec<(usize, usize)>>, AmdadosError> {
    let text = fs::read_to_string(path)?;
    let mut lists = vec![Vec::new(); nx_sub * ny_sub];

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 4 {
            return Err(AmdadosError::InvalidInput(format!(
                "sensor file line {}: expected 4 fields, got {}",
                lineno + 1,
                fields.len()
            )));
        }

        let parse = |s: &str| -> Result<usize, AmdadosError> {
            s.parse::<usize>()
                .map_err(|e| AmdadosError::InvalidInput(format!("sensor file line {}: {e}", lineno + 1)))
        };
        let ix = parse(fields[0])?;
        let iy = parse(fields[1])?;
        let x = parse(fields[2])?;
        let y = parse(fields[3])?;

        if ix >= nx_sub || iy >= ny_sub {
            return Err(AmdadosError::InvalidInput(format!(
                "sensor file line {}: subdomain ({ix}, {iy}) out of range for {nx_sub}x{ny_sub} lattice",
                lineno + 1
            )));
        }
        if x >= sx || y >= sy {
            return Err(AmdadosError::InvalidInput(format!(
                "sensor file line {}: local coordinate ({x}, {y}) out of range for {sx}x{sy} subdomain",
                lineno + 1
            )));
        }

        lists[subdomain_flat_index(ix, iy, ny_sub)].push((x, y));
    }

    Ok(lists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_and_groups_sensors_by_subdomain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensors_Nx16_Ny16.txt");
        fs::write(&path, "0 0 3 4\n0 0 5 6\n1 0 2 2\n").unwrap();
        let lists = load_sensors(&path, 2, 1, 16, 16).unwrap();
        assert_eq!(lists[subdomain_flat_index(0, 0, 1)], vec![(3, 4), (5, 6)]);
        assert_eq!(lists[subdomain_flat_index(1, 0, 1)], vec![(2, 2)]);
    }

    #[test]
    fn rejects_out_of_range_local_coordinate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensors_Nx16_Ny16.txt");
        fs::write(&path, "0 0 99 99\n").unwrap();
        assert!(load_sensors(&path, 1, 1, 16, 16).is_err());
    }

    #[test]
    fn rejects_out_of_range_subdomain_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensors_Nx16_Ny16.txt");
        fs::write(&path, "5 5 1 1\n").unwrap();
        assert!(load_sensors(&path, 2, 2, 16, 16).is_err());
    }
}
