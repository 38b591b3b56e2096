// crates/amdados-io/src/config.rs

//! Loader for the key-value simulation configuration file.
//!
//! Format: one `key value` pair per line, whitespace-separated (an `=`
//! between key and value is also accepted); blank lines and lines
//! starting with `#` are ignored.

use amdados_core::config::SimulationConfig;
use amdados_core::error::AmdadosError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

type RawConfig = HashMap<String, String>;

fn parse_raw(text: &str) -> RawConfig {
    let mut map = RawConfig::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.replace('=', " ");
        let mut parts = line.splitn(2, char::is_whitespace);
        let Some(key) = parts.next() else { continue };
        let Some(value) = parts.next() else { continue };
        map.insert(key.trim().to_string(), value.trim().to_string());
    }
    map
}

fn get_str<'a>(raw: &'a RawConfig, key: &str) -> Result<&'a str, AmdadosError> {
    raw.get(key)
        .map(String::as_str)
        .ok_or_else(|| AmdadosError::InvalidInput(format!("missing configuration key: {key}")))
}

fn get_f64(raw: &RawConfig, key: &str) -> Result<f64, AmdadosError> {
    get_str(raw, key)?
        .parse::<f64>()
        .map_err(|e| AmdadosError::InvalidInput(format!("key {key}: {e}")))
}

fn get_usize(raw: &RawConfig, key: &str) -> Result<usize, AmdadosError> {
    get_str(raw, key)?
        .parse::<usize>()
        .map_err(|e| AmdadosError::InvalidInput(format!("key {key}: {e}")))
}

/// Parse and validate a key-value configuration file into a
/// `SimulationConfig`.
pub fn load_config(path: &Path) -> Result<SimulationConfig, AmdadosError> {
    let text = fs::read_to_string(path)?;
    let raw = parse_raw(&text);

    let cfg = SimulationConfig {
        diffusion_coef: get_f64(&raw, "diffusion_coef")?,
        num_subdomains_x: get_usize(&raw, "num_subdomains_x")?,
        num_subdomains_y: get_usize(&raw, "num_subdomains_y")?,
        subdomain_x: get_usize(&raw, "subdomain_x")?,
        subdomain_y: get_usize(&raw, "subdomain_y")?,
        domain_size_x: get_f64(&raw, "domain_size_x")?,
        domain_size_y: get_f64(&raw, "domain_size_y")?,
        integration_period: get_f64(&raw, "integration_period")?,
        integration_nsteps: get_usize(&raw, "integration_nsteps")?,
        flow_model_max_vx: get_f64(&raw, "flow_model_max_vx")?,
        flow_model_max_vy: get_f64(&raw, "flow_model_max_vy")?,
        model_ini_var: get_f64(&raw, "model_ini_var")?,
        model_ini_covar_radius: get_f64(&raw, "model_ini_covar_radius")?,
        model_noise_q: get_f64(&raw, "model_noise_Q")?,
        model_noise_r: get_f64(&raw, "model_noise_R")?,
        schwarz_num_iters: get_usize(&raw, "schwarz_num_iters")?,
        write_num_fields: get_usize(&raw, "write_num_fields")?,
        output_dir: get_str(&raw, "output_dir")?.to_string(),
    };

    if cfg.num_subdomains_x < 1 || cfg.num_subdomains_y < 1 {
        return Err(AmdadosError::InvalidInput(
            "num_subdomains_x/y must be >= 1".to_string(),
        ));
    }
    if cfg.subdomain_x < 3 || cfg.subdomain_y < 3 {
        return Err(AmdadosError::InvalidInput(
            "subdomain_x/y must be >= 3".to_string(),
        ));
    }
    if cfg.schwarz_num_iters < 1 {
        return Err(AmdadosError::InvalidInput(
            "schwarz_num_iters must be >= 1".to_string(),
        ));
    }
    if cfg.write_num_fields < 2 {
        return Err(AmdadosError::InvalidInput(
            "write_num_fields must be >= 2".to_string(),
        ));
    }

    Ok(cfg)
}
