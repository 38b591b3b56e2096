//! Full small-scale driver runs exercising scenarios that need the real
//! outer time loop rather than a single subdomain's update logic.

use amdados_core::config::SimulationConfig;
use amdados_driver::runner::SequentialRunner;
use amdados_driver::run::RunInputs;
use amdados_grid::SchwarzVariant;
use amdados_io::result_stream::ResultStream;
use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::BTreeSet;
use std::io::Cursor;

fn config(write_num_fields: usize, nsteps: usize, nsub_iter: usize) -> SimulationConfig {
    SimulationConfig {
        diffusion_coef: 1.0,
        num_subdomains_x: 1,
        num_subdomains_y: 1,
        subdomain_x: 4,
        subdomain_y: 4,
        domain_size_x: 3.0,
        domain_size_y: 3.0,
        integration_period: 1.0,
        integration_nsteps: nsteps,
        flow_model_max_vx: 0.0,
        flow_model_max_vy: 0.0,
        model_ini_var: 1.0,
        model_ini_covar_radius: 1.0,
        model_noise_q: 1e-4,
        model_noise_r: 1e-2,
        schwarz_num_iters: nsub_iter,
        write_num_fields,
        output_dir: "out".to_string(),
    }
}

/// Snapshot selection: with `Nt=100`-ish steps and `Nwrite=11` requested
/// fields, the result stream ends up carrying exactly 11 distinct time
/// indices, each a 16-byte-aligned `(t, x, y, value)` record batch.
#[test]
fn snapshot_selection_emits_the_configured_field_count() {
    let config = config(11, 100, 3);
    let derived = config.derive().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("field.bin");
    let stream = ResultStream::create(&path).unwrap();

    let inputs = RunInputs {
        config: &config,
        derived,
        nx_sub: 1,
        ny_sub: 1,
        sx: 4,
        sy: 4,
        sensors: vec![vec![]],
        observations: None,
        schwarz_variant: SchwarzVariant::MirrorInterior,
        result_stream: &stream,
    };

    amdados_driver::run_simulation(&inputs, &SequentialRunner).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len() % 16, 0, "result stream is not a whole number of 16-byte records");

    let mut cursor = Cursor::new(bytes);
    let mut ticks = BTreeSet::new();
    while cursor.position() < cursor.get_ref().len() as u64 {
        let t = cursor.read_f32::<LittleEndian>().unwrap();
        let _x = cursor.read_f32::<LittleEndian>().unwrap();
        let _y = cursor.read_f32::<LittleEndian>().unwrap();
        let _v = cursor.read_f32::<LittleEndian>().unwrap();
        ticks.insert(t.round() as i64);
    }

    assert_eq!(ticks.len(), config.write_num_fields, "expected exactly {} distinct snapshot ticks, got {:?}", config.write_num_fields, ticks);
}
