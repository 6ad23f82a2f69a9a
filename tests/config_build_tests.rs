// Building whole models from JSON descriptions.

use approx::assert_relative_eq;
use geo_model_setup::assembler::{DirectBackend, Solver, SolverType};
use geo_model_setup::config::ModelConfig;
use geo_model_setup::error::{ConfigError, GeometryWarning};
use geo_model_setup::scaling::PhysicalUnit;
use geo_model_setup::ModelBundle;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const SUBDUCTION: &str = r#"{
    "grid": {
        "x": [-500, 500], "y": [0, 10], "z": [-200, 20],
        "elements": [50, 1, 22],
        "background_phase": 0,
        "background_temperature": 1280
    },
    "scaling": {
        "length_m": 1e6,
        "time": { "viscosity": 1e20 },
        "stress_pa": 1e7,
        "temperature_k": 1000
    },
    "run": {
        "time_start": 0, "time_end": 5, "dt": 0.01,
        "dt_min": 1e-4, "dt_max": 0.5, "max_steps": 1000, "output_every": 50
    },
    "regions": [
        { "name": "air", "x": [-500, 500], "y": [0, 10], "z": [0, 20], "phase": 5,
          "thermal": { "type": "uniform", "temperature": 20 } },
        { "name": "overriding plate", "x": [0, 500], "y": [0, 10], "z": [-200, 0],
          "interfaces": [30, 100], "phases": [1, 2, 0],
          "thermal": { "type": "halfspace_cooling", "t_surface": 20, "t_mantle": 1280, "age": 60 },
          "tlab": 1250 },
        { "name": "oceanic plate", "x": [-500, 0], "y": [0, 10], "z": [-200, 0],
          "interfaces": [8, 90], "phases": [3, 2, 0],
          "thermal": { "type": "spreading_rate", "t_surface": 20, "t_mantle": 1280,
                       "ridge_side": "left", "spreading_velocity": 2.0,
                       "age_at_ridge": 0.1, "max_age": 100 },
          "tlab": 1250 },
        { "name": "weak zone", "x": [-20, 20], "y": [0, 10], "z": [-60, 0], "dip": 45,
          "origin": [-20, 0, 0], "phase": 4 },
        { "name": "offshore", "x": [600, 700], "y": [0, 10], "z": [-10, 0], "phase": 1 }
    ],
    "adjustments": [ { "type": "adiabatic", "gradient": 0.3 } ],
    "softening": [ { "id": 0, "aps1": 0.1, "aps2": 1.0, "a": 0.8 } ],
    "materials": [
        { "id": 0, "name": "asthenosphere", "disl_creep": "Wet_Olivine_disl_creep-Hirth_Kohlstedt_2003" },
        { "id": 1, "name": "continental crust", "rho": 2750, "ch_soft_id": 0, "fr_soft_id": 0 },
        { "derive_from": 0, "id": 2, "overrides": { "name": "lithospheric mantle", "rho": 3320 } },
        { "derive_from": 1, "id": 3, "overrides": { "name": "oceanic crust", "rho": 3000 } },
        { "derive_from": 1, "id": 4, "overrides": { "name": "weak zone", "friction_angle": 5 } },
        { "id": 5, "name": "sticky air", "rho": 1, "eta": 1e19 }
    ],
    "solver": {
        "solver_type": "direct",
        "direct_backend": "superlu_dist",
        "extra_args": [["-snes_max_it", "30"]]
    }
}"#;

#[test]
fn subduction_setup_builds() {
    init_logging();
    let config = ModelConfig::from_json_str(SUBDUCTION).unwrap();
    let (bundle, report) = config.build().unwrap();

    assert_eq!(report.painted.len(), 5);
    assert_eq!(
        report.warnings,
        vec![GeometryWarning::NoIntersection { region: "offshore".to_string() }]
    );

    let phases: Vec<i32> = bundle.materials().phases.iter().map(|p| p.id).collect();
    assert_eq!(phases, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(bundle.materials().phase(4).unwrap().fr_soft_id, Some(0));
    assert_eq!(bundle.solver_options().solver_type, SolverType::Direct);
    assert_eq!(bundle.solver_options().direct_backend, DirectBackend::SuperluDist);
    assert_relative_eq!(
        bundle.run().time_end,
        bundle.scaling().nondimensionalize(5.0, PhysicalUnit::Myr)
    );

    let grid = bundle.grid();
    // x = 300, z = 10 sits in the air layer
    assert_eq!(grid.phase_at([40, 0, 21]), 5);
    // x = 300, z = -20: continental crust with the adiabat added on top
    assert_eq!(grid.phase_at([40, 0, 18]), 1);
    // x = -300, z = -40: oceanic lithospheric mantle
    assert_eq!(grid.phase_at([10, 0, 16]), 2);
    // the dipping weak zone at its hinge
    assert_eq!(grid.phase_at([24, 0, 20]), 4);
}

#[test]
fn adjustment_applies_after_painting() {
    let config = ModelConfig::from_json_str(SUBDUCTION).unwrap();
    let (grid, _) = config.paint().unwrap();
    // air at z = 20 is 20 °C painted, minus 0.3 °C/km above the datum
    assert_relative_eq!(grid.temperature_at([0, 0, 22]), 20.0 - 0.3 * 20.0);
}

#[test]
fn region_order_is_respected() {
    let mut config = ModelConfig::from_json_str(SUBDUCTION).unwrap();
    let (before, _) = config.paint().unwrap();
    assert_eq!(before.phase_at([24, 0, 20]), 4);

    // moving the weak zone first lets the plates paint over it
    let weak_zone = config.regions.remove(3);
    config.regions.insert(0, weak_zone);
    let (after, _) = config.paint().unwrap();
    assert_ne!(after.phase_at([24, 0, 20]), 4);
}

#[test]
fn strict_geometry_rejects_missing_region() {
    let mut config = ModelConfig::from_json_str(SUBDUCTION).unwrap();
    config.strict_geometry = true;
    assert!(matches!(
        config.build(),
        Err(ConfigError::Region { name, .. }) if name == "offshore"
    ));
}

#[test]
fn duplicate_phase_id_is_rejected() {
    let json = SUBDUCTION.replace(
        r#"{ "id": 5, "name": "sticky air""#,
        r#"{ "id": 3, "name": "sticky air""#,
    );
    let config = ModelConfig::from_json_str(&json).unwrap();
    assert_eq!(config.build().unwrap_err(), ConfigError::DuplicatePhase(3));
}

#[test]
fn missing_softening_law_is_reported() {
    let json = SUBDUCTION.replace(r#""fr_soft_id": 0"#, r#""fr_soft_id": 7"#);
    let config = ModelConfig::from_json_str(&json).unwrap();
    assert!(matches!(
        config.build(),
        Err(ConfigError::UnresolvedSoftening { law_id: 7, .. })
    ));
}

#[test]
fn bundle_reaches_solver() {
    struct PhaseCensus;

    impl Solver for PhaseCensus {
        type Output = Vec<usize>;
        type Error = String;

        fn solve(&mut self, bundle: &ModelBundle) -> Result<Vec<usize>, String> {
            let mut counts = vec![0; bundle.materials().phases.len()];
            for &phase in bundle.grid().phase() {
                let slot = counts
                    .get_mut(phase as usize)
                    .ok_or_else(|| format!("phase {} has no material", phase))?;
                *slot += 1;
            }
            Ok(counts)
        }
    }

    let (bundle, _) = ModelConfig::from_json_str(SUBDUCTION).unwrap().build().unwrap();
    let counts = bundle.hand_off(&mut PhaseCensus).unwrap();
    assert_eq!(counts.iter().sum::<usize>(), bundle.grid().point_count());
    assert!(counts[5] > 0);
}
