//! Final validation and packaging of a model for the external solver.

use crate::error::{ConfigError, Result};
use crate::grid::Grid;
use crate::material::{MaterialDatabase, Phase};
use crate::scaling::{PhysicalUnit, ScalingSystem};
use crate::softening::SofteningLaw;
use serde::{Deserialize, Serialize};

/// Time stepping, in Myr.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    pub time_start: f64,
    pub time_end: f64,
    pub dt: f64,
    pub dt_min: f64,
    pub dt_max: f64,
    pub max_steps: usize,
    /// Write output every this many steps.
    pub output_every: usize,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            time_start: 0.0,
            time_end: 2.0,
            dt: 1.0e-3,
            dt_min: 1.0e-5,
            dt_max: 0.1,
            max_steps: 400,
            output_every: 20,
        }
    }
}

impl RunParameters {
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| Err(ConfigError::RunParameters(reason));

        if !(self.time_start >= 0.0 && self.time_end > self.time_start) {
            return fail(format!(
                "time window [{}, {}] must satisfy 0 <= start < end",
                self.time_start, self.time_end
            ));
        }
        if !(self.dt_min > 0.0 && self.dt_min <= self.dt && self.dt <= self.dt_max) {
            return fail(format!(
                "time steps must satisfy 0 < dt_min ({}) <= dt ({}) <= dt_max ({})",
                self.dt_min, self.dt, self.dt_max
            ));
        }
        if self.max_steps == 0 || self.output_every == 0 {
            return fail("max_steps and output_every must be at least 1".to_string());
        }
        Ok(())
    }

    /// Times divided by the reference time; step counts are unchanged.
    pub fn nondimensionalize(&self, scaling: &ScalingSystem) -> RunParameters {
        let nd = |myr: f64| scaling.nondimensionalize(myr, PhysicalUnit::Myr);
        RunParameters {
            time_start: nd(self.time_start),
            time_end: nd(self.time_end),
            dt: nd(self.dt),
            dt_min: nd(self.dt_min),
            dt_max: nd(self.dt_max),
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverType {
    #[default]
    Direct,
    Multigrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectBackend {
    #[default]
    Mumps,
    SuperluDist,
    PetscLu,
}

/// Solver selection plus opaque key/value flags passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub solver_type: SolverType,
    pub direct_backend: DirectBackend,
    pub extra_args: Vec<(String, String)>,
}

impl SolverOptions {
    pub fn with_arg(mut self, key: &str, value: &str) -> Self {
        self.extra_args.push((key.to_string(), value.to_string()));
        self
    }
}

/// Non-dimensional phase and softening records in ascending ID order.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialTable {
    pub phases: Vec<Phase>,
    pub softening: Vec<SofteningLaw>,
}

impl MaterialTable {
    pub fn phase(&self, id: i32) -> Option<&Phase> {
        self.phases.iter().find(|phase| phase.id == id)
    }
}

/// Everything the solver needs, frozen at assembly.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    grid: Grid,
    scaling: ScalingSystem,
    materials: MaterialTable,
    run: RunParameters,
    solver: SolverOptions,
}

impl ModelBundle {
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn scaling(&self) -> &ScalingSystem {
        &self.scaling
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    /// Non-dimensional run parameters.
    pub fn run(&self) -> &RunParameters {
        &self.run
    }

    pub fn solver_options(&self) -> &SolverOptions {
        &self.solver
    }

    /// Grid extents divided by the reference length.
    pub fn nondimensional_extents(&self) -> [(f64, f64); 3] {
        self.grid.extents().map(|(min, max)| {
            (
                self.scaling.nondimensionalize(min, PhysicalUnit::Kilometer),
                self.scaling.nondimensionalize(max, PhysicalUnit::Kilometer),
            )
        })
    }

    pub fn hand_off<S: Solver>(&self, solver: &mut S) -> std::result::Result<S::Output, S::Error> {
        log::info!(
            "handing {} points and {} phases to the solver",
            self.grid.point_count(),
            self.materials.phases.len()
        );
        solver.solve(self)
    }
}

/// The external numerical solver.
pub trait Solver {
    type Output;
    type Error;

    fn solve(&mut self, bundle: &ModelBundle) -> std::result::Result<Self::Output, Self::Error>;
}

pub struct ModelAssembler;

impl ModelAssembler {
    pub fn assemble(
        grid: Grid,
        scaling: ScalingSystem,
        materials: &MaterialDatabase,
        run: RunParameters,
        solver: SolverOptions,
    ) -> Result<ModelBundle> {
        let missing: Vec<i32> = grid
            .phase_ids()
            .into_iter()
            .filter(|id| !materials.contains(*id))
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::UnknownGridPhases(missing));
        }
        materials.validate_references()?;
        run.validate()?;

        let table = MaterialTable {
            phases: materials
                .phases()
                .map(|phase| phase.nondimensionalize(&scaling))
                .collect(),
            softening: materials.softening_laws().copied().collect(),
        };

        log::info!(
            "assembled model: {} points, {} phases, {} softening laws",
            grid.point_count(),
            table.phases.len(),
            table.softening.len()
        );

        Ok(ModelBundle {
            grid,
            scaling,
            run: run.nondimensionalize(&scaling),
            materials: table,
            solver,
        })
    }
}
