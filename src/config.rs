//! Declarative model description, read from JSON.

use crate::assembler::{ModelAssembler, ModelBundle, RunParameters, SolverOptions};
use crate::error::{ConfigError, Result};
use crate::grid::{Grid, GridParams};
use crate::material::{MaterialDatabase, Phase, PhaseOverrides};
use crate::painter::{PaintReport, RegionPainter};
use crate::region::{layers_from_interfaces, Region};
use crate::scaling::{ScalingParams, ScalingSystem};
use crate::softening::SofteningLaw;
use crate::thermal::ThermalAdjustment;
use serde::{Deserialize, Serialize};

/// A registered phase cloned under a new ID with some fields replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DerivedPhase {
    pub derive_from: i32,
    pub id: i32,
    #[serde(default)]
    pub overrides: PhaseOverrides,
}

/// Either a full phase record or a derived one. Both reject unknown keys, so
/// an entry can only ever match one form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaterialEntry {
    Derived(DerivedPhase),
    Explicit(Phase),
}

/// A region as written in the config: explicit `layers`, or `interfaces`
/// plus `phases`, or a single `phase`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionEntry {
    #[serde(flatten)]
    pub region: Region,
    #[serde(default)]
    pub interfaces: Option<Vec<f64>>,
    #[serde(default)]
    pub phases: Option<Vec<i32>>,
    #[serde(default)]
    pub phase: Option<i32>,
    /// Take the profile's diffusivity from this phase's `k / (rho * cp)`.
    #[serde(default)]
    pub kappa_from_phase: Option<i32>,
}

impl RegionEntry {
    fn invalid(&self, reason: String) -> ConfigError {
        ConfigError::Region {
            name: self.region.name.clone(),
            reason,
        }
    }

    pub fn resolve(&self, materials: &MaterialDatabase) -> Result<Region> {
        let mut region = self.region.clone();
        let explicit_layers = !region.layers.is_empty();

        match (&self.interfaces, &self.phases, self.phase) {
            (Some(interfaces), Some(phases), None) if !explicit_layers => {
                region.layers = layers_from_interfaces(interfaces, phases).map_err(|err| match err {
                    ConfigError::Region { reason, .. } => self.invalid(reason),
                    other => other,
                })?;
            }
            (None, None, Some(phase)) if !explicit_layers => region = region.with_phase(phase),
            (None, None, None) => {}
            _ => {
                return Err(self.invalid(
                    "use exactly one of layers, interfaces with phases, or a single phase".to_string(),
                ));
            }
        }

        if let Some(phase_id) = self.kappa_from_phase {
            let phase = materials
                .get(phase_id)
                .ok_or_else(|| self.invalid(format!("kappa_from_phase {} is not a registered phase", phase_id)))?;
            let profile = region
                .thermal
                .take()
                .ok_or_else(|| self.invalid("kappa_from_phase needs a thermal profile".to_string()))?;
            region.thermal = Some(profile.with_kappa(phase.thermal_diffusivity()));
        }
        Ok(region)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub grid: GridParams,
    #[serde(default)]
    pub scaling: ScalingParams,
    #[serde(default)]
    pub run: RunParameters,
    #[serde(default)]
    pub regions: Vec<RegionEntry>,
    #[serde(default)]
    pub adjustments: Vec<ThermalAdjustment>,
    #[serde(default)]
    pub materials: Vec<MaterialEntry>,
    #[serde(default)]
    pub softening: Vec<SofteningLaw>,
    #[serde(default)]
    pub solver: SolverOptions,
    #[serde(default)]
    pub strict_geometry: bool,
}

impl ModelConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Register materials and softening laws in file order.
    pub fn material_database(&self) -> Result<MaterialDatabase> {
        let mut db = MaterialDatabase::new();
        for law in &self.softening {
            db.register_softening(*law)?;
        }
        for entry in &self.materials {
            match entry {
                MaterialEntry::Explicit(phase) => db.register(phase.clone())?,
                MaterialEntry::Derived(derived) => {
                    db.derive(derived.derive_from, &derived.overrides, derived.id)?;
                }
            }
        }
        Ok(db)
    }

    /// Allocate, paint and adjust the grid.
    pub fn paint(&self) -> Result<(Grid, PaintReport)> {
        self.paint_with(&self.material_database()?)
    }

    /// Like [`ModelConfig::paint`], resolving phase references against `materials`.
    pub fn paint_with(&self, materials: &MaterialDatabase) -> Result<(Grid, PaintReport)> {
        let regions = self
            .regions
            .iter()
            .map(|entry| entry.resolve(materials))
            .collect::<Result<Vec<_>>>()?;
        let mut grid = Grid::allocate(self.grid.clone())?;

        let painter = if self.strict_geometry {
            RegionPainter::strict()
        } else {
            RegionPainter::new()
        };
        let report = painter.apply_all(&mut grid, &regions)?;
        for adjustment in &self.adjustments {
            painter.apply_adjustment(&mut grid, adjustment);
        }
        Ok((grid, report))
    }

    /// Run the whole pipeline. No bundle is produced if any step fails.
    pub fn build(&self) -> Result<(ModelBundle, PaintReport)> {
        let scaling = ScalingSystem::new(self.scaling)?;
        let materials = self.material_database()?;
        let (grid, report) = self.paint_with(&materials)?;
        let bundle = ModelAssembler::assemble(grid, scaling, &materials, self.run, self.solver.clone())?;
        Ok((bundle, report))
    }
}
