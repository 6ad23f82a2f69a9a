pub mod constants;
pub mod error;
pub mod math_utils;
pub mod temp_utils;
pub mod scaling;
pub mod grid;
pub mod thermal;
pub mod softening;
pub mod material;
pub mod region;
pub mod painter;
pub mod assembler;
pub mod config;

pub use assembler::{ModelAssembler, ModelBundle, RunParameters, Solver, SolverOptions};
pub use config::ModelConfig;
pub use error::{ConfigError, GeometryWarning, Result};
pub use grid::{Grid, GridParams, PointLayout};
pub use material::{MaterialDatabase, Phase, PhaseOverrides};
pub use painter::{PaintReport, RegionPainter};
pub use region::{Layer, Region};
pub use scaling::{PhysicalUnit, ScalingParams, ScalingSystem};
pub use softening::SofteningLaw;
pub use thermal::{RidgeSide, ThermalAdjustment, ThermalProfile};
