//! Error kinds raised while building a model.
//!
//! Everything that makes a configuration unusable is a [`ConfigError`] and
//! aborts before a bundle exists. Geometry problems that still leave a usable
//! model are reported as [`GeometryWarning`] values instead.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid grid: {0}")]
    Grid(String),
    #[error("Invalid scaling reference: {0}")]
    Scaling(String),
    #[error("Phase ID {0} is already registered")]
    DuplicatePhase(i32),
    #[error("Cannot derive phase {new_id} from phase {base_id}: IDs must differ")]
    SelfDerivation { base_id: i32, new_id: i32 },
    #[error("Base phase {0} is not registered")]
    UnknownBasePhase(i32),
    #[error("Invalid phase {id}: {reason}")]
    InvalidPhase { id: i32, reason: String },
    #[error("Softening law ID {0} is already registered")]
    DuplicateSoftening(i32),
    #[error("Invalid softening law {id}: {reason}")]
    InvalidSoftening { id: i32, reason: String },
    #[error("Phase {phase_id} references unknown {kind} softening law {law_id}")]
    UnresolvedSoftening {
        phase_id: i32,
        law_id: i32,
        kind: &'static str,
    },
    #[error("Grid contains phase IDs with no material record: {0:?}")]
    UnknownGridPhases(Vec<i32>),
    #[error("Invalid thermal profile: {0}")]
    Thermal(String),
    #[error("Invalid region '{name}': {reason}")]
    Region { name: String, reason: String },
    #[error("Invalid run parameters: {0}")]
    RunParameters(String),
    #[error("Failed to parse model configuration: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Non-fatal geometry findings from painting a region.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryWarning {
    #[error("Region '{region}' does not intersect the grid; nothing was painted")]
    NoIntersection { region: String },
    #[error("Region '{region}' lies only partially inside the grid ({painted} points painted)")]
    PartialIntersection { region: String, painted: usize },
}

impl GeometryWarning {
    pub fn region(&self) -> &str {
        match self {
            GeometryWarning::NoIntersection { region } => region,
            GeometryWarning::PartialIntersection { region, .. } => region,
        }
    }
}
