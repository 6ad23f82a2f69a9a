//! Unit non-dimensionalization.
//!
//! Four reference quantities (length, time, stress, temperature) fix the scale
//! of every other dimension. Time can be given directly or derived from a
//! reference viscosity as `viscosity / stress`.

use crate::constants::{
    CM_TO_M, GEO_REF_LENGTH_M, GEO_REF_STRESS_PA, GEO_REF_TEMPERATURE_K, GEO_REF_VISCOSITY_PA_S,
    KM_TO_M, SECONDS_PER_MYR,
};
use crate::error::{ConfigError, Result};
use crate::temp_utils::{celsius_to_kelvin, kelvin_to_celsius, years_to_seconds};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Dimensionless,
    Length,
    Time,
    Stress,
    Temperature,
    Velocity,
    StrainRate,
    Density,
    Mass,
    Force,
    Energy,
    Power,
    Acceleration,
    HeatCapacity,
    Conductivity,
    HeatProductionPerMass,
    HeatProductionPerVolume,
    Viscosity,
    Diffusivity,
    ThermalExpansivity,
}

/// Units accepted on input. Each maps affinely onto SI: `si = value * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicalUnit {
    Dimensionless,
    Meter,
    Kilometer,
    Second,
    Year,
    Myr,
    Pascal,
    MegaPascal,
    GigaPascal,
    Kelvin,
    Celsius,
    MeterPerSecond,
    CmPerYear,
    PerSecond,
    KgPerM3,
    JPerKgK,
    WPerMK,
    WPerKg,
    WPerM3,
    PascalSecond,
    M2PerSecond,
    PerKelvin,
}

impl PhysicalUnit {
    pub fn dimension(self) -> Dimension {
        use PhysicalUnit::*;
        match self {
            Dimensionless => Dimension::Dimensionless,
            Meter | Kilometer => Dimension::Length,
            Second | Year | Myr => Dimension::Time,
            Pascal | MegaPascal | GigaPascal => Dimension::Stress,
            Kelvin | Celsius => Dimension::Temperature,
            MeterPerSecond | CmPerYear => Dimension::Velocity,
            PerSecond => Dimension::StrainRate,
            KgPerM3 => Dimension::Density,
            JPerKgK => Dimension::HeatCapacity,
            WPerMK => Dimension::Conductivity,
            WPerKg => Dimension::HeatProductionPerMass,
            WPerM3 => Dimension::HeatProductionPerVolume,
            PascalSecond => Dimension::Viscosity,
            M2PerSecond => Dimension::Diffusivity,
            PerKelvin => Dimension::ThermalExpansivity,
        }
    }

    fn scale(self) -> f64 {
        use PhysicalUnit::*;
        match self {
            Kilometer => KM_TO_M,
            Year => years_to_seconds(1.0),
            Myr => SECONDS_PER_MYR,
            MegaPascal => 1.0e6,
            GigaPascal => 1.0e9,
            CmPerYear => CM_TO_M / years_to_seconds(1.0),
            _ => 1.0,
        }
    }

    pub fn to_si(self, value: f64) -> f64 {
        match self {
            PhysicalUnit::Celsius => celsius_to_kelvin(value),
            _ => value * self.scale(),
        }
    }

    pub fn from_si(self, value: f64) -> f64 {
        match self {
            PhysicalUnit::Celsius => kelvin_to_celsius(value),
            _ => value / self.scale(),
        }
    }
}

/// How the characteristic time is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceTime {
    Seconds(f64),
    Viscosity(f64),
}

/// Reference quantities, all in SI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingParams {
    pub length_m: f64,
    pub time: ReferenceTime,
    pub stress_pa: f64,
    pub temperature_k: f64,
}

impl Default for ScalingParams {
    fn default() -> Self {
        Self {
            length_m: GEO_REF_LENGTH_M,
            time: ReferenceTime::Viscosity(GEO_REF_VISCOSITY_PA_S),
            stress_pa: GEO_REF_STRESS_PA,
            temperature_k: GEO_REF_TEMPERATURE_K,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScalingSystem {
    length: f64,
    time: f64,
    stress: f64,
    temperature: f64,
}

fn check_reference(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Scaling(format!(
            "reference {} must be positive and finite, got {}",
            name, value
        )))
    }
}

impl ScalingSystem {
    pub fn new(params: ScalingParams) -> Result<Self> {
        let length = check_reference("length", params.length_m)?;
        let stress = check_reference("stress", params.stress_pa)?;
        let temperature = check_reference("temperature", params.temperature_k)?;
        let time = match params.time {
            ReferenceTime::Seconds(seconds) => check_reference("time", seconds)?,
            ReferenceTime::Viscosity(viscosity) => {
                check_reference("viscosity", viscosity)?;
                viscosity / stress
            }
        };

        Ok(Self {
            length,
            time,
            stress,
            temperature,
        })
    }

    /// 1000 km, 1e20 Pa·s, 10 MPa, 1000 K.
    pub fn geo() -> Self {
        Self {
            length: GEO_REF_LENGTH_M,
            time: GEO_REF_VISCOSITY_PA_S / GEO_REF_STRESS_PA,
            stress: GEO_REF_STRESS_PA,
            temperature: GEO_REF_TEMPERATURE_K,
        }
    }

    /// Every reference is 1 SI unit, so non-dimensional values equal SI values.
    pub fn identity() -> Self {
        Self {
            length: 1.0,
            time: 1.0,
            stress: 1.0,
            temperature: 1.0,
        }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn stress(&self) -> f64 {
        self.stress
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// SI value of one non-dimensional unit of `dimension`.
    pub fn factor(&self, dimension: Dimension) -> f64 {
        let (l, t, s, temp) = (self.length, self.time, self.stress, self.temperature);
        match dimension {
            Dimension::Dimensionless => 1.0,
            Dimension::Length => l,
            Dimension::Time => t,
            Dimension::Stress => s,
            Dimension::Temperature => temp,
            Dimension::Velocity => l / t,
            Dimension::StrainRate => 1.0 / t,
            Dimension::Density => s * t * t / (l * l),
            Dimension::Mass => s * t * t * l,
            Dimension::Force => s * l * l,
            Dimension::Energy => s * l * l * l,
            Dimension::Power => s * l * l * l / t,
            Dimension::Acceleration => l / (t * t),
            Dimension::HeatCapacity => l * l / (t * t * temp),
            Dimension::Conductivity => s * l * l / (t * temp),
            Dimension::HeatProductionPerMass => l * l / (t * t * t),
            Dimension::HeatProductionPerVolume => s / t,
            Dimension::Viscosity => s * t,
            Dimension::Diffusivity => l * l / t,
            Dimension::ThermalExpansivity => 1.0 / temp,
        }
    }

    pub fn nondimensionalize(&self, value: f64, unit: PhysicalUnit) -> f64 {
        unit.to_si(value) / self.factor(unit.dimension())
    }

    pub fn dimensionalize(&self, value: f64, unit: PhysicalUnit) -> f64 {
        unit.from_si(value * self.factor(unit.dimension()))
    }
}

impl Default for ScalingSystem {
    fn default() -> Self {
        Self::geo()
    }
}
