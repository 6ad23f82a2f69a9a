pub const TO_KELVIN: f64 = 273.15;
pub const KM_TO_M: f64 = 1.0e3;
pub const CM_TO_M: f64 = 1.0e-2;
pub const SECONDS_PER_YEAR: f64 = 3600.0 * 24.0 * 365.25;
pub const MIO: f64 = 1_000_000.0;
pub const SECONDS_PER_MYR: f64 = SECONDS_PER_YEAR * MIO;

// Thermal defaults (geo units: km, Myr, °C)
pub const DEFAULT_THERMAL_DIFFUSIVITY_M2_S: f64 = 1.0e-6;
pub const SURFACE_TEMP_C: f64 = 20.0;
pub const MANTLE_POTENTIAL_TEMP_C: f64 = 1280.0;

/// Ages at or below zero are evaluated at this age so the error-function argument stays finite.
pub const MIN_THERMAL_AGE_MYR: f64 = 1.0e-6;

/// Phase assigned when a point inside a lithospheric box is hotter than Tlab.
pub const ASTHENOSPHERE_PHASE_ID: i32 = 0;

// Reference quantities of the geo scaling preset
pub const GEO_REF_LENGTH_M: f64 = 1000.0 * KM_TO_M;
pub const GEO_REF_VISCOSITY_PA_S: f64 = 1.0e20;
pub const GEO_REF_STRESS_PA: f64 = 10.0e6;
pub const GEO_REF_TEMPERATURE_K: f64 = 1000.0;
