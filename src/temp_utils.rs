//! Utilities for temperature units and the unit juggling behind
//! half-space cooling (km, Myr, cm/yr against SI diffusivity).

use crate::constants::{CM_TO_M, KM_TO_M, SECONDS_PER_MYR, SECONDS_PER_YEAR, TO_KELVIN};

/// Converts Celsius to Kelvin.
pub fn celsius_to_kelvin(temp_c: f64) -> f64 {
    temp_c + TO_KELVIN
}

/// Converts Kelvin to Celsius.
pub fn kelvin_to_celsius(temp_k: f64) -> f64 {
    temp_k - TO_KELVIN
}

/// Thermal diffusivity in m²/s from conductivity, density and heat capacity.
///
/// # Arguments
/// - `conductivity`: W/(m·K)
/// - `density`: kg/m³
/// - `heat_capacity`: J/(kg·K)
pub fn thermal_diffusivity(conductivity: f64, density: f64, heat_capacity: f64) -> f64 {
    conductivity / (density * heat_capacity)
}

/// Plate age in Myr after travelling `distance_km` at `velocity_cm_yr`.
pub fn spreading_age_myr(distance_km: f64, velocity_cm_yr: f64) -> f64 {
    let distance_m = distance_km * KM_TO_M;
    let velocity_m_yr = velocity_cm_yr * CM_TO_M;
    distance_m / velocity_m_yr / 1.0e6
}

/// Distance in km covered in `age_myr` at `velocity_cm_yr`.
pub fn spreading_distance_km(age_myr: f64, velocity_cm_yr: f64) -> f64 {
    age_myr * 1.0e6 * velocity_cm_yr * CM_TO_M / KM_TO_M
}

/// Diffusion length `2 * sqrt(kappa * t)` in km.
pub fn diffusion_length_km(kappa_m2_s: f64, age_myr: f64) -> f64 {
    2.0 * (kappa_m2_s * age_myr * SECONDS_PER_MYR).sqrt() / KM_TO_M
}

pub fn years_to_seconds(years: f64) -> f64 {
    years * SECONDS_PER_YEAR
}
