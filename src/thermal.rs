//! Closed-form temperature profiles.
//!
//! Depths and lateral positions are in km, ages in Myr, temperatures in °C,
//! spreading velocities in cm/yr and diffusivity in m²/s.

use crate::constants::{
    DEFAULT_THERMAL_DIFFUSIVITY_M2_S, MANTLE_POTENTIAL_TEMP_C, MIN_THERMAL_AGE_MYR, SURFACE_TEMP_C,
};
use crate::error::{ConfigError, Result};
use crate::grid::Grid;
use crate::math_utils::{inverse_lerp, lerp};
use crate::temp_utils::{diffusion_length_km, spreading_age_myr};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

fn default_kappa() -> f64 {
    DEFAULT_THERMAL_DIFFUSIVITY_M2_S
}

fn default_t_surface() -> f64 {
    SURFACE_TEMP_C
}

fn default_t_mantle() -> f64 {
    MANTLE_POTENTIAL_TEMP_C
}

/// Which box edge holds the mid-ocean ridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RidgeSide {
    Left,
    Right,
}

/// Extent of the frame a profile is evaluated in: the region's local box,
/// or the whole grid for background fills.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileFrame {
    /// Depth of the frame bottom below its top.
    pub depth_extent: f64,
    /// Lateral (local x) range of the frame.
    pub lateral: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThermalProfile {
    Uniform {
        temperature: f64,
    },
    /// Linear between the frame top and bottom.
    Linear {
        top: f64,
        bottom: f64,
    },
    HalfspaceCooling {
        #[serde(default = "default_t_surface")]
        t_surface: f64,
        #[serde(default = "default_t_mantle")]
        t_mantle: f64,
        age: f64,
        /// Mantle adiabat in °C/km added to `t_mantle` with depth.
        #[serde(default)]
        adiabat: f64,
        #[serde(default = "default_kappa")]
        kappa: f64,
    },
    /// Half-space cooling with the age given by distance from a ridge.
    SpreadingRate {
        #[serde(default = "default_t_surface")]
        t_surface: f64,
        #[serde(default = "default_t_mantle")]
        t_mantle: f64,
        ridge_side: RidgeSide,
        spreading_velocity: f64,
        age_at_ridge: f64,
        max_age: f64,
        #[serde(default)]
        adiabat: f64,
        #[serde(default = "default_kappa")]
        kappa: f64,
    },
}

/// `T = Ts + (Tm + adiabat*|d| - Ts) * erf(|d| / (2 sqrt(kappa * age)))`
///
/// Ages at or below zero are evaluated at [`MIN_THERMAL_AGE_MYR`].
pub fn halfspace_temperature(
    t_surface: f64,
    t_mantle: f64,
    depth_km: f64,
    age_myr: f64,
    kappa: f64,
    adiabat: f64,
) -> f64 {
    let depth = depth_km.abs();
    let age = if age_myr > 0.0 { age_myr } else { MIN_THERMAL_AGE_MYR };
    let t_mantle = t_mantle + adiabat * depth;
    t_surface + (t_mantle - t_surface) * libm::erf(depth / diffusion_length_km(kappa, age))
}

/// Plate age at `lateral`, clamped to `[age_at_ridge, max_age]`.
pub fn plate_age(
    lateral: f64,
    ridge: f64,
    spreading_velocity: f64,
    age_at_ridge: f64,
    max_age: f64,
) -> f64 {
    spreading_age_myr((lateral - ridge).abs(), spreading_velocity)
        .max(age_at_ridge)
        .min(max_age)
}

fn check(ok: bool, reason: impl FnOnce() -> String) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Thermal(reason()))
    }
}

impl ThermalProfile {
    pub fn uniform(temperature: f64) -> Self {
        ThermalProfile::Uniform { temperature }
    }

    pub fn halfspace(t_surface: f64, t_mantle: f64, age: f64) -> Self {
        ThermalProfile::HalfspaceCooling {
            t_surface,
            t_mantle,
            age,
            adiabat: 0.0,
            kappa: DEFAULT_THERMAL_DIFFUSIVITY_M2_S,
        }
    }

    pub fn spreading_rate(
        t_surface: f64,
        t_mantle: f64,
        ridge_side: RidgeSide,
        spreading_velocity: f64,
        age_at_ridge: f64,
        max_age: f64,
    ) -> Self {
        ThermalProfile::SpreadingRate {
            t_surface,
            t_mantle,
            ridge_side,
            spreading_velocity,
            age_at_ridge,
            max_age,
            adiabat: 0.0,
            kappa: DEFAULT_THERMAL_DIFFUSIVITY_M2_S,
        }
    }

    /// Replace the diffusivity of a cooling profile; other profiles are returned unchanged.
    pub fn with_kappa(mut self, new_kappa: f64) -> Self {
        match &mut self {
            ThermalProfile::HalfspaceCooling { kappa, .. } | ThermalProfile::SpreadingRate { kappa, .. } => {
                *kappa = new_kappa;
            }
            ThermalProfile::Uniform { .. } | ThermalProfile::Linear { .. } => {}
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            ThermalProfile::Uniform { temperature } => {
                check(temperature.is_finite(), || format!("uniform temperature {} is not finite", temperature))
            }
            ThermalProfile::Linear { top, bottom } => check(top.is_finite() && bottom.is_finite(), || {
                format!("linear temperatures ({}, {}) must be finite", top, bottom)
            }),
            ThermalProfile::HalfspaceCooling {
                t_surface,
                t_mantle,
                age,
                kappa,
                ..
            } => {
                check(t_surface.is_finite() && t_mantle.is_finite(), || {
                    "half-space temperatures must be finite".to_string()
                })?;
                check(age >= 0.0, || format!("half-space age must not be negative, got {}", age))?;
                check(kappa > 0.0, || format!("thermal diffusivity must be positive, got {}", kappa))
            }
            ThermalProfile::SpreadingRate {
                t_surface,
                t_mantle,
                spreading_velocity,
                age_at_ridge,
                max_age,
                kappa,
                ..
            } => {
                check(t_surface.is_finite() && t_mantle.is_finite(), || {
                    "spreading-rate temperatures must be finite".to_string()
                })?;
                check(spreading_velocity > 0.0, || {
                    format!("spreading velocity must be positive, got {}", spreading_velocity)
                })?;
                check(age_at_ridge >= 0.0 && max_age >= 0.0, || {
                    format!("ages must not be negative (ridge {}, max {})", age_at_ridge, max_age)
                })?;
                check(max_age >= age_at_ridge, || {
                    format!("max age {} is below the ridge age {}", max_age, age_at_ridge)
                })?;
                check(kappa > 0.0, || format!("thermal diffusivity must be positive, got {}", kappa))
            }
        }
    }

    /// Temperature at `depth` below the frame top and lateral position `lateral`.
    pub fn evaluate(&self, depth: f64, lateral: f64, frame: &ProfileFrame) -> f64 {
        match *self {
            ThermalProfile::Uniform { temperature } => temperature,
            ThermalProfile::Linear { top, bottom } => {
                lerp(top, bottom, inverse_lerp(0.0, frame.depth_extent, depth))
            }
            ThermalProfile::HalfspaceCooling {
                t_surface,
                t_mantle,
                age,
                adiabat,
                kappa,
            } => halfspace_temperature(t_surface, t_mantle, depth, age, kappa, adiabat),
            ThermalProfile::SpreadingRate {
                t_surface,
                t_mantle,
                ridge_side,
                spreading_velocity,
                age_at_ridge,
                max_age,
                adiabat,
                kappa,
            } => {
                let ridge = match ridge_side {
                    RidgeSide::Left => frame.lateral.0,
                    RidgeSide::Right => frame.lateral.1,
                };
                let age = plate_age(lateral, ridge, spreading_velocity, age_at_ridge, max_age);
                halfspace_temperature(t_surface, t_mantle, depth, age, kappa, adiabat)
            }
        }
    }
}

impl Default for ThermalProfile {
    fn default() -> Self {
        ThermalProfile::uniform(SURFACE_TEMP_C)
    }
}

/// Whole-grid temperature adjustments applied after all regions are painted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThermalAdjustment {
    /// `T' = T - z * gradient` with `gradient` in °C/km.
    Adiabatic { gradient: f64 },
}

impl ThermalAdjustment {
    pub fn adjust(&self, temperature: f64, z: f64) -> f64 {
        match *self {
            ThermalAdjustment::Adiabatic { gradient } => temperature - z * gradient,
        }
    }

    pub fn apply_to(&self, grid: &mut Grid) {
        let z_coords = grid.coords(2).to_vec();
        let [nx, ny, _] = grid.shape();
        let layer = nx * ny;
        let (_, temperature) = grid.fields_mut();
        temperature
            .par_iter_mut()
            .enumerate()
            .for_each(|(flat, t)| *t = self.adjust(*t, z_coords[flat / layer]));
        log::debug!("applied {:?}", self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temp_utils::spreading_distance_km;
    use approx::assert_abs_diff_eq;
    use more_asserts::{assert_gt, assert_le, assert_lt};

    const FRAME: ProfileFrame = ProfileFrame {
        depth_extent: 100.0,
        lateral: (0.0, 2000.0),
    };

    #[test]
    fn halfspace_surface_equals_t_surface() {
        let profile = ThermalProfile::halfspace(20.0, 1350.0, 50.0);
        assert_abs_diff_eq!(profile.evaluate(0.0, 0.0, &FRAME), 20.0);
    }

    #[test]
    fn halfspace_monotonic_and_bounded() {
        let profile = ThermalProfile::halfspace(0.0, 1350.0, 30.0);
        let mut previous = profile.evaluate(0.0, 0.0, &FRAME);
        for step in 1..400 {
            let depth = step as f64 * 0.5;
            let t = profile.evaluate(depth, 0.0, &FRAME);
            assert_gt!(t, previous);
            assert_le!(t, 1350.0);
            previous = t;
        }
        assert_abs_diff_eq!(profile.evaluate(500.0, 0.0, &FRAME), 1350.0, epsilon = 1e-6);
        // depth sign does not matter
        assert_eq!(profile.evaluate(-40.0, 0.0, &FRAME), profile.evaluate(40.0, 0.0, &FRAME));
    }

    #[test]
    fn halfspace_zero_age_is_clamped() {
        let t = halfspace_temperature(0.0, 1300.0, 1.0, 0.0, 1e-6, 0.0);
        assert!(t.is_finite());
        assert_abs_diff_eq!(t, 1300.0, epsilon = 1e-6);
        assert_eq!(halfspace_temperature(0.0, 1300.0, 0.0, 0.0, 1e-6, 0.0), 0.0);
    }

    #[test]
    fn halfspace_adiabat_raises_deep_temperature() {
        let t = halfspace_temperature(0.0, 1300.0, 300.0, 10.0, 1e-6, 0.4);
        assert_abs_diff_eq!(t, 1420.0, epsilon = 1e-6);
    }

    #[test]
    fn spreading_rate_age_at_ridge_and_far_field() {
        let v = 0.5;
        assert_abs_diff_eq!(plate_age(0.0, 0.0, v, 0.01, 80.0), 0.01);
        let far = spreading_distance_km(80.0, v);
        assert_abs_diff_eq!(plate_age(far, 0.0, v, 0.01, 80.0), 80.0, epsilon = 1e-9);
        assert_eq!(plate_age(far * 3.0, 0.0, v, 0.01, 80.0), 80.0);
        assert_abs_diff_eq!(plate_age(100.0, 0.0, v, 0.01, 80.0), 20.0, epsilon = 1e-9);
    }

    #[test]
    fn spreading_rate_ridge_side() {
        let left = ThermalProfile::spreading_rate(20.0, 1280.0, RidgeSide::Left, 0.5, 0.01, 80.0);
        let right = ThermalProfile::spreading_rate(20.0, 1280.0, RidgeSide::Right, 0.5, 0.01, 80.0);
        // Young plate is hotter at a given depth
        assert_gt!(left.evaluate(20.0, 10.0, &FRAME), left.evaluate(20.0, 1000.0, &FRAME));
        assert_lt!(right.evaluate(20.0, 10.0, &FRAME), right.evaluate(20.0, 1990.0, &FRAME));
        assert_abs_diff_eq!(
            left.evaluate(35.0, 300.0, &FRAME),
            right.evaluate(35.0, 1700.0, &FRAME),
            epsilon = 1e-9
        );
    }

    #[test]
    fn spreading_rate_validation() {
        let bad_v = ThermalProfile::spreading_rate(20.0, 1280.0, RidgeSide::Left, 0.0, 0.01, 80.0);
        assert!(matches!(bad_v.validate(), Err(ConfigError::Thermal(_))));
        let bad_age = ThermalProfile::spreading_rate(20.0, 1280.0, RidgeSide::Left, 1.0, -1.0, 80.0);
        assert!(bad_age.validate().is_err());
        let inverted = ThermalProfile::spreading_rate(20.0, 1280.0, RidgeSide::Left, 1.0, 10.0, 5.0);
        assert!(inverted.validate().is_err());
        let negative = ThermalProfile::halfspace(20.0, 1280.0, -3.0);
        assert!(negative.validate().is_err());
        assert!(ThermalProfile::halfspace(20.0, 1280.0, 0.0).validate().is_ok());
    }

    #[test]
    fn linear_profile_spans_frame() {
        let profile = ThermalProfile::Linear { top: 0.0, bottom: 1000.0 };
        assert_abs_diff_eq!(profile.evaluate(25.0, 0.0, &FRAME), 250.0);
        assert_abs_diff_eq!(profile.evaluate(100.0, 0.0, &FRAME), 1000.0);
    }

    #[test]
    fn adiabatic_adjustment() {
        let adj = ThermalAdjustment::Adiabatic { gradient: 0.4 };
        assert_abs_diff_eq!(adj.adjust(1280.0, -100.0), 1320.0);
        assert_abs_diff_eq!(adj.adjust(20.0, 0.0), 20.0);
    }

    #[test]
    fn deserializes_tagged_profiles() {
        let profile: ThermalProfile = serde_json::from_str(
            r#"{"type": "spreading_rate", "t_surface": 20, "t_mantle": 1280,
                "ridge_side": "left", "spreading_velocity": 0.5,
                "age_at_ridge": 0.01, "max_age": 80}"#,
        )
        .unwrap();
        assert_eq!(
            profile,
            ThermalProfile::spreading_rate(20.0, 1280.0, RidgeSide::Left, 0.5, 0.01, 80.0)
        );
    }

    #[test]
    fn cooling_temperatures_default_to_surface_and_mantle() {
        let profile: ThermalProfile =
            serde_json::from_str(r#"{"type": "halfspace_cooling", "age": 30}"#).unwrap();
        assert_eq!(profile, ThermalProfile::halfspace(SURFACE_TEMP_C, MANTLE_POTENTIAL_TEMP_C, 30.0));
    }

    #[test]
    fn with_kappa_only_touches_cooling_profiles() {
        let slow = ThermalProfile::halfspace(0.0, 1300.0, 50.0).with_kappa(0.5e-6);
        assert!(matches!(slow, ThermalProfile::HalfspaceCooling { kappa, .. } if kappa == 0.5e-6));
        // a lower diffusivity keeps the plate colder at depth
        assert_lt!(
            slow.evaluate(40.0, 0.0, &FRAME),
            ThermalProfile::halfspace(0.0, 1300.0, 50.0).evaluate(40.0, 0.0, &FRAME)
        );
        assert_eq!(ThermalProfile::uniform(5.0).with_kappa(2.0e-6), ThermalProfile::uniform(5.0));
    }

    #[test]
    fn plate_age_with_inverted_bounds_does_not_panic() {
        assert_eq!(plate_age(0.0, 0.0, 0.5, 10.0, 5.0), 5.0);
    }
}
