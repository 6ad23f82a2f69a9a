//! Box regions: extents, rotation, layering and thermal structure.
//!
//! A region is described in world coordinates (km, z up) and evaluated in its
//! own local frame: translate by `-origin`, then undo the strike rotation
//! (about z) and the dip rotation (about the strike-aligned y axis). Local
//! depth is measured down from the box top.

use crate::constants::ASTHENOSPHERE_PHASE_ID;
use crate::error::{ConfigError, Result};
use crate::math_utils::within;
use crate::thermal::{ProfileFrame, ThermalProfile};
use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

fn default_asthenosphere_phase() -> i32 {
    ASTHENOSPHERE_PHASE_ID
}

/// Phase for depths in `[top, bottom)` below the box top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub top: f64,
    pub bottom: f64,
    pub phase: i32,
}

impl Layer {
    pub fn new(top: f64, bottom: f64, phase: i32) -> Self {
        Self { top, bottom, phase }
    }

    pub fn contains(&self, depth: f64) -> bool {
        depth >= self.top && depth < self.bottom
    }
}

/// Layers from interface depths: `[20, 80]` with phases `[1, 2, 0]` gives
/// 0-20 → 1, 20-80 → 2 and everything below 80 → 0.
pub fn layers_from_interfaces(interfaces: &[f64], phases: &[i32]) -> Result<Vec<Layer>> {
    if phases.len() != interfaces.len() + 1 {
        return Err(ConfigError::Region {
            name: String::new(),
            reason: format!(
                "{} interfaces need {} phases, got {}",
                interfaces.len(),
                interfaces.len() + 1,
                phases.len()
            ),
        });
    }
    let mut tops = Vec::with_capacity(phases.len());
    tops.push(0.0);
    tops.extend_from_slice(interfaces);

    let mut bottoms = interfaces.to_vec();
    bottoms.push(f64::MAX);

    let layers: Vec<Layer> = tops
        .into_iter()
        .zip(bottoms)
        .zip(phases)
        .map(|((top, bottom), &phase)| Layer::new(top, bottom, phase))
        .collect();

    if let Some(bad) = layers.iter().find(|l| !(l.top < l.bottom)) {
        return Err(ConfigError::Region {
            name: String::new(),
            reason: format!("interfaces must increase, found {} after {}", bad.bottom, bad.top),
        });
    }
    Ok(layers)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default)]
    pub name: String,
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub z: (f64, f64),
    /// Rotation pivot; defaults to `(xmin, ymin, ztop)`.
    #[serde(default)]
    pub origin: Option<DVec3>,
    /// Degrees about the vertical axis.
    #[serde(default)]
    pub strike: f64,
    /// Degrees about the strike-aligned horizontal axis; positive dips down towards +x.
    #[serde(default)]
    pub dip: f64,
    #[serde(default)]
    pub layers: Vec<Layer>,
    /// `None` leaves temperatures untouched.
    #[serde(default)]
    pub thermal: Option<ThermalProfile>,
    /// Points hotter than this become `asthenosphere_phase`.
    #[serde(default)]
    pub tlab: Option<f64>,
    #[serde(default = "default_asthenosphere_phase")]
    pub asthenosphere_phase: i32,
}

impl Region {
    pub fn new(name: &str, x: (f64, f64), y: (f64, f64), z: (f64, f64)) -> Self {
        Self {
            name: name.to_string(),
            x,
            y,
            z,
            origin: None,
            strike: 0.0,
            dip: 0.0,
            layers: Vec::new(),
            thermal: None,
            tlab: None,
            asthenosphere_phase: ASTHENOSPHERE_PHASE_ID,
        }
    }

    pub fn with_origin(mut self, origin: DVec3) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_strike(mut self, degrees: f64) -> Self {
        self.strike = degrees;
        self
    }

    pub fn with_dip(mut self, degrees: f64) -> Self {
        self.dip = degrees;
        self
    }

    pub fn with_layers(mut self, layers: Vec<Layer>) -> Self {
        self.layers = layers;
        self
    }

    /// A single layer covering the whole box.
    pub fn with_phase(mut self, phase: i32) -> Self {
        self.layers = vec![Layer::new(0.0, f64::MAX, phase)];
        self
    }

    pub fn with_thermal(mut self, profile: ThermalProfile) -> Self {
        self.thermal = Some(profile);
        self
    }

    pub fn with_tlab(mut self, tlab: f64, asthenosphere_phase: i32) -> Self {
        self.tlab = Some(tlab);
        self.asthenosphere_phase = asthenosphere_phase;
        self
    }

    pub fn origin_or_default(&self) -> DVec3 {
        self.origin
            .unwrap_or_else(|| DVec3::new(self.x.0, self.y.0, self.z.1))
    }

    fn invalid(&self, reason: String) -> ConfigError {
        ConfigError::Region {
            name: self.name.clone(),
            reason,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (axis, (min, max)) in [("x", self.x), ("y", self.y), ("z", self.z)] {
            if !(min.is_finite() && max.is_finite() && min < max) {
                return Err(self.invalid(format!(
                    "{} extent ({}, {}) must be finite and strictly increasing",
                    axis, min, max
                )));
            }
        }
        if !(self.strike.is_finite() && self.dip.is_finite()) {
            return Err(self.invalid("strike and dip must be finite".to_string()));
        }
        if let Some(origin) = self.origin {
            if !origin.is_finite() {
                return Err(self.invalid("origin must be finite".to_string()));
            }
        }
        for layer in &self.layers {
            if !(layer.top >= 0.0 && layer.top < layer.bottom) {
                return Err(self.invalid(format!(
                    "layer [{}, {}) must satisfy 0 <= top < bottom",
                    layer.top, layer.bottom
                )));
            }
        }
        if let Some(tlab) = self.tlab {
            if !tlab.is_finite() {
                return Err(self.invalid("Tlab must be finite".to_string()));
            }
            if self.thermal.is_none() {
                return Err(self.invalid("Tlab needs a thermal profile to compare against".to_string()));
            }
        }
        if let Some(profile) = &self.thermal {
            profile
                .validate()
                .map_err(|err| self.invalid(err.to_string()))?;
        }
        Ok(())
    }

    /// Phase of the first layer containing `depth`, if any.
    pub fn layer_phase(&self, depth: f64) -> Option<i32> {
        self.layers
            .iter()
            .find(|layer| layer.contains(depth))
            .map(|layer| layer.phase)
    }

    pub fn frame(&self) -> LocalFrame {
        let origin = self.origin_or_default();
        let rotation =
            DMat3::from_rotation_z(self.strike.to_radians()) * DMat3::from_rotation_y(self.dip.to_radians());
        let min = DVec3::new(self.x.0, self.y.0, self.z.0) - origin;
        let max = DVec3::new(self.x.1, self.y.1, self.z.1) - origin;
        LocalFrame {
            origin,
            rotation,
            inverse_rotation: rotation.transpose(),
            min,
            max,
        }
    }
}

/// Precomputed transform of one region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    origin: DVec3,
    rotation: DMat3,
    inverse_rotation: DMat3,
    min: DVec3,
    max: DVec3,
}

impl LocalFrame {
    pub fn to_local(&self, point: DVec3) -> DVec3 {
        self.inverse_rotation * (point - self.origin)
    }

    pub fn to_world(&self, local: DVec3) -> DVec3 {
        self.rotation * local + self.origin
    }

    pub fn contains(&self, local: DVec3) -> bool {
        within(local.x, self.min.x, self.max.x)
            && within(local.y, self.min.y, self.max.y)
            && within(local.z, self.min.z, self.max.z)
    }

    /// Depth of a local point below the box top.
    pub fn depth(&self, local: DVec3) -> f64 {
        self.max.z - local.z
    }

    pub fn profile_frame(&self) -> ProfileFrame {
        ProfileFrame {
            depth_extent: self.max.z - self.min.z,
            lateral: (self.min.x, self.max.x),
        }
    }

    /// World-space axis-aligned bounds of the rotated box.
    pub fn world_bounds(&self) -> (DVec3, DVec3) {
        let mut lo = DVec3::splat(f64::INFINITY);
        let mut hi = DVec3::splat(f64::NEG_INFINITY);
        for corner in 0..8 {
            let local = DVec3::new(
                if corner & 1 == 0 { self.min.x } else { self.max.x },
                if corner & 2 == 0 { self.min.y } else { self.max.y },
                if corner & 4 == 0 { self.min.z } else { self.max.z },
            );
            let world = self.to_world(local);
            lo = lo.min(world);
            hi = hi.max(world);
        }
        (lo, hi)
    }
}
