// src/material.rs - Phase records and the material database

use crate::error::{ConfigError, Result};
use crate::scaling::{PhysicalUnit, ScalingSystem};
use crate::softening::SofteningLaw;
use crate::temp_utils::thermal_diffusivity;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A material phase as the solver sees it. SI units except the friction
/// angle, which is in degrees.
///
/// `id` is required when reading a phase; every other field falls back to a
/// mantle-like default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Phase {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_rho")]
    pub rho: f64, // kg/m³
    #[serde(default = "default_alpha")]
    pub alpha: f64, // 1/K
    #[serde(default = "default_k")]
    pub k: f64, // W/(m·K)
    #[serde(default = "default_cp")]
    pub cp: f64, // J/(kg·K)
    #[serde(default)]
    pub heat_production: f64, // W/kg
    #[serde(default = "default_shear_modulus")]
    pub shear_modulus: f64, // Pa
    #[serde(default = "default_cohesion")]
    pub cohesion: f64, // Pa
    #[serde(default = "default_friction_angle")]
    pub friction_angle: f64, // degrees
    #[serde(default)]
    pub disl_creep: Option<String>,
    #[serde(default)]
    pub diff_creep: Option<String>,
    #[serde(default)]
    pub eta: Option<f64>, // Pa·s
    #[serde(default)]
    pub ch_soft_id: Option<i32>,
    #[serde(default)]
    pub fr_soft_id: Option<i32>,
}

fn default_rho() -> f64 {
    3300.0
}

fn default_alpha() -> f64 {
    3.0e-5
}

fn default_k() -> f64 {
    3.0
}

fn default_cp() -> f64 {
    1000.0
}

fn default_shear_modulus() -> f64 {
    5.0e10
}

fn default_cohesion() -> f64 {
    10.0e6
}

fn default_friction_angle() -> f64 {
    30.0
}

impl Default for Phase {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            rho: default_rho(),
            alpha: default_alpha(),
            k: default_k(),
            cp: default_cp(),
            heat_production: 0.0,
            shear_modulus: default_shear_modulus(),
            cohesion: default_cohesion(),
            friction_angle: default_friction_angle(),
            disl_creep: None,
            diff_creep: None,
            eta: None,
            ch_soft_id: None,
            fr_soft_id: None,
        }
    }
}

/// Field overrides applied when deriving one phase from another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhaseOverrides {
    pub name: Option<String>,
    pub rho: Option<f64>,
    pub alpha: Option<f64>,
    pub k: Option<f64>,
    pub cp: Option<f64>,
    pub heat_production: Option<f64>,
    pub shear_modulus: Option<f64>,
    pub cohesion: Option<f64>,
    pub friction_angle: Option<f64>,
    pub disl_creep: Option<String>,
    pub diff_creep: Option<String>,
    pub eta: Option<f64>,
    pub ch_soft_id: Option<i32>,
    pub fr_soft_id: Option<i32>,
}

impl PhaseOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn rho(mut self, rho: f64) -> Self {
        self.rho = Some(rho);
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn k(mut self, k: f64) -> Self {
        self.k = Some(k);
        self
    }

    pub fn cp(mut self, cp: f64) -> Self {
        self.cp = Some(cp);
        self
    }

    pub fn heat_production(mut self, heat_production: f64) -> Self {
        self.heat_production = Some(heat_production);
        self
    }

    pub fn shear_modulus(mut self, shear_modulus: f64) -> Self {
        self.shear_modulus = Some(shear_modulus);
        self
    }

    pub fn cohesion(mut self, cohesion: f64) -> Self {
        self.cohesion = Some(cohesion);
        self
    }

    pub fn friction_angle(mut self, friction_angle: f64) -> Self {
        self.friction_angle = Some(friction_angle);
        self
    }

    pub fn disl_creep(mut self, law: &str) -> Self {
        self.disl_creep = Some(law.to_string());
        self
    }

    pub fn diff_creep(mut self, law: &str) -> Self {
        self.diff_creep = Some(law.to_string());
        self
    }

    pub fn eta(mut self, eta: f64) -> Self {
        self.eta = Some(eta);
        self
    }

    pub fn ch_soft_id(mut self, id: i32) -> Self {
        self.ch_soft_id = Some(id);
        self
    }

    pub fn fr_soft_id(mut self, id: i32) -> Self {
        self.fr_soft_id = Some(id);
        self
    }
}

impl Phase {
    /// Clone this phase, apply `overrides` and give the copy `new_id`.
    pub fn derive(&self, overrides: &PhaseOverrides, new_id: i32) -> Phase {
        let o = overrides.clone();
        Phase {
            id: new_id,
            name: o.name.unwrap_or_else(|| self.name.clone()),
            rho: o.rho.unwrap_or(self.rho),
            alpha: o.alpha.unwrap_or(self.alpha),
            k: o.k.unwrap_or(self.k),
            cp: o.cp.unwrap_or(self.cp),
            heat_production: o.heat_production.unwrap_or(self.heat_production),
            shear_modulus: o.shear_modulus.unwrap_or(self.shear_modulus),
            cohesion: o.cohesion.unwrap_or(self.cohesion),
            friction_angle: o.friction_angle.unwrap_or(self.friction_angle),
            disl_creep: o.disl_creep.or_else(|| self.disl_creep.clone()),
            diff_creep: o.diff_creep.or_else(|| self.diff_creep.clone()),
            eta: o.eta.or(self.eta),
            ch_soft_id: o.ch_soft_id.or(self.ch_soft_id),
            fr_soft_id: o.fr_soft_id.or(self.fr_soft_id),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(ConfigError::InvalidPhase {
                id: self.id,
                reason: reason.to_string(),
            })
        };

        if !(self.rho > 0.0) {
            return invalid("density must be positive");
        }
        if !(self.k > 0.0) {
            return invalid("conductivity must be positive");
        }
        if !(self.cp > 0.0) {
            return invalid("heat capacity must be positive");
        }
        if !(self.alpha >= 0.0 && self.heat_production >= 0.0) {
            return invalid("thermal expansivity and heat production must not be negative");
        }
        if !(self.shear_modulus > 0.0) {
            return invalid("shear modulus must be positive");
        }
        if !(self.cohesion >= 0.0) {
            return invalid("cohesion must not be negative");
        }
        if !(self.friction_angle >= 0.0 && self.friction_angle < 90.0) {
            return invalid("friction angle must be in [0, 90) degrees");
        }
        if let Some(eta) = self.eta {
            if !(eta > 0.0) {
                return invalid("constant viscosity must be positive");
            }
        }
        Ok(())
    }

    /// Copy with every dimensional field divided by its reference scale.
    pub fn nondimensionalize(&self, scaling: &ScalingSystem) -> Phase {
        Phase {
            rho: scaling.nondimensionalize(self.rho, PhysicalUnit::KgPerM3),
            alpha: scaling.nondimensionalize(self.alpha, PhysicalUnit::PerKelvin),
            k: scaling.nondimensionalize(self.k, PhysicalUnit::WPerMK),
            cp: scaling.nondimensionalize(self.cp, PhysicalUnit::JPerKgK),
            heat_production: scaling.nondimensionalize(self.heat_production, PhysicalUnit::WPerKg),
            shear_modulus: scaling.nondimensionalize(self.shear_modulus, PhysicalUnit::Pascal),
            cohesion: scaling.nondimensionalize(self.cohesion, PhysicalUnit::Pascal),
            eta: self
                .eta
                .map(|eta| scaling.nondimensionalize(eta, PhysicalUnit::PascalSecond)),
            ..self.clone()
        }
    }

    pub fn softening_refs(&self) -> impl Iterator<Item = (i32, &'static str)> {
        self.ch_soft_id
            .map(|id| (id, "cohesion"))
            .into_iter()
            .chain(self.fr_soft_id.map(|id| (id, "friction")))
    }

    /// Thermal diffusivity `k / (rho * cp)` in m²/s.
    pub fn thermal_diffusivity(&self) -> f64 {
        thermal_diffusivity(self.k, self.rho, self.cp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lithology {
    StickyAir,
    UpperCrust,
    LowerCrust,
    OceanicCrust,
    LithosphericMantle,
    Asthenosphere,
    WeakZone,
}

/// Typical phase records; IDs are assigned when a preset is taken.
pub static LITHOLOGY_PRESETS: Lazy<HashMap<Lithology, Phase>> = Lazy::new(|| {
    use Lithology::*;
    let mut m = HashMap::new();

    m.insert(StickyAir, Phase {
        name: "sticky_air".to_string(),
        rho: 1.0,
        alpha: 0.0,
        k: 100.0,
        cp: 1.0e6,
        cohesion: 10.0e6,
        friction_angle: 0.0,
        eta: Some(1.0e19),
        ..Phase::default()
    });

    m.insert(UpperCrust, Phase {
        name: "upper_crust".to_string(),
        rho: 2700.0,
        k: 2.5,
        heat_production: 1.0e-9,
        disl_creep: Some("Wet_Quarzite-Ueda_et_al_2008".to_string()),
        ..Phase::default()
    });

    m.insert(LowerCrust, Phase {
        name: "lower_crust".to_string(),
        rho: 2900.0,
        k: 2.5,
        heat_production: 1.0e-10,
        disl_creep: Some("Mafic_Granulite-Ranalli_1995".to_string()),
        ..Phase::default()
    });

    m.insert(OceanicCrust, Phase {
        name: "oceanic_crust".to_string(),
        rho: 3000.0,
        k: 2.5,
        disl_creep: Some("Plagioclase_An75-Ranalli_1995".to_string()),
        ..Phase::default()
    });

    m.insert(LithosphericMantle, Phase {
        name: "lithospheric_mantle".to_string(),
        rho: 3300.0,
        disl_creep: Some("Dry_Olivine_disl_creep-Hirth_Kohlstedt_2003".to_string()),
        diff_creep: Some("Dry_Olivine_diff_creep-Hirth_Kohlstedt_2003".to_string()),
        ..Phase::default()
    });

    m.insert(Asthenosphere, Phase {
        name: "asthenosphere".to_string(),
        rho: 3300.0,
        disl_creep: Some("Wet_Olivine_disl_creep-Hirth_Kohlstedt_2003".to_string()),
        diff_creep: Some("Wet_Olivine_diff_creep-Hirth_Kohlstedt_2003".to_string()),
        ..Phase::default()
    });

    m.insert(WeakZone, Phase {
        name: "weak_zone".to_string(),
        rho: 3300.0,
        cohesion: 1.0e6,
        friction_angle: 5.0,
        disl_creep: Some("Wet_Olivine_disl_creep-Hirth_Kohlstedt_2003".to_string()),
        ..Phase::default()
    });

    m
});

/// A preset phase record carrying `id`.
pub fn preset(kind: Lithology, id: i32) -> Phase {
    let mut phase = LITHOLOGY_PRESETS
        .get(&kind)
        .cloned()
        .unwrap_or_default();
    phase.id = id;
    phase
}

/// Phases and softening laws keyed by ID, iterated in ascending ID order.
#[derive(Debug, Clone, Default)]
pub struct MaterialDatabase {
    phases: BTreeMap<i32, Phase>,
    softening: BTreeMap<i32, SofteningLaw>,
}

impl MaterialDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, phase: Phase) -> Result<()> {
        phase.validate()?;
        if self.phases.contains_key(&phase.id) {
            return Err(ConfigError::DuplicatePhase(phase.id));
        }
        log::debug!("registered phase {} '{}'", phase.id, phase.name);
        self.phases.insert(phase.id, phase);
        Ok(())
    }

    /// Clone phase `base_id`, apply `overrides`, register the result as `new_id`.
    pub fn derive(&mut self, base_id: i32, overrides: &PhaseOverrides, new_id: i32) -> Result<&Phase> {
        if new_id == base_id {
            return Err(ConfigError::SelfDerivation { base_id, new_id });
        }
        let base = self
            .phases
            .get(&base_id)
            .ok_or(ConfigError::UnknownBasePhase(base_id))?;
        let derived = base.derive(overrides, new_id);
        self.register(derived)?;
        Ok(&self.phases[&new_id])
    }

    pub fn register_softening(&mut self, law: SofteningLaw) -> Result<()> {
        law.validate()?;
        if self.softening.contains_key(&law.id) {
            return Err(ConfigError::DuplicateSoftening(law.id));
        }
        self.softening.insert(law.id, law);
        Ok(())
    }

    /// Every `ch_soft_id` / `fr_soft_id` must name a registered law.
    pub fn validate_references(&self) -> Result<()> {
        for phase in self.phases.values() {
            for (law_id, kind) in phase.softening_refs() {
                if !self.softening.contains_key(&law_id) {
                    return Err(ConfigError::UnresolvedSoftening {
                        phase_id: phase.id,
                        law_id,
                        kind,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, id: i32) -> Option<&Phase> {
        self.phases.get(&id)
    }

    pub fn contains(&self, id: i32) -> bool {
        self.phases.contains_key(&id)
    }

    pub fn softening_law(&self, id: i32) -> Option<&SofteningLaw> {
        self.softening.get(&id)
    }

    pub fn phases(&self) -> impl Iterator<Item = &Phase> {
        self.phases.values()
    }

    pub fn softening_laws(&self) -> impl Iterator<Item = &SofteningLaw> {
        self.softening.values()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn crust() -> Phase {
        Phase {
            id: 1,
            name: "crust".to_string(),
            rho: 2900.0,
            ch_soft_id: Some(0),
            ..Phase::default()
        }
    }

    #[test]
    fn derive_overrides_only_named_fields() {
        let mut db = MaterialDatabase::new();
        db.register(crust()).unwrap();

        let derived = db.derive(1, &PhaseOverrides::new().rho(2700.0), 3).unwrap().clone();
        let expected = Phase {
            id: 3,
            rho: 2700.0,
            ..crust()
        };
        assert_eq!(derived, expected);

        let again = db.derive(1, &PhaseOverrides::new().rho(2800.0), 3);
        assert_eq!(again.unwrap_err(), ConfigError::DuplicatePhase(3));
        let mut clash = crust();
        clash.id = 3;
        assert_eq!(db.register(clash).unwrap_err(), ConfigError::DuplicatePhase(3));
    }

    #[test]
    fn derive_rejects_self_and_unknown_base() {
        let mut db = MaterialDatabase::new();
        db.register(crust()).unwrap();
        assert!(matches!(
            db.derive(1, &PhaseOverrides::new(), 1),
            Err(ConfigError::SelfDerivation { .. })
        ));
        assert_eq!(
            db.derive(7, &PhaseOverrides::new(), 8).unwrap_err(),
            ConfigError::UnknownBasePhase(7)
        );
    }

    #[test]
    fn softening_references_resolve_late() {
        let mut db = MaterialDatabase::new();
        db.register(crust()).unwrap();
        assert!(matches!(
            db.validate_references(),
            Err(ConfigError::UnresolvedSoftening { phase_id: 1, law_id: 0, kind: "cohesion" })
        ));

        db.register_softening(SofteningLaw::new(0, 0.1, 0.5, 0.95)).unwrap();
        assert!(db.validate_references().is_ok());
        assert_eq!(
            db.register_softening(SofteningLaw::new(0, 0.2, 0.6, 0.5)).unwrap_err(),
            ConfigError::DuplicateSoftening(0)
        );
    }

    #[test]
    fn phases_iterate_by_id() {
        let mut db = MaterialDatabase::new();
        db.register(preset(Lithology::LithosphericMantle, 2)).unwrap();
        db.register(preset(Lithology::Asthenosphere, 0)).unwrap();
        db.register(preset(Lithology::UpperCrust, 1)).unwrap();
        let ids: Vec<i32> = db.phases().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(db.get(1).unwrap().name, "upper_crust");
    }

    #[test]
    fn phase_json_requires_id() {
        let parsed: Phase = serde_json::from_str(r#"{ "id": 3, "name": "mantle" }"#).unwrap();
        assert_eq!(parsed, Phase { id: 3, name: "mantle".to_string(), ..Phase::default() });

        let missing_id = serde_json::from_str::<Phase>(r#"{ "name": "mantle", "rho": 3300 }"#);
        assert!(missing_id.is_err());
    }

    #[test]
    fn phase_json_rejects_unknown_fields() {
        assert!(serde_json::from_str::<Phase>(r#"{ "id": 1, "derive_from": 0 }"#).is_err());
        assert!(serde_json::from_str::<PhaseOverrides>(r#"{ "rhoo": 2900 }"#).is_err());
    }

    #[test]
    fn diffusivity_from_phase_properties() {
        let phase = Phase::default();
        assert_abs_diff_eq!(phase.thermal_diffusivity(), 3.0 / (3300.0 * 1000.0), epsilon = 1e-18);
    }

    #[test]
    fn invalid_phase_is_rejected() {
        let mut db = MaterialDatabase::new();
        let bad = Phase {
            id: 4,
            rho: 0.0,
            ..Phase::default()
        };
        assert!(matches!(db.register(bad), Err(ConfigError::InvalidPhase { id: 4, .. })));
        let steep = Phase {
            id: 5,
            friction_angle: 90.0,
            ..Phase::default()
        };
        assert!(db.register(steep).is_err());
        assert!(db.is_empty());
    }

    #[test]
    fn nondimensionalize_scales_dimensional_fields() {
        let scaling = ScalingSystem::geo();
        let phase = Phase {
            eta: Some(1e21),
            ..crust()
        };
        let nd = phase.nondimensionalize(&scaling);
        assert_abs_diff_eq!(nd.eta.unwrap(), 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(nd.cohesion, 1.0, epsilon = 1e-12);
        assert_eq!(nd.friction_angle, phase.friction_angle);
        assert_eq!(nd.id, phase.id);
        assert_abs_diff_eq!(
            scaling.dimensionalize(nd.rho, PhysicalUnit::KgPerM3),
            2900.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn all_presets_are_valid() {
        for (i, kind) in LITHOLOGY_PRESETS.keys().enumerate() {
            assert!(preset(*kind, i as i32).validate().is_ok(), "{:?}", kind);
        }
    }
}
