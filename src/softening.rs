// src/softening.rs - strain softening laws referenced by phases

use crate::error::{ConfigError, Result};
use crate::math_utils::inverse_lerp;
use serde::{Deserialize, Serialize};

/// Linear strength reduction with accumulated plastic strain (APS).
///
/// Below `aps1` strength is untouched, above `aps2` it is reduced by the
/// ratio `a`, and in between the multiplier drops linearly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SofteningLaw {
    pub id: i32,
    pub aps1: f64,
    pub aps2: f64,
    pub a: f64,
}

impl SofteningLaw {
    pub fn new(id: i32, aps1: f64, aps2: f64, a: f64) -> Self {
        Self { id, aps1, aps2, a }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| ConfigError::InvalidSoftening { id: self.id, reason };

        if !(self.aps1 >= 0.0 && self.aps1 < self.aps2 && self.aps2.is_finite()) {
            return Err(invalid(format!(
                "APS thresholds must satisfy 0 <= APS1 < APS2, got ({}, {})",
                self.aps1, self.aps2
            )));
        }
        if !(self.a > 0.0 && self.a <= 1.0) {
            return Err(invalid(format!("reduction ratio A must be in (0, 1], got {}", self.a)));
        }
        Ok(())
    }

    /// Multiplier applied to cohesion or friction at accumulated plastic strain `aps`.
    pub fn strength_multiplier(&self, aps: f64) -> f64 {
        if aps <= self.aps1 {
            1.0
        } else if aps >= self.aps2 {
            1.0 - self.a
        } else {
            1.0 - self.a * inverse_lerp(self.aps1, self.aps2, aps)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn multiplier_shape() {
        let law = SofteningLaw::new(0, 0.1, 0.5, 0.95);
        assert_eq!(law.strength_multiplier(0.0), 1.0);
        assert_eq!(law.strength_multiplier(0.1), 1.0);
        assert_abs_diff_eq!(law.strength_multiplier(0.3), 1.0 - 0.95 * 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(law.strength_multiplier(0.5), 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(law.strength_multiplier(10.0), 0.05, epsilon = 1e-12);
    }

    #[test]
    fn validation() {
        assert!(SofteningLaw::new(0, 0.1, 0.5, 0.95).validate().is_ok());
        assert!(SofteningLaw::new(1, 0.5, 0.5, 0.5).validate().is_err());
        assert!(SofteningLaw::new(2, 0.6, 0.5, 0.5).validate().is_err());
        assert!(SofteningLaw::new(3, 0.1, 0.5, 0.0).validate().is_err());
        assert!(SofteningLaw::new(4, 0.1, 0.5, 1.0).validate().is_ok());
        assert!(matches!(
            SofteningLaw::new(5, -0.1, 0.5, 0.5).validate(),
            Err(ConfigError::InvalidSoftening { id: 5, .. })
        ));
    }
}
