use serde::{Deserialize, Serialize};

use super::nutrients::Nutrients;
use crate::error::ValidationError;

pub const SERVING_STEP: f64 = 0.5;
pub const MIN_SERVINGS: f64 = 0.5;

/// Portion size relative to a food template's base serving. A multiple of
/// half a serving, at least half a serving, with no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ServingMultiplier(f64);

impl ServingMultiplier {
    pub const ONE: ServingMultiplier = ServingMultiplier(1.0);

    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotNumeric("servings"));
        }
        if value < MIN_SERVINGS {
            return Err(ValidationError::Invalid(format!(
                "servings must be at least {}",
                MIN_SERVINGS
            )));
        }
        if (value / SERVING_STEP).fract() != 0.0 {
            return Err(ValidationError::Invalid(format!(
                "servings must be a multiple of {}",
                SERVING_STEP
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn apply(self, base: &Nutrients) -> Nutrients {
        base.scaled(self.0)
    }
}

impl Default for ServingMultiplier {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<f64> for ServingMultiplier {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        ServingMultiplier::new(value)
    }
}

impl From<ServingMultiplier> for f64 {
    fn from(m: ServingMultiplier) -> f64 {
        m.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_and_a_half_servings() {
        let base = Nutrients { calories: 200.0, protein_g: 10.0, ..Nutrients::ZERO };
        let m = ServingMultiplier::new(1.5).unwrap();
        let scaled = m.apply(&base);
        assert_eq!(scaled.calories, 300.0);
        assert_eq!(scaled.protein_g, 15.0);
        assert_eq!(scaled.fat_g, 0.0);
    }

    #[test]
    fn half_steps_without_upper_bound() {
        assert_eq!(ServingMultiplier::default().value(), 1.0);
        assert_eq!(ServingMultiplier::new(0.5).unwrap().value(), 0.5);
        assert_eq!(ServingMultiplier::new(12.0).unwrap().value(), 12.0);
    }

    #[test]
    fn rejects_invalid_multipliers() {
        assert!(ServingMultiplier::new(0.0).is_err());
        assert!(ServingMultiplier::new(0.25).is_err());
        assert!(ServingMultiplier::new(1.2).is_err());
        assert!(ServingMultiplier::new(f64::NAN).is_err());
    }
}
