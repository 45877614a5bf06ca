use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// Energy per gram of each macro, in kcal.
pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;
pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
pub const KCAL_PER_GRAM_FAT: f64 = 9.0;

/// Nutrient values of a food, a log entry or an aggregate.
///
/// Every field defaults to 0, so an absent micro never needs a null check
/// downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nutrients {
    pub calories: f64,
    #[serde(alias = "carbs")]
    pub carbs_g: f64,
    #[serde(alias = "protein")]
    pub protein_g: f64,
    #[serde(alias = "fat")]
    pub fat_g: f64,
    #[serde(alias = "sugar")]
    pub sugar_g: f64,
    #[serde(alias = "fiber")]
    pub fiber_g: f64,
    #[serde(alias = "saturated_fat")]
    pub saturated_fat_g: f64,
    #[serde(alias = "trans_fat")]
    pub trans_fat_g: f64,
    #[serde(alias = "cholesterol")]
    pub cholesterol_mg: f64,
    #[serde(alias = "sodium")]
    pub sodium_mg: f64,
    #[serde(alias = "potassium")]
    pub potassium_mg: f64,
}

impl Nutrients {
    pub const ZERO: Nutrients = Nutrients {
        calories: 0.0,
        carbs_g: 0.0,
        protein_g: 0.0,
        fat_g: 0.0,
        sugar_g: 0.0,
        fiber_g: 0.0,
        saturated_fat_g: 0.0,
        trans_fat_g: 0.0,
        cholesterol_mg: 0.0,
        sodium_mg: 0.0,
        potassium_mg: 0.0,
    };

    fn fields(&self) -> [(&'static str, f64); 11] {
        [
            ("calories", self.calories),
            ("carbs", self.carbs_g),
            ("protein", self.protein_g),
            ("fat", self.fat_g),
            ("sugar", self.sugar_g),
            ("fiber", self.fiber_g),
            ("saturated_fat", self.saturated_fat_g),
            ("trans_fat", self.trans_fat_g),
            ("cholesterol", self.cholesterol_mg),
            ("sodium", self.sodium_mg),
            ("potassium", self.potassium_mg),
        ]
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            calories: f(self.calories),
            carbs_g: f(self.carbs_g),
            protein_g: f(self.protein_g),
            fat_g: f(self.fat_g),
            sugar_g: f(self.sugar_g),
            fiber_g: f(self.fiber_g),
            saturated_fat_g: f(self.saturated_fat_g),
            trans_fat_g: f(self.trans_fat_g),
            cholesterol_mg: f(self.cholesterol_mg),
            sodium_mg: f(self.sodium_mg),
            potassium_mg: f(self.potassium_mg),
        }
    }

    /// Multiplies and rounds every field on its own. Calories are not
    /// re-derived from the rounded macros.
    pub fn scaled(self, multiplier: f64) -> Self {
        self.map(|v| (v * multiplier).round())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in self.fields() {
            if !value.is_finite() {
                return Err(ValidationError::NotNumeric(name));
            }
            if value < 0.0 {
                return Err(ValidationError::Negative(name));
            }
        }
        Ok(())
    }

    /// Reads nutrients from loosely shaped JSON (AI output): numbers, numeric
    /// strings with a trailing unit, or nulls. Unknown values read as 0.
    pub fn from_json_lenient(value: &Value) -> Self {
        let pick = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| value.get(*k))
                .map(lenient_number)
                .unwrap_or(0.0)
        };
        Self {
            calories: pick(&["calories", "kcal", "energy"]),
            carbs_g: pick(&["carbs_g", "carbs", "carbohydrates"]),
            protein_g: pick(&["protein_g", "protein"]),
            fat_g: pick(&["fat_g", "fat"]),
            sugar_g: pick(&["sugar_g", "sugar"]),
            fiber_g: pick(&["fiber_g", "fiber"]),
            saturated_fat_g: pick(&["saturated_fat_g", "saturated_fat"]),
            trans_fat_g: pick(&["trans_fat_g", "trans_fat"]),
            cholesterol_mg: pick(&["cholesterol_mg", "cholesterol"]),
            sodium_mg: pick(&["sodium_mg", "sodium"]),
            potassium_mg: pick(&["potassium_mg", "potassium"]),
        }
        .map(|v| v.max(0.0))
    }
}

/// Number from a JSON value that may be a number or a string such as
/// `"12.5"` or `"12.5g"`. Anything else is 0.
pub fn lenient_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let s = s.trim();
            let end = s
                .char_indices()
                .find(|(_, c)| !(c.is_ascii_digit() || *c == '.' || *c == '-'))
                .map(|(i, _)| i)
                .unwrap_or(s.len());
            s[..end].parse::<f64>().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

impl Add for Nutrients {
    type Output = Nutrients;

    fn add(self, rhs: Nutrients) -> Nutrients {
        Nutrients {
            calories: self.calories + rhs.calories,
            carbs_g: self.carbs_g + rhs.carbs_g,
            protein_g: self.protein_g + rhs.protein_g,
            fat_g: self.fat_g + rhs.fat_g,
            sugar_g: self.sugar_g + rhs.sugar_g,
            fiber_g: self.fiber_g + rhs.fiber_g,
            saturated_fat_g: self.saturated_fat_g + rhs.saturated_fat_g,
            trans_fat_g: self.trans_fat_g + rhs.trans_fat_g,
            cholesterol_mg: self.cholesterol_mg + rhs.cholesterol_mg,
            sodium_mg: self.sodium_mg + rhs.sodium_mg,
            potassium_mg: self.potassium_mg + rhs.potassium_mg,
        }
    }
}

impl AddAssign for Nutrients {
    fn add_assign(&mut self, rhs: Nutrients) {
        *self = *self + rhs;
    }
}

impl Sum for Nutrients {
    fn sum<I: Iterator<Item = Nutrients>>(iter: I) -> Self {
        iter.fold(Nutrients::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Nutrients> for Nutrients {
    fn sum<I: Iterator<Item = &'a Nutrients>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Nutrients as typed into a form: calories must be present, the rest
/// default to 0.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NutrientInput {
    pub calories: Option<f64>,
    #[serde(alias = "carbs")]
    pub carbs_g: Option<f64>,
    #[serde(alias = "protein")]
    pub protein_g: Option<f64>,
    #[serde(alias = "fat")]
    pub fat_g: Option<f64>,
    #[serde(alias = "sugar")]
    pub sugar_g: Option<f64>,
    #[serde(alias = "fiber")]
    pub fiber_g: Option<f64>,
    #[serde(alias = "saturated_fat")]
    pub saturated_fat_g: Option<f64>,
    #[serde(alias = "trans_fat")]
    pub trans_fat_g: Option<f64>,
    #[serde(alias = "cholesterol")]
    pub cholesterol_mg: Option<f64>,
    #[serde(alias = "sodium")]
    pub sodium_mg: Option<f64>,
    #[serde(alias = "potassium")]
    pub potassium_mg: Option<f64>,
}

impl NutrientInput {
    pub fn into_nutrients(self) -> Result<Nutrients, ValidationError> {
        let nutrients = Nutrients {
            calories: self.calories.ok_or(ValidationError::Missing("calories"))?,
            carbs_g: self.carbs_g.unwrap_or_default(),
            protein_g: self.protein_g.unwrap_or_default(),
            fat_g: self.fat_g.unwrap_or_default(),
            sugar_g: self.sugar_g.unwrap_or_default(),
            fiber_g: self.fiber_g.unwrap_or_default(),
            saturated_fat_g: self.saturated_fat_g.unwrap_or_default(),
            trans_fat_g: self.trans_fat_g.unwrap_or_default(),
            cholesterol_mg: self.cholesterol_mg.unwrap_or_default(),
            sodium_mg: self.sodium_mg.unwrap_or_default(),
            potassium_mg: self.potassium_mg.unwrap_or_default(),
        };
        nutrients.validate()?;
        Ok(nutrients)
    }
}

/// Daily targets the summaries measure against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroGoals {
    pub calories: f64,
    pub carbs_g: f64,
    pub protein_g: f64,
    pub fat_g: f64,
}

impl MacroGoals {
    /// Replaces each unset (zero) goal by the matching fallback.
    pub fn or_defaults(self, fallback: MacroGoals) -> Self {
        let pick = |v: f64, d: f64| if v > 0.0 { v } else { d };
        Self {
            calories: pick(self.calories, fallback.calories),
            carbs_g: pick(self.carbs_g, fallback.carbs_g),
            protein_g: pick(self.protein_g, fallback.protein_g),
            fat_g: pick(self.fat_g, fallback.fat_g),
        }
    }

    pub fn times(self, days: f64) -> Self {
        Self {
            calories: self.calories * days,
            carbs_g: self.carbs_g * days,
            protein_g: self.protein_g * days,
            fat_g: self.fat_g * days,
        }
    }

    /// What is left of the goal after `eaten`, never below zero.
    pub fn remaining_after(self, eaten: &Nutrients) -> Self {
        Self {
            calories: (self.calories - eaten.calories).max(0.0),
            carbs_g: (self.carbs_g - eaten.carbs_g).max(0.0),
            protein_g: (self.protein_g - eaten.protein_g).max(0.0),
            fat_g: (self.fat_g - eaten.fat_g).max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_deserialize_as_zero() {
        let n: Nutrients = serde_json::from_value(json!({ "calories": 200, "protein": 10 })).unwrap();
        assert_eq!(n.calories, 200.0);
        assert_eq!(n.protein_g, 10.0);
        assert_eq!(n.sodium_mg, 0.0);
        assert_eq!(n.potassium_mg, 0.0);
    }

    #[test]
    fn scaling_rounds_each_field_independently() {
        let base = Nutrients {
            calories: 155.0,
            carbs_g: 3.3,
            fat_g: 1.25,
            ..Nutrients::ZERO
        };
        let scaled = base.scaled(1.5);
        assert_eq!(scaled.calories, 233.0);
        assert_eq!(scaled.carbs_g, 5.0);
        assert_eq!(scaled.fat_g, 2.0);
        assert_eq!(scaled.sugar_g, 0.0);
    }

    #[test]
    fn sum_adds_every_field() {
        let a = Nutrients { calories: 100.0, sodium_mg: 20.0, ..Nutrients::ZERO };
        let b = Nutrients { calories: 50.0, fiber_g: 3.0, ..Nutrients::ZERO };
        let total: Nutrients = [a, b].iter().sum();
        assert_eq!(total.calories, 150.0);
        assert_eq!(total.sodium_mg, 20.0);
        assert_eq!(total.fiber_g, 3.0);
    }

    #[test]
    fn validate_rejects_negative_values() {
        let n = Nutrients { fat_g: -1.0, ..Nutrients::ZERO };
        assert_eq!(n.validate(), Err(ValidationError::Negative("fat")));
    }

    #[test]
    fn lenient_reading_of_ai_output() {
        let v = json!({ "calories": "350kcal", "carbohydrates": 40, "protein": null, "fat": "12.5 g" });
        let n = Nutrients::from_json_lenient(&v);
        assert_eq!(n.calories, 350.0);
        assert_eq!(n.carbs_g, 40.0);
        assert_eq!(n.protein_g, 0.0);
        assert_eq!(n.fat_g, 12.5);
    }

    #[test]
    fn input_requires_calories() {
        let input = NutrientInput { protein_g: Some(5.0), ..Default::default() };
        assert_eq!(input.into_nutrients(), Err(ValidationError::Missing("calories")));
    }

    #[test]
    fn remaining_never_goes_negative() {
        let goals = MacroGoals { calories: 2000.0, carbs_g: 250.0, protein_g: 100.0, fat_g: 60.0 };
        let eaten = Nutrients { calories: 2100.0, carbs_g: 100.0, ..Nutrients::ZERO };
        let left = goals.remaining_after(&eaten);
        assert_eq!(left.calories, 0.0);
        assert_eq!(left.carbs_g, 150.0);
        assert_eq!(left.protein_g, 100.0);
    }
}
