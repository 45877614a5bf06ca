//! Daily calorie and macro targets from body metrics.
//!
//! BMR uses the Mifflin-St Jeor equation; TDEE scales it by an activity
//! factor; the goal adds or removes a fixed 500 kcal depending on whether the
//! user wants to gain or lose weight.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::nutrients::{KCAL_PER_GRAM_CARBS, KCAL_PER_GRAM_FAT, KCAL_PER_GRAM_PROTEIN};
use crate::error::ValidationError;

pub const CALORIE_ADJUSTMENT: f64 = 500.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    fn bmr_offset(self) -> f64 {
        match self {
            Gender::Male => 5.0,
            Gender::Female => -161.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(ValidationError::Unsupported {
                field: "gender",
                value: other.to_string(),
            }),
        }
    }
}

/// Activity multiplier applied to BMR. Serialized as the raw factor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::Sedentary,
        ActivityLevel::Light,
        ActivityLevel::Moderate,
        ActivityLevel::Active,
        ActivityLevel::VeryActive,
    ];

    pub fn factor(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }

    pub fn from_factor(factor: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| (level.factor() - factor).abs() < 1e-9)
    }
}

impl From<ActivityLevel> for f64 {
    fn from(level: ActivityLevel) -> f64 {
        level.factor()
    }
}

impl TryFrom<f64> for ActivityLevel {
    type Error = ValidationError;

    fn try_from(factor: f64) -> Result<Self, Self::Error> {
        ActivityLevel::from_factor(factor).ok_or_else(|| ValidationError::Unsupported {
            field: "activity_level",
            value: factor.to_string(),
        })
    }
}

/// Share of goal calories (by energy) given to each macro.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroRatios {
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    #[default]
    Maintain,
    Diet,
    Bulkup,
}

impl GoalType {
    pub fn ratios(self) -> MacroRatios {
        match self {
            GoalType::Maintain => MacroRatios { carbs: 0.5, protein: 0.2, fat: 0.3 },
            GoalType::Diet => MacroRatios { carbs: 0.4, protein: 0.4, fat: 0.2 },
            GoalType::Bulkup => MacroRatios { carbs: 0.5, protein: 0.3, fat: 0.2 },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GoalType::Maintain => "maintain",
            GoalType::Diet => "diet",
            GoalType::Bulkup => "bulkup",
        }
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "maintain" => Ok(GoalType::Maintain),
            "diet" => Ok(GoalType::Diet),
            "bulkup" => Ok(GoalType::Bulkup),
            other => Err(ValidationError::Unsupported {
                field: "goal_type",
                value: other.to_string(),
            }),
        }
    }
}

/// Validated calculator input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyMetrics {
    pub gender: Gender,
    pub age: u32,
    pub height_cm: f64,
    pub current_weight_kg: f64,
    pub goal_weight_kg: f64,
    pub activity: ActivityLevel,
    pub goal_type: GoalType,
}

impl BodyMetrics {
    pub fn new(
        gender: Gender,
        age: u32,
        height_cm: f64,
        current_weight_kg: f64,
        goal_weight_kg: f64,
        activity: ActivityLevel,
        goal_type: GoalType,
    ) -> Result<Self, ValidationError> {
        if age == 0 {
            return Err(ValidationError::NotPositive("age"));
        }
        for (name, value) in [
            ("height", height_cm),
            ("current_weight", current_weight_kg),
            ("goal_weight", goal_weight_kg),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::NotNumeric(name));
            }
            if value <= 0.0 {
                return Err(ValidationError::NotPositive(name));
            }
        }
        Ok(Self {
            gender,
            age,
            height_cm,
            current_weight_kg,
            goal_weight_kg,
            activity,
            goal_type,
        })
    }
}

/// Stored, rounded outputs of the calculator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedGoals {
    pub bmr: i32,
    pub tdee: i32,
    pub goal_calories: i32,
    pub recommend_carbs: i32,
    pub recommend_protein: i32,
    pub recommend_fat: i32,
}

/// Calculator result: two-decimal BMR/TDEE for display plus the stored values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalPlan {
    pub bmr_display: f64,
    pub tdee_display: f64,
    #[serde(flatten)]
    pub derived: DerivedGoals,
}

pub fn basal_metabolic_rate(m: &BodyMetrics) -> f64 {
    10.0 * m.current_weight_kg + 6.25 * m.height_cm - 5.0 * f64::from(m.age) + m.gender.bmr_offset()
}

pub fn goal_calories(tdee: f64, current_weight_kg: f64, goal_weight_kg: f64) -> f64 {
    if goal_weight_kg < current_weight_kg {
        tdee - CALORIE_ADJUSTMENT
    } else if goal_weight_kg > current_weight_kg {
        tdee + CALORIE_ADJUSTMENT
    } else {
        tdee
    }
}

pub fn calculate(m: &BodyMetrics) -> GoalPlan {
    let bmr = basal_metabolic_rate(m);
    let tdee = bmr * m.activity.factor();
    let goal = goal_calories(tdee, m.current_weight_kg, m.goal_weight_kg);
    let ratios = m.goal_type.ratios();

    let grams = |ratio: f64, kcal_per_gram: f64| (goal * ratio / kcal_per_gram).round() as i32;

    GoalPlan {
        bmr_display: round2(bmr),
        tdee_display: round2(tdee),
        derived: DerivedGoals {
            bmr: bmr.round() as i32,
            tdee: tdee.round() as i32,
            goal_calories: goal.round() as i32,
            recommend_carbs: grams(ratios.carbs, KCAL_PER_GRAM_CARBS),
            recommend_protein: grams(ratios.protein, KCAL_PER_GRAM_PROTEIN),
            recommend_fat: grams(ratios.fat, KCAL_PER_GRAM_FAT),
        },
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(goal_weight: f64, goal_type: GoalType) -> BodyMetrics {
        BodyMetrics::new(
            Gender::Male,
            30,
            175.0,
            80.0,
            goal_weight,
            ActivityLevel::Moderate,
            goal_type,
        )
        .unwrap()
    }

    #[test]
    fn diet_scenario() {
        let plan = calculate(&metrics(75.0, GoalType::Diet));
        // 800 + 1093.75 - 150 + 5
        assert_eq!(plan.bmr_display, 1748.75);
        assert_eq!(plan.tdee_display, 2710.56);
        assert_eq!(plan.derived.bmr, 1749);
        assert_eq!(plan.derived.tdee, 2711);
        assert_eq!(plan.derived.goal_calories, 2211);
        assert_eq!(plan.derived.recommend_carbs, 221);
        assert_eq!(plan.derived.recommend_protein, 221);
        assert_eq!(plan.derived.recommend_fat, 49);
    }

    #[test]
    fn plan_serializes_each_key_once() {
        let plan = calculate(&metrics(75.0, GoalType::Diet));
        let json = serde_json::to_string(&plan).unwrap();
        for key in ["bmr", "tdee", "bmr_display", "tdee_display", "goal_calories"] {
            let needle = format!("\"{}\":", key);
            assert_eq!(json.matches(&needle).count(), 1, "{} in {}", key, json);
        }
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["bmr_display"], 1748.75);
        assert_eq!(v["bmr"], 1749);
    }

    #[test]
    fn female_offset_and_maintenance() {
        let m = BodyMetrics::new(
            Gender::Female,
            25,
            160.0,
            55.0,
            55.0,
            ActivityLevel::Sedentary,
            GoalType::Maintain,
        )
        .unwrap();
        // 550 + 1000 - 125 - 161
        assert_eq!(basal_metabolic_rate(&m), 1264.0);
        let plan = calculate(&m);
        assert_eq!(plan.derived.goal_calories, plan.derived.tdee);
    }

    #[test]
    fn goal_stays_within_adjustment_of_tdee() {
        for goal_weight in [60.0, 80.0, 95.0] {
            for goal_type in [GoalType::Maintain, GoalType::Diet, GoalType::Bulkup] {
                let plan = calculate(&metrics(goal_weight, goal_type));
                let diff = (plan.derived.goal_calories - plan.derived.tdee).abs();
                assert!(diff <= 501, "diff {} for {}", diff, goal_weight);
                if goal_weight == 80.0 {
                    assert_eq!(plan.derived.goal_calories, plan.derived.tdee);
                }
            }
        }
    }

    #[test]
    fn macro_energy_is_close_to_goal_calories() {
        for goal_type in [GoalType::Maintain, GoalType::Diet, GoalType::Bulkup] {
            let plan = calculate(&metrics(90.0, goal_type));
            let d = plan.derived;
            let energy = d.recommend_carbs * 4 + d.recommend_protein * 4 + d.recommend_fat * 9;
            assert!((energy - d.goal_calories).abs() <= 9, "{} vs {}", energy, d.goal_calories);
        }
    }

    #[test]
    fn rejects_non_positive_inputs() {
        let err = BodyMetrics::new(
            Gender::Male,
            30,
            0.0,
            80.0,
            75.0,
            ActivityLevel::Sedentary,
            GoalType::Maintain,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::NotPositive("height"));

        let err = BodyMetrics::new(
            Gender::Male,
            0,
            170.0,
            80.0,
            75.0,
            ActivityLevel::Sedentary,
            GoalType::Maintain,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::NotPositive("age"));
    }

    #[test]
    fn activity_factor_round_trips_and_rejects_unknown() {
        assert_eq!(ActivityLevel::from_factor(1.725), Some(ActivityLevel::Active));
        assert!(ActivityLevel::try_from(1.3).is_err());
        let json = serde_json::to_string(&ActivityLevel::Light).unwrap();
        assert_eq!(json, "1.375");
    }

    #[test]
    fn parses_goal_type_and_gender() {
        assert_eq!("Diet".parse::<GoalType>().unwrap(), GoalType::Diet);
        assert!("keto".parse::<GoalType>().is_err());
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
    }
}
