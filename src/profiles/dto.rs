use serde::Deserialize;

use crate::error::ValidationError;
use crate::nutrition::{ActivityLevel, BodyMetrics, Gender, GoalType};

/// A number typed into a form: JSON number or numeric text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Number(f64),
    Text(String),
}

impl NumericField {
    fn parse(&self, name: &'static str) -> Result<f64, ValidationError> {
        let v = match self {
            NumericField::Number(n) => *n,
            NumericField::Text(s) if s.trim().is_empty() => return Err(ValidationError::Missing(name)),
            NumericField::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ValidationError::NotNumeric(name))?,
        };
        if v.is_finite() {
            Ok(v)
        } else {
            Err(ValidationError::NotNumeric(name))
        }
    }
}

fn required(field: &Option<NumericField>, name: &'static str) -> Result<f64, ValidationError> {
    field
        .as_ref()
        .ok_or(ValidationError::Missing(name))?
        .parse(name)
}

fn non_blank(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Body of profile save and calculator preview.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    pub gender: Option<String>,
    pub age: Option<NumericField>,
    #[serde(alias = "height_cm")]
    pub height: Option<NumericField>,
    #[serde(alias = "current_weight_kg", alias = "weight")]
    pub current_weight: Option<NumericField>,
    #[serde(alias = "goal_weight_kg")]
    pub goal_weight: Option<NumericField>,
    #[serde(alias = "activity_factor", alias = "activity")]
    pub activity_level: Option<NumericField>,
    pub goal_type: Option<String>,
}

impl TryFrom<ProfileForm> for BodyMetrics {
    type Error = ValidationError;

    fn try_from(form: ProfileForm) -> Result<Self, Self::Error> {
        let height = required(&form.height, "height")?;
        let current_weight = required(&form.current_weight, "current_weight")?;
        let goal_weight = required(&form.goal_weight, "goal_weight")?;
        let age = required(&form.age, "age")?.trunc();
        if age < 1.0 {
            return Err(ValidationError::NotPositive("age"));
        }

        let gender = match non_blank(&form.gender) {
            Some(g) => g.parse::<Gender>()?,
            None => Gender::default(),
        };
        let activity = match &form.activity_level {
            Some(f) => ActivityLevel::try_from(f.parse("activity_level")?)?,
            None => ActivityLevel::default(),
        };
        let goal_type = match non_blank(&form.goal_type) {
            Some(g) => g.parse::<GoalType>()?,
            None => GoalType::default(),
        };

        BodyMetrics::new(
            gender,
            age as u32,
            height,
            current_weight,
            goal_weight,
            activity,
            goal_type,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(v: serde_json::Value) -> ProfileForm {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn accepts_numeric_strings_and_defaults() {
        let m = BodyMetrics::try_from(form(json!({
            "age": "30.9", "height": "175", "current_weight": 80, "goal_weight": "75.5"
        })))
        .unwrap();
        assert_eq!(m.age, 30);
        assert_eq!(m.goal_weight_kg, 75.5);
        assert_eq!(m.gender, Gender::Male);
        assert_eq!(m.activity, ActivityLevel::Sedentary);
        assert_eq!(m.goal_type, GoalType::Maintain);
    }

    #[test]
    fn missing_or_bad_required_fields() {
        let err = BodyMetrics::try_from(form(json!({ "age": 30, "height": 175, "current_weight": 80 })))
            .unwrap_err();
        assert_eq!(err, ValidationError::Missing("goal_weight"));

        let err = BodyMetrics::try_from(form(json!({
            "age": 30, "height": "abc", "current_weight": 80, "goal_weight": 75
        })))
        .unwrap_err();
        assert_eq!(err, ValidationError::NotNumeric("height"));

        let err = BodyMetrics::try_from(form(json!({
            "age": "0.5", "height": 170, "current_weight": 80, "goal_weight": 75
        })))
        .unwrap_err();
        assert_eq!(err, ValidationError::NotPositive("age"));

        let err = BodyMetrics::try_from(form(json!({
            "age": 30, "height": 170, "current_weight": "", "goal_weight": 75
        })))
        .unwrap_err();
        assert_eq!(err, ValidationError::Missing("current_weight"));
    }

    #[test]
    fn rejects_values_outside_the_enumerations() {
        let base = json!({ "age": 30, "height": 175, "current_weight": 80, "goal_weight": 75 });

        let mut v = base.clone();
        v["activity_level"] = json!(1.3);
        assert!(matches!(
            BodyMetrics::try_from(form(v)),
            Err(ValidationError::Unsupported { field: "activity_level", .. })
        ));

        let mut v = base.clone();
        v["goal_type"] = json!("keto");
        assert!(BodyMetrics::try_from(form(v)).is_err());

        let mut v = base;
        v["activity_level"] = json!("1.55");
        v["goal_type"] = json!("diet");
        v["gender"] = json!("female");
        let m = BodyMetrics::try_from(form(v)).unwrap();
        assert_eq!(m.activity, ActivityLevel::Moderate);
        assert_eq!(m.goal_type, GoalType::Diet);
        assert_eq!(m.gender, Gender::Female);
    }
}
