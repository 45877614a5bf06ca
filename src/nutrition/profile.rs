use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::goals::{calculate, BodyMetrics, DerivedGoals, GoalPlan};
use super::nutrients::MacroGoals;

/// A user's single active profile. Derived goals are always recomputed from
/// the metrics on save and never edited on their own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub metrics: BodyMetrics,
    #[serde(flatten)]
    pub derived: DerivedGoals,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Profile {
    pub fn from_metrics(user_id: Uuid, metrics: BodyMetrics, now: OffsetDateTime) -> (Self, GoalPlan) {
        let plan = calculate(&metrics);
        let profile = Self {
            user_id,
            metrics,
            derived: plan.derived,
            updated_at: now,
        };
        (profile, plan)
    }

    pub fn goals(&self) -> MacroGoals {
        MacroGoals {
            calories: f64::from(self.derived.goal_calories),
            carbs_g: f64::from(self.derived.recommend_carbs),
            protein_g: f64::from(self.derived.recommend_protein),
            fat_g: f64::from(self.derived.recommend_fat),
        }
    }
}

/// Goals of an optional profile; a new user without one gets all zeros.
pub fn goals_of(profile: Option<&Profile>) -> MacroGoals {
    profile.map(Profile::goals).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::goals::{ActivityLevel, Gender, GoalType};

    #[test]
    fn goals_follow_the_derived_values() {
        let metrics = BodyMetrics::new(
            Gender::Female,
            41,
            165.0,
            70.0,
            72.0,
            ActivityLevel::Light,
            GoalType::Bulkup,
        )
        .unwrap();
        let (profile, plan) = Profile::from_metrics(Uuid::new_v4(), metrics, OffsetDateTime::UNIX_EPOCH);
        assert_eq!(profile.derived, plan.derived);
        let goals = profile.goals();
        assert_eq!(goals.calories, f64::from(plan.derived.goal_calories));
        assert_eq!(goals.fat_g, f64::from(plan.derived.recommend_fat));
    }

    #[test]
    fn no_profile_means_zero_goals() {
        assert_eq!(goals_of(None), MacroGoals::default());
    }
}
