use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::{CustomFood, FavoriteFood, Recommendation, StoreError};
use crate::nutrition::{
    ActivityLevel, BodyMetrics, DerivedGoals, FoodItem, GoalType, MealLogEntry, Nutrients, Profile,
};

/// Row of `user_profiles`.
#[derive(Debug, FromRow)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub gender: String,
    pub age: i32,
    pub height: f64,
    pub current_weight: f64,
    pub goal_weight: f64,
    pub activity_level: Option<f64>, // older rows may lack it
    pub goal_type: Option<String>,   // older rows may lack it
    pub bmr: i32,
    pub tdee: i32,
    pub goal_calories: i32,
    pub recommend_carbs: Option<i32>,
    pub recommend_protein: Option<i32>,
    pub recommend_fat: Option<i32>,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(r: ProfileRow) -> Result<Self, Self::Error> {
        let malformed = |e: crate::error::ValidationError| StoreError::Malformed(e.to_string());
        let activity = match r.activity_level {
            Some(f) => ActivityLevel::try_from(f).map_err(malformed)?,
            None => ActivityLevel::default(),
        };
        let goal_type = match r.goal_type.as_deref() {
            Some(s) => s.parse::<GoalType>().map_err(malformed)?,
            None => GoalType::default(),
        };
        let metrics = BodyMetrics {
            gender: r.gender.parse().map_err(malformed)?,
            age: u32::try_from(r.age).map_err(|e| StoreError::Malformed(e.to_string()))?,
            height_cm: r.height,
            current_weight_kg: r.current_weight,
            goal_weight_kg: r.goal_weight,
            activity,
            goal_type,
        };
        Ok(Profile {
            user_id: r.user_id,
            metrics,
            derived: DerivedGoals {
                bmr: r.bmr,
                tdee: r.tdee,
                goal_calories: r.goal_calories,
                recommend_carbs: r.recommend_carbs.unwrap_or_default(),
                recommend_protein: r.recommend_protein.unwrap_or_default(),
                recommend_fat: r.recommend_fat.unwrap_or_default(),
            },
            updated_at: r.updated_at,
        })
    }
}

/// Nutrient columns shared by `meal_logs`, `user_custom_foods` and
/// `user_favorite_foods`. Micros are nullable.
#[derive(Debug, FromRow)]
pub struct NutrientColumns {
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub sugar: Option<f64>,
    pub fiber: Option<f64>,
    pub saturated_fat: Option<f64>,
    pub trans_fat: Option<f64>,
    pub cholesterol: Option<f64>,
    pub sodium: Option<f64>,
    pub potassium: Option<f64>,
}

impl From<NutrientColumns> for Nutrients {
    fn from(c: NutrientColumns) -> Self {
        Nutrients {
            calories: c.calories,
            carbs_g: c.carbs,
            protein_g: c.protein,
            fat_g: c.fat,
            sugar_g: c.sugar.unwrap_or_default(),
            fiber_g: c.fiber.unwrap_or_default(),
            saturated_fat_g: c.saturated_fat.unwrap_or_default(),
            trans_fat_g: c.trans_fat.unwrap_or_default(),
            cholesterol_mg: c.cholesterol.unwrap_or_default(),
            sodium_mg: c.sodium.unwrap_or_default(),
            potassium_mg: c.potassium.unwrap_or_default(),
        }
    }
}

/// Row of `meal_logs`.
#[derive(Debug, FromRow)]
pub struct MealLogRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: Date,
    pub meal_type: String,
    pub food_name: String,
    #[sqlx(flatten)]
    pub nutrients: NutrientColumns,
    pub created_at: OffsetDateTime,
}

impl TryFrom<MealLogRow> for MealLogEntry {
    type Error = StoreError;

    fn try_from(r: MealLogRow) -> Result<Self, Self::Error> {
        Ok(MealLogEntry {
            id: r.id,
            user_id: r.user_id,
            date: r.date,
            meal_slot: r
                .meal_type
                .parse()
                .map_err(|e: crate::error::ValidationError| StoreError::Malformed(e.to_string()))?,
            food_name: r.food_name,
            nutrients: r.nutrients.into(),
            created_at: r.created_at,
        })
    }
}

/// Row of `user_custom_foods`.
#[derive(Debug, FromRow)]
pub struct CustomFoodRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_name: String,
    pub serving_label: Option<String>,
    #[sqlx(flatten)]
    pub nutrients: NutrientColumns,
    pub created_at: OffsetDateTime,
}

impl From<CustomFoodRow> for CustomFood {
    fn from(r: CustomFoodRow) -> Self {
        CustomFood {
            id: r.id,
            user_id: r.user_id,
            food_name: r.food_name,
            serving_label: r.serving_label,
            nutrients: r.nutrients.into(),
            created_at: r.created_at,
        }
    }
}

/// Row of `user_favorite_foods`.
#[derive(Debug, FromRow)]
pub struct FavoriteFoodRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_name: String,
    pub maker_name: Option<String>,
    pub external_code: Option<String>,
    pub serving_label: Option<String>,
    #[sqlx(flatten)]
    pub nutrients: NutrientColumns,
    pub created_at: OffsetDateTime,
}

impl From<FavoriteFoodRow> for FavoriteFood {
    fn from(r: FavoriteFoodRow) -> Self {
        FavoriteFood {
            id: r.id,
            user_id: r.user_id,
            food: FoodItem {
                id: Some(r.id.to_string()),
                name: r.food_name,
                maker: r.maker_name,
                external_code: r.external_code,
                serving_label: r.serving_label,
                nutrients: r.nutrients.into(),
            },
            created_at: r.created_at,
        }
    }
}

/// Row of `ai_recommendations`.
#[derive(Debug, FromRow)]
pub struct RecommendationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recommendation_text: String,
    pub created_at: OffsetDateTime,
}

impl From<RecommendationRow> for Recommendation {
    fn from(r: RecommendationRow) -> Self {
        Recommendation {
            id: r.id,
            user_id: r.user_id,
            recommendation_text: r.recommendation_text,
            created_at: r.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_micros_read_as_zero() {
        let cols = NutrientColumns {
            calories: 120.0,
            carbs: 10.0,
            protein: 4.0,
            fat: 2.0,
            sugar: None,
            fiber: Some(1.5),
            saturated_fat: None,
            trans_fat: None,
            cholesterol: None,
            sodium: Some(80.0),
            potassium: None,
        };
        let n: Nutrients = cols.into();
        assert_eq!(n.sugar_g, 0.0);
        assert_eq!(n.fiber_g, 1.5);
        assert_eq!(n.sodium_mg, 80.0);
    }

    #[test]
    fn profile_row_defaults_missing_activity_and_goal_type() {
        let row = ProfileRow {
            user_id: Uuid::new_v4(),
            gender: "female".into(),
            age: 33,
            height: 162.0,
            current_weight: 58.0,
            goal_weight: 55.0,
            activity_level: None,
            goal_type: None,
            bmr: 1300,
            tdee: 1560,
            goal_calories: 1060,
            recommend_carbs: None,
            recommend_protein: None,
            recommend_fat: None,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        let p = Profile::try_from(row).unwrap();
        assert_eq!(p.metrics.activity, ActivityLevel::Sedentary);
        assert_eq!(p.metrics.goal_type, GoalType::Maintain);
        assert_eq!(p.derived.recommend_fat, 0);
    }
}
