//! Persistence boundary. Handlers and services only see [`NutritionStore`];
//! Postgres backs it in production and [`memory::InMemoryStore`] in tests.

use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::{DateRange, FoodItem, MealLogEntry, NewMealLog, Nutrients, Profile};

pub mod memory;
pub mod postgres;
mod repo_types;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("malformed row: {0}")]
    Malformed(String),
}

/// A food the user saved to their own library.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomFood {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_name: String,
    pub serving_label: Option<String>,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl CustomFood {
    pub fn to_item(&self) -> FoodItem {
        FoodItem {
            id: Some(self.id.to_string()),
            serving_label: self.serving_label.clone(),
            ..FoodItem::named(&self.food_name, self.nutrients)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomFood {
    pub food_name: String,
    pub serving_label: Option<String>,
    pub nutrients: Nutrients,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteFood {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food: FoodItem,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recommendation_text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait NutritionStore: Send + Sync {
    /// `Ok(None)` for a user who has not created a profile yet.
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError>;
    /// Insert or overwrite; no history is kept.
    async fn save_profile(&self, profile: &Profile) -> Result<Profile, StoreError>;

    async fn fetch_logs(&self, user_id: Uuid, range: DateRange) -> Result<Vec<MealLogEntry>, StoreError>;
    async fn insert_log(&self, user_id: Uuid, log: NewMealLog) -> Result<MealLogEntry, StoreError>;
    async fn update_log(&self, user_id: Uuid, id: Uuid, log: NewMealLog) -> Result<Option<MealLogEntry>, StoreError>;
    /// Returns whether a row was removed.
    async fn delete_log(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError>;

    async fn list_custom_foods(&self, user_id: Uuid) -> Result<Vec<CustomFood>, StoreError>;
    /// Case-insensitive substring match on the food name.
    async fn search_custom_foods(&self, user_id: Uuid, query: &str, limit: i64) -> Result<Vec<CustomFood>, StoreError>;
    async fn save_custom_food(&self, user_id: Uuid, id: Option<Uuid>, food: NewCustomFood) -> Result<Option<CustomFood>, StoreError>;
    async fn delete_custom_food(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError>;

    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<FavoriteFood>, StoreError>;
    /// Adds the food when no favorite shares its de-dup key, removes it
    /// otherwise. Returns whether it is a favorite afterwards.
    async fn toggle_favorite(&self, user_id: Uuid, food: FoodItem) -> Result<bool, StoreError>;

    /// Newest first.
    async fn list_recommendations(&self, user_id: Uuid) -> Result<Vec<Recommendation>, StoreError>;
    async fn insert_recommendation(&self, user_id: Uuid, text: &str) -> Result<Recommendation, StoreError>;
    async fn delete_recommendation(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError>;
}
