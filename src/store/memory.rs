use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CustomFood, FavoriteFood, NewCustomFood, NutritionStore, Recommendation, StoreError};
use crate::nutrition::{DateRange, FoodItem, MealLogEntry, NewMealLog, Profile};

#[derive(Default)]
struct Tables {
    profiles: HashMap<Uuid, Profile>,
    logs: Vec<MealLogEntry>,
    custom_foods: Vec<CustomFood>,
    favorites: Vec<(String, FavoriteFood)>,
    recommendations: Vec<Recommendation>,
}

/// Process-local store used by tests and `AppState::fake`.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NutritionStore for InMemoryStore {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }

    async fn save_profile(&self, profile: &Profile) -> Result<Profile, StoreError> {
        self.tables
            .write()
            .await
            .profiles
            .insert(profile.user_id, profile.clone());
        Ok(profile.clone())
    }

    async fn fetch_logs(&self, user_id: Uuid, range: DateRange) -> Result<Vec<MealLogEntry>, StoreError> {
        let tables = self.tables.read().await;
        let mut logs: Vec<MealLogEntry> = tables
            .logs
            .iter()
            .filter(|e| e.user_id == user_id && range.contains(e.date))
            .cloned()
            .collect();
        logs.sort_by_key(|e| (e.date, e.created_at));
        Ok(logs)
    }

    async fn insert_log(&self, user_id: Uuid, log: NewMealLog) -> Result<MealLogEntry, StoreError> {
        let entry = MealLogEntry {
            id: Uuid::new_v4(),
            user_id,
            date: log.date,
            meal_slot: log.meal_slot,
            food_name: log.food_name,
            nutrients: log.nutrients,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables.write().await.logs.push(entry.clone());
        Ok(entry)
    }

    async fn update_log(&self, user_id: Uuid, id: Uuid, log: NewMealLog) -> Result<Option<MealLogEntry>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(entry) = tables
            .logs
            .iter_mut()
            .find(|e| e.id == id && e.user_id == user_id)
        else {
            return Ok(None);
        };
        entry.date = log.date;
        entry.meal_slot = log.meal_slot;
        entry.food_name = log.food_name;
        entry.nutrients = log.nutrients;
        Ok(Some(entry.clone()))
    }

    async fn delete_log(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.logs.len();
        tables.logs.retain(|e| !(e.id == id && e.user_id == user_id));
        Ok(tables.logs.len() != before)
    }

    async fn list_custom_foods(&self, user_id: Uuid) -> Result<Vec<CustomFood>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .custom_foods
            .iter()
            .rev()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn search_custom_foods(&self, user_id: Uuid, query: &str, limit: i64) -> Result<Vec<CustomFood>, StoreError> {
        let needle = query.trim().to_lowercase();
        let tables = self.tables.read().await;
        let mut hits: Vec<CustomFood> = tables
            .custom_foods
            .iter()
            .filter(|f| f.user_id == user_id && f.food_name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.food_name.cmp(&b.food_name));
        hits.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(hits)
    }

    async fn save_custom_food(&self, user_id: Uuid, id: Option<Uuid>, food: NewCustomFood) -> Result<Option<CustomFood>, StoreError> {
        let mut tables = self.tables.write().await;
        match id {
            None => {
                let saved = CustomFood {
                    id: Uuid::new_v4(),
                    user_id,
                    food_name: food.food_name,
                    serving_label: food.serving_label,
                    nutrients: food.nutrients,
                    created_at: OffsetDateTime::now_utc(),
                };
                tables.custom_foods.push(saved.clone());
                Ok(Some(saved))
            }
            Some(id) => Ok(tables
                .custom_foods
                .iter_mut()
                .find(|f| f.id == id && f.user_id == user_id)
                .map(|f| {
                    f.food_name = food.food_name;
                    f.serving_label = food.serving_label;
                    f.nutrients = food.nutrients;
                    f.clone()
                })),
        }
    }

    async fn delete_custom_food(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.custom_foods.len();
        tables.custom_foods.retain(|f| !(f.id == id && f.user_id == user_id));
        Ok(tables.custom_foods.len() != before)
    }

    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<FavoriteFood>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .favorites
            .iter()
            .rev()
            .filter(|(_, f)| f.user_id == user_id)
            .map(|(_, f)| f.clone())
            .collect())
    }

    async fn toggle_favorite(&self, user_id: Uuid, food: FoodItem) -> Result<bool, StoreError> {
        let key = food.dedup_key();
        let mut tables = self.tables.write().await;
        let before = tables.favorites.len();
        tables
            .favorites
            .retain(|(k, f)| !(f.user_id == user_id && *k == key));
        if tables.favorites.len() != before {
            return Ok(false);
        }
        let id = Uuid::new_v4();
        tables.favorites.push((
            key,
            FavoriteFood {
                id,
                user_id,
                food: FoodItem {
                    id: Some(id.to_string()),
                    ..food
                },
                created_at: OffsetDateTime::now_utc(),
            },
        ));
        Ok(true)
    }

    async fn list_recommendations(&self, user_id: Uuid) -> Result<Vec<Recommendation>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .recommendations
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_recommendation(&self, user_id: Uuid, text: &str) -> Result<Recommendation, StoreError> {
        let rec = Recommendation {
            id: Uuid::new_v4(),
            user_id,
            recommendation_text: text.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables.write().await.recommendations.push(rec.clone());
        Ok(rec)
    }

    async fn delete_recommendation(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.recommendations.len();
        tables
            .recommendations
            .retain(|r| !(r.id == id && r.user_id == user_id));
        Ok(tables.recommendations.len() != before)
    }
}
