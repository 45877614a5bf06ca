use async_trait::async_trait;
use sqlx::{postgres::PgArguments, query::QueryAs, PgPool, Postgres};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::repo_types::{CustomFoodRow, FavoriteFoodRow, MealLogRow, ProfileRow, RecommendationRow};
use super::{CustomFood, FavoriteFood, NewCustomFood, NutritionStore, Recommendation, StoreError};
use crate::nutrition::{DateRange, FoodItem, MealLogEntry, NewMealLog, Nutrients, Profile};

const PROFILE_COLUMNS: &str = "user_id, gender, age, height, current_weight, goal_weight, \
    activity_level, goal_type, bmr, tdee, goal_calories, \
    recommend_carbs, recommend_protein, recommend_fat, updated_at";

const NUTRIENT_COLUMNS: &str = "calories, carbs, protein, fat, sugar, fiber, saturated_fat, \
    trans_fat, cholesterol, sodium, potassium";

const RECOMMENDATION_COLUMNS: &str = "id, user_id, recommendation_text, created_at";

/// Postgres-backed store; every query is scoped by `user_id`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Binds the eleven nutrient values in `NUTRIENT_COLUMNS` order.
fn bind_nutrients<'q, O>(
    q: QueryAs<'q, Postgres, O, PgArguments>,
    n: &Nutrients,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    q.bind(n.calories)
        .bind(n.carbs_g)
        .bind(n.protein_g)
        .bind(n.fat_g)
        .bind(n.sugar_g)
        .bind(n.fiber_g)
        .bind(n.saturated_fat_g)
        .bind(n.trans_fat_g)
        .bind(n.cholesterol_mg)
        .bind(n.sodium_mg)
        .bind(n.potassium_mg)
}

/// `$start, $start+1, ...` for `count` placeholders.
fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn log_columns() -> String {
    format!("id, user_id, date, meal_type, food_name, {}, created_at", NUTRIENT_COLUMNS)
}

fn custom_food_columns() -> String {
    format!("id, user_id, food_name, serving_label, {}, created_at", NUTRIENT_COLUMNS)
}

fn favorite_columns() -> String {
    format!(
        "id, user_id, food_name, maker_name, external_code, serving_label, {}, created_at",
        NUTRIENT_COLUMNS
    )
}

#[async_trait]
impl NutritionStore for PgStore {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let sql = format!("SELECT {} FROM user_profiles WHERE user_id = $1", PROFILE_COLUMNS);
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Profile::try_from).transpose()
    }

    async fn save_profile(&self, profile: &Profile) -> Result<Profile, StoreError> {
        let m = &profile.metrics;
        let d = &profile.derived;
        let age = i32::try_from(m.age).map_err(|e| StoreError::Malformed(e.to_string()))?;
        let sql = format!(
            r#"
            INSERT INTO user_profiles ({cols})
            VALUES ({values})
            ON CONFLICT (user_id) DO UPDATE SET
                gender = EXCLUDED.gender,
                age = EXCLUDED.age,
                height = EXCLUDED.height,
                current_weight = EXCLUDED.current_weight,
                goal_weight = EXCLUDED.goal_weight,
                activity_level = EXCLUDED.activity_level,
                goal_type = EXCLUDED.goal_type,
                bmr = EXCLUDED.bmr,
                tdee = EXCLUDED.tdee,
                goal_calories = EXCLUDED.goal_calories,
                recommend_carbs = EXCLUDED.recommend_carbs,
                recommend_protein = EXCLUDED.recommend_protein,
                recommend_fat = EXCLUDED.recommend_fat,
                updated_at = EXCLUDED.updated_at
            RETURNING {cols}
            "#,
            cols = PROFILE_COLUMNS,
            values = placeholders(1, 15),
        );
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(profile.user_id)
            .bind(m.gender.as_str())
            .bind(age)
            .bind(m.height_cm)
            .bind(m.current_weight_kg)
            .bind(m.goal_weight_kg)
            .bind(m.activity.factor())
            .bind(m.goal_type.as_str())
            .bind(d.bmr)
            .bind(d.tdee)
            .bind(d.goal_calories)
            .bind(d.recommend_carbs)
            .bind(d.recommend_protein)
            .bind(d.recommend_fat)
            .bind(profile.updated_at)
            .fetch_one(&self.pool)
            .await?;
        debug!(user_id = %profile.user_id, "profile upserted");
        Profile::try_from(row)
    }

    async fn fetch_logs(&self, user_id: Uuid, range: DateRange) -> Result<Vec<MealLogEntry>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM meal_logs
            WHERE user_id = $1 AND date BETWEEN $2 AND $3
            ORDER BY date ASC, created_at ASC
            "#,
            log_columns()
        );
        let rows = sqlx::query_as::<_, MealLogRow>(&sql)
            .bind(user_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(MealLogEntry::try_from).collect()
    }

    async fn insert_log(&self, user_id: Uuid, log: NewMealLog) -> Result<MealLogEntry, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO meal_logs (id, user_id, date, meal_type, food_name, {nutrients}, created_at)
            VALUES ($1, $2, $3, $4, $5, {values}, $17)
            RETURNING {cols}
            "#,
            nutrients = NUTRIENT_COLUMNS,
            values = placeholders(6, 11),
            cols = log_columns(),
        );
        let q = sqlx::query_as::<_, MealLogRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(log.date)
            .bind(log.meal_slot.as_str())
            .bind(&log.food_name);
        let row = bind_nutrients(q, &log.nutrients)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(&self.pool)
            .await?;
        MealLogEntry::try_from(row)
    }

    async fn update_log(&self, user_id: Uuid, id: Uuid, log: NewMealLog) -> Result<Option<MealLogEntry>, StoreError> {
        let sql = format!(
            r#"
            UPDATE meal_logs SET
                date = $3, meal_type = $4, food_name = $5,
                calories = $6, carbs = $7, protein = $8, fat = $9, sugar = $10, fiber = $11,
                saturated_fat = $12, trans_fat = $13, cholesterol = $14, sodium = $15, potassium = $16
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            log_columns()
        );
        let q = sqlx::query_as::<_, MealLogRow>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(log.date)
            .bind(log.meal_slot.as_str())
            .bind(&log.food_name);
        let row = bind_nutrients(q, &log.nutrients)
            .fetch_optional(&self.pool)
            .await?;
        row.map(MealLogEntry::try_from).transpose()
    }

    async fn delete_log(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM meal_logs WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_custom_foods(&self, user_id: Uuid) -> Result<Vec<CustomFood>, StoreError> {
        let sql = format!(
            "SELECT {} FROM user_custom_foods WHERE user_id = $1 ORDER BY created_at DESC",
            custom_food_columns()
        );
        let rows = sqlx::query_as::<_, CustomFoodRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(CustomFood::from).collect())
    }

    async fn search_custom_foods(&self, user_id: Uuid, query: &str, limit: i64) -> Result<Vec<CustomFood>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM user_custom_foods
            WHERE user_id = $1 AND food_name ILIKE $2
            ORDER BY food_name ASC
            LIMIT $3
            "#,
            custom_food_columns()
        );
        let rows = sqlx::query_as::<_, CustomFoodRow>(&sql)
            .bind(user_id)
            .bind(format!("%{}%", escape_like(query.trim())))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(CustomFood::from).collect())
    }

    async fn save_custom_food(&self, user_id: Uuid, id: Option<Uuid>, food: NewCustomFood) -> Result<Option<CustomFood>, StoreError> {
        let row = match id {
            None => {
                let sql = format!(
                    r#"
                    INSERT INTO user_custom_foods (id, user_id, food_name, serving_label, {nutrients}, created_at)
                    VALUES ($1, $2, $3, $4, {values}, $16)
                    RETURNING {cols}
                    "#,
                    nutrients = NUTRIENT_COLUMNS,
                    values = placeholders(5, 11),
                    cols = custom_food_columns(),
                );
                let q = sqlx::query_as::<_, CustomFoodRow>(&sql)
                    .bind(Uuid::new_v4())
                    .bind(user_id)
                    .bind(&food.food_name)
                    .bind(&food.serving_label);
                Some(
                    bind_nutrients(q, &food.nutrients)
                        .bind(OffsetDateTime::now_utc())
                        .fetch_one(&self.pool)
                        .await?,
                )
            }
            Some(id) => {
                let sql = format!(
                    r#"
                    UPDATE user_custom_foods SET
                        food_name = $3, serving_label = $4,
                        calories = $5, carbs = $6, protein = $7, fat = $8, sugar = $9, fiber = $10,
                        saturated_fat = $11, trans_fat = $12, cholesterol = $13, sodium = $14, potassium = $15
                    WHERE id = $1 AND user_id = $2
                    RETURNING {}
                    "#,
                    custom_food_columns()
                );
                let q = sqlx::query_as::<_, CustomFoodRow>(&sql)
                    .bind(id)
                    .bind(user_id)
                    .bind(&food.food_name)
                    .bind(&food.serving_label);
                bind_nutrients(q, &food.nutrients)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };
        Ok(row.map(CustomFood::from))
    }

    async fn delete_custom_food(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM user_custom_foods WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<FavoriteFood>, StoreError> {
        let sql = format!(
            "SELECT {} FROM user_favorite_foods WHERE user_id = $1 ORDER BY created_at DESC",
            favorite_columns()
        );
        let rows = sqlx::query_as::<_, FavoriteFoodRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(FavoriteFood::from).collect())
    }

    async fn toggle_favorite(&self, user_id: Uuid, food: FoodItem) -> Result<bool, StoreError> {
        let key = food.dedup_key();
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM user_favorite_foods WHERE user_id = $1 AND dedup_key = $2")
            .bind(user_id)
            .bind(&key)
            .execute(&mut *tx)
            .await?;
        if removed.rows_affected() > 0 {
            tx.commit().await?;
            debug!(user_id = %user_id, key = %key, "favorite removed");
            return Ok(false);
        }

        let sql = format!(
            r#"
            INSERT INTO user_favorite_foods
                (id, user_id, dedup_key, food_name, maker_name, external_code, serving_label, {nutrients}, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, {values}, $19)
            ON CONFLICT (user_id, dedup_key) DO NOTHING
            RETURNING {cols}
            "#,
            nutrients = NUTRIENT_COLUMNS,
            values = placeholders(8, 11),
            cols = favorite_columns(),
        );
        let q = sqlx::query_as::<_, FavoriteFoodRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&key)
            .bind(&food.name)
            .bind(&food.maker)
            .bind(&food.external_code)
            .bind(&food.serving_label);
        bind_nutrients(q, &food.nutrients)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        debug!(user_id = %user_id, key = %key, "favorite added");
        Ok(true)
    }

    async fn list_recommendations(&self, user_id: Uuid) -> Result<Vec<Recommendation>, StoreError> {
        let sql = format!(
            "SELECT {} FROM ai_recommendations WHERE user_id = $1 ORDER BY created_at DESC",
            RECOMMENDATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, RecommendationRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Recommendation::from).collect())
    }

    async fn insert_recommendation(&self, user_id: Uuid, text: &str) -> Result<Recommendation, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO ai_recommendations (id, user_id, recommendation_text, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            RECOMMENDATION_COLUMNS
        );
        let row = sqlx::query_as::<_, RecommendationRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(text)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn delete_recommendation(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM ai_recommendations WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
