use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{CustomFoodRequest, FavoriteState, SearchParams};
use super::search::{search_foods, SearchPage};
use crate::{
    auth::AuthUser,
    error::AppError,
    nutrition::{FoodItem, FoodSource},
    state::AppState,
    store::{CustomFood, NewCustomFood},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/foods/search", get(search))
        .route("/foods/custom", get(list_custom).post(create_custom))
        .route("/foods/custom/:id", put(update_custom).delete(delete_custom))
        .route("/foods/favorites", get(list_favorites))
        .route("/foods/favorites/toggle", post(toggle_favorite))
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<SearchParams>,
) -> Result<Json<SearchPage>, (StatusCode, String)> {
    let page = search_foods(
        state.store.as_ref(),
        state.catalog.as_ref(),
        user_id,
        &p.q,
        p.page.unwrap_or(1),
    )
    .await;
    Ok(Json(page))
}

#[instrument(skip(state))]
pub async fn list_custom(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<CustomFood>>, (StatusCode, String)> {
    let foods = state
        .store
        .list_custom_foods(user_id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(foods))
}

#[instrument(skip(state, body))]
pub async fn create_custom(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CustomFoodRequest>,
) -> Result<(StatusCode, Json<CustomFood>), (StatusCode, String)> {
    let food = NewCustomFood::try_from(body).map_err(AppError::from)?;
    let saved = state
        .store
        .save_custom_food(user_id, None, food)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound("custom food"))?;
    info!(%user_id, id = %saved.id, "custom food created");
    Ok((StatusCode::CREATED, Json(saved)))
}

#[instrument(skip(state, body))]
pub async fn update_custom(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CustomFoodRequest>,
) -> Result<Json<CustomFood>, (StatusCode, String)> {
    let food = NewCustomFood::try_from(body).map_err(AppError::from)?;
    let saved = state
        .store
        .save_custom_food(user_id, Some(id), food)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound("custom food"))?;
    Ok(Json(saved))
}

#[instrument(skip(state))]
pub async fn delete_custom(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let removed = state
        .store
        .delete_custom_food(user_id, id)
        .await
        .map_err(AppError::from)?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("custom food").into())
    }
}

/// Favorites as food sources, newest first, ready to be logged as a meal.
#[instrument(skip(state))]
pub async fn list_favorites(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<FoodSource>>, (StatusCode, String)> {
    let favorites = state
        .store
        .list_favorites(user_id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(
        favorites
            .into_iter()
            .map(|f| FoodSource::Favorite(f.food))
            .collect(),
    ))
}

#[instrument(skip(state, food))]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(food): Json<FoodItem>,
) -> Result<Json<FavoriteState>, (StatusCode, String)> {
    if food.name.trim().is_empty() {
        return Err(AppError::from(crate::error::ValidationError::Missing("name")).into());
    }
    food.nutrients.validate().map_err(AppError::from)?;
    let favorite = state
        .store
        .toggle_favorite(user_id, food)
        .await
        .map_err(AppError::from)?;
    info!(%user_id, favorite, "favorite toggled");
    Ok(Json(FavoriteState { favorite }))
}
