use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, put},
    Json, Router,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::dto::{DayLog, DayQuery, MealLogRequest};
use crate::{
    auth::AuthUser,
    error::AppError,
    nutrition::{daily_summary, goals_of, DateRange, MealLogEntry},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_day).post(create_meal))
        .route("/meals/:id", put(update_meal).delete(delete_meal))
}

#[instrument(skip(state))]
pub async fn list_day(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<DayQuery>,
) -> Result<Json<DayLog>, (StatusCode, String)> {
    let day = q.date.unwrap_or_else(|| state.config.today());
    let (profile, entries) = tokio::try_join!(
        state.store.fetch_profile(user_id),
        state.store.fetch_logs(user_id, DateRange::single(day)),
    )
    .map_err(AppError::from)?;

    let goals = goals_of(profile.as_ref());
    let summary = daily_summary(&entries, day, &goals);
    Ok(Json(DayLog {
        date: day,
        remaining: summary.remaining(goals),
        entries,
        summary,
    }))
}

#[instrument(skip(state, body))]
pub async fn create_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<MealLogRequest>,
) -> Result<(StatusCode, HeaderMap, Json<MealLogEntry>), (StatusCode, String)> {
    let log = body
        .into_new_log(state.config.today())
        .map_err(AppError::from)?;
    let entry = state
        .store
        .insert_log(user_id, log)
        .await
        .map_err(AppError::from)?;
    info!(%user_id, id = %entry.id, slot = %entry.meal_slot, "meal logged");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/meals/{}", entry.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(entry)))
}

#[instrument(skip(state, body))]
pub async fn update_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<MealLogRequest>,
) -> Result<Json<MealLogEntry>, (StatusCode, String)> {
    let log = body
        .into_new_log(state.config.today())
        .map_err(AppError::from)?;
    let entry = state
        .store
        .update_log(user_id, id, log)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound("meal log"))?;
    Ok(Json(entry))
}

/// Deleting an id that does not exist is not an error.
#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let removed = state
        .store
        .delete_log(user_id, id)
        .await
        .map_err(AppError::from)?;
    if !removed {
        debug!(%user_id, %id, "delete of unknown meal log");
    }
    Ok(StatusCode::NO_CONTENT)
}
