use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};

use super::dto::ProfileForm;
use crate::{
    auth::AuthUser,
    error::AppError,
    nutrition::{calculate, BodyMetrics, GoalPlan, Profile},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(save_profile))
        .route("/profile/calculate", post(preview_goals))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Profile>, (StatusCode, String)> {
    let profile = state
        .store
        .fetch_profile(user_id)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound("profile"))?;
    Ok(Json(profile))
}

/// Runs the calculator without saving anything.
#[instrument(skip(_user, form))]
pub async fn preview_goals(
    _user: AuthUser,
    Json(form): Json<ProfileForm>,
) -> Result<Json<GoalPlan>, (StatusCode, String)> {
    let metrics = BodyMetrics::try_from(form).map_err(AppError::from)?;
    Ok(Json(calculate(&metrics)))
}

#[instrument(skip(state, form))]
pub async fn save_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(form): Json<ProfileForm>,
) -> Result<Json<Profile>, (StatusCode, String)> {
    let metrics = BodyMetrics::try_from(form).map_err(AppError::from)?;
    let (profile, plan) = Profile::from_metrics(user_id, metrics, OffsetDateTime::now_utc());
    let saved = state
        .store
        .save_profile(&profile)
        .await
        .map_err(AppError::from)?;
    info!(%user_id, goal_calories = plan.derived.goal_calories, "profile saved");
    Ok(Json(saved))
}
