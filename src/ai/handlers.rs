use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::dto::{is_supported_image, AnalyzeTextRequest, RecommendationResponse};
use super::prompt::{clean_text, PromptContext};
use crate::{
    auth::AuthUser,
    error::{AppError, ValidationError},
    nutrition::{daily_summary, goals_of, DateRange, FoodSource},
    state::AppState,
    store::Recommendation,
};

const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ai/recommendation", post(recommend))
        .route("/ai/recommendations", get(list_recommendations))
        .route("/ai/recommendations/:id", delete(delete_recommendation))
        .route("/ai/analyze/text", post(analyze_text))
        .route(
            "/ai/analyze/image",
            post(analyze_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
}

#[instrument(skip(state))]
pub async fn recommend(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<RecommendationResponse>, (StatusCode, String)> {
    let today = state.config.today();
    let (profile, entries) = tokio::try_join!(
        state.store.fetch_profile(user_id),
        state.store.fetch_logs(user_id, DateRange::single(today)),
    )
    .map_err(AppError::from)?;
    let goals = goals_of(profile.as_ref());
    let summary = daily_summary(&entries, today, &goals);
    let ctx = PromptContext::new(goals, summary.totals);

    let raw = state
        .ai
        .generate_recommendation(&ctx.render())
        .await
        .map_err(AppError::Upstream)?;
    let text = clean_text(&raw);
    if text.is_empty() {
        warn!(%user_id, "empty recommendation");
        return Err(AppError::Upstream(anyhow::anyhow!("ai returned an empty recommendation")).into());
    }

    let recommendation = state
        .store
        .insert_recommendation(user_id, &text)
        .await
        .map_err(AppError::from)?;
    info!(%user_id, id = %recommendation.id, "recommendation saved");

    Ok(Json(RecommendationResponse {
        recommendation,
        goals: ctx.goals,
        eaten: ctx.eaten,
        remaining: ctx.remaining,
    }))
}

#[instrument(skip(state))]
pub async fn list_recommendations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Recommendation>>, (StatusCode, String)> {
    let list = state
        .store
        .list_recommendations(user_id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(list))
}

#[instrument(skip(state))]
pub async fn delete_recommendation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let removed = state
        .store
        .delete_recommendation(user_id, id)
        .await
        .map_err(AppError::from)?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("recommendation").into())
    }
}

#[instrument(skip(state, body))]
pub async fn analyze_text(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<AnalyzeTextRequest>,
) -> Result<Json<FoodSource>, (StatusCode, String)> {
    let text = body.text.trim();
    if text.is_empty() {
        return Err(AppError::from(ValidationError::Missing("text")).into());
    }
    let estimate = state
        .ai
        .analyze_food_text(text)
        .await
        .map_err(AppError::Upstream)?;
    Ok(Json(estimate.into_source()))
}

/// Multipart with a single `image` field.
#[instrument(skip(state, mp))]
pub async fn analyze_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<Json<FoodSource>, (StatusCode, String)> {
    let mut image = None;
    loop {
        let field = match mp.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "bad multipart body");
                return Err((StatusCode::BAD_REQUEST, e.body_text()));
            }
        };
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !is_supported_image(&content_type) {
            return Err(AppError::from(ValidationError::Unsupported {
                field: "image",
                value: content_type,
            })
            .into());
        }
        let data = field.bytes().await.map_err(|e| {
            error!(error = %e, "reading image field failed");
            (StatusCode::BAD_REQUEST, e.body_text())
        })?;
        image = Some((data, content_type));
        break;
    }

    let (data, content_type) = image.ok_or(AppError::from(ValidationError::Missing("image")))?;
    if data.is_empty() {
        return Err(AppError::from(ValidationError::Missing("image")).into());
    }
    let estimate = state
        .ai
        .analyze_food_image(data, &content_type)
        .await
        .map_err(AppError::Upstream)?;
    info!(%user_id, name = %estimate.name, "image analyzed");
    Ok(Json(estimate.into_source()))
}
