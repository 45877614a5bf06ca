use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use time::Date;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{AppError, ValidationError},
    nutrition::{
        daily_summary, goals_of, monthly_summary, weekly_summary, DailySummary, DateRange,
        MacroGoals, MealLogEntry, MonthRange, MonthlySummary, WeekWindow, WeeklySummary,
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats/daily", get(daily))
        .route("/stats/weekly", get(weekly))
        .route("/stats/monthly", get(monthly))
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub date: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct WeeklyQuery {
    #[serde(default)]
    pub week_offset: u32,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyQuery {
    pub year: Option<i32>,
    pub month: Option<u8>,
}

/// Profile goals and the entries in `range`, fetched together.
async fn load(
    state: &AppState,
    user_id: Uuid,
    range: DateRange,
) -> Result<(MacroGoals, Vec<MealLogEntry>), AppError> {
    let (profile, entries) = tokio::try_join!(
        state.store.fetch_profile(user_id),
        state.store.fetch_logs(user_id, range),
    )?;
    Ok((goals_of(profile.as_ref()), entries))
}

#[instrument(skip(state))]
pub async fn daily(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<DailyQuery>,
) -> Result<Json<DailySummary>, (StatusCode, String)> {
    let day = q.date.unwrap_or_else(|| state.config.today());
    let (goals, entries) = load(&state, user_id, DateRange::single(day)).await?;
    Ok(Json(daily_summary(&entries, day, &goals)))
}

#[instrument(skip(state))]
pub async fn weekly(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<WeeklyQuery>,
) -> Result<Json<WeeklySummary>, (StatusCode, String)> {
    let window =
        WeekWindow::ending_at(state.config.today(), q.week_offset).map_err(AppError::from)?;
    let (goals, entries) = load(&state, user_id, window.range()).await?;
    Ok(Json(weekly_summary(&entries, window, &goals)))
}

#[instrument(skip(state))]
pub async fn monthly(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<MonthlyQuery>,
) -> Result<Json<MonthlySummary>, (StatusCode, String)> {
    let month = match (q.year, q.month) {
        (None, None) => MonthRange::containing(state.config.today()),
        (Some(year), Some(month)) => MonthRange::new(year, month).map_err(AppError::from)?,
        (Some(_), None) => return Err(AppError::from(ValidationError::Missing("month")).into()),
        (None, Some(month)) => {
            MonthRange::new(state.config.today().year(), month).map_err(AppError::from)?
        }
    };
    let (goals, entries) = load(&state, user_id, month.range()).await?;
    Ok(Json(monthly_summary(&entries, month, &goals)))
}
