//! Diet recommendations and food estimates from a hosted language model.

pub mod client;
mod dto;
pub mod handlers;
pub mod prompt;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
