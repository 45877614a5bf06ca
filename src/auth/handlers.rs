use axum::{http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use super::claims::Claims;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: Option<String>,
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(claims), fields(user_id = %claims.sub))]
pub async fn get_me(claims: Claims) -> Result<Json<PublicUser>, (StatusCode, String)> {
    Ok(Json(PublicUser {
        id: claims.sub,
        email: claims.email,
    }))
}

#[cfg(test)]
mod me_tests {
    use super::*;

    #[test]
    fn me_response_serialization() {
        let response = PublicUser {
            id: Uuid::new_v4(),
            email: Some("test@example.com".to_string()),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("id"));
    }
}
