use axum::http::StatusCode;
use tracing::{error, warn};

use crate::store::StoreError;

/// Rejected user input. Raised before any calculation or store call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0} must be a number")]
    NotNumeric(&'static str),
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("{0} must not be negative")]
    Negative(&'static str),
    #[error("unsupported {field}: {value}")]
    Unsupported { field: &'static str, value: String },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("upstream service failed: {0:#}")]
    Upstream(anyhow::Error),
}

impl From<AppError> for (StatusCode, String) {
    fn from(e: AppError) -> Self {
        match e {
            AppError::Validation(v) => {
                warn!(error = %v, "validation failed");
                (StatusCode::BAD_REQUEST, v.to_string())
            }
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            AppError::Store(e) => {
                error!(error = %e, "store call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage error".into())
            }
            AppError::Upstream(e) => {
                error!(error = %format!("{:#}", e), "upstream call failed");
                (StatusCode::BAD_GATEWAY, format!("upstream service failed: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let (status, msg): (StatusCode, String) =
            AppError::from(ValidationError::Missing("height")).into();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "height is required");
    }

    #[test]
    fn not_found_and_upstream_statuses() {
        let (status, msg): (StatusCode, String) = AppError::NotFound("profile").into();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(msg, "profile not found");

        let (status, _): (StatusCode, String) =
            AppError::Upstream(anyhow::anyhow!("timeout")).into();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
