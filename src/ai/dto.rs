use serde::{Deserialize, Serialize};

use crate::nutrition::{MacroGoals, Nutrients};
use crate::store::Recommendation;

#[derive(Debug, Deserialize)]
pub struct AnalyzeTextRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    #[serde(flatten)]
    pub recommendation: Recommendation,
    pub goals: MacroGoals,
    pub eaten: Nutrients,
    pub remaining: MacroGoals,
}

/// Image types the vision model accepts.
pub fn is_supported_image(content_type: &str) -> bool {
    matches!(
        content_type,
        "image/jpeg" | "image/jpg" | "image/png" | "image/webp" | "image/heic"
    )
}
