use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::nutrition::NutrientInput;
use crate::store::NewCustomFood;

/// Body of custom food create/update.
#[derive(Debug, Deserialize)]
pub struct CustomFoodRequest {
    #[serde(default)]
    pub food_name: String,
    #[serde(default)]
    pub serving_label: Option<String>,
    #[serde(flatten)]
    pub nutrients: NutrientInput,
}

impl TryFrom<CustomFoodRequest> for NewCustomFood {
    type Error = ValidationError;

    fn try_from(req: CustomFoodRequest) -> Result<Self, Self::Error> {
        let food_name = req.food_name.trim();
        if food_name.is_empty() {
            return Err(ValidationError::Missing("food_name"));
        }
        Ok(NewCustomFood {
            food_name: food_name.to_string(),
            serving_label: req
                .serving_label
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            nutrients: req.nutrients.into_nutrients()?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct FavoriteState {
    pub favorite: bool,
}
