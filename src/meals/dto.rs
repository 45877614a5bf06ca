use serde::{Deserialize, Serialize};
use time::Date;

use crate::error::ValidationError;
use crate::nutrition::{
    DailySummary, FoodItem, MacroGoals, MealLogEntry, MealSlot, NewMealLog, NutrientInput,
    ServingMultiplier,
};

/// Body of meal create/update. Either `food` (a template from search, the
/// custom library, a favorite or an AI estimate) or explicit nutrients.
#[derive(Debug, Deserialize)]
pub struct MealLogRequest {
    #[serde(default)]
    pub date: Option<Date>,
    #[serde(default, alias = "meal_type")]
    pub meal_slot: Option<MealSlot>,
    #[serde(default)]
    pub food_name: String,
    #[serde(default)]
    pub food: Option<FoodItem>,
    #[serde(default)]
    pub servings: Option<f64>,
    #[serde(flatten)]
    pub nutrients: NutrientInput,
}

impl MealLogRequest {
    pub fn into_new_log(self, today: Date) -> Result<NewMealLog, ValidationError> {
        let date = self.date.unwrap_or(today);
        if date > today {
            return Err(ValidationError::Invalid(format!(
                "date {} is in the future",
                date
            )));
        }
        let slot = self.meal_slot.ok_or(ValidationError::Missing("meal_slot"))?;
        let servings = match self.servings {
            Some(s) => ServingMultiplier::new(s)?,
            None => ServingMultiplier::ONE,
        };

        match self.food {
            Some(food) => {
                food.nutrients.validate()?;
                NewMealLog::from_food(&food, date, slot, servings)
            }
            None => {
                let base = self.nutrients.into_nutrients()?;
                NewMealLog::new(date, slot, &self.food_name, servings.apply(&base))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<Date>,
}

/// One day of the meal log with its rollup.
#[derive(Debug, Serialize)]
pub struct DayLog {
    pub date: Date,
    pub entries: Vec<MealLogEntry>,
    pub summary: DailySummary,
    pub remaining: MacroGoals,
}
