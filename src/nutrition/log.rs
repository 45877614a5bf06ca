use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::nutrients::Nutrients;
use super::serving::ServingMultiplier;
use super::sources::FoodItem;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    #[default]
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
            MealSlot::Snack => "snack",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealSlot {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(MealSlot::Breakfast),
            "lunch" => Ok(MealSlot::Lunch),
            "dinner" => Ok(MealSlot::Dinner),
            "snack" => Ok(MealSlot::Snack),
            other => Err(ValidationError::Unsupported {
                field: "meal_slot",
                value: other.to_string(),
            }),
        }
    }
}

/// One logged food, immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealLogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: Date,
    pub meal_slot: MealSlot,
    pub food_name: String,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A log entry before the store assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMealLog {
    pub date: Date,
    pub meal_slot: MealSlot,
    pub food_name: String,
    pub nutrients: Nutrients,
}

impl NewMealLog {
    pub fn new(
        date: Date,
        meal_slot: MealSlot,
        food_name: &str,
        nutrients: Nutrients,
    ) -> Result<Self, ValidationError> {
        let food_name = food_name.trim();
        if food_name.is_empty() {
            return Err(ValidationError::Missing("food_name"));
        }
        nutrients.validate()?;
        Ok(Self {
            date,
            meal_slot,
            food_name: food_name.to_string(),
            nutrients,
        })
    }

    /// Copies a template's values scaled by `servings`; the entry keeps no
    /// link back to the template.
    pub fn from_food(
        food: &FoodItem,
        date: Date,
        meal_slot: MealSlot,
        servings: ServingMultiplier,
    ) -> Result<Self, ValidationError> {
        Self::new(date, meal_slot, &food.name, servings.apply(&food.nutrients))
    }
}

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    pub fn single(day: Date) -> Self {
        Self { start: day, end: day }
    }

    pub fn contains(&self, day: Date) -> bool {
        self.start <= day && day <= self.end
    }
}
