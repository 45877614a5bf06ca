//! Pure nutrition logic: goal calculation, serving scaling and period
//! summaries. Nothing in here touches the store or the network.

pub mod daily;
pub mod goals;
pub mod log;
pub mod monthly;
pub mod nutrients;
pub mod profile;
pub mod serving;
pub mod sources;
pub mod weekly;

pub use daily::{daily_summary, DailySummary, Progress};
pub use goals::{calculate, ActivityLevel, BodyMetrics, DerivedGoals, Gender, GoalPlan, GoalType};
pub use log::{DateRange, MealLogEntry, MealSlot, NewMealLog};
pub use monthly::{monthly_summary, GoalStatus, MonthRange, MonthlySummary};
pub use nutrients::{MacroGoals, NutrientInput, Nutrients};
pub use profile::{goals_of, Profile};
pub use serving::ServingMultiplier;
pub use sources::{merge_sources, FoodItem, FoodSource};
pub use weekly::{weekly_summary, WeekWindow, WeeklySummary};
