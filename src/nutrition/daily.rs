use serde::Serialize;
use time::Date;

use super::log::MealLogEntry;
use super::nutrients::{MacroGoals, Nutrients};

/// `total / goal` as a whole percent. The goal is clamped to at least 1 so an
/// unset goal never divides by zero.
pub fn percent_of(total: f64, goal: f64) -> u32 {
    (total / goal.max(1.0) * 100.0).round() as u32
}

/// Progress of one nutrient against its daily goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub total: f64,
    pub goal: f64,
    /// Capped at 100, for bar rendering.
    pub percent: u32,
    pub raw_percent: u32,
    pub over_goal: bool,
}

impl Progress {
    pub fn new(total: f64, goal: f64) -> Self {
        let ratio = total / goal.max(1.0);
        Self {
            total,
            goal,
            percent: (ratio.min(1.0) * 100.0).round() as u32,
            raw_percent: percent_of(total, goal),
            over_goal: ratio > 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: Date,
    pub entry_count: usize,
    pub totals: Nutrients,
    pub calories: Progress,
    pub carbs: Progress,
    pub protein: Progress,
    pub fat: Progress,
}

impl DailySummary {
    pub fn remaining(&self, goals: MacroGoals) -> MacroGoals {
        goals.remaining_after(&self.totals)
    }
}

/// Totals for `day`; entries dated on other days are ignored.
pub fn daily_summary(entries: &[MealLogEntry], day: Date, goals: &MacroGoals) -> DailySummary {
    let todays = entries.iter().filter(|e| e.date == day);
    let entry_count = todays.clone().count();
    let totals: Nutrients = todays.map(|e| &e.nutrients).sum();

    DailySummary {
        date: day,
        entry_count,
        totals,
        calories: Progress::new(totals.calories, goals.calories),
        carbs: Progress::new(totals.carbs_g, goals.carbs_g),
        protein: Progress::new(totals.protein_g, goals.protein_g),
        fat: Progress::new(totals.fat_g, goals.fat_g),
    }
}
