use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use time::{Date, Duration};

use super::daily::percent_of;
use super::log::{DateRange, MealLogEntry, MealSlot};
use super::nutrients::{MacroGoals, Nutrients};
use crate::error::ValidationError;

pub const DAYS_PER_WEEK: i64 = 7;
/// A day still counts as a success up to 10% above the calorie goal.
pub const SUCCESS_TOLERANCE: f64 = 1.1;

/// Seven consecutive days ending on `end`. Offsets step back in whole,
/// non-overlapping weeks from "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekWindow {
    pub start: Date,
    pub end: Date,
}

impl WeekWindow {
    /// Fails when the window would fall before the earliest representable date.
    pub fn ending_at(today: Date, week_offset: u32) -> Result<Self, ValidationError> {
        let out_of_range =
            || ValidationError::Invalid(format!("week_offset {} is out of range", week_offset));
        let end = today
            .checked_sub(Duration::days(DAYS_PER_WEEK * i64::from(week_offset)))
            .ok_or_else(out_of_range)?;
        let start = end
            .checked_sub(Duration::days(DAYS_PER_WEEK - 1))
            .ok_or_else(out_of_range)?;
        Ok(Self { start, end })
    }

    pub fn range(&self) -> DateRange {
        DateRange::new(self.start, self.end)
    }

    pub fn days(&self) -> impl Iterator<Item = Date> {
        let start = self.start;
        (0..DAYS_PER_WEEK).map(move |i| start + Duration::days(i))
    }

    /// `MM.DD ~ MM.DD`
    pub fn label(&self) -> String {
        format!(
            "{:02}.{:02} ~ {:02}.{:02}",
            u8::from(self.start.month()),
            self.start.day(),
            u8::from(self.end.month()),
            self.end.day()
        )
    }
}

/// Calories per meal slot, for a stacked chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SlotCalories {
    pub breakfast: f64,
    pub lunch: f64,
    pub dinner: f64,
    pub snack: f64,
}

impl SlotCalories {
    pub fn add(&mut self, slot: MealSlot, calories: f64) {
        match slot {
            MealSlot::Breakfast => self.breakfast += calories,
            MealSlot::Lunch => self.lunch += calories,
            MealSlot::Dinner => self.dinner += calories,
            MealSlot::Snack => self.snack += calories,
        }
    }

    pub fn get(&self, slot: MealSlot) -> f64 {
        match slot {
            MealSlot::Breakfast => self.breakfast,
            MealSlot::Lunch => self.lunch,
            MealSlot::Dinner => self.dinner,
            MealSlot::Snack => self.snack,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayBucket {
    pub date: Date,
    pub calories: f64,
    pub slots: SlotCalories,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    pub window: WeekWindow,
    pub label: String,
    pub year: i32,
    pub goal_calories: f64,
    pub days: Vec<DayBucket>,
    pub totals: Nutrients,
    pub weekly_goals: MacroGoals,
    pub carbs_percent: u32,
    pub protein_percent: u32,
    pub fat_percent: u32,
    pub success_days: u32,
    pub logged_days: u32,
    pub average_calories: f64,
}

pub fn weekly_summary(entries: &[MealLogEntry], window: WeekWindow, goals: &MacroGoals) -> WeeklySummary {
    let mut buckets: BTreeMap<Date, DayBucket> = window
        .days()
        .map(|date| {
            (
                date,
                DayBucket {
                    date,
                    calories: 0.0,
                    slots: SlotCalories::default(),
                },
            )
        })
        .collect();

    let mut totals = Nutrients::ZERO;
    let mut logged: HashSet<Date> = HashSet::new();

    for entry in entries.iter().filter(|e| window.range().contains(e.date)) {
        totals += entry.nutrients;
        logged.insert(entry.date);
        if let Some(bucket) = buckets.get_mut(&entry.date) {
            bucket.calories += entry.nutrients.calories;
            bucket.slots.add(entry.meal_slot, entry.nutrients.calories);
        }
    }

    let success_days = buckets
        .values()
        .filter(|b| b.calories > 0.0 && b.calories <= goals.calories * SUCCESS_TOLERANCE)
        .count() as u32;

    let logged_days = logged.len() as u32;
    let average_calories = (totals.calories / f64::from(logged_days.max(1))).round();

    let weekly_goals = goals.times(DAYS_PER_WEEK as f64);

    WeeklySummary {
        window,
        label: window.label(),
        year: window.end.year(),
        goal_calories: goals.calories,
        days: buckets.into_values().collect(),
        totals,
        weekly_goals,
        carbs_percent: percent_of(totals.carbs_g, weekly_goals.carbs_g),
        protein_percent: percent_of(totals.protein_g, weekly_goals.protein_g),
        fat_percent: percent_of(totals.fat_g, weekly_goals.fat_g),
        success_days,
        logged_days,
        average_calories,
    }
}
