use std::collections::BTreeMap;

use serde::Serialize;
use time::{util::days_in_year_month, Date, Month};

use super::daily::percent_of;
use super::log::{DateRange, MealLogEntry};
use super::nutrients::{MacroGoals, Nutrients};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthRange {
    pub year: i32,
    pub month: Month,
    pub first: Date,
    pub last: Date,
}

impl MonthRange {
    pub fn new(year: i32, month: u8) -> Result<Self, ValidationError> {
        let month = Month::try_from(month)
            .map_err(|_| ValidationError::Invalid(format!("month must be 1-12, got {}", month)))?;
        let first = Date::from_calendar_date(year, month, 1)
            .map_err(|e| ValidationError::Invalid(e.to_string()))?;
        let last = Date::from_calendar_date(year, month, days_in_year_month(year, month))
            .map_err(|e| ValidationError::Invalid(e.to_string()))?;
        Ok(Self { year, month, first, last })
    }

    pub fn containing(day: Date) -> Self {
        let first = day.replace_day(1).unwrap_or(day);
        let last = day
            .replace_day(days_in_year_month(day.year(), day.month()))
            .unwrap_or(day);
        Self {
            year: day.year(),
            month: day.month(),
            first,
            last,
        }
    }

    pub fn range(&self) -> DateRange {
        DateRange::new(self.first, self.last)
    }

    pub fn days_in_month(&self) -> u8 {
        self.last.day()
    }

    /// Empty cells before day 1 in a Sunday-first calendar grid.
    pub fn leading_blank_days(&self) -> u8 {
        self.first.weekday().number_days_from_sunday()
    }
}

/// Color bucket of a calendar cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Neutral,
    OnTarget,
    OverGoal,
}

impl GoalStatus {
    pub fn from_percent(percent: u32) -> Self {
        match percent {
            0..=79 => GoalStatus::Neutral,
            80..=100 => GoalStatus::OnTarget,
            _ => GoalStatus::OverGoal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayCell {
    pub totals: Nutrients,
    pub percent: u32,
    pub status: GoalStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u8,
    pub days_in_month: u8,
    pub leading_blank_days: u8,
    pub goal_calories: f64,
    /// Only days with at least one entry appear.
    pub days: BTreeMap<Date, DayCell>,
}

pub fn monthly_summary(entries: &[MealLogEntry], month: MonthRange, goals: &MacroGoals) -> MonthlySummary {
    let range = month.range();
    let mut totals: BTreeMap<Date, Nutrients> = BTreeMap::new();
    for entry in entries.iter().filter(|e| range.contains(e.date)) {
        *totals.entry(entry.date).or_default() += entry.nutrients;
    }

    let days = totals
        .into_iter()
        .map(|(date, totals)| {
            let percent = percent_of(totals.calories, goals.calories);
            (
                date,
                DayCell {
                    totals,
                    percent,
                    status: GoalStatus::from_percent(percent),
                },
            )
        })
        .collect();

    MonthlySummary {
        year: month.year,
        month: u8::from(month.month),
        days_in_month: month.days_in_month(),
        leading_blank_days: month.leading_blank_days(),
        goal_calories: goals.calories,
        days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::daily::fixtures::{entry, kcal};
    use crate::nutrition::log::MealSlot;
    use time::macros::date;

    fn goals() -> MacroGoals {
        MacroGoals { calories: 2000.0, ..MacroGoals::default() }
    }

    #[test]
    fn month_bounds_and_grid_offset() {
        let feb = MonthRange::new(2024, 2).unwrap();
        assert_eq!(feb.first, date!(2024 - 02 - 01));
        assert_eq!(feb.last, date!(2024 - 02 - 29));
        // 2024-02-01 was a Thursday
        assert_eq!(feb.leading_blank_days(), 4);
        assert!(MonthRange::new(2024, 13).is_err());
        assert_eq!(MonthRange::containing(date!(2023 - 11 - 17)).last, date!(2023 - 11 - 30));
    }

    #[test]
    fn groups_by_day_with_color_buckets() {
        let month = MonthRange::new(2024, 3).unwrap();
        let entries = vec![
            entry(date!(2024 - 03 - 01), MealSlot::Lunch, kcal(1000.0)),
            entry(date!(2024 - 03 - 01), MealSlot::Dinner, kcal(700.0)),
            entry(date!(2024 - 03 - 02), MealSlot::Lunch, kcal(2000.0)),
            entry(date!(2024 - 03 - 03), MealSlot::Lunch, kcal(2300.0)),
            entry(date!(2024 - 03 - 04), MealSlot::Lunch, Nutrients { calories: 900.0, potassium_mg: 120.0, ..Nutrients::ZERO }),
            entry(date!(2024 - 04 - 01), MealSlot::Lunch, kcal(999.0)),
        ];
        let s = monthly_summary(&entries, month, &goals());
        assert_eq!(s.days.len(), 4);
        assert_eq!(s.days_in_month, 31);

        let d1 = &s.days[&date!(2024 - 03 - 01)];
        assert_eq!(d1.totals.calories, 1700.0);
        assert_eq!(d1.percent, 85);
        assert_eq!(d1.status, GoalStatus::OnTarget);

        assert_eq!(s.days[&date!(2024 - 03 - 02)].status, GoalStatus::OnTarget);
        assert_eq!(s.days[&date!(2024 - 03 - 03)].status, GoalStatus::OverGoal);

        let d4 = &s.days[&date!(2024 - 03 - 04)];
        assert_eq!(d4.status, GoalStatus::Neutral);
        assert_eq!(d4.totals.potassium_mg, 120.0);
    }

    #[test]
    fn empty_month_has_no_cells() {
        let s = monthly_summary(&[], MonthRange::new(2024, 3).unwrap(), &goals());
        assert!(s.days.is_empty());
    }

    #[test]
    fn serializes_days_keyed_by_iso_date() {
        let month = MonthRange::new(2024, 3).unwrap();
        let entries = vec![entry(date!(2024 - 03 - 05), MealSlot::Lunch, kcal(500.0))];
        let v = serde_json::to_value(monthly_summary(&entries, month, &goals())).unwrap();
        assert_eq!(v["days"]["2024-03-05"]["percent"], 25);
        assert_eq!(v["days"]["2024-03-05"]["status"], "neutral");
    }
}
