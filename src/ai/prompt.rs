use anyhow::{anyhow, bail, Context};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::client::FoodEstimate;
use crate::nutrition::{MacroGoals, Nutrients};

/// Goals assumed when the user has no profile or a goal is unset.
pub const DEFAULT_GOALS: MacroGoals = MacroGoals {
    calories: 2000.0,
    carbs_g: 250.0,
    protein_g: 100.0,
    fat_g: 60.0,
};

lazy_static! {
    static ref MARKDOWN_MARKERS: Regex = Regex::new(r"### |\*\*").unwrap();
    static ref JSON_FENCE: Regex = Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap();
}

/// Everything the recommendation prompt is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptContext {
    pub goals: MacroGoals,
    pub eaten: Nutrients,
    pub remaining: MacroGoals,
}

impl PromptContext {
    pub fn new(goals: MacroGoals, eaten: Nutrients) -> Self {
        let goals = goals.or_defaults(DEFAULT_GOALS);
        Self {
            goals,
            eaten,
            remaining: goals.remaining_after(&eaten),
        }
    }

    pub fn render(&self) -> String {
        let g = &self.goals;
        let e = &self.eaten;
        let r = &self.remaining;
        format!(
            "You are a professional dietitian. Review what the user has eaten today and suggest the remaining meals.\n\
             [Goals] calories: {:.0}kcal, carbs: {:.0}g, protein: {:.0}g, fat: {:.0}g\n\
             [Eaten today] calories: {:.0}kcal, carbs: {:.0}g, protein: {:.0}g, fat: {:.0}g\n\
             [Remaining] calories: about {:.0}kcal, carbs: about {:.0}g, protein: about {:.0}g, fat: about {:.0}g\n\
             Please provide:\n\
             1. A short comment on the current intake\n\
             2. Three menu suggestions for the remaining meals\n\
             3. Approximate nutrition for each menu\n\
             4. Plain text only, no markdown",
            g.calories, g.carbs_g, g.protein_g, g.fat_g,
            e.calories, e.carbs_g, e.protein_g, e.fat_g,
            r.calories, r.carbs_g, r.protein_g, r.fat_g,
        )
    }
}

/// Strips the heading and bold markers the model emits despite being asked not to.
pub fn clean_text(text: &str) -> String {
    MARKDOWN_MARKERS.replace_all(text, "").trim().to_string()
}

fn unfence(text: &str) -> &str {
    JSON_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text)
        .trim()
}

/// Reads a food estimate from model output. Accepts an object, an array of
/// objects (first wins) or a JSON string, possibly inside a ```json fence.
pub fn parse_food_estimate(value: &Value) -> anyhow::Result<FoodEstimate> {
    match value {
        Value::String(text) => {
            let inner: Value = serde_json::from_str(unfence(text))
                .with_context(|| format!("estimate is not json: {:.80}", text))?;
            if inner.is_string() {
                bail!("estimate is a nested string");
            }
            parse_food_estimate(&inner)
        }
        Value::Array(items) => items
            .first()
            .ok_or_else(|| anyhow!("estimate list is empty"))
            .and_then(parse_food_estimate),
        Value::Object(obj) => {
            let name = ["name", "food_name", "foodName"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_str))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| anyhow!("estimate has no food name"))?;
            let source = obj.get("nutrients").unwrap_or(value);
            Ok(FoodEstimate {
                name: name.to_string(),
                nutrients: Nutrients::from_json_lenient(source),
            })
        }
        other => bail!("unexpected estimate shape: {}", other),
    }
}
