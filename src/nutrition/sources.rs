use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::nutrients::Nutrients;

/// A reusable food template: per-serving nutrients plus labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "food_name")]
    pub name: String,
    #[serde(default, alias = "maker_name")]
    pub maker: Option<String>,
    /// Code assigned by the external nutrition catalog.
    #[serde(default)]
    pub external_code: Option<String>,
    #[serde(default)]
    pub serving_label: Option<String>,
    #[serde(flatten)]
    pub nutrients: Nutrients,
}

impl FoodItem {
    pub fn named(name: &str, nutrients: Nutrients) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            maker: None,
            external_code: None,
            serving_label: None,
            nutrients,
        }
    }

    /// Catalog code when present, otherwise normalized name and maker.
    pub fn dedup_key(&self) -> String {
        match self.external_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => format!("code:{}", code),
            _ => format!(
                "name:{}|{}",
                self.name.trim().to_lowercase(),
                self.maker.as_deref().unwrap_or("").trim().to_lowercase()
            ),
        }
    }
}

/// Where a food offered to the user came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", content = "food", rename_all = "snake_case")]
pub enum FoodSource {
    Custom(FoodItem),
    Catalog(FoodItem),
    AiEstimate(FoodItem),
    Favorite(FoodItem),
}

impl FoodSource {
    pub fn item(&self) -> &FoodItem {
        match self {
            FoodSource::Custom(f)
            | FoodSource::Catalog(f)
            | FoodSource::AiEstimate(f)
            | FoodSource::Favorite(f) => f,
        }
    }

    pub fn dedup_key(&self) -> String {
        self.item().dedup_key()
    }
}

/// Concatenates sources in order, keeping the first food seen for each key.
pub fn merge_sources<I>(sources: I) -> Vec<FoodSource>
where
    I: IntoIterator<Item = FoodSource>,
{
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|s| seen.insert(s.dedup_key()))
        .collect()
}
