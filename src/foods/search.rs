use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::catalog::{CatalogPage, FoodCatalog};
use crate::nutrition::{merge_sources, FoodSource};
use crate::store::NutritionStore;

/// Shorter queries never reach the catalog.
pub const MIN_QUERY_CHARS: usize = 2;
/// Custom foods shown ahead of catalog results on the first page.
pub const CUSTOM_RESULT_LIMIT: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub query: String,
    pub page: u32,
    pub results: Vec<FoodSource>,
    /// Catalog hits across all pages.
    pub total_count: u64,
    pub has_more: bool,
}

impl SearchPage {
    fn empty(query: &str, page: u32) -> Self {
        Self {
            query: query.to_string(),
            page,
            results: Vec::new(),
            total_count: 0,
            has_more: false,
        }
    }
}

/// Custom foods (first page only) followed by catalog results, de-duplicated.
/// Either source failing degrades to whatever the other one returned.
pub async fn search_foods(
    store: &dyn NutritionStore,
    catalog: &dyn FoodCatalog,
    user_id: Uuid,
    query: &str,
    page: u32,
) -> SearchPage {
    let query = query.trim();
    let page = page.max(1);
    if query.chars().count() < MIN_QUERY_CHARS {
        return SearchPage::empty(query, page);
    }

    let custom_fut = async {
        if page > 1 {
            return Vec::new();
        }
        match store.search_custom_foods(user_id, query, CUSTOM_RESULT_LIMIT).await {
            Ok(foods) => foods,
            Err(e) => {
                warn!(error = %e, %user_id, "custom food search failed");
                Vec::new()
            }
        }
    };
    let catalog_fut = async {
        match catalog.search(query, page).await {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(error = %format!("{:#}", e), query, page, "catalog search failed");
                None
            }
        }
    };
    let (custom, catalog_page) = tokio::join!(custom_fut, catalog_fut);

    let page_size = u64::from(catalog.page_size());
    let (catalog_items, total_count, has_more) = match catalog_page {
        Some(CatalogPage { items, total_count }) => {
            (items, total_count, u64::from(page) * page_size < total_count)
        }
        None => (Vec::new(), 0, false),
    };

    let results = merge_sources(
        custom
            .iter()
            .map(|f| FoodSource::Custom(f.to_item()))
            .chain(catalog_items.into_iter().map(FoodSource::Catalog)),
    );

    SearchPage {
        query: query.to_string(),
        page,
        results,
        total_count,
        has_more,
    }
}
