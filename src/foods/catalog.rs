use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::CatalogConfig;
use crate::nutrition::nutrients::lenient_number;
use crate::nutrition::{FoodItem, Nutrients};

/// One page of catalog results plus the total hit count across all pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPage {
    pub items: Vec<FoodItem>,
    pub total_count: u64,
}

/// Third-party nutrition facts lookup.
#[async_trait]
pub trait FoodCatalog: Send + Sync {
    fn page_size(&self) -> u32;
    /// `page` starts at 1.
    async fn search(&self, query: &str, page: u32) -> anyhow::Result<CatalogPage>;
}

/// Korean MFDS food nutrient database (data.go.kr).
pub struct MfdsCatalog {
    http: reqwest::Client,
    url: String,
    service_key: Option<String>,
    page_size: u32,
}

impl MfdsCatalog {
    pub fn new(cfg: &CatalogConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("build catalog http client")?;
        Ok(Self {
            http,
            url: cfg.url.clone(),
            service_key: cfg.service_key.clone(),
            page_size: cfg.page_size,
        })
    }
}

#[async_trait]
impl FoodCatalog for MfdsCatalog {
    fn page_size(&self) -> u32 {
        self.page_size
    }

    async fn search(&self, query: &str, page: u32) -> anyhow::Result<CatalogPage> {
        let page_no = page.to_string();
        let rows = self.page_size.to_string();
        let mut params = vec![
            ("pageNo", page_no.as_str()),
            ("numOfRows", rows.as_str()),
            ("type", "json"),
            ("FOOD_NM_KR", query),
        ];
        if let Some(key) = &self.service_key {
            params.push(("serviceKey", key.as_str()));
        }
        let resp = self
            .http
            .get(&self.url)
            .query(&params)
            .send()
            .await
            .context("catalog request")?
            .error_for_status()
            .context("catalog status")?;
        let body: Value = resp.json().await.context("catalog body")?;
        let parsed = parse_catalog_page(&body)?;
        debug!(query, page, hits = parsed.items.len(), total = parsed.total_count, "catalog page");
        Ok(parsed)
    }
}

fn text<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn map_item(item: &Value) -> Option<FoodItem> {
    let name = text(item, "FOOD_NM_KR")?;
    let code = text(item, "FOOD_CD").map(str::to_string);
    let num = |key: &str| item.get(key).map(lenient_number).unwrap_or(0.0).max(0.0);
    Some(FoodItem {
        id: code.as_ref().map(|c| format!("mfds-{}", c)),
        name: name.to_string(),
        maker: text(item, "MAKER_NM").map(str::to_string),
        external_code: code,
        serving_label: text(item, "SERVING_SIZE").map(str::to_string),
        nutrients: Nutrients {
            calories: num("AMT_NUM1"),
            protein_g: num("AMT_NUM3"),
            fat_g: num("AMT_NUM4"),
            carbs_g: num("AMT_NUM6"),
            ..Nutrients::ZERO
        },
    })
}

/// Parses a catalog response. A result code other than `"00"` is an error;
/// `items` may be a list, `{ "item": [..] }` or `{ "item": {..} }`.
pub fn parse_catalog_page(body: &Value) -> anyhow::Result<CatalogPage> {
    let root = body.get("response").unwrap_or(body);
    let code = root
        .pointer("/header/resultCode")
        .and_then(Value::as_str)
        .unwrap_or("");
    if code != "00" {
        let msg = root
            .pointer("/header/resultMsg")
            .and_then(Value::as_str)
            .unwrap_or("missing header");
        bail!("catalog result {:?}: {}", code, msg);
    }

    let Some(body) = root.get("body") else {
        return Ok(CatalogPage::default());
    };
    let raw: Vec<&Value> = match body.get("items") {
        Some(Value::Array(list)) => list.iter().collect(),
        Some(Value::Object(obj)) => match obj.get("item") {
            Some(Value::Array(list)) => list.iter().collect(),
            Some(one @ Value::Object(_)) => vec![one],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    let items: Vec<FoodItem> = raw.into_iter().filter_map(map_item).collect();
    let total_count = body
        .get("totalCount")
        .map(lenient_number)
        .filter(|n| *n > 0.0)
        .map(|n| n as u64)
        .unwrap_or(items.len() as u64);

    Ok(CatalogPage { items, total_count })
}
