use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::prompt::parse_food_estimate;
use crate::config::AiConfig;
use crate::nutrition::{FoodItem, FoodSource, Nutrients};

/// Best-effort nutrition guess for one food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEstimate {
    pub name: String,
    #[serde(flatten)]
    pub nutrients: Nutrients,
}

impl FoodEstimate {
    pub fn into_source(self) -> FoodSource {
        FoodSource::AiEstimate(FoodItem::named(&self.name, self.nutrients))
    }
}

/// Hosted model behind an opaque request/response interface.
#[async_trait]
pub trait AiClient: Send + Sync {
    async fn generate_recommendation(&self, prompt: &str) -> anyhow::Result<String>;
    async fn analyze_food_image(&self, image: Bytes, mime_type: &str) -> anyhow::Result<FoodEstimate>;
    async fn analyze_food_text(&self, text: &str) -> anyhow::Result<FoodEstimate>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FunctionRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    model_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct FunctionResponse {
    result: Option<Value>,
    error: Option<String>,
}

/// Calls the serverless AI function over HTTP.
pub struct EdgeFunctionClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl EdgeFunctionClient {
    pub fn new(cfg: &AiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("build ai http client")?;
        Ok(Self {
            http,
            url: cfg.function_url.clone(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        })
    }

    fn request<'a>(&'a self, kind: &'a str) -> FunctionRequest<'a> {
        FunctionRequest {
            kind,
            prompt: None,
            image_base64: None,
            mime_type: None,
            model_name: &self.model,
        }
    }

    async fn invoke(&self, body: FunctionRequest<'_>) -> anyhow::Result<Value> {
        let mut req = self.http.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key).header("apikey", key);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("ai function {} request", body.kind))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("ai function returned {}: {}", status, text);
        }
        let parsed: FunctionResponse = resp.json().await.context("ai function response body")?;
        if let Some(err) = parsed.error {
            bail!("ai function error: {}", err);
        }
        debug!(kind = body.kind, "ai function answered");
        parsed
            .result
            .ok_or_else(|| anyhow!("ai function returned no result"))
    }
}

#[async_trait]
impl AiClient for EdgeFunctionClient {
    async fn generate_recommendation(&self, prompt: &str) -> anyhow::Result<String> {
        let body = FunctionRequest {
            prompt: Some(prompt),
            ..self.request("recommendation")
        };
        match self.invoke(body).await? {
            Value::String(text) => Ok(text),
            other => bail!("recommendation is not text: {}", other),
        }
    }

    async fn analyze_food_image(&self, image: Bytes, mime_type: &str) -> anyhow::Result<FoodEstimate> {
        let body = FunctionRequest {
            image_base64: Some(Base64::encode_string(&image)),
            mime_type: Some(mime_type),
            ..self.request("image_analysis")
        };
        parse_food_estimate(&self.invoke(body).await?)
    }

    async fn analyze_food_text(&self, text: &str) -> anyhow::Result<FoodEstimate> {
        let body = FunctionRequest {
            prompt: Some(text),
            ..self.request("text_analysis")
        };
        parse_food_estimate(&self.invoke(body).await?)
    }
}
