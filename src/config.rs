use anyhow::Context;
use serde::Deserialize;
use time::{Date, OffsetDateTime, UtcOffset};

pub const DEFAULT_CATALOG_URL: &str =
    "https://apis.data.go.kr/1471000/FoodNtrCpntDbInfo02/getFoodNtrCpntDbInq02";

/// Verification settings for tokens issued by the hosted auth service.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub function_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub url: String,
    pub service_key: Option<String>,
    pub page_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub ai: AiConfig,
    pub catalog: CatalogConfig,
    /// Offset of the users' calendar from UTC, in whole hours.
    pub utc_offset_hours: i8,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: env_or("JWT_ISSUER", "supabase"),
            audience: env_or("JWT_AUDIENCE", "authenticated"),
        };
        let ai = AiConfig {
            function_url: env_or("AI_FUNCTION_URL", "http://localhost:54321/functions/v1/gemini"),
            api_key: std::env::var("AI_API_KEY").ok(),
            model: env_or("AI_MODEL", "gemini-2.5-flash-lite"),
        };
        let catalog = CatalogConfig {
            url: env_or("CATALOG_URL", DEFAULT_CATALOG_URL),
            service_key: std::env::var("CATALOG_SERVICE_KEY").ok(),
            page_size: env_parse("CATALOG_PAGE_SIZE", 20u32).max(1),
        };
        let utc_offset_hours = env_parse("APP_UTC_OFFSET_HOURS", 0i8).clamp(-23, 23);

        Ok(Self {
            database_url,
            jwt,
            ai,
            catalog,
            utc_offset_hours,
        })
    }

    pub fn utc_offset(&self) -> UtcOffset {
        UtcOffset::from_hms(self.utc_offset_hours, 0, 0).unwrap_or(UtcOffset::UTC)
    }

    /// Today's date on the users' calendar.
    pub fn today(&self) -> Date {
        OffsetDateTime::now_utc().to_offset(self.utc_offset()).date()
    }
}
