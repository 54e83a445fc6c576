use crate::error::{AppError, Result};

pub const STORE_BASE_URL: &str = "https://store.steampowered.com";
pub const EXTRACTION_URL: &str = "https://api.yellowcake.dev/v1/extract-stream";

/// Region and language sent to the storefront when a request names none.
pub const DEFAULT_REGION: &str = "ca";
pub const DEFAULT_LANGUAGE: &str = "en";

/// Sent on every outbound request; the storefront rejects bare clients.
pub const USER_AGENT: &str = "Mozilla/5.0";

/// Compare resolves at most this many identifiers; the rest are dropped.
pub const COMPARE_MAX_IDENTIFIERS: usize = 12;

/// Search result cap: `min(max(1, limit), SEARCH_MAX_LIMIT)`.
pub const SEARCH_DEFAULT_LIMIT: i64 = 10;
pub const SEARCH_MAX_LIMIT: i64 = 20;

/// Enrich cap: `min(max(1, limit), ENRICH_MAX_LIMIT)`.
pub const ENRICH_DEFAULT_LIMIT: i64 = 5;
pub const ENRICH_MAX_LIMIT: i64 = 10;

/// Error `debug` strings are cut to this many characters.
pub const DEBUG_MAX_CHARS: usize = 600;

/// Fields requested from the extraction service, one per GameRecord field.
pub const EXTRACTION_PROMPT: &str = "Extract as JSON with these keys:
- game_title
- current_price
- original_price (if discounted)
- discount_percent
- release_date
- tags
- review_summary";

/// Discount buckets (percent). A discount lands in the first bucket whose
/// minimum it meets, checked from the top down.
pub mod deal_thresholds {
    pub const AMAZING_MIN: f64 = 70.0;
    pub const GREAT_MIN: f64 = 50.0;
    pub const GOOD_MIN: f64 = 25.0;
    pub const SMALL_MIN: f64 = 10.0;
    /// At or above this the action flips to "buy now".
    pub const BUY_MIN: f64 = GOOD_MIN;
    /// At or above this the reason reads as a strong buy signal.
    pub const STRONG_SIGNAL_MIN: f64 = GREAT_MIN;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_port: u16,
    pub log_level: String,
    pub store_base_url: String,
    pub extraction_url: String,
    /// Extraction service key (EXTRACTION_API_KEY, falls back to YELLOWCAKE_API_KEY).
    /// Extraction requests fail with a config error when unset.
    pub extraction_api_key: Option<String>,
    pub default_region: String,
    pub default_language: String,
    /// Applies to every outbound request (HTTP_TIMEOUT_SECS).
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            store_base_url: std::env::var("STORE_BASE_URL")
                .unwrap_or_else(|_| STORE_BASE_URL.to_string()),
            extraction_url: std::env::var("EXTRACTION_URL")
                .unwrap_or_else(|_| EXTRACTION_URL.to_string()),
            extraction_api_key: std::env::var("EXTRACTION_API_KEY")
                .or_else(|_| std::env::var("YELLOWCAKE_API_KEY"))
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            default_region: std::env::var("DEFAULT_REGION")
                .unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            default_language: std::env::var("DEFAULT_LANGUAGE")
                .unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string()),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .map_err(|_| {
                    AppError::Config("HTTP_TIMEOUT_SECS must be a whole number of seconds".to_string())
                })?,
        })
    }
}
