use reqwest::header::ACCEPT;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::types::GameRecord;

/// Event-stream data marker. The space after it is optional on the wire.
const DATA_MARKER: &str = "data:";

/// Client for the page-extraction service. The API key is injected here and
/// never read from the process environment.
pub struct ExtractionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ExtractionClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    /// POST `{url, prompt}` and wait for the stream to finish, then decode the
    /// last complete frame.
    pub async fn extract(&self, url: &str, prompt: &str) -> Result<Value> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AppError::Config(
                "extraction API key is not configured".to_string(),
            ));
        };

        let body = self
            .http
            .post(&self.endpoint)
            .header("X-API-Key", api_key)
            .header(ACCEPT, "text/event-stream")
            .json(&json!({ "url": url, "prompt": prompt }))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        debug!(url, bytes = body.len(), "extraction stream complete");
        parse_event_stream(&body)
    }
}

/// Decode an event-stream body. Only `data:` lines count; they are tried from
/// the last one backwards and the first that decodes as JSON wins, so a
/// truncated final frame still leaves earlier complete frames usable.
pub fn parse_event_stream(body: &str) -> Result<Value> {
    let frames: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix(DATA_MARKER))
        .map(str::trim)
        .collect();

    frames
        .iter()
        .rev()
        .find_map(|frame| serde_json::from_str::<Value>(frame).ok())
        .ok_or(AppError::UnparsableStream {
            frames: frames.len(),
        })
}

/// The game object inside a decoded frame: `.data[0]`, then `.data`, then the
/// frame itself. First non-null wins.
pub fn select_game_value(payload: &Value) -> &Value {
    let data = payload.get("data").filter(|d| !d.is_null());
    data.and_then(|d| d.get(0))
        .filter(|first| !first.is_null())
        .or(data)
        .unwrap_or(payload)
}

pub fn game_from_payload(payload: &Value) -> Option<GameRecord> {
    game_from_extracted(select_game_value(payload))
}

/// Build a record from extracted fields. The service answers with whatever
/// shapes the page suggested, so numbers may be strings like `"$9.99"` or
/// `"50%"` and tags may be one comma-separated string.
/// Returns `None` when `v` is not an object.
pub fn game_from_extracted(v: &Value) -> Option<GameRecord> {
    if !v.is_object() {
        return None;
    }

    Some(GameRecord {
        title: field(v, &["game_title", "title", "name"]).and_then(text),
        current_price: field(v, &["current_price", "currentPrice", "price"]).and_then(amount),
        original_price: field(v, &["original_price", "originalPrice"]).and_then(amount),
        discount_percent: field(v, &["discount_percent", "discountPercent", "discount"])
            .and_then(amount),
        release_date: field(v, &["release_date", "releaseDate"]).and_then(text),
        tags: field(v, &["tags"]).map(tags).unwrap_or_default(),
        review_summary: field(v, &["review_summary", "reviewSummary"]).and_then(text),
    })
}

fn field<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| v.get(*k))
        .find(|x| !x.is_null())
}

fn text(v: &Value) -> Option<String> {
    v.as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn amount(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// `"CDN$ 1,299.00"` → 1299.0, `"50%"` → 50.0, `"Free"` → 0.0.
pub fn parse_amount(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("free") {
        return Some(0.0);
    }
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

fn tags(v: &Value) -> Vec<String> {
    match v {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect(),
        _ => Vec::new(),
    }
}
