use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::error::{AppError, Result};
use crate::types::{AppId, GameRecord, SearchHit, SearchOutcome};

/// One suggestion row: the listing id, then the display name inside the
/// `match_name` div. Dot matches newlines; both gaps are lazy so rows never merge.
static SUGGEST_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)data-ds-appid="(\d+)".*?class="match_name".*?>(.*?)</div>"#)
        .expect("valid suggest row pattern")
});

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<.*?>").expect("valid tag pattern"));

static NULL: Value = Value::Null;

/// Client for the storefront's own endpoints: JSON app details and the HTML
/// search suggestions.
pub struct StorefrontClient {
    http: reqwest::Client,
    base_url: String,
}

impl StorefrontClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn app_details_url(&self, id: AppId, region: &str, language: &str) -> Result<Url> {
        let appids = id.to_string();
        let url = Url::parse_with_params(
            &format!("{}/api/appdetails", self.base_url),
            &[("appids", appids.as_str()), ("cc", region), ("l", language)],
        )?;
        Ok(url)
    }

    pub fn suggest_url(&self, query: &str, region: &str, language: &str) -> Result<Url> {
        let url = Url::parse_with_params(
            &format!("{}/search/suggest", self.base_url),
            &[
                ("term", query),
                ("f", "games"),
                ("cc", region),
                ("l", language),
                ("realm", "1"),
            ],
        )?;
        Ok(url)
    }

    /// Direct strategy: one GET to the detail endpoint, normalized into a GameRecord.
    pub async fn fetch_app_details(
        &self,
        id: AppId,
        region: &str,
        language: &str,
    ) -> Result<GameRecord> {
        let url = self.app_details_url(id, region, language)?;
        debug!(identifier = %id, %url, "fetching app details");

        let resp: Value = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_app_details(&resp, id)
    }

    /// Search strategy: one GET to the suggestion endpoint, rows scraped from the HTML.
    pub async fn search(
        &self,
        query: &str,
        region: &str,
        language: &str,
        limit: usize,
    ) -> Result<SearchOutcome> {
        let url = self.suggest_url(query, region, language)?;
        let html = self
            .http
            .get(url.clone())
            .header(ACCEPT, "text/html,*/*")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let results = parse_suggest_html(&html, limit, &self.base_url);
        info!(query, hits = results.len(), limit, "storefront search complete");

        Ok(SearchOutcome {
            source_url: url.to_string(),
            results,
        })
    }
}

/// Public store page for a listing. Synthesized, never scraped.
pub fn store_page_url(base_url: &str, id: AppId) -> String {
    format!("{}/app/{}/", base_url.trim_end_matches('/'), id)
}

/// Normalize an app-details response. The body is keyed by the identifier
/// string; a missing or false `success` flag means the storefront has nothing
/// for this listing.
///
/// Prices arrive in cents. A free listing has a current price of 0 even
/// without a price block; a paid listing without one (not yet released, say)
/// leaves all price fields unknown.
pub fn parse_app_details(resp: &Value, id: AppId) -> Result<GameRecord> {
    let key = id.to_string();
    let root = resp.get(key.as_str()).unwrap_or(&NULL);
    if root.get("success").and_then(|s| s.as_bool()) != Some(true) {
        return Err(AppError::NoData(format!(
            "Storefront returned no data for identifier {id}"
        )));
    }

    let data = root.get("data").unwrap_or(&NULL);

    let title = data
        .get("name")
        .and_then(|n| n.as_str())
        .map(|s| s.to_string());

    let release_date = data
        .pointer("/release_date/date")
        .and_then(|d| d.as_str())
        .map(|s| s.to_string());

    // Genres stand in for user tags, which this endpoint does not expose.
    let tags = data
        .get("genres")
        .and_then(|g| g.as_array())
        .map(|genres| {
            genres
                .iter()
                .filter_map(|g| g.get("description").and_then(|d| d.as_str()))
                .filter(|d| !d.is_empty())
                .map(|d| d.to_string())
                .collect()
        })
        .unwrap_or_default();

    let is_free = data.get("is_free").and_then(|f| f.as_bool()) == Some(true);
    let price = data.get("price_overview").filter(|p| p.is_object());

    let current_price = if is_free {
        Some(0.0)
    } else {
        price.and_then(|p| number(p.get("final"))).map(|c| c / 100.0)
    };
    let original_price = price
        .and_then(|p| number(p.get("initial")))
        .map(|c| c / 100.0);
    let discount_percent = price.and_then(|p| number(p.get("discount_percent")));

    Ok(GameRecord {
        title,
        current_price,
        original_price,
        discount_percent,
        release_date,
        tags,
        review_summary: None,
    })
}

/// Scrape suggestion rows out of the suggest endpoint's HTML, stopping after `limit`.
/// Best-effort: markup changes only break this function.
pub fn parse_suggest_html(html: &str, limit: usize, base_url: &str) -> Vec<SearchHit> {
    SUGGEST_ROW
        .captures_iter(html)
        .filter_map(|caps| {
            let id = AppId::parse(caps.get(1)?.as_str())?;
            let title = clean_title(caps.get(2)?.as_str());
            Some(SearchHit {
                identifier: id,
                title,
                store_url: store_page_url(base_url, id),
            })
        })
        .take(limit)
        .collect()
}

fn clean_title(raw: &str) -> String {
    MARKUP_TAG
        .replace_all(raw, "")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .trim()
        .to_string()
}

fn number(v: Option<&Value>) -> Option<f64> {
    v.and_then(|x| x.as_f64().or_else(|| x.as_str().and_then(|s| s.trim().parse().ok())))
}
