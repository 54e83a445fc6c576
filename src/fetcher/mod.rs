//! Upstream resolution: turns an identifier, a store URL or a search query
//! into normalized game metadata.
//!
//! Three strategies, chosen by the caller:
//! - direct: the storefront's JSON detail endpoint, keyed by identifier
//! - search: the storefront's HTML suggestion endpoint, scraped for identifiers
//! - extraction: a page-extraction service answering over an event stream
//!
//! There is no automatic fallback between them inside one call.

pub mod extraction;
pub mod storefront;

#[cfg(test)]
pub mod fake;

use std::time::Duration;

use async_trait::async_trait;

use crate::config::{Config, EXTRACTION_PROMPT, USER_AGENT};
use crate::error::Result;
use crate::types::{AppId, GameRecord, SearchOutcome};

pub use extraction::ExtractionClient;
pub use storefront::StorefrontClient;

/// Seam between request orchestration and the network.
#[async_trait]
pub trait GameSource: Send + Sync {
    /// URL the direct strategy fetches for `id`; reported back as `sourceUrl`.
    fn detail_url(&self, id: AppId, region: &str, language: &str) -> Result<String>;

    async fn fetch_by_identifier(&self, id: AppId, region: &str, language: &str)
        -> Result<GameRecord>;

    /// `Ok(None)` when the service answered but its payload was not a game object.
    async fn extract_from_url(&self, url: &str) -> Result<Option<GameRecord>>;

    async fn search(
        &self,
        query: &str,
        region: &str,
        language: &str,
        limit: usize,
    ) -> Result<SearchOutcome>;
}

/// Shared outbound client. Every upstream call inherits its timeout.
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Production source backed by the storefront and the extraction service.
pub struct SourceResolver {
    storefront: StorefrontClient,
    extraction: ExtractionClient,
}

impl SourceResolver {
    pub fn new(storefront: StorefrontClient, extraction: ExtractionClient) -> Self {
        Self {
            storefront,
            extraction,
        }
    }

    pub fn from_config(cfg: &Config, http: reqwest::Client) -> Self {
        Self::new(
            StorefrontClient::new(http.clone(), cfg.store_base_url.clone()),
            ExtractionClient::new(
                http,
                cfg.extraction_url.clone(),
                cfg.extraction_api_key.clone(),
            ),
        )
    }
}

#[async_trait]
impl GameSource for SourceResolver {
    fn detail_url(&self, id: AppId, region: &str, language: &str) -> Result<String> {
        Ok(self
            .storefront
            .app_details_url(id, region, language)?
            .to_string())
    }

    async fn fetch_by_identifier(
        &self,
        id: AppId,
        region: &str,
        language: &str,
    ) -> Result<GameRecord> {
        self.storefront.fetch_app_details(id, region, language).await
    }

    async fn extract_from_url(&self, url: &str) -> Result<Option<GameRecord>> {
        let payload = self.extraction.extract(url, EXTRACTION_PROMPT).await?;
        Ok(extraction::game_from_payload(&payload))
    }

    async fn search(
        &self,
        query: &str,
        region: &str,
        language: &str,
        limit: usize,
    ) -> Result<SearchOutcome> {
        self.storefront.search(query, region, language, limit).await
    }
}
