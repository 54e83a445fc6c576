//! In-memory `GameSource` for orchestrator and router tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::GameSource;
use crate::error::{AppError, Result};
use crate::fetcher::storefront::store_page_url;
use crate::types::{AppId, GameRecord, SearchHit, SearchOutcome};

pub const FAKE_BASE: &str = "https://store.test";

/// Canned extraction behavior for one URL.
pub enum Extracted {
    Game(GameRecord),
    NotAGame,
    Unparsable,
}

#[derive(Default)]
pub struct FakeSource {
    /// Identifiers missing here resolve to `NoData`.
    pub details: HashMap<u64, GameRecord>,
    /// URLs missing here fail like a dropped connection would.
    pub extractions: HashMap<String, Extracted>,
    pub search_titles: Vec<(u64, String)>,
    /// Every upstream call, in order: `detail:<id>`, `extract:<url>`, `search:<q>`.
    pub calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_game(mut self, id: u64, game: GameRecord) -> Self {
        self.details.insert(id, game);
        self
    }

    pub fn with_extraction(mut self, url: &str, extracted: Extracted) -> Self {
        self.extractions.insert(url.to_string(), extracted);
        self
    }

    pub fn with_search_title(mut self, id: u64, title: &str) -> Self {
        self.search_titles.push((id, title.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn log(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

/// Paid game with the given discount.
pub fn priced(title: &str, price: f64, discount: Option<f64>) -> GameRecord {
    GameRecord {
        title: Some(title.to_string()),
        current_price: Some(price),
        discount_percent: discount,
        ..Default::default()
    }
}

#[async_trait]
impl GameSource for FakeSource {
    fn detail_url(&self, id: AppId, region: &str, language: &str) -> Result<String> {
        Ok(format!("{FAKE_BASE}/api/appdetails?appids={id}&cc={region}&l={language}"))
    }

    async fn fetch_by_identifier(
        &self,
        id: AppId,
        _region: &str,
        _language: &str,
    ) -> Result<GameRecord> {
        self.log(format!("detail:{id}"));
        self.details
            .get(&id.0)
            .cloned()
            .ok_or_else(|| AppError::NoData(format!("Storefront returned no data for identifier {id}")))
    }

    async fn extract_from_url(&self, url: &str) -> Result<Option<GameRecord>> {
        self.log(format!("extract:{url}"));
        match self.extractions.get(url) {
            Some(Extracted::Game(game)) => Ok(Some(game.clone())),
            Some(Extracted::NotAGame) => Ok(None),
            Some(Extracted::Unparsable) => Err(AppError::UnparsableStream { frames: 1 }),
            None => Err(AppError::Config("no canned extraction".to_string())),
        }
    }

    async fn search(
        &self,
        query: &str,
        _region: &str,
        _language: &str,
        limit: usize,
    ) -> Result<SearchOutcome> {
        self.log(format!("search:{query}"));
        let results = self
            .search_titles
            .iter()
            .take(limit)
            .map(|(id, title)| SearchHit {
                identifier: AppId(*id),
                title: title.clone(),
                store_url: store_page_url(FAKE_BASE, AppId(*id)),
            })
            .collect();
        Ok(SearchOutcome {
            source_url: format!("{FAKE_BASE}/search/suggest?term={query}"),
            results,
        })
    }
}
