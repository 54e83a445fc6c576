use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{
    COMPARE_MAX_IDENTIFIERS, ENRICH_DEFAULT_LIMIT, ENRICH_MAX_LIMIT, SEARCH_DEFAULT_LIMIT,
    SEARCH_MAX_LIMIT,
};
use crate::error::{AppError, Result};
use crate::fetcher::GameSource;
use crate::health::HealthState;
use crate::scorer::compute_insight;
use crate::types::{
    Analysis, AppId, EnrichedEntry, RankedResult, ResolutionSource, SearchOutcome,
};

/// What a single analyze request resolves.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzeTarget {
    Identifier(AppId),
    Url(String),
}

impl AnalyzeTarget {
    /// An identifier wins whenever one is present (non-null, non-blank); a
    /// present identifier that is not numeric is rejected rather than ignored.
    pub fn from_request(identifier: Option<&Value>, url: Option<&str>) -> Result<Self> {
        let identifier = identifier.filter(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        });
        if let Some(raw) = identifier {
            return AppId::from_json(raw)
                .map(AnalyzeTarget::Identifier)
                .ok_or_else(|| {
                    AppError::InvalidInput("identifier must be a non-negative integer".to_string())
                });
        }

        match url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(u) => Ok(AnalyzeTarget::Url(u.to_string())),
            None => Err(AppError::InvalidInput(
                "Provide either identifier or url".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub count: usize,
    pub ranked: Vec<RankedResult>,
}

/// Runs the four operations against a `GameSource`. Batches are processed
/// one item at a time, in input order.
pub struct Orchestrator {
    source: Arc<dyn GameSource>,
    health: Arc<HealthState>,
    default_region: String,
    default_language: String,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn GameSource>,
        health: Arc<HealthState>,
        default_region: impl Into<String>,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            source,
            health,
            default_region: default_region.into(),
            default_language: default_language.into(),
        }
    }

    pub async fn analyze(
        &self,
        target: AnalyzeTarget,
        region: Option<&str>,
        language: Option<&str>,
    ) -> Result<Analysis> {
        let (region, language) = self.locale(region, language);

        let (source, source_url, game) = match target {
            AnalyzeTarget::Identifier(id) => {
                let source_url = self.source.detail_url(id, region, language)?;
                let result = self.source.fetch_by_identifier(id, region, language).await;
                self.observe(&result);
                (ResolutionSource::Direct, source_url, result?)
            }
            AnalyzeTarget::Url(url) => {
                let result = self.source.extract_from_url(&url).await;
                self.observe(&result);
                let game = result?.ok_or_else(|| {
                    AppError::NoData("Extraction returned no game fields".to_string())
                })?;
                (ResolutionSource::Extraction, url, game)
            }
        };

        if game.is_empty() {
            return Err(AppError::NoData(format!("No game fields found at {source_url}")));
        }

        let insight = compute_insight(&game);
        info!(
            source = ?source,
            title = game.title.as_deref().unwrap_or("?"),
            score = insight.score,
            verdict = %insight.verdict,
            "analyze complete"
        );

        Ok(Analysis {
            source,
            source_url,
            game,
            insight,
        })
    }

    /// Rank up to `COMPARE_MAX_IDENTIFIERS` listings by score. Entries that are
    /// malformed or fail to resolve are skipped; ties keep input order.
    pub async fn compare(
        &self,
        identifiers: &[Value],
        region: Option<&str>,
        language: Option<&str>,
    ) -> Result<Comparison> {
        if identifiers.is_empty() {
            return Err(AppError::InvalidInput("Provide identifiers: [..]".to_string()));
        }
        let (region, language) = self.locale(region, language);

        let mut ranked = Vec::new();
        for raw in identifiers.iter().take(COMPARE_MAX_IDENTIFIERS) {
            let Some(id) = AppId::from_json(raw) else {
                warn!(identifier = %raw, "compare: skipping malformed identifier");
                continue;
            };

            let result = self.source.fetch_by_identifier(id, region, language).await;
            self.observe(&result);
            let game = match result {
                Ok(game) => game,
                Err(e) => {
                    warn!(identifier = %id, error = %e, "compare: skipping unresolved identifier");
                    continue;
                }
            };

            let source_url = match self.source.detail_url(id, region, language) {
                Ok(u) => u,
                Err(e) => {
                    warn!(identifier = %id, error = %e, "compare: skipping identifier without URL");
                    continue;
                }
            };

            let insight = compute_insight(&game);
            ranked.push(RankedResult {
                identifier: id,
                source_url,
                game,
                insight,
            });
        }

        // sort_by is stable: equal scores stay in input order.
        ranked.sort_by(|a, b| b.insight.score.cmp(&a.insight.score));

        info!(
            requested = identifiers.len(),
            ranked = ranked.len(),
            "compare complete"
        );
        Ok(Comparison {
            count: ranked.len(),
            ranked,
        })
    }

    pub async fn search(&self, query: &str, limit: Option<i64>) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput("Provide query".to_string()));
        }
        let limit = clamp_limit(limit, SEARCH_DEFAULT_LIMIT, SEARCH_MAX_LIMIT);

        let result = self
            .source
            .search(query, &self.default_region, &self.default_language, limit)
            .await;
        self.observe(&result);
        result
    }

    /// Extract each URL in turn. A failed or non-string entry becomes
    /// `game: null`; the batch always runs to the end.
    pub async fn enrich(&self, urls: &[Value], limit: Option<i64>) -> Result<Vec<EnrichedEntry>> {
        if urls.is_empty() {
            return Err(AppError::InvalidInput("Provide urls: [..]".to_string()));
        }
        let limit = clamp_limit(limit, ENRICH_DEFAULT_LIMIT, ENRICH_MAX_LIMIT);

        let mut enriched = Vec::with_capacity(limit.min(urls.len()));
        for raw in urls.iter().take(limit) {
            let (url, game) = match raw.as_str() {
                Some(url) if !url.trim().is_empty() => {
                    let result = self.source.extract_from_url(url).await;
                    self.observe(&result);
                    let game = match result {
                        Ok(game) => game.filter(|g| !g.is_empty()),
                        Err(e) => {
                            warn!(url = %url, error = %e, "enrich: extraction failed");
                            None
                        }
                    };
                    (url.to_string(), game)
                }
                Some(blank) => {
                    warn!("enrich: blank url");
                    (blank.to_string(), None)
                }
                None => {
                    warn!(url = %raw, "enrich: skipping non-string url");
                    (raw.to_string(), None)
                }
            };
            enriched.push(EnrichedEntry { url, game });
        }

        info!(
            requested = urls.len(),
            resolved = enriched.iter().filter(|e| e.game.is_some()).count(),
            "enrich complete"
        );
        Ok(enriched)
    }

    fn locale<'a>(&'a self, region: Option<&'a str>, language: Option<&'a str>) -> (&'a str, &'a str) {
        let pick = |v: Option<&'a str>, default: &'a str| {
            v.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(default)
        };
        (
            pick(region, self.default_region.as_str()),
            pick(language, self.default_language.as_str()),
        )
    }

    fn observe<T>(&self, result: &Result<T>) {
        match result {
            Ok(_) => self.health.record_success(),
            Err(AppError::Http(_) | AppError::Json(_) | AppError::UnparsableStream { .. }) => {
                self.health.record_failure()
            }
            Err(_) => {}
        }
    }
}

/// `min(max(1, limit), max)`, with `default` when the caller gave none.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> usize {
    limit.unwrap_or(default).clamp(1, max) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::fake::{priced, Extracted, FakeSource};
    use crate::fetcher::storefront::parse_app_details;
    use crate::types::{Action, GameRecord, Verdict};
    use serde_json::json;

    fn orchestrator(source: FakeSource) -> (Orchestrator, Arc<FakeSource>, Arc<HealthState>) {
        let source = Arc::new(source);
        let health = Arc::new(HealthState::new());
        let orch = Orchestrator::new(source.clone(), health.clone(), "ca", "en");
        (orch, source, health)
    }

    #[test]
    fn target_prefers_identifier_and_rejects_garbage() {
        assert_eq!(
            AnalyzeTarget::from_request(Some(&json!("620")), Some("https://x")).unwrap(),
            AnalyzeTarget::Identifier(AppId(620))
        );
        assert_eq!(
            AnalyzeTarget::from_request(Some(&json!("  ")), Some(" https://x ")).unwrap(),
            AnalyzeTarget::Url("https://x".to_string())
        );
        assert_eq!(
            AnalyzeTarget::from_request(Some(&Value::Null), Some("https://x")).unwrap(),
            AnalyzeTarget::Url("https://x".to_string())
        );
        assert!(matches!(
            AnalyzeTarget::from_request(Some(&json!("abc")), Some("https://x")),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            AnalyzeTarget::from_request(None, Some("")),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn limits_clamp() {
        assert_eq!(clamp_limit(None, 10, 20), 10);
        assert_eq!(clamp_limit(Some(0), 10, 20), 1);
        assert_eq!(clamp_limit(Some(-4), 5, 10), 1);
        assert_eq!(clamp_limit(Some(99), 5, 10), 10);
        assert_eq!(clamp_limit(Some(99), SEARCH_DEFAULT_LIMIT, SEARCH_MAX_LIMIT), 20);
        assert_eq!(clamp_limit(Some(99), ENRICH_DEFAULT_LIMIT, ENRICH_MAX_LIMIT), 10);
    }

    #[tokio::test]
    async fn analyze_direct_end_to_end_scoring() {
        let details = json!({ "620": { "success": true, "data": {
            "name": "Portal 2",
            "price_overview": { "final": 999, "initial": 1999, "discount_percent": 50 }
        } } });
        let game = parse_app_details(&details, AppId(620)).unwrap();
        let (orch, _, health) = orchestrator(FakeSource::new().with_game(620, game));

        let analysis = orch
            .analyze(AnalyzeTarget::Identifier(AppId(620)), None, Some(" "))
            .await
            .unwrap();
        assert_eq!(analysis.source, ResolutionSource::Direct);
        assert_eq!(
            analysis.source_url,
            "https://store.test/api/appdetails?appids=620&cc=ca&l=en"
        );
        assert_eq!(analysis.insight.score, 88);
        assert_eq!(analysis.insight.verdict, Verdict::GreatDeal);
        assert_eq!(analysis.insight.action, Action::BuyNow);
        assert_eq!(health.snapshot().successes, 1);
    }

    #[tokio::test]
    async fn analyze_surfaces_no_data() {
        let (orch, _, _) = orchestrator(FakeSource::new());
        let err = orch
            .analyze(AnalyzeTarget::Identifier(AppId(1)), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoData(_)));
    }

    #[tokio::test]
    async fn analyze_extraction_uses_input_url_and_rejects_empty_records() {
        let source = FakeSource::new()
            .with_extraction("https://a", Extracted::Game(priced("A", 10.0, Some(10.0))))
            .with_extraction("https://empty", Extracted::Game(GameRecord::default()))
            .with_extraction("https://text", Extracted::NotAGame)
            .with_extraction("https://broken", Extracted::Unparsable);
        let (orch, _, health) = orchestrator(source);

        let analysis = orch
            .analyze(AnalyzeTarget::Url("https://a".to_string()), None, None)
            .await
            .unwrap();
        assert_eq!(analysis.source, ResolutionSource::Extraction);
        assert_eq!(analysis.source_url, "https://a");
        assert_eq!(analysis.insight.verdict, Verdict::SmallDiscount);

        for url in ["https://empty", "https://text"] {
            let err = orch
                .analyze(AnalyzeTarget::Url(url.to_string()), None, None)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::NoData(_)), "{url}");
        }

        let err = orch
            .analyze(AnalyzeTarget::Url("https://broken".to_string()), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnparsableStream { .. }));
        assert_eq!(health.snapshot().failures, 1);
    }

    #[tokio::test]
    async fn compare_ranks_stably_and_skips_failures() {
        let source = FakeSource::new()
            .with_game(1, priced("First good", 10.0, Some(25.0)))
            .with_game(2, priced("Second good", 10.0, Some(30.0)))
            .with_game(3, priced("Amazing", 10.0, Some(75.0)))
            .with_game(4, priced("Full price", 10.0, None));
        let (orch, _, _) = orchestrator(source);

        let ids = [json!(4), json!(1), json!("oops"), json!(99), json!("2"), json!(3)];
        let cmp = orch.compare(&ids, None, None).await.unwrap();

        assert_eq!(cmp.count, 4);
        let order: Vec<u64> = cmp.ranked.iter().map(|r| r.identifier.0).collect();
        assert_eq!(order, vec![3, 1, 2, 4]);
        assert_eq!(cmp.ranked[1].insight.score, 78);
        assert_eq!(cmp.ranked[2].insight.score, 78);
        assert_eq!(
            cmp.ranked[0].source_url,
            "https://store.test/api/appdetails?appids=3&cc=ca&l=en"
        );
    }

    #[tokio::test]
    async fn compare_tie_order_follows_input() {
        let source = FakeSource::new()
            .with_game(10, priced("Ten", 5.0, Some(40.0)))
            .with_game(20, priced("Twenty", 5.0, Some(26.0)));
        let (orch, _, _) = orchestrator(source);

        let cmp = orch.compare(&[json!(20), json!(10)], None, None).await.unwrap();
        let order: Vec<u64> = cmp.ranked.iter().map(|r| r.identifier.0).collect();
        assert_eq!(order, vec![20, 10]);
    }

    #[tokio::test]
    async fn compare_resolves_only_first_twelve() {
        let mut source = FakeSource::new();
        for id in 0..15u64 {
            source = source.with_game(id, priced("g", 1.0, Some(id as f64)));
        }
        let (orch, source, _) = orchestrator(source);

        let ids: Vec<Value> = (0..15u64).map(|i| json!(i)).collect();
        let cmp = orch.compare(&ids, Some("us"), Some("en")).await.unwrap();

        assert_eq!(cmp.count, COMPARE_MAX_IDENTIFIERS);
        let calls = source.calls();
        assert_eq!(calls.len(), COMPARE_MAX_IDENTIFIERS);
        assert_eq!(calls.last().map(String::as_str), Some("detail:11"));
    }

    #[tokio::test]
    async fn compare_rejects_empty_input_before_any_call() {
        let (orch, source, _) = orchestrator(FakeSource::new());
        let err = orch.compare(&[], None, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn search_validates_and_clamps() {
        let source = FakeSource::new()
            .with_search_title(620, "Portal 2")
            .with_search_title(400, "Portal");
        let (orch, source, _) = orchestrator(source);

        assert!(matches!(
            orch.search("   ", None).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(source.calls().is_empty());

        let outcome = orch.search(" portal ", Some(0)).await.unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(source.calls(), vec!["search:portal".to_string()]);
    }

    #[tokio::test]
    async fn enrich_keeps_going_past_failures() {
        let source = FakeSource::new()
            .with_extraction("https://one", Extracted::Game(priced("One", 5.0, None)))
            .with_extraction("https://three", Extracted::Game(priced("Three", 0.0, None)));
        let (orch, source, _) = orchestrator(source);

        let urls = vec![json!("https://one"), json!("https://two"), json!("https://three")];
        let enriched = orch.enrich(&urls, None).await.unwrap();

        assert_eq!(enriched.len(), 3);
        assert_eq!(enriched[1].url, "https://two");
        assert!(enriched[1].game.is_none());
        assert_eq!(
            enriched[2].game.as_ref().and_then(|g| g.title.as_deref()),
            Some("Three")
        );
        assert_eq!(
            source.calls(),
            vec!["extract:https://one", "extract:https://two", "extract:https://three"]
        );
    }

    #[tokio::test]
    async fn enrich_limit_defaults_to_five_and_caps_at_ten() {
        let urls: Vec<Value> = (0..12).map(|i| json!(format!("https://u{i}"))).collect();

        let (orch, _, _) = orchestrator(FakeSource::new());
        assert_eq!(orch.enrich(&urls, None).await.unwrap().len(), 5);
        assert_eq!(orch.enrich(&urls, Some(50)).await.unwrap().len(), 10);
        assert_eq!(orch.enrich(&urls, Some(2)).await.unwrap().len(), 2);

        assert!(matches!(
            orch.enrich(&[], None).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn enrich_skips_non_string_entries() {
        let source = FakeSource::new()
            .with_extraction("https://b", Extracted::Game(priced("B", 9.99, Some(10.0))));
        let (orch, source, _) = orchestrator(source);

        let urls = vec![Value::Null, json!("https://b"), json!(42), json!("  ")];
        let enriched = orch.enrich(&urls, None).await.unwrap();

        assert_eq!(enriched.len(), 4);
        assert_eq!(enriched[0].url, "null");
        assert!(enriched[0].game.is_none());
        assert_eq!(
            enriched[1].game.as_ref().and_then(|g| g.title.as_deref()),
            Some("B")
        );
        assert_eq!(enriched[2].url, "42");
        assert!(enriched[2].game.is_none());
        assert!(enriched[3].game.is_none());
        assert_eq!(source.calls(), vec!["extract:https://b"]);
    }
}
