use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

/// Numeric storefront listing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(pub u64);

impl AppId {
    /// Accepts a JSON number or a string of ASCII digits (whitespace trimmed).
    pub fn from_json(v: &serde_json::Value) -> Option<Self> {
        match v {
            serde_json::Value::Number(n) => n.as_u64().map(AppId),
            serde_json::Value::String(s) => Self::parse(s),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok().map(AppId)
    }
}

impl std::fmt::Display for AppId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Game metadata
// ---------------------------------------------------------------------------

/// Normalized storefront metadata. `None` means unknown; `Some(0.0)` means
/// free (price) or not discounted (discount). The two are never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub title: Option<String>,
    pub current_price: Option<f64>,
    pub original_price: Option<f64>,
    pub discount_percent: Option<f64>,
    pub release_date: Option<String>,
    pub tags: Vec<String>,
    pub review_summary: Option<String>,
}

impl GameRecord {
    /// True when not a single field carries information.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.current_price.is_none()
            && self.original_price.is_none()
            && self.discount_percent.is_none()
            && self.release_date.is_none()
            && self.tags.is_empty()
            && self.review_summary.is_none()
    }
}

// ---------------------------------------------------------------------------
// Insight
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    #[serde(rename = "Free-to-play")]
    FreeToPlay,
    #[serde(rename = "Not on sale")]
    NotOnSale,
    #[serde(rename = "Amazing deal")]
    AmazingDeal,
    #[serde(rename = "Great deal")]
    GreatDeal,
    #[serde(rename = "Good deal")]
    GoodDeal,
    #[serde(rename = "Small discount")]
    SmallDiscount,
    #[serde(rename = "Barely on sale")]
    BarelyOnSale,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::FreeToPlay => "Free-to-play",
            Verdict::NotOnSale => "Not on sale",
            Verdict::AmazingDeal => "Amazing deal",
            Verdict::GreatDeal => "Great deal",
            Verdict::GoodDeal => "Good deal",
            Verdict::SmallDiscount => "Small discount",
            Verdict::BarelyOnSale => "Barely on sale",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    #[serde(rename = "Try it now")]
    TryItNow,
    #[serde(rename = "Wait")]
    Wait,
    #[serde(rename = "Buy now (if you want it)")]
    BuyNow,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::TryItNow => "Try it now",
            Action::Wait => "Wait",
            Action::BuyNow => "Buy now (if you want it)",
        };
        write!(f, "{s}")
    }
}

/// Deal-quality summary derived from a single GameRecord.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub verdict: Verdict,
    /// 0-100, higher is a better deal.
    pub score: u8,
    pub reason: &'static str,
    pub action: Action,
}

// ---------------------------------------------------------------------------
// Operation results
// ---------------------------------------------------------------------------

/// Which strategy produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSource {
    Direct,
    Extraction,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub source: ResolutionSource,
    pub source_url: String,
    pub game: GameRecord,
    pub insight: Insight,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub identifier: AppId,
    pub source_url: String,
    pub game: GameRecord,
    pub insight: Insight,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub identifier: AppId,
    pub title: String,
    pub store_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub source_url: String,
    pub results: Vec<SearchHit>,
}

/// One enrich entry; `game` is null when extraction failed for `url`.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedEntry {
    pub url: String,
    pub game: Option<GameRecord>,
}
