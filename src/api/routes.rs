use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::error::{AppError, Result};
use crate::health::{HealthState, UpstreamSnapshot};
use crate::orchestrator::{AnalyzeTarget, Comparison, Orchestrator};
use crate::types::{Analysis, EnrichedEntry, SearchOutcome};

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub health: Arc<HealthState>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(get_root))
        .route("/health", get(get_health))
        .route("/analyze", post(post_analyze))
        .route("/compare", post(post_compare))
        .route("/search", post(post_search))
        .route("/enrich", post(post_enrich))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

// Aliases keep older clients (appid / steamUrl / cc / lang) working.

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default, alias = "appid")]
    pub identifier: Option<Value>,
    #[serde(default, alias = "steamUrl")]
    pub url: Option<String>,
    #[serde(default, alias = "cc")]
    pub region: Option<String>,
    #[serde(default, alias = "lang")]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    #[serde(default, alias = "appids")]
    pub identifiers: Vec<Value>,
    #[serde(default, alias = "cc")]
    pub region: Option<String>,
    #[serde(default, alias = "lang")]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Numeric queries (`1942`) are searched as their decimal text.
    #[serde(default)]
    pub query: Option<Value>,
    #[serde(default)]
    pub limit: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct EnrichRequest {
    /// Kept as raw values so one bad entry does not reject the batch.
    #[serde(default)]
    pub urls: Vec<Value>,
    #[serde(default)]
    pub limit: Option<Value>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// `{ "success": true, ...body }`
#[derive(Serialize)]
pub struct Success<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Success<T> {
    fn new(body: T) -> Json<Self> {
        Json(Self { success: true, body })
    }
}

#[derive(Serialize)]
pub struct EnrichResponse {
    pub enriched: Vec<EnrichedEntry>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub upstream: UpstreamSnapshot,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_root() -> &'static str {
    "GameScout backend is running"
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        upstream: state.health.snapshot(),
    })
}

async fn post_analyze(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<Success<Analysis>>> {
    let req = request_body(payload)?;
    let target = AnalyzeTarget::from_request(req.identifier.as_ref(), req.url.as_deref())?;
    let analysis = state
        .orchestrator
        .analyze(target, req.region.as_deref(), req.language.as_deref())
        .await
        .map_err(|e| logged("analyze", e))?;
    Ok(Success::new(analysis))
}

async fn post_compare(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<Success<Comparison>>> {
    let req = request_body(payload)?;
    let comparison = state
        .orchestrator
        .compare(&req.identifiers, req.region.as_deref(), req.language.as_deref())
        .await
        .map_err(|e| logged("compare", e))?;
    Ok(Success::new(comparison))
}

async fn post_search(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Success<SearchOutcome>>> {
    let req = request_body(payload)?;
    let query = query_text(req.query.as_ref());
    let outcome = state
        .orchestrator
        .search(&query, lenient_limit(req.limit.as_ref()))
        .await
        .map_err(|e| logged("search", e))?;
    Ok(Success::new(outcome))
}

async fn post_enrich(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<EnrichRequest>, JsonRejection>,
) -> Result<Json<Success<EnrichResponse>>> {
    let req = request_body(payload)?;
    let enriched = state
        .orchestrator
        .enrich(&req.urls, lenient_limit(req.limit.as_ref()))
        .await
        .map_err(|e| logged("enrich", e))?;
    Ok(Success::new(EnrichResponse { enriched }))
}

/// Malformed bodies get the same error shape as every other failure.
fn request_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| {
            AppError::InvalidInput(format!("Malformed request body: {}", rejection.body_text()))
        })
}

fn logged(op: &'static str, e: AppError) -> AppError {
    warn!(op, status = e.status().as_u16(), error = %e, "request failed");
    e
}

/// Strings pass through, numbers become their text; anything else is a blank query.
fn query_text(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Limits may arrive as numbers or numeric strings; anything else means "use the default".
fn lenient_limit(v: Option<&Value>) -> Option<i64> {
    match v? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}
