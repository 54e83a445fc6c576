mod api;
mod config;
mod error;
mod fetcher;
mod health;
mod orchestrator;
mod scorer;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::{build_http_client, SourceResolver};
use crate::health::HealthState;
use crate::orchestrator::Orchestrator;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    if cfg.extraction_api_key.is_none() {
        warn!("EXTRACTION_API_KEY not set: /analyze by url and /enrich will fail until it is configured.");
    }

    let http = build_http_client(cfg.http_timeout_secs)?;
    let resolver = SourceResolver::from_config(&cfg, http);
    info!(
        store = %cfg.store_base_url,
        extraction = %cfg.extraction_url,
        timeout_secs = cfg.http_timeout_secs,
        "Upstream clients ready"
    );

    let health = Arc::new(HealthState::new());
    let orchestrator = Orchestrator::new(
        Arc::new(resolver),
        Arc::clone(&health),
        cfg.default_region.clone(),
        cfg.default_language.clone(),
    );

    let app = router(ApiState {
        orchestrator: Arc::new(orchestrator),
        health,
    });
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
