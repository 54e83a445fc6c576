use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

use crate::config::DEBUG_MAX_CHARS;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed request fields. No upstream call was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The upstream answered but had nothing usable for a valid request.
    #[error("No data: {0}")]
    NoData(String),

    #[error("Extraction stream had no decodable frame ({frames} data frames)")]
    UnparsableStream { frames: usize },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Wire shape of every failed API response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NoData(_) => StatusCode::NOT_FOUND,
            AppError::UnparsableStream { .. } | AppError::Http(_) | AppError::Json(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Url(_) | AppError::Config(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short human-readable message plus an optional diagnostic string.
    /// Neither half carries request headers, so the extraction key never leaks.
    pub fn to_body(&self) -> ErrorBody {
        let (error, debug) = match self {
            AppError::InvalidInput(msg) | AppError::NoData(msg) => (msg.clone(), None),
            AppError::UnparsableStream { frames } => (
                "Failed to parse extraction stream".to_string(),
                Some(format!("{frames} data frames, none decodable")),
            ),
            AppError::Http(e) => ("Upstream request failed".to_string(), Some(e.to_string())),
            AppError::Json(e) => ("Upstream returned malformed JSON".to_string(), Some(e.to_string())),
            AppError::Url(e) => ("Could not build upstream URL".to_string(), Some(e.to_string())),
            AppError::Config(msg) => ("Server is misconfigured".to_string(), Some(msg.clone())),
            AppError::Io(e) => ("Internal I/O failure".to_string(), Some(e.to_string())),
        };
        ErrorBody {
            success: false,
            error,
            debug: debug.map(|d| truncate_debug(&d)),
        }
    }
}

/// Cut a diagnostic string to `DEBUG_MAX_CHARS` characters (not bytes).
pub fn truncate_debug(s: &str) -> String {
    s.chars().take(DEBUG_MAX_CHARS).collect()
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), Json(self.to_body())).into_response()
    }
}
