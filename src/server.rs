//! HTTP front end: one JSON endpoint wrapping the scrape pipeline.
//!
//! Stateless by design — the only shared state is the HTTP client and
//! the concurrency cap. CORS is wide open for POST so a static frontend
//! on any origin can call it; OPTIONS preflights are answered by the
//! CORS layer and non-POST methods get a plain 405 from the router.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::error::ScrapeError;
use crate::fetcher::PageFetcher;
use crate::report;
use crate::scraper;

#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<dyn PageFetcher>,
    pub concurrency: usize,
}

#[derive(Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub repo_url: String,
}

#[derive(Serialize)]
pub struct ScrapeResponse {
    pub success: bool,
    pub csv: String,
    pub message: String,
}

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

/// Build the router with CORS applied to every response, error or not.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/scrape", post(scrape_handler))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, bind: &str, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((bind, port)).await?;
    info!("Listening on http://{}:{}", bind, port);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn scrape_handler(
    State(state): State<AppState>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<ScrapeResponse>, ErrorResponse> {
    let repo_url = request.repo_url.trim().to_string();
    if repo_url.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "No repository URL provided",
        ));
    }

    let contracts = scraper::scrape_repository(state.fetcher.as_ref(), &repo_url, state.concurrency)
        .await
        .map_err(|e| {
            error!("Scrape failed for {}: {}", repo_url, e);
            let status = match e {
                ScrapeError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error_response(status, &e.to_string())
        })?;

    let csv = report::to_csv(&contracts)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))?;

    Ok(Json(ScrapeResponse {
        success: true,
        csv,
        message: format!("Successfully scraped {} contracts", contracts.len()),
    }))
}

fn error_response(status: StatusCode, message: &str) -> ErrorResponse {
    (status, Json(json!({ "error": message })))
}

// ── Tests ──
