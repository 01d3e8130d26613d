//! HTTP request handlers

use super::error::ApiError;
use super::state::AppState;
use crate::cancellation::CancellationToken;
use crate::metrics::MetricsSnapshot;
use crate::pipeline::ProcessedImage;
use crate::query::SearchRequest;
use crate::results::SearchOutcome;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::info;

/// Successful search response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub search_query: String,
    pub total_processed: usize,
    pub total_failed: usize,
    pub processed_images: Vec<ImageResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub image_id: String,
    pub alt_description: Option<String>,
    pub description: Option<String>,
    pub small_image_url: String,
    pub thumbnail_url: String,
}

impl From<ProcessedImage> for ImageResponse {
    fn from(image: ProcessedImage) -> Self {
        Self {
            image_id: image.id,
            alt_description: image.alt_text,
            description: image.description,
            small_image_url: image.small_url,
            thumbnail_url: image.thumb_url,
        }
    }
}

impl From<SearchOutcome> for SearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        Self {
            search_query: outcome.query,
            total_processed: outcome.total_processed,
            total_failed: outcome.total_failed,
            processed_images: outcome
                .visible_results
                .into_iter()
                .map(ImageResponse::from)
                .collect(),
        }
    }
}

/// Search, download and store images for a query
pub async fn search_images(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = payload?;

    let errors = request.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    info!(query = %request.search_query, "Searching images");

    // Dropping this future (client disconnect) cancels the search.
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    let result = state.search.execute(&request.search_query, &cancel).await;
    guard.disarm();

    Ok(Json(SearchResponse::from(result?)))
}

/// Serve a stored derivative
pub async fn image_file(
    State(state): State<AppState>,
    Path(file): Path<String>,
    request: Request,
) -> Response {
    if file.starts_with('.') || file.contains(['/', '\\']) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let path = state.image_root().join(&file);
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.map(Body::new).into_response(),
        Err(never) => match never {},
    }
}

/// Runtime counters
pub async fn stats(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}
