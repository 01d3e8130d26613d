//! Mapping of request failures onto HTTP responses

use crate::provider::SearchError;
use crate::query::ValidationError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

/// Status sent when the client went away before the search finished
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

const SERVICE_UNAVAILABLE_DETAIL: &str =
    "Image search service unavailable, please try again after some time";

/// Problem-details body
#[derive(Debug, Serialize)]
pub struct Problem {
    pub status: u16,
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Serialize)]
struct ValidationBody {
    errors: Vec<ValidationError>,
}

/// Errors a handler can return
#[derive(Debug)]
pub enum ApiError {
    /// The body failed one or more validation rules
    Validation(Vec<ValidationError>),
    /// The body was not the expected JSON
    MalformedBody(String),
    /// The search itself failed
    Search(SearchError),
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        ApiError::Search(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

fn problem(status: u16, title: &str, detail: impl Into<String>) -> Response {
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = Problem {
        status,
        title: title.to_string(),
        detail: detail.into(),
    };
    (code, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(ValidationBody { errors })).into_response()
            }
            ApiError::MalformedBody(detail) => problem(400, "Bad Request", detail),
            ApiError::Search(err) => match err {
                SearchError::RateLimited { .. } => {
                    warn!(error = %err, "Upstream rate limit reached");
                    problem(429, "Rate Limit Exceeded", err.to_string())
                }
                SearchError::Service { status, .. } => {
                    error!(error = %err, upstream_status = ?status, "Image search failed");
                    problem(503, "Service Unavailable", SERVICE_UNAVAILABLE_DETAIL)
                }
                SearchError::Cancelled => {
                    info!("Search request cancelled");
                    problem(
                        CLIENT_CLOSED_REQUEST,
                        "Request Cancelled",
                        "The request was cancelled",
                    )
                }
            },
        }
    }
}
