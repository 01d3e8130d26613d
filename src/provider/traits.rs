//! Provider trait and types

use crate::cancellation::CancellationToken;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// One search result awaiting processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Provider's stable identifier, unique within a response
    pub id: String,
    /// Short accessibility text
    pub alt_text: Option<String>,
    /// Photographer's description
    pub description: Option<String>,
    /// Address of the full-resolution image
    pub source_url: String,
}

impl Candidate {
    pub fn new(id: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            alt_text: None,
            description: None,
            source_url: source_url.into(),
        }
    }

    pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = Some(alt_text.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classified failure of an upstream search
#[derive(Debug, Error)]
pub enum SearchError {
    /// Upstream quota exhausted
    #[error("Unsplash API rate limit exceeded. {}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    /// Upstream unavailable, rejected the request, or answered with garbage
    #[error("{message}")]
    Service {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<BoxError>,
    },

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,
}

impl SearchError {
    /// Non-success status other than 429
    pub fn status(status: u16) -> Self {
        Self::Service {
            message: format!("API error: {}", status),
            status: Some(status),
            source: None,
        }
    }

    /// No response was received
    pub fn network(source: impl Into<BoxError>) -> Self {
        Self::Service {
            message: "Failed to reach image search service".to_string(),
            status: None,
            source: Some(source.into()),
        }
    }

    /// A success response whose body could not be parsed
    pub fn malformed(source: impl Into<BoxError>) -> Self {
        Self::Service {
            message: "Malformed response from image search service".to_string(),
            status: None,
            source: Some(source.into()),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(delay) => format!(
            "Please try again in {:.0} minutes",
            delay.as_secs_f64() / 60.0
        ),
        None => "Please try again later (free tier: 50 requests/hour)".to_string(),
    }
}

/// Source of ranked photo candidates
#[async_trait]
pub trait PhotoProvider: Send + Sync {
    /// Provider name, for logging
    fn name(&self) -> &str;

    /// Fetch up to `limit` candidates for `query`, in relevance order
    async fn search(
        &self,
        query: &str,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Candidate>, SearchError>;
}
