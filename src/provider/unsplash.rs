//! Unsplash photo search

use super::traits::*;
use crate::cancellation::CancellationToken;
use crate::config::UnsplashSettings;
use crate::network::{HttpClient, HttpRequest, HttpResponse, RetryPolicy, TransportError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Unsplash `/search/photos` client
pub struct UnsplashProvider {
    client: HttpClient,
    retry: RetryPolicy,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    id: String,
    alt_description: Option<String>,
    description: Option<String>,
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    raw: String,
}

impl From<UnsplashPhoto> for Candidate {
    fn from(photo: UnsplashPhoto) -> Self {
        Self {
            id: photo.id,
            alt_text: photo.alt_description,
            description: photo.description,
            source_url: photo.urls.raw,
        }
    }
}

impl UnsplashProvider {
    pub fn new(client: HttpClient, settings: &UnsplashSettings, retry: RetryPolicy) -> Self {
        Self {
            client,
            retry,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            timeout: settings.request_timeout(),
        }
    }

    /// Build the search request
    fn request(&self, query: &str, limit: u32) -> HttpRequest {
        HttpRequest::get(format!("{}/search/photos", self.base_url))
            .param("client_id", &self.api_key)
            .param("page", "1")
            .param("per_page", limit.to_string())
            .param("query", query)
            .header("Accept-Version", "v1")
    }

    /// Classify the final response
    fn response(&self, response: HttpResponse) -> Result<Vec<Candidate>, SearchError> {
        if !response.is_success() {
            warn!(
                status = response.status,
                body = %response.text(),
                "Unsplash API returned an error"
            );

            if response.is_rate_limited() {
                return Err(SearchError::RateLimited {
                    retry_after: retry_after(&response, Utc::now()),
                });
            }

            return Err(SearchError::status(response.status));
        }

        let parsed: SearchResponse = response.json().map_err(|e| {
            error!(error = %e, "Unparseable Unsplash response");
            SearchError::malformed(e)
        })?;

        Ok(parsed.results.into_iter().map(Candidate::from).collect())
    }
}

/// Resume delay from a `Retry-After` header: relative seconds or an absolute
/// HTTP date measured against `now`.
fn retry_after(response: &HttpResponse, now: DateTime<Utc>) -> Option<Duration> {
    let value = response.header("retry-after")?.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let resume_at = DateTime::parse_from_rfc2822(value).ok()?;
    let delta = resume_at.with_timezone(&Utc) - now;
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}

#[async_trait]
impl PhotoProvider for UnsplashProvider {
    fn name(&self) -> &str {
        "unsplash"
    }

    async fn search(
        &self,
        query: &str,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Candidate>, SearchError> {
        let request = self.request(query, limit);

        let result = self
            .retry
            .execute(cancel, || {
                self.client
                    .execute_with_timeout(&request, self.timeout, cancel)
            })
            .await;

        match result {
            Ok(response) => {
                let candidates = self.response(response)?;
                debug!(query, count = candidates.len(), "Unsplash search complete");
                Ok(candidates)
            }
            Err(TransportError::Cancelled) => Err(SearchError::Cancelled),
            Err(TransportError::Request(e)) => {
                error!(error = %e, "Network error calling Unsplash API");
                Err(SearchError::network(e))
            }
        }
    }
}
