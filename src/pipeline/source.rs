//! Where the pipeline downloads full-size images from

use crate::network::{HttpClient, HttpRequest};
use async_trait::async_trait;
use thiserror::Error;

/// Download failure
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download timed out: {0}")]
    Timeout(String),

    #[error("download failed: {0}")]
    Transport(String),

    #[error("download returned HTTP {0}")]
    Status(u16),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Fetches the raw bytes behind a candidate's source URL.
///
/// Implementations are shared by every pipeline task and must not build a
/// new transport per call. Cancellation is handled by the caller, which
/// drops the returned future.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[async_trait]
impl ImageSource for HttpClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .send(&HttpRequest::get(url), self.default_timeout())
            .await?;

        if !response.is_success() {
            return Err(FetchError::Status(response.status));
        }

        Ok(response.body)
    }
}
