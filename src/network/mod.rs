//! HTTP networking module
//!
//! Provides the shared HTTP transport and the retry policy composed around
//! upstream calls.

mod client;
mod retry;

pub use client::{HttpClient, HttpRequest, HttpResponse, USER_AGENT};
pub use retry::RetryPolicy;

use thiserror::Error;

/// Failure of a single transport call (no usable response)
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("request cancelled")]
    Cancelled,
}
