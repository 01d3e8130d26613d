//! Image search service
//!
//! Queries the Unsplash photo API, downloads every hit, renders a "small"
//! and a "thumb" JPEG derivative for each and stores them, reporting which
//! candidates made it through.

pub mod cancellation;
pub mod config;
pub mod metrics;
pub mod network;
pub mod pipeline;
pub mod provider;
pub mod query;
pub mod results;
pub mod search;
pub mod storage;
pub mod web;

#[cfg(test)]
mod test_support;

pub use cancellation::CancellationToken;
pub use config::Settings;
pub use pipeline::{Pipeline, ProcessingOutcome};
pub use provider::{Candidate, PhotoProvider, SearchError};
pub use results::SearchOutcome;
pub use search::ImageSearch;
pub use storage::StorageSink;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
