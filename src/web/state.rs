//! Application state shared across handlers

use crate::config::Settings;
use crate::metrics::Metrics;
use crate::search::ImageSearch;
use std::path::Path;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Search executor
    pub search: Arc<ImageSearch>,
    /// Runtime counters, shared with the executor
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, search: ImageSearch) -> Self {
        let metrics = search.metrics().clone();
        Self {
            settings: Arc::new(settings),
            search: Arc::new(search),
            metrics,
        }
    }

    /// Directory the stored derivatives are served from
    pub fn image_root(&self) -> &Path {
        &self.settings.image_processing.output_directory
    }

    pub fn is_development(&self) -> bool {
        self.settings.server.environment.is_development()
    }
}
