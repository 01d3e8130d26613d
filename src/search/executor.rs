//! Search-and-process orchestration

use crate::cancellation::CancellationToken;
use crate::metrics::Metrics;
use crate::pipeline::{Pipeline, PipelineError};
use crate::provider::{PhotoProvider, SearchError};
use crate::results::SearchOutcome;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Default number of candidates requested from the provider
pub const MAX_SEARCH_RESULTS: u32 = 10;

impl From<PipelineError> for SearchError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Cancelled => SearchError::Cancelled,
        }
    }
}

/// Runs a query against the provider and pushes the candidates through the
/// pipeline.
///
/// Upstream failures abort before any image work starts. A run that is
/// cancelled at any point reports [`SearchError::Cancelled`] rather than
/// partial counts.
pub struct ImageSearch {
    provider: Arc<dyn PhotoProvider>,
    pipeline: Pipeline,
    metrics: Arc<Metrics>,
    max_results: u32,
}

impl ImageSearch {
    /// Create a new search executor
    pub fn new(provider: Arc<dyn PhotoProvider>, pipeline: Pipeline) -> Self {
        Self {
            provider,
            pipeline,
            metrics: Arc::new(Metrics::new()),
            max_results: MAX_SEARCH_RESULTS,
        }
    }

    /// Set the number of candidates requested per search
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    /// Share an existing metrics collector
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Execute a search and process every candidate it returns
    pub async fn execute(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome, SearchError> {
        self.metrics.inc_search();
        let result = self.run(query, cancel).await;
        if let Err(ref e) = result {
            self.metrics.record_search_error(e);
        }
        result
    }

    async fn run(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome, SearchError> {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        let start = Instant::now();
        let candidates = self
            .provider
            .search(query, self.max_results, cancel)
            .await?;

        info!(
            query,
            provider = self.provider.name(),
            candidates = candidates.len(),
            "Search returned candidates"
        );

        let outcomes = self.pipeline.process(candidates, cancel).await?;
        self.metrics.record_outcomes(&outcomes);

        if cancel.is_cancelled() {
            info!(query, "Search cancelled while processing");
            return Err(SearchError::Cancelled);
        }

        let summary = SearchOutcome::aggregate(query, outcomes);
        info!(
            query,
            processed = summary.total_processed,
            failed = summary.total_failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Search complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageProcessingSettings;
    use crate::test_support::{
        candidates, png_bytes, ProviderReply, RecordingStorage, StubProvider, StubSource,
    };
    use std::time::Duration;

    fn search_with(provider: Arc<StubProvider>, source: Arc<StubSource>) -> ImageSearch {
        let pipeline = Pipeline::new(
            source,
            Arc::new(RecordingStorage::new()),
            &ImageProcessingSettings::default(),
        );
        ImageSearch::new(provider, pipeline)
    }

    #[tokio::test]
    async fn test_search_processes_all_candidates() {
        let provider = Arc::new(StubProvider::new(ProviderReply::Candidates(candidates(
            "car", 10,
        ))));
        let source = Arc::new(StubSource::serving(png_bytes(8, 8)));
        let search = search_with(provider.clone(), source);

        let summary = search
            .execute("cars", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(provider.calls(), vec![("cars".to_string(), 10)]);
        assert_eq!(summary.query, "cars");
        assert_eq!(summary.total_processed, 10);
        assert_eq!(summary.total_failed, 0);
        assert_eq!(summary.visible_results.len(), 10);
        assert_eq!(search.metrics().snapshot().processed, 10);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_listed() {
        let provider = Arc::new(StubProvider::new(ProviderReply::Candidates(candidates(
            "car", 2,
        ))));
        let source = Arc::new(
            StubSource::serving(png_bytes(8, 8)).failing("https://images.test/car1", "boom"),
        );
        let search = search_with(provider, source);

        let summary = search
            .execute("cars", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.total_processed, 1);
        assert_eq!(summary.total_failed, 1);
        assert_eq!(summary.visible_results.len(), 1);
        assert_eq!(summary.visible_results[0].id, "car2");
    }

    #[tokio::test]
    async fn test_rate_limit_aborts_before_processing() {
        let provider = Arc::new(StubProvider::new(ProviderReply::RateLimited(Some(
            Duration::from_secs(60),
        ))));
        let source = Arc::new(StubSource::serving(png_bytes(8, 8)));
        let search = search_with(provider, source.clone());

        let err = search
            .execute("cars", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(source.calls(), 0);
        assert_eq!(search.metrics().snapshot().rate_limited, 1);
    }

    #[tokio::test]
    async fn test_service_error_aborts_before_processing() {
        let provider = Arc::new(StubProvider::new(ProviderReply::Status(503)));
        let source = Arc::new(StubSource::serving(png_bytes(8, 8)));
        let search = search_with(provider, source.clone());

        let err = search
            .execute("cars", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::Service { status: Some(503), .. }));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let provider = Arc::new(StubProvider::new(ProviderReply::Candidates(candidates(
            "car", 3,
        ))));
        let source = Arc::new(StubSource::serving(png_bytes(8, 8)));
        let search = search_with(provider.clone(), source);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = search.execute("cars", &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_during_provider_call() {
        let provider = Arc::new(StubProvider::new(ProviderReply::CancelDuringSearch));
        let source = Arc::new(StubSource::serving(png_bytes(8, 8)));
        let search = search_with(provider, source.clone());

        let err = search
            .execute("cars", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_during_processing_reports_cancellation() {
        let provider = Arc::new(StubProvider::new(ProviderReply::Candidates(candidates(
            "car", 4,
        ))));
        let source = Arc::new(
            StubSource::serving(png_bytes(8, 8)).with_delay(Duration::from_secs(30)),
        );
        let search = search_with(provider, source);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = tokio::time::timeout(Duration::from_secs(5), search.execute("cars", &cancel))
            .await
            .expect("cancellation should be prompt")
            .unwrap_err();

        assert!(err.is_cancelled());
        let snapshot = search.metrics().snapshot();
        assert_eq!(snapshot.cancelled_searches, 1);
        assert_eq!(snapshot.failed.cancelled, 4);
    }
}
