//! Bounded-concurrency processing of search candidates

use super::imaging::{self, Derivatives};
use super::models::{FailureReason, ProcessingOutcome, SizeTag};
use super::source::ImageSource;
use crate::cancellation::CancellationToken;
use crate::config::{ImageProcessingSettings, DEFAULT_MAX_CONCURRENCY};
use crate::provider::Candidate;
use crate::storage::StorageSink;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Operation-level pipeline failure
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Cancellation was requested before any candidate started
    #[error("operation cancelled")]
    Cancelled,
}

/// Downloads, resizes and stores candidates, at most `concurrency` at a time.
///
/// Every candidate yields exactly one [`ProcessingOutcome`]. A failure in one
/// candidate is recorded as its outcome and never reaches the others.
#[derive(Clone)]
pub struct Pipeline {
    source: Arc<dyn ImageSource>,
    storage: Arc<dyn StorageSink>,
    concurrency: usize,
    small_dimension: u32,
    thumb_dimension: u32,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn ImageSource>,
        storage: Arc<dyn StorageSink>,
        settings: &ImageProcessingSettings,
    ) -> Self {
        Self {
            source,
            storage,
            concurrency: settings.concurrency(),
            small_dimension: settings.small_dimension(),
            thumb_dimension: settings.thumb_dimension(),
        }
    }

    /// Override the concurrency limit. Zero selects the default.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = effective_limit(concurrency);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Process every candidate and return one outcome per candidate, in
    /// completion order.
    ///
    /// Returns [`PipelineError::Cancelled`] without starting any work if the
    /// token is already cancelled. Cancellation observed later turns the
    /// affected candidates into `Cancelled` failures.
    pub async fn process(
        &self,
        candidates: Vec<Candidate>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ProcessingOutcome>, PipelineError> {
        self.process_with_limit(candidates, self.concurrency, cancel)
            .await
    }

    /// Like [`Pipeline::process`] with a per-call concurrency limit.
    /// Zero selects the default.
    pub async fn process_with_limit(
        &self,
        candidates: Vec<Candidate>,
        concurrency: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<ProcessingOutcome>, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let concurrency = effective_limit(concurrency);
        let total = candidates.len();
        debug!(total, concurrency, "Processing candidates");

        let outcomes: Vec<ProcessingOutcome> = stream::iter(candidates)
            .map(|candidate| self.process_one(candidate, cancel))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        debug_assert_eq!(outcomes.len(), total);
        Ok(outcomes)
    }

    async fn process_one(
        &self,
        candidate: Candidate,
        cancel: &CancellationToken,
    ) -> ProcessingOutcome {
        if cancel.is_cancelled() {
            return cancelled(&candidate);
        }

        let fetched = tokio::select! {
            result = self.source.fetch(&candidate.source_url) => result,
            _ = cancel.cancelled() => return cancelled(&candidate),
        };

        let bytes = match fetched {
            Ok(bytes) => bytes,
            Err(e) => return failed(&candidate, FailureReason::Network, e.to_string()),
        };

        let derivatives = match self.render(bytes).await {
            Ok(derivatives) => derivatives,
            Err(message) => return failed(&candidate, FailureReason::Decode, message),
        };

        self.persist(candidate, derivatives).await
    }

    /// Decode and resize on the blocking pool
    async fn render(&self, bytes: Vec<u8>) -> Result<Derivatives, String> {
        let (small, thumb) = (self.small_dimension, self.thumb_dimension);
        match tokio::task::spawn_blocking(move || imaging::render_derivatives(&bytes, small, thumb))
            .await
        {
            Ok(Ok(derivatives)) => Ok(derivatives),
            Ok(Err(e)) => Err(e.to_string()),
            Err(join_error) => Err(format!("image processing aborted: {}", join_error)),
        }
    }

    /// Store both derivatives, or neither
    async fn persist(&self, candidate: Candidate, derivatives: Derivatives) -> ProcessingOutcome {
        let small_name = SizeTag::Small.storage_name(&candidate.id);
        let thumb_name = SizeTag::Thumb.storage_name(&candidate.id);

        let small_url = match self.storage.save(derivatives.small, &small_name).await {
            Ok(url) => url,
            Err(e) => return failed(&candidate, FailureReason::Storage, e.to_string()),
        };

        let thumb_url = match self.storage.save(derivatives.thumb, &thumb_name).await {
            Ok(url) => url,
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&small_name).await {
                    warn!(
                        photo_id = %candidate.id,
                        error = %cleanup,
                        "Failed to roll back small derivative"
                    );
                }
                return failed(&candidate, FailureReason::Storage, e.to_string());
            }
        };

        debug!(photo_id = %candidate.id, "Processed image");
        ProcessingOutcome::success(candidate, small_url, thumb_url)
    }
}

fn effective_limit(concurrency: usize) -> usize {
    if concurrency == 0 {
        DEFAULT_MAX_CONCURRENCY
    } else {
        concurrency
    }
}

fn cancelled(candidate: &Candidate) -> ProcessingOutcome {
    info!(photo_id = %candidate.id, "Processing cancelled");
    ProcessingOutcome::failure(
        candidate.id.clone(),
        FailureReason::Cancelled,
        "Processing cancelled",
    )
}

fn failed(candidate: &Candidate, reason: FailureReason, message: String) -> ProcessingOutcome {
    error!(photo_id = %candidate.id, %reason, error = %message, "Failed to process image");
    ProcessingOutcome::failure(candidate.id.clone(), reason, message)
}
