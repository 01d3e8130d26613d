//! Reduction of per-item outcomes into the search summary
//!
//! Failures are counted and logged here. Which items failed, and why, does
//! not travel past this boundary.

use crate::pipeline::{ProcessedImage, ProcessingOutcome};
use serde::Serialize;
use tracing::warn;

/// Summary of one search-and-process run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    /// The query as submitted
    pub query: String,
    /// Number of candidates with both derivatives stored
    pub total_processed: usize,
    /// Number of candidates that failed for any reason
    pub total_failed: usize,
    /// Successful candidates, in completion order
    pub visible_results: Vec<ProcessedImage>,
}

impl SearchOutcome {
    /// Reduce an outcome multiset
    pub fn aggregate(query: impl Into<String>, outcomes: Vec<ProcessingOutcome>) -> Self {
        let query = query.into();
        let mut visible_results = Vec::with_capacity(outcomes.len());
        let mut total_failed = 0;

        for outcome in outcomes {
            match outcome {
                ProcessingOutcome::Success(image) => visible_results.push(image),
                ProcessingOutcome::Failure(failure) => {
                    total_failed += 1;
                    warn!(
                        query = %query,
                        photo_id = %failure.id,
                        reason = %failure.reason,
                        error = %failure.message,
                        "Candidate dropped from results"
                    );
                }
            }
        }

        Self {
            query,
            total_processed: visible_results.len(),
            total_failed,
            visible_results,
        }
    }

    /// Total number of candidates that were processed
    pub fn total(&self) -> usize {
        self.total_processed + self.total_failed
    }
}
