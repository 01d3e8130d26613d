//! Metrics collection module
//!
//! Tracks searches, upstream errors and per-item outcomes.

use crate::pipeline::{FailureReason, ProcessingOutcome};
use crate::provider::SearchError;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counters
#[derive(Debug, Default)]
pub struct Metrics {
    total_searches: AtomicU64,
    rate_limited: AtomicU64,
    service_errors: AtomicU64,
    cancelled_searches: AtomicU64,
    processed: AtomicU64,
    network_failures: AtomicU64,
    decode_failures: AtomicU64,
    storage_failures: AtomicU64,
    cancelled_items: AtomicU64,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment total search count
    pub fn inc_search(&self) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a search that aborted before or during processing
    pub fn record_search_error(&self, error: &SearchError) {
        let counter = match error {
            SearchError::RateLimited { .. } => &self.rate_limited,
            SearchError::Service { .. } => &self.service_errors,
            SearchError::Cancelled => &self.cancelled_searches,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of every processed candidate
    pub fn record_outcomes(&self, outcomes: &[ProcessingOutcome]) {
        for outcome in outcomes {
            let counter = match outcome.reason() {
                None => &self.processed,
                Some(FailureReason::Network) => &self.network_failures,
                Some(FailureReason::Decode) => &self.decode_failures,
                Some(FailureReason::Storage) => &self.storage_failures,
                Some(FailureReason::Cancelled) => &self.cancelled_items,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get total searches
    pub fn get_total_searches(&self) -> u64 {
        self.total_searches.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            total_searches: load(&self.total_searches),
            rate_limited: load(&self.rate_limited),
            service_errors: load(&self.service_errors),
            cancelled_searches: load(&self.cancelled_searches),
            processed: load(&self.processed),
            failed: FailureCounts {
                network: load(&self.network_failures),
                decode: load(&self.decode_failures),
                storage: load(&self.storage_failures),
                cancelled: load(&self.cancelled_items),
            },
        }
    }
}

/// Serializable view of [`Metrics`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_searches: u64,
    pub rate_limited: u64,
    pub service_errors: u64,
    pub cancelled_searches: u64,
    pub processed: u64,
    pub failed: FailureCounts,
}

/// Failed items per reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureCounts {
    pub network: u64,
    pub decode: u64,
    pub storage: u64,
    pub cancelled: u64,
}

impl FailureCounts {
    pub fn total(&self) -> u64 {
        self.network + self.decode + self.storage + self.cancelled
    }
}
