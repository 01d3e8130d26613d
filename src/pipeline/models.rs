//! Per-item processing outcomes

use crate::provider::Candidate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Derivative size produced for every candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeTag {
    Small,
    Thumb,
}

impl SizeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeTag::Small => "small",
            SizeTag::Thumb => "thumb",
        }
    }

    /// Logical storage name for a candidate's derivative, `"{id}_{tag}"`
    pub fn storage_name(&self, id: &str) -> String {
        format!("{}_{}", id, self.as_str())
    }
}

/// Why a candidate failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Download failed (transport error, timeout, non-success status)
    Network,
    /// Bytes were not a usable raster image
    Decode,
    /// A derivative could not be persisted
    Storage,
    /// Cancellation was requested before or during the download
    Cancelled,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureReason::Network => "network",
            FailureReason::Decode => "decode",
            FailureReason::Storage => "storage",
            FailureReason::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// A candidate whose derivatives were both stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedImage {
    pub id: String,
    pub alt_text: Option<String>,
    pub description: Option<String>,
    pub small_url: String,
    pub thumb_url: String,
}

/// A candidate that could not be processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingFailure {
    pub id: String,
    pub reason: FailureReason,
    pub message: String,
}

/// Result of processing exactly one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Success(ProcessedImage),
    Failure(ProcessingFailure),
}

impl ProcessingOutcome {
    pub fn success(candidate: Candidate, small_url: String, thumb_url: String) -> Self {
        Self::Success(ProcessedImage {
            id: candidate.id,
            alt_text: candidate.alt_text,
            description: candidate.description,
            small_url,
            thumb_url,
        })
    }

    pub fn failure(id: impl Into<String>, reason: FailureReason, message: impl Into<String>) -> Self {
        Self::Failure(ProcessingFailure {
            id: id.into(),
            reason,
            message: message.into(),
        })
    }

    /// Id of the candidate this outcome belongs to
    pub fn id(&self) -> &str {
        match self {
            Self::Success(image) => &image.id,
            Self::Failure(failure) => &failure.id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Failure reason, if this is a failure
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.reason),
        }
    }
}
