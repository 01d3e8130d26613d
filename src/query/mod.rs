//! Search request validation
//!
//! A query must be present, between 2 and 100 characters long, and limited
//! to letters, digits, whitespace and `- _ . , ! ? &`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MIN_QUERY_LENGTH: usize = 2;
pub const MAX_QUERY_LENGTH: usize = 100;

static ALLOWED_CHARACTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\s\-_.,!?&]+$").unwrap());

const PROPERTY: &str = "searchQuery";

/// Body of `POST /api/images/search`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub search_query: String,
}

/// One rejected rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub property: String,
    pub message: String,
}

impl ValidationError {
    fn query(message: impl Into<String>) -> Self {
        Self {
            property: PROPERTY.to_string(),
            message: message.into(),
        }
    }
}

impl SearchRequest {
    pub fn new(search_query: impl Into<String>) -> Self {
        Self {
            search_query: search_query.into(),
        }
    }

    /// Check every rule, returning the ones that failed
    pub fn validate(&self) -> Vec<ValidationError> {
        let query = self.search_query.as_str();
        let mut errors = Vec::new();
        if query.trim().is_empty() {
            errors.push(ValidationError::query("Search query is required"));
        }

        let length = query.chars().count();
        if length < MIN_QUERY_LENGTH {
            errors.push(ValidationError::query(format!(
                "Search query must be at least {} characters",
                MIN_QUERY_LENGTH
            )));
        }
        if length > MAX_QUERY_LENGTH {
            errors.push(ValidationError::query(format!(
                "Search query must not exceed {} characters",
                MAX_QUERY_LENGTH
            )));
        }
        if !ALLOWED_CHARACTERS.is_match(query) {
            errors.push(ValidationError::query(
                "Search query contains invalid characters.",
            ));
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
