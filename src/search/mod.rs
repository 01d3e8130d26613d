//! Search orchestration module
//!
//! Coordinates the provider search, the image pipeline and aggregation of
//! the results.

mod executor;

pub use executor::{ImageSearch, MAX_SEARCH_RESULTS};
