//! Image processing pipeline
//!
//! Turns ranked search candidates into stored derivatives: download, decode,
//! resize to "small" and "thumb", encode, and persist, with bounded
//! concurrency and per-item failure isolation.

pub mod imaging;
mod models;
mod processor;
mod source;

pub use models::*;
pub use processor::{Pipeline, PipelineError};
pub use source::{FetchError, ImageSource};
