//! Durable storage for encoded image derivatives
//!
//! A [`StorageSink`] persists one encoded byte stream under a logical name
//! and hands back the address callers use to fetch it. Implementations must
//! be safe to call concurrently from every in-flight pipeline task.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::Path;
use thiserror::Error;

/// Storage failure
#[derive(Debug, Error)]
pub enum StorageError {
    /// Empty name, or one that is not already a bare file name
    #[error("Invalid file name: {0:?}")]
    InvalidName(String),

    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// Persists encoded images under logical names
#[async_trait]
pub trait StorageSink: Send + Sync {
    /// Store `bytes` under `name`, returning the public address
    async fn save(&self, bytes: Vec<u8>, name: &str) -> Result<String, StorageError>;

    /// Remove the item stored under `name`. Removing a missing item succeeds.
    async fn delete(&self, name: &str) -> Result<(), StorageError>;
}

/// Reject names that are empty or would escape the storage root
pub fn validate_name(name: &str) -> Result<(), StorageError> {
    let is_base_form = !name.trim().is_empty()
        && !name.contains(['\\', '\0'])
        && Path::new(name).file_name() == Some(OsStr::new(name));

    if is_base_form {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}
