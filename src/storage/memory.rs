//! In-process storage sink

use super::{validate_name, StorageError, StorageSink};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Keeps stored derivatives in memory, keyed by logical name
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored under `name`
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.items
            .read()
            .ok()
            .and_then(|items| items.get(name).cloned())
    }

    /// All stored logical names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .items
            .read()
            .map(|items| items.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StorageError {
    StorageError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "memory storage lock poisoned",
    ))
}

#[async_trait]
impl StorageSink for MemoryStorage {
    async fn save(&self, bytes: Vec<u8>, name: &str) -> Result<String, StorageError> {
        validate_name(name)?;
        self.items
            .write()
            .map_err(|_| poisoned())?
            .insert(name.to_string(), bytes);
        Ok(format!("memory://{}", name))
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        validate_name(name)?;
        self.items.write().map_err(|_| poisoned())?.remove(name);
        Ok(())
    }
}
