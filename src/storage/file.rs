//! File-system storage sink

use super::{validate_name, StorageError, StorageSink};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info};

/// Extension appended to every stored derivative
const EXTENSION: &str = "jpg";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Stores derivatives as `<root>/<name>.jpg`.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so a reader never observes a partially written image.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    public_prefix: String,
}

impl FileStorage {
    /// Create the storage root if needed
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        })
    }

    /// Directory derivatives are written to
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_name(name: &str) -> String {
        format!("{}.{}", name, EXTENSION)
    }
}

#[async_trait]
impl StorageSink for FileStorage {
    async fn save(&self, bytes: Vec<u8>, name: &str) -> Result<String, StorageError> {
        validate_name(name)?;

        let file_name = Self::file_name(name);
        let path = self.root.join(&file_name);
        let temp = self.root.join(format!(
            ".{}.{}.tmp",
            file_name,
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let written = async {
            tokio::fs::write(&temp, &bytes).await?;
            tokio::fs::rename(&temp, &path).await
        }
        .await;

        if let Err(e) = written {
            error!(error = %e, file = %file_name, "Failed to save image");
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        info!(path = %path.display(), bytes = bytes.len(), "Saved image");
        Ok(format!("{}/{}", self.public_prefix, file_name))
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        validate_name(name)?;

        match tokio::fs::remove_file(self.root.join(Self::file_name(name))).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
