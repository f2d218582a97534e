use std::{
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::db::models::Document;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Whole-document persistence.
///
/// `load` never fails: an absent, empty or unreadable document degrades to
/// [`Document::default`] and the problem is only logged. `save` replaces the
/// persisted document and reports failures to the caller.
#[async_trait]
pub trait Store: Send + Sync {
    async fn load(&self) -> Document;
    async fn save(&self, doc: &Document) -> Result<(), StoreError>;
}

/// Pretty-printed JSON file on local disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "database.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn load(&self) -> Document {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No database at {:?}, starting empty", self.path);
                return Document::default();
            }
            Err(e) => {
                error!("Error reading database {:?}: {}", self.path, e);
                return Document::default();
            }
        };

        if raw.trim().is_empty() {
            warn!("Database {:?} is empty, starting empty", self.path);
            return Document::default();
        }

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            error!("Database {:?} is corrupt, falling back to empty: {}", self.path, e);
            Document::default()
        })
    }

    async fn save(&self, doc: &Document) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(doc)?;
        let tmp = self.temp_path();

        // Write aside and rename so readers never see a half-written file
        fs::write(&tmp, body).await.map_err(|e| {
            error!("Error writing database {:?}: {}", tmp, e);
            e
        })?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            error!("Error replacing database {:?}: {}", self.path, e);
            e
        })?;

        Ok(())
    }
}

/// Keeps the document in memory. Used by tests and throwaway runs.
#[derive(Default)]
pub struct MemoryStore {
    doc: RwLock<Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: Document) -> Self {
        Self {
            doc: RwLock::new(doc),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load(&self) -> Document {
        self.doc.read().await.clone()
    }

    async fn save(&self, doc: &Document) -> Result<(), StoreError> {
        *self.doc.write().await = doc.clone();
        Ok(())
    }
}
