use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::models::Document;
use crate::db::store::{Store, StoreError};

/// Serializes access to the store so each read-modify-write cycle runs as
/// one unit and concurrent requests cannot clobber each other's changes.
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn Store>,
    lock: Arc<Mutex<()>>,
}

impl Database {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn read<T>(&self, f: impl FnOnce(&Document) -> T) -> T {
        let _guard = self.lock.lock().await;
        let doc = self.store.load().await;
        f(&doc)
    }

    /// Loads the document, applies `f` and persists the result when `f`
    /// succeeds. A rejected change leaves the stored document untouched.
    pub async fn update<T, E>(
        &self,
        f: impl FnOnce(&mut Document) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let _guard = self.lock.lock().await;
        let mut doc = self.store.load().await;
        let out = f(&mut doc)?;
        self.store.save(&doc).await?;
        Ok(out)
    }
}
