use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::StoreError;

/// String slots addressed by key. Single-key reads and writes are atomic.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.inner.write().await.insert(key.to_owned(), value);
        Ok(())
    }
}

/// Whole map kept in memory and rewritten to one JSON file on every change.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
    path: PathBuf,
}

impl JsonFileStore {
    /// Loads `path`, falling back to its `.json.tmp` sibling when the main file is corrupt.
    pub async fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, String>>(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "failed to parse store, trying tmp fallback");
                    match tokio::fs::read(tmp_path(&path)).await {
                        Ok(tmp_bytes) => serde_json::from_slice(&tmp_bytes).unwrap_or_default(),
                        Err(_) => HashMap::new(),
                    }
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "no store file yet; starting empty");
                HashMap::new()
            }
        };
        Self {
            inner: Arc::new(RwLock::new(data)),
            path,
        }
    }

    async fn persist(&self, map: &HashMap<String, String>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(map)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = tmp_path(&self.path);
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        // Hold the write lock across the flush so concurrent writers cannot interleave files.
        let mut inner = self.inner.write().await;
        let mut staged = inner.clone();
        staged.insert(key.to_owned(), value);
        // Memory only changes once the file agrees with it.
        self.persist(&staged).await?;
        *inner = staged;
        Ok(())
    }
}
