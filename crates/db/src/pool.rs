//! Key-value storage backends and the shared pool handle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::{DbError, Record};

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// A flat key-value store holding one JSON document per key.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Read the document stored under `key`, or `None` if nothing was written yet.
    async fn read(&self, key: &str) -> Result<Option<Value>, DbError>;

    /// Replace the document stored under `key`.
    async fn write(&self, key: &str, value: Value) -> Result<(), DbError>;
}

/// Process-local backend. Contents are lost when the pool is dropped.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Value>>,
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Option<Value>, DbError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), DbError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Directory-backed store: each key lives in `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Open (creating if needed) the data directory at `root`.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, DbError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KvBackend for FileBackend {
    async fn read(&self, key: &str) -> Result<Option<Value>, DbError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), DbError> {
        // Stage then rename; readers never see a partial document.
        let target = self.path_for(key);
        let staging = self.root.join(format!(".{key}.json.tmp"));
        let bytes = serde_json::to_vec_pretty(&value)?;
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, &target).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// Shared handle to a backend, cheap to clone.
///
/// All read-modify-write cycles go through [`DbPool::lock`], so concurrent
/// callers patching the same collection cannot lose each other's updates.
#[derive(Clone)]
pub struct DbPool {
    backend: Arc<dyn KvBackend>,
    write_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for DbPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbPool").finish_non_exhaustive()
    }
}

impl DbPool {
    /// Wrap an arbitrary backend.
    pub fn new(backend: impl KvBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// A pool over a fresh [`MemoryBackend`].
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::default())
    }

    /// Serialise a read-modify-write cycle against this pool.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Load a whole collection. A missing key is an empty collection.
    pub(crate) async fn load<T: Record>(&self, key: &str) -> Result<Vec<T>, DbError> {
        match self.backend.read(key).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace a whole collection.
    pub(crate) async fn store<T: Record>(&self, key: &str, records: &[T]) -> Result<(), DbError> {
        debug!(key, count = records.len(), "writing collection");
        self.backend.write(key, serde_json::to_value(records)?).await
    }
}

/// Create a pool from a location string.
///
/// `memory://` selects the in-memory backend; anything else is treated as a
/// data directory (an optional `file://` prefix is stripped).
pub async fn create_pool(location: &str) -> Result<DbPool, DbError> {
    if location == "memory://" {
        info!("Using in-memory storage");
        return Ok(DbPool::in_memory());
    }
    let dir = location.strip_prefix("file://").unwrap_or(location);
    info!("Using data directory {dir}");
    Ok(DbPool::new(FileBackend::open(dir).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn memory_backend_round_trips_documents() {
        let backend = MemoryBackend::default();
        assert!(backend.read("k").await.unwrap().is_none());
        backend.write("k", json!([1, 2])).await.unwrap();
        assert_eq!(backend.read("k").await.unwrap(), Some(json!([1, 2])));
    }

    #[tokio::test]
    async fn file_backend_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let first = FileBackend::open(dir.path()).await.unwrap();
        first.write("workflows", json!([{ "id": "a" }])).await.unwrap();

        let second = FileBackend::open(dir.path()).await.unwrap();
        assert_eq!(
            second.read("workflows").await.unwrap(),
            Some(json!([{ "id": "a" }]))
        );
        assert!(second.read("executions").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_backend_reports_corrupt_documents() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("workflows.json"), b"{not json")
            .await
            .unwrap();
        let backend = FileBackend::open(dir.path()).await.unwrap();
        assert!(matches!(backend.read("workflows").await, Err(DbError::Serde(_))));
    }

    #[tokio::test]
    async fn create_pool_accepts_memory_and_directories() {
        assert!(create_pool("memory://").await.is_ok());

        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data");
        let location = format!("file://{}", nested.display());
        create_pool(&location).await.unwrap();
        assert!(nested.is_dir());
    }
}
