//! Key/value blob storage
//!
//! The client persists its session and local credential lists as opaque string
//! blobs under fixed keys. [`MemoryStorage`] backs tests and the dev server,
//! [`FileStorage`] keeps the blobs in a single JSON file on disk.

use async_trait::async_trait;
use ireport_core::{storage_error, IReportResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// Persisted keys
pub mod keys {
    /// Current identity blob
    pub const CURRENT_USER: &str = "school_current_user";
    /// Staff list blob
    pub const STAFF: &str = "school_staff_members";
    /// Student list blob
    pub const STUDENTS: &str = "school_students";
    /// Bearer token string
    pub const AUTH_TOKEN: &str = "school_auth_token";
}

#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> IReportResult<Option<String>>;
    async fn set(&self, key: &str, value: String) -> IReportResult<()>;
    async fn remove(&self, key: &str) -> IReportResult<()>;
}

/// In-memory storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> IReportResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> IReportResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> IReportResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// All blobs in one JSON object on disk, written through on every change
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file at `path`
    pub async fn open(path: impl AsRef<Path>) -> IReportResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) if !content.trim().is_empty() => serde_json::from_str(&content)?,
            Ok(_) => HashMap::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(storage_error!(
                    format!("Failed to read {}", path.display()),
                    "file_storage",
                    e
                ))
            }
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened file storage");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, entries: &HashMap<String, String>) -> IReportResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            storage_error!(
                format!("Failed to replace {}", self.path.display()),
                "file_storage",
                e
            )
        })
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> IReportResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> IReportResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        self.flush(&entries).await
    }

    async fn remove(&self, key: &str) -> IReportResult<()> {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            self.flush(&entries).await?;
        }
        Ok(())
    }
}
