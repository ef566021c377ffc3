//! Async key-value storage for drafts and saved configs

use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// Async byte store keyed by opaque names
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value; a missing key is `Ok(None)`
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Remove a value; removing a missing key succeeds
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store, lost on exit
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Directory-backed store: one `<key>.json` file per key
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    async fn ensure_dir(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::CreateDir {
                path: self.dir.clone(),
                source: e,
            })
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::ReadFile { path, source: e }),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        self.ensure_dir().await?;

        // Write to a sibling file first so readers never see a torn value
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &value)
            .await
            .map_err(|e| StoreError::WriteFile {
                path: tmp.clone(),
                source: e,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::WriteFile {
                path: path.clone(),
                source: e,
            })?;

        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::RemoveFile { path, source: e }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_get_set_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get("draft").await.unwrap(), None);

        store.set("draft", b"one".to_vec()).await.unwrap();
        assert_eq!(store.get("draft").await.unwrap(), Some(b"one".to_vec()));

        store.delete("draft").await.unwrap();
        store.delete("draft").await.unwrap();
        assert_eq!(store.get("draft").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");

        FileStore::new(&data)
            .set("saved-configs", b"[]".to_vec())
            .await
            .unwrap();
        assert!(data.join("saved-configs.json").exists());

        let reopened = FileStore::new(&data);
        assert_eq!(
            reopened.get("saved-configs").await.unwrap(),
            Some(b"[]".to_vec())
        );
        reopened.delete("saved-configs").await.unwrap();
        assert_eq!(reopened.get("saved-configs").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_missing_dir_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("never-created"));
        assert_eq!(store.get("draft").await.unwrap(), None);
        store.delete("draft").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        for key in ["", "../escape", ".hidden", "a/b"] {
            assert!(matches!(
                store.set(key, Vec::new()).await,
                Err(StoreError::InvalidKey(_))
            ));
        }
    }
}
