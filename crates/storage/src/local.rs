//! Filesystem-backed object store for development.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{validate_key, ObjectStore, ObjectStoreError};

/// Stores each blob as a file under `root`, using the key as a relative
/// path.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a key. Fails on keys that could escape `root`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Readers only ever see a complete blob.
        let mut tmp = path.clone().into_os_string();
        tmp.push(".partial");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> LocalObjectStore {
        let root = std::env::temp_dir().join(format!("hearth-storage-{}", uuid::Uuid::new_v4()));
        LocalObjectStore::new(root)
    }

    #[tokio::test]
    async fn put_then_delete() {
        let store = temp_store();
        let key = "needs/n1/documents/d1.pdf";

        store.put(key, b"%PDF-1.7".to_vec(), "application/pdf").await.unwrap();
        let path = store.path_for(key).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF-1.7");

        store.delete(key).await.unwrap();
        assert!(!path.exists());

        let _ = tokio::fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn put_overwrites() {
        let store = temp_store();
        store.put("k", b"one".to_vec(), "text/plain").await.unwrap();
        store.put("k", b"two".to_vec(), "text/plain").await.unwrap();
        assert_eq!(tokio::fs::read(store.path_for("k").unwrap()).await.unwrap(), b"two");
        let _ = tokio::fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn deleting_missing_key_succeeds() {
        let store = temp_store();
        store.delete("needs/none/documents/none").await.unwrap();
    }

    #[tokio::test]
    async fn traversal_keys_rejected() {
        let store = temp_store();
        let err = store
            .put("../escape", b"x".to_vec(), "text/plain")
            .await
            .unwrap_err();
        assert!(matches!(err, ObjectStoreError::InvalidKey(_)));
    }
}
