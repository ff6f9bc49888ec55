//! In-process object store with fault injection, for tests and local runs
//! without a filesystem.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{validate_key, ObjectStore, ObjectStoreError};

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    blobs: Mutex<HashMap<String, StoredBlob>>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
    failing_delete_keys: Mutex<HashSet<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail until reset.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `delete` fail until reset.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make `delete` fail for one key only, leaving other keys deletable.
    pub fn fail_delete_of(&self, key: &str) {
        self.failing_delete_keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string());
    }

    fn delete_fails_for(&self, key: &str) -> bool {
        self.fail_deletes.load(Ordering::SeqCst)
            || self
                .failing_delete_keys
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .contains(key)
    }

    pub fn get(&self, key: &str) -> Option<StoredBlob> {
        self.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredBlob>> {
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        validate_key(key)?;
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Backend("injected put failure".to_string()));
        }
        self.lock().insert(
            key.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        validate_key(key)?;
        if self.delete_fails_for(key) {
            return Err(ObjectStoreError::Backend("injected delete failure".to_string()));
        }
        self.lock().remove(key);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
