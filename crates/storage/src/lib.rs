//! Object-store gateway for supporting-document blobs.
//!
//! [`ObjectStore`] is the seam the intake layer writes through. Three
//! implementations ship here: S3 for production, a local directory for
//! development, and an in-memory store with fault injection for tests.

pub mod error;
pub mod local;
pub mod memory;
pub mod s3;

use async_trait::async_trait;

pub use error::ObjectStoreError;
pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

/// A flat key/blob store.
///
/// `put` overwrites an existing blob under the same key. `delete` of a key
/// that holds nothing succeeds, so a retried delete is harmless.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<(), ObjectStoreError>;

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;

    /// Short backend name for log lines.
    fn backend(&self) -> &'static str;
}

/// Reject keys that could escape a key prefix or a local root.
pub fn validate_key(key: &str) -> Result<(), ObjectStoreError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad {
        return Err(ObjectStoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
