use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::StorageError;

/// Bytes of a stored object plus the etag they were read with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub etag: String,
}

/// Outcome of a read. Absence is an expected state, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetch {
    Found(StoredObject),
    NotFound,
}

/// Outcome of [`ObjectStore::delete_if_match`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Nothing was stored at the key.
    Missing,
    /// The object was rewritten since it was read; it was left in place.
    Changed,
}

/// Whole-object storage addressed by bucket and key.
///
/// Writes replace the object atomically from a reader's point of view: a
/// concurrent `get` sees either the old or the new body, never a mix.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, bucket: &str, key: &str) -> Result<Fetch, StorageError>;

    /// Create or fully overwrite the object at `key`.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Delete `key` only if its current etag equals `etag`.
    async fn delete_if_match(
        &self,
        bucket: &str,
        key: &str,
        etag: &str,
    ) -> Result<DeleteOutcome, StorageError>;

    /// Keys in `bucket` starting with `prefix`, sorted.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Etag of an object body: lowercase hex SHA-256.
#[must_use]
pub fn content_etag(body: &[u8]) -> String {
    format!("{:x}", Sha256::digest(body))
}
