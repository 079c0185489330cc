//! In-process object store for tests and dry runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::object::{content_etag, DeleteOutcome, Fetch, ObjectStore, StoredObject};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    body: Vec<u8>,
    content_type: String,
}

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), Entry>>,
}

impl MemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Body stored at `key`, if any.
    pub async fn body(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .map(|entry| entry.body.clone())
    }

    /// Content type recorded for `key`, if any.
    pub async fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.objects
            .lock()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .map(|entry| entry.content_type.clone())
    }

    /// Number of objects across all buckets.
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Fetch, StorageError> {
        let objects = self.objects.lock().await;
        Ok(
            match objects.get(&(bucket.to_string(), key.to_string())) {
                Some(entry) => Fetch::Found(StoredObject {
                    etag: content_etag(&entry.body),
                    body: entry.body.clone(),
                }),
                None => Fetch::NotFound,
            },
        )
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
                reason: "key is empty".to_string(),
            });
        }
        self.objects.lock().await.insert(
            (bucket.to_string(), key.to_string()),
            Entry {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn delete_if_match(
        &self,
        bucket: &str,
        key: &str,
        etag: &str,
    ) -> Result<DeleteOutcome, StorageError> {
        let mut objects = self.objects.lock().await;
        let id = (bucket.to_string(), key.to_string());
        let Some(entry) = objects.get(&id) else {
            return Ok(DeleteOutcome::Missing);
        };
        if content_etag(&entry.body) != etag {
            return Ok(DeleteOutcome::Changed);
        }
        objects.remove(&id);
        Ok(DeleteOutcome::Deleted)
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        let objects = self.objects.lock().await;
        Ok(objects
            .keys()
            .filter(|(b, k)| b == bucket && k.starts_with(prefix))
            .map(|(_, k)| k.clone())
            .collect())
    }
}
