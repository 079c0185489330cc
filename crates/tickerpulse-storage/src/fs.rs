//! Filesystem-backed object store: one directory per bucket, keys map to
//! relative paths.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::StorageError;
use crate::object::{content_etag, DeleteOutcome, Fetch, ObjectStore, StoredObject};

const TMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, StorageError> {
        validate_segment(bucket, bucket)?;
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let mut path = self.bucket_dir(bucket)?;
        if key.is_empty() {
            return Err(invalid_key(key, "key is empty"));
        }
        for segment in key.split('/') {
            validate_segment(key, segment)?;
            path.push(segment);
        }
        Ok(path)
    }
}

fn invalid_key(key: &str, reason: &str) -> StorageError {
    StorageError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_segment(key: &str, segment: &str) -> Result<(), StorageError> {
    if segment.is_empty() {
        return Err(invalid_key(key, "empty path segment"));
    }
    if segment == "." || segment == ".." {
        return Err(invalid_key(key, "relative path segment"));
    }
    if segment.contains('\\') {
        return Err(invalid_key(key, "backslash in path segment"));
    }
    Ok(())
}

fn io_error(bucket: &str, key: &str, source: std::io::Error) -> StorageError {
    StorageError::Io {
        bucket: bucket.to_string(),
        key: key.to_string(),
        source,
    }
}

fn is_temp_file(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TMP_SUFFIX)
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Fetch, StorageError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(body) => {
                let etag = content_etag(&body);
                Ok(Fetch::Found(StoredObject { body, etag }))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Fetch::NotFound),
            Err(e) => Err(io_error(bucket, key, e)),
        }
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        let parent = path
            .parent()
            .ok_or_else(|| invalid_key(key, "key has no parent directory"))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| invalid_key(key, "key has no file name"))?;

        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(bucket, key, e))?;

        // Write beside the target and rename so readers never see a partial body.
        let tmp = parent.join(format!(".{file_name}.{}{TMP_SUFFIX}", uuid::Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&tmp, &body).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_error(bucket, key, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_error(bucket, key, e));
        }

        tracing::debug!(bucket, key, bytes = body.len(), content_type, "object written");
        Ok(())
    }

    /// Claim-then-verify: the object is first renamed to a private claim
    /// path, so a `put` racing with this call lands on a fresh file that is
    /// never touched. The claimed body is deleted only if its etag matches;
    /// otherwise it is linked back unless a newer object already took its place.
    async fn delete_if_match(
        &self,
        bucket: &str,
        key: &str,
        etag: &str,
    ) -> Result<DeleteOutcome, StorageError> {
        let path = self.object_path(bucket, key)?;
        let claim = claim_path(&path).ok_or_else(|| invalid_key(key, "key has no file name"))?;

        match tokio::fs::rename(&path, &claim).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DeleteOutcome::Missing),
            Err(e) => return Err(io_error(bucket, key, e)),
        }

        let claimed = match tokio::fs::read(&claim).await {
            Ok(body) => body,
            Err(e) => {
                let _ = restore_claim(&claim, &path).await;
                return Err(io_error(bucket, key, e));
            }
        };

        if content_etag(&claimed) != etag {
            restore_claim(&claim, &path)
                .await
                .map_err(|e| io_error(bucket, key, e))?;
            return Ok(DeleteOutcome::Changed);
        }

        tokio::fs::remove_file(&claim)
            .await
            .map_err(|e| io_error(bucket, key, e))?;
        prune_empty_dirs(&path, &self.bucket_dir(bucket)?).await;
        Ok(DeleteOutcome::Deleted)
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        let bucket_dir = self.bucket_dir(bucket)?;
        let mut keys = Vec::new();
        let mut pending = vec![bucket_dir.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(io_error(bucket, prefix, e)),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| io_error(bucket, prefix, e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| io_error(bucket, prefix, e))?;
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Some(key) = relative_key(&bucket_dir, &path) else {
                    continue;
                };
                let is_tmp = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(is_temp_file);
                if !is_tmp && key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

fn relative_key(bucket_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(bucket_dir).ok()?;
    let segments: Option<Vec<&str>> = relative.iter().map(|s| s.to_str()).collect();
    Some(segments?.join("/"))
}

fn claim_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    Some(path.with_file_name(format!(
        ".{name}.{}.claim{TMP_SUFFIX}",
        uuid::Uuid::new_v4()
    )))
}

/// Put a claimed object back at `path` unless a newer object is already
/// there, then drop the claim.
async fn restore_claim(claim: &Path, path: &Path) -> std::io::Result<()> {
    match tokio::fs::hard_link(claim, path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            tracing::debug!(path = %path.display(), "newer object written during claim; dropping claimed body");
        }
        Err(e) => return Err(e),
    }
    tokio::fs::remove_file(claim).await
}

/// Remove now-empty directories between a deleted object and its bucket root.
async fn prune_empty_dirs(deleted: &Path, bucket_dir: &Path) {
    let mut current = deleted.parent();
    while let Some(dir) = current {
        if dir == bucket_dir || !dir.starts_with(bucket_dir) {
            break;
        }
        if tokio::fs::remove_dir(dir).await.is_err() {
            break;
        }
        current = dir.parent();
    }
}
