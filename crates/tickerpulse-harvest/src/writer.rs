//! Partitioned store writer.

use tickerpulse_core::{PartitionKey, Post};
use tickerpulse_storage::ObjectStore;

use crate::error::HarvestError;

pub struct PartitionWriter<'a> {
    store: &'a dyn ObjectStore,
    bucket: &'a str,
}

impl<'a> PartitionWriter<'a> {
    #[must_use]
    pub fn new(store: &'a dyn ObjectStore, bucket: &'a str) -> Self {
        Self { store, bucket }
    }

    /// Serialize `posts` and overwrite the partition's raw file with them.
    ///
    /// Accumulation happens in the collector; this replaces the whole object.
    /// Returns the key written.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Serialize`] or [`HarvestError::Storage`].
    pub async fn write(
        &self,
        partition: &PartitionKey,
        posts: &[Post],
    ) -> Result<String, HarvestError> {
        let key = partition.raw_key();
        let body = serde_json::to_vec_pretty(posts)?;
        self.store
            .put(self.bucket, &key, body, "application/json")
            .await?;
        tracing::info!(
            bucket = self.bucket,
            key = %key,
            count = posts.len(),
            "saved partition"
        );
        Ok(key)
    }
}
