//! Enrichment orchestration over one notification batch.

use serde::Serialize;
use tickerpulse_storage::{DeleteOutcome, Fetch, ObjectStore};

use crate::enricher::SentimentEnricher;
use crate::error::EnrichError;
use crate::record::Record;
use crate::trigger::{accept, AcceptedObject, StorageEvent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub file: String,
    pub error: String,
}

/// What one invocation did, in notification order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    pub processed: Vec<String>,
    pub failed: Vec<FailedFile>,
}

pub struct EnrichmentPipeline<'a> {
    store: &'a dyn ObjectStore,
    enricher: &'a SentimentEnricher<'a>,
    dest_bucket: &'a str,
}

impl<'a> EnrichmentPipeline<'a> {
    #[must_use]
    pub fn new(
        store: &'a dyn ObjectStore,
        enricher: &'a SentimentEnricher<'a>,
        dest_bucket: &'a str,
    ) -> Self {
        Self {
            store,
            enricher,
            dest_bucket,
        }
    }

    /// Process every accepted record of `event` sequentially.
    ///
    /// Records whose key is not a raw partition file are skipped and appear in
    /// neither list. A failure on one file is recorded and the batch moves on.
    pub async fn handle(&self, event: &StorageEvent) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();

        for record in &event.records {
            let Some(object) = accept(record) else {
                continue;
            };

            match self.process(&object).await {
                Ok(()) => report.processed.push(object.key),
                Err(e) => {
                    tracing::error!(
                        bucket = %object.bucket,
                        key = %object.key,
                        error = %e,
                        "enrichment failed"
                    );
                    report.failed.push(FailedFile {
                        file: object.key,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            processed = report.processed.len(),
            failed = report.failed.len(),
            "enrichment batch complete"
        );
        report
    }

    async fn process(&self, object: &AcceptedObject) -> Result<(), EnrichError> {
        let stored = match self.store.get(&object.bucket, &object.key).await? {
            Fetch::Found(stored) => stored,
            Fetch::NotFound => {
                return Err(EnrichError::SourceNotFound {
                    bucket: object.bucket.clone(),
                    key: object.key.clone(),
                })
            }
        };

        let mut posts: Vec<Record> =
            serde_json::from_slice(&stored.body).map_err(|source| EnrichError::Deserialize {
                context: format!("raw partition {}/{}", object.bucket, object.key),
                source,
            })?;
        tracing::info!(key = %object.key, count = posts.len(), "loaded raw partition");

        let stats = self.enricher.enrich(&mut posts).await;
        tracing::debug!(
            key = %object.key,
            classified = stats.classified,
            skipped = stats.skipped,
            unclassified = stats.unclassified,
            failed = stats.failed,
            "enriched posts"
        );

        let dest_key = object.dest_key();
        let body = serde_json::to_vec(&posts)?;
        self.store
            .put(self.dest_bucket, &dest_key, body, "application/json")
            .await?;
        tracing::info!(bucket = %self.dest_bucket, key = %dest_key, "wrote enriched file");

        match self
            .store
            .delete_if_match(&object.bucket, &object.key, &stored.etag)
            .await?
        {
            DeleteOutcome::Deleted => {
                tracing::info!(key = %object.key, "deleted raw partition");
                Ok(())
            }
            DeleteOutcome::Missing => Err(EnrichError::SourceAlreadyRemoved {
                bucket: object.bucket.clone(),
                key: object.key.clone(),
            }),
            DeleteOutcome::Changed => Err(EnrichError::SourceChanged {
                bucket: object.bucket.clone(),
                key: object.key.clone(),
            }),
        }
    }
}
