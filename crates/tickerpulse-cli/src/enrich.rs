//! `tickerpulse enrich`: process a notification batch against the configured store.

use std::path::Path;

use tickerpulse_core::keys::RAW_PREFIX;
use tickerpulse_core::{AppConfig, PartitionKey};
use tickerpulse_enrich::{EnrichmentPipeline, EnrichmentReport, InferenceClient, SentimentEnricher, StorageEvent};
use tickerpulse_storage::ObjectStore;
use tokio::io::AsyncReadExt as _;

/// Read a notification batch from `path`, or from stdin when `path` is `-`.
pub(crate) async fn read_event(path: &Path) -> anyhow::Result<StorageEvent> {
    let body = if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        tokio::io::stdin().read_to_end(&mut buf).await?;
        buf
    } else {
        tokio::fs::read(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?
    };
    Ok(serde_json::from_slice(&body)?)
}

/// Synthesize a batch covering every raw partition in the source bucket.
pub(crate) async fn pending_event(
    config: &AppConfig,
    store: &dyn ObjectStore,
) -> anyhow::Result<StorageEvent> {
    let keys: Vec<String> = store
        .list(&config.source_bucket, RAW_PREFIX)
        .await?
        .into_iter()
        .filter(|key| PartitionKey::parse_raw_key(key).is_ok())
        .collect();
    tracing::info!(count = keys.len(), "found pending raw partitions");
    Ok(StorageEvent::for_keys(&config.source_bucket, keys))
}

/// Run the enrichment pipeline over `event`.
///
/// # Errors
///
/// Returns an error if no inference endpoint is configured or the client
/// cannot be built. Per-file failures are reported, not propagated.
pub(crate) async fn run_enrich(
    config: &AppConfig,
    store: &dyn ObjectStore,
    event: &StorageEvent,
) -> anyhow::Result<EnrichmentReport> {
    let classifier = inference_client(config)?;
    let enricher = SentimentEnricher::new(&classifier, config.inference_max_chars);
    let pipeline = EnrichmentPipeline::new(store, &enricher, &config.dest_bucket);
    Ok(pipeline.handle(event).await)
}

pub(crate) fn inference_client(config: &AppConfig) -> anyhow::Result<InferenceClient> {
    let url = config.require_inference_url()?;
    InferenceClient::new(
        url,
        config.inference_api_key.clone(),
        config.inference_timeout_secs,
        config.retry_policy(),
    )
    .map_err(|e| anyhow::anyhow!("failed to build inference client: {e}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tickerpulse_storage::FsObjectStore;

    use super::*;

    fn config(root: &Path) -> AppConfig {
        let vars = HashMap::from([(
            "TICKERPULSE_STORAGE_ROOT".to_string(),
            root.display().to_string(),
        )]);
        tickerpulse_core::build_app_config(|key| {
            vars.get(key).cloned().ok_or(std::env::VarError::NotPresent)
        })
        .expect("config should build")
    }

    #[tokio::test]
    async fn pending_event_lists_only_raw_partition_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let store = FsObjectStore::new(dir.path());
        for key in [
            "tweets/AAPL.json/date=2024-01-01/data.json",
            "tweets/AAPL.json/date=2024-01-01/notes.txt",
            "config/accounts.json",
        ] {
            store
                .put(&config.source_bucket, key, b"[]".to_vec(), "application/json")
                .await
                .unwrap();
        }

        let event = pending_event(&config, &store).await.unwrap();

        assert_eq!(event.records.len(), 1);
        assert_eq!(event.records[0].s3.bucket.name, config.source_bucket);
        assert_eq!(
            event.records[0].s3.object.key,
            "tweets/AAPL.json/date%3D2024-01-01/data.json"
        );
    }

    #[tokio::test]
    async fn read_event_parses_notification_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(
            &path,
            r#"{"Records":[{"s3":{"bucket":{"name":"raw"},"object":{"key":"tweets/A.json/date%3D2024-01-01/data.json"}}}]}"#,
        )
        .unwrap();

        let event = read_event(&path).await.unwrap();
        assert_eq!(event.records.len(), 1);
        assert_eq!(event.records[0].s3.bucket.name, "raw");
    }

    #[test]
    fn enrich_without_inference_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = inference_client(&config(dir.path())).err().unwrap();
        assert!(err.to_string().contains("TICKERPULSE_INFERENCE_URL"));
    }
}
