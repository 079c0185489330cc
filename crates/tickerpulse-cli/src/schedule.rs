//! `tickerpulse schedule`: cron-driven harvest followed by enrichment of the
//! partitions it wrote.
//!
//! A filesystem store emits no notifications, so each run synthesizes the
//! batch the object store would have delivered for the keys just written.

use std::sync::Arc;

use tickerpulse_core::AppConfig;
use tickerpulse_enrich::StorageEvent;
use tickerpulse_storage::FsObjectStore;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::{enrich, harvest};

/// Run until interrupted.
///
/// # Errors
///
/// Returns an error if no inference endpoint is configured, the cron
/// expression is invalid, or the scheduler cannot start.
pub(crate) async fn run_schedule(config: AppConfig, store: FsObjectStore) -> anyhow::Result<()> {
    // Fail at startup rather than on the first tick.
    enrich::inference_client(&config)?;

    let cron = config.harvest_cron.clone();
    let config = Arc::new(config);
    let store = Arc::new(store);

    let scheduler = JobScheduler::new().await?;
    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let config = Arc::clone(&config);
        let store = Arc::clone(&store);

        Box::pin(async move {
            tracing::info!("scheduler: starting harvest run");
            run_cycle(&config, store.as_ref()).await;
            tracing::info!("scheduler: harvest run complete");
        })
    })?;
    scheduler.add(job).await?;
    scheduler.start().await?;
    tracing::info!(cron = %cron, "scheduler started");

    tokio::signal::ctrl_c().await?;
    tracing::info!("received shutdown signal");
    Ok(())
}

async fn run_cycle(config: &AppConfig, store: &FsObjectStore) {
    let report = match harvest::run_harvest(config, store).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: harvest cycle failed");
            return;
        }
    };
    tracing::info!(
        status = report.status,
        written = report.written.len(),
        failed = report.failed.len(),
        "scheduler: harvest finished"
    );

    if report.written.is_empty() {
        return;
    }

    let event = StorageEvent::for_keys(
        &config.source_bucket,
        report.written.iter().map(|w| w.key.as_str()),
    );
    match enrich::run_enrich(config, store, &event).await {
        Ok(enriched) => tracing::info!(
            processed = enriched.processed.len(),
            failed = enriched.failed.len(),
            "scheduler: enrichment finished"
        ),
        Err(e) => tracing::error!(error = %e, "scheduler: enrichment failed"),
    }
}
