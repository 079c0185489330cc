//! `tickerpulse harvest`: one harvest cycle against the configured store.

use chrono::Utc;
use tickerpulse_core::AppConfig;
use tickerpulse_harvest::{AccountPool, BirdSearch, FinderDiscovery, HarvestReport, HarvestSettings, Harvester};
use tickerpulse_storage::ObjectStore;

/// Build the adapters from `config` and run one cycle.
///
/// # Errors
///
/// Returns an error if the account pool cannot be loaded or is empty, or if
/// ticker discovery fails. Per-ticker failures are reported, not propagated.
pub(crate) async fn run_harvest(
    config: &AppConfig,
    store: &dyn ObjectStore,
) -> anyhow::Result<HarvestReport> {
    let accounts = AccountPool::load(store, &config.source_bucket, &config.accounts_key).await?;
    if accounts.is_empty() {
        anyhow::bail!(
            "account pool {}/{} has no usable accounts",
            config.source_bucket,
            config.accounts_key
        );
    }
    tracing::info!(accounts = accounts.len(), "loaded account pool");

    let retry = config.retry_policy();
    let discovery = FinderDiscovery::new(
        &config.discovery_url,
        &config.discovery_user_agent,
        config.http_timeout_secs,
        config.discovery_limit,
        retry,
    )
    .map_err(|e| anyhow::anyhow!("failed to build discovery client: {e}"))?;
    let search = BirdSearch::new(&config.search_bin, accounts, config.search_timeout_secs, retry);

    let harvester = Harvester::new(
        &discovery,
        &search,
        store,
        &config.source_bucket,
        HarvestSettings::from_app_config(config),
    );
    Ok(harvester.run(Utc::now()).await?)
}
