//! Harvest orchestration: discovery, then collect and write per ticker.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tickerpulse_core::{PartitionKey, Ticker};
use tickerpulse_storage::ObjectStore;

use crate::collector::Collector;
use crate::discovery::TickerSource;
use crate::error::HarvestError;
use crate::search::SocialSearch;
use crate::writer::PartitionWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestSettings {
    pub min_likes: u64,
    pub search_limit: u32,
    pub window_hours: i64,
}

impl HarvestSettings {
    #[must_use]
    pub fn from_app_config(config: &tickerpulse_core::AppConfig) -> Self {
        Self {
            min_likes: config.search_min_likes,
            search_limit: config.search_limit,
            window_hours: config.search_window_hours,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenPartition {
    pub ticker: Ticker,
    pub key: String,
    pub posts: usize,
    pub added: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerFailure {
    pub ticker: Ticker,
    pub error: String,
}

/// Outcome of one harvest cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarvestReport {
    /// `success` when every ticker was written, `partial` otherwise.
    pub status: &'static str,
    pub date: String,
    pub written: Vec<WrittenPartition>,
    pub failed: Vec<TickerFailure>,
}

pub struct Harvester<'a> {
    discovery: &'a dyn TickerSource,
    search: &'a dyn SocialSearch,
    store: &'a dyn ObjectStore,
    bucket: &'a str,
    settings: HarvestSettings,
}

impl<'a> Harvester<'a> {
    #[must_use]
    pub fn new(
        discovery: &'a dyn TickerSource,
        search: &'a dyn SocialSearch,
        store: &'a dyn ObjectStore,
        bucket: &'a str,
        settings: HarvestSettings,
    ) -> Self {
        Self {
            discovery,
            search,
            store,
            bucket,
            settings,
        }
    }

    /// Run one cycle partitioned by the UTC date of `started_at`.
    ///
    /// A ticker whose collection or write fails is recorded in
    /// [`HarvestReport::failed`] and nothing is written for it; the remaining
    /// tickers are still processed.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Discovery`] if the ticker list cannot be fetched.
    pub async fn run(&self, started_at: DateTime<Utc>) -> Result<HarvestReport, HarvestError> {
        let tickers = self.discovery.trending().await?;
        let date = started_at.date_naive();
        let since = TimeDelta::try_hours(self.settings.window_hours)
            .and_then(|window| started_at.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        tracing::info!(
            tickers = tickers.len(),
            %date,
            %since,
            "starting harvest cycle"
        );

        let collector = Collector::new(
            self.search,
            self.store,
            self.bucket,
            self.settings.min_likes,
            self.settings.search_limit,
        );
        let writer = PartitionWriter::new(self.store, self.bucket);

        let mut written = Vec::new();
        let mut failed = Vec::new();

        for ticker in tickers {
            let partition = PartitionKey::new(&ticker, date);
            let result = async {
                let outcome = collector.collect(&ticker, &partition, since).await?;
                let key = writer.write(&partition, &outcome.posts).await?;
                Ok::<_, HarvestError>(WrittenPartition {
                    ticker: ticker.clone(),
                    key,
                    posts: outcome.posts.len(),
                    added: outcome.added,
                })
            }
            .await;

            match result {
                Ok(partition) => {
                    tracing::info!(
                        ticker = %partition.ticker,
                        added = partition.added,
                        total = partition.posts,
                        "harvested ticker"
                    );
                    written.push(partition);
                }
                Err(e) => {
                    tracing::error!(ticker = %ticker, error = %e, "ticker harvest failed; skipping");
                    failed.push(TickerFailure {
                        ticker,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            written = written.len(),
            failed = failed.len(),
            "harvest cycle complete"
        );

        Ok(HarvestReport {
            status: if failed.is_empty() { "success" } else { "partial" },
            date: date.format("%Y-%m-%d").to_string(),
            written,
            failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::TimeZone;
    use tickerpulse_core::Post;
    use tickerpulse_storage::{MemoryObjectStore, ObjectStore as _};

    use super::*;
    use crate::error::{DiscoveryError, SearchError};
    use crate::search::{SearchHit, SearchRequest};

    struct StaticTickers(Vec<&'static str>);

    #[async_trait]
    impl TickerSource for StaticTickers {
        async fn trending(&self) -> Result<Vec<Ticker>, DiscoveryError> {
            Ok(self.0.iter().map(|s| Ticker::new(*s)).collect())
        }
    }

    struct FailingDiscovery;

    #[async_trait]
    impl TickerSource for FailingDiscovery {
        async fn trending(&self) -> Result<Vec<Ticker>, DiscoveryError> {
            Err(DiscoveryError::UnexpectedStatus {
                status: 503,
                url: "https://example.com".to_string(),
            })
        }
    }

    /// Returns one popular post per ticker, failing for `fail_for`.
    struct PerTickerSearch {
        fail_for: &'static str,
    }

    #[async_trait]
    impl SocialSearch for PerTickerSearch {
        async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, SearchError> {
            if request.ticker.as_str() == self.fail_for {
                return Err(SearchError::AllAccountsFailed {
                    attempts: 1,
                    last: "rate limited".to_string(),
                });
            }
            Ok(vec![SearchHit {
                id: format!("{}-1", request.ticker.file_stem()),
                username: "trader".to_string(),
                display_name: "Trader".to_string(),
                text: format!("{} looks strong", request.ticker),
                created_at: "2024-01-01 10:00:00+00:00".to_string(),
                like_count: 100,
                retweet_count: 10,
                reply_count: 1,
                hashtags: vec![],
                url: "https://x.com/trader/status/1".to_string(),
            }])
        }
    }

    fn settings() -> HarvestSettings {
        HarvestSettings {
            min_likes: 5,
            search_limit: 125,
            window_hours: 24,
        }
    }

    #[tokio::test]
    async fn failing_ticker_does_not_stop_the_others() {
        let store = MemoryObjectStore::new();
        let discovery = StaticTickers(vec!["$AAPL", "$TSLA", "$NVDA"]);
        let search = PerTickerSearch { fail_for: "$TSLA" };
        let harvester = Harvester::new(&discovery, &search, &store, "raw", settings());

        let started = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let report = harvester.run(started).await.unwrap();

        assert_eq!(report.status, "partial");
        assert_eq!(report.date, "2024-01-01");
        let written: Vec<&str> = report.written.iter().map(|w| w.ticker.as_str()).collect();
        assert_eq!(written, vec!["$AAPL", "$NVDA"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].ticker.as_str(), "$TSLA");
        assert!(report.failed[0].error.contains("rate limited"));

        assert_eq!(
            store.list("raw", "tweets/").await.unwrap(),
            vec![
                "tweets/AAPL.json/date=2024-01-01/data.json".to_string(),
                "tweets/NVDA.json/date=2024-01-01/data.json".to_string(),
            ]
        );
        let body = store
            .body("raw", "tweets/AAPL.json/date=2024-01-01/data.json")
            .await
            .unwrap();
        let posts: Vec<Post> = serde_json::from_slice(&body).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].ticker.as_str(), "$AAPL");
    }

    #[tokio::test]
    async fn rerun_on_same_day_overwrites_without_duplicates() {
        let store = MemoryObjectStore::new();
        let discovery = StaticTickers(vec!["$AAPL"]);
        let search = PerTickerSearch { fail_for: "" };
        let harvester = Harvester::new(&discovery, &search, &store, "raw", settings());
        let started = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        let first = harvester.run(started).await.unwrap();
        let second = harvester.run(started).await.unwrap();

        assert_eq!(first.status, "success");
        assert_eq!(first.written[0].added, 1);
        assert_eq!(second.written[0].added, 0);
        assert_eq!(second.written[0].posts, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn discovery_failure_aborts_the_cycle() {
        let store = MemoryObjectStore::new();
        let search = PerTickerSearch { fail_for: "" };
        let harvester = Harvester::new(&FailingDiscovery, &search, &store, "raw", settings());
        let result = harvester.run(Utc::now()).await;
        assert!(matches!(result, Err(HarvestError::Discovery(_))));
        assert!(store.is_empty().await);
    }
}
