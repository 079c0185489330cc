use std::path::PathBuf;

use crate::retry::RetryPolicy;
use crate::ConfigError;

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub storage_root: PathBuf,
    pub source_bucket: String,
    pub dest_bucket: String,
    pub accounts_key: String,
    pub discovery_url: String,
    pub discovery_user_agent: String,
    pub discovery_limit: usize,
    pub http_timeout_secs: u64,
    pub search_bin: String,
    pub search_limit: u32,
    pub search_min_likes: u64,
    pub search_window_hours: i64,
    pub search_timeout_secs: u64,
    pub inference_url: Option<String>,
    pub inference_api_key: Option<String>,
    pub inference_timeout_secs: u64,
    pub inference_max_chars: usize,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub harvest_cron: String,
}

impl AppConfig {
    /// Retry policy shared by the discovery, search and inference adapters.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_base_ms: self.retry_backoff_base_ms,
        }
    }

    /// The inference endpoint, which enrichment cannot run without.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `TICKERPULSE_INFERENCE_URL`
    /// is unset or blank.
    pub fn require_inference_url(&self) -> Result<&str, ConfigError> {
        self.inference_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("TICKERPULSE_INFERENCE_URL".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("storage_root", &self.storage_root)
            .field("source_bucket", &self.source_bucket)
            .field("dest_bucket", &self.dest_bucket)
            .field("accounts_key", &self.accounts_key)
            .field("discovery_url", &self.discovery_url)
            .field("discovery_user_agent", &self.discovery_user_agent)
            .field("discovery_limit", &self.discovery_limit)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("search_bin", &self.search_bin)
            .field("search_limit", &self.search_limit)
            .field("search_min_likes", &self.search_min_likes)
            .field("search_window_hours", &self.search_window_hours)
            .field("search_timeout_secs", &self.search_timeout_secs)
            .field("inference_url", &self.inference_url)
            .field(
                "inference_api_key",
                &self.inference_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("inference_timeout_secs", &self.inference_timeout_secs)
            .field("inference_max_chars", &self.inference_max_chars)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("harvest_cron", &self.harvest_cron)
            .finish()
    }
}
