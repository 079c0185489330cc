use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::AppConfig;
use crate::ConfigError;

const DEFAULT_DISCOVERY_URL: &str =
    "https://www.finder.com/ca/stock-trading/top-trending-stocks-on-twitter";

const DEFAULT_DISCOVERY_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };
    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let log_level = or_default("TICKERPULSE_LOG_LEVEL", "info");
    let storage_root = PathBuf::from(or_default("TICKERPULSE_STORAGE_ROOT", "./data"));
    let source_bucket = or_default("TICKERPULSE_SOURCE_BUCKET", "tickerpulse-raw");
    let dest_bucket = or_default("TICKERPULSE_DEST_BUCKET", "tickerpulse-enriched");
    let accounts_key = or_default("TICKERPULSE_ACCOUNTS_KEY", "config/accounts.json");

    let discovery_url = or_default("TICKERPULSE_DISCOVERY_URL", DEFAULT_DISCOVERY_URL);
    let discovery_user_agent = or_default(
        "TICKERPULSE_DISCOVERY_USER_AGENT",
        DEFAULT_DISCOVERY_USER_AGENT,
    );
    let discovery_limit = parse_var(&lookup, "TICKERPULSE_DISCOVERY_LIMIT", "30")?;
    let http_timeout_secs = parse_var(&lookup, "TICKERPULSE_HTTP_TIMEOUT_SECS", "30")?;

    let search_bin = or_default("TICKERPULSE_SEARCH_BIN", "bird");
    let search_limit = parse_var(&lookup, "TICKERPULSE_SEARCH_LIMIT", "125")?;
    let search_min_likes = parse_var(&lookup, "TICKERPULSE_SEARCH_MIN_LIKES", "5")?;
    let search_window_hours = parse_var(&lookup, "TICKERPULSE_SEARCH_WINDOW_HOURS", "24")?;
    let search_timeout_secs = parse_var(&lookup, "TICKERPULSE_SEARCH_TIMEOUT_SECS", "120")?;

    let inference_url = optional("TICKERPULSE_INFERENCE_URL");
    let inference_api_key = optional("TICKERPULSE_INFERENCE_API_KEY");
    let inference_timeout_secs = parse_var(&lookup, "TICKERPULSE_INFERENCE_TIMEOUT_SECS", "30")?;
    let inference_max_chars = parse_var(&lookup, "TICKERPULSE_INFERENCE_MAX_CHARS", "1024")?;

    let max_retries = parse_var(&lookup, "TICKERPULSE_MAX_RETRIES", "0")?;
    let retry_backoff_base_ms = parse_var(&lookup, "TICKERPULSE_RETRY_BACKOFF_BASE_MS", "500")?;

    let harvest_cron = or_default("TICKERPULSE_HARVEST_CRON", "0 0 12 * * *");

    if search_window_hours <= 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "TICKERPULSE_SEARCH_WINDOW_HOURS".to_string(),
            reason: "must be a positive number of hours".to_string(),
        });
    }
    if inference_max_chars == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "TICKERPULSE_INFERENCE_MAX_CHARS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(AppConfig {
        log_level,
        storage_root,
        source_bucket,
        dest_bucket,
        accounts_key,
        discovery_url,
        discovery_user_agent,
        discovery_limit,
        http_timeout_secs,
        search_bin,
        search_limit,
        search_min_likes,
        search_window_hours,
        search_timeout_secs,
        inference_url,
        inference_api_key,
        inference_timeout_secs,
        inference_max_chars,
        max_retries,
        retry_backoff_base_ms,
        harvest_cron,
    })
}

fn parse_var<F, T>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn build_app_config_uses_defaults_when_env_is_empty() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.storage_root, PathBuf::from("./data"));
        assert_eq!(cfg.source_bucket, "tickerpulse-raw");
        assert_eq!(cfg.dest_bucket, "tickerpulse-enriched");
        assert_eq!(cfg.accounts_key, "config/accounts.json");
        assert_eq!(cfg.discovery_url, DEFAULT_DISCOVERY_URL);
        assert_eq!(cfg.discovery_limit, 30);
        assert_eq!(cfg.search_bin, "bird");
        assert_eq!(cfg.search_limit, 125);
        assert_eq!(cfg.search_min_likes, 5);
        assert_eq!(cfg.search_window_hours, 24);
        assert!(cfg.inference_url.is_none());
        assert_eq!(cfg.inference_max_chars, 1024);
        assert_eq!(cfg.max_retries, 0);
        assert_eq!(cfg.retry_backoff_base_ms, 500);
        assert_eq!(cfg.harvest_cron, "0 0 12 * * *");
    }

    #[test]
    fn build_app_config_reads_overrides() {
        let mut map = HashMap::new();
        map.insert("TICKERPULSE_SOURCE_BUCKET", "raw");
        map.insert("TICKERPULSE_SEARCH_MIN_LIKES", "50");
        map.insert("TICKERPULSE_INFERENCE_URL", "http://localhost:8080/invocations");
        map.insert("TICKERPULSE_MAX_RETRIES", "2");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.source_bucket, "raw");
        assert_eq!(cfg.search_min_likes, 50);
        assert_eq!(
            cfg.inference_url.as_deref(),
            Some("http://localhost:8080/invocations")
        );
        assert_eq!(cfg.retry_policy().max_retries, 2);
    }

    #[test]
    fn build_app_config_treats_blank_inference_url_as_absent() {
        let mut map = HashMap::new();
        map.insert("TICKERPULSE_INFERENCE_URL", "   ");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.inference_url.is_none());
    }

    #[test]
    fn require_inference_url_reports_missing_variable() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(
            matches!(cfg.require_inference_url(), Err(ConfigError::MissingEnvVar(ref var)) if var == "TICKERPULSE_INFERENCE_URL")
        );

        let mut map = HashMap::new();
        map.insert("TICKERPULSE_INFERENCE_URL", "http://localhost:8080");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.require_inference_url().unwrap(), "http://localhost:8080");
    }

    #[test]
    fn build_app_config_rejects_unparsable_number() {
        let mut map = HashMap::new();
        map.insert("TICKERPULSE_SEARCH_LIMIT", "lots");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TICKERPULSE_SEARCH_LIMIT"),
            "expected InvalidEnvVar(TICKERPULSE_SEARCH_LIMIT), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_rejects_non_positive_window() {
        let mut map = HashMap::new();
        map.insert("TICKERPULSE_SEARCH_WINDOW_HOURS", "0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TICKERPULSE_SEARCH_WINDOW_HOURS"),
            "expected InvalidEnvVar(TICKERPULSE_SEARCH_WINDOW_HOURS), got: {result:?}"
        );
    }

    #[test]
    fn debug_output_redacts_inference_api_key() {
        let mut map = HashMap::new();
        map.insert("TICKERPULSE_INFERENCE_API_KEY", "super-secret");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[redacted]"));
    }
}
