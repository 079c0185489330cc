//! Shared types for the tickerpulse harvest and enrichment stages.
//!
//! Holds the [`Post`] record the harvester writes, the partition naming
//! scheme that ties both stages together, environment-driven
//! configuration, and the bounded retry helper used by every network adapter.

pub mod app_config;
pub mod config;
pub mod keys;
pub mod post;
pub mod retry;

pub use app_config::AppConfig;
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use keys::{KeyRejection, PartitionKey};
pub use post::{Post, Ticker};
pub use retry::{retry_with_backoff, Retriable, RetryPolicy};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
