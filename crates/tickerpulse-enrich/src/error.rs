use thiserror::Error;
use tickerpulse_core::Retriable;
use tickerpulse_storage::StorageError;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("source object {bucket}/{key} not found")]
    SourceNotFound { bucket: String, key: String },

    #[error("source object {bucket}/{key} was already removed by another invocation")]
    SourceAlreadyRemoved { bucket: String, key: String },

    #[error("source object {bucket}/{key} changed during enrichment; left in place")]
    SourceChanged { bucket: String, key: String },
}

impl Retriable for EnrichError {
    fn is_retriable(&self) -> bool {
        match self {
            EnrichError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            EnrichError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
