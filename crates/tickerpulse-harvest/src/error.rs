use thiserror::Error;
use tickerpulse_core::Retriable;
use tickerpulse_storage::StorageError;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}

impl Retriable for DiscoveryError {
    fn is_retriable(&self) -> bool {
        match self {
            DiscoveryError::Http(e) => e.is_timeout() || e.is_connect(),
            DiscoveryError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no usable accounts in the search account pool")]
    NoAccounts,

    #[error("failed to spawn search command `{bin}`: {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("search timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("search command exited with status {status:?}: {stderr}")]
    NonZeroExit { status: Option<i32>, stderr: String },

    #[error("search output could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("all {attempts} accounts failed; last error: {last}")]
    AllAccountsFailed { attempts: usize, last: String },
}

impl Retriable for SearchError {
    fn is_retriable(&self) -> bool {
        matches!(
            self,
            SearchError::Timeout { .. } | SearchError::AllAccountsFailed { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("ticker discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("search failed: {0}")]
    Search(#[from] SearchError),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("account pool not found at {bucket}/{key}")]
    AccountsNotFound { bucket: String, key: String },
}
