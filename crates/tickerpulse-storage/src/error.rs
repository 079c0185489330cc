use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {bucket}/{key}: {source}")]
    Io {
        bucket: String,
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid object key \"{key}\": {reason}")]
    InvalidKey { key: String, reason: String },
}
