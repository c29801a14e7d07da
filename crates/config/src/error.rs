use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid job payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("job payload has no SqlConnection or connectionString")]
    MissingConnection,
    #[error("invalid translation resource {name}: {message}")]
    Resource { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
