use thiserror::Error;

/// Failure reported by a data source.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Query or connection failure inside the backend.
    #[error("query failed: {0}")]
    Query(String),
    /// Stored data could not be mapped onto the model.
    #[error("invalid data in {table}: {message}")]
    InvalidData { table: String, message: String },
    /// Fixture parse error.
    #[error("fixture parse error: {0}")]
    Fixture(#[from] serde_json::Error),
}

/// Fatal statement build error. Anything recoverable is a diagnostic instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("data source error: {0}")]
    Repository(#[from] RepositoryError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
