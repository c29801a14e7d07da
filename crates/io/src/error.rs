use thiserror::Error;

use cashflow_engine::{EngineError, RepositoryError};

/// Malformed or unwritable XML part.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML parse error at byte {position}: {message}")]
    Parse { position: u64, message: String },
    #[error("XML write error: {0}")]
    Write(String),
    #[error("document has no root element")]
    NoRoot,
    #[error("unexpected root element '{found}', expected '{expected}'")]
    UnexpectedRoot { expected: &'static str, found: String },
}

/// Anything that aborts an export. No artifact is produced.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("unsupported data source: {0}")]
    UnsupportedDataSource(String),
    #[error("data source configuration: {0}")]
    DataSource(String),
    #[error("container error: {0}")]
    Container(#[from] zip::result::ZipError),
    #[error("container is missing '{0}'")]
    MissingPart(String),
    #[error("{part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: XmlError,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub(crate) fn xml(part: &str, source: XmlError) -> Self {
        ExportError::Xml { part: part.to_string(), source }
    }
}

impl From<rusqlite::Error> for ExportError {
    fn from(err: rusqlite::Error) -> Self {
        ExportError::Repository(RepositoryError::Query(err.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
