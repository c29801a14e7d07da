//! Data source selection from a job's `dbKind` and connection string.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use cashflow_engine::{FixtureRepository, Repository};

use crate::error::{ExportError, Result};
use crate::sqlite::SqliteRepository;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataSourceKind {
    Sqlite,
    /// JSON data set, mainly for tests and demos
    Fixture,
    SqlServer,
    Postgres,
}

impl DataSourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DataSourceKind::Sqlite => "sqlite",
            DataSourceKind::Fixture => "fixture",
            DataSourceKind::SqlServer => "sqlserver",
            DataSourceKind::Postgres => "postgres",
        }
    }

    /// Guess the kind from a connection string.
    pub fn sniff(connection: &str) -> Self {
        let lower = connection.trim().to_ascii_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") || lower.contains("host=") {
            DataSourceKind::Postgres
        } else if lower.contains("server=") || lower.contains("driver=") || lower.contains("initial catalog=") {
            DataSourceKind::SqlServer
        } else if lower.ends_with(".json") {
            DataSourceKind::Fixture
        } else {
            DataSourceKind::Sqlite
        }
    }
}

impl FromStr for DataSourceKind {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(DataSourceKind::Sqlite),
            "fixture" | "json" => Ok(DataSourceKind::Fixture),
            "sqlserver" | "mssql" => Ok(DataSourceKind::SqlServer),
            "postgres" | "postgresql" => Ok(DataSourceKind::Postgres),
            other => Err(ExportError::DataSource(format!(
                "unknown dbKind '{other}'; use sqlite, fixture, sqlserver or postgres"
            ))),
        }
    }
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved data source: what to open and how.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataSource {
    pub kind: DataSourceKind,
    pub connection: String,
}

impl DataSource {
    /// An explicit `db_kind` wins over sniffing. An empty connection is an error.
    pub fn resolve(db_kind: Option<&str>, connection: &str) -> Result<Self> {
        let connection = connection.trim();
        if connection.is_empty() {
            return Err(ExportError::DataSource("no connection string given".into()));
        }
        let kind = match db_kind.map(str::trim).filter(|k| !k.is_empty()) {
            Some(kind) => kind.parse()?,
            None => DataSourceKind::sniff(connection),
        };
        Ok(Self { kind, connection: connection.to_string() })
    }

    /// File path named by a sqlite or fixture connection string.
    pub fn path(&self) -> PathBuf {
        let mut conn = self.connection.as_str();
        for prefix in ["sqlite://", "sqlite:", "file:"] {
            if let Some(rest) = conn.strip_prefix(prefix) {
                conn = rest;
                break;
            }
        }
        let path = conn
            .split(';')
            .filter_map(|part| part.split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("data source"))
            .map(|(_, value)| value.trim())
            .unwrap_or(conn);
        PathBuf::from(path)
    }

    /// Open the repository. Server kinds fail here, before any rendering.
    pub fn open(&self) -> Result<Box<dyn Repository>> {
        log::info!("opening {} data source", self.kind);
        match self.kind {
            DataSourceKind::Sqlite => Ok(Box::new(SqliteRepository::open(&self.path())?)),
            DataSourceKind::Fixture => {
                let json = std::fs::read_to_string(self.path())?;
                Ok(Box::new(FixtureRepository::from_json(&json)?))
            }
            DataSourceKind::SqlServer | DataSourceKind::Postgres => Err(ExportError::UnsupportedDataSource(format!(
                "{} is not supported; use a sqlite database or a JSON fixture",
                self.kind
            ))),
        }
    }
}
