//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; job runners rely on them.
//!
//! | Code | Description                                          |
//! |------|------------------------------------------------------|
//! | 0    | Success (diagnostics may still have been printed)    |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad args, unreadable payload file)      |
//! | 3    | Job or data source configuration error               |
//! | 4    | Document container or XML error                      |
//! | 5    | Data source query failed                             |

use cashflow_config::ConfigError;
use cashflow_engine::EngineError;
use cashflow_io::ExportError;

/// Success - statement written.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing payload file.
pub const EXIT_USAGE: u8 = 2;

/// Payload, translation resource or data-source selection is invalid,
/// including data sources that are recognized but not supported.
pub const EXIT_CONFIG: u8 = 3;

/// The document package could not be written or re-read.
pub const EXIT_CONTAINER: u8 = 4;

/// The data source failed while the statement was being built.
pub const EXIT_REPOSITORY: u8 = 5;

pub fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::Io { .. } => EXIT_USAGE,
        ConfigError::Payload(_) | ConfigError::MissingConnection | ConfigError::Resource { .. } => EXIT_CONFIG,
    }
}

pub fn export_exit_code(err: &ExportError) -> u8 {
    match err {
        ExportError::UnsupportedDataSource(_) | ExportError::DataSource(_) => EXIT_CONFIG,
        ExportError::Engine(EngineError::Repository(_)) | ExportError::Repository(_) => EXIT_REPOSITORY,
        ExportError::Container(_) | ExportError::MissingPart(_) | ExportError::Xml { .. } => EXIT_CONTAINER,
        ExportError::Io(_) => EXIT_ERROR,
    }
}
