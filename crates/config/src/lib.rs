// Configuration loading: job payloads and translation resources

pub mod error;
pub mod job;
pub mod resources;

pub use error::ConfigError;
pub use job::{JobParams, JobPayload};
pub use resources::{ResourceManager, ResourceOrigin, FALLBACK_LOCALE, LOCALES_DIR_ENV};
