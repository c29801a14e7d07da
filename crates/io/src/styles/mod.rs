//! Semantic style registry and materialization.

pub mod materialize;
pub mod registry;

pub use materialize::{apply_default_language, ensure_paragraphs, materialize_styles, MaterializeSummary};
pub use registry::StyleRegistry;
