//! Template loading, caching, and rendering
//!
//! Templates use `{{ identifier.path }}` placeholders and `{{> path }}`
//! partial markers. Rendering resolves dot-notation against a JSON
//! variable object; in non-strict mode an unresolved placeholder is left
//! verbatim so downstream tooling can spot it.

pub mod builtin;
pub mod engine;

pub use engine::{CacheStats, RenderMode, TemplateConfig, TemplateEngine, TemplateVars};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("partial not found: {0}")]
    PartialNotFound(String),

    #[error("missing variable in strict render: {0}")]
    MissingVariable(String),

    #[error("partial nesting exceeds depth {0}")]
    PartialDepthExceeded(usize),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TemplateError>;
