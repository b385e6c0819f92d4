//! Safe file materialization
//!
//! Everything a generator writes to disk goes through this module: the
//! `PathResolver` keeps writes inside the service directory, and the
//! `FileWriter` applies the overwrite/dry-run policy while tracking every
//! write it performs.

pub mod resolver;
pub mod writer;

pub use resolver::PathResolver;
pub use writer::{FileWriter, WriteOutcome, WriteReceipt, WriterOptions, WriterStats, WrittenFileRecord};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("path traversal blocked: '{attempted}' escapes base directory '{base}'")]
    PathTraversal { attempted: PathBuf, base: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, OutputError>;
