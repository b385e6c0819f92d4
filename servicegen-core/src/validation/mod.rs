//! Configuration consistency validation
//!
//! After generation (and after any recovery that touched the deployment
//! descriptor), the validator re-reads the capability manifest and the
//! descriptor and flags mismatches between what the service declares and
//! what its deployment configuration actually binds.

pub mod consistency;
pub mod manifest;

pub use consistency::{ConsistencyValidator, FixReport, ValidationReport};
pub use manifest::CapabilityManifest;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("failed to read manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read descriptor {path}: {source}")]
    DescriptorRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse descriptor {path}: {source}")]
    DescriptorParse {
        path: PathBuf,
        #[source]
        source: crate::descriptor::DescriptorError,
    },

    #[error("auto-fix failed: {0}")]
    FixFailed(String),
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Issue severity. Only `Error` flips overall validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// The kind of mismatch an issue describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Manifest declares a capability the descriptor does not bind.
    CapabilityMissing,
    /// Descriptor binds a resource the manifest does not declare.
    OrphanBinding,
    /// Manifest-required environment variable absent from the descriptor.
    MissingEnv,
}

/// A resource family that can be bound in the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFamily {
    D1,
    Kv,
    R2,
}

impl ResourceFamily {
    pub const ALL: [ResourceFamily; 3] =
        [ResourceFamily::D1, ResourceFamily::Kv, ResourceFamily::R2];
}

impl fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceFamily::D1 => f.write_str("d1"),
            ResourceFamily::Kv => f.write_str("kv"),
            ResourceFamily::R2 => f.write_str("r2"),
        }
    }
}

/// One finding from a validation pass. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

impl ValidationIssue {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
