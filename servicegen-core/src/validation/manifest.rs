//! Capability manifest model

use super::{Result, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The declarative source of truth for which resource bindings and
/// environment variables a service is supposed to have.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityManifest {
    #[serde(default)]
    pub d1: bool,
    #[serde(default)]
    pub kv: bool,
    #[serde(default)]
    pub r2: bool,
    /// Required environment variable names mapped to requirement markers
    /// (e.g. `"required"`).
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

impl CapabilityManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            ValidationError::ManifestRead { path: path.to_path_buf(), source }
        })?;
        serde_json::from_str(&text).map_err(|source| ValidationError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether `family` is declared, by manifest flag.
    pub fn declares(&self, family: super::ResourceFamily) -> bool {
        match family {
            super::ResourceFamily::D1 => self.d1,
            super::ResourceFamily::Kv => self.kv,
            super::ResourceFamily::R2 => self.r2,
        }
    }
}
