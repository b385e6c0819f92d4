//! Typed deployment descriptor (`wrangler.toml`)
//!
//! The descriptor is the late-bound contract between a service and its
//! platform resources. Parsing and serialization go through the real
//! TOML parser behind the narrow [`DescriptorParser`] trait, so the
//! validator and the generators share one model and the parser can be
//! substituted in tests without touching shared state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to parse descriptor: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize descriptor: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, DescriptorError>;

/// A database binding block (`[[d1_databases]]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct D1Database {
    pub binding: String,
    pub database_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,
}

/// A key-value namespace binding block (`[[kv_namespaces]]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvNamespace {
    pub binding: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// An object-storage binding block (`[[r2_buckets]]`). The bucket name
/// is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct R2Bucket {
    pub binding: String,
    pub bucket_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSection {
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSection {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadSection>,
}

/// Static-site serving section, present only for static-site services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSection {
    pub bucket: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

/// The whole deployment descriptor. Scalar fields precede the table
/// sections so TOML serialization stays well-formed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployDescriptor {
    pub name: String,
    pub main: String,
    pub compatibility_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<SiteSection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub d1_databases: Vec<D1Database>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kv_namespaces: Vec<KvNamespace>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub r2_buckets: Vec<R2Bucket>,
}

/// Narrow parsing strategy seam. The default implementation delegates to
/// the TOML parser; tests can inject any other behavior at construction
/// time.
pub trait DescriptorParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<DeployDescriptor>;
    fn serialize(&self, descriptor: &DeployDescriptor) -> Result<String>;
}

/// Default strategy backed by the `toml` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlDescriptorParser;

impl DescriptorParser for TomlDescriptorParser {
    fn parse(&self, text: &str) -> Result<DeployDescriptor> {
        Ok(toml::from_str(text)?)
    }

    fn serialize(&self, descriptor: &DeployDescriptor) -> Result<String> {
        Ok(toml::to_string(descriptor)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DeployDescriptor {
        DeployDescriptor {
            name: "demo".to_string(),
            main: "src/worker/index.js".to_string(),
            compatibility_date: "2024-11-01".to_string(),
            account_id: Some("acct".to_string()),
            vars: BTreeMap::from([("ENVIRONMENT".to_string(), "staging".to_string())]),
            build: Some(BuildSection {
                command: "npm run build".to_string(),
                upload: Some(UploadSection { format: "modules".to_string() }),
            }),
            site: None,
            d1_databases: vec![D1Database {
                binding: "DB".to_string(),
                database_name: "demo-db".to_string(),
                database_id: None,
            }],
            kv_namespaces: Vec::new(),
            r2_buckets: Vec::new(),
        }
    }

    #[test]
    fn test_round_trip_through_toml() {
        let parser = TomlDescriptorParser;
        let text = parser.serialize(&sample()).unwrap();
        let parsed = parser.parse(&text).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let parser = TomlDescriptorParser;
        let text = parser.serialize(&sample()).unwrap();
        assert!(text.contains("[[d1_databases]]"));
        assert!(!text.contains("kv_namespaces"));
        assert!(!text.contains("r2_buckets"));
        assert!(!text.contains("[site]"));
    }

    #[test]
    fn test_parse_tolerates_missing_optional_sections() {
        let parser = TomlDescriptorParser;
        let parsed = parser
            .parse("name = \"demo\"\nmain = \"src/index.js\"\ncompatibility_date = \"2024-11-01\"\n")
            .unwrap();
        assert!(parsed.d1_databases.is_empty());
        assert!(parsed.vars.is_empty());
        assert!(parsed.build.is_none());
    }
}
