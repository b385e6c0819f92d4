//! Generation context
//!
//! One immutable bundle of inputs drives a whole generation run. Callers
//! may supply either the nested shape (`{"coreInputs": …,
//! "confirmedValues": …}`) or a single flattened object; both normalize
//! to [`GenerationContext`] exactly once, at the registry boundary, and
//! nothing downstream ever branches on shape again.

use crate::templates::TemplateVars;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("invalid context: {0}")]
    Invalid(String),

    #[error("failed to parse context input: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ContextError>;

/// The kind of service being scaffolded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    #[default]
    Generic,
    Api,
    StaticSite,
    Scheduled,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceType::Generic => "generic",
            ServiceType::Api => "api",
            ServiceType::StaticSite => "static-site",
            ServiceType::Scheduled => "scheduled",
        };
        f.write_str(name)
    }
}

/// Deployment target environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        };
        f.write_str(name)
    }
}

/// User-supplied identifiers for the service and its target account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreInputs {
    pub service_name: String,
    #[serde(default)]
    pub service_type: ServiceType,
    pub domain_name: String,
    #[serde(default)]
    pub cloudflare_account_id: String,
    #[serde(default)]
    pub cloudflare_zone_id: String,
    #[serde(default)]
    pub environment: Environment,
}

/// Derived and confirmed display metadata, URLs, and feature flags.
/// Empty fields are filled from [`CoreInputs`] during normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedValues {
    #[serde(default)]
    pub package_name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub git_repository_url: String,
    #[serde(default)]
    pub worker_name: String,
    #[serde(default)]
    pub database_name: String,
    #[serde(default)]
    pub bucket_name: String,
    #[serde(default = "default_api_base_path")]
    pub api_base_path: String,
    #[serde(default = "default_health_check_path")]
    pub health_check_path: String,
    #[serde(default)]
    pub production_url: String,
    #[serde(default)]
    pub staging_url: String,
    #[serde(default)]
    pub development_url: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_api_base_path() -> String {
    "/api/v1".to_string()
}

fn default_health_check_path() -> String {
    "/health".to_string()
}

/// Static-site build settings override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    pub bucket: String,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self { bucket: "./public".to_string(), include: Vec::new(), exclude: Vec::new() }
    }
}

/// Raw context input: nested or flattened. Normalized once via
/// [`GenerationContext::from_input`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ContextInput {
    Nested {
        #[serde(rename = "coreInputs")]
        core_inputs: CoreInputs,
        #[serde(rename = "confirmedValues", default)]
        confirmed_values: ConfirmedValues,
        #[serde(rename = "servicePath", default)]
        service_path: Option<PathBuf>,
        #[serde(default)]
        site: Option<SiteSettings>,
        #[serde(rename = "middlewareStrategy", default)]
        middleware_strategy: Option<String>,
    },
    Flattened {
        #[serde(flatten)]
        core_inputs: CoreInputs,
        #[serde(flatten)]
        confirmed_values: ConfirmedValues,
        #[serde(rename = "servicePath", default)]
        service_path: Option<PathBuf>,
        #[serde(default)]
        site: Option<SiteSettings>,
        #[serde(rename = "middlewareStrategy", default)]
        middleware_strategy: Option<String>,
    },
}

/// Immutable-per-run bundle of everything generators consume.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationContext {
    pub core: CoreInputs,
    pub confirmed: ConfirmedValues,
    pub service_path: PathBuf,
    pub site: Option<SiteSettings>,
    pub middleware_strategy: Option<String>,
}

impl GenerationContext {
    /// Normalize a raw input (either shape) into the canonical context,
    /// filling derived defaults and validating the result.
    pub fn from_input(input: ContextInput, fallback_service_path: Option<PathBuf>) -> Result<Self> {
        let (core, confirmed, service_path, site, middleware_strategy) = match input {
            ContextInput::Nested {
                core_inputs,
                confirmed_values,
                service_path,
                site,
                middleware_strategy,
            }
            | ContextInput::Flattened {
                core_inputs,
                confirmed_values,
                service_path,
                site,
                middleware_strategy,
            } => (core_inputs, confirmed_values, service_path, site, middleware_strategy),
        };

        let service_path = service_path
            .or(fallback_service_path)
            .ok_or_else(|| ContextError::Invalid("servicePath is required".to_string()))?;

        let mut context = Self {
            confirmed: derive_confirmed(confirmed, &core),
            core,
            service_path,
            site,
            middleware_strategy,
        };
        if context.core.service_type == ServiceType::StaticSite && context.site.is_none() {
            context.site = Some(SiteSettings::default());
        }
        context.validate()?;
        Ok(context)
    }

    /// Parse a JSON document in either accepted shape.
    pub fn from_json(text: &str, fallback_service_path: Option<PathBuf>) -> Result<Self> {
        let input: ContextInput = serde_json::from_str(text)?;
        Self::from_input(input, fallback_service_path)
    }

    /// Check every invariant, aggregating all violations into one
    /// comma-joined message.
    pub fn validate(&self) -> Result<()> {
        let mut violations = Vec::new();

        if self.core.service_name.is_empty() {
            violations.push("serviceName must not be empty".to_string());
        } else if !self
            .core
            .service_name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            violations.push(format!(
                "serviceName '{}' may only contain lowercase letters, digits, and dashes",
                self.core.service_name
            ));
        }
        if self.core.domain_name.is_empty() {
            violations.push("domainName must not be empty".to_string());
        }
        if !self.service_path.is_absolute() {
            violations.push(format!(
                "servicePath '{}' must be absolute",
                self.service_path.display()
            ));
        }
        if self.has_feature("r2") && self.confirmed.bucket_name.is_empty() {
            violations.push("bucketName is required when the r2 feature is set".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ContextError::Invalid(violations.join(", ")))
        }
    }

    /// Whether a feature flag (e.g. `d1`, `kv`, `r2`) is set.
    pub fn has_feature(&self, name: &str) -> bool {
        self.confirmed.features.iter().any(|f| f == name)
    }

    /// The variable tree templates render against.
    pub fn vars(&self) -> TemplateVars {
        TemplateVars::from_value(json!({
            "service": {
                "name": self.core.service_name,
                "type": self.core.service_type.to_string(),
                "display_name": self.confirmed.display_name,
                "description": self.confirmed.description,
                "package_name": self.confirmed.package_name,
                "worker_name": self.confirmed.worker_name,
                "version": self.confirmed.version,
                "author": self.confirmed.author,
            },
            "domain": { "name": self.core.domain_name },
            "cloudflare": {
                "account_id": self.core.cloudflare_account_id,
                "zone_id": self.core.cloudflare_zone_id,
            },
            "environment": self.core.environment.to_string(),
            "urls": {
                "production": self.confirmed.production_url,
                "staging": self.confirmed.staging_url,
                "development": self.confirmed.development_url,
            },
            "api": {
                "base_path": self.confirmed.api_base_path,
                "health_path": self.confirmed.health_check_path,
            },
            "database": { "name": self.confirmed.database_name },
            "git": { "repository_url": self.confirmed.git_repository_url },
        }))
    }
}

/// Fill empty confirmed fields from core inputs.
fn derive_confirmed(mut confirmed: ConfirmedValues, core: &CoreInputs) -> ConfirmedValues {
    let name = &core.service_name;

    if confirmed.package_name.is_empty() {
        confirmed.package_name = name.clone();
    }
    if confirmed.worker_name.is_empty() {
        confirmed.worker_name = name.clone();
    }
    if confirmed.display_name.is_empty() {
        confirmed.display_name = title_case(name);
    }
    if confirmed.database_name.is_empty() {
        confirmed.database_name = format!("{name}-db");
    }
    if confirmed.bucket_name.is_empty() {
        confirmed.bucket_name = format!("{name}-assets");
    }
    if confirmed.version.is_empty() {
        confirmed.version = default_version();
    }
    if confirmed.api_base_path.is_empty() {
        confirmed.api_base_path = default_api_base_path();
    }
    if confirmed.health_check_path.is_empty() {
        confirmed.health_check_path = default_health_check_path();
    }
    if confirmed.production_url.is_empty() {
        confirmed.production_url = format!("https://{}", core.domain_name);
    }
    if confirmed.staging_url.is_empty() {
        confirmed.staging_url = format!("https://staging.{}", core.domain_name);
    }
    if confirmed.development_url.is_empty() {
        confirmed.development_url = "http://localhost:8787".to_string();
    }

    confirmed
}

fn title_case(name: &str) -> String {
    name.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
