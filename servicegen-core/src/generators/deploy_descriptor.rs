//! Deployment descriptor (`wrangler.toml`) generator

use super::{Category, Generator, GeneratorError, GeneratorTools, Result};
use crate::context::{GenerationContext, ServiceType};
use crate::descriptor::{
    BuildSection, D1Database, DeployDescriptor, DescriptorParser, KvNamespace, R2Bucket,
    SiteSection, TomlDescriptorParser, UploadSection,
};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Compatibility date pinned at generation time; bump deliberately.
const COMPATIBILITY_DATE: &str = "2024-11-01";

pub const DESCRIPTOR_FILE: &str = "wrangler.toml";

#[derive(Debug, Default)]
pub struct DeployDescriptorGenerator;

impl DeployDescriptorGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Build the typed descriptor for a context. Resource blocks appear
    /// only when the corresponding feature flag is set.
    pub fn build_descriptor(context: &GenerationContext) -> DeployDescriptor {
        let confirmed = &context.confirmed;
        let core = &context.core;

        let mut vars = BTreeMap::new();
        vars.insert("ENVIRONMENT".to_string(), core.environment.to_string());
        vars.insert("DOMAIN".to_string(), core.domain_name.clone());

        DeployDescriptor {
            name: confirmed.worker_name.clone(),
            main: "src/worker/index.js".to_string(),
            compatibility_date: COMPATIBILITY_DATE.to_string(),
            account_id: (!core.cloudflare_account_id.is_empty())
                .then(|| core.cloudflare_account_id.clone()),
            vars,
            build: Some(BuildSection {
                command: match core.service_type {
                    ServiceType::StaticSite => "npm run build".to_string(),
                    _ => "npm run lint".to_string(),
                },
                upload: Some(UploadSection { format: "modules".to_string() }),
            }),
            site: (core.service_type == ServiceType::StaticSite).then(|| {
                let settings = context.site.clone().unwrap_or_default();
                SiteSection {
                    bucket: settings.bucket,
                    include: settings.include,
                    exclude: settings.exclude,
                }
            }),
            d1_databases: context
                .has_feature("d1")
                .then(|| {
                    vec![D1Database {
                        binding: "DB".to_string(),
                        database_name: confirmed.database_name.clone(),
                        database_id: None,
                    }]
                })
                .unwrap_or_default(),
            kv_namespaces: context
                .has_feature("kv")
                .then(|| vec![KvNamespace { binding: "CACHE".to_string(), id: None }])
                .unwrap_or_default(),
            r2_buckets: context
                .has_feature("r2")
                .then(|| {
                    vec![R2Bucket {
                        binding: "ASSETS".to_string(),
                        bucket_name: confirmed.bucket_name.clone(),
                    }]
                })
                .unwrap_or_default(),
        }
    }

    /// Check every descriptor invariant, aggregating all violations into
    /// one comma-joined message.
    pub fn validate_config(descriptor: &DeployDescriptor) -> Result<()> {
        let mut violations = Vec::new();

        if descriptor.name.is_empty() {
            violations.push("name must not be empty".to_string());
        }
        if descriptor.main.is_empty() {
            violations.push("main entry point must not be empty".to_string());
        }
        let date_ok = descriptor.compatibility_date.len() == 10
            && descriptor
                .compatibility_date
                .chars()
                .enumerate()
                .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
        if !date_ok {
            violations.push(format!(
                "compatibility_date '{}' must be YYYY-MM-DD",
                descriptor.compatibility_date
            ));
        }
        for bucket in &descriptor.r2_buckets {
            if bucket.bucket_name.is_empty() {
                violations.push(format!("r2 binding '{}' requires a bucket name", bucket.binding));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(GeneratorError::InvalidConfig(violations.join(", ")))
        }
    }
}

impl Generator for DeployDescriptorGenerator {
    fn name(&self) -> &str {
        "deploy-descriptor"
    }

    fn category(&self) -> Category {
        Category::CoreConfig
    }

    fn generate(
        &self,
        context: &GenerationContext,
        tools: &mut GeneratorTools,
    ) -> Result<Vec<PathBuf>> {
        let descriptor = Self::build_descriptor(context);
        Self::validate_config(&descriptor)?;

        let text = TomlDescriptorParser.serialize(&descriptor)?;
        let receipt = tools.writer.write_file(DESCRIPTOR_FILE, &text)?;
        Ok(vec![receipt.path])
    }
}
