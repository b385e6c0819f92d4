//! Package manifest (`package.json`) generator

use super::{Category, Generator, GeneratorTools, Result};
use crate::context::{GenerationContext, ServiceType};
use serde_json::{json, Map, Value};
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct PackageManifestGenerator;

impl PackageManifestGenerator {
    pub fn new() -> Self {
        Self
    }

    fn dependencies(service_type: ServiceType) -> Value {
        let mut deps = Map::new();
        match service_type {
            ServiceType::Api => {
                deps.insert("itty-router".to_string(), json!("^5.0.0"));
                deps.insert("zod".to_string(), json!("^3.23.0"));
            }
            ServiceType::StaticSite => {
                deps.insert("mime".to_string(), json!("^4.0.0"));
            }
            ServiceType::Generic | ServiceType::Scheduled => {}
        }
        Value::Object(deps)
    }

    fn scripts(service_type: ServiceType) -> Value {
        let mut scripts = Map::new();
        scripts.insert("dev".to_string(), json!("wrangler dev"));
        scripts.insert("deploy".to_string(), json!("wrangler deploy"));
        scripts.insert("test".to_string(), json!("vitest run"));
        scripts.insert("lint".to_string(), json!("eslint ."));
        if service_type == ServiceType::StaticSite {
            scripts.insert("build".to_string(), json!("vite build"));
        }
        Value::Object(scripts)
    }
}

impl Generator for PackageManifestGenerator {
    fn name(&self) -> &str {
        "package-manifest"
    }

    fn category(&self) -> Category {
        Category::CoreConfig
    }

    fn generate(
        &self,
        context: &GenerationContext,
        tools: &mut GeneratorTools,
    ) -> Result<Vec<PathBuf>> {
        let confirmed = &context.confirmed;
        let manifest = json!({
            "name": confirmed.package_name,
            "version": confirmed.version,
            "description": confirmed.description,
            "author": confirmed.author,
            "private": true,
            "type": "module",
            "keywords": confirmed.keywords,
            "repository": confirmed.git_repository_url,
            "scripts": Self::scripts(context.core.service_type),
            "dependencies": Self::dependencies(context.core.service_type),
            "devDependencies": {
                "eslint": "^9.0.0",
                "vitest": "^2.0.0",
                "wrangler": "^3.80.0"
            }
        });

        let text = serde_json::to_string_pretty(&manifest)? + "\n";
        let receipt = tools.writer.write_file("package.json", &text)?;
        Ok(vec![receipt.path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{FileWriter, WriterOptions};
    use crate::templates::TemplateEngine;
    use tempfile::TempDir;

    fn run(service_type: &str) -> (TempDir, Value) {
        let temp_dir = TempDir::new().unwrap();
        let json = serde_json::json!({
            "coreInputs": {
                "serviceName": "demo",
                "serviceType": service_type,
                "domainName": "demo.dev"
            },
            "servicePath": temp_dir.path()
        })
        .to_string();
        let context = GenerationContext::from_json(&json, None).unwrap();
        let mut tools = GeneratorTools::new(
            TemplateEngine::embedded(),
            FileWriter::with_options(temp_dir.path(), WriterOptions::default()),
        );

        let files = PackageManifestGenerator::new().generate(&context, &mut tools).unwrap();
        assert_eq!(files.len(), 1);
        let manifest: Value =
            serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
        (temp_dir, manifest)
    }

    #[test]
    fn test_api_service_gets_router_dependency() {
        let (_dir, manifest) = run("api");
        assert!(manifest["dependencies"]["itty-router"].is_string());
        assert_eq!(manifest["name"], "demo");
    }

    #[test]
    fn test_generic_service_has_no_runtime_dependencies() {
        let (_dir, manifest) = run("generic");
        assert_eq!(manifest["dependencies"], json!({}));
        assert!(manifest["devDependencies"]["wrangler"].is_string());
    }

    #[test]
    fn test_static_site_gets_build_script() {
        let (_dir, manifest) = run("static-site");
        assert_eq!(manifest["scripts"]["build"], "vite build");
    }
}
