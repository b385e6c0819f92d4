//! Domain configuration generator

use super::{Category, Generator, GeneratorTools, Result};
use crate::context::GenerationContext;
use crate::templates::{builtin, RenderMode};
use std::path::PathBuf;

/// Emits `src/config/domains.js` with the per-environment endpoints the
/// worker routes against.
#[derive(Debug, Default)]
pub struct DomainConfigGenerator;

impl DomainConfigGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for DomainConfigGenerator {
    fn name(&self) -> &str {
        "domain-config"
    }

    fn category(&self) -> Category {
        Category::EnvironmentConfig
    }

    fn generate(
        &self,
        context: &GenerationContext,
        tools: &mut GeneratorTools,
    ) -> Result<Vec<PathBuf>> {
        let template = tools.engine.load_template(builtin::DOMAINS_CONFIG)?;
        let text = tools.engine.render(&template, &context.vars(), RenderMode::Strict)?;
        let receipt = tools.writer.write_file("src/config/domains.js", &text)?;
        Ok(vec![receipt.path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{FileWriter, WriterOptions};
    use crate::templates::TemplateEngine;
    use tempfile::TempDir;

    #[test]
    fn test_domains_file_carries_environment_urls() {
        let temp_dir = TempDir::new().unwrap();
        let json = serde_json::json!({
            "coreInputs": { "serviceName": "demo", "domainName": "demo.dev" },
            "servicePath": temp_dir.path()
        })
        .to_string();
        let context = GenerationContext::from_json(&json, None).unwrap();
        let mut tools = GeneratorTools::new(
            TemplateEngine::embedded(),
            FileWriter::with_options(temp_dir.path(), WriterOptions::default()),
        );

        let files = DomainConfigGenerator::new().generate(&context, &mut tools).unwrap();
        let text = std::fs::read_to_string(&files[0]).unwrap();
        assert!(text.contains("https://demo.dev"));
        assert!(text.contains("https://staging.demo.dev"));
        assert!(text.contains("http://localhost:8787"));
    }
}
