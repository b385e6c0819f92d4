//! Static-site specialization bundle

use super::{Category, Generator, GeneratorTools, Result};
use crate::context::{GenerationContext, ServiceType};
use crate::templates::{builtin, RenderMode};
use std::path::PathBuf;
use tracing::debug;

/// Emits the static-site-only artifacts: the settings schema and the
/// serving middleware. Other service types skip this bundle entirely.
#[derive(Debug, Default)]
pub struct StaticSiteBundleGenerator;

impl StaticSiteBundleGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for StaticSiteBundleGenerator {
    fn name(&self) -> &str {
        "static-site-bundle"
    }

    fn category(&self) -> Category {
        Category::ServiceSpecialization
    }

    fn should_generate(&self, context: &GenerationContext) -> bool {
        context.core.service_type == ServiceType::StaticSite
    }

    fn generate(
        &self,
        context: &GenerationContext,
        tools: &mut GeneratorTools,
    ) -> Result<Vec<PathBuf>> {
        if context.core.service_type != ServiceType::StaticSite {
            debug!(
                "'{}' is not a static site, skipping specialization bundle",
                context.core.service_name
            );
            return Ok(Vec::new());
        }

        let vars = context.vars();
        let mut files = Vec::new();

        for (key, target) in [
            (builtin::STATIC_SITE_SCHEMA, "static-site-schema.json"),
            (builtin::STATIC_SITE_MIDDLEWARE, "src/middleware/StaticSiteMiddleware.js"),
        ] {
            let template = tools.engine.load_template(key)?;
            let text = tools.engine.render(&template, &vars, RenderMode::Lenient)?;
            let receipt = tools.writer.write_file(target, &text)?;
            files.push(receipt.path);
        }
        Ok(files)
    }
}
