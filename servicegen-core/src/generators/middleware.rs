//! Routing and error-handling middleware generator

use super::{Category, Generator, GeneratorTools, Result};
use crate::context::GenerationContext;
use crate::templates::{builtin, RenderMode};
use std::path::PathBuf;
use tracing::debug;

/// Emits the router and error-handler middleware. The context's
/// `middlewareStrategy` override can disable it with `"none"`.
#[derive(Debug, Default)]
pub struct MiddlewareGenerator;

impl MiddlewareGenerator {
    pub fn new() -> Self {
        Self
    }

    fn applies(context: &GenerationContext) -> bool {
        context.middleware_strategy.as_deref() != Some("none")
    }
}

impl Generator for MiddlewareGenerator {
    fn name(&self) -> &str {
        "middleware"
    }

    fn category(&self) -> Category {
        Category::SourceCode
    }

    fn should_generate(&self, context: &GenerationContext) -> bool {
        Self::applies(context)
    }

    fn generate(
        &self,
        context: &GenerationContext,
        tools: &mut GeneratorTools,
    ) -> Result<Vec<PathBuf>> {
        if !Self::applies(context) {
            debug!("middleware generation disabled for '{}'", context.core.service_name);
            return Ok(Vec::new());
        }

        let vars = context.vars();
        let mut files = Vec::new();

        for (key, target) in [
            (builtin::ROUTER_MIDDLEWARE, "src/middleware/router.js"),
            (builtin::ERROR_MIDDLEWARE, "src/middleware/errorHandler.js"),
        ] {
            let template = tools.engine.load_template(key)?;
            let text = tools.engine.render(&template, &vars, RenderMode::Lenient)?;
            let receipt = tools.writer.write_file(target, &text)?;
            files.push(receipt.path);
        }
        Ok(files)
    }
}
