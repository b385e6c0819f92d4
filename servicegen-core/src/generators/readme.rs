//! README generator

use super::{Category, Generator, GeneratorTools, Result};
use crate::context::GenerationContext;
use crate::templates::builtin;
use std::path::PathBuf;

/// Emits `README.md`, composed from the readme template and its usage
/// and deployment partials.
#[derive(Debug, Default)]
pub struct ReadmeGenerator;

impl ReadmeGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for ReadmeGenerator {
    fn name(&self) -> &str {
        "readme"
    }

    fn category(&self) -> Category {
        Category::Documentation
    }

    fn generate(
        &self,
        context: &GenerationContext,
        tools: &mut GeneratorTools,
    ) -> Result<Vec<PathBuf>> {
        let template = tools.engine.load_template(builtin::README)?;
        let text = tools.engine.render_with_partials(&template, &context.vars())?;
        let receipt = tools.writer.write_file("README.md", &text)?;
        Ok(vec![receipt.path])
    }
}
