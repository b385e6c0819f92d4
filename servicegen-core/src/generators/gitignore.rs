//! Ignore-file generator

use super::{Category, Generator, GeneratorTools, Result};
use crate::context::GenerationContext;
use crate::templates::{builtin, RenderMode};
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct GitignoreGenerator;

impl GitignoreGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for GitignoreGenerator {
    fn name(&self) -> &str {
        "gitignore"
    }

    fn category(&self) -> Category {
        Category::CoreConfig
    }

    fn generate(
        &self,
        context: &GenerationContext,
        tools: &mut GeneratorTools,
    ) -> Result<Vec<PathBuf>> {
        let template = tools.engine.load_template(builtin::GITIGNORE)?;
        let text = tools.engine.render(&template, &context.vars(), RenderMode::Lenient)?;
        let receipt = tools.writer.write_file(".gitignore", &text)?;
        Ok(vec![receipt.path])
    }
}
