//! Deploy script generator

use super::{Category, Generator, GeneratorTools, Result};
use crate::context::GenerationContext;
use crate::templates::{builtin, RenderMode};
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct DeployScriptGenerator;

impl DeployScriptGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for DeployScriptGenerator {
    fn name(&self) -> &str {
        "deploy-script"
    }

    fn category(&self) -> Category {
        Category::Scripts
    }

    fn generate(
        &self,
        context: &GenerationContext,
        tools: &mut GeneratorTools,
    ) -> Result<Vec<PathBuf>> {
        let template = tools.engine.load_template(builtin::DEPLOY_SCRIPT)?;
        let text = tools.engine.render(&template, &context.vars(), RenderMode::Lenient)?;
        let receipt = tools.writer.write_file("scripts/deploy.sh", &text)?;
        Ok(vec![receipt.path])
    }
}
