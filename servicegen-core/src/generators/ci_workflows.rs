//! CI workflow generators

use super::{Category, Generator, GeneratorTools, Result};
use crate::context::GenerationContext;
use crate::templates::{builtin, RenderMode};
use std::path::PathBuf;

/// Emits `.github/workflows/ci.yml` and `.github/workflows/deploy.yml`.
///
/// Rendering is lenient on purpose: workflow files contain
/// `${{ secrets.* }}` expressions that must survive substitution
/// untouched.
#[derive(Debug, Default)]
pub struct CiWorkflowGenerator;

impl CiWorkflowGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for CiWorkflowGenerator {
    fn name(&self) -> &str {
        "ci-workflows"
    }

    fn category(&self) -> Category {
        Category::Ci
    }

    fn generate(
        &self,
        context: &GenerationContext,
        tools: &mut GeneratorTools,
    ) -> Result<Vec<PathBuf>> {
        let vars = context.vars();
        let mut files = Vec::new();

        for (key, target) in [
            (builtin::CI_WORKFLOW, ".github/workflows/ci.yml"),
            (builtin::DEPLOY_WORKFLOW, ".github/workflows/deploy.yml"),
        ] {
            let template = tools.engine.load_template(key)?;
            let text = tools.engine.render(&template, &vars, RenderMode::Lenient)?;
            let receipt = tools.writer.write_file(target, &text)?;
            files.push(receipt.path);
        }
        Ok(files)
    }
}
