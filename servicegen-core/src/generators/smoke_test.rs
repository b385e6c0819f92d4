//! Smoke test generator

use super::{Category, Generator, GeneratorTools, Result};
use crate::context::GenerationContext;
use crate::templates::{builtin, RenderMode};
use std::path::PathBuf;

/// Emits `tests/smoke.test.js`, a health-check probe against the running
/// service.
#[derive(Debug, Default)]
pub struct SmokeTestGenerator;

impl SmokeTestGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for SmokeTestGenerator {
    fn name(&self) -> &str {
        "smoke-test"
    }

    fn category(&self) -> Category {
        Category::Tests
    }

    fn generate(
        &self,
        context: &GenerationContext,
        tools: &mut GeneratorTools,
    ) -> Result<Vec<PathBuf>> {
        let template = tools.engine.load_template(builtin::SMOKE_TEST)?;
        let text = tools.engine.render(&template, &context.vars(), RenderMode::Strict)?;
        let receipt = tools.writer.write_file("tests/smoke.test.js", &text)?;
        Ok(vec![receipt.path])
    }
}
