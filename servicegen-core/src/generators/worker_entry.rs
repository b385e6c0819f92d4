//! Worker entry-point generator

use super::{Category, Generator, GeneratorTools, Result};
use crate::context::GenerationContext;
use crate::templates::{builtin, RenderMode};
use std::path::PathBuf;

/// Emits `src/worker/index.js`, the service's fetch entry point.
#[derive(Debug, Default)]
pub struct WorkerEntryGenerator;

impl WorkerEntryGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for WorkerEntryGenerator {
    fn name(&self) -> &str {
        "worker-entry"
    }

    fn category(&self) -> Category {
        Category::SourceCode
    }

    fn generate(
        &self,
        context: &GenerationContext,
        tools: &mut GeneratorTools,
    ) -> Result<Vec<PathBuf>> {
        let template = tools.engine.load_template(builtin::WORKER_INDEX)?;
        let text = tools.engine.render(&template, &context.vars(), RenderMode::Strict)?;
        let receipt = tools.writer.write_file("src/worker/index.js", &text)?;
        Ok(vec![receipt.path])
    }
}
